// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

/// The kind of filesystem object an archive entry describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryType {
    /// Ordinary file with content.
    Regular,

    /// Hard link to another entry of the same archive.
    HardLink,

    /// Symbolic link.
    Symlink,

    /// Character special device.
    CharSpecial,

    /// Block special device.
    BlockSpecial,

    /// Directory.
    Directory,

    /// Named pipe.
    Fifo,

    /// Contiguous file; treated as a regular file on every current
    /// platform.
    Continuous,
}

impl EntryType {
    /// Whether this entry carries file content.
    pub fn has_data(&self) -> bool {
        matches!(self, EntryType::Regular | EntryType::Continuous)
    }
}

/// Uniform file-information record describing one entry of a `tar` or
/// `ar` archive, independent of the on-disk header layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveEntry {
    /// Entry path, canonicalised to forward slashes with no `./` prefix.
    pub path: String,

    /// What kind of object this entry describes.
    pub entry_type: EntryType,

    /// Unix permission bits.
    pub mode: u32,

    /// Numeric owner.
    pub uid: u64,

    /// Numeric group.
    pub gid: u64,

    /// Symbolic owner name, when recorded.
    pub user: String,

    /// Symbolic group name, when recorded.
    pub group: String,

    /// Content size in bytes; zero for entries without data.
    pub size: u64,

    /// Modification time, seconds since the epoch.
    pub mtime: u64,

    /// Device major number for special entries.
    pub dev_major: u32,

    /// Device minor number for special entries.
    pub dev_minor: u32,

    /// Link target for hard and symbolic links.
    pub link_target: Option<String>,
}

impl ArchiveEntry {
    /// A regular-file entry with the usual defaults.
    pub fn regular(path: &str, size: u64, mode: u32) -> Self {
        ArchiveEntry {
            path: path.to_owned(),
            entry_type: EntryType::Regular,
            mode,
            uid: 0,
            gid: 0,
            user: "root".to_owned(),
            group: "root".to_owned(),
            size,
            mtime: 0,
            dev_major: 0,
            dev_minor: 0,
            link_target: None,
        }
    }

    /// A directory entry with the usual defaults.
    pub fn directory(path: &str, mode: u32) -> Self {
        ArchiveEntry {
            entry_type: EntryType::Directory,
            size: 0,
            ..ArchiveEntry::regular(path, 0, mode)
        }
    }

    /// A symbolic link entry.
    pub fn symlink(path: &str, target: &str) -> Self {
        ArchiveEntry {
            entry_type: EntryType::Symlink,
            link_target: Some(target.to_owned()),
            ..ArchiveEntry::regular(path, 0, 0o777)
        }
    }
}

// vim: foldmethod=marker
