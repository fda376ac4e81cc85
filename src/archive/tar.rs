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

use super::{path, ArchiveEntry, EntryType, Error};
use std::io::Read;

fn entry_type(header: &tar::Header) -> Option<EntryType> {
    let kind = header.entry_type();
    if kind.is_file() {
        Some(EntryType::Regular)
    } else if kind.is_dir() {
        Some(EntryType::Directory)
    } else if kind.is_symlink() {
        Some(EntryType::Symlink)
    } else if kind.is_hard_link() {
        Some(EntryType::HardLink)
    } else if kind.is_character_special() {
        Some(EntryType::CharSpecial)
    } else if kind.is_block_special() {
        Some(EntryType::BlockSpecial)
    } else if kind.is_fifo() {
        Some(EntryType::Fifo)
    } else if kind.is_contiguous() {
        Some(EntryType::Continuous)
    } else {
        // pax / gnu metadata entries are consumed by the reader
        None
    }
}

/// Decode every entry of an uncompressed `tar` stream into uniform
/// file-information records. Regular (and contiguous) entries carry their
/// content; everything else pairs with an empty buffer.
pub fn read_tar(data: &[u8]) -> Result<Vec<(ArchiveEntry, Vec<u8>)>, Error> {
    let mut archive = tar::Archive::new(data);
    let mut ret = vec![];

    for entry in archive.entries().map_err(Error::from_io)? {
        let mut entry = entry.map_err(Error::from_io)?;
        let header = entry.header();

        let Some(kind) = entry_type(header) else {
            continue;
        };

        let raw_path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let link_target = header
            .link_name_bytes()
            .map(|bytes| path::canonicalize(&String::from_utf8_lossy(&bytes)));

        let info = ArchiveEntry {
            path: path::canonicalize(&raw_path),
            entry_type: kind,
            mode: header.mode().map_err(Error::from_io)?,
            uid: header.uid().map_err(Error::from_io)?,
            gid: header.gid().map_err(Error::from_io)?,
            user: header
                .username()
                .ok()
                .flatten()
                .unwrap_or_default()
                .to_owned(),
            group: header
                .groupname()
                .ok()
                .flatten()
                .unwrap_or_default()
                .to_owned(),
            size: header.size().map_err(Error::from_io)?,
            mtime: header.mtime().map_err(Error::from_io)?,
            dev_major: header.device_major().ok().flatten().unwrap_or(0),
            dev_minor: header.device_minor().ok().flatten().unwrap_or(0),
            link_target: match kind {
                EntryType::Symlink | EntryType::HardLink => link_target,
                _ => None,
            },
        };

        let mut data = Vec::new();
        if kind.has_data() {
            entry.read_to_end(&mut data).map_err(Error::from_io)?;
        }

        ret.push((info, data));
    }

    Ok(ret)
}

/// Write side of the tar codec: append uniform entries, then [finish] to
/// obtain the archive bytes.
///
/// [finish]: TarWriter::finish
pub struct TarWriter {
    builder: tar::Builder<Vec<u8>>,
}

impl Default for TarWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TarWriter {
    /// A writer over a fresh in-memory archive.
    pub fn new() -> Self {
        TarWriter {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Append one entry. `data` is only consulted for entry types which
    /// carry content.
    pub fn append(&mut self, info: &ArchiveEntry, data: &[u8]) -> Result<(), Error> {
        let mut header = tar::Header::new_ustar();
        header.set_mode(info.mode);
        header.set_uid(info.uid);
        header.set_gid(info.gid);
        header.set_mtime(info.mtime);
        if !info.user.is_empty() {
            header.set_username(&info.user).map_err(Error::from_io)?;
        }
        if !info.group.is_empty() {
            header.set_groupname(&info.group).map_err(Error::from_io)?;
        }

        match info.entry_type {
            EntryType::Regular | EntryType::Continuous => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                self.builder
                    .append_data(&mut header, &info.path, data)
                    .map_err(Error::from_io)?;
            }
            EntryType::Directory => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                self.builder
                    .append_data(&mut header, format!("{}/", info.path), std::io::empty())
                    .map_err(Error::from_io)?;
            }
            EntryType::Symlink | EntryType::HardLink => {
                header.set_entry_type(match info.entry_type {
                    EntryType::Symlink => tar::EntryType::Symlink,
                    _ => tar::EntryType::Link,
                });
                header.set_size(0);
                let target = info
                    .link_target
                    .as_deref()
                    .ok_or_else(|| Error::Corrupt(format!("{}: link without target", info.path)))?;
                self.builder
                    .append_link(&mut header, &info.path, target)
                    .map_err(Error::from_io)?;
            }
            EntryType::CharSpecial | EntryType::BlockSpecial | EntryType::Fifo => {
                header.set_entry_type(match info.entry_type {
                    EntryType::CharSpecial => tar::EntryType::Char,
                    EntryType::BlockSpecial => tar::EntryType::Block,
                    _ => tar::EntryType::Fifo,
                });
                header.set_size(0);
                header
                    .set_device_major(info.dev_major)
                    .map_err(Error::from_io)?;
                header
                    .set_device_minor(info.dev_minor)
                    .map_err(Error::from_io)?;
                self.builder
                    .append_data(&mut header, &info.path, std::io::empty())
                    .map_err(Error::from_io)?;
            }
        }
        Ok(())
    }

    /// Terminate the archive and hand back its bytes.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        self.builder.into_inner().map_err(Error::from_io)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn entries_round_trip() {
        let mut writer = TarWriter::new();
        writer
            .append(&ArchiveEntry::directory("usr/bin", 0o755), &[])
            .unwrap();
        writer
            .append(
                &ArchiveEntry::regular("usr/bin/tool", 5, 0o755),
                b"tool\n",
            )
            .unwrap();
        writer
            .append(&ArchiveEntry::symlink("usr/bin/t", "tool"), &[])
            .unwrap();
        let bytes = writer.finish().unwrap();

        let entries = read_tar(&bytes).unwrap();
        assert_eq!(3, entries.len());

        assert_eq!("usr/bin", entries[0].0.path);
        assert_eq!(EntryType::Directory, entries[0].0.entry_type);

        assert_eq!("usr/bin/tool", entries[1].0.path);
        assert_eq!(EntryType::Regular, entries[1].0.entry_type);
        assert_eq!(b"tool\n".to_vec(), entries[1].1);
        assert_eq!(0o755, entries[1].0.mode & 0o777);

        assert_eq!(EntryType::Symlink, entries[2].0.entry_type);
        assert_eq!(Some("tool".to_owned()), entries[2].0.link_target);
    }

    #[test]
    fn dot_slash_prefixes_are_canonicalised() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_uid(0);
        header.set_gid(0);
        header.set_size(2);
        builder
            .append_data(&mut header, "./etc/conf", &b"x\n"[..])
            .unwrap();
        let bytes = builder.into_inner().unwrap();

        let entries = read_tar(&bytes).unwrap();
        assert_eq!("etc/conf", entries[0].0.path);
    }
}

// vim: foldmethod=marker
