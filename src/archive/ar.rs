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

use super::{ArchiveEntry, EntryType, Error};
use std::io::{Cursor, Read};

/// Decode every member of an `ar` archive. Members are always regular
/// files in this format.
pub fn read_ar(data: &[u8]) -> Result<Vec<(ArchiveEntry, Vec<u8>)>, Error> {
    let mut archive = ar::Archive::new(Cursor::new(data));
    let mut ret = vec![];

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry.map_err(Error::from_io)?;
        let header = entry.header();

        let info = ArchiveEntry {
            path: String::from_utf8_lossy(header.identifier()).into_owned(),
            entry_type: EntryType::Regular,
            mode: header.mode(),
            uid: header.uid() as u64,
            gid: header.gid() as u64,
            user: String::new(),
            group: String::new(),
            size: header.size(),
            mtime: header.mtime(),
            dev_major: 0,
            dev_minor: 0,
            link_target: None,
        };

        let mut data = Vec::with_capacity(info.size as usize);
        entry.read_to_end(&mut data).map_err(Error::from_io)?;
        ret.push((info, data));
    }

    Ok(ret)
}

/// Write side of the `ar` codec.
pub struct ArWriter {
    builder: ar::Builder<Vec<u8>>,
}

impl Default for ArWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArWriter {
    /// A writer over a fresh in-memory archive.
    pub fn new() -> Self {
        ArWriter {
            builder: ar::Builder::new(Vec::new()),
        }
    }

    /// Append one member.
    pub fn append(&mut self, info: &ArchiveEntry, data: &[u8]) -> Result<(), Error> {
        let mut header = ar::Header::new(info.path.clone().into_bytes(), data.len() as u64);
        header.set_mode(if info.mode == 0 { 0o644 } else { info.mode });
        header.set_mtime(info.mtime);
        header.set_uid(info.uid as u32);
        header.set_gid(info.gid as u32);
        self.builder.append(&header, data).map_err(Error::from_io)?;
        Ok(())
    }

    /// Hand back the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        self.builder.into_inner().map_err(Error::from_io)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn members_round_trip() {
        let mut writer = ArWriter::new();
        writer
            .append(&ArchiveEntry::regular("debian-binary", 4, 0o644), b"2.0\n")
            .unwrap();
        writer
            .append(&ArchiveEntry::regular("control.tar", 3, 0o644), b"abc")
            .unwrap();
        let bytes = writer.finish().unwrap();
        assert!(bytes.starts_with(b"!<arch>\n"));

        let members = read_ar(&bytes).unwrap();
        assert_eq!(2, members.len());
        assert_eq!("debian-binary", members[0].0.path);
        assert_eq!(b"2.0\n".to_vec(), members[0].1);
        assert_eq!("control.tar", members[1].0.path);
    }
}

// vim: foldmethod=marker
