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

use crate::archive::{ArchiveEntry, EntryType};
use crate::errors::{Error, Result};

/// One entry of a package's `wpkgar` file index.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    /// What kind of object the entry is.
    pub entry_type: EntryType,

    /// Unix permission bits.
    pub mode: u32,

    /// Path relative to the target root.
    pub path: String,

    /// Link target for symbolic and hard links.
    pub link_target: Option<String>,
}

/// The parsed `wpkgar` index of one installed package: every path the
/// package delivered to the target root, with enough detail to remove or
/// audit them later.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileIndex {
    /// Entries in data-tar order (directories before their content).
    pub entries: Vec<IndexEntry>,
}

fn type_letter(entry_type: EntryType) -> char {
    match entry_type {
        EntryType::Regular | EntryType::Continuous => 'f',
        EntryType::Directory => 'd',
        EntryType::Symlink => 'l',
        EntryType::HardLink => 'h',
        EntryType::CharSpecial => 'c',
        EntryType::BlockSpecial => 'b',
        EntryType::Fifo => 'p',
    }
}

fn letter_type(letter: &str) -> Option<EntryType> {
    Some(match letter {
        "f" => EntryType::Regular,
        "d" => EntryType::Directory,
        "l" => EntryType::Symlink,
        "h" => EntryType::HardLink,
        "c" => EntryType::CharSpecial,
        "b" => EntryType::BlockSpecial,
        "p" => EntryType::Fifo,
        _ => return None,
    })
}

impl FileIndex {
    /// Build an index from a package's data-tar entries.
    pub fn from_entries(entries: &[ArchiveEntry]) -> Self {
        FileIndex {
            entries: entries
                .iter()
                .map(|entry| IndexEntry {
                    entry_type: entry.entry_type,
                    mode: entry.mode,
                    path: entry.path.clone(),
                    link_target: entry.link_target.clone(),
                })
                .collect(),
        }
    }

    /// Parse the stored form: one `<type> <mode> <path>[ -> <target>]`
    /// line per entry.
    pub fn parse(content: &str) -> Result<Self> {
        let mut ret = FileIndex::default();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, ' ');
            let (letter, mode, rest) = match (parts.next(), parts.next(), parts.next()) {
                (Some(letter), Some(mode), Some(rest)) => (letter, mode, rest),
                _ => {
                    return Err(Error::parse(format!("wpkgar:{}: malformed entry", idx + 1)))
                }
            };
            let entry_type = letter_type(letter)
                .ok_or_else(|| Error::parse(format!("wpkgar:{}: unknown type", idx + 1)))?;
            let mode = u32::from_str_radix(mode, 8)
                .map_err(|_| Error::parse(format!("wpkgar:{}: bad mode", idx + 1)))?;
            let (path, link_target) = match rest.split_once(" -> ") {
                Some((path, target)) => (path.to_owned(), Some(target.to_owned())),
                None => (rest.to_owned(), None),
            };
            ret.entries.push(IndexEntry {
                entry_type,
                mode,
                path,
                link_target,
            });
        }
        Ok(ret)
    }

    /// Render the stored form.
    pub fn write(&self) -> String {
        let mut ret = String::new();
        for entry in &self.entries {
            ret.push(type_letter(entry.entry_type));
            ret.push_str(&format!(" {:o} {}", entry.mode, entry.path));
            if let Some(target) = &entry.link_target {
                ret.push_str(" -> ");
                ret.push_str(target);
            }
            ret.push('\n');
        }
        ret
    }

    /// Paths of every non-directory entry.
    pub fn file_paths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.entry_type != EntryType::Directory)
            .map(|entry| entry.path.as_str())
            .collect()
    }

    /// Paths of every directory entry, deepest first, the order in which
    /// empty directories can be pruned.
    pub fn directory_paths_deepest_first(&self) -> Vec<&str> {
        let mut dirs = self
            .entries
            .iter()
            .filter(|entry| entry.entry_type == EntryType::Directory)
            .map(|entry| entry.path.as_str())
            .collect::<Vec<_>>();
        dirs.sort_by_key(|path| std::cmp::Reverse(path.matches('/').count()));
        dirs
    }

    /// Drop one path from the index. Returns whether it was present.
    pub fn forget(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path != path);
        before != self.entries.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_text() {
        let entries = vec![
            ArchiveEntry::directory("usr/bin", 0o755),
            ArchiveEntry::regular("usr/bin/tool", 10, 0o755),
            ArchiveEntry::symlink("usr/bin/t", "tool"),
        ];
        let index = FileIndex::from_entries(&entries);
        let text = index.write();
        assert_eq!(index, FileIndex::parse(&text).unwrap());
        assert!(text.contains("l 777 usr/bin/t -> tool"));
    }

    #[test]
    fn file_and_directory_views() {
        let index = FileIndex::parse(
            "\
d 755 usr
d 755 usr/share/doc
f 644 usr/share/doc/README
",
        )
        .unwrap();
        assert_eq!(vec!["usr/share/doc/README"], index.file_paths());
        assert_eq!(
            vec!["usr/share/doc", "usr"],
            index.directory_paths_deepest_first()
        );
    }

    #[test]
    fn malformed_lines_are_parse_errors() {
        assert!(FileIndex::parse("x 644 path\n").is_err());
        assert!(FileIndex::parse("f 9z9 path\n").is_err());
        assert!(FileIndex::parse("f\n").is_err());
    }

    #[test]
    fn forget_removes_ownership() {
        let mut index = FileIndex::parse("f 644 usr/bin/tool\n").unwrap();
        assert!(index.forget("usr/bin/tool"));
        assert!(!index.forget("usr/bin/tool"));
        assert!(index.entries.is_empty());
    }
}

// vim: foldmethod=marker
