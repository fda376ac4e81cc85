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

use crate::database::{Manager, CORE_PACKAGE};
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One line of `sources.list`:
/// `<type> [key=value ...] <uri> <distribution> <component>...`.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceEntry {
    /// Source type, such as `wpkg`.
    pub source_type: String,

    /// Optional `key=value` options written between type and URI.
    pub options: BTreeMap<String, String>,

    /// Where the repository lives.
    pub uri: String,

    /// Distribution within the repository.
    pub distribution: String,

    /// Components of the distribution, possibly none.
    pub components: Vec<String>,
}

impl FromStr for SourceEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace().peekable();
        let source_type = tokens
            .next()
            .ok_or_else(|| Error::parse("sources.list: empty entry"))?
            .to_owned();

        let mut options = BTreeMap::new();
        while let Some(token) = tokens.peek() {
            let Some((key, value)) = token.split_once('=') else {
                break;
            };
            options.insert(key.to_owned(), value.to_owned());
            tokens.next();
        }

        let uri = tokens
            .next()
            .ok_or_else(|| Error::parse("sources.list: entry without a URI"))?
            .to_owned();
        let distribution = tokens
            .next()
            .ok_or_else(|| Error::parse("sources.list: entry without a distribution"))?
            .to_owned();
        let components = tokens.map(|t| t.to_owned()).collect();

        Ok(SourceEntry {
            source_type,
            options,
            uri,
            distribution,
            components,
        })
    }
}

impl std::fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_type)?;
        for (key, value) in &self.options {
            write!(f, " {}={}", key, value)?;
        }
        write!(f, " {} {}", self.uri, self.distribution)?;
        for component in &self.components {
            write!(f, " {}", component)?;
        }
        Ok(())
    }
}

/// Parse a whole sources file; `#` comments and blank lines are skipped.
pub fn read_sources(text: &str) -> Result<Vec<SourceEntry>> {
    let mut ret = vec![];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        ret.push(line.parse()?);
    }
    Ok(ret)
}

/// Render a sources file, one entry per line.
pub fn write_sources(entries: &[SourceEntry]) -> String {
    let mut ret = String::new();
    for entry in entries {
        ret.push_str(&entry.to_string());
        ret.push('\n');
    }
    ret
}

fn sources_path(manager: &Manager) -> std::path::PathBuf {
    manager.package_dir(CORE_PACKAGE).join("sources.list")
}

/// Load the target's sources from `core/sources.list`.
pub fn load_sources(manager: &Manager) -> Result<Vec<SourceEntry>> {
    let sources_file = sources_path(manager);
    if !sources_file.exists() {
        return Ok(vec![]);
    }
    read_sources(&std::fs::read_to_string(sources_file)?)
}

/// Replace the target's sources wholesale.
pub fn save_sources(manager: &Manager, entries: &[SourceEntry]) -> Result<()> {
    let sources_file = sources_path(manager);
    if let Some(parent) = sources_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(sources_file, write_sources(entries))?;
    Ok(())
}

/// Append validated entries to the sources file.
pub fn add_sources(manager: &Manager, lines: &[&str]) -> Result<()> {
    let mut entries = load_sources(manager)?;
    for line in lines {
        entries.push(line.parse()?);
    }
    save_sources(manager, &entries)
}

/// Delete entries by one-based line number in the sorted order the user
/// sees: requested indices are sorted ascending, then deleted descending
/// so the remaining indices stay valid.
pub fn remove_sources(manager: &Manager, indices: &[usize]) -> Result<()> {
    let mut entries = load_sources(manager)?;
    let mut indices = indices.to_vec();
    indices.sort_unstable();
    indices.dedup();
    for index in indices.iter().rev() {
        if *index == 0 || *index > entries.len() {
            return Err(Error::parameter(format!(
                "source index {} is out of range (1..={})",
                index,
                entries.len()
            )));
        }
        entries.remove(index - 1);
    }
    save_sources(manager, &entries)
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_entry {
        ($name:ident, $line:expr, |$entry:ident| $block:tt) => {
            #[test]
            fn $name() {
                let $entry: SourceEntry = $line.parse().unwrap();
                $block
            }
        };
    }

    check_entry!(plain_entry, "wpkg http://example.com/repo stable main", |entry| {
        assert_eq!("wpkg", entry.source_type);
        assert_eq!("http://example.com/repo", entry.uri);
        assert_eq!("stable", entry.distribution);
        assert_eq!(vec!["main".to_owned()], entry.components);
    });

    check_entry!(
        entry_with_options,
        "wpkg arch=linux-amd64 trusted=yes file:///srv/repo testing main contrib",
        |entry| {
            assert_eq!(Some(&"linux-amd64".to_owned()), entry.options.get("arch"));
            assert_eq!(Some(&"yes".to_owned()), entry.options.get("trusted"));
            assert_eq!(2, entry.components.len());
        }
    );

    check_entry!(entry_without_components, "wpkg http://example.com flat/", |entry| {
        assert!(entry.components.is_empty());
    });

    #[test]
    fn malformed_entries_fail() {
        assert!("".parse::<SourceEntry>().is_err());
        assert!("wpkg".parse::<SourceEntry>().is_err());
        assert!("wpkg http://example.com".parse::<SourceEntry>().is_err());
    }

    #[test]
    fn file_round_trips() {
        let text = "\
# the main repository
wpkg http://example.com/repo stable main

wpkg arch=linux-amd64 file:///srv/repo testing main contrib
";
        let entries = read_sources(text).unwrap();
        assert_eq!(2, entries.len());
        let rendered = write_sources(&entries);
        assert_eq!(entries, read_sources(&rendered).unwrap());
    }

    #[test]
    fn remove_sources_deletes_descending() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new(dir.path());
        manager
            .create_database(&"linux-amd64".parse().unwrap(), "T <t@example.com>")
            .unwrap();
        add_sources(
            &manager,
            &[
                "wpkg http://one stable main",
                "wpkg http://two stable main",
                "wpkg http://three stable main",
            ],
        )
        .unwrap();

        remove_sources(&manager, &[3, 1]).unwrap();
        let left = load_sources(&manager).unwrap();
        assert_eq!(1, left.len());
        assert_eq!("http://two", left[0].uri);

        assert!(remove_sources(&manager, &[5]).is_err());
    }
}

// vim: foldmethod=marker
