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

//! The `tracker` module is the transaction journal.
//!
//! Every mutating step appends one line after it has taken effect on
//! disk and before the next step begins, so the journal always describes
//! exactly what happened. `commit` deletes the journal; `rollback`
//! replays it in reverse, mapping each line onto its inverse through the
//! database manager. Each line carries enough context (package name,
//! previous version, backup scratch id) for the inverse to be
//! deterministic without the original command line.

use crate::database::{Manager, PackageStatus};
use crate::errors::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn optional(token: &str) -> Option<String> {
    if token == "-" {
        None
    } else {
        Some(token.to_owned())
    }
}

fn render_optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// One journalled step, in its wire form.
#[derive(Clone, Debug, PartialEq)]
pub enum JournalEntry {
    /// A package was unpacked onto the target root. The backup id names
    /// the scratch holding whatever the unpack displaced (including the
    /// previous database entry on upgrade).
    Unpack {
        /// The package.
        name: String,

        /// Version that was unpacked.
        version: String,

        /// Backup scratch id, when anything was displaced.
        backup: Option<String>,
    },

    /// A package's `postinst configure` ran and it became `installed`.
    Configure {
        /// The package.
        name: String,

        /// Previously configured version, on reconfiguration.
        previous: Option<String>,
    },

    /// A package was deconfigured in favour of another.
    Deconfigure {
        /// The package.
        name: String,
    },

    /// A package's files were removed; the backup scratch holds them.
    Remove {
        /// The package.
        name: String,

        /// Backup scratch id holding the removed files and entry.
        backup: String,
    },

    /// A package was purged; the backup scratch holds its conffiles and
    /// database entry.
    Purge {
        /// The package.
        name: String,

        /// Backup scratch id.
        backup: String,
    },
}

impl std::fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalEntry::Unpack {
                name,
                version,
                backup,
            } => write!(f, "unpack {} {} {}", name, version, render_optional(backup)),
            JournalEntry::Configure { name, previous } => {
                write!(f, "configure {} {}", name, render_optional(previous))
            }
            JournalEntry::Deconfigure { name } => write!(f, "deconfigure {}", name),
            JournalEntry::Remove { name, backup } => write!(f, "remove {} {}", name, backup),
            JournalEntry::Purge { name, backup } => write!(f, "purge {} {}", name, backup),
        }
    }
}

impl FromStr for JournalEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        Ok(match tokens.as_slice() {
            ["unpack", name, version, backup] => JournalEntry::Unpack {
                name: (*name).to_owned(),
                version: (*version).to_owned(),
                backup: optional(backup),
            },
            ["configure", name, previous] => JournalEntry::Configure {
                name: (*name).to_owned(),
                previous: optional(previous),
            },
            ["deconfigure", name] => JournalEntry::Deconfigure {
                name: (*name).to_owned(),
            },
            ["remove", name, backup] => JournalEntry::Remove {
                name: (*name).to_owned(),
                backup: (*backup).to_owned(),
            },
            ["purge", name, backup] => JournalEntry::Purge {
                name: (*name).to_owned(),
                backup: (*backup).to_owned(),
            },
            _ => return Err(Error::parse(format!("journal: bad entry \"{}\"", line))),
        })
    }
}

impl JournalEntry {
    /// Execute the inverse of this entry through the manager. Used by
    /// rollback, latest entry first.
    fn undo(&self, manager: &mut Manager) -> Result<()> {
        match self {
            JournalEntry::Unpack { name, backup, .. } => {
                manager.erase_unpacked_files(name, false)?;
                manager.remove_package_dir(name)?;
                if let Some(backup) = backup {
                    manager.restore_backup(backup)?;
                }
            }
            JournalEntry::Configure { name, .. } => {
                if manager.package_status(name) != PackageStatus::NotInstalled {
                    manager.set_package_status(name, PackageStatus::Unpacked)?;
                }
            }
            JournalEntry::Deconfigure { name } => {
                if manager.package_status(name) != PackageStatus::NotInstalled {
                    manager.set_package_status(name, PackageStatus::Installed)?;
                }
            }
            JournalEntry::Remove { backup, .. } | JournalEntry::Purge { backup, .. } => {
                manager.restore_backup(backup)?;
            }
        }
        Ok(())
    }
}

/// The append-only journal of one transaction.
///
/// While the transaction is live the journal only grows. Dropping the
/// tracker without committing leaves the file in place so the manager's
/// scope guard (or a later `--rollback <file>` run) can still replay it.
pub struct Tracker {
    journal_path: PathBuf,
    file: Option<std::fs::File>,
    keep_file: bool,
}

impl Tracker {
    /// Open (or create) a journal at the given path.
    pub fn new(journal_path: impl AsRef<Path>) -> Result<Self> {
        let journal_path = journal_path.as_ref().to_owned();
        if let Some(parent) = journal_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&journal_path)
            .map_err(|err| Error::io(format!("{}: {}", journal_path.display(), err)))?;
        Ok(Tracker {
            journal_path,
            file: Some(file),
            keep_file: false,
        })
    }

    /// Where the journal lives.
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Keep the journal file around after commit or rollback, so it can
    /// be inspected or replayed later.
    pub fn keep_file(&mut self, keep: bool) {
        self.keep_file = keep;
    }

    /// Append one line and flush it to disk before returning.
    pub fn track(&mut self, line: &str) -> Result<()> {
        let Some(file) = &mut self.file else {
            return Err(Error::parameter("journal already closed"));
        };
        writeln!(file, "{}", line)?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file = None;
        if !self.keep_file && self.journal_path.exists() {
            std::fs::remove_file(&self.journal_path)?;
        }
        Ok(())
    }

    /// End the transaction successfully: the journal is deleted (unless
    /// [Tracker::keep_file] asked otherwise).
    pub fn commit(&mut self) -> Result<()> {
        self.close()
    }

    /// Replay the journal in reverse, executing each entry's inverse.
    /// A failing inverse is logged and rollback continues with the
    /// remaining entries.
    pub fn rollback(&mut self, manager: &mut Manager) -> Result<()> {
        self.file = None;
        let content = if self.journal_path.exists() {
            std::fs::read_to_string(&self.journal_path)?
        } else {
            String::new()
        };
        replay_lines(&content, manager);
        self.close()
    }
}

fn replay_lines(content: &str, manager: &mut Manager) {
    for line in content.lines().rev() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: JournalEntry = match line.parse() {
            Ok(entry) => entry,
            Err(err) => {
                manager.output().error(&format!("{}", err));
                continue;
            }
        };
        manager
            .output()
            .info(&format!("rolling back: {}", entry));
        if let Err(err) = entry.undo(manager) {
            manager
                .output()
                .error(&format!("rollback of \"{}\" failed: {}", entry, err));
        }
    }
}

/// Replay a journal file kept from an earlier run (the `--rollback
/// <file>` entry point). The file itself is left untouched.
pub fn rollback_file(journal_path: impl AsRef<Path>, manager: &mut Manager) -> Result<()> {
    let content = std::fs::read_to_string(journal_path.as_ref())
        .map_err(|err| Error::io(format!("{}: {}", journal_path.as_ref().display(), err)))?;
    replay_lines(&content, manager);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_entry_round_trip {
        ($name:ident, $line:expr) => {
            #[test]
            fn $name() {
                let entry: JournalEntry = $line.parse().unwrap();
                assert_eq!($line, entry.to_string());
            }
        };
    }

    check_entry_round_trip!(unpack_line, "unpack demo 1.0 12-1");
    check_entry_round_trip!(unpack_line_no_backup, "unpack demo 1.0 -");
    check_entry_round_trip!(configure_line, "configure demo 0.9");
    check_entry_round_trip!(configure_line_fresh, "configure demo -");
    check_entry_round_trip!(deconfigure_line, "deconfigure demo");
    check_entry_round_trip!(remove_line, "remove demo 12-2");
    check_entry_round_trip!(purge_line, "purge demo 12-3");

    #[test]
    fn garbage_lines_fail_to_parse() {
        assert!("frobnicate demo".parse::<JournalEntry>().is_err());
        assert!("unpack demo".parse::<JournalEntry>().is_err());
    }

    #[test]
    fn commit_deletes_the_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("tracker.journal");
        let mut tracker = Tracker::new(&journal).unwrap();
        tracker.track("unpack demo 1.0 -").unwrap();
        assert!(journal.exists());
        tracker.commit().unwrap();
        assert!(!journal.exists());
    }

    #[test]
    fn keep_file_preserves_the_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("tracker.journal");
        let mut tracker = Tracker::new(&journal).unwrap();
        tracker.keep_file(true);
        tracker.track("unpack demo 1.0 -").unwrap();
        tracker.commit().unwrap();
        assert_eq!(
            "unpack demo 1.0 -\n",
            std::fs::read_to_string(&journal).unwrap()
        );
    }
}

// vim: foldmethod=marker
