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

use super::SourceEntry;
use crate::database::{Manager, CORE_PACKAGE};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Outcome of the most recent refresh of one source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Never tried.
    Unknown,

    /// The last refresh succeeded.
    Ok,

    /// The last refresh failed.
    Failed,
}

impl UpdateStatus {
    fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Unknown => "unknown",
            UpdateStatus::Ok => "ok",
            UpdateStatus::Failed => "failed",
        }
    }
}

impl FromStr for UpdateStatus {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        Ok(match input {
            "unknown" => UpdateStatus::Unknown,
            "ok" => UpdateStatus::Ok,
            "failed" => UpdateStatus::Failed,
            other => {
                return Err(Error::parse(format!("unknown update status \"{}\"", other)))
            }
        })
    }
}

/// Refresh history of one source, persisted across runs.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEntry {
    /// Identity of the source (its URI and distribution).
    pub source: String,

    /// Outcome of the most recent refresh.
    pub status: UpdateStatus,

    /// When the source was first tried.
    pub first_try: Option<DateTime<Utc>>,

    /// When the source first succeeded.
    pub first_success: Option<DateTime<Utc>>,

    /// When the source last succeeded.
    pub last_success: Option<DateTime<Utc>>,

    /// When the source last failed.
    pub last_failure: Option<DateTime<Utc>>,
}

impl UpdateEntry {
    fn new(source: &str) -> Self {
        UpdateEntry {
            source: source.to_owned(),
            status: UpdateStatus::Unknown,
            first_try: None,
            first_success: None,
            last_success: None,
            last_failure: None,
        }
    }
}

fn render_time(value: &Option<DateTime<Utc>>) -> String {
    match value {
        Some(value) => value.to_rfc3339(),
        None => "-".to_owned(),
    }
}

fn parse_time(token: &str) -> Result<Option<DateTime<Utc>>> {
    if token == "-" {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(token)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|err| Error::parse(format!("bad timestamp \"{}\": {}", token, err)))
}

impl std::fmt::Display for UpdateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.status.as_str(),
            render_time(&self.first_try),
            render_time(&self.first_success),
            render_time(&self.last_success),
            render_time(&self.last_failure),
            self.source
        )
    }
}

impl FromStr for UpdateEntry {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let tokens = line.splitn(6, ' ').collect::<Vec<_>>();
        let [status, first_try, first_success, last_success, last_failure, source] =
            tokens.as_slice()
        else {
            return Err(Error::parse(format!("bad update entry \"{}\"", line)));
        };
        Ok(UpdateEntry {
            source: (*source).to_owned(),
            status: status.parse()?,
            first_try: parse_time(first_try)?,
            first_success: parse_time(first_success)?,
            last_success: parse_time(last_success)?,
            last_failure: parse_time(last_failure)?,
        })
    }
}

fn status_path(manager: &Manager) -> std::path::PathBuf {
    manager.package_dir(CORE_PACKAGE).join("update.status")
}

/// Load the persisted update entries.
pub fn load_update_entries(manager: &Manager) -> Result<Vec<UpdateEntry>> {
    let file = status_path(manager);
    if !file.exists() {
        return Ok(vec![]);
    }
    std::fs::read_to_string(file)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.parse())
        .collect()
}

/// Persist the update entries.
pub fn save_update_entries(manager: &Manager, entries: &[UpdateEntry]) -> Result<()> {
    let mut text = String::new();
    for entry in entries {
        text.push_str(&entry.to_string());
        text.push('\n');
    }
    std::fs::write(status_path(manager), text)?;
    Ok(())
}

/// Refresh every configured source through `fetch` (the network or
/// filesystem collaborator), recording per-source first-try, success and
/// failure timestamps. The entries are persisted before returning.
pub fn update<F>(manager: &mut Manager, fetch: F) -> Result<Vec<UpdateEntry>>
where
    F: Fn(&SourceEntry) -> Result<()>,
{
    let sources = super::load_sources(manager)?;
    let mut entries = load_update_entries(manager)?;

    for source in &sources {
        manager.check_interrupt()?;
        let id = format!("{}/{}", source.uri, source.distribution);
        let position = entries.iter().position(|e| e.source == id);
        let mut entry = match position {
            Some(position) => entries[position].clone(),
            None => UpdateEntry::new(&id),
        };

        let now = Utc::now();
        if entry.first_try.is_none() {
            entry.first_try = Some(now);
        }
        match fetch(source) {
            Ok(()) => {
                entry.status = UpdateStatus::Ok;
                if entry.first_success.is_none() {
                    entry.first_success = Some(now);
                }
                entry.last_success = Some(now);
            }
            Err(err) => {
                manager
                    .output()
                    .warning(&format!("update of {} failed: {}", id, err));
                entry.status = UpdateStatus::Failed;
                entry.last_failure = Some(now);
            }
        }

        match position {
            Some(position) => entries[position] = entry,
            None => entries.push(entry),
        }
    }

    save_update_entries(manager, &entries)?;
    Ok(entries)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::repository::add_sources;

    fn manager() -> (tempfile::TempDir, Manager) {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new(dir.path());
        manager
            .create_database(&"linux-amd64".parse().unwrap(), "T <t@example.com>")
            .unwrap();
        (dir, manager)
    }

    #[test]
    fn entry_line_round_trips() {
        let entry: UpdateEntry =
            "ok 2024-02-06T10:00:00+00:00 - 2024-02-06T10:00:00+00:00 - http://example/stable"
                .parse()
                .unwrap();
        assert_eq!(UpdateStatus::Ok, entry.status);
        assert_eq!(entry, entry.to_string().parse().unwrap());
    }

    #[test]
    fn update_records_success_and_failure() {
        let (_dir, mut manager) = manager();
        add_sources(
            &manager,
            &[
                "wpkg http://good stable main",
                "wpkg http://bad stable main",
            ],
        )
        .unwrap();

        let entries = update(&mut manager, |source| {
            if source.uri.contains("bad") {
                Err(Error::io("unreachable"))
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(2, entries.len());
        assert_eq!(UpdateStatus::Ok, entries[0].status);
        assert!(entries[0].first_success.is_some());
        assert_eq!(UpdateStatus::Failed, entries[1].status);
        assert!(entries[1].last_failure.is_some());
        assert!(entries[1].first_success.is_none());

        // a later success keeps the first_try stamp
        let again = update(&mut manager, |_| Ok(())).unwrap();
        assert_eq!(UpdateStatus::Ok, again[1].status);
        assert_eq!(entries[1].first_try, again[1].first_try);

        // and the state survives a reload
        let reloaded = load_update_entries(&manager).unwrap();
        assert_eq!(again, reloaded);
    }
}

// vim: foldmethod=marker
