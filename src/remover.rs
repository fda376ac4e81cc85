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

//! The `remover` module mirrors the installer for the destructive half
//! of the lifecycle: `remove` (files go, conffiles stay), `deconfigure`
//! (nothing goes, the package just stops being configured), `purge`
//! (conffiles and the database entry go too) and `autoremove`
//! (dependency-orphaned automatic packages are swept). All of it is
//! journalled through the same tracker as installation.

use crate::database::{Manager, PackageStatus, Selection};
use crate::dependency::{Candidate, Dependency};
use crate::errors::{Error, Result};
use crate::installer::Flags;
use crate::tracker::{JournalEntry, Tracker};
use crate::version::Version;
use std::collections::{BTreeMap, BTreeSet};

/// The removal engine. Borrows the [Manager] exactly like the installer
/// does.
pub struct Remover<'m> {
    manager: &'m mut Manager,
    flags: Flags,
    targets: Vec<String>,
    purge: bool,
}

impl<'m> Remover<'m> {
    /// A fresh remover over the given manager.
    pub fn new(manager: &'m mut Manager) -> Self {
        Remover {
            manager,
            flags: Flags::new(),
            targets: vec![],
            purge: false,
        }
    }

    /// Mutable access to the force flags.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Name an installed package for removal.
    pub fn add_package(&mut self, name: &str) {
        self.targets.push(name.to_owned());
    }

    /// Also purge conffiles and database entries.
    pub fn set_purge(&mut self, purge: bool) {
        self.purge = purge;
    }

    // ---- validation ---------------------------------------------------

    fn installed_map(&mut self) -> Result<BTreeMap<String, Candidate>> {
        let mut ret = BTreeMap::new();
        for name in self.manager.list_installed_packages()? {
            if !self.manager.package_status(&name).is_unpacked() {
                continue;
            }
            let control = self.manager.package_control(&name)?;
            let Some(version) = control
                .get_line("Version")
                .and_then(|text| text.parse::<Version>().ok())
            else {
                continue;
            };
            let provides = control
                .get("Provides")
                .and_then(|text| text.parse::<Dependency>().ok())
                .map(|dep| {
                    dep.relations
                        .iter()
                        .flat_map(|r| r.possibilities.iter().map(|p| p.name.clone()))
                        .collect()
                })
                .unwrap_or_default();
            ret.insert(
                name.clone(),
                Candidate {
                    name,
                    version,
                    architecture: None,
                    installed: true,
                    provides,
                },
            );
        }
        Ok(ret)
    }

    /// Check every target against status, essential, hold and reverse
    /// dependency policy.
    pub fn validate(&mut self) -> Result<()> {
        let targets: BTreeSet<String> = self.targets.iter().cloned().collect();
        let installed = self.installed_map()?;

        for name in targets.clone() {
            self.manager.check_interrupt()?;
            let status = self.manager.package_status(&name);
            let removable = match status {
                PackageStatus::NotInstalled => false,
                PackageStatus::ConfigFiles => self.purge,
                other => other.is_unpacked(),
            };
            if !removable {
                return Err(Error::undefined(format!(
                    "package {} is not installed (status {})",
                    name, status
                )));
            }

            if status != PackageStatus::ConfigFiles {
                let essential = self
                    .manager
                    .get_field(&name, "Essential")
                    .ok()
                    .flatten()
                    .map(|value| value.eq_ignore_ascii_case("yes"))
                    .unwrap_or(false);
                if essential && !self.flags.remove_essential {
                    return Err(Error::dependency(format!(
                        "{} is essential and cannot be removed",
                        name
                    )));
                }
            }

            if self.manager.selection(&name) == Selection::Hold && !self.flags.hold {
                return Err(Error::dependency(format!("{} is on hold", name)));
            }

            // reverse dependencies among what stays behind
            if !self.flags.depends {
                let mut dependents = vec![];
                let others: Vec<String> = installed
                    .keys()
                    .filter(|other| !targets.contains(*other) && **other != name)
                    .cloned()
                    .collect();
                for other in others {
                    for field in ["Pre-Depends", "Depends"] {
                        let expression = self
                            .manager
                            .package_control(&other)?
                            .get(field)
                            .and_then(|text| text.parse::<Dependency>().ok())
                            .unwrap_or_default();
                        let needed = expression.relations.iter().any(|relation| {
                            let names_target = relation.possibilities.iter().any(|p| {
                                installed
                                    .get(&name)
                                    .map(|c| p.satisfied_by(c))
                                    .unwrap_or(false)
                            });
                            if !names_target {
                                return false;
                            }
                            let satisfied_elsewhere =
                                relation.possibilities.iter().any(|p| {
                                    installed.values().any(|c| {
                                        c.name != name
                                            && !targets.contains(&c.name)
                                            && p.satisfied_by(c)
                                    })
                                });
                            !satisfied_elsewhere
                        });
                        if needed {
                            dependents.push(other.clone());
                            break;
                        }
                    }
                }
                if !dependents.is_empty() {
                    dependents.sort();
                    dependents.dedup();
                    return Err(Error::dependency(format!(
                        "{} is required by {}",
                        name,
                        dependents.join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    // ---- primitive steps ---------------------------------------------

    fn remove_item(&mut self, name: &str) -> Result<()> {
        self.manager.output().info(&format!("removing {}", name));

        let backup = self.manager.new_backup()?;
        let index = self.manager.file_index(name)?;
        for file_path in index.file_paths() {
            self.manager.backup_file(&backup, file_path)?;
        }
        self.manager.backup_package_db(&backup, name)?;
        self.manager.track(
            &JournalEntry::Remove {
                name: name.to_owned(),
                backup,
            }
            .to_string(),
        )?;

        self.manager
            .set_transient_status(name, PackageStatus::Removing);
        self.manager
            .run_maintainer_script(name, "prerm", &["remove"])?;
        self.manager.erase_unpacked_files(name, true)?;
        self.manager
            .run_maintainer_script(name, "postrm", &["remove"])?;
        self.manager
            .set_package_status(name, PackageStatus::ConfigFiles)?;
        Ok(())
    }

    fn purge_item(&mut self, name: &str) -> Result<()> {
        self.manager.output().info(&format!("purging {}", name));

        let backup = self.manager.new_backup()?;
        for conffile in self.manager.package_conffiles(name)? {
            self.manager.backup_file(&backup, &conffile)?;
        }
        self.manager.backup_package_db(&backup, name)?;
        self.manager.track(
            &JournalEntry::Purge {
                name: name.to_owned(),
                backup,
            }
            .to_string(),
        )?;

        self.manager
            .set_transient_status(name, PackageStatus::Purging);
        self.manager
            .run_maintainer_script(name, "postrm", &["purge"])?;

        for conffile in self.manager.package_conffiles(name)? {
            let absolute = self.manager.target_path(&conffile);
            match std::fs::remove_file(&absolute) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(Error::io(format!("{}: {}", absolute.display(), err)))
                }
            }
        }
        self.manager.remove_package_dir(name)?;
        Ok(())
    }

    /// Deconfigure one package in favour of another: scripts run, files
    /// stay, the package stops being configured.
    pub fn deconfigure(&mut self, name: &str, in_favour: &str) -> Result<()> {
        if !self.manager.package_status(name).is_unpacked() {
            return Err(Error::undefined(format!(
                "package {} is not installed",
                name
            )));
        }
        self.manager.run_maintainer_script(
            name,
            "prerm",
            &["deconfigure", "in-favour", in_favour],
        )?;
        self.manager
            .set_package_status(name, PackageStatus::HalfConfigured)?;
        self.manager
            .track(&JournalEntry::Deconfigure {
                name: name.to_owned(),
            }
            .to_string())?;
        Ok(())
    }

    // ---- orchestration ------------------------------------------------

    /// Validate and execute the removal (or purge) of every target under
    /// a journal, committing on success and rolling back on failure per
    /// the `rollback` flag.
    pub fn run(&mut self) -> Result<()> {
        self.validate()?;
        if self.targets.is_empty() {
            return Ok(());
        }

        let tracker = Tracker::new(self.manager.admin_dir().join("tracker.journal"))?;
        self.manager.set_tracker(tracker)?;

        let mut targets: Vec<String> = self.targets.clone();
        targets.sort();
        targets.dedup();

        let result = (|| -> Result<()> {
            for name in &targets {
                self.manager.check_interrupt()?;
                if self.manager.package_status(name).is_unpacked() {
                    self.remove_item(name)?;
                }
                if self.purge {
                    self.purge_item(name)?;
                }
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.manager.commit_tracker()?;
                Ok(())
            }
            Err(err) => {
                if self.flags.rollback {
                    self.manager
                        .output()
                        .info("removal failed, rolling back");
                    self.manager.rollback_tracker()?;
                } else {
                    self.manager.abandon_tracker()?;
                }
                Err(err)
            }
        }
    }

    // ---- autoremove ---------------------------------------------------

    /// Installed automatic packages no other kept package (transitively)
    /// requires, sorted. These are what `autoremove` would take out.
    pub fn autoremove_candidates(&mut self) -> Result<Vec<String>> {
        let installed = self.installed_map()?;

        let mut kept: BTreeSet<String> = BTreeSet::new();
        let mut queue: Vec<String> = vec![];
        for name in installed.keys() {
            if self.manager.selection(name) != Selection::Auto {
                kept.insert(name.clone());
                queue.push(name.clone());
            }
        }

        while let Some(name) = queue.pop() {
            self.manager.check_interrupt()?;
            for field in ["Pre-Depends", "Depends"] {
                let expression = self
                    .manager
                    .package_control(&name)?
                    .get(field)
                    .and_then(|text| text.parse::<Dependency>().ok())
                    .unwrap_or_default();
                for relation in &expression.relations {
                    for possibility in &relation.possibilities {
                        for candidate in installed.values() {
                            if possibility.satisfied_by(candidate)
                                && kept.insert(candidate.name.clone())
                            {
                                queue.push(candidate.name.clone());
                            }
                        }
                    }
                }
            }
        }

        Ok(installed
            .keys()
            .filter(|name| !kept.contains(*name))
            .cloned()
            .collect())
    }

    /// Sweep dependency-orphaned automatic packages. With `dry_run` the
    /// set is only reported. Running it again right away is a no-op.
    pub fn autoremove(&mut self, dry_run: bool) -> Result<Vec<String>> {
        let candidates = self.autoremove_candidates()?;
        if dry_run || candidates.is_empty() {
            for name in &candidates {
                self.manager
                    .output()
                    .info(&format!("{} is no longer required", name));
            }
            return Ok(candidates);
        }
        self.targets = candidates.clone();
        self.run()?;
        Ok(candidates)
    }
}

// vim: foldmethod=marker
