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

//! The `installer` module is the transaction engine: it takes package
//! archives plus repository directories, validates the whole set against
//! the target, and drives every selected package through
//! `unpack` and `configure` in dependency order, journalling each step so
//! a failure rolls the target back to its pre-transaction state.
//!
//! Per-package states run `wanted -> loaded -> validated -> unpacked ->
//! configured`, with `rejected` (and its cause) as the exit ramp; the
//! global phases are `collect -> validate -> pre-configure -> {unpack ->
//! configure}* -> done`.

mod flags;
mod order;

pub use flags::Flags;
pub use order::topological_order;

use crate::architecture::Architecture;
use crate::archive::{path as archive_path, EntryType};
use crate::control::{missing_binary_fields, validate as validate_control};
use crate::database::{
    FileIndex, Manager, PackageStatus, Selection, SELECTION_FIELD, STATUS_FIELD,
};
use crate::dependency::{evaluate, Candidate, Dependency};
use crate::errors::{Error, ErrorKind, Result};
use crate::package::BinaryPackage;
use crate::tracker::{JournalEntry, Tracker};
use crate::version::Version;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Environment variable marking the re-executed copy during a
/// self-upgrade, so the copy does not spawn another copy.
pub static RUNNING_COPY_MARKER: &str = "WPKG_RUNNING_COPY";

/// Why a package entered the transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstallKind {
    /// Named on the command line.
    Explicit,

    /// Pulled in from a repository to satisfy a dependency.
    Implicit,
}

/// Where one package stands in the transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemState {
    /// Loaded from its archive, nothing checked yet.
    Loaded,

    /// Every validation passed.
    Validated,

    /// Same version already installed and skipping was requested.
    Skipped,

    /// Payload delivered to the target root.
    Unpacked,

    /// Configured; the package is installed.
    Configured,

    /// Failed validation; carries the cause.
    Rejected(String),
}

/// One package selected for installation.
pub struct InstallItem {
    /// The decoded archive.
    pub package: BinaryPackage,

    /// Explicit or dependency-driven.
    pub kind: InstallKind,

    /// Current state.
    pub state: ItemState,

    /// Version installed before this transaction, when upgrading.
    pub previous_version: Option<Version>,

    /// Installed packages to deconfigure before this one unpacks
    /// (`Breaks` handling).
    pub deconfigure_first: Vec<String>,
}

impl InstallItem {
    fn name(&self) -> String {
        self.package.name()
    }

    fn version(&self) -> Version {
        self.package
            .version()
            .unwrap_or_else(|_| Version::from_parts(None, "0", None).unwrap())
    }

    fn dependency_field(&self, field: &str) -> Dependency {
        self.package
            .control()
            .get(field)
            .and_then(|text| text.parse().ok())
            .unwrap_or_default()
    }

    fn is_active(&self) -> bool {
        !matches!(self.state, ItemState::Rejected(_) | ItemState::Skipped)
    }
}

/// What [Installer::run] did.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The transaction completed and was committed.
    Done,

    /// The target set included the packager itself: a copy was spawned
    /// to perform the work and this process must exit with its status.
    SelfUpgrade {
        /// Exit status of the re-executed copy.
        exit_code: i32,
    },
}

/// The transaction engine for installs and upgrades. Borrows the
/// [Manager]; never outlives it, never owns database state.
pub struct Installer<'m> {
    manager: &'m mut Manager,
    flags: Flags,
    explicit_paths: Vec<PathBuf>,
    repositories: Vec<PathBuf>,
    verify_fields: Vec<String>,
    items: Vec<InstallItem>,
    catalogue: BTreeMap<String, BinaryPackage>,
    self_upgrade: bool,
    first_rejection: Option<ErrorKind>,
}

impl<'m> Installer<'m> {
    /// A fresh installer over the given manager.
    pub fn new(manager: &'m mut Manager) -> Self {
        Installer {
            manager,
            flags: Flags::new(),
            explicit_paths: vec![],
            repositories: vec![],
            verify_fields: vec![],
            items: vec![],
            catalogue: BTreeMap::new(),
            self_upgrade: false,
            first_rejection: None,
        }
    }

    /// Mutable access to the force flags.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Replace the force flags wholesale.
    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    /// Name an archive to install.
    pub fn add_package(&mut self, archive_path: impl Into<PathBuf>) {
        self.explicit_paths.push(archive_path.into());
    }

    /// Add a directory of candidate archives for implicit dependencies.
    pub fn add_repository(&mut self, repository: impl Into<PathBuf>) {
        self.repositories.push(repository.into());
    }

    /// Add a field expression every candidate must satisfy:
    /// `Name`, `Name=value` or `Name!=value`.
    pub fn add_verify_field(&mut self, expression: &str) {
        self.verify_fields.push(expression.to_owned());
    }

    /// The work list, for reporting.
    pub fn items(&self) -> &[InstallItem] {
        &self.items
    }

    /// Whether validation found the packager itself among the targets;
    /// [Installer::run] then re-executes a copy instead of overwriting
    /// the running image.
    pub fn needs_self_upgrade(&self) -> bool {
        self.self_upgrade
    }

    // ---- collect ------------------------------------------------------

    /// Load the explicit archives and expand the repositories into a
    /// catalogue, then chase dependencies into implicit items.
    pub fn collect(&mut self) -> Result<()> {
        for archive in std::mem::take(&mut self.explicit_paths) {
            self.manager.check_interrupt()?;
            let package = BinaryPackage::open(&archive).map_err(Error::from)?;
            self.items.push(InstallItem {
                package,
                kind: InstallKind::Explicit,
                state: ItemState::Loaded,
                previous_version: None,
                deconfigure_first: vec![],
            });
        }

        for repository in self.repositories.clone() {
            self.manager.check_interrupt()?;
            if !repository.is_dir() {
                return Err(Error::io(format!(
                    "repository {} is not a directory",
                    repository.display()
                )));
            }
            let mut paths = std::fs::read_dir(&repository)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().map(|e| e == "deb").unwrap_or(false))
                .collect::<Vec<_>>();
            paths.sort();
            for deb in paths {
                let package = match BinaryPackage::open(&deb) {
                    Ok(package) => package,
                    Err(err) => {
                        self.manager
                            .output()
                            .warning(&format!("{}: {}", deb.display(), err));
                        continue;
                    }
                };
                let name = package.name();
                let newer = match self.catalogue.get(&name) {
                    Some(existing) => {
                        let old = existing.version().ok();
                        let new = package.version().ok();
                        matches!((old, new), (Some(old), Some(new)) if new > old)
                    }
                    None => true,
                };
                if newer {
                    self.catalogue.insert(name, package);
                }
            }
        }

        self.chase_dependencies()?;
        Ok(())
    }

    fn selected_names(&self) -> BTreeSet<String> {
        self.items.iter().map(|item| item.name()).collect()
    }

    fn installed_candidates(&mut self) -> Result<BTreeMap<String, Candidate>> {
        let mut ret = BTreeMap::new();
        for name in self.manager.list_installed_packages()? {
            if !self.manager.package_status(&name).is_unpacked() {
                continue;
            }
            let control = self.manager.package_control(&name)?;
            let Some(version) = control.get_line("Version") else {
                continue;
            };
            let Ok(version) = version.parse::<Version>() else {
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
                    architecture: control
                        .get_line("Architecture")
                        .and_then(|text| text.parse().ok()),
                    installed: true,
                    provides,
                },
            );
        }
        Ok(ret)
    }

    fn item_candidates(&self) -> BTreeMap<String, Candidate> {
        self.items
            .iter()
            .filter(|item| item.is_active())
            .map(|item| {
                (
                    item.name(),
                    Candidate {
                        name: item.name(),
                        version: item.version(),
                        architecture: item
                            .package
                            .control()
                            .get_line("Architecture")
                            .and_then(|text| text.parse().ok()),
                        installed: false,
                        provides: item
                            .dependency_field("Provides")
                            .relations
                            .iter()
                            .flat_map(|r| r.possibilities.iter().map(|p| p.name.clone()))
                            .collect(),
                    },
                )
            })
            .collect()
    }

    fn chase_dependencies(&mut self) -> Result<()> {
        loop {
            self.manager.check_interrupt()?;
            let installed = self.installed_candidates()?;
            let in_transaction = self.item_candidates();
            let selected = self.selected_names();

            let mut wanted: Vec<String> = vec![];
            for item in &self.items {
                for field in ["Pre-Depends", "Depends"] {
                    let expression = item.dependency_field(field);
                    let evaluation =
                        evaluate(&expression, None, &[], &selected, |name| {
                            in_transaction
                                .get(name)
                                .or_else(|| installed.get(name))
                                .or_else(|| {
                                    in_transaction
                                        .values()
                                        .chain(installed.values())
                                        .find(|c| c.provides.iter().any(|p| p == name))
                                })
                                .cloned()
                        });
                    for relation in &evaluation.failing {
                        for possibility in &relation.possibilities {
                            if selected.contains(&possibility.name) {
                                continue;
                            }
                            let Some(candidate) = self.catalogue.get(&possibility.name)
                            else {
                                continue;
                            };
                            let satisfies = match (
                                &possibility.version_constraint,
                                candidate.version().ok(),
                            ) {
                                (Some(constraint), Some(version)) => {
                                    constraint.satisfied_by(&version)
                                }
                                (Some(_), None) => false,
                                (None, _) => true,
                            };
                            if satisfies {
                                wanted.push(possibility.name.clone());
                                break;
                            }
                        }
                    }
                }
            }

            wanted.dedup();
            if wanted.is_empty() {
                return Ok(());
            }
            for name in wanted {
                if let Some(package) = self.catalogue.remove(&name) {
                    self.manager
                        .output()
                        .info(&format!("selecting {} to satisfy a dependency", name));
                    self.items.push(InstallItem {
                        package,
                        kind: InstallKind::Implicit,
                        state: ItemState::Loaded,
                        previous_version: None,
                        deconfigure_first: vec![],
                    });
                }
            }
        }
    }

    // ---- validate -----------------------------------------------------

    fn reject(&mut self, index: usize, kind: ErrorKind, cause: String) {
        self.manager
            .output()
            .error(&format!("{}: {}", self.items[index].name(), cause));
        self.items[index].state = ItemState::Rejected(cause);
        self.first_rejection.get_or_insert(kind);
    }

    /// Run every validation over the collected set. Returns an error
    /// carrying the first rejection's kind when any package failed and
    /// the matching `force-*` flag was not asserted.
    pub fn validate(&mut self) -> Result<()> {
        self.first_rejection = None;

        self.validate_controls()?;
        self.validate_self_upgrade()?;
        self.validate_architecture()?;
        self.validate_versions()?;
        self.validate_vendor_distribution()?;
        self.validate_holds()?;
        self.validate_dependencies()?;
        self.validate_file_conflicts()?;
        self.validate_fields()?;

        for item in &mut self.items {
            if matches!(item.state, ItemState::Loaded) {
                item.state = ItemState::Validated;
            }
        }

        match self.first_rejection {
            Some(kind) => Err(Error::new(
                kind,
                "validation rejected one or more packages",
            )),
            None => Ok(()),
        }
    }

    fn validate_controls(&mut self) -> Result<()> {
        for index in 0..self.items.len() {
            self.manager.check_interrupt()?;
            let control = self.items[index].package.control().clone();
            let missing = missing_binary_fields(&control);
            if !missing.is_empty() {
                self.reject(
                    index,
                    ErrorKind::Undefined,
                    format!("missing required fields: {}", missing.join(", ")),
                );
                continue;
            }
            let diagnostics = validate_control(&control);
            if let Some(diagnostic) = diagnostics.first() {
                self.reject(index, ErrorKind::Invalid, diagnostic.to_string());
            }
        }
        Ok(())
    }

    fn validate_self_upgrade(&mut self) -> Result<()> {
        for item in &self.items {
            if self.manager.is_self(&item.name()) {
                self.self_upgrade = true;
            }
        }
        Ok(())
    }

    fn validate_architecture(&mut self) -> Result<()> {
        let target = self.manager.architecture()?;
        for index in 0..self.items.len() {
            if !self.items[index].is_active() {
                continue;
            }
            let arch_text = self.items[index]
                .package
                .control()
                .get_line("Architecture")
                .unwrap_or_default();
            let arch: Architecture = match arch_text.parse() {
                Ok(arch) => arch,
                Err(err) => {
                    self.reject(
                        index,
                        ErrorKind::Invalid,
                        format!("bad architecture \"{}\": {}", arch_text, err),
                    );
                    continue;
                }
            };
            if !arch.is_compatible_with(&target) && !self.flags.architecture {
                self.reject(
                    index,
                    ErrorKind::Compatibility,
                    format!("architecture {} does not match target {}", arch, target),
                );
            }
        }
        Ok(())
    }

    fn validate_versions(&mut self) -> Result<()> {
        for index in 0..self.items.len() {
            if !self.items[index].is_active() {
                continue;
            }
            let name = self.items[index].name();
            if self.manager.package_status(&name) == PackageStatus::NotInstalled {
                continue;
            }
            let Some(installed) = self.manager.installed_version(&name) else {
                continue;
            };
            let candidate = self.items[index].version();
            self.items[index].previous_version = Some(installed.clone());

            if candidate < installed && !self.flags.downgrade {
                self.reject(
                    index,
                    ErrorKind::Dependency,
                    format!("downgrade from {} to {}", installed, candidate),
                );
                continue;
            }
            if candidate == installed && self.flags.skip_same_version {
                self.manager
                    .output()
                    .info(&format!("{} {} is already installed", name, installed));
                self.items[index].state = ItemState::Skipped;
                continue;
            }
            if let Some(minimum) = self
                .manager
                .get_field(&name, "Minimum-Upgradable-Version")
                .ok()
                .flatten()
                .and_then(|text| text.parse::<Version>().ok())
            {
                if installed < minimum && !self.flags.upgrade_any_version {
                    self.reject(
                        index,
                        ErrorKind::Dependency,
                        format!(
                            "installed {} is older than the minimum upgradable version {}",
                            installed, minimum
                        ),
                    );
                }
            }
        }
        Ok(())
    }

    fn validate_vendor_distribution(&mut self) -> Result<()> {
        let core = self.manager.package_control(crate::database::CORE_PACKAGE)?;
        let target_vendor = core.get_line("Vendor");
        let accepted_distributions = core
            .get_line("Distribution")
            .map(|text| {
                text.split_whitespace()
                    .map(|d| d.to_owned())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        for index in 0..self.items.len() {
            if !self.items[index].is_active() {
                continue;
            }
            let control = self.items[index].package.control().clone();
            if let (Some(target_vendor), Some(vendor)) =
                (&target_vendor, control.get_line("Vendor"))
            {
                if *target_vendor != vendor && !self.flags.vendor {
                    self.reject(
                        index,
                        ErrorKind::Compatibility,
                        format!("vendor \"{}\" does not match \"{}\"", vendor, target_vendor),
                    );
                    continue;
                }
            }
            if !accepted_distributions.is_empty() {
                if let Some(distribution) = control.get_line("Distribution") {
                    if !accepted_distributions.contains(&distribution)
                        && !self.flags.distribution
                    {
                        self.reject(
                            index,
                            ErrorKind::Compatibility,
                            format!("distribution \"{}\" is not accepted", distribution),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_holds(&mut self) -> Result<()> {
        for index in 0..self.items.len() {
            if !self.items[index].is_active() {
                continue;
            }
            let name = self.items[index].name();
            if self.manager.package_dir(&name).join("control").exists()
                && self.manager.selection(&name) == Selection::Hold
                && !self.flags.hold
            {
                self.reject(
                    index,
                    ErrorKind::Dependency,
                    "package is on hold".to_owned(),
                );
            }
        }
        Ok(())
    }

    fn validate_dependencies(&mut self) -> Result<()> {
        let installed = self.installed_candidates()?;
        let in_transaction = self.item_candidates();
        let selected = self.selected_names();

        let lookup = |name: &str| {
            in_transaction
                .get(name)
                .or_else(|| installed.get(name))
                .or_else(|| {
                    in_transaction
                        .values()
                        .chain(installed.values())
                        .find(|c| c.provides.iter().any(|p| p == name))
                })
                .cloned()
        };

        for index in 0..self.items.len() {
            self.manager.check_interrupt()?;
            if !self.items[index].is_active() {
                continue;
            }

            for field in ["Pre-Depends", "Depends"] {
                let expression = self.items[index].dependency_field(field);
                let evaluation = evaluate(&expression, None, &[], &selected, &lookup);
                if !evaluation.satisfied() && !self.flags.depends {
                    let failing = evaluation
                        .failing
                        .iter()
                        .map(|r| r.to_string())
                        .collect::<Vec<_>>()
                        .join("; ");
                    self.reject(
                        index,
                        ErrorKind::Dependency,
                        format!("unsatisfied {}: {}", field, failing),
                    );
                    break;
                }
            }
            if !self.items[index].is_active() {
                continue;
            }

            // active conflicts, both directions; a package never
            // conflicts with itself (or its own older version)
            let item_name = self.items[index].name();
            let conflicts = self.items[index].dependency_field("Conflicts");
            let mut conflicting: Vec<String> = vec![];
            for relation in &conflicts.relations {
                for possibility in &relation.possibilities {
                    if let Some(candidate) = lookup(&possibility.name) {
                        if candidate.name != item_name && possibility.satisfied_by(&candidate) {
                            conflicting.push(candidate.name.clone());
                        }
                    }
                }
            }
            let own = Candidate {
                name: self.items[index].name(),
                version: self.items[index].version(),
                architecture: None,
                installed: false,
                provides: vec![],
            };
            for candidate in installed.values() {
                if candidate.name == own.name {
                    continue;
                }
                let reverse = self
                    .manager
                    .package_control(&candidate.name)?
                    .get("Conflicts")
                    .and_then(|text| text.parse::<Dependency>().ok())
                    .unwrap_or_default();
                for relation in &reverse.relations {
                    for possibility in &relation.possibilities {
                        if possibility.name == own.name && possibility.satisfied_by(&own) {
                            conflicting.push(candidate.name.clone());
                        }
                    }
                }
            }
            if !conflicting.is_empty() && !self.flags.conflicts {
                conflicting.sort();
                conflicting.dedup();
                self.reject(
                    index,
                    ErrorKind::Dependency,
                    format!("conflicts with {}", conflicting.join(", ")),
                );
                continue;
            }

            // breaks: installed victims are deconfigured first, victims
            // inside the transaction are refused
            let breaks = self.items[index].dependency_field("Breaks");
            let mut deconfigure: Vec<String> = vec![];
            let mut broken_candidates: Vec<String> = vec![];
            for relation in &breaks.relations {
                for possibility in &relation.possibilities {
                    if possibility.name == item_name {
                        continue;
                    }
                    if let Some(candidate) = installed.get(&possibility.name) {
                        if possibility.satisfied_by(candidate) {
                            deconfigure.push(candidate.name.clone());
                        }
                    }
                    if let Some(candidate) = in_transaction.get(&possibility.name) {
                        if possibility.satisfied_by(candidate) {
                            broken_candidates.push(candidate.name.clone());
                        }
                    }
                }
            }
            if !broken_candidates.is_empty() && !self.flags.breaks {
                broken_candidates.sort();
                self.reject(
                    index,
                    ErrorKind::Dependency,
                    format!("breaks {}", broken_candidates.join(", ")),
                );
                continue;
            }
            deconfigure.sort();
            deconfigure.dedup();
            self.items[index].deconfigure_first = deconfigure;
        }
        Ok(())
    }

    fn validate_file_conflicts(&mut self) -> Result<()> {
        let owners = self.manager.file_owners()?;
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();

        for index in 0..self.items.len() {
            self.manager.check_interrupt()?;
            if !self.items[index].is_active() {
                continue;
            }
            let name = self.items[index].name();
            let replaces = self.items[index].dependency_field("Replaces");
            let entries = self.items[index].package.file_index();

            for entry in &entries {
                if entry.entry_type == EntryType::Directory {
                    continue;
                }
                let canonical = archive_path::canonicalize(&entry.path);
                if let Err(err) = archive_path::check_portable(&canonical) {
                    self.reject(
                        index,
                        ErrorKind::Invalid,
                        format!("{}: {}", canonical, err),
                    );
                    break;
                }

                // file about to land on an existing directory
                let on_disk = self.manager.target_path(&canonical);
                if on_disk.is_dir() && !self.flags.overwrite_dir {
                    self.reject(
                        index,
                        ErrorKind::Dependency,
                        format!("{} would replace a directory", canonical),
                    );
                    break;
                }

                if let Some(owner) = owners.get(&canonical) {
                    if *owner != name {
                        let replaced = self.replaces_covers(&replaces, owner);
                        if !replaced && !self.flags.overwrite {
                            self.reject(
                                index,
                                ErrorKind::Dependency,
                                format!("{} is owned by {}", canonical, owner),
                            );
                            break;
                        }
                    }
                }
                if let Some(other) = claimed.get(&canonical) {
                    if *other != name && !self.flags.overwrite {
                        self.reject(
                            index,
                            ErrorKind::Dependency,
                            format!("{} is also shipped by {}", canonical, other),
                        );
                        break;
                    }
                }
                claimed.insert(canonical, name.clone());
            }
        }
        Ok(())
    }

    fn replaces_covers(&mut self, replaces: &Dependency, owner: &str) -> bool {
        let Some(version) = self.manager.installed_version(owner) else {
            return false;
        };
        let owner_candidate = Candidate {
            name: owner.to_owned(),
            version,
            architecture: None,
            installed: true,
            provides: vec![],
        };
        replaces.relations.iter().any(|relation| {
            relation
                .possibilities
                .iter()
                .any(|p| p.name == owner && p.satisfied_by(&owner_candidate))
        })
    }

    fn validate_fields(&mut self) -> Result<()> {
        let expressions = self.verify_fields.clone();
        for expression in expressions {
            for index in 0..self.items.len() {
                if !self.items[index].is_active() {
                    continue;
                }
                let control = self.items[index].package.control().clone();
                let ok = if let Some((field, value)) = expression.split_once("!=") {
                    control.get_line(field.trim()).as_deref() != Some(value.trim())
                } else if let Some((field, value)) = expression.split_once('=') {
                    control.get_line(field.trim()).as_deref() == Some(value.trim())
                } else {
                    control.get_line(expression.trim()).is_some()
                };
                if !ok {
                    self.reject(
                        index,
                        ErrorKind::Invalid,
                        format!("field check \"{}\" failed", expression),
                    );
                }
            }
        }
        Ok(())
    }

    // ---- pre-configure ------------------------------------------------

    /// Run every candidate's `validate` script plus the global hooks.
    /// Any script failure aborts before the first unpack.
    pub fn pre_configure(&mut self) -> Result<()> {
        let tmp_dir = self.manager.admin_dir().join("tmp");
        std::fs::create_dir_all(&tmp_dir)?;

        for index in 0..self.items.len() {
            self.manager.check_interrupt()?;
            if !self.items[index].is_active() {
                continue;
            }
            let name = self.items[index].name();
            let Some(script) = self.items[index].package.scripts().get("validate").cloned()
            else {
                continue;
            };
            let script_path = tmp_dir.join(format!("{}.validate", name));
            std::fs::write(&script_path, script)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(
                    &script_path,
                    std::fs::Permissions::from_mode(0o755),
                )?;
            }
            let result = self
                .manager
                .run_script_path(&script_path, &[name.as_str()])
                .map_err(|err| {
                    Error::new(err.kind(), format!("{}: validate: {}", name, err.message()))
                });
            let _ = std::fs::remove_file(&script_path);
            result?;
        }

        let names = self
            .items
            .iter()
            .filter(|item| item.is_active())
            .map(|item| item.name())
            .collect::<Vec<_>>();
        for name in names {
            self.manager.run_global_hooks(&["validate", &name])?;
        }
        Ok(())
    }

    // ---- unpack & configure ------------------------------------------

    fn active_names(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter(|item| item.is_active())
            .map(|item| item.name())
            .collect()
    }

    fn ordering_edges(&self, fields: &[&str]) -> Vec<(String, String)> {
        let selected = self.active_names();
        let mut ret = vec![];
        for item in self.items.iter().filter(|item| item.is_active()) {
            for field in fields {
                for relation in item.dependency_field(field).relations {
                    for possibility in relation.possibilities {
                        if selected.contains(&possibility.name) {
                            ret.push((possibility.name, item.name()));
                        }
                    }
                }
            }
        }
        ret
    }

    fn item_index(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.name() == name && item.is_active())
    }

    /// Unpack every validated package in topological `Pre-Depends`
    /// order, then configure in `Pre-Depends` plus `Depends` order.
    fn unpack_and_configure(&mut self) -> Result<()> {
        let nodes = self.active_names();

        let unpack_order =
            topological_order(&nodes, &self.ordering_edges(&["Pre-Depends"]))
                .map_err(|cycle| {
                    Error::dependency(format!(
                        "pre-dependency cycle: {}",
                        cycle.join(", ")
                    ))
                })?;
        for name in &unpack_order {
            self.manager.check_interrupt()?;
            if let Some(index) = self.item_index(name) {
                self.unpack_item(index)?;
            }
        }

        let configure_order = match topological_order(
            &nodes,
            &self.ordering_edges(&["Pre-Depends", "Depends"]),
        ) {
            Ok(order) => order,
            Err(cycle) => {
                if !self.flags.configure_any {
                    return Err(Error::dependency(format!(
                        "dependency cycle leaves packages unconfigurable: {}",
                        cycle.join(", ")
                    )));
                }
                self.manager.output().warning(&format!(
                    "configuring despite a dependency cycle: {}",
                    cycle.join(", ")
                ));
                nodes.iter().cloned().collect()
            }
        };
        for name in &configure_order {
            self.manager.check_interrupt()?;
            if let Some(index) = self.item_index(name) {
                self.configure_item(index)?;
            }
        }
        Ok(())
    }

    fn unpack_item(&mut self, index: usize) -> Result<()> {
        let name = self.items[index].name();
        let version = self.items[index].version();
        let previous = self.items[index].previous_version.clone();
        let upgrading = previous.is_some();

        self.manager.output().info(&format!(
            "unpacking {} {}{}",
            name,
            version,
            match &previous {
                Some(previous) => format!(" (over {})", previous),
                None => String::new(),
            }
        ));

        // deconfigure whatever this package breaks, just before its slot
        for broken in self.items[index].deconfigure_first.clone() {
            self.manager
                .run_maintainer_script(&broken, "prerm", &["deconfigure", "in-favour", &name])?;
            self.manager
                .set_package_status(&broken, PackageStatus::HalfConfigured)?;
            self.manager
                .track(&JournalEntry::Deconfigure { name: broken }.to_string())?;
        }

        // back up everything this unpack will displace, and figure out
        // which files of the previous version have no successor
        let entries = self.items[index].package.file_index();
        let mut backup: Option<String> = None;
        let mut displaced = vec![];
        for entry in &entries {
            if entry.entry_type == EntryType::Directory {
                continue;
            }
            if self.manager.target_path(&entry.path).exists() {
                displaced.push(entry.path.clone());
            }
        }
        let mut stale = vec![];
        if upgrading {
            let new_paths: BTreeSet<String> =
                entries.iter().map(|entry| entry.path.clone()).collect();
            for old_path in self.manager.file_index(&name)?.file_paths() {
                if !new_paths.contains(old_path) {
                    stale.push(old_path.to_owned());
                }
            }
        }
        if upgrading || !displaced.is_empty() {
            let id = self.manager.new_backup()?;
            for file_path in displaced.iter().chain(stale.iter()) {
                self.manager.backup_file(&id, file_path)?;
            }
            self.manager.backup_package_db(&id, &name)?;
            backup = Some(id);
        }

        self.manager.track(
            &JournalEntry::Unpack {
                name: name.clone(),
                version: version.to_string(),
                backup: backup.clone(),
            }
            .to_string(),
        )?;

        self.manager.set_transient_status(
            &name,
            if upgrading {
                PackageStatus::Upgrading
            } else {
                PackageStatus::Installing
            },
        );

        // clear overwritten paths out of their previous owners' indexes
        let owners = self.manager.file_owners()?;
        for entry in &entries {
            if entry.entry_type == EntryType::Directory {
                continue;
            }
            if let Some(owner) = owners.get(&entry.path) {
                if *owner != name {
                    let mut other = self.manager.file_index(owner)?;
                    if other.forget(&entry.path) {
                        self.manager.write_file_index(owner, &other)?;
                    }
                }
            }
        }

        self.extract_payload(index)?;

        // files of the previous version with no successor go away now
        for old_path in &stale {
            let absolute = self.manager.target_path(old_path);
            match std::fs::remove_file(&absolute) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::io(format!("{}: {}", absolute.display(), err))),
            }
        }

        self.write_database_entry(index, upgrading)?;

        let mut args: Vec<String> = vec![if upgrading { "upgrade" } else { "install" }.to_owned()];
        if let Some(previous) = &previous {
            args.push(previous.to_string());
        }
        let arg_refs = args.iter().map(|a| a.as_str()).collect::<Vec<_>>();
        self.manager
            .run_maintainer_script(&name, "preinst", &arg_refs)?;

        self.manager
            .set_package_status(&name, PackageStatus::Unpacked)?;
        self.items[index].state = ItemState::Unpacked;
        Ok(())
    }

    fn extract_payload(&mut self, index: usize) -> Result<()> {
        let data = self.items[index].package.data().to_vec();

        // directories first, then hard links and regular files, symlinks
        // last, so link targets exist by the time they are needed
        let phases: [&[EntryType]; 3] = [
            &[EntryType::Directory],
            &[
                EntryType::HardLink,
                EntryType::Regular,
                EntryType::Continuous,
            ],
            &[EntryType::Symlink],
        ];

        for phase in phases {
            for (entry, content) in &data {
                if !phase.contains(&entry.entry_type) {
                    continue;
                }
                self.manager.check_interrupt()?;
                let canonical = archive_path::canonicalize(&entry.path);
                if canonical.is_empty() {
                    continue;
                }
                archive_path::check_portable(&canonical).map_err(Error::from)?;
                let target = self.manager.target_path(&canonical);
                match entry.entry_type {
                    EntryType::Directory => {
                        std::fs::create_dir_all(&target)?;
                        set_mode(&target, entry.mode);
                    }
                    EntryType::Regular | EntryType::Continuous => {
                        if let Some(parent) = target.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(&target, content)?;
                        set_mode(&target, entry.mode);
                    }
                    EntryType::HardLink => {
                        let Some(link_target) = &entry.link_target else {
                            continue;
                        };
                        let source = self.manager.target_path(link_target);
                        if target.exists() {
                            std::fs::remove_file(&target)?;
                        }
                        if let Some(parent) = target.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::hard_link(&source, &target)?;
                    }
                    EntryType::Symlink => {
                        let Some(link_target) = &entry.link_target else {
                            continue;
                        };
                        if target.exists() {
                            std::fs::remove_file(&target)?;
                        }
                        if let Some(parent) = target.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        #[cfg(unix)]
                        std::os::unix::fs::symlink(link_target, &target)?;
                        #[cfg(not(unix))]
                        return Err(Error::new(
                            ErrorKind::Compatibility,
                            format!("cannot create symlink {}", target.display()),
                        ));
                    }
                    EntryType::CharSpecial | EntryType::BlockSpecial | EntryType::Fifo => {
                        return Err(Error::new(
                            ErrorKind::Compatibility,
                            format!(
                                "special file {} cannot be unpacked on this platform",
                                canonical
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn write_database_entry(&mut self, index: usize, upgrading: bool) -> Result<()> {
        let name = self.items[index].name();
        if upgrading {
            self.manager.snapshot_control_history(&name)?;
        }

        let previous_selection = if self.manager.package_dir(&name).join("control").exists() {
            Some(self.manager.selection(&name))
        } else {
            None
        };

        let mut control = self.items[index].package.control().clone();
        control.set(STATUS_FIELD, PackageStatus::Unpacked.as_str());
        let selection = match (previous_selection, self.items[index].kind) {
            (Some(Selection::Hold), _) => Selection::Hold,
            (_, InstallKind::Explicit) => Selection::Manual,
            (Some(existing), InstallKind::Implicit) => existing,
            (None, InstallKind::Implicit) => Selection::Auto,
        };
        control.set(SELECTION_FIELD, selection.as_str());
        self.manager.write_package_control(&name, &control)?;

        let index_entries = self.items[index].package.file_index();
        self.manager
            .write_file_index(&name, &FileIndex::from_entries(&index_entries))?;

        let dir = self.manager.package_dir(&name);
        std::fs::write(
            dir.join("md5sums"),
            crate::package::md5sums::write(self.items[index].package.md5sums()),
        )?;
        let conffiles = self.items[index].package.conffiles();
        if conffiles.is_empty() {
            let _ = std::fs::remove_file(dir.join("conffiles"));
        } else {
            let mut text = conffiles.join("\n");
            text.push('\n');
            std::fs::write(dir.join("conffiles"), text)?;
        }
        self.manager
            .write_package_scripts(&name, self.items[index].package.scripts())?;
        Ok(())
    }

    fn configure_item(&mut self, index: usize) -> Result<()> {
        let name = self.items[index].name();
        let previous = self.items[index].previous_version.clone();

        self.manager.output().info(&format!("configuring {}", name));
        self.manager.track(
            &JournalEntry::Configure {
                name: name.clone(),
                previous: previous.as_ref().map(|v| v.to_string()),
            }
            .to_string(),
        )?;

        let mut args: Vec<String> = vec!["configure".to_owned()];
        if let Some(previous) = &previous {
            args.push(previous.to_string());
        }
        let arg_refs = args.iter().map(|a| a.as_str()).collect::<Vec<_>>();
        self.manager
            .run_maintainer_script(&name, "postinst", &arg_refs)?;

        self.manager
            .set_package_status(&name, PackageStatus::Installed)?;
        self.items[index].state = ItemState::Configured;
        Ok(())
    }

    // ---- self upgrade -------------------------------------------------

    fn running_copy_path(&self) -> PathBuf {
        let mut copy_name = String::from("wpkg-running-copy");
        if cfg!(windows) {
            copy_name.push_str(".exe");
        }
        self.manager
            .package_dir(crate::database::CORE_PACKAGE)
            .join(copy_name)
    }

    fn spawn_self_copy(&mut self) -> Result<RunOutcome> {
        let current = std::env::current_exe()
            .map_err(|err| Error::io(format!("cannot locate our own executable: {}", err)))?;
        let copy = self.running_copy_path();
        std::fs::copy(&current, &copy)
            .map_err(|err| Error::io(format!("{}: {}", copy.display(), err)))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&copy, std::fs::Permissions::from_mode(0o755))?;
        }

        // the copy retakes the lock itself
        if self.manager.is_locked() {
            self.manager.unlock()?;
        }

        let status = std::process::Command::new(&copy)
            .args(std::env::args_os().skip(1))
            .env(RUNNING_COPY_MARKER, "1")
            .status()
            .map_err(|err| Error::io(format!("{}: {}", copy.display(), err)))?;
        Ok(RunOutcome::SelfUpgrade {
            exit_code: status.code().unwrap_or(1),
        })
    }

    // ---- orchestration ------------------------------------------------

    /// Run the whole transaction: collect, validate, pre-configure, then
    /// unpack and configure under a journal which is committed on
    /// success and rolled back (by default) on any failure.
    pub fn run(&mut self) -> Result<RunOutcome> {
        let running_copy = std::env::var_os(RUNNING_COPY_MARKER).is_some();
        if !running_copy {
            // a copy left behind by an earlier self-upgrade is stale now
            let stale = self.running_copy_path();
            if stale.exists() {
                let _ = std::fs::remove_file(stale);
            }
        }

        self.collect()?;
        self.validate()?;

        if self.self_upgrade && !running_copy {
            return self.spawn_self_copy();
        }

        self.pre_configure()?;

        if self
            .items
            .iter()
            .all(|item| !item.is_active())
        {
            return Ok(RunOutcome::Done);
        }

        let tracker = Tracker::new(self.manager.admin_dir().join("tracker.journal"))?;
        self.manager.set_tracker(tracker)?;

        match self.unpack_and_configure() {
            Ok(()) => {
                self.manager.commit_tracker()?;
                Ok(RunOutcome::Done)
            }
            Err(err) => {
                if self.flags.rollback {
                    self.manager
                        .output()
                        .info("transaction failed, rolling back");
                    self.manager.rollback_tracker()?;
                } else {
                    self.manager.abandon_tracker()?;
                }
                Err(err)
            }
        }
    }
}

fn set_mode(target: &std::path::Path, mode: u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if mode != 0 {
            let _ = std::fs::set_permissions(target, std::fs::Permissions::from_mode(mode));
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (target, mode);
    }
}

// vim: foldmethod=marker
