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

use super::{FileIndex, PackageStatus, Selection};
use crate::architecture::Architecture;
use crate::control::ControlFile;
use crate::errors::{Error, ErrorKind, Result};
use crate::interrupt;
use crate::output::Output;
use crate::package::md5sums;
use crate::scripts::{ProcessRunner, ScriptEnvironment, ScriptRunner};
use crate::tracker::Tracker;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the synthetic package holding the target's global state.
pub static CORE_PACKAGE: &str = "core";

/// Field holding the lifecycle status in a stored control snapshot.
pub static STATUS_FIELD: &str = "X-Status";

/// Field holding the selection in a stored control snapshot.
pub static SELECTION_FIELD: &str = "X-Selection";

/// Owner of the administrative database and of every mutation applied to
/// it.
///
/// The manager holds the three directories everything else is resolved
/// against (target root, install prefix, database), the lock, the
/// diagnostic sink, the script runner and, while a transaction is live,
/// the journal. Installer and remover borrow the manager; they never own
/// state of their own beyond their work lists.
pub struct Manager {
    root_dir: PathBuf,
    inst_dir: PathBuf,
    admin_dir: PathBuf,
    output: Output,
    runner: Box<dyn ScriptRunner>,
    locked: bool,
    tracker: Option<Tracker>,
    controls: BTreeMap<String, ControlFile>,
    self_names: BTreeSet<String>,
    backup_counter: u32,
}

fn copy_dir_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

impl Manager {
    /// A manager over the given target root, with the conventional
    /// `var/lib/wpkg` database location and the root itself as install
    /// prefix.
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root_dir = root_dir.as_ref().to_owned();
        Manager {
            admin_dir: root_dir.join("var/lib/wpkg"),
            inst_dir: root_dir.clone(),
            root_dir,
            output: Output::new(),
            runner: Box::new(ProcessRunner),
            locked: false,
            tracker: None,
            controls: BTreeMap::new(),
            self_names: BTreeSet::new(),
            backup_counter: 0,
        }
    }

    /// Override the database directory.
    pub fn set_admin_dir(&mut self, admin_dir: impl AsRef<Path>) {
        self.admin_dir = admin_dir.as_ref().to_owned();
    }

    /// Override the install prefix exported to scripts.
    pub fn set_inst_dir(&mut self, inst_dir: impl AsRef<Path>) {
        self.inst_dir = inst_dir.as_ref().to_owned();
    }

    /// Substitute the script runner; tests install recorders here.
    pub fn set_script_runner(&mut self, runner: Box<dyn ScriptRunner>) {
        self.runner = runner;
    }

    /// The target root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The install prefix.
    pub fn inst_dir(&self) -> &Path {
        &self.inst_dir
    }

    /// The database directory.
    pub fn admin_dir(&self) -> &Path {
        &self.admin_dir
    }

    /// The diagnostic sink.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Absolute path of a file under the target root.
    pub fn target_path(&self, relative: &str) -> PathBuf {
        self.root_dir.join(relative)
    }

    /// Directory of one package's database entry.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.admin_dir.join(name)
    }

    /// Raise [ErrorKind::Interrupted] when a cooperative stop was
    /// requested. Called from every long-running loop.
    pub fn check_interrupt(&self) -> Result<()> {
        if interrupt::observed() {
            return Err(Error::interrupted());
        }
        Ok(())
    }

    // ---- database creation -------------------------------------------

    /// Initialise the database for a target: the `core` entry holding the
    /// global architecture and maintainer, plus an empty sources list.
    /// Calling this on an initialised database is a no-op.
    pub fn create_database(
        &mut self,
        architecture: &Architecture,
        maintainer: &str,
    ) -> Result<()> {
        let core = self.package_dir(CORE_PACKAGE);
        if core.join("control").exists() {
            return Ok(());
        }
        std::fs::create_dir_all(core.join("hooks"))?;

        let mut control = ControlFile::new();
        control.set("Package", CORE_PACKAGE);
        control.set("Version", "0.1.0");
        control.set("Architecture", &architecture.to_string());
        control.set("Maintainer", maintainer);
        control.set("Description", "target system description");
        control.set(STATUS_FIELD, PackageStatus::Installed.as_str());
        self.write_package_control(CORE_PACKAGE, &control)?;

        std::fs::write(core.join("sources.list"), "")?;
        Ok(())
    }

    /// The target architecture recorded in `core`.
    pub fn architecture(&mut self) -> Result<Architecture> {
        let control = self.package_control(CORE_PACKAGE)?;
        let text = control
            .get_line("Architecture")
            .ok_or_else(|| Error::undefined("core entry has no Architecture"))?;
        text.parse()
            .map_err(|err| Error::parse(format!("core Architecture: {}", err)))
    }

    /// The target vendor recorded in `core`, when any.
    pub fn vendor(&mut self) -> Result<Option<String>> {
        Ok(self.package_control(CORE_PACKAGE)?.get_line("Vendor"))
    }

    // ---- locking ------------------------------------------------------

    /// Take the database lock, recording our pid and the given status
    /// string. Fails with [ErrorKind::Locked] when another process holds
    /// it.
    pub fn lock(&mut self, status: &str) -> Result<()> {
        std::fs::create_dir_all(&self.admin_dir)?;
        let lock_path = self.admin_dir.join("lock");
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                writeln!(file, "{} {}", std::process::id(), status)?;
                self.locked = true;
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = std::fs::read_to_string(&lock_path).unwrap_or_default();
                Err(Error::locked(format!(
                    "database already locked ({})",
                    holder.trim()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Release a lock we hold.
    pub fn unlock(&mut self) -> Result<()> {
        if !self.locked {
            return Err(Error::parameter("unlock without a held lock"));
        }
        std::fs::remove_file(self.admin_dir.join("lock"))?;
        self.locked = false;
        Ok(())
    }

    /// Administrative override: delete the lock file no matter who holds
    /// it. Separate from [Manager::unlock] on purpose.
    pub fn remove_lock(&mut self) -> Result<()> {
        let lock_path = self.admin_dir.join("lock");
        if lock_path.exists() {
            std::fs::remove_file(lock_path)?;
        }
        self.locked = false;
        Ok(())
    }

    /// Whether this manager holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // ---- package state ------------------------------------------------

    /// Names of every package with a database entry, `core` excluded,
    /// sorted for deterministic output.
    pub fn list_installed_packages(&self) -> Result<Vec<String>> {
        let mut ret = vec![];
        if !self.admin_dir.exists() {
            return Ok(ret);
        }
        for entry in std::fs::read_dir(&self.admin_dir)? {
            self.check_interrupt()?;
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == CORE_PACKAGE || name == "backup" {
                continue;
            }
            if entry.path().join("control").exists() {
                ret.push(name);
            }
        }
        ret.sort();
        Ok(ret)
    }

    /// Load (and cache) a package's stored control snapshot. Loading is
    /// idempotent; the cache is refreshed by every write.
    pub fn package_control(&mut self, name: &str) -> Result<ControlFile> {
        if let Some(control) = self.controls.get(name) {
            return Ok(control.clone());
        }
        let control_path = self.package_dir(name).join("control");
        let text = std::fs::read_to_string(&control_path)
            .map_err(|err| Error::io(format!("{}: {}", control_path.display(), err)))?;
        let control = ControlFile::parse(&text)
            .map_err(|err| Error::parse(format!("{}: {}", control_path.display(), err)))?;
        self.controls.insert(name.to_owned(), control.clone());
        Ok(control)
    }

    /// Persist a control snapshot and refresh the cache.
    pub fn write_package_control(&mut self, name: &str, control: &ControlFile) -> Result<()> {
        let dir = self.package_dir(name);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("control"), control.to_string())?;
        self.controls.insert(name.to_owned(), control.clone());
        Ok(())
    }

    /// Copy the current control snapshot to the next free `control.N`
    /// history slot, keeping the trail of lifecycle steps.
    pub fn snapshot_control_history(&self, name: &str) -> Result<()> {
        let dir = self.package_dir(name);
        let current = dir.join("control");
        if !current.exists() {
            return Ok(());
        }
        let mut n = 1;
        while dir.join(format!("control.{}", n)).exists() {
            n += 1;
        }
        std::fs::copy(&current, dir.join(format!("control.{}", n)))?;
        Ok(())
    }

    /// The lifecycle status of a package; [PackageStatus::NotInstalled]
    /// for names without a database entry.
    pub fn package_status(&mut self, name: &str) -> PackageStatus {
        if !self.package_dir(name).join("control").exists() {
            return PackageStatus::NotInstalled;
        }
        self.package_control(name)
            .ok()
            .and_then(|control| control.get_line(STATUS_FIELD))
            .and_then(|text| text.parse().ok())
            .unwrap_or(PackageStatus::NotInstalled)
    }

    /// Record a new lifecycle status.
    pub fn set_package_status(&mut self, name: &str, status: PackageStatus) -> Result<()> {
        self.set_field(name, STATUS_FIELD, status.as_str())
    }

    /// The installed version of a package, when its entry records one.
    pub fn installed_version(&mut self, name: &str) -> Option<crate::version::Version> {
        self.package_control(name)
            .ok()
            .and_then(|control| control.get_line("Version"))
            .and_then(|text| text.parse().ok())
    }

    /// Read one field of a stored control snapshot.
    pub fn get_field(&mut self, name: &str, field: &str) -> Result<Option<String>> {
        Ok(self.package_control(name)?.get(field))
    }

    /// Set one field of a stored control snapshot and persist it.
    pub fn set_field(&mut self, name: &str, field: &str, value: &str) -> Result<()> {
        let mut control = self.package_control(name)?;
        control.set(field, value);
        self.write_package_control(name, &control)
    }

    /// Delete one field of a stored control snapshot and persist it.
    pub fn delete_field(&mut self, name: &str, field: &str) -> Result<bool> {
        let mut control = self.package_control(name)?;
        let removed = control.delete(field);
        self.write_package_control(name, &control)?;
        Ok(removed)
    }

    /// The recorded selection; [Selection::Normal] when none is stored.
    pub fn selection(&mut self, name: &str) -> Selection {
        self.package_control(name)
            .ok()
            .and_then(|control| control.get_line(SELECTION_FIELD))
            .and_then(|text| text.parse().ok())
            .unwrap_or(Selection::Normal)
    }

    /// Record a selection. `reject` may target a package which was never
    /// installed; a stub entry is created to carry it.
    pub fn set_package_selection(&mut self, name: &str, selection: Selection) -> Result<()> {
        if !self.package_dir(name).join("control").exists() {
            if selection != Selection::Reject {
                return Err(Error::undefined(format!(
                    "package {} is not installed",
                    name
                )));
            }
            let mut stub = ControlFile::new();
            stub.set("Package", name);
            stub.set(STATUS_FIELD, PackageStatus::NotInstalled.as_str());
            stub.set(SELECTION_FIELD, selection.as_str());
            return self.write_package_control(name, &stub);
        }
        self.set_field(name, SELECTION_FIELD, selection.as_str())
    }

    // ---- per-package data files --------------------------------------

    /// Persist a package's `wpkgar` file index.
    pub fn write_file_index(&self, name: &str, index: &FileIndex) -> Result<()> {
        let dir = self.package_dir(name);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("wpkgar"), index.write())?;
        Ok(())
    }

    /// Load a package's `wpkgar` file index; empty when absent.
    pub fn file_index(&self, name: &str) -> Result<FileIndex> {
        let index_path = self.package_dir(name).join("wpkgar");
        if !index_path.exists() {
            return Ok(FileIndex::default());
        }
        FileIndex::parse(&std::fs::read_to_string(index_path)?)
    }

    /// Load a package's stored md5sums map; empty when absent.
    pub fn package_md5sums(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let sums_path = self.package_dir(name).join("md5sums");
        if !sums_path.exists() {
            return Ok(BTreeMap::new());
        }
        md5sums::parse(&std::fs::read_to_string(sums_path)?)
            .map_err(|err| Error::parse(format!("{}: md5sums: {}", name, err)))
    }

    /// Load a package's conffiles list; empty when absent.
    pub fn package_conffiles(&self, name: &str) -> Result<Vec<String>> {
        let conffiles_path = self.package_dir(name).join("conffiles");
        if !conffiles_path.exists() {
            return Ok(vec![]);
        }
        Ok(std::fs::read_to_string(conffiles_path)?
            .lines()
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Install maintainer scripts into a package's database entry.
    pub fn write_package_scripts(
        &self,
        name: &str,
        scripts: &BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        let dir = self.package_dir(name);
        std::fs::create_dir_all(&dir)?;
        for (script_name, content) in scripts {
            let script_path = dir.join(script_name);
            std::fs::write(&script_path, content)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(
                    &script_path,
                    std::fs::Permissions::from_mode(0o755),
                )?;
            }
        }
        Ok(())
    }

    /// Verify one package's on-disk state against its database entry:
    /// every indexed file must exist, every recorded digest must match,
    /// and every conffile must name an indexed regular file. Returns the
    /// list of findings, empty when the package is sound.
    pub fn audit_package(&mut self, name: &str) -> Result<Vec<String>> {
        let mut findings = vec![];
        if !self.package_status(name).is_unpacked() {
            return Ok(vec![format!("{} is not unpacked", name)]);
        }

        let index = self.file_index(name)?;
        for file_path in index.file_paths() {
            self.check_interrupt()?;
            if !self.target_path(file_path).exists() {
                findings.push(format!("{} is missing", file_path));
            }
        }
        for (file_path, expected) in self.package_md5sums(name)? {
            let absolute = self.target_path(&file_path);
            if !absolute.exists() {
                continue;
            }
            let actual = md5sums::digest(&std::fs::read(&absolute)?);
            if actual != expected {
                findings.push(format!("{} digest mismatch", file_path));
            }
        }
        for conffile in self.package_conffiles(name)? {
            if !index.file_paths().contains(&conffile.as_str()) {
                findings.push(format!("conffile {} is not in the file index", conffile));
            }
        }
        Ok(findings)
    }

    /// Map from owned path to owning package over every package whose
    /// files are expected on disk.
    pub fn file_owners(&mut self) -> Result<BTreeMap<String, String>> {
        let mut ret = BTreeMap::new();
        for name in self.list_installed_packages()? {
            self.check_interrupt()?;
            if !self.package_status(&name).is_unpacked() {
                continue;
            }
            for file_path in self.file_index(&name)?.file_paths() {
                ret.insert(file_path.to_owned(), name.clone());
            }
        }
        Ok(ret)
    }

    /// Drop one package's database entry entirely.
    pub fn remove_package_dir(&mut self, name: &str) -> Result<()> {
        let dir = self.package_dir(name);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        self.controls.remove(name);
        Ok(())
    }

    /// Delete the files a package delivered to the target root:
    /// everything in its index except directories, with conffiles kept
    /// aside when requested, then prune its now-empty directories.
    pub fn erase_unpacked_files(&mut self, name: &str, keep_conffiles: bool) -> Result<()> {
        let index = self.file_index(name)?;
        let conffiles = self.package_conffiles(name)?;
        for file_path in index.file_paths() {
            self.check_interrupt()?;
            if keep_conffiles && conffiles.iter().any(|c| c == file_path) {
                continue;
            }
            let absolute = self.target_path(file_path);
            match std::fs::remove_file(&absolute) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(Error::io(format!("{}: {}", absolute.display(), err)))
                }
            }
        }
        for dir_path in index.directory_paths_deepest_first() {
            let absolute = self.target_path(dir_path);
            // only empty directories go; shared ones stay behind
            let _ = std::fs::remove_dir(&absolute);
        }
        Ok(())
    }

    // ---- hooks --------------------------------------------------------

    fn hooks_dir(&self) -> PathBuf {
        self.package_dir(CORE_PACKAGE).join("hooks")
    }

    /// Store a global hook script under `core/hooks/` as `core_<name>`.
    pub fn add_global_hook(&self, name: &str, content: &[u8]) -> Result<()> {
        let dir = self.hooks_dir();
        std::fs::create_dir_all(&dir)?;
        let hook_path = dir.join(format!("core_{}", name));
        std::fs::write(&hook_path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }

    /// Delete a global hook. Returns whether it existed.
    pub fn remove_global_hook(&self, name: &str) -> Result<bool> {
        let hook_path = self.hooks_dir().join(format!("core_{}", name));
        if !hook_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(hook_path)?;
        Ok(true)
    }

    /// Every hook known to the database: global `core_*` hooks followed
    /// by per-package ones as `<package>/<hook>`.
    pub fn list_hooks(&self) -> Result<Vec<String>> {
        let mut ret = vec![];
        if self.hooks_dir().exists() {
            for entry in std::fs::read_dir(self.hooks_dir())? {
                ret.push(entry?.file_name().to_string_lossy().into_owned());
            }
        }
        for name in self.list_installed_packages()? {
            let package_hooks = self.package_dir(&name).join("hooks");
            if !package_hooks.exists() {
                continue;
            }
            for entry in std::fs::read_dir(package_hooks)? {
                ret.push(format!(
                    "{}/{}",
                    name,
                    entry?.file_name().to_string_lossy()
                ));
            }
        }
        ret.sort();
        Ok(ret)
    }

    /// Run every global hook with the given arguments. Hook failures are
    /// demoted to warnings; hooks observe transactions, they do not gate
    /// them.
    pub fn run_global_hooks(&self, args: &[&str]) -> Result<()> {
        if !self.hooks_dir().exists() {
            return Ok(());
        }
        let env = self.script_env();
        let mut hooks = std::fs::read_dir(self.hooks_dir())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect::<Vec<_>>();
        hooks.sort();
        for hook in hooks {
            self.check_interrupt()?;
            if let Err(err) = self.runner.run(&hook, args, &env) {
                self.output
                    .warning(&format!("hook {} failed: {}", hook.display(), err));
            }
        }
        Ok(())
    }

    // ---- maintainer scripts ------------------------------------------

    /// The environment every script receives.
    pub fn script_env(&self) -> ScriptEnvironment {
        ScriptEnvironment {
            root_dir: self.root_dir.clone(),
            inst_dir: self.inst_dir.clone(),
            admin_dir: self.admin_dir.clone(),
        }
    }

    /// Run a script from an arbitrary path with the standard environment.
    pub fn run_script_path(&self, script_path: &Path, args: &[&str]) -> Result<()> {
        self.runner.run(script_path, args, &self.script_env())
    }

    /// Best-effort transient status update: only applies when the
    /// package already has a database entry, and never fails the caller.
    pub fn set_transient_status(&mut self, name: &str, status: PackageStatus) {
        if self.package_dir(name).join("control").exists() {
            if let Err(err) = self.set_package_status(name, status) {
                self.output
                    .warning(&format!("{}: cannot record {}: {}", name, status, err));
            }
        }
    }

    /// Run one of a package's maintainer scripts from its database entry.
    /// A missing script is a successful no-op; a failing one is an error.
    /// Returns whether a script actually ran.
    pub fn run_maintainer_script(
        &self,
        name: &str,
        script: &str,
        args: &[&str],
    ) -> Result<bool> {
        let script_path = self.package_dir(name).join(script);
        if !script_path.exists() {
            return Ok(false);
        }
        self.runner.run(&script_path, args, &self.script_env())?;
        Ok(true)
    }

    // ---- self protection ---------------------------------------------

    /// Register the packager's own package name so a self-upgrade can be
    /// detected and routed through a re-executed copy.
    pub fn add_self(&mut self, name: &str) {
        self.self_names.insert(name.to_owned());
    }

    /// Whether the given package is the packager itself.
    pub fn is_self(&self, name: &str) -> bool {
        self.self_names.contains(name)
    }

    // ---- journal ------------------------------------------------------

    /// Attach the transaction journal. Only one may be attached.
    pub fn set_tracker(&mut self, tracker: Tracker) -> Result<()> {
        if self.tracker.is_some() {
            return Err(Error::new(
                ErrorKind::DefinedTwice,
                "a tracker is already attached",
            ));
        }
        self.tracker = Some(tracker);
        Ok(())
    }

    /// Whether a transaction is live.
    pub fn has_tracker(&self) -> bool {
        self.tracker.is_some()
    }

    /// Append one line to the journal, when a tracker is attached.
    pub fn track(&mut self, line: &str) -> Result<()> {
        if let Some(tracker) = &mut self.tracker {
            tracker.track(line)?;
        }
        Ok(())
    }

    /// Commit the transaction: the journal is deleted and the backup
    /// scratch area cleared.
    pub fn commit_tracker(&mut self) -> Result<()> {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.commit()?;
        }
        self.clear_backups()
    }

    /// Roll the transaction back by replaying the journal in reverse.
    pub fn rollback_tracker(&mut self) -> Result<()> {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.rollback(self)?;
        }
        Ok(())
    }

    /// Detach the tracker without rolling back, leaving the journal (and
    /// the backup scratch) on disk for inspection or a later replay.
    pub fn abandon_tracker(&mut self) -> Result<()> {
        if let Some(mut tracker) = self.tracker.take() {
            tracker.keep_file(true);
            tracker.commit()?;
        }
        Ok(())
    }

    // ---- backup scratch ----------------------------------------------

    fn backup_root(&self) -> PathBuf {
        self.admin_dir.join("backup")
    }

    /// Open a fresh backup scratch directory and return its id.
    pub fn new_backup(&mut self) -> Result<String> {
        self.backup_counter += 1;
        let id = format!("{}-{}", std::process::id(), self.backup_counter);
        std::fs::create_dir_all(self.backup_root().join(&id).join("files"))?;
        std::fs::create_dir_all(self.backup_root().join(&id).join("db"))?;
        Ok(id)
    }

    /// Copy one target-root file into a backup scratch before it is
    /// displaced.
    pub fn backup_file(&self, backup_id: &str, relative: &str) -> Result<()> {
        let source = self.target_path(relative);
        if !source.exists() {
            return Ok(());
        }
        let target = self.backup_root().join(backup_id).join("files").join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&source, &target)
            .map_err(|err| Error::io(format!("{}: {}", source.display(), err)))?;
        Ok(())
    }

    /// Snapshot a package's whole database entry into a backup scratch.
    pub fn backup_package_db(&self, backup_id: &str, name: &str) -> Result<()> {
        let source = self.package_dir(name);
        if !source.exists() {
            return Ok(());
        }
        let target = self.backup_root().join(backup_id).join("db").join(name);
        copy_dir_recursive(&source, &target)?;
        Ok(())
    }

    /// Restore everything a backup scratch holds: displaced target-root
    /// files and database entries. The scratch is removed afterwards.
    pub fn restore_backup(&mut self, backup_id: &str) -> Result<()> {
        let scratch = self.backup_root().join(backup_id);
        if !scratch.exists() {
            return Ok(());
        }
        let files = scratch.join("files");
        if files.exists() {
            copy_dir_recursive(&files, &self.root_dir)?;
        }
        let db = scratch.join("db");
        if db.exists() {
            for entry in std::fs::read_dir(&db)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let target = self.package_dir(&name);
                if target.exists() {
                    std::fs::remove_dir_all(&target)?;
                }
                copy_dir_recursive(&entry.path(), &target)?;
                self.controls.remove(&name);
            }
        }
        std::fs::remove_dir_all(scratch)?;
        Ok(())
    }

    /// Drop the whole backup scratch area.
    pub fn clear_backups(&self) -> Result<()> {
        let backup_root = self.backup_root();
        if backup_root.exists() {
            std::fs::remove_dir_all(backup_root)?;
        }
        Ok(())
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        // scope-guard backstop: an uncommitted transaction rolls back
        if let Some(mut tracker) = self.tracker.take() {
            if let Err(err) = tracker.rollback(self) {
                self.output
                    .error(&format!("rollback on shutdown failed: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn manager() -> (tempfile::TempDir, Manager) {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new(dir.path());
        manager
            .create_database(&"linux-amd64".parse().unwrap(), "Test <test@example.com>")
            .unwrap();
        (dir, manager)
    }

    #[test]
    fn create_database_is_idempotent() {
        let (_dir, mut manager) = manager();
        manager
            .create_database(&"linux-i386".parse().unwrap(), "Other <o@example.com>")
            .unwrap();
        // the first creation wins
        assert_eq!(
            "linux-amd64",
            manager.architecture().unwrap().to_string()
        );
    }

    #[test]
    fn lock_is_exclusive_and_removable() {
        let (_dir, mut manager) = manager();
        manager.lock("installing").unwrap();
        assert!(manager.is_locked());

        let mut second = Manager::new(manager.root_dir());
        let err = second.lock("listing").unwrap_err();
        assert_eq!(ErrorKind::Locked, err.kind());

        manager.unlock().unwrap();
        second.lock("listing").unwrap();
        second.remove_lock().unwrap();
    }

    #[test]
    fn fields_persist_across_managers() {
        let (dir, mut manager) = manager();
        let mut control = ControlFile::new();
        control.set("Package", "demo");
        control.set("Version", "1.0");
        control.set(STATUS_FIELD, "installed");
        manager.write_package_control("demo", &control).unwrap();
        manager.set_field("demo", "X-Note", "kept").unwrap();

        let mut reloaded = Manager::new(dir.path());
        assert_eq!(
            Some("kept".to_owned()),
            reloaded.get_field("demo", "X-Note").unwrap()
        );
        assert_eq!(PackageStatus::Installed, reloaded.package_status("demo"));
        assert!(reloaded.delete_field("demo", "X-Note").unwrap());
    }

    #[test]
    fn reject_selection_creates_a_stub() {
        let (_dir, mut manager) = manager();
        manager
            .set_package_selection("never", Selection::Reject)
            .unwrap();
        assert_eq!(Selection::Reject, manager.selection("never"));
        assert_eq!(
            PackageStatus::NotInstalled,
            manager.package_status("never")
        );
        // a non-reject selection still needs an installed package
        assert!(manager
            .set_package_selection("missing", Selection::Hold)
            .is_err());
    }

    #[test]
    fn hooks_store_and_list() {
        let (_dir, mut manager) = manager();
        manager.add_global_hook("audit", b"#!/bin/sh\nexit 0\n").unwrap();
        let hooks = manager.list_hooks().unwrap();
        assert_eq!(vec!["core_audit".to_owned()], hooks);
        assert!(manager.remove_global_hook("audit").unwrap());
        assert!(!manager.remove_global_hook("audit").unwrap());
    }

    #[test]
    fn backups_restore_files_and_db() {
        let (dir, mut manager) = manager();
        let file_path = dir.path().join("etc/app.conf");
        std::fs::create_dir_all(file_path.parent().unwrap()).unwrap();
        std::fs::write(&file_path, "original").unwrap();

        let mut control = ControlFile::new();
        control.set("Package", "demo");
        control.set(STATUS_FIELD, "installed");
        manager.write_package_control("demo", &control).unwrap();

        let backup = manager.new_backup().unwrap();
        manager.backup_file(&backup, "etc/app.conf").unwrap();
        manager.backup_package_db(&backup, "demo").unwrap();

        std::fs::write(&file_path, "clobbered").unwrap();
        manager.remove_package_dir("demo").unwrap();

        manager.restore_backup(&backup).unwrap();
        assert_eq!("original", std::fs::read_to_string(&file_path).unwrap());
        assert_eq!(PackageStatus::Installed, manager.package_status("demo"));
    }

    #[test]
    fn self_registration() {
        let (_dir, mut manager) = manager();
        assert!(!manager.is_self("wpkg"));
        manager.add_self("wpkg");
        assert!(manager.is_self("wpkg"));
    }
}

// vim: foldmethod=marker
