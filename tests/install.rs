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

#![cfg(unix)]

mod common;

use common::{snapshot, target, TestPackage};
use wpkg::database::PackageStatus;
use wpkg::errors::ErrorKind;
use wpkg::installer::{Installer, RunOutcome};

#[test]
fn install_single_package() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let deb = TestPackage::new("tool", "1.0")
        .file("usr/bin/tool", "#!/bin/sh\necho tool\n")
        .conffile("etc/tool.conf", "mode=fast\n")
        .build(pool.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&deb);
    assert_eq!(RunOutcome::Done, installer.run().unwrap());

    assert_eq!(PackageStatus::Installed, manager.package_status("tool"));
    assert_eq!(
        "#!/bin/sh\necho tool\n",
        std::fs::read_to_string(root.path().join("usr/bin/tool")).unwrap()
    );
    assert_eq!(
        "mode=fast\n",
        std::fs::read_to_string(root.path().join("etc/tool.conf")).unwrap()
    );

    // database entry carries index, md5sums and conffiles
    let index = manager.file_index("tool").unwrap();
    assert!(index.file_paths().contains(&"usr/bin/tool"));
    assert!(manager
        .package_md5sums("tool")
        .unwrap()
        .contains_key("usr/bin/tool"));
    assert_eq!(
        vec!["etc/tool.conf".to_owned()],
        manager.package_conffiles("tool").unwrap()
    );

    // the journal is gone after a successful commit
    assert!(!manager.admin_dir().join("tracker.journal").exists());
}

#[test]
fn missing_dependency_refuses_and_leaves_no_trace() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let deb = TestPackage::new("a", "1.0")
        .field("Depends", "b (>= 1.0)")
        .file("usr/bin/a", "a\n")
        .build(pool.path());

    let before = snapshot(root.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&deb);
    let err = installer.run().unwrap_err();
    assert_eq!(ErrorKind::Dependency, err.kind());

    assert_eq!(PackageStatus::NotInstalled, manager.package_status("a"));
    assert!(!root.path().join("usr/bin/a").exists());
    assert_eq!(before, snapshot(root.path()));
}

#[test]
fn alternative_dependency_pulls_the_available_choice() {
    let (_root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    TestPackage::new("c", "2.0")
        .file("usr/bin/c", "c\n")
        .build(pool.path());
    let a = TestPackage::new("a", "1.0")
        .field("Depends", "b | c")
        .file("usr/bin/a", "a\n")
        .build(pool.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&a);
    installer.add_repository(pool.path());
    installer.run().unwrap();

    assert_eq!(PackageStatus::Installed, manager.package_status("a"));
    assert_eq!(PackageStatus::Installed, manager.package_status("c"));
    assert_eq!(PackageStatus::NotInstalled, manager.package_status("b"));
    assert!(manager.audit_package("a").unwrap().is_empty());
    assert!(manager.audit_package("c").unwrap().is_empty());
}

#[test]
fn file_conflict_refused_then_forced() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let a = TestPackage::new("a", "1.0")
        .file("usr/bin/shared-tool", "from a\n")
        .build(pool.path());
    let b = TestPackage::new("b", "1.0")
        .file("usr/bin/shared-tool", "from b\n")
        .build(pool.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&a);
    installer.run().unwrap();

    // refused by default, nothing changes hands
    let mut installer = Installer::new(&mut manager);
    installer.add_package(&b);
    let err = installer.run().unwrap_err();
    assert_eq!(ErrorKind::Dependency, err.kind());
    assert_eq!(PackageStatus::NotInstalled, manager.package_status("b"));
    assert_eq!(
        "from a\n",
        std::fs::read_to_string(root.path().join("usr/bin/shared-tool")).unwrap()
    );
    assert!(manager
        .file_index("a")
        .unwrap()
        .file_paths()
        .contains(&"usr/bin/shared-tool"));

    // with force-overwrite the file changes owner and a forgets it
    let mut installer = Installer::new(&mut manager);
    installer.add_package(&b);
    installer.flags_mut().overwrite = true;
    installer.run().unwrap();
    assert_eq!(PackageStatus::Installed, manager.package_status("b"));
    assert_eq!(
        "from b\n",
        std::fs::read_to_string(root.path().join("usr/bin/shared-tool")).unwrap()
    );
    assert!(!manager
        .file_index("a")
        .unwrap()
        .file_paths()
        .contains(&"usr/bin/shared-tool"));
}

#[test]
fn configure_failure_rolls_everything_back() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let a = TestPackage::new("a", "1.0")
        .file("usr/bin/a", "a\n")
        .build(pool.path());
    let b = TestPackage::new("b", "1.0")
        .file("usr/bin/b", "b\n")
        .script("postinst", "#!/bin/sh\nexit 1\n")
        .build(pool.path());

    let before = snapshot(root.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&a);
    installer.add_package(&b);
    let err = installer.run().unwrap_err();
    assert_eq!(ErrorKind::Io, err.kind());

    // rollback restored the pre-transaction tree, journal included
    assert_eq!(before, snapshot(root.path()));
    assert!(!manager.admin_dir().join("tracker.journal").exists());
    assert_eq!(PackageStatus::NotInstalled, manager.package_status("a"));
    assert_eq!(PackageStatus::NotInstalled, manager.package_status("b"));
}

#[test]
fn unpack_order_follows_pre_depends() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let log = root.path().join("unpack.log");

    // each preinst appends its package name, exposing the actual order
    let a = TestPackage::new("a", "1.0")
        .field("Pre-Depends", "b")
        .file("usr/share/a/marker", "a\n")
        .script("preinst", &format!("#!/bin/sh\necho a >> {}\n", log.display()))
        .build(pool.path());
    let b = TestPackage::new("b", "1.0")
        .file("usr/share/b/marker", "b\n")
        .script("preinst", &format!("#!/bin/sh\necho b >> {}\n", log.display()))
        .build(pool.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&a);
    installer.add_package(&b);
    installer.run().unwrap();

    assert_eq!("b\na\n", std::fs::read_to_string(&log).unwrap());
}

#[test]
fn upgrade_replaces_and_keeps_history() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let v1 = TestPackage::new("tool", "1.0")
        .file("usr/bin/tool", "one\n")
        .build(pool.path());
    let v2 = TestPackage::new("tool", "2.0")
        .file("usr/bin/tool", "two\n")
        .build(pool.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&v1);
    installer.run().unwrap();

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&v2);
    installer.run().unwrap();

    assert_eq!(
        "2.0",
        manager.installed_version("tool").unwrap().to_string()
    );
    assert_eq!(
        "two\n",
        std::fs::read_to_string(root.path().join("usr/bin/tool")).unwrap()
    );
    // the previous control snapshot is kept as history
    assert!(manager.package_dir("tool").join("control.1").exists());
}

#[test]
fn downgrade_needs_its_force_flag() {
    let (_root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let v2 = TestPackage::new("tool", "2.0")
        .file("usr/bin/tool", "two\n")
        .build(pool.path());
    let v1 = TestPackage::new("tool", "1.0")
        .file("usr/bin/tool", "one\n")
        .build(pool.path());

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&v2);
    installer.run().unwrap();

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&v1);
    assert_eq!(
        ErrorKind::Dependency,
        installer.run().unwrap_err().kind()
    );

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&v1);
    installer.flags_mut().downgrade = true;
    installer.run().unwrap();
    assert_eq!(
        "1.0",
        manager.installed_version("tool").unwrap().to_string()
    );
}

#[test]
fn architecture_mismatch_is_refused() {
    let (_root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();

    let control_text = "\
Package: foreign
Version: 1.0
Architecture: mswindows-i386
Maintainer: Test Suite <tests@example.com>
Description: wrong machine
";
    let control = wpkg::control::ControlFile::parse(control_text).unwrap();
    let mut builder = wpkg::package::PackageBuilder::new(control);
    builder.add_file("usr/bin/foreign", b"x\n", 0o755).unwrap();
    let deb = pool.path().join("foreign_1.0.deb");
    builder.write_to(&deb).unwrap();

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&deb);
    assert_eq!(
        ErrorKind::Compatibility,
        installer.run().unwrap_err().kind()
    );

    let mut installer = Installer::new(&mut manager);
    installer.add_package(&deb);
    installer.flags_mut().architecture = true;
    installer.run().unwrap();
    assert_eq!(PackageStatus::Installed, manager.package_status("foreign"));
}

#[test]
fn upgrading_the_packager_itself_is_detected() {
    let (_root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let deb = TestPackage::new("wpkg", "99.0")
        .file("usr/bin/wpkg", "newer\n")
        .build(pool.path());

    manager.add_self("wpkg");
    let mut installer = Installer::new(&mut manager);
    installer.add_package(&deb);
    installer.collect().unwrap();
    installer.validate().unwrap();
    assert!(installer.needs_self_upgrade());
}

#[test]
fn validate_script_gate_runs_before_any_unpack() {
    let (root, mut manager) = target();
    let pool = tempfile::tempdir().unwrap();
    let deb = TestPackage::new("gated", "1.0")
        .file("usr/bin/gated", "x\n")
        .script("validate", "#!/bin/sh\nexit 1\n")
        .build(pool.path());

    let before = snapshot(root.path());
    let mut installer = Installer::new(&mut manager);
    installer.add_package(&deb);
    assert!(installer.run().is_err());
    assert_eq!(before, snapshot(root.path()));
}

// vim: foldmethod=marker
