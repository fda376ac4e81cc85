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

use super::IndexPackage;
use crate::database::{Manager, PackageStatus, Selection};
use crate::errors::Result;
use crate::version::Version;

/// How one index candidate relates to the installed state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpgradeClass {
    /// Not installed at all.
    NotInstalled,

    /// Installed, and the index carries something newer.
    NeedUpgrade,

    /// Newer in the index, but held (or rejected) locally.
    BlockedUpgrade,

    /// Installed and current (or newer than the index).
    Installed,

    /// The index entry itself cannot be used.
    Invalid,
}

/// One row of the upgrade plan.
#[derive(Clone, Debug)]
pub struct UpgradeItem {
    /// Package name.
    pub name: String,

    /// Installed version, when installed.
    pub installed: Option<Version>,

    /// Version offered by the index, when decodable.
    pub available: Option<Version>,

    /// Classification against the installed state.
    pub class: UpgradeClass,

    /// Why the entry is [UpgradeClass::Invalid], when it is.
    pub cause: Option<String>,

    /// Whether the candidate's urgency marks it as a priority upgrade.
    pub urgent: bool,
}

fn is_urgent(urgency: Option<String>) -> bool {
    let Some(urgency) = urgency else {
        return false;
    };
    let keyword = urgency
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    matches!(keyword.as_str(), "high" | "emergency" | "critical")
}

/// Compare every index candidate with the installed state and classify
/// it. Rows come back in index order.
pub fn upgrade_list(
    manager: &mut Manager,
    index: &[IndexPackage],
) -> Result<Vec<UpgradeItem>> {
    let mut ret = vec![];

    for candidate in index {
        manager.check_interrupt()?;

        let Some(name) = candidate.control.get_line("Package") else {
            ret.push(UpgradeItem {
                name: format!("<{}>", candidate.deb_path),
                installed: None,
                available: None,
                class: UpgradeClass::Invalid,
                cause: Some("index entry without a Package field".to_owned()),
                urgent: false,
            });
            continue;
        };

        let available = candidate
            .control
            .get_line("Version")
            .and_then(|text| text.parse::<Version>().ok());
        let Some(available) = available else {
            ret.push(UpgradeItem {
                name,
                installed: None,
                available: None,
                class: UpgradeClass::Invalid,
                cause: Some("index entry without a usable Version field".to_owned()),
                urgent: false,
            });
            continue;
        };

        let status = manager.package_status(&name);
        let installed = manager.installed_version(&name);
        let urgent = is_urgent(candidate.control.get_line("Urgency"));

        let class = match (&installed, status) {
            (None, _) | (_, PackageStatus::NotInstalled | PackageStatus::ConfigFiles) => {
                UpgradeClass::NotInstalled
            }
            (Some(installed), _) if *installed < available => {
                match manager.selection(&name) {
                    Selection::Hold | Selection::Reject => UpgradeClass::BlockedUpgrade,
                    _ => UpgradeClass::NeedUpgrade,
                }
            }
            _ => UpgradeClass::Installed,
        };

        ret.push(UpgradeItem {
            name,
            installed,
            available: Some(available),
            class,
            cause: None,
            urgent: urgent && class == UpgradeClass::NeedUpgrade,
        });
    }

    Ok(ret)
}

/// The urgent subset of an upgrade plan: candidates needing an upgrade
/// whose urgency is `high`, `emergency` or `critical`.
pub fn urgent_upgrades(items: &[UpgradeItem]) -> Vec<&UpgradeItem> {
    items
        .iter()
        .filter(|item| item.class == UpgradeClass::NeedUpgrade && item.urgent)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::control::ControlFile;

    fn index_package(text: &str) -> IndexPackage {
        IndexPackage {
            control: ControlFile::parse(text).unwrap(),
            deb_path: "pool/pkg.deb".to_owned(),
            deb_size: 1,
            deb_mtime: 0,
        }
    }

    fn manager_with(name: &str, version: &str, selection: Selection) -> (tempfile::TempDir, Manager) {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new(dir.path());
        manager
            .create_database(&"linux-amd64".parse().unwrap(), "T <t@example.com>")
            .unwrap();
        let mut control = ControlFile::new();
        control.set("Package", name);
        control.set("Version", version);
        control.set("X-Status", "installed");
        control.set("X-Selection", selection.as_str());
        manager.write_package_control(name, &control).unwrap();
        (dir, manager)
    }

    #[test]
    fn classifies_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new(dir.path());
        manager
            .create_database(&"linux-amd64".parse().unwrap(), "T <t@example.com>")
            .unwrap();
        let items = upgrade_list(
            &mut manager,
            &[index_package("Package: new\nVersion: 1.0\n")],
        )
        .unwrap();
        assert_eq!(UpgradeClass::NotInstalled, items[0].class);
    }

    #[test]
    fn classifies_need_and_blocked_upgrades() {
        let (_dir, mut manager) = manager_with("app", "1.0", Selection::Normal);
        let items = upgrade_list(
            &mut manager,
            &[index_package("Package: app\nVersion: 2.0\nUrgency: high\n")],
        )
        .unwrap();
        assert_eq!(UpgradeClass::NeedUpgrade, items[0].class);
        assert!(items[0].urgent);
        assert_eq!(1, urgent_upgrades(&items).len());

        let (_dir, mut held) = manager_with("app", "1.0", Selection::Hold);
        let items = upgrade_list(
            &mut held,
            &[index_package("Package: app\nVersion: 2.0\n")],
        )
        .unwrap();
        assert_eq!(UpgradeClass::BlockedUpgrade, items[0].class);
    }

    #[test]
    fn classifies_current_and_invalid() {
        let (_dir, mut manager) = manager_with("app", "2.0", Selection::Normal);
        let items = upgrade_list(
            &mut manager,
            &[
                index_package("Package: app\nVersion: 2.0\n"),
                index_package("Package: broken\n"),
            ],
        )
        .unwrap();
        assert_eq!(UpgradeClass::Installed, items[0].class);
        assert_eq!(UpgradeClass::Invalid, items[1].class);
        assert!(items[1].cause.is_some());
    }
}

// vim: foldmethod=marker
