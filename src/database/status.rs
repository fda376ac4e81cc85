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

use std::str::FromStr;

/// Lifecycle status of one package in the administrative database.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PackageStatus {
    /// Unknown to the database, or fully purged.
    NotInstalled,

    /// Removed, with only configuration files left behind.
    ConfigFiles,

    /// An unpack or removal was interrupted partway.
    HalfInstalled,

    /// Payload on disk, not yet configured.
    Unpacked,

    /// A configure step started and did not finish.
    HalfConfigured,

    /// Unpacked and configured; the normal resting state.
    Installed,

    /// Transient: an installation is running.
    Installing,

    /// Transient: an upgrade is running.
    Upgrading,

    /// Transient: a removal is running.
    Removing,

    /// Transient: a purge is running.
    Purging,

    /// Transient: the package is being listed.
    Listing,

    /// Transient: an audit is running.
    Verifying,

    /// Transient: loaded and ready for the next step.
    Ready,
}

impl PackageStatus {
    /// The status as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::NotInstalled => "not-installed",
            PackageStatus::ConfigFiles => "config-files",
            PackageStatus::HalfInstalled => "half-installed",
            PackageStatus::Unpacked => "unpacked",
            PackageStatus::HalfConfigured => "half-configured",
            PackageStatus::Installed => "installed",
            PackageStatus::Installing => "installing",
            PackageStatus::Upgrading => "upgrading",
            PackageStatus::Removing => "removing",
            PackageStatus::Purging => "purging",
            PackageStatus::Listing => "listing",
            PackageStatus::Verifying => "verifying",
            PackageStatus::Ready => "ready",
        }
    }

    /// Whether files of this package are expected on disk.
    pub fn is_unpacked(&self) -> bool {
        matches!(
            self,
            PackageStatus::Unpacked
                | PackageStatus::HalfConfigured
                | PackageStatus::Installed
                | PackageStatus::Upgrading
        )
    }

    /// Whether the package counts as present when resolving dependencies
    /// of other packages.
    pub fn is_installed(&self) -> bool {
        matches!(self, PackageStatus::Installed)
    }
}

impl FromStr for PackageStatus {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, ()> {
        Ok(match input {
            "not-installed" => PackageStatus::NotInstalled,
            "config-files" => PackageStatus::ConfigFiles,
            "half-installed" => PackageStatus::HalfInstalled,
            "unpacked" => PackageStatus::Unpacked,
            "half-configured" => PackageStatus::HalfConfigured,
            "installed" => PackageStatus::Installed,
            "installing" => PackageStatus::Installing,
            "upgrading" => PackageStatus::Upgrading,
            "removing" => PackageStatus::Removing,
            "purging" => PackageStatus::Purging,
            "listing" => PackageStatus::Listing,
            "verifying" => PackageStatus::Verifying,
            "ready" => PackageStatus::Ready,
            _ => return Err(()),
        })
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-package user intent, stored in the `X-Selection` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Installed to satisfy a dependency; removable once orphaned.
    Auto,

    /// Explicitly requested by the user.
    Manual,

    /// No particular intent recorded.
    Normal,

    /// Must not be upgraded, removed or otherwise altered.
    Hold,

    /// Must never be installed at all.
    Reject,
}

impl Selection {
    /// The selection as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Selection::Auto => "auto",
            Selection::Manual => "manual",
            Selection::Normal => "normal",
            Selection::Hold => "hold",
            Selection::Reject => "reject",
        }
    }
}

impl FromStr for Selection {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, ()> {
        Ok(match input {
            "auto" => Selection::Auto,
            "manual" => Selection::Manual,
            "normal" => Selection::Normal,
            "hold" => Selection::Hold,
            "reject" => Selection::Reject,
            _ => return Err(()),
        })
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            PackageStatus::NotInstalled,
            PackageStatus::ConfigFiles,
            PackageStatus::Unpacked,
            PackageStatus::Installed,
            PackageStatus::HalfConfigured,
        ] {
            assert_eq!(Ok(status), status.as_str().parse());
        }
        assert!("broken".parse::<PackageStatus>().is_err());
    }

    #[test]
    fn selection_round_trips() {
        for selection in [
            Selection::Auto,
            Selection::Manual,
            Selection::Normal,
            Selection::Hold,
            Selection::Reject,
        ] {
            assert_eq!(Ok(selection), selection.as_str().parse());
        }
    }
}

// vim: foldmethod=marker
