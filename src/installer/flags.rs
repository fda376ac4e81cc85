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

/// The `force-*` switches refining which validation failures abort a
/// transaction. Every flag defaults to refusing; `rollback` is the one
/// exception, on by default so a failed transaction restores the
/// pre-transaction state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flags {
    /// Install packages whose architecture does not match the target.
    pub architecture: bool,

    /// Unpack packages which break installed ones.
    pub breaks: bool,

    /// Install packages in active conflict.
    pub conflicts: bool,

    /// Configure in plain topological order even when a dependency cycle
    /// leaves packages blocked.
    pub configure_any: bool,

    /// Proceed with unsatisfied dependencies.
    pub depends: bool,

    /// Accept packages from distributions the target does not list.
    pub distribution: bool,

    /// Replace an installed package with an older version.
    pub downgrade: bool,

    /// Alter packages whose selection is `hold`.
    pub hold: bool,

    /// Overwrite files owned by another installed package.
    pub overwrite: bool,

    /// Replace an existing directory with a file.
    pub overwrite_dir: bool,

    /// Remove packages marked `Essential: yes`.
    pub remove_essential: bool,

    /// Roll the transaction back when a step fails. On by default.
    pub rollback: bool,

    /// Skip candidates whose version equals the installed one.
    pub skip_same_version: bool,

    /// Upgrade across a `Minimum-Upgradable-Version` fence.
    pub upgrade_any_version: bool,

    /// Accept packages from a different vendor.
    pub vendor: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            architecture: false,
            breaks: false,
            conflicts: false,
            configure_any: false,
            depends: false,
            distribution: false,
            downgrade: false,
            hold: false,
            overwrite: false,
            overwrite_dir: false,
            remove_essential: false,
            rollback: true,
            skip_same_version: false,
            upgrade_any_version: false,
            vendor: false,
        }
    }
}

impl Flags {
    /// Fresh defaults.
    pub fn new() -> Self {
        Default::default()
    }

    /// Assert every individual force flag except `overwrite_dir` (too
    /// destructive to imply) and `rollback` (not a refusal switch).
    pub fn force_all(&mut self) -> &mut Self {
        self.architecture = true;
        self.breaks = true;
        self.conflicts = true;
        self.configure_any = true;
        self.depends = true;
        self.distribution = true;
        self.downgrade = true;
        self.hold = true;
        self.overwrite = true;
        self.remove_essential = true;
        self.upgrade_any_version = true;
        self.vendor = true;
        self
    }

    /// Clear every flag, `rollback` included; there is no exclusion list
    /// on the refuse side.
    pub fn refuse_all(&mut self) -> &mut Self {
        *self = Flags {
            rollback: false,
            ..Flags::new()
        };
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_refuse_everything_but_roll_back() {
        let flags = Flags::new();
        assert!(flags.rollback);
        assert!(!flags.overwrite);
        assert!(!flags.depends);
    }

    #[test]
    fn force_all_spares_overwrite_dir_and_rollback() {
        let mut flags = Flags::new();
        flags.force_all();
        assert!(flags.depends);
        assert!(flags.overwrite);
        assert!(!flags.overwrite_dir);
        assert!(flags.rollback);
    }

    #[test]
    fn refuse_all_clears_rollback_too() {
        let mut flags = Flags::new();
        flags.force_all();
        flags.refuse_all();
        assert!(!flags.depends);
        assert!(!flags.rollback);
    }
}

// vim: foldmethod=marker
