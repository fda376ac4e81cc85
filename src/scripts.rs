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

//! The `scripts` module runs maintainer scripts and hooks.
//!
//! Scripts run synchronously with stdout and stderr forwarded; the exit
//! status is authoritative. Every invocation receives the documented
//! environment: `WPKG_ROOTDIR`, `WPKG_INSTDIR`, `WPKG_ADMINDIR`, a `PATH`
//! prefixed with the install prefix's `bin` directory and, on Unix-like
//! targets, an `LD_LIBRARY_PATH` prefixed with its `lib` directory. The
//! runner sits behind a trait so tests and embedders can substitute their
//! own process handling.

use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};

/// Paths exported to every maintainer script and hook.
#[derive(Clone, Debug)]
pub struct ScriptEnvironment {
    /// Target filesystem root.
    pub root_dir: PathBuf,

    /// Installation directory under the root.
    pub inst_dir: PathBuf,

    /// Administrative database directory.
    pub admin_dir: PathBuf,
}

/// Something able to run one script to completion.
pub trait ScriptRunner {
    /// Run `script` with `args`, forwarding output, and fail unless the
    /// exit status is zero.
    fn run(&self, script: &Path, args: &[&str], env: &ScriptEnvironment) -> Result<()>;
}

/// The production [ScriptRunner]: a synchronous subprocess per script.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn prefixed(existing: Option<std::ffi::OsString>, addition: &Path) -> std::ffi::OsString {
        let mut value = std::ffi::OsString::from(addition);
        if let Some(existing) = existing {
            if !existing.is_empty() {
                value.push(if cfg!(windows) { ";" } else { ":" });
                value.push(existing);
            }
        }
        value
    }
}

impl ScriptRunner for ProcessRunner {
    fn run(&self, script: &Path, args: &[&str], env: &ScriptEnvironment) -> Result<()> {
        let mut command = if cfg!(windows) {
            let mut command = std::process::Command::new("cmd");
            command.arg("/c").arg(script);
            command
        } else {
            let mut command = std::process::Command::new("/bin/sh");
            command.arg(script);
            command
        };
        command.args(args);

        command.env("WPKG_ROOTDIR", &env.root_dir);
        command.env("WPKG_INSTDIR", &env.inst_dir);
        command.env("WPKG_ADMINDIR", &env.admin_dir);
        command.env(
            "PATH",
            Self::prefixed(std::env::var_os("PATH"), &env.inst_dir.join("bin")),
        );
        if !cfg!(windows) {
            command.env(
                "LD_LIBRARY_PATH",
                Self::prefixed(
                    std::env::var_os("LD_LIBRARY_PATH"),
                    &env.inst_dir.join("lib"),
                ),
            );
        }

        let status = command
            .status()
            .map_err(|err| Error::io(format!("{}: {}", script.display(), err)))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::io(format!(
                "{} {} exited with status {}",
                script.display(),
                args.join(" "),
                status.code().unwrap_or(-1)
            )))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn environment(dir: &Path) -> ScriptEnvironment {
        ScriptEnvironment {
            root_dir: dir.to_owned(),
            inst_dir: dir.join("usr"),
            admin_dir: dir.join("var/lib/wpkg"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn zero_exit_succeeds_and_environment_is_visible() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("probe.sh");
        let marker = dir.path().join("marker");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\ntest -n \"$WPKG_ROOTDIR\" || exit 1\ntest -n \"$WPKG_ADMINDIR\" || exit 1\necho \"$1\" > {}\n",
                marker.display()
            ),
        )
        .unwrap();

        ProcessRunner
            .run(&script, &["install"], &environment(dir.path()))
            .unwrap();
        assert_eq!("install\n", std::fs::read_to_string(&marker).unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 3\n").unwrap();
        let err = ProcessRunner
            .run(&script, &[], &environment(dir.path()))
            .unwrap_err();
        assert!(err.message().contains("status 3"));
    }
}

// vim: foldmethod=marker
