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

//! The `output` module is the level-tagged diagnostic sink shared by the
//! installer, remover and database manager.
//!
//! Messages are forwarded to the [tracing] facade so the embedding
//! application decides where they land; the sink itself only keeps the
//! counters that drive exit-status policy: a `warning` never changes the
//! exit code, an `error` or `fatal` does, and `fatal` additionally stops
//! further work.

use std::cell::Cell;

/// Severity of a diagnostic message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Chatty progress detail, off by default in most subscribers.
    Debug,

    /// Normal progress reporting.
    Info,

    /// Something looks wrong but the operation continues and the exit
    /// status is unaffected.
    Warning,

    /// The operation failed; the exit status will be non-zero.
    Error,

    /// The operation failed and no further work should be attempted.
    Fatal,
}

impl Level {
    /// Identifier used when rendering the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic sink with severity counters. The engine is single threaded,
/// so plain [Cell] counters are enough and logging stays possible from
/// shared-borrow contexts.
#[derive(Debug, Default)]
pub struct Output {
    warnings: Cell<u32>,
    errors: Cell<u32>,
    fatal: Cell<bool>,
}

impl Output {
    /// A fresh sink with zeroed counters.
    pub fn new() -> Self {
        Default::default()
    }

    /// Record and forward one message.
    pub fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!(target: "wpkg", "{}", message),
            Level::Info => tracing::info!(target: "wpkg", "{}", message),
            Level::Warning => {
                self.warnings.set(self.warnings.get() + 1);
                tracing::warn!(target: "wpkg", "{}", message);
            }
            Level::Error => {
                self.errors.set(self.errors.get() + 1);
                tracing::error!(target: "wpkg", "{}", message);
            }
            Level::Fatal => {
                self.errors.set(self.errors.get() + 1);
                self.fatal.set(true);
                tracing::error!(target: "wpkg", "fatal: {}", message);
            }
        }
    }

    /// Convenience wrapper for [Level::Debug].
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    /// Convenience wrapper for [Level::Info].
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    /// Convenience wrapper for [Level::Warning].
    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    /// Convenience wrapper for [Level::Error].
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    /// Number of warnings seen so far.
    pub fn warning_count(&self) -> u32 {
        self.warnings.get()
    }

    /// Number of errors (including fatal ones) seen so far.
    pub fn error_count(&self) -> u32 {
        self.errors.get()
    }

    /// Whether any error-or-worse message was recorded, i.e. whether the
    /// process exit status must be non-zero.
    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }

    /// Whether a fatal message was recorded and work must stop.
    pub fn is_fatal(&self) -> bool {
        self.fatal.get()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn warnings_do_not_flip_exit_status() {
        let out = Output::new();
        out.warning("careful");
        out.warning("really");
        assert_eq!(2, out.warning_count());
        assert!(!out.has_errors());
        assert!(!out.is_fatal());
    }

    #[test]
    fn errors_count_and_fatal_latches() {
        let out = Output::new();
        out.error("broken");
        assert!(out.has_errors());
        assert!(!out.is_fatal());
        out.log(Level::Fatal, "very broken");
        assert_eq!(2, out.error_count());
        assert!(out.is_fatal());
    }
}

// vim: foldmethod=marker
