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

//! The `errors` module holds the error plumbing shared by the whole crate.
//!
//! Parser-level modules ([crate::version], [crate::dependency],
//! [crate::control], [crate::archive]) define their own small error enums,
//! glued together with [error_enum!]. The engine-level modules (database,
//! installer, remover, tracker, repository) all speak the same [Error]
//! type, which tags every failure with an [ErrorKind] so callers can make
//! policy decisions (force flags, exit codes) without matching on message
//! strings.

macro_rules! error_enum {
    ($type:ident) => {
        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:?}", self)
            }
        }

        impl std::error::Error for $type {}
    };
}
pub(crate) use error_enum;

/// Classification of an engine failure. Kinds, not types: the same kind can
/// be produced by many modules, and policy (force flags, exit status) keys
/// off the kind alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file or archive is absent, unreadable, or corrupt.
    Io,

    /// A control file, dependency, or version string is malformed. The
    /// message carries `file:line` context where available.
    Parse,

    /// A value is syntactically fine but semantically rejected, such as a
    /// reserved filename or an empty required field.
    Invalid,

    /// Something was declared twice where uniqueness is required.
    DefinedTwice,

    /// A cross-platform rule was violated, such as a special file type on a
    /// platform which cannot represent it.
    Compatibility,

    /// The administrative database is already locked by another process.
    Locked,

    /// A dependency is unsatisfied or a conflict is active. Refinable by
    /// force flags.
    Dependency,

    /// A user interrupt was observed at a safe point.
    Interrupted,

    /// A referenced name or field is absent when it must be present.
    Undefined,

    /// A caller-provided option is out of range.
    Parameter,
}

impl ErrorKind {
    /// Short identifier used when rendering the error.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "io",
            ErrorKind::Parse => "parse",
            ErrorKind::Invalid => "invalid",
            ErrorKind::DefinedTwice => "defined-twice",
            ErrorKind::Compatibility => "compatibility",
            ErrorKind::Locked => "locked",
            ErrorKind::Dependency => "dependency",
            ErrorKind::Interrupted => "interrupted",
            ErrorKind::Undefined => "undefined",
            ErrorKind::Parameter => "parameter",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engine-level error: an [ErrorKind] plus a human-readable message.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message, without the kind tag.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for an [ErrorKind::Io] error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    /// Shorthand for an [ErrorKind::Parse] error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Shorthand for an [ErrorKind::Invalid] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    /// Shorthand for an [ErrorKind::Dependency] error.
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Dependency, message)
    }

    /// Shorthand for an [ErrorKind::Locked] error.
    pub fn locked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Locked, message)
    }

    /// Shorthand for an [ErrorKind::Undefined] error.
    pub fn undefined(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Undefined, message)
    }

    /// Shorthand for an [ErrorKind::Parameter] error.
    pub fn parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parameter, message)
    }

    /// Shorthand for an [ErrorKind::Interrupted] error.
    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Interrupted, "interrupted by user")
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(err.to_string())
    }
}

impl From<crate::version::Error> for Error {
    fn from(err: crate::version::Error) -> Self {
        Error::parse(format!("bad version: {}", err))
    }
}

impl From<crate::dependency::Error> for Error {
    fn from(err: crate::dependency::Error) -> Self {
        Error::parse(format!("bad dependency: {}", err))
    }
}

/// Result alias for the engine-level modules.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_renders_in_message() {
        let err = Error::locked("database locked by pid 42");
        assert_eq!("locked: database locked by pid 42", err.to_string());
        assert_eq!(ErrorKind::Locked, err.kind());
    }

    #[test]
    fn io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(ErrorKind::Io, err.kind());
    }
}

// vim: foldmethod=marker
