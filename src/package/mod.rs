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

//! The `package` module is the binary package codec: reading a `.deb`
//! archive into a fully decoded [BinaryPackage], assembling one with
//! [PackageBuilder], and the `md5sums` format shared by both.
//!
//! A package is an `ar` envelope of exactly three members in order: the
//! `debian-binary` marker (content `2.0\n`), `control.tar[.ext]` with the
//! metadata, and `data.tar[.ext]` with the filesystem payload.

mod binary;
mod builder;
pub mod md5sums;

pub use binary::BinaryPackage;
pub use builder::{increment_build_number, load_build_number, PackageBuilder};

/// Exact content of the `debian-binary` marker member.
pub static PACKAGE_MAGIC: &[u8] = b"2.0\n";

/// The maintainer script names recognised in `control.tar`.
pub static MAINTAINER_SCRIPTS: &[&str] =
    &["preinst", "postinst", "prerm", "postrm", "validate"];

/// Error conditions which may be encountered when decoding or building a
/// binary package.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Failure in the underlying archive codec.
    Archive(crate::archive::Error),

    /// The control file inside the package is malformed.
    Control(crate::control::Error),

    /// The file is not an `ar` archive at all.
    NotAPackage(String),

    /// The `ar` members are not the expected three, or are out of order.
    BadMemberLayout(String),

    /// The `debian-binary` member does not contain `2.0\n`.
    BadMagic(String),

    /// `control.tar` carries no `control` file.
    MissingControl(String),

    /// A required control field is absent.
    MissingField(String),

    /// A control field value cannot be decoded.
    BadField(String),

    /// A maintainer script name outside the recognised set.
    UnknownScript(String),

    /// An `md5sums` line is malformed; carries the line number.
    BadDigestLine(usize),
}
crate::errors::error_enum!(Error);

impl From<crate::archive::Error> for Error {
    fn from(err: crate::archive::Error) -> Self {
        Error::Archive(err)
    }
}

impl From<crate::control::Error> for Error {
    fn from(err: crate::control::Error) -> Self {
        Error::Control(err)
    }
}

impl From<Error> for crate::errors::Error {
    fn from(err: Error) -> Self {
        use crate::errors::ErrorKind;
        let kind = match &err {
            Error::Archive(inner) => {
                return crate::errors::Error::from(inner.clone());
            }
            Error::Control(_) | Error::BadField(_) | Error::BadDigestLine(_) => ErrorKind::Parse,
            Error::NotAPackage(_)
            | Error::BadMemberLayout(_)
            | Error::BadMagic(_)
            | Error::MissingControl(_) => ErrorKind::Io,
            Error::MissingField(_) => ErrorKind::Undefined,
            Error::UnknownScript(_) => ErrorKind::Parameter,
        };
        crate::errors::Error::new(kind, err.to_string())
    }
}

// vim: foldmethod=marker
