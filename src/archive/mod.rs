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

//! The `archive` module is the low level codec layer: in-memory files
//! with format detection ([MemoryFile]), the gzip/bzip2/lzma/xz
//! compression codecs ([Compression]), uniform `tar` and `ar` entry
//! records ([ArchiveEntry]) with readers and writers, and the path
//! hygiene rules applied to every entry name.

mod ar;
mod compression;
mod entry;
mod memory_file;
pub mod path;
mod tar;

pub use ar::{read_ar, ArWriter};
pub use compression::{Compression, CODECS};
pub use entry::{ArchiveEntry, EntryType};
pub use memory_file::{FileFormat, MemoryFile};
pub use tar::{read_tar, TarWriter};

/// Error conditions which may be encountered in the codec layer.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Underlying I/O failure, with context.
    Io(String),

    /// A compression level outside 1..=9 was requested.
    BadLevel(u32),

    /// The stream is damaged or impossible to encode.
    Corrupt(String),

    /// The buffer is not a `tar` or `ar` archive.
    NotAnArchive(String),

    /// An entry path uses a name reserved on some supported platform.
    ReservedName(String),

    /// An entry path contains forbidden characters or escapes its root.
    InvalidPath(String),

    /// The target file already exists and overwrite was not requested.
    FileExists(String),
}
crate::errors::error_enum!(Error);

impl Error {
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<Error> for crate::errors::Error {
    fn from(err: Error) -> Self {
        use crate::errors::ErrorKind;
        let kind = match &err {
            Error::Io(_) | Error::NotAnArchive(_) | Error::Corrupt(_) => ErrorKind::Io,
            Error::BadLevel(_) => ErrorKind::Parameter,
            Error::ReservedName(_) | Error::InvalidPath(_) => ErrorKind::Invalid,
            Error::FileExists(_) => ErrorKind::Io,
        };
        crate::errors::Error::new(kind, err.to_string())
    }
}

// vim: foldmethod=marker
