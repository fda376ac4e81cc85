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

//! The `control` module reads and writes the RFC 822-like field files
//! carried by packages and stored in the administrative database.
//!
//! A [ControlFile] preserves field order, logical line structure and
//! source line numbers; lookups are case insensitive and understand the
//! `Name/sub` sub-package qualifiers used by multi-binary builds.
//! Substitution variables (`${name}`) are resolved through [Substvars],
//! and the closed [registry] table attaches a verifier and a help string
//! to every known field.

mod field;
#[allow(clippy::module_inception)]
mod file;
pub mod registry;
mod substvars;

pub use field::Field;
pub use file::{ControlFile, Error, SubPackage};
pub use registry::{missing_binary_fields, validate, Diagnostic, FieldDescriptor};
pub use substvars::Substvars;

// vim: foldmethod=marker
