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

#![deny(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! The `wpkg` crate is a Debian-compatible package manager engine: it
//! reads and writes binary package archives, maintains an on-disk
//! administrative database of installed state, and installs, removes,
//! upgrades and builds packages transactionally.
//!
//! # Layout
//!
//! The crate is layered bottom-up:
//!
//! - [archive] -- in-memory files, compression codecs, `tar`/`ar` entry
//!   iteration and path hygiene;
//! - [control] -- the RFC 822-like field files carried by packages, with
//!   sub-package qualifiers, substitution variables and a verifying
//!   field registry;
//! - [version] and [dependency] -- Debian version ordering and dependency
//!   expression parsing plus evaluation;
//! - [package] -- the `.deb` codec (reader and builder);
//! - [database] -- the administrative database manager, its lock, package
//!   statuses and selections;
//! - [tracker] -- the transaction journal and its reverse replay;
//! - [installer] and [remover] -- the validate/unpack/configure and
//!   remove/deconfigure/purge engines;
//! - [repository] -- archive indexes, sources, update state and the
//!   upgrade planner.
//!
//! Everything is single threaded and cooperative: long-running loops
//! poll the [interrupt] flag and unwind with a typed error when a stop
//! was requested, rolling back any live transaction.
//!
//! # A tiny round trip
//!
//! ```
//! use wpkg::control::ControlFile;
//! use wpkg::package::PackageBuilder;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let control = ControlFile::parse(
//!     "Package: demo\n\
//!      Version: 1.0\n\
//!      Architecture: all\n\
//!      Maintainer: Jane Doe <jane@example.com>\n\
//!      Description: demonstration\n",
//! )
//! .unwrap();
//! let mut builder = PackageBuilder::new(control);
//! builder.add_file("usr/share/demo/marker", b"hi\n", 0o644).unwrap();
//! builder.write_to(dir.path().join("demo_1.0_all.deb")).unwrap();
//! ```
//!
//! # Feature `serde`
//!
//! Adds `serde::Serialize` and `serde::Deserialize` implementations (as
//! string round-trips) for [version::Version] and
//! [dependency::Dependency].

pub mod architecture;
pub mod archive;
pub mod control;
pub mod database;
pub mod dependency;
pub mod errors;
pub mod installer;
pub mod interrupt;
pub mod output;
pub mod package;
pub mod remover;
pub mod repository;
pub mod scripts;
pub mod tracker;
pub mod version;

// vim: foldmethod=marker
