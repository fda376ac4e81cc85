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

//! The `dependency` module parses and evaluates dependency expressions.
//!
//! An expression is a comma separated list of [Relation]s, all of which
//! must hold; a relation is a pipe separated list of [Possibility]
//! alternatives, any of which satisfies it; a possibility is a package
//! name with optional version, architecture and build-profile constraints.
//!
//! ```
//! use wpkg::dependency::Dependency;
//!
//! let dep: Dependency = "libc (>= 2.1), editor | vi [linux-amd64]".parse().unwrap();
//! assert_eq!(2, dep.relations.len());
//! ```
//!
//! Substitution variables (`${name}`) must be resolved by the control
//! layer before an expression reaches this parser.
//!
//! Evaluation lives in [evaluate]: given a `lookup(name)` predicate it
//! reports which relations fail and which alternative was chosen for each,
//! preferring installed candidates, then candidates already selected for
//! the running transaction, then the first listed.

mod architecture;
#[allow(clippy::module_inception)]
mod dependency;
mod evaluate;
mod pest;
mod possibility;
mod profile;
mod relation;
mod tests;
mod version;

pub use architecture::{ArchConstraint, ArchConstraints};
pub use dependency::{Dependency, Error};
pub use evaluate::{evaluate, Candidate, Choice, Evaluation};
pub use possibility::Possibility;
pub use profile::{ProfileConstraint, ProfileConstraints};
pub use relation::Relation;
pub use version::{VersionConstraint, VersionOperator};

// vim: foldmethod=marker
