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

use super::{
    pest::{DependencyParser, Rule},
    Relation,
};
use crate::{architecture, version};
use pest::{error::Error as PestError, iterators::Pair, Parser};
use std::str::FromStr;

/// A dependency expression: a set of [Relation]s which must *all* be
/// satisfied. Seen in `Depends`, `Pre-Depends`, `Conflicts`, `Breaks` and
/// the other relationship fields of a control file.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dependency {
    /// The relations; every one must hold for the expression to hold.
    pub relations: Vec<Relation>,
}

/// Error conditions which may be encountered when parsing a String into a
/// [Dependency].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The expression text does not match the grammar. Carries the
    /// underlying message and input location.
    Parse((String, pest::error::InputLocation)),

    /// A possibility was decoded without a package name.
    InvalidPossibility,

    /// A version inside a constraint is malformed.
    InvalidVersion(version::Error),

    /// A version constraint is missing its operator or version.
    InvalidVersionConstraint,

    /// An architecture restriction entry is malformed.
    InvalidArch(architecture::Error),

    /// More than one version constraint was given for one possibility.
    TooManyVersions,

    /// More than one architecture restriction list was given for one
    /// possibility.
    TooManyArches,
}
crate::errors::error_enum!(Error);

impl From<version::Error> for Error {
    fn from(err: version::Error) -> Self {
        Error::InvalidVersion(err)
    }
}

impl From<architecture::Error> for Error {
    fn from(err: architecture::Error) -> Self {
        Error::InvalidArch(err)
    }
}

impl From<PestError<Rule>> for Error {
    fn from(err: PestError<Rule>) -> Self {
        Error::Parse((err.variant.message().into(), err.location))
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            self.relations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl TryFrom<Pair<'_, Rule>> for Dependency {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = Dependency { relations: vec![] };
        for relation in token.into_inner() {
            match relation.as_rule() {
                Rule::relation => {}
                _ => continue,
            };
            ret.relations.push(relation.try_into()?);
        }
        Ok(ret)
    }
}

impl FromStr for Dependency {
    type Err = Error;

    fn from_str(v: &str) -> Result<Self, Error> {
        if v.trim().is_empty() {
            return Ok(Dependency { relations: vec![] });
        }
        let Some(token) = DependencyParser::parse(Rule::dependency, v)?.next() else {
            return Ok(Dependency { relations: vec![] });
        };
        token.try_into()
    }
}

#[cfg(feature = "serde")]
mod serde {
    use super::Dependency;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Dependency {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            String::serialize(&self.to_string(), serializer)
        }
    }

    impl<'de> Deserialize<'de> for Dependency {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            s.parse().map_err(|e| D::Error::custom(format!("{:?}", e)))
        }
    }
}

// vim: foldmethod=marker
