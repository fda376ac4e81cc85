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
    pest::Rule, ArchConstraints, Error, ProfileConstraints, VersionConstraint,
};
use crate::architecture::Architecture;
use pest::iterators::Pair;

/// One alternative inside a [crate::dependency::Relation]: a package name
/// plus the constraints under which it is considered.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Possibility {
    /// Name of the package which may satisfy the relation.
    pub name: String,

    /// Optional `(op version)` constraint on the candidate's version.
    pub version_constraint: Option<VersionConstraint>,

    /// Optional `[arch ...]` restriction on the host architecture.
    pub arch_constraints: Option<ArchConstraints>,

    /// Zero or more `<profile ...>` groups; the possibility applies when
    /// any group matches the active profiles.
    pub profiles: Vec<ProfileConstraints>,
}

impl Possibility {
    /// Whether this possibility applies on the given host architecture and
    /// with the given set of active build profiles. A possibility which
    /// does not apply is dropped from its relation rather than failing it.
    pub fn applies(&self, host: Option<&Architecture>, active_profiles: &[&str]) -> bool {
        if let (Some(constraints), Some(host)) = (&self.arch_constraints, host) {
            if !constraints.matches(host) {
                return false;
            }
        }
        if !self.profiles.is_empty()
            && !self.profiles.iter().any(|p| p.matches(active_profiles))
        {
            return false;
        }
        true
    }
}

impl std::fmt::Display for Possibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.name)?;
        if let Some(version_constraint) = &self.version_constraint {
            write!(f, " ({})", version_constraint)?;
        }
        if let Some(arch_constraints) = &self.arch_constraints {
            write!(f, " [{}]", arch_constraints)?;
        }
        for profiles in &self.profiles {
            write!(f, " <{}>", profiles)?;
        }
        Ok(())
    }
}

impl TryFrom<Pair<'_, Rule>> for Possibility {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = Possibility {
            ..Default::default()
        };

        for constraint in token.into_inner() {
            match constraint.as_rule() {
                Rule::package_name => ret.name = constraint.as_str().to_owned(),
                Rule::version_constraint => {
                    if ret.version_constraint.is_some() {
                        return Err(Error::TooManyVersions);
                    }
                    ret.version_constraint = Some(constraint.try_into()?);
                }
                Rule::arch_constraints => {
                    if ret.arch_constraints.is_some() {
                        return Err(Error::TooManyArches);
                    }
                    ret.arch_constraints = Some(constraint.try_into()?);
                }
                Rule::profile_constraints => {
                    ret.profiles.push(constraint.try_into()?);
                }
                _ => continue,
            };
        }

        if ret.name.is_empty() {
            return Err(Error::InvalidPossibility);
        }

        Ok(ret)
    }
}

// vim: foldmethod=marker
