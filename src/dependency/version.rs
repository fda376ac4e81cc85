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

use super::{pest::Rule, Error};
use crate::version::Version;
use pest::iterators::Pair;
use std::cmp::Ordering;

/// Operator inside a version constraint, limiting which [Version] values
/// satisfy a [crate::dependency::Possibility].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VersionOperator {
    /// `<<`: strictly earlier.
    LessThan,

    /// `<=`: earlier or equal.
    LessThanOrEqual,

    /// `=`: exactly equal.
    Equal,

    /// `>=`: equal or later.
    GreaterThanOrEqual,

    /// `>>`: strictly later.
    GreaterThan,
}

impl VersionOperator {
    /// The operator spelled the way it appears in an expression.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessThan => "<<",
            Self::LessThanOrEqual => "<=",
            Self::Equal => "=",
            Self::GreaterThanOrEqual => ">=",
            Self::GreaterThan => ">>",
        }
    }

    /// Whether `candidate op constraint` holds.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => ordering == Ordering::Less,
            Self::LessThanOrEqual => ordering != Ordering::Greater,
            Self::Equal => ordering == Ordering::Equal,
            Self::GreaterThanOrEqual => ordering != Ordering::Less,
            Self::GreaterThan => ordering == Ordering::Greater,
        }
    }
}

impl std::fmt::Display for VersionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parenthesised `(op version)` constraint on a possibility.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionConstraint {
    /// How to compare a candidate version against [Self::version].
    pub operator: VersionOperator,

    /// The version the candidate is compared against.
    pub version: Version,
}

impl VersionConstraint {
    /// Whether the given candidate version satisfies this constraint.
    pub fn satisfied_by(&self, candidate: &Version) -> bool {
        self.operator.holds(candidate.cmp(&self.version))
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}

impl TryFrom<Pair<'_, Rule>> for VersionConstraint {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut operator: Option<VersionOperator> = None;
        let mut version: Option<Version> = None;

        for token in token.into_inner() {
            match token.as_rule() {
                Rule::version_operator => {
                    operator = Some(match token.as_str() {
                        "=" | "==" => VersionOperator::Equal,
                        "<<" => VersionOperator::LessThan,
                        "<=" => VersionOperator::LessThanOrEqual,
                        ">=" => VersionOperator::GreaterThanOrEqual,
                        ">>" => VersionOperator::GreaterThan,
                        _ => unreachable!(),
                    });
                }
                Rule::version => {
                    version = Some(token.as_str().parse()?);
                }
                _ => continue,
            };
        }

        let Some(operator) = operator else {
            return Err(Error::InvalidVersionConstraint);
        };
        let Some(version) = version else {
            return Err(Error::InvalidVersionConstraint);
        };

        Ok(VersionConstraint { operator, version })
    }
}

// vim: foldmethod=marker
