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
use crate::architecture::Architecture;
use pest::iterators::Pair;

/// A single `[arch]` entry limiting the host architectures on which a
/// possibility is considered; may be negated with a leading `!`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchConstraint {
    /// When true, the entry excludes matching architectures instead of
    /// including them.
    pub negated: bool,

    /// The architecture (or pattern) being matched.
    pub arch: Architecture,
}

impl std::fmt::Display for ArchConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.negated { "!" } else { "" }, self.arch)
    }
}

impl TryFrom<Pair<'_, Rule>> for ArchConstraint {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let text = token.as_str();
        let (negated, text) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        Ok(ArchConstraint {
            negated,
            arch: text.parse()?,
        })
    }
}

/// The full `[...]` restriction list of a possibility.
///
/// A list either includes (no entry negated) or excludes (every entry
/// negated); the host matches an include-list when any entry matches and
/// an exclude-list when no entry matches.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ArchConstraints {
    /// The entries, in source order.
    pub constraints: Vec<ArchConstraint>,
}

impl ArchConstraints {
    /// Whether the given host architecture passes this restriction list.
    pub fn matches(&self, host: &Architecture) -> bool {
        if self.constraints.is_empty() {
            return true;
        }
        let negative = self.constraints.iter().all(|c| c.negated);
        if negative {
            self.constraints
                .iter()
                .all(|c| !c.arch.is_compatible_with(host))
        } else {
            self.constraints
                .iter()
                .any(|c| !c.negated && c.arch.is_compatible_with(host))
        }
    }
}

impl std::fmt::Display for ArchConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.constraints
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        )
    }
}

impl TryFrom<Pair<'_, Rule>> for ArchConstraints {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = ArchConstraints {
            constraints: vec![],
        };
        for constraint in token.into_inner() {
            match constraint.as_rule() {
                Rule::arch_constraint => {}
                _ => continue,
            };
            ret.constraints.push(constraint.try_into()?);
        }
        Ok(ret)
    }
}

// vim: foldmethod=marker
