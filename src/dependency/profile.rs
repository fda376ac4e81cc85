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
use pest::iterators::Pair;

/// One entry of a `<...>` build-profile restriction group; may be negated
/// with a leading `!`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileConstraint {
    /// When true the profile must be inactive for the entry to hold.
    pub negated: bool,

    /// The profile name, such as `stage1` or `nocheck`.
    pub profile: String,
}

impl std::fmt::Display for ProfileConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.negated { "!" } else { "" }, self.profile)
    }
}

impl TryFrom<Pair<'_, Rule>> for ProfileConstraint {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let text = token.as_str();
        let (negated, text) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        Ok(ProfileConstraint {
            negated,
            profile: text.to_owned(),
        })
    }
}

/// One `<...>` group: every entry must hold against the set of active
/// profiles. Multiple groups on a possibility form a disjunction.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ProfileConstraints {
    /// The entries of the group.
    pub constraints: Vec<ProfileConstraint>,
}

impl ProfileConstraints {
    /// Whether every entry of the group holds for the given set of active
    /// profile names.
    pub fn matches(&self, active: &[&str]) -> bool {
        self.constraints.iter().all(|c| {
            let on = active.contains(&c.profile.as_str());
            on != c.negated
        })
    }
}

impl std::fmt::Display for ProfileConstraints {
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

impl TryFrom<Pair<'_, Rule>> for ProfileConstraints {
    type Error = Error;

    fn try_from(token: Pair<'_, Rule>) -> Result<Self, Error> {
        let mut ret = ProfileConstraints {
            constraints: vec![],
        };
        for constraint in token.into_inner() {
            match constraint.as_rule() {
                Rule::profile_constraint => {}
                _ => continue,
            };
            ret.constraints.push(constraint.try_into()?);
        }
        Ok(ret)
    }
}

// vim: foldmethod=marker
