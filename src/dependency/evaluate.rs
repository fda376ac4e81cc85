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

use super::{Dependency, Possibility, Relation};
use crate::architecture::Architecture;
use crate::version::Version;
use std::collections::BTreeSet;

/// What the evaluator knows about one package that could satisfy an
/// expression: the answer to a `lookup(name)` call.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Package name.
    pub name: String,

    /// Version of the candidate.
    pub version: Version,

    /// Architecture, when known.
    pub architecture: Option<Architecture>,

    /// Whether the package is already installed (as opposed to merely
    /// available in a repository or selected for the running transaction).
    pub installed: bool,

    /// Virtual names this candidate provides.
    pub provides: Vec<String>,
}

/// The outcome for one [Relation] of an evaluated expression.
#[derive(Clone, Debug)]
pub struct Choice {
    /// The relation being reported on.
    pub relation: Relation,

    /// The package name chosen to satisfy it, when satisfied. `None`
    /// either means the relation failed or that no alternative applied on
    /// this host (which satisfies the relation trivially).
    pub chosen: Option<String>,
}

/// The outcome of evaluating a whole [Dependency] expression.
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    /// Relations which could not be satisfied.
    pub failing: Vec<Relation>,

    /// Per-relation choices, in expression order.
    pub choices: Vec<Choice>,
}

impl Evaluation {
    /// Whether every relation of the expression was satisfied.
    pub fn satisfied(&self) -> bool {
        self.failing.is_empty()
    }
}

impl Possibility {
    /// Whether the given candidate satisfies this possibility. A virtual
    /// (`Provides`) match only counts when the possibility carries no
    /// version constraint.
    pub fn satisfied_by(&self, candidate: &Candidate) -> bool {
        if candidate.name == self.name {
            match &self.version_constraint {
                Some(constraint) => constraint.satisfied_by(&candidate.version),
                None => true,
            }
        } else if candidate.provides.iter().any(|p| *p == self.name) {
            self.version_constraint.is_none()
        } else {
            false
        }
    }
}

/// Evaluate an expression against a package lookup.
///
/// `selected` names packages already chosen for the running transaction;
/// when a relation offers several satisfiable alternatives the tie-break
/// prefers an installed candidate, then a selected one, then the first
/// listed.
pub fn evaluate<F>(
    dependency: &Dependency,
    host: Option<&Architecture>,
    active_profiles: &[&str],
    selected: &BTreeSet<String>,
    lookup: F,
) -> Evaluation
where
    F: Fn(&str) -> Option<Candidate>,
{
    let mut ret = Evaluation::default();

    for relation in &dependency.relations {
        let applicable = relation
            .possibilities
            .iter()
            .filter(|p| p.applies(host, active_profiles))
            .collect::<Vec<_>>();

        if applicable.is_empty() && !relation.possibilities.is_empty() {
            // every alternative is filtered out on this host, which
            // satisfies the relation without choosing anything
            ret.choices.push(Choice {
                relation: relation.clone(),
                chosen: None,
            });
            continue;
        }

        let mut satisfied = Vec::new();
        for possibility in &applicable {
            if let Some(candidate) = lookup(&possibility.name) {
                if possibility.satisfied_by(&candidate) {
                    satisfied.push((possibility.name.clone(), candidate.installed));
                }
            }
        }

        let chosen = satisfied
            .iter()
            .find(|(_, installed)| *installed)
            .or_else(|| satisfied.iter().find(|(name, _)| selected.contains(name)))
            .or_else(|| satisfied.first())
            .map(|(name, _)| name.clone());

        if chosen.is_none() {
            ret.failing.push(relation.clone());
        }
        ret.choices.push(Choice {
            relation: relation.clone(),
            chosen,
        });
    }

    ret
}

#[cfg(test)]
mod test {
    use super::*;

    fn candidate(name: &str, version: &str, installed: bool) -> Candidate {
        Candidate {
            name: name.to_owned(),
            version: version.parse().unwrap(),
            architecture: None,
            installed,
            provides: vec![],
        }
    }

    fn eval(
        expression: &str,
        selected: &[&str],
        known: Vec<Candidate>,
    ) -> Evaluation {
        let dependency: Dependency = expression.parse().unwrap();
        let selected = selected
            .iter()
            .map(|s| (*s).to_owned())
            .collect::<BTreeSet<_>>();
        evaluate(&dependency, None, &[], &selected, |name| {
            known
                .iter()
                .find(|c| c.name == name || c.provides.iter().any(|p| p == name))
                .cloned()
        })
    }

    #[test]
    fn simple_satisfied() {
        let result = eval("b (>= 1.0)", &[], vec![candidate("b", "1.2", true)]);
        assert!(result.satisfied());
        assert_eq!(Some("b".to_owned()), result.choices[0].chosen);
    }

    #[test]
    fn version_constraint_fails() {
        let result = eval("b (>= 2.0)", &[], vec![candidate("b", "1.2", true)]);
        assert!(!result.satisfied());
        assert_eq!(1, result.failing.len());
        assert_eq!("b (>= 2.0)", result.failing[0].to_string());
    }

    #[test]
    fn missing_package_fails() {
        let result = eval("b (>= 1.0)", &[], vec![]);
        assert!(!result.satisfied());
    }

    #[test]
    fn alternative_picks_only_available() {
        let result = eval("b | c", &[], vec![candidate("c", "2.0", false)]);
        assert!(result.satisfied());
        assert_eq!(Some("c".to_owned()), result.choices[0].chosen);
    }

    #[test]
    fn alternative_prefers_installed() {
        let result = eval(
            "b | c",
            &[],
            vec![candidate("b", "1.0", false), candidate("c", "2.0", true)],
        );
        assert_eq!(Some("c".to_owned()), result.choices[0].chosen);
    }

    #[test]
    fn alternative_prefers_selected_over_first() {
        let result = eval(
            "b | c",
            &["c"],
            vec![candidate("b", "1.0", false), candidate("c", "2.0", false)],
        );
        assert_eq!(Some("c".to_owned()), result.choices[0].chosen);
    }

    #[test]
    fn alternative_falls_back_to_first_listed() {
        let result = eval(
            "b | c",
            &[],
            vec![candidate("b", "1.0", false), candidate("c", "2.0", false)],
        );
        assert_eq!(Some("b".to_owned()), result.choices[0].chosen);
    }

    #[test]
    fn provides_satisfies_unversioned_only() {
        let mut provider = candidate("mta", "1.0", true);
        provider.provides.push("mail-transport-agent".to_owned());
        let known = vec![provider];

        let unversioned = eval("mail-transport-agent", &[], known.clone());
        assert!(unversioned.satisfied());

        let versioned = eval("mail-transport-agent (>= 1.0)", &[], known);
        assert!(!versioned.satisfied());
    }

    #[test]
    fn every_relation_must_hold() {
        let result = eval(
            "b, c (>= 2.0)",
            &[],
            vec![candidate("b", "1.0", true), candidate("c", "1.0", true)],
        );
        assert!(!result.satisfied());
        assert_eq!(1, result.failing.len());
    }
}

// vim: foldmethod=marker
