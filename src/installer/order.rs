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

use std::collections::{BTreeMap, BTreeSet};

/// Order `nodes` so that for every `(before, after)` edge, `before` is
/// emitted first. Ties between simultaneously-eligible nodes break
/// lexicographically, keeping transaction ordering deterministic.
///
/// On a cycle the sortable prefix is discarded and the members of the
/// cyclic remainder are returned as the error, sorted.
pub fn topological_order(
    nodes: &BTreeSet<String>,
    edges: &[(String, String)],
) -> Result<Vec<String>, Vec<String>> {
    let mut successors: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut indegree: BTreeMap<&str, usize> =
        nodes.iter().map(|n| (n.as_str(), 0)).collect();

    for (before, after) in edges {
        if !nodes.contains(before) || !nodes.contains(after) || before == after {
            continue;
        }
        if successors
            .entry(before.as_str())
            .or_default()
            .insert(after.as_str())
        {
            *indegree.get_mut(after.as_str()).unwrap() += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut ret = Vec::with_capacity(nodes.len());

    while let Some(name) = ready.iter().next().copied() {
        ready.remove(name);
        ret.push(name.to_owned());
        if let Some(successors) = successors.get(name) {
            for successor in successors {
                let degree = indegree.get_mut(successor).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(successor);
                }
            }
        }
        indegree.remove(name);
    }

    if ret.len() == nodes.len() {
        Ok(ret)
    } else {
        let mut cycle = indegree.keys().map(|n| (*n).to_owned()).collect::<Vec<_>>();
        // the emitted prefix is not part of the cycle
        cycle.retain(|n| !ret.contains(n));
        cycle.sort();
        Err(cycle)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn nodes(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
            .collect()
    }

    #[test]
    fn respects_edges() {
        let order =
            topological_order(&nodes(&["a", "b", "c"]), &edges(&[("c", "b"), ("b", "a")]))
                .unwrap();
        assert_eq!(vec!["c", "b", "a"], order);
    }

    #[test]
    fn ties_break_lexicographically() {
        let order = topological_order(&nodes(&["zeta", "alpha", "mid"]), &[]).unwrap();
        assert_eq!(vec!["alpha", "mid", "zeta"], order);
    }

    #[test]
    fn diamond_keeps_determinism() {
        let order = topological_order(
            &nodes(&["base", "left", "right", "top"]),
            &edges(&[
                ("base", "left"),
                ("base", "right"),
                ("left", "top"),
                ("right", "top"),
            ]),
        )
        .unwrap();
        assert_eq!(vec!["base", "left", "right", "top"], order);
    }

    #[test]
    fn edges_outside_the_set_are_ignored() {
        let order = topological_order(&nodes(&["a"]), &edges(&[("ghost", "a")])).unwrap();
        assert_eq!(vec!["a"], order);
    }

    #[test]
    fn cycles_are_reported() {
        let err = topological_order(
            &nodes(&["a", "b", "free"]),
            &edges(&[("a", "b"), ("b", "a")]),
        )
        .unwrap_err();
        assert_eq!(vec!["a", "b"], err);
    }
}

// vim: foldmethod=marker
