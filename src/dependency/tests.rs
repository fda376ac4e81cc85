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

#![cfg(test)]

use super::*;

macro_rules! check_parse {
    ($name:ident, $input:expr, |$dep:ident| $block:tt) => {
        #[test]
        fn $name() {
            let $dep: Dependency = $input.parse().unwrap();
            $block
        }
    };
}

macro_rules! check_parse_fails {
    ($name:ident, $input:expr) => {
        #[test]
        fn $name() {
            assert!($input.parse::<Dependency>().is_err());
        }
    };
}

macro_rules! check_round_trip {
    ($name:ident, $input:expr) => {
        #[test]
        fn $name() {
            let dep: Dependency = $input.parse().unwrap();
            assert_eq!($input, dep.to_string());
        }
    };
}

check_parse!(empty, "", |dep| {
    assert!(dep.relations.is_empty());
});

check_parse!(single_name, "wpkg", |dep| {
    assert_eq!(1, dep.relations.len());
    assert_eq!("wpkg", dep.relations[0].possibilities[0].name);
});

check_parse!(versioned, "libz (>= 1.2.8)", |dep| {
    let constraint = dep.relations[0].possibilities[0]
        .version_constraint
        .clone()
        .unwrap();
    assert_eq!(VersionOperator::GreaterThanOrEqual, constraint.operator);
    assert_eq!("1.2.8", constraint.version.to_string());
});

check_parse!(comma_list, "a, b (= 2.0), c", |dep| {
    assert_eq!(3, dep.relations.len());
});

check_parse!(alternatives, "editor | vi | nano", |dep| {
    assert_eq!(1, dep.relations.len());
    assert_eq!(3, dep.relations[0].possibilities.len());
});

check_parse!(arch_restriction, "cross-tools [linux-amd64 !mswindows-i386]", |dep| {
    let constraints = dep.relations[0].possibilities[0]
        .arch_constraints
        .clone()
        .unwrap();
    assert_eq!(2, constraints.constraints.len());
    assert!(!constraints.constraints[0].negated);
    assert!(constraints.constraints[1].negated);
});

check_parse!(profile_restriction, "gcc <!stage1>", |dep| {
    let profiles = &dep.relations[0].possibilities[0].profiles;
    assert_eq!(1, profiles.len());
    assert!(profiles[0].constraints[0].negated);
    assert_eq!("stage1", profiles[0].constraints[0].profile);
});

check_parse!(whitespace_tolerant, "  a ,b|  c (<< 9) ", |dep| {
    assert_eq!(2, dep.relations.len());
    assert_eq!(2, dep.relations[1].possibilities.len());
});

check_parse!(epoch_in_constraint, "kernel (>= 1:4.9)", |dep| {
    let constraint = dep.relations[0].possibilities[0]
        .version_constraint
        .clone()
        .unwrap();
    assert_eq!(1, constraint.version.epoch());
});

check_parse_fails!(bare_operator, "a (>=)");
check_parse_fails!(unclosed_constraint, "a (>= 1.0");
check_parse_fails!(spaces_in_name, "a b");
check_parse_fails!(empty_alternative, "a | | b");
check_parse_fails!(bad_version_chars, "a (= 1_0)");

check_round_trip!(round_trip_simple, "wpkg");
check_round_trip!(round_trip_versioned, "libz (>= 1.2.8)");
check_round_trip!(round_trip_full, "a (= 2.0), editor | vi [linux-amd64], gcc <!stage1>");

// vim: foldmethod=marker
