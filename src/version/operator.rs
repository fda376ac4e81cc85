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

use super::{Error, Version};
use std::cmp::Ordering;
use std::str::FromStr;

/// Named relational operator over [Version] values, as accepted by the
/// version-comparison entry point.
///
/// Both the dependency-expression spellings (`<<`, `<=`, `=`, `>=`, `>>`)
/// and the dpkg word spellings (`lt`, `le`, `eq`, `ne`, `ge`, `gt`) are
/// accepted. The `-nl` variants additionally refuse to hold when either
/// operand is missing, so scripted upgrade checks against a package which
/// is not installed fail closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ComparisonOperator {
    /// Strictly earlier (`<<`, `lt`).
    LessThan,

    /// Earlier or equal (`<=`, `le`).
    LessThanOrEqual,

    /// Exactly equal (`=`, `eq`).
    Equal,

    /// Not equal (`ne`).
    NotEqual,

    /// Equal or later (`>=`, `ge`).
    GreaterThanOrEqual,

    /// Strictly later (`>>`, `gt`).
    GreaterThan,

    /// `lt-nl`: strictly earlier, failing when either operand is missing.
    LessThanNoMissing,

    /// `le-nl`: earlier or equal, failing when either operand is missing.
    LessThanOrEqualNoMissing,

    /// `ge-nl`: equal or later, failing when either operand is missing.
    GreaterThanOrEqualNoMissing,

    /// `gt-nl`: strictly later, failing when either operand is missing.
    GreaterThanNoMissing,
}

impl ComparisonOperator {
    /// The canonical spelling, as printed in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::LessThan => "<<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "ne",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::GreaterThan => ">>",
            ComparisonOperator::LessThanNoMissing => "lt-nl",
            ComparisonOperator::LessThanOrEqualNoMissing => "le-nl",
            ComparisonOperator::GreaterThanOrEqualNoMissing => "ge-nl",
            ComparisonOperator::GreaterThanNoMissing => "gt-nl",
        }
    }

    fn base_holds(&self, ord: Ordering) -> bool {
        match self {
            ComparisonOperator::LessThan | ComparisonOperator::LessThanNoMissing => {
                ord == Ordering::Less
            }
            ComparisonOperator::LessThanOrEqual
            | ComparisonOperator::LessThanOrEqualNoMissing => ord != Ordering::Greater,
            ComparisonOperator::Equal => ord == Ordering::Equal,
            ComparisonOperator::NotEqual => ord != Ordering::Equal,
            ComparisonOperator::GreaterThanOrEqual
            | ComparisonOperator::GreaterThanOrEqualNoMissing => ord != Ordering::Less,
            ComparisonOperator::GreaterThan | ComparisonOperator::GreaterThanNoMissing => {
                ord == Ordering::Greater
            }
        }
    }

    fn refuses_missing(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::LessThanNoMissing
                | ComparisonOperator::LessThanOrEqualNoMissing
                | ComparisonOperator::GreaterThanOrEqualNoMissing
                | ComparisonOperator::GreaterThanNoMissing
        )
    }

    /// Whether the relation holds between two possibly-missing operands.
    ///
    /// For the plain operators a missing version compares earlier than any
    /// present version and equal to another missing version. The `-nl`
    /// variants never hold when either operand is missing.
    pub fn holds(&self, left: Option<&Version>, right: Option<&Version>) -> bool {
        if self.refuses_missing() && (left.is_none() || right.is_none()) {
            return false;
        }
        let ord = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => left.cmp(right),
        };
        self.base_holds(ord)
    }
}

impl FromStr for ComparisonOperator {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        Ok(match input {
            "<<" | "lt" => ComparisonOperator::LessThan,
            "<=" | "le" => ComparisonOperator::LessThanOrEqual,
            "=" | "==" | "eq" => ComparisonOperator::Equal,
            "ne" => ComparisonOperator::NotEqual,
            ">=" | "ge" => ComparisonOperator::GreaterThanOrEqual,
            ">>" | "gt" => ComparisonOperator::GreaterThan,
            "lt-nl" => ComparisonOperator::LessThanNoMissing,
            "le-nl" => ComparisonOperator::LessThanOrEqualNoMissing,
            "ge-nl" => ComparisonOperator::GreaterThanOrEqualNoMissing,
            "gt-nl" => ComparisonOperator::GreaterThanNoMissing,
            _ => return Err(Error::UnknownOperator),
        })
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Evaluate `left op right` over version strings, where an empty (or
/// whitespace-only) string means "no version". Malformed versions and
/// unknown operators are reported as errors so the command line layer can
/// distinguish "relation does not hold" from "bad arguments".
pub fn compare_versions(left: &str, operator: &str, right: &str) -> Result<bool, Error> {
    let operator: ComparisonOperator = operator.parse()?;
    let left = parse_operand(left)?;
    let right = parse_operand(right)?;
    Ok(operator.holds(left.as_ref(), right.as_ref()))
}

fn parse_operand(input: &str) -> Result<Option<Version>, Error> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input.parse().map(Some)
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_relation {
        ($name:ident, $left:expr, $op:expr, $right:expr, $holds:expr) => {
            #[test]
            fn $name() {
                assert_eq!(
                    Ok($holds),
                    compare_versions($left, $op, $right),
                    "{} {} {}",
                    $left,
                    $op,
                    $right
                );
            }
        };
    }

    check_relation!(lt_holds, "1.0", "<<", "1.1", true);
    check_relation!(lt_word_spelling, "1.0", "lt", "1.1", true);
    check_relation!(lt_strict, "1.0", "<<", "1.0", false);
    check_relation!(le_equal, "1.0", "<=", "1.0", true);
    check_relation!(eq_epoch_insensitive, "0:1.0", "=", "1.0", true);
    check_relation!(ne_holds, "1.0", "ne", "2.0", true);
    check_relation!(ge_holds, "2.0", ">=", "1.0", true);
    check_relation!(gt_holds, "2.0", ">>", "1.0", true);

    // a missing version is earlier than any version for the plain operators
    check_relation!(empty_lt_any, "", "<<", "0~", true);
    check_relation!(empty_eq_empty, "", "=", "", true);
    check_relation!(any_gt_empty, "1.0", ">>", "", true);

    // the -nl variants fail closed on a missing operand
    check_relation!(ltnl_missing_left, "", "lt-nl", "1.0", false);
    check_relation!(ltnl_missing_right, "1.0", "lt-nl", "", false);
    check_relation!(ltnl_both_present, "1.0", "lt-nl", "1.1", true);
    check_relation!(genl_missing_right, "1.0", "ge-nl", "", false);

    #[test]
    fn unknown_operator_is_an_argument_error() {
        assert_eq!(
            Err(Error::UnknownOperator),
            compare_versions("1.0", "<>", "2.0")
        );
    }

    #[test]
    fn malformed_operand_is_reported() {
        assert!(compare_versions("1.0", "=", "1 0").is_err());
    }
}

// vim: foldmethod=marker
