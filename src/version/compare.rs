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

// Component comparison follows the algorithm described in deb-version(5):
// alternate between a non-digit segment compared with the custom character
// order and a digit segment compared numerically, until one side wins or
// both strings are exhausted.

use super::Version;
use std::cmp::Ordering;

// End of string sorts like nothing at all (0), except that `~` sorts even
// before that. Letters keep their ASCII value; the remaining punctuation is
// pushed past the letters.
fn char_order(ch: Option<u8>) -> i32 {
    match ch {
        None => 0,
        Some(b'~') => -1,
        Some(ch) if ch.is_ascii_digit() => 0,
        Some(ch) if ch.is_ascii_alphabetic() => ch as i32,
        Some(ch) => ch as i32 + 256,
    }
}

/// Compare a single upstream-or-revision component with the dpkg rules.
pub(super) fn compare_component(left: &str, right: &str) -> Ordering {
    let left = left.as_bytes();
    let right = right.as_bytes();
    let mut i = 0;
    let mut j = 0;

    while i < left.len() || j < right.len() {
        // non-digit segment, including the implicit end-of-string marker
        while (i < left.len() && !left[i].is_ascii_digit())
            || (j < right.len() && !right[j].is_ascii_digit())
        {
            let lhs = char_order(left.get(i).copied());
            let rhs = char_order(right.get(j).copied());
            if lhs != rhs {
                return lhs.cmp(&rhs);
            }
            i += 1;
            j += 1;
        }

        // digit segment: leading zeros are insignificant, then the longer
        // run wins, then the first differing digit
        while i < left.len() && left[i] == b'0' {
            i += 1;
        }
        while j < right.len() && right[j] == b'0' {
            j += 1;
        }
        let mut first_diff = Ordering::Equal;
        while i < left.len()
            && left[i].is_ascii_digit()
            && j < right.len()
            && right[j].is_ascii_digit()
        {
            if first_diff == Ordering::Equal {
                first_diff = left[i].cmp(&right[j]);
            }
            i += 1;
            j += 1;
        }
        if i < left.len() && left[i].is_ascii_digit() {
            return Ordering::Greater;
        }
        if j < right.len() && right[j].is_ascii_digit() {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch().cmp(&other.epoch()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match compare_component(self.upstream(), other.upstream()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        compare_component(
            self.revision().unwrap_or(""),
            other.revision().unwrap_or(""),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_cmp {
        ($name:ident, $left:expr, $right:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let left: Version = $left.parse().unwrap();
                let right: Version = $right.parse().unwrap();
                let got = left.cmp(&right);
                assert_eq!(
                    $expected, got,
                    "{} should be {:?} {} but was {:?}",
                    left, $expected, right, got
                );
            }
        };
    }

    check_cmp!(equal, "1.0", "1.0", Ordering::Equal);
    check_cmp!(simple_less, "1.0", "1.2", Ordering::Less);
    check_cmp!(simple_greater, "1.2", "1.0", Ordering::Greater);
    check_cmp!(digit_run_numeric, "1.9", "1.10", Ordering::Less);
    check_cmp!(leading_zeros, "1.01", "1.1", Ordering::Equal);
    check_cmp!(epoch_wins, "1:0.1", "2.0", Ordering::Greater);
    check_cmp!(zero_epoch_implicit, "0:1.0", "1.0", Ordering::Equal);
    check_cmp!(revision_breaks_tie, "1.0-1", "1.0-2", Ordering::Less);
    check_cmp!(no_revision_before_revision, "1.0", "1.0-1", Ordering::Less);
    check_cmp!(zero_revision_equal, "1.0-0", "1.0", Ordering::Equal);
    check_cmp!(tilde_before_release, "1.0~rc1", "1.0", Ordering::Less);
    check_cmp!(tilde_before_anything, "1.0~~", "1.0~", Ordering::Less);
    check_cmp!(tilde_in_revision, "1.0-1~bpo1", "1.0-1", Ordering::Less);
    check_cmp!(letters_before_plus, "1.0a", "1.0+", Ordering::Less);
    check_cmp!(plus_after_end, "1.0", "1.0+b1", Ordering::Less);
    check_cmp!(letters_compare_ascii, "1.0a", "1.0b", Ordering::Less);
    check_cmp!(upper_before_lower, "1.0A", "1.0a", Ordering::Less);
    check_cmp!(dfsg_suffix, "1.0+dfsg1-1", "1.0-1", Ordering::Greater);

    #[test]
    fn sort_order_matches_dpkg_expectations() {
        let mut versions = [
            "2.0", "1.0~rc1", "1.0", "1.0-1", "1.0+b1", "1:0.5", "1.0-1~bpo1",
        ]
        .into_iter()
        .map(|v| v.parse::<Version>().unwrap())
        .collect::<Vec<_>>();
        versions.sort();
        assert_eq!(
            vec!["1.0~rc1", "1.0", "1.0-1~bpo1", "1.0-1", "1.0+b1", "2.0", "1:0.5"]
                .into_iter()
                .map(|v| v.parse::<Version>().unwrap())
                .collect::<Vec<_>>(),
            versions
        );
    }
}

// vim: foldmethod=marker
