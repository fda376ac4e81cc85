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

//! The `md5sums` control member: one `<hex> [ |*]<path>` line per
//! delivered file, space for text mode and asterisk for binary.

use super::Error;
use md5::{Digest, Md5};
use std::collections::BTreeMap;

/// Hex MD5 digest of a buffer.
pub fn digest(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Parse an `md5sums` file: one `<hex> [ |*]<path>` entry per line, where
/// a space marks text mode and an asterisk binary mode (the distinction
/// is carried but both verify bytewise here).
pub fn parse(content: &str) -> Result<BTreeMap<String, String>, Error> {
    let mut ret = BTreeMap::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((sum, rest)) = line.split_once(' ') else {
            return Err(Error::BadDigestLine(idx + 1));
        };
        if sum.len() != 32 || !sum.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(Error::BadDigestLine(idx + 1));
        }
        let path = match rest.chars().next() {
            Some(' ') | Some('*') => &rest[1..],
            _ => rest,
        };
        if path.is_empty() {
            return Err(Error::BadDigestLine(idx + 1));
        }
        ret.insert(path.to_owned(), sum.to_ascii_lowercase());
    }
    Ok(ret)
}

/// Render an `md5sums` file in the conventional text-mode form.
pub fn write(sums: &BTreeMap<String, String>) -> String {
    let mut ret = String::new();
    for (path, sum) in sums {
        ret.push_str(sum);
        ret.push_str("  ");
        ret.push_str(path);
        ret.push('\n');
    }
    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn digest_matches_known_value() {
        // md5 of the empty string is a fixed point of the format
        assert_eq!("d41d8cd98f00b204e9800998ecf8427e", digest(b""));
    }

    #[test]
    fn parse_text_and_binary_markers() {
        let sums = parse(
            "\
d41d8cd98f00b204e9800998ecf8427e  usr/share/doc/empty
d41d8cd98f00b204e9800998ecf8427e *usr/bin/tool
",
        )
        .unwrap();
        assert_eq!(2, sums.len());
        assert!(sums.contains_key("usr/share/doc/empty"));
        assert!(sums.contains_key("usr/bin/tool"));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(Err(Error::BadDigestLine(1)), parse("nonsense\n"));
        assert_eq!(Err(Error::BadDigestLine(1)), parse("abc  path\n"));
        assert_eq!(
            Err(Error::BadDigestLine(2)),
            parse("d41d8cd98f00b204e9800998ecf8427e  ok\nd41d8cd98f00b204e9800998ecf8427e \n")
        );
    }

    #[test]
    fn write_then_parse_round_trips() {
        let mut sums = BTreeMap::new();
        sums.insert("usr/bin/tool".to_owned(), digest(b"tool"));
        let text = write(&sums);
        assert_eq!(sums, parse(&text).unwrap());
    }
}

// vim: foldmethod=marker
