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

//! The `architecture` module models target architecture names.
//!
//! An architecture is either one of the special names (`all`, `any`,
//! `source`) or an `<os>[-<vendor>]-<processor>` triplet such as
//! `linux-amd64` or `mswindows-m2osw-i386`. Any component of a triplet may
//! itself be `any`, turning the name into a pattern.

use std::str::FromStr;

/// A parsed architecture name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Architecture {
    /// Architecture-independent content, installable on every target.
    All,

    /// Wildcard matching every concrete architecture.
    Any,

    /// A source package; carries no binary code.
    Source,

    /// A concrete (or partially wildcarded) machine triplet.
    Triplet {
        /// Operating system, such as `linux` or `mswindows`.
        os: String,

        /// Optional vendor string; `any` when wildcarded.
        vendor: Option<String>,

        /// Processor, such as `amd64` or `i386`.
        processor: String,
    },
}

/// Error conditions which may be encountered when parsing an
/// [Architecture].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The architecture string is empty.
    Empty,

    /// The architecture string has too many `-` separated components.
    TooManyComponents,

    /// A component contains a character outside `a-z0-9_`.
    InvalidComponent,
}
crate::errors::error_enum!(Error);

fn valid_component(component: &str) -> bool {
    !component.is_empty()
        && component
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

impl Architecture {
    /// Whether any component is a wildcard.
    pub fn is_pattern(&self) -> bool {
        match self {
            Architecture::Any => true,
            Architecture::All | Architecture::Source => false,
            Architecture::Triplet { os, vendor, processor } => {
                os == "any" || vendor.as_deref() == Some("any") || processor == "any"
            }
        }
    }

    /// Whether this is the `source` architecture.
    pub fn is_source(&self) -> bool {
        matches!(self, Architecture::Source)
    }

    /// Whether a package of this architecture may be unpacked on the given
    /// concrete target. `all` and `source` content installs everywhere;
    /// triplets must match component-wise with `any` acting as a wildcard
    /// on either side.
    pub fn is_compatible_with(&self, target: &Architecture) -> bool {
        match self {
            Architecture::All | Architecture::Source | Architecture::Any => true,
            Architecture::Triplet { os, vendor, processor } => match target {
                Architecture::Any => true,
                Architecture::All | Architecture::Source => false,
                Architecture::Triplet {
                    os: target_os,
                    vendor: target_vendor,
                    processor: target_processor,
                } => {
                    component_matches(os, target_os)
                        && vendor_matches(vendor.as_deref(), target_vendor.as_deref())
                        && component_matches(processor, target_processor)
                }
            },
        }
    }
}

fn component_matches(left: &str, right: &str) -> bool {
    left == "any" || right == "any" || left == right
}

fn vendor_matches(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        // an unspecified vendor matches anything
        (None, _) | (_, None) => true,
        (Some(left), Some(right)) => component_matches(left, right),
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::Empty);
        }
        match input {
            "all" => return Ok(Architecture::All),
            "any" => return Ok(Architecture::Any),
            "source" | "src" => return Ok(Architecture::Source),
            _ => {}
        }
        let components = input.split('-').collect::<Vec<_>>();
        let (os, vendor, processor) = match components[..] {
            [os, processor] => (os, None, processor),
            [os, vendor, processor] => (os, Some(vendor), processor),
            _ => return Err(Error::TooManyComponents),
        };
        if !valid_component(os)
            || !valid_component(processor)
            || !vendor.map(valid_component).unwrap_or(true)
        {
            return Err(Error::InvalidComponent);
        }
        Ok(Architecture::Triplet {
            os: os.to_owned(),
            vendor: vendor.map(|v| v.to_owned()),
            processor: processor.to_owned(),
        })
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::All => write!(f, "all"),
            Architecture::Any => write!(f, "any"),
            Architecture::Source => write!(f, "source"),
            Architecture::Triplet { os, vendor, processor } => match vendor {
                Some(vendor) => write!(f, "{}-{}-{}", os, vendor, processor),
                None => write!(f, "{}-{}", os, processor),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_parses {
        ($name:ident, $input:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let arch: Architecture = $input.parse().unwrap();
                assert_eq!($expected, arch.to_string());
            }
        };
    }

    check_parses!(all, "all", "all");
    check_parses!(any, "any", "any");
    check_parses!(source, "source", "source");
    check_parses!(src_alias, "src", "source");
    check_parses!(pair, "linux-amd64", "linux-amd64");
    check_parses!(triplet, "mswindows-m2osw-i386", "mswindows-m2osw-i386");

    #[test]
    fn rejects_garbage() {
        assert_eq!(Err(Error::Empty), "".parse::<Architecture>());
        assert_eq!(
            Err(Error::TooManyComponents),
            "a-b-c-d".parse::<Architecture>()
        );
        assert_eq!(
            Err(Error::InvalidComponent),
            "Linux-amd64".parse::<Architecture>()
        );
        assert_eq!(
            Err(Error::InvalidComponent),
            "linux-".parse::<Architecture>()
        );
    }

    #[test]
    fn compatibility_table() {
        let target: Architecture = "linux-amd64".parse().unwrap();
        let same: Architecture = "linux-amd64".parse().unwrap();
        let other: Architecture = "linux-i386".parse().unwrap();
        let all: Architecture = "all".parse().unwrap();
        let source: Architecture = "source".parse().unwrap();
        let pattern: Architecture = "linux-any".parse().unwrap();

        assert!(same.is_compatible_with(&target));
        assert!(!other.is_compatible_with(&target));
        assert!(all.is_compatible_with(&target));
        assert!(source.is_compatible_with(&target));
        assert!(pattern.is_compatible_with(&target));
        assert!(pattern.is_pattern());
        assert!(!same.is_pattern());
    }

    #[test]
    fn vendor_wildcards() {
        let vendored: Architecture = "linux-m2osw-amd64".parse().unwrap();
        let plain: Architecture = "linux-amd64".parse().unwrap();
        let other_vendor: Architecture = "linux-acme-amd64".parse().unwrap();
        assert!(vendored.is_compatible_with(&plain));
        assert!(plain.is_compatible_with(&vendored));
        assert!(!other_vendor.is_compatible_with(&vendored));
    }
}

// vim: foldmethod=marker
