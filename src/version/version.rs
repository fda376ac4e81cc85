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

use std::str::FromStr;

/// Package version number in the Debian `[epoch:]upstream[-revision]`
/// format.
///
/// The epoch defaults to `0` when absent and the revision is optional.
/// Ordering is lexicographic on `(epoch, upstream, revision)` where the
/// string components are compared with the dpkg rules implemented in
/// this module's comparison half: runs of digits compare as integers, `~`
/// sorts before everything including the end of the string, letters sort
/// before the remaining punctuation.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Version {
    /// Optional epoch. Bounded by [i32::MAX] for dpkg compatibility.
    epoch: Option<u32>,

    /// Mandatory upstream component. May contain `A-Za-z0-9.+~`, plus `:`
    /// when an epoch is present and `-` when a revision is present.
    upstream: String,

    /// Optional packaging revision, split off at the last hyphen. May
    /// contain `A-Za-z0-9.+~`.
    revision: Option<String>,
}

/// Error conditions which may be encountered when parsing or comparing
/// [Version] values.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The version string is empty.
    Empty,

    /// The epoch is not an unsigned integer no larger than [i32::MAX].
    InvalidEpoch,

    /// The upstream component is empty.
    NoUpstream,

    /// A trailing hyphen left the revision component empty.
    NoRevision,

    /// The upstream component contains a character which is not permitted.
    InvalidUpstream,

    /// The revision component contains a character which is not permitted.
    InvalidRevision,

    /// The relational operator string is not one we understand. The caller
    /// maps this onto its "argument error" exit path.
    UnknownOperator,
}
crate::errors::error_enum!(Error);

fn permitted(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.' || ch == '+' || ch == '~'
}

impl Version {
    /// Build a [Version] from parts, validating the component character
    /// sets.
    pub fn from_parts(
        epoch: Option<u32>,
        upstream: &str,
        revision: Option<&str>,
    ) -> Result<Self, Error> {
        let ret = Version {
            epoch,
            upstream: upstream.to_owned(),
            revision: revision.map(|v| v.to_owned()),
        };
        ret.check()?;
        Ok(ret)
    }

    /// Effective epoch; `0` when absent.
    pub fn epoch(&self) -> u32 {
        self.epoch.unwrap_or(0)
    }

    /// Whether the epoch was written out explicitly.
    pub fn has_epoch(&self) -> bool {
        self.epoch.is_some()
    }

    /// The upstream component.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// The revision component, if any.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// The canonical form of this version: a zero epoch is dropped, as is
    /// an all-zero revision. Canonicalizing twice is the same as
    /// canonicalizing once, and a version always compares equal to its
    /// canonical form.
    pub fn canonicalize(&self) -> Version {
        let epoch = match self.epoch {
            Some(0) | None => None,
            Some(epoch) => Some(epoch),
        };
        let revision = match &self.revision {
            Some(revision) if revision.chars().all(|ch| ch == '0') => None,
            other => other.clone(),
        };
        Version {
            epoch,
            upstream: self.upstream.clone(),
            revision,
        }
    }

    fn check(&self) -> Result<(), Error> {
        if self.upstream.is_empty() {
            return Err(Error::NoUpstream);
        }
        for ch in self.upstream.chars() {
            if permitted(ch) {
                continue;
            }
            if ch == ':' && self.epoch.is_some() {
                continue;
            }
            if ch == '-' && self.revision.is_some() {
                continue;
            }
            return Err(Error::InvalidUpstream);
        }
        if let Some(revision) = &self.revision {
            if revision.is_empty() {
                return Err(Error::NoRevision);
            }
            if !revision.chars().all(permitted) {
                return Err(Error::InvalidRevision);
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::Empty);
        }

        let (epoch, rest) = match input.split_once(':') {
            Some((epoch, rest)) => {
                let epoch: u32 = epoch.parse().map_err(|_| Error::InvalidEpoch)?;
                if epoch > i32::MAX as u32 {
                    return Err(Error::InvalidEpoch);
                }
                (Some(epoch), rest)
            }
            None => (None, input),
        };

        if rest.is_empty() {
            return Err(Error::NoUpstream);
        }

        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((upstream, revision)) => {
                if revision.is_empty() {
                    return Err(Error::NoRevision);
                }
                (upstream, Some(revision))
            }
            None => (rest, None),
        };

        Version::from_parts(epoch, upstream, revision)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(epoch) = self.epoch {
            write!(f, "{}:", epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if let Some(revision) = &self.revision {
            write!(f, "-{}", revision)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod serde {
    use super::Version;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Version {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            String::serialize(&self.to_string(), serializer)
        }
    }

    impl<'de> Deserialize<'de> for Version {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            s.parse().map_err(|e| D::Error::custom(format!("{:?}", e)))
        }
    }
}


// vim: foldmethod=marker
