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

//! Entry-path hygiene: canonicalization to forward slashes, rejection of
//! names which cannot exist on every supported platform, and the signed
//! length-limit check.

use super::Error;

// Names Windows reserves regardless of extension. Checked on every
// platform so a package built anywhere stays installable everywhere.
static RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Normalise an archive entry path: backslashes become forward slashes,
/// `./` prefixes and leading or trailing slashes are stripped, and empty
/// components collapse.
pub fn canonicalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut rest = path.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
            continue;
        }
        if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
            continue;
        }
        break;
    }
    rest.split('/')
        .filter(|component| !component.is_empty() && *component != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Reject paths which cannot be represented on every supported platform:
/// reserved device names as any component's base name, characters Windows
/// forbids, and parent-directory escapes.
pub fn check_portable(path: &str) -> Result<(), Error> {
    for component in path.split('/') {
        if component == ".." {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let base = component.split('.').next().unwrap_or(component);
        if RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(base))
        {
            return Err(Error::ReservedName(path.to_owned()));
        }
        for ch in component.chars() {
            if matches!(ch, '<' | '>' | ':' | '"' | '|' | '?' | '*') || (ch as u32) < 0x20 {
                return Err(Error::InvalidPath(path.to_owned()));
            }
        }
    }
    Ok(())
}

/// Outcome of a path-length check.
#[derive(Clone, Debug, PartialEq)]
pub enum LengthCheck {
    /// The path fits.
    Ok,

    /// The path exceeds a positive limit; the caller should warn.
    Warning(String),

    /// The path exceeds a negative limit; the caller must fail.
    Error(String),
}

/// Check a path against a signed length limit: a positive limit produces
/// a [LengthCheck::Warning] when exceeded, a negative one a
/// [LengthCheck::Error]; zero disables the check.
pub fn check_length(path: &str, limit: i32) -> LengthCheck {
    if limit == 0 {
        return LengthCheck::Ok;
    }
    let max = limit.unsigned_abs() as usize;
    if path.len() <= max {
        return LengthCheck::Ok;
    }
    let message = format!(
        "path \"{}\" is {} characters long, the limit is {}",
        path,
        path.len(),
        max
    );
    if limit > 0 {
        LengthCheck::Warning(message)
    } else {
        LengthCheck::Error(message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_canonical {
        ($name:ident, $input:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!($expected, canonicalize($input));
            }
        };
    }

    check_canonical!(plain, "usr/bin/tool", "usr/bin/tool");
    check_canonical!(dot_slash, "./usr/bin/tool", "usr/bin/tool");
    check_canonical!(many_prefixes, ".//./usr/bin/tool", "usr/bin/tool");
    check_canonical!(backslashes, "usr\\bin\\tool", "usr/bin/tool");
    check_canonical!(trailing_slash, "usr/share/doc/", "usr/share/doc");
    check_canonical!(leading_slash, "/usr/bin/tool", "usr/bin/tool");
    check_canonical!(inner_dot, "usr/./bin", "usr/bin");

    #[test]
    fn reserved_names_rejected() {
        assert!(matches!(
            check_portable("usr/share/CON"),
            Err(Error::ReservedName(_))
        ));
        // reserved even with an extension, and case insensitively
        assert!(matches!(
            check_portable("docs/con.txt"),
            Err(Error::ReservedName(_))
        ));
        assert!(matches!(
            check_portable("lpt1/file"),
            Err(Error::ReservedName(_))
        ));
        assert!(check_portable("usr/bin/console").is_ok());
    }

    #[test]
    fn forbidden_characters_rejected() {
        assert!(check_portable("usr/bin/a:b").is_err());
        assert!(check_portable("usr/bin/a*b").is_err());
        assert!(check_portable("usr/bin/tool").is_ok());
    }

    #[test]
    fn parent_escapes_rejected() {
        assert!(check_portable("../etc/passwd").is_err());
        assert!(check_portable("usr/../../etc").is_err());
    }

    #[test]
    fn length_limit_sign_selects_severity() {
        let long = "a/".repeat(40) + "tail";
        assert_eq!(LengthCheck::Ok, check_length(&long, 0));
        assert_eq!(LengthCheck::Ok, check_length("short", 64));
        assert!(matches!(check_length(&long, 64), LengthCheck::Warning(_)));
        assert!(matches!(check_length(&long, -64), LengthCheck::Error(_)));
    }
}

// vim: foldmethod=marker
