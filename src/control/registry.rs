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

//! The closed registry of known control fields: canonical spelling, one
//! line of help, and a value verifier per field. Unknown fields pass
//! through as raw text.

use super::ControlFile;
use crate::architecture::Architecture;
use crate::dependency::Dependency;
use crate::version::Version;

/// How one registered field is spelled, documented and verified.
///
/// The registry is a closed table: the parser accepts unknown fields as
/// raw text, but a field listed here has its value checked whenever a
/// control file is validated.
pub struct FieldDescriptor {
    /// The canonical capitalization of the field name.
    pub name: &'static str,

    /// One-line description shown by field help output.
    pub help: &'static str,

    verify: fn(&str) -> Result<(), String>,
}

impl FieldDescriptor {
    /// Check one value against this field's constraints.
    pub fn verify_value(&self, value: &str) -> Result<(), String> {
        (self.verify)(value)
    }
}

/// One problem found while validating a control file.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// One-based source line of the offending field.
    pub line: usize,

    /// The field name as written.
    pub field: String,

    /// What is wrong with the value.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.line, self.field, self.message)
    }
}

fn verify_free_text(_value: &str) -> Result<(), String> {
    Ok(())
}

fn verify_package_name(value: &str) -> Result<(), String> {
    let ok = !value.is_empty()
        && value.chars().next().map(|c| c.is_ascii_alphanumeric()).unwrap_or(false)
        && value.chars().all(|ch| {
            ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '.' || ch == '+'
        });
    if ok {
        Ok(())
    } else {
        Err(format!("\"{}\" is not a valid package name", value))
    }
}

fn verify_version(value: &str) -> Result<(), String> {
    value
        .parse::<Version>()
        .map(|_| ())
        .map_err(|err| format!("\"{}\" is not a valid version: {}", value, err))
}

fn verify_architecture(value: &str) -> Result<(), String> {
    for arch in value.split_whitespace() {
        arch.parse::<Architecture>()
            .map_err(|err| format!("\"{}\" is not a valid architecture: {}", arch, err))?;
    }
    Ok(())
}

fn verify_dependency(value: &str) -> Result<(), String> {
    // unresolved substitution variables are checked after expansion
    if value.contains("${") {
        return Ok(());
    }
    value
        .parse::<Dependency>()
        .map(|_| ())
        .map_err(|err| format!("invalid dependency expression: {}", err))
}

fn verify_boolean(value: &str) -> Result<(), String> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "no" => Ok(()),
        _ => Err(format!("\"{}\" must be \"yes\" or \"no\"", value)),
    }
}

fn verify_email_list(value: &str) -> Result<(), String> {
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let address = match (entry.rfind('<'), entry.rfind('>')) {
            (Some(start), Some(end)) if start < end => &entry[start + 1..end],
            (None, None) => entry,
            _ => return Err(format!("mismatched angle brackets in \"{}\"", entry)),
        };
        if !address.contains('@') {
            return Err(format!("\"{}\" does not look like an email address", entry));
        }
    }
    Ok(())
}

fn verify_uri(value: &str) -> Result<(), String> {
    let ok = ["http://", "https://", "ftp://", "file://"]
        .iter()
        .any(|scheme| value.starts_with(scheme));
    if ok {
        Ok(())
    } else {
        Err(format!("\"{}\" is not an accepted URI", value))
    }
}

fn verify_priority(value: &str) -> Result<(), String> {
    match value.to_ascii_lowercase().as_str() {
        "required" | "important" | "standard" | "optional" | "extra" => Ok(()),
        _ => Err(format!("\"{}\" is not a valid priority", value)),
    }
}

fn verify_urgency(value: &str) -> Result<(), String> {
    let keyword = value.split_whitespace().next().unwrap_or("");
    match keyword.to_ascii_lowercase().as_str() {
        "low" | "medium" | "high" | "emergency" | "critical" => Ok(()),
        _ => Err(format!("\"{}\" is not a valid urgency", value)),
    }
}

fn verify_section(value: &str) -> Result<(), String> {
    if !value.trim().is_empty() && !value.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(format!("\"{}\" is not a valid section", value))
    }
}

fn verify_size(value: &str) -> Result<(), String> {
    value
        .trim()
        .parse::<u64>()
        .map(|_| ())
        .map_err(|_| format!("\"{}\" is not a valid size", value))
}

fn verify_date(value: &str) -> Result<(), String> {
    chrono::DateTime::parse_from_rfc2822(value.trim())
        .map(|_| ())
        .map_err(|err| format!("\"{}\" is not a valid RFC 2822 date: {}", value, err))
}

fn verify_sub_packages(value: &str) -> Result<(), String> {
    let mut hidden = 0;
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let name = entry.strip_suffix('*').unwrap_or(entry);
        if entry.ends_with('*') {
            hidden += 1;
        }
        verify_package_name(name.trim())?;
    }
    if hidden > 1 {
        return Err("only one sub-package may carry the \"*\" suffix".to_owned());
    }
    Ok(())
}

fn verify_selection(value: &str) -> Result<(), String> {
    match value.to_ascii_lowercase().as_str() {
        "auto" | "manual" | "normal" | "hold" | "reject" => Ok(()),
        _ => Err(format!("\"{}\" is not a valid selection", value)),
    }
}

static REGISTRY: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "Package",
        help: "name of the binary package",
        verify: verify_package_name,
    },
    FieldDescriptor {
        name: "Version",
        help: "version of the package ([epoch:]upstream[-revision])",
        verify: verify_version,
    },
    FieldDescriptor {
        name: "Architecture",
        help: "target architecture triplet, or \"all\" / \"source\"",
        verify: verify_architecture,
    },
    FieldDescriptor {
        name: "Maintainer",
        help: "name and email address of the maintainer",
        verify: verify_email_list,
    },
    FieldDescriptor {
        name: "Description",
        help: "one line summary and optional long description",
        verify: verify_free_text,
    },
    FieldDescriptor {
        name: "Essential",
        help: "\"yes\" when the package must not be removed",
        verify: verify_boolean,
    },
    FieldDescriptor {
        name: "Priority",
        help: "archive priority of the package",
        verify: verify_priority,
    },
    FieldDescriptor {
        name: "Section",
        help: "archive section of the package",
        verify: verify_section,
    },
    FieldDescriptor {
        name: "Urgency",
        help: "urgency of this upload",
        verify: verify_urgency,
    },
    FieldDescriptor {
        name: "Homepage",
        help: "upstream project page",
        verify: verify_uri,
    },
    FieldDescriptor {
        name: "Bugs",
        help: "where to report problems with the package",
        verify: verify_uri,
    },
    FieldDescriptor {
        name: "Depends",
        help: "packages required at configure time",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Pre-Depends",
        help: "packages required before unpack",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Recommends",
        help: "packages found together in all but unusual installs",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Suggests",
        help: "packages which enhance this one",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Conflicts",
        help: "packages which cannot be installed together with this one",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Breaks",
        help: "packages rendered broken by unpacking this one",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Replaces",
        help: "packages whose files this one may overwrite",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Provides",
        help: "virtual packages supplied by this one",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Build-Depends",
        help: "packages required to build from source",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Build-Depends-Arch",
        help: "architecture-specific build dependencies",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Build-Depends-Indep",
        help: "architecture-independent build dependencies",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Built-Using",
        help: "source packages incorporated into this binary",
        verify: verify_dependency,
    },
    FieldDescriptor {
        name: "Installed-Size",
        help: "estimated installed size in kilobytes",
        verify: verify_size,
    },
    FieldDescriptor {
        name: "Date",
        help: "build date, RFC 2822",
        verify: verify_date,
    },
    FieldDescriptor {
        name: "Sub-Packages",
        help: "binary variants built from this project; \"*\" marks the hidden name",
        verify: verify_sub_packages,
    },
    FieldDescriptor {
        name: "Minimum-Upgradable-Version",
        help: "oldest installed version this package can upgrade",
        verify: verify_version,
    },
    FieldDescriptor {
        name: "X-Selection",
        help: "per-package selection: auto, manual, normal, hold or reject",
        verify: verify_selection,
    },
];

/// Look a field up in the registry, ASCII case insensitively.
pub fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
    REGISTRY.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// All registered fields, for help output.
pub fn descriptors() -> &'static [FieldDescriptor] {
    REGISTRY
}

/// Run every known field's verifier over the file, collecting one
/// [Diagnostic] per failing value. Unknown fields pass untouched.
pub fn validate(file: &ControlFile) -> Vec<Diagnostic> {
    let mut ret = vec![];
    for field in file.iter() {
        let Some(descriptor) = descriptor(&field.name) else {
            continue;
        };
        if let Err(message) = descriptor.verify_value(&field.value()) {
            ret.push(Diagnostic {
                line: field.line,
                field: field.name.clone(),
                message,
            });
        }
    }
    ret
}

/// Fields every binary package must carry.
pub static REQUIRED_BINARY_FIELDS: &[&str] =
    &["Package", "Version", "Architecture", "Maintainer", "Description"];

/// Check that every required binary field is present and non-empty,
/// returning the missing names.
pub fn missing_binary_fields(file: &ControlFile) -> Vec<&'static str> {
    REQUIRED_BINARY_FIELDS
        .iter()
        .filter(|name| {
            file.get_line(name)
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_verifies {
        ($name:ident, $field:expr, $value:expr) => {
            #[test]
            fn $name() {
                assert_eq!(Ok(()), descriptor($field).unwrap().verify_value($value));
            }
        };
    }

    macro_rules! check_rejects {
        ($name:ident, $field:expr, $value:expr) => {
            #[test]
            fn $name() {
                assert!(descriptor($field).unwrap().verify_value($value).is_err());
            }
        };
    }

    check_verifies!(package_name, "Package", "wpkg-dev");
    check_rejects!(package_name_upper, "Package", "Wpkg");
    check_verifies!(version_good, "Version", "1:2.0-3");
    check_rejects!(version_bad, "Version", "not a version");
    check_verifies!(arch_good, "Architecture", "linux-amd64");
    check_rejects!(arch_bad, "Architecture", "Linux/AMD64");
    check_verifies!(maintainer_good, "Maintainer", "Jane Doe <jane@example.com>");
    check_rejects!(maintainer_bad, "Maintainer", "nobody at all");
    check_verifies!(essential_good, "Essential", "yes");
    check_rejects!(essential_bad, "Essential", "maybe");
    check_verifies!(priority_good, "Priority", "optional");
    check_rejects!(priority_bad, "Priority", "urgent");
    check_verifies!(urgency_good, "Urgency", "high (security fix)");
    check_rejects!(urgency_bad, "Urgency", "whenever");
    check_verifies!(homepage_good, "Homepage", "https://example.com");
    check_rejects!(homepage_bad, "Homepage", "gopher://example.com");
    check_verifies!(depends_good, "Depends", "a (>= 1.0), b | c");
    check_rejects!(depends_bad, "Depends", "a (>= )");
    check_verifies!(depends_substvar_deferred, "Depends", "a (= ${binary:Version})");
    check_verifies!(size_good, "Installed-Size", "1024");
    check_rejects!(size_bad, "Installed-Size", "-2");
    check_verifies!(date_good, "Date", "Tue, 06 Feb 2024 10:00:00 +0000");
    check_rejects!(date_bad, "Date", "yesterday");
    check_verifies!(subpackages_good, "Sub-Packages", "runtime*, dev, doc");
    check_rejects!(subpackages_two_stars, "Sub-Packages", "runtime*, dev*");
    check_verifies!(selection_good, "X-Selection", "hold");
    check_rejects!(selection_bad, "X-Selection", "keep");

    #[test]
    fn unknown_fields_pass() {
        assert!(descriptor("X-Custom-Field").is_none());
    }

    #[test]
    fn validate_reports_line_numbers() {
        let file = ControlFile::parse(
            "\
Package: wpkg
Version: one point oh
",
        )
        .unwrap();
        let diagnostics = validate(&file);
        assert_eq!(1, diagnostics.len());
        assert_eq!(2, diagnostics[0].line);
        assert_eq!("Version", diagnostics[0].field);
    }

    #[test]
    fn missing_required_fields_reported() {
        let file = ControlFile::parse("Package: wpkg\nVersion: 1.0\n").unwrap();
        assert_eq!(
            vec!["Architecture", "Maintainer", "Description"],
            missing_binary_fields(&file)
        );
    }
}

// vim: foldmethod=marker
