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

use super::{Field, Substvars};

/// Error conditions which may be encountered when working with a control
/// file. Line numbers are one-based positions in the source text.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A non-continuation line has no `:` separator.
    MissingColon(usize),

    /// A field name is empty or contains characters outside
    /// `A-Za-z0-9._-` (plus one optional `/sub` qualifier).
    InvalidName(usize),

    /// A continuation line appeared before any field.
    ContinuationWithoutField(usize),

    /// A second paragraph started; these files hold exactly one.
    MultipleParagraphs(usize),

    /// The same field (same name and qualifier) was declared twice.
    DefinedTwice(String, usize),

    /// A `substvars` line is not of the `name=value` form.
    MalformedVariable(usize),

    /// A `${name}` reference names a variable which is not defined.
    UndefinedVariable(String),
}
crate::errors::error_enum!(Error);

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' || ch == '_')
}

/// One binary variant named by a `Sub-Packages` field.
#[derive(Clone, Debug, PartialEq)]
pub struct SubPackage {
    /// The variant name, such as `runtime` or `dev`.
    pub name: String,

    /// Whether the entry carried the `*` suffix marking the canonical
    /// variant whose name is hidden from the package filename.
    pub hidden: bool,
}

/// An ordered control file: the parsed form of the RFC 822-like metadata
/// carried by packages and stored in the administrative database.
///
/// Field order and logical line structure are preserved, so reading a
/// well-formed file and writing it back yields the same bytes modulo
/// trailing whitespace. Lookups are ASCII case insensitive and resolve
/// `Name/sub` qualified fields when a sub-package has been selected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlFile {
    fields: Vec<Field>,
    selected_sub: Option<String>,
}

impl ControlFile {
    /// An empty file.
    pub fn new() -> Self {
        Default::default()
    }

    /// Parse a single-paragraph control file.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut ret = ControlFile::new();
        let mut paragraph_done = false;

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;

            if line.trim().is_empty() {
                if !ret.fields.is_empty() {
                    paragraph_done = true;
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let Some(field) = ret.fields.last_mut() else {
                    return Err(Error::ContinuationWithoutField(lineno));
                };
                if paragraph_done {
                    return Err(Error::MultipleParagraphs(lineno));
                }
                let content = line[1..].trim_end();
                if content == "." {
                    field.lines.push(String::new());
                } else {
                    field.lines.push(content.to_owned());
                }
                continue;
            }

            if paragraph_done {
                return Err(Error::MultipleParagraphs(lineno));
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::MissingColon(lineno));
            };

            let (name, sub_package) = match name.split_once('/') {
                Some((name, sub)) => (name, Some(sub)),
                None => (name, None),
            };
            if !valid_name(name) || !sub_package.map(valid_name).unwrap_or(true) {
                return Err(Error::InvalidName(lineno));
            }

            if ret
                .fields
                .iter()
                .any(|f| f.is_named(name) && f.sub_package.as_deref() == sub_package)
            {
                return Err(Error::DefinedTwice(name.to_owned(), lineno));
            }

            ret.fields.push(Field {
                name: name.to_owned(),
                sub_package: sub_package.map(|s| s.to_owned()),
                lines: vec![value.strip_prefix(' ').unwrap_or(value).trim_end().to_owned()],
                line: lineno,
            });
        }

        Ok(ret)
    }

    /// Select the sub-package whose qualified fields override unqualified
    /// ones on lookup.
    pub fn select_sub_package(&mut self, sub: Option<&str>) {
        self.selected_sub = sub.map(|s| s.to_owned());
    }

    /// Iterate over all fields in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Find a field by name, honouring the selected sub-package: a
    /// qualified match wins over an unqualified one.
    pub fn field(&self, name: &str) -> Option<&Field> {
        if let Some(sub) = &self.selected_sub {
            if let Some(field) = self
                .fields
                .iter()
                .find(|f| f.is_named(name) && f.sub_package.as_deref() == Some(sub.as_str()))
            {
                return Some(field);
            }
        }
        self.fields
            .iter()
            .find(|f| f.is_named(name) && f.sub_package.is_none())
    }

    /// The resolved value of a field, when present.
    pub fn get(&self, name: &str) -> Option<String> {
        self.field(name).map(|f| f.value())
    }

    /// The first logical line of a field, when present. Most fields are
    /// single-line, and this avoids the join.
    pub fn get_line(&self, name: &str) -> Option<String> {
        self.field(name).map(|f| f.first_line().to_owned())
    }

    /// Set (or replace) an unqualified field.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(field) = self
            .fields
            .iter_mut()
            .find(|f| f.is_named(name) && f.sub_package.is_none())
        {
            field.lines = value.split('\n').map(|l| l.to_owned()).collect();
            return;
        }
        self.fields.push(Field::new(name, value));
    }

    /// Remove an unqualified field. Returns whether one was present.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields
            .retain(|f| !(f.is_named(name) && f.sub_package.is_none()));
        before != self.fields.len()
    }

    /// Expand substitution variables in every field value.
    pub fn resolve_variables(&mut self, vars: &Substvars) -> Result<(), Error> {
        for field in &mut self.fields {
            for line in &mut field.lines {
                if line.contains("${") {
                    *line = vars.resolve(line)?;
                }
            }
        }
        Ok(())
    }

    /// Produce a flattened copy for one sub-package: qualified fields for
    /// that sub-package override unqualified ones, qualifiers for other
    /// sub-packages are dropped, and the result carries no qualifiers at
    /// all.
    pub fn flatten_for(&self, sub: &str) -> ControlFile {
        let mut ret = ControlFile::new();
        for field in &self.fields {
            match field.sub_package.as_deref() {
                None => {
                    let overridden = self.fields.iter().any(|f| {
                        f.is_named(&field.name) && f.sub_package.as_deref() == Some(sub)
                    });
                    if !overridden {
                        let mut flat = field.clone();
                        flat.sub_package = None;
                        ret.fields.push(flat);
                    }
                }
                Some(qualifier) if qualifier == sub => {
                    let mut flat = field.clone();
                    flat.sub_package = None;
                    ret.fields.push(flat);
                }
                Some(_) => {}
            }
        }
        ret
    }

    /// The variants listed by the `Sub-Packages` field, in order. The `*`
    /// suffix marks the canonical (name-hidden) variant.
    pub fn sub_packages(&self) -> Vec<SubPackage> {
        let Some(value) = self.get_line("Sub-Packages") else {
            return vec![];
        };
        value
            .split(',')
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.strip_suffix('*') {
                Some(name) => SubPackage {
                    name: name.trim().to_owned(),
                    hidden: true,
                },
                None => SubPackage {
                    name: entry.to_owned(),
                    hidden: false,
                },
            })
            .collect()
    }
}

impl std::fmt::Display for ControlFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}", field)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ControlFile {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        ControlFile::parse(text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! check_parse {
        ($name:ident, $input:expr, |$file:ident| $block:tt) => {
            #[test]
            fn $name() {
                let $file = ControlFile::parse($input).unwrap();
                $block
            }
        };
    }

    macro_rules! check_parse_fails {
        ($name:ident, $input:expr, $err:expr) => {
            #[test]
            fn $name() {
                assert_eq!(Err($err), ControlFile::parse($input));
            }
        };
    }

    check_parse!(
        basic_fields,
        "\
Package: wpkg
Version: 1.0
",
        |file| {
            assert_eq!(Some("wpkg".to_owned()), file.get("Package"));
            assert_eq!(Some("1.0".to_owned()), file.get("Version"));
        }
    );

    check_parse!(
        lookup_is_case_insensitive,
        "\
Package: wpkg
",
        |file| {
            assert_eq!(Some("wpkg".to_owned()), file.get("package"));
            assert_eq!(Some("wpkg".to_owned()), file.get("PACKAGE"));
        }
    );

    check_parse!(
        continuations_and_dot,
        "\
Description: a package manager
 It installs things.
 .
 It removes them too.
",
        |file| {
            assert_eq!(
                Some(
                    "a package manager\nIt installs things.\n\nIt removes them too."
                        .to_owned()
                ),
                file.get("Description")
            );
        }
    );

    check_parse!(
        comments_are_skipped,
        "\
Package: wpkg
# this is ignored
Version: 1.0
",
        |file| {
            assert_eq!(2, file.iter().count());
        }
    );

    check_parse!(
        value_with_colon,
        "\
Homepage: https://example.com/wpkg
",
        |file| {
            assert_eq!(
                Some("https://example.com/wpkg".to_owned()),
                file.get("Homepage")
            );
        }
    );

    check_parse!(
        line_numbers_recorded,
        "\
Package: wpkg

",
        |file| {
            assert_eq!(1, file.field("Package").unwrap().line);
        }
    );

    check_parse_fails!(no_colon, "Package wpkg\n", Error::MissingColon(1));
    check_parse_fails!(bad_name, "Pack age: wpkg\n", Error::InvalidName(1));
    check_parse_fails!(
        stray_continuation,
        " lonely\n",
        Error::ContinuationWithoutField(1)
    );
    check_parse_fails!(
        two_paragraphs,
        "Package: a\n\nPackage: b\n",
        Error::MultipleParagraphs(3)
    );
    check_parse_fails!(
        duplicate_field,
        "Package: a\npackage: b\n",
        Error::DefinedTwice("package".to_owned(), 2)
    );

    #[test]
    fn write_round_trips_well_formed_input() {
        let text = "\
Package: wpkg
Version: 1.0
Description: a package manager
 It installs things.
 .
 It removes them too.
";
        let file = ControlFile::parse(text).unwrap();
        assert_eq!(text, file.to_string());
    }

    #[test]
    fn sub_package_qualifier_overrides() {
        let mut file = ControlFile::parse(
            "\
Package: wpkg
Description: everything
Description/runtime: just the runtime
",
        )
        .unwrap();

        assert_eq!(Some("everything".to_owned()), file.get("Description"));
        file.select_sub_package(Some("runtime"));
        assert_eq!(
            Some("just the runtime".to_owned()),
            file.get("Description")
        );
        file.select_sub_package(Some("dev"));
        assert_eq!(Some("everything".to_owned()), file.get("Description"));
    }

    #[test]
    fn flatten_for_drops_other_qualifiers() {
        let file = ControlFile::parse(
            "\
Package: wpkg
Description: everything
Description/runtime: just the runtime
Section/dev: libdevel
",
        )
        .unwrap();

        let flat = file.flatten_for("runtime");
        assert_eq!(Some("just the runtime".to_owned()), flat.get("Description"));
        assert_eq!(None, flat.get("Section"));
        assert!(flat.iter().all(|f| f.sub_package.is_none()));
    }

    #[test]
    fn sub_packages_listing() {
        let file = ControlFile::parse("Sub-Packages: runtime*, dev, doc\n").unwrap();
        let subs = file.sub_packages();
        assert_eq!(3, subs.len());
        assert_eq!(
            SubPackage {
                name: "runtime".to_owned(),
                hidden: true
            },
            subs[0]
        );
        assert!(!subs[1].hidden);
    }

    #[test]
    fn set_and_delete() {
        let mut file = ControlFile::parse("Package: wpkg\n").unwrap();
        file.set("Version", "2.0");
        file.set("Package", "renamed");
        assert_eq!(Some("2.0".to_owned()), file.get("Version"));
        assert_eq!(Some("renamed".to_owned()), file.get("Package"));
        assert!(file.delete("Version"));
        assert!(!file.delete("Version"));
    }

    #[test]
    fn variables_resolve_in_values() {
        let mut file =
            ControlFile::parse("Package: ${name}\nDepends: other (>= ${minimum})\n").unwrap();
        let mut vars = Substvars::new();
        vars.set("name", "wpkg");
        vars.set("minimum", "1.2");
        file.resolve_variables(&vars).unwrap();
        assert_eq!(Some("wpkg".to_owned()), file.get("Package"));
        assert_eq!(Some("other (>= 1.2)".to_owned()), file.get("Depends"));
    }
}

// vim: foldmethod=marker
