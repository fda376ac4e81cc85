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

/// One `Name: value` entry of a control file.
///
/// The name may carry a sub-package qualifier, written `Name/sub`, which
/// is used during multi-binary builds: when a sub-package is selected, a
/// qualified field overrides its unqualified counterpart. Multi-line
/// values keep one string per logical line; an empty line stands for the
/// `.` blank-paragraph marker of the wire format.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The field name as it appeared in the source, qualifier excluded.
    pub name: String,

    /// The sub-package qualifier, when one was written.
    pub sub_package: Option<String>,

    /// Logical value lines. The first entry is the text following the
    /// colon; the rest are continuation lines.
    pub lines: Vec<String>,

    /// One-based source line of the field, for diagnostics. Zero for
    /// fields created programmatically.
    pub line: usize,
}

impl Field {
    /// Build a single-line field with no source position.
    pub fn new(name: &str, value: &str) -> Self {
        Field {
            name: name.to_owned(),
            sub_package: None,
            lines: value.split('\n').map(|l| l.to_owned()).collect(),
            line: 0,
        }
    }

    /// Whether this field's name matches, ASCII case insensitively.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The value with logical lines joined by `\n`.
    pub fn value(&self) -> String {
        self.lines.join("\n")
    }

    /// The first logical line only, which is the whole value for the
    /// common single-line fields.
    pub fn first_line(&self) -> &str {
        self.lines.first().map(|l| l.as_str()).unwrap_or("")
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sub_package {
            Some(sub) => write!(f, "{}/{}:", self.name, sub)?,
            None => write!(f, "{}:", self.name)?,
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if idx == 0 {
                if !line.is_empty() {
                    write!(f, " {}", line)?;
                }
            } else if line.is_empty() {
                write!(f, "\n .")?;
            } else {
                write!(f, "\n {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_line_renders() {
        let field = Field::new("Package", "wpkg");
        assert_eq!("Package: wpkg", field.to_string());
    }

    #[test]
    fn multi_line_renders_with_continuations() {
        let field = Field::new("Description", "short\nlong line one\n\nlong line two");
        assert_eq!(
            "Description: short\n long line one\n .\n long line two",
            field.to_string()
        );
    }

    #[test]
    fn qualified_name_renders() {
        let mut field = Field::new("Description", "runtime files");
        field.sub_package = Some("runtime".to_owned());
        assert_eq!("Description/runtime: runtime files", field.to_string());
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let field = Field::new("Package", "wpkg");
        assert!(field.is_named("package"));
        assert!(field.is_named("PACKAGE"));
        assert!(!field.is_named("version"));
    }
}

// vim: foldmethod=marker
