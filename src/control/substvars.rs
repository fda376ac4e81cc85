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

use super::Error;
use std::collections::BTreeMap;

/// Substitution variables, resolved into `${name}` references found in
/// control field values.
///
/// Variables come from three places: the caller (`set`), a `substvars`
/// file of `name=value` lines (`load`), and the built-ins injected by
/// [Substvars::auto_transform] (paths and identity of the package being
/// processed).
#[derive(Clone, Debug, Default)]
pub struct Substvars {
    variables: BTreeMap<String, String>,
}

impl Substvars {
    /// An empty variable set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Define (or redefine) one variable.
    pub fn set(&mut self, name: &str, value: &str) {
        self.variables.insert(name.to_owned(), value.to_owned());
    }

    /// Look one variable up.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(|v| v.as_str())
    }

    /// Parse a `substvars` file: one `name=value` per line, `#` comments
    /// and blank lines ignored.
    pub fn load(&mut self, content: &str) -> Result<(), Error> {
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                return Err(Error::MalformedVariable(idx + 1));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::MalformedVariable(idx + 1));
            }
            self.set(name, value.trim());
        }
        Ok(())
    }

    /// Inject the built-in variables describing the current target and
    /// package, so control files can reference `${rootdir}` and friends.
    #[allow(clippy::too_many_arguments)]
    pub fn auto_transform(
        &mut self,
        rootdir: &str,
        instdir: &str,
        admindir: &str,
        name: &str,
        version: &str,
        description: &str,
        homepage: &str,
        install_prefix: &str,
    ) {
        self.set("rootdir", rootdir);
        self.set("instdir", instdir);
        self.set("admindir", admindir);
        self.set("name", name);
        self.set("version", version);
        self.set("description", description);
        self.set("homepage", homepage);
        self.set("install_prefix", install_prefix);
    }

    /// Expand every `${name}` reference in the text. A reference to an
    /// undefined variable is an error; a lone `$` or `${` without a
    /// closing brace is copied through untouched.
    pub fn resolve(&self, text: &str) -> Result<String, Error> {
        let mut ret = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            ret.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                ret.push_str(&rest[start..]);
                return Ok(ret);
            };
            let name = &after[..end];
            match self.variables.get(name) {
                Some(value) => ret.push_str(value),
                None => return Err(Error::UndefinedVariable(name.to_owned())),
            }
            rest = &after[end + 1..];
        }
        ret.push_str(rest);
        Ok(ret)
    }
}


// vim: foldmethod=marker
