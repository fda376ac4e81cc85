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

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use wpkg::control::ControlFile;
use wpkg::database::Manager;
use wpkg::package::PackageBuilder;

/// Declarative description of a package fixture to build into a `.deb`.
pub struct TestPackage {
    pub name: String,
    pub version: String,
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, String)>,
    pub conffiles: Vec<(String, String)>,
    pub scripts: Vec<(String, String)>,
}

impl TestPackage {
    pub fn new(name: &str, version: &str) -> Self {
        TestPackage {
            name: name.to_owned(),
            version: version.to_owned(),
            fields: vec![],
            files: vec![],
            conffiles: vec![],
            scripts: vec![],
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_owned(), content.to_owned()));
        self
    }

    pub fn conffile(mut self, path: &str, content: &str) -> Self {
        self.conffiles.push((path.to_owned(), content.to_owned()));
        self
    }

    pub fn script(mut self, name: &str, body: &str) -> Self {
        self.scripts.push((name.to_owned(), body.to_owned()));
        self
    }

    /// Assemble the archive under `dir` and return its path.
    pub fn build(&self, dir: &Path) -> PathBuf {
        let mut control_text = format!(
            "Package: {}\nVersion: {}\nArchitecture: all\nMaintainer: Test Suite <tests@example.com>\nDescription: fixture package\n",
            self.name, self.version
        );
        for (name, value) in &self.fields {
            control_text.push_str(&format!("{}: {}\n", name, value));
        }
        let control = ControlFile::parse(&control_text).unwrap();

        let mut builder = PackageBuilder::new(control);
        for (path, content) in &self.files {
            builder.add_file(path, content.as_bytes(), 0o755).unwrap();
        }
        for (path, content) in &self.conffiles {
            builder
                .add_conffile(path, content.as_bytes(), 0o644)
                .unwrap();
        }
        for (name, body) in &self.scripts {
            builder.add_script(name, body.as_bytes()).unwrap();
        }

        let deb = dir.join(format!("{}_{}_all.deb", self.name, self.version));
        builder.write_to(&deb).unwrap();
        deb
    }
}

/// A throwaway target root with an initialised database.
pub fn target() -> (tempfile::TempDir, Manager) {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = Manager::new(dir.path());
    manager
        .create_database(
            &"linux-amd64".parse().unwrap(),
            "Test Suite <tests@example.com>",
        )
        .unwrap();
    (dir, manager)
}

fn walk(root: &Path, prefix: &Path, into: &mut BTreeMap<String, Vec<u8>>) {
    for entry in std::fs::read_dir(root).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        let relative = path.strip_prefix(prefix).unwrap().to_string_lossy().into_owned();
        if path.is_dir() {
            walk(&path, prefix, into);
        } else {
            into.insert(relative, std::fs::read(&path).unwrap_or_default());
        }
    }
}

/// Snapshot every file (path and content) under a directory tree, for
/// before/after comparisons.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut ret = BTreeMap::new();
    walk(root, root, &mut ret);
    ret
}

// vim: foldmethod=marker
