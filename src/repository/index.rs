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

use crate::archive::{ArchiveEntry, Compression, MemoryFile, TarWriter};
use crate::control::ControlFile;
use crate::errors::{Error, Result};
use crate::package::BinaryPackage;
use std::path::{Path, PathBuf};

/// One package recorded in a repository index: its control fields plus
/// the file information of the archive it was read from.
#[derive(Clone, Debug)]
pub struct IndexPackage {
    /// The package's full control fields.
    pub control: ControlFile,

    /// Path of the `.deb` relative to the repository root.
    pub deb_path: String,

    /// Size of the `.deb` in bytes.
    pub deb_size: u64,

    /// Modification time of the `.deb`, seconds since the epoch.
    pub deb_mtime: u64,
}

fn scan_directory(
    directory: &Path,
    recursive: bool,
    found: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut entries = std::fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            if recursive {
                scan_directory(&path, recursive, found)?;
            }
            continue;
        }
        if path.extension().map(|e| e == "deb").unwrap_or(false) {
            found.push(path);
        }
    }
    Ok(())
}

/// Walk the repository directories and assemble `index.tar.gz`: one
/// entry per archive, named after the archive, carrying its control
/// fields with the file information recorded alongside. An empty result
/// is an error.
pub fn create_index(
    directories: &[PathBuf],
    recursive: bool,
) -> Result<MemoryFile> {
    let mut debs: Vec<(PathBuf, PathBuf)> = vec![];
    for directory in directories {
        let mut found = vec![];
        scan_directory(directory, recursive, &mut found)?;
        for path in found {
            let relative = path
                .strip_prefix(directory)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            debs.push((path.clone(), PathBuf::from(relative)));
        }
    }

    if debs.is_empty() {
        return Err(Error::invalid("no packages found to index"));
    }

    let mut writer = TarWriter::new();
    for (path, relative) in debs {
        let package = BinaryPackage::open(&path).map_err(Error::from)?;
        let metadata = std::fs::metadata(&path)?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        let mut control = package.control().clone();
        let relative = relative.to_string_lossy().into_owned();
        control.set("X-Index-Path", &relative);
        control.set("X-Index-Size", &metadata.len().to_string());
        control.set("X-Index-MTime", &mtime.to_string());

        let text = control.to_string();
        let mut entry = ArchiveEntry::regular(&relative, text.len() as u64, 0o644);
        entry.mtime = mtime;
        writer.append(&entry, text.as_bytes())?;
    }

    let tar = writer.finish()?;
    Ok(MemoryFile::new(tar).compress(Compression::Gzip, 9)?)
}

/// Decode an index produced by [create_index].
pub fn read_index(index: &MemoryFile) -> Result<Vec<IndexPackage>> {
    let mut ret = vec![];
    for (_, data) in index.entries().map_err(Error::from)? {
        let control = ControlFile::parse(&String::from_utf8_lossy(&data))
            .map_err(|err| Error::parse(format!("index entry: {}", err)))?;
        let deb_path = control.get_line("X-Index-Path").unwrap_or_default();
        let deb_size = control
            .get_line("X-Index-Size")
            .and_then(|text| text.parse().ok())
            .unwrap_or(0);
        let deb_mtime = control
            .get_line("X-Index-MTime")
            .and_then(|text| text.parse().ok())
            .unwrap_or(0);
        ret.push(IndexPackage {
            control,
            deb_path,
            deb_size,
            deb_mtime,
        });
    }
    Ok(ret)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::package::PackageBuilder;

    fn build_deb(dir: &Path, name: &str, version: &str) {
        let control = ControlFile::parse(&format!(
            "\
Package: {}
Version: {}
Architecture: all
Maintainer: T <t@example.com>
Description: test package
",
            name, version
        ))
        .unwrap();
        let mut builder = PackageBuilder::new(control);
        builder
            .add_file(&format!("usr/share/{}/marker", name), b"x\n", 0o644)
            .unwrap();
        builder
            .write_to(dir.join(format!("{}_{}_all.deb", name, version)))
            .unwrap();
    }

    #[test]
    fn index_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        build_deb(dir.path(), "alpha", "1.0");
        build_deb(dir.path(), "beta", "2.0");

        let index = create_index(&[dir.path().to_owned()], false).unwrap();
        let packages = read_index(&index).unwrap();
        assert_eq!(2, packages.len());
        assert_eq!(
            Some("alpha".to_owned()),
            packages[0].control.get_line("Package")
        );
        assert_eq!("alpha_1.0_all.deb", packages[0].deb_path);
        assert!(packages[0].deb_size > 0);
    }

    #[test]
    fn recursive_scan_descends() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pool/main");
        std::fs::create_dir_all(&nested).unwrap();
        build_deb(&nested, "gamma", "0.1");

        assert!(create_index(&[dir.path().to_owned()], false).is_err());
        let index = create_index(&[dir.path().to_owned()], true).unwrap();
        let packages = read_index(&index).unwrap();
        assert_eq!(1, packages.len());
        assert_eq!("pool/main/gamma_0.1_all.deb", packages[0].deb_path);
    }

    #[test]
    fn empty_repository_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(create_index(&[dir.path().to_owned()], true).is_err());
    }
}

// vim: foldmethod=marker
