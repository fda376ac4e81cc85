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

use super::{md5sums, Error, MAINTAINER_SCRIPTS, PACKAGE_MAGIC};
use crate::archive::{path, ArchiveEntry, Compression, FileFormat, MemoryFile};
use crate::control::ControlFile;
use crate::version::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A binary package archive, fully decoded: the outer `ar` envelope is
/// checked, both inner tars are expanded, and the control metadata is
/// parsed.
#[derive(Clone, Debug)]
pub struct BinaryPackage {
    source_path: PathBuf,
    control: ControlFile,
    md5sums: BTreeMap<String, String>,
    conffiles: Vec<String>,
    scripts: BTreeMap<String, Vec<u8>>,
    data: Vec<(ArchiveEntry, Vec<u8>)>,
}

fn member_tar(info: &ArchiveEntry, data: Vec<u8>) -> Result<Vec<u8>, Error> {
    let codec = match Compression::detect(&data) {
        Some(codec) => codec,
        None => Compression::from_extension(&info.path),
    };
    Ok(codec.decompress(&data)?)
}

impl BinaryPackage {
    /// Read and decode a `.deb` archive from disk.
    pub fn open(package_path: impl AsRef<Path>) -> Result<Self, Error> {
        let package_path = package_path.as_ref();
        let file = MemoryFile::read_file(package_path)?;
        if file.format() != FileFormat::Ar {
            return Err(Error::NotAPackage(package_path.display().to_string()));
        }

        let members = file.entries()?;
        if members.len() != 3 {
            return Err(Error::BadMemberLayout(format!(
                "{}: expected 3 members, found {}",
                package_path.display(),
                members.len()
            )));
        }

        let (marker_info, marker_data) = &members[0];
        if marker_info.path != "debian-binary" {
            return Err(Error::BadMemberLayout(format!(
                "{}: first member is \"{}\", not \"debian-binary\"",
                package_path.display(),
                marker_info.path
            )));
        }
        if marker_data.as_slice() != PACKAGE_MAGIC {
            return Err(Error::BadMagic(package_path.display().to_string()));
        }

        let (control_info, control_data) = &members[1];
        if !control_info.path.starts_with("control.tar") {
            return Err(Error::BadMemberLayout(format!(
                "{}: second member is \"{}\", not control.tar",
                package_path.display(),
                control_info.path
            )));
        }
        let (data_info, data_data) = &members[2];
        if !data_info.path.starts_with("data.tar") {
            return Err(Error::BadMemberLayout(format!(
                "{}: third member is \"{}\", not data.tar",
                package_path.display(),
                data_info.path
            )));
        }

        let control_tar = member_tar(control_info, control_data.clone())?;
        let data_tar = member_tar(data_info, data_data.clone())?;

        let mut control: Option<ControlFile> = None;
        let mut sums = BTreeMap::new();
        let mut conffiles = vec![];
        let mut scripts = BTreeMap::new();

        for (info, data) in crate::archive::read_tar(&control_tar)? {
            if !info.entry_type.has_data() {
                continue;
            }
            match info.path.as_str() {
                "control" => {
                    let text = String::from_utf8_lossy(&data);
                    control = Some(ControlFile::parse(&text)?);
                }
                "md5sums" => {
                    sums = md5sums::parse(&String::from_utf8_lossy(&data))?;
                }
                "conffiles" => {
                    conffiles = String::from_utf8_lossy(&data)
                        .lines()
                        .map(|line| path::canonicalize(line.trim()))
                        .filter(|line| !line.is_empty())
                        .collect();
                }
                name if MAINTAINER_SCRIPTS.contains(&name) => {
                    scripts.insert(name.to_owned(), data);
                }
                _ => {}
            }
        }

        let Some(control) = control else {
            return Err(Error::MissingControl(package_path.display().to_string()));
        };

        Ok(BinaryPackage {
            source_path: package_path.to_owned(),
            control,
            md5sums: sums,
            conffiles,
            scripts,
            data: crate::archive::read_tar(&data_tar)?,
        })
    }

    /// Where the archive was read from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The parsed control file.
    pub fn control(&self) -> &ControlFile {
        &self.control
    }

    /// The package name; empty when the control file is damaged.
    pub fn name(&self) -> String {
        self.control.get_line("Package").unwrap_or_default()
    }

    /// The parsed package version.
    pub fn version(&self) -> Result<Version, Error> {
        let text = self
            .control
            .get_line("Version")
            .ok_or_else(|| Error::MissingField("Version".to_owned()))?;
        text.parse()
            .map_err(|err| Error::BadField(format!("Version: {}", err)))
    }

    /// The digests recorded in `md5sums`, keyed by entry path.
    pub fn md5sums(&self) -> &BTreeMap<String, String> {
        &self.md5sums
    }

    /// Paths declared as user-editable configuration.
    pub fn conffiles(&self) -> &[String] {
        &self.conffiles
    }

    /// The maintainer scripts keyed by name.
    pub fn scripts(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.scripts
    }

    /// Every data-tar entry with its content.
    pub fn data(&self) -> &[(ArchiveEntry, Vec<u8>)] {
        &self.data
    }

    /// The data-tar index alone: the file-information records of every
    /// payload entry.
    pub fn file_index(&self) -> Vec<ArchiveEntry> {
        self.data.iter().map(|(info, _)| info.clone()).collect()
    }

    /// Paths of payload entries which are not directories, i.e. the
    /// files this package owns once installed.
    pub fn owned_paths(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|(info, _)| info.entry_type != crate::archive::EntryType::Directory)
            .map(|(info, _)| info.path.clone())
            .collect()
    }
}

// vim: foldmethod=marker
