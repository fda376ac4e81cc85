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
use crate::archive::{
    path, ArWriter, ArchiveEntry, Compression, EntryType, MemoryFile, TarWriter,
};
use crate::control::{missing_binary_fields, ControlFile};
use std::collections::BTreeMap;
use std::path::Path;

/// Assembles a binary package archive from a control file and a staged
/// payload. The builder drives the codec layer only; installing the
/// result onto a target is strictly the installer's business.
pub struct PackageBuilder {
    control: ControlFile,
    compression: Compression,
    level: u32,
    payload: Vec<(ArchiveEntry, Vec<u8>)>,
    conffiles: Vec<String>,
    scripts: BTreeMap<String, Vec<u8>>,
}

impl PackageBuilder {
    /// Start from a control file.
    pub fn new(control: ControlFile) -> Self {
        PackageBuilder {
            control,
            compression: Compression::Gzip,
            level: 9,
            payload: vec![],
            conffiles: vec![],
            scripts: BTreeMap::new(),
        }
    }

    /// Choose the codec and level applied to both inner tars.
    pub fn set_compression(&mut self, codec: Compression, level: u32) -> &mut Self {
        self.compression = codec;
        self.level = level;
        self
    }

    fn checked_path(&self, entry_path: &str) -> Result<String, Error> {
        let canonical = path::canonicalize(entry_path);
        if canonical.is_empty() {
            return Err(Error::Archive(crate::archive::Error::InvalidPath(
                entry_path.to_owned(),
            )));
        }
        path::check_portable(&canonical)?;
        Ok(canonical)
    }

    /// Add a directory entry to the payload.
    pub fn add_directory(&mut self, dir_path: &str, mode: u32) -> Result<&mut Self, Error> {
        let canonical = self.checked_path(dir_path)?;
        self.payload
            .push((ArchiveEntry::directory(&canonical, mode), vec![]));
        Ok(self)
    }

    /// Add a regular file to the payload.
    pub fn add_file(&mut self, file_path: &str, data: &[u8], mode: u32) -> Result<&mut Self, Error> {
        let canonical = self.checked_path(file_path)?;
        self.payload.push((
            ArchiveEntry::regular(&canonical, data.len() as u64, mode),
            data.to_vec(),
        ));
        Ok(self)
    }

    /// Add a regular file and declare it a conffile.
    pub fn add_conffile(
        &mut self,
        file_path: &str,
        data: &[u8],
        mode: u32,
    ) -> Result<&mut Self, Error> {
        let canonical = self.checked_path(file_path)?;
        self.add_file(file_path, data, mode)?;
        self.conffiles.push(canonical);
        Ok(self)
    }

    /// Add a symbolic link to the payload.
    pub fn add_symlink(&mut self, link_path: &str, target: &str) -> Result<&mut Self, Error> {
        let canonical = self.checked_path(link_path)?;
        self.payload
            .push((ArchiveEntry::symlink(&canonical, target), vec![]));
        Ok(self)
    }

    /// Attach a maintainer script (`preinst`, `postinst`, `prerm`,
    /// `postrm` or `validate`).
    pub fn add_script(&mut self, name: &str, content: &[u8]) -> Result<&mut Self, Error> {
        if !MAINTAINER_SCRIPTS.contains(&name) {
            return Err(Error::UnknownScript(name.to_owned()));
        }
        self.scripts.insert(name.to_owned(), content.to_vec());
        Ok(self)
    }

    /// Assemble the archive bytes.
    pub fn build(&self) -> Result<Vec<u8>, Error> {
        let missing = missing_binary_fields(&self.control);
        if !missing.is_empty() {
            return Err(Error::MissingField(missing.join(", ")));
        }

        // control member
        let mut sums = BTreeMap::new();
        for (info, data) in &self.payload {
            if info.entry_type == EntryType::Regular {
                sums.insert(info.path.clone(), md5sums::digest(data));
            }
        }

        let mut control_tar = TarWriter::new();
        let control_text = self.control.to_string();
        control_tar.append(
            &ArchiveEntry::regular("control", control_text.len() as u64, 0o644),
            control_text.as_bytes(),
        )?;
        let sums_text = md5sums::write(&sums);
        control_tar.append(
            &ArchiveEntry::regular("md5sums", sums_text.len() as u64, 0o644),
            sums_text.as_bytes(),
        )?;
        if !self.conffiles.is_empty() {
            let mut text = self.conffiles.join("\n");
            text.push('\n');
            control_tar.append(
                &ArchiveEntry::regular("conffiles", text.len() as u64, 0o644),
                text.as_bytes(),
            )?;
        }
        for (name, content) in &self.scripts {
            control_tar.append(
                &ArchiveEntry::regular(name, content.len() as u64, 0o755),
                content,
            )?;
        }

        // data member
        let mut data_tar = TarWriter::new();
        for (info, data) in &self.payload {
            data_tar.append(info, data)?;
        }

        let control_member = MemoryFile::new(control_tar.finish()?)
            .compress(self.compression, self.level)?
            .into_data();
        let data_member = MemoryFile::new(data_tar.finish()?)
            .compress(self.compression, self.level)?
            .into_data();

        let extension = self.compression.extension();
        let mut outer = ArWriter::new();
        outer.append(
            &ArchiveEntry::regular("debian-binary", PACKAGE_MAGIC.len() as u64, 0o644),
            PACKAGE_MAGIC,
        )?;
        outer.append(
            &ArchiveEntry::regular(
                &format!("control.tar{}", extension),
                control_member.len() as u64,
                0o644,
            ),
            &control_member,
        )?;
        outer.append(
            &ArchiveEntry::regular(
                &format!("data.tar{}", extension),
                data_member.len() as u64,
                0o644,
            ),
            &data_member,
        )?;
        Ok(outer.finish()?)
    }

    /// Assemble and write the archive to disk.
    pub fn write_to(&self, target: impl AsRef<Path>) -> Result<(), Error> {
        let bytes = self.build()?;
        MemoryFile::new(bytes).write_file(target, true)?;
        Ok(())
    }
}

/// Read the build number file, zero when absent.
pub fn load_build_number(file_path: impl AsRef<Path>) -> Result<u32, Error> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Ok(0);
    }
    let text = std::fs::read_to_string(file_path)
        .map_err(|err| Error::Archive(crate::archive::Error::Io(err.to_string())))?;
    text.trim()
        .parse()
        .map_err(|_| Error::BadField(format!("build number: \"{}\"", text.trim())))
}

/// Increment the build number file and return the new value. The write
/// goes through a sibling temporary file and a rename so a concurrent
/// reader never sees a torn value.
pub fn increment_build_number(file_path: impl AsRef<Path>) -> Result<u32, Error> {
    let file_path = file_path.as_ref();
    let next = load_build_number(file_path)? + 1;
    let temp = file_path.with_extension("tmp");
    std::fs::write(&temp, format!("{}\n", next))
        .map_err(|err| Error::Archive(crate::archive::Error::Io(err.to_string())))?;
    std::fs::rename(&temp, file_path)
        .map_err(|err| Error::Archive(crate::archive::Error::Io(err.to_string())))?;
    Ok(next)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::package::BinaryPackage;

    fn control() -> ControlFile {
        ControlFile::parse(
            "\
Package: demo
Version: 1.0
Architecture: all
Maintainer: Jane Doe <jane@example.com>
Description: a demonstration package
",
        )
        .unwrap()
    }

    #[test]
    fn builds_a_readable_package() {
        let dir = tempfile::tempdir().unwrap();
        let deb = dir.path().join("demo_1.0_all.deb");

        let mut builder = PackageBuilder::new(control());
        builder.add_directory("usr/bin", 0o755).unwrap();
        builder.add_file("usr/bin/demo", b"#!/bin/sh\n", 0o755).unwrap();
        builder
            .add_conffile("etc/demo.conf", b"answer=42\n", 0o644)
            .unwrap();
        builder.add_script("postinst", b"#!/bin/sh\nexit 0\n").unwrap();
        builder.write_to(&deb).unwrap();

        let package = BinaryPackage::open(&deb).unwrap();
        assert_eq!("demo", package.name());
        assert_eq!("1.0", package.version().unwrap().to_string());
        assert_eq!(vec!["etc/demo.conf".to_owned()], package.conffiles());
        assert!(package.scripts().contains_key("postinst"));
        assert_eq!(
            Some(&md5sums::digest(b"#!/bin/sh\n")),
            package.md5sums().get("usr/bin/demo")
        );
        assert_eq!(3, package.data().len());
    }

    #[test]
    fn every_codec_produces_a_readable_package() {
        let dir = tempfile::tempdir().unwrap();
        for codec in [
            Compression::None,
            Compression::Gzip,
            Compression::Bzip2,
            Compression::Lzma,
            Compression::Xz,
        ] {
            let deb = dir.path().join(format!("demo{}.deb", codec.extension()));
            let mut builder = PackageBuilder::new(control());
            builder.set_compression(codec, 6);
            builder.add_file("usr/bin/demo", b"demo\n", 0o755).unwrap();
            builder.write_to(&deb).unwrap();
            let package = BinaryPackage::open(&deb).unwrap();
            assert_eq!("demo", package.name(), "{}", codec);
        }
    }

    #[test]
    fn refuses_missing_required_fields() {
        let builder = PackageBuilder::new(ControlFile::parse("Package: demo\n").unwrap());
        assert!(matches!(builder.build(), Err(Error::MissingField(_))));
    }

    #[test]
    fn refuses_reserved_payload_paths() {
        let mut builder = PackageBuilder::new(control());
        assert!(builder.add_file("usr/bin/CON", b"x", 0o644).is_err());
        assert!(builder.add_file("../escape", b"x", 0o644).is_err());
    }

    #[test]
    fn build_number_increments_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("build-number");
        assert_eq!(0, load_build_number(&counter).unwrap());
        assert_eq!(1, increment_build_number(&counter).unwrap());
        assert_eq!(2, increment_build_number(&counter).unwrap());
        assert_eq!(2, load_build_number(&counter).unwrap());
    }
}

// vim: foldmethod=marker
