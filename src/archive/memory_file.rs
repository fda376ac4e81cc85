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

use super::{ar, compression::Compression, tar, ArchiveEntry, Error};
use std::path::Path;

/// Container or stream format of a [MemoryFile], as sniffed from magic
/// bytes with a filename-extension fallback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileFormat {
    /// `ar` archive, the outer envelope of a package.
    Ar,

    /// POSIX tar archive.
    Tar,

    /// gzip stream.
    Gzip,

    /// bzip2 stream.
    Bzip2,

    /// Standalone lzma stream.
    Lzma,

    /// xz stream.
    Xz,

    /// zip archive; recognised but not produced.
    Zip,

    /// 7-zip archive; recognised but not produced.
    SevenZ,

    /// Anything else.
    Other,
}

impl FileFormat {
    /// Sniff the format of a buffer, using the filename only when the
    /// magic bytes are inconclusive.
    pub fn detect(data: &[u8], name: Option<&str>) -> FileFormat {
        if data.starts_with(b"!<arch>\n") {
            return FileFormat::Ar;
        }
        if data.len() > 262 && &data[257..262] == b"ustar" {
            return FileFormat::Tar;
        }
        if data.starts_with(b"PK\x03\x04") {
            return FileFormat::Zip;
        }
        if data.starts_with(&[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c]) {
            return FileFormat::SevenZ;
        }
        match Compression::detect(data) {
            Some(Compression::Gzip) => return FileFormat::Gzip,
            Some(Compression::Bzip2) => return FileFormat::Bzip2,
            Some(Compression::Lzma) => return FileFormat::Lzma,
            Some(Compression::Xz) => return FileFormat::Xz,
            _ => {}
        }
        if let Some(name) = name {
            if name.ends_with(".tar") {
                return FileFormat::Tar;
            }
            if name.ends_with(".deb") || name.ends_with(".a") {
                return FileFormat::Ar;
            }
            match Compression::from_extension(name) {
                Compression::Gzip => return FileFormat::Gzip,
                Compression::Bzip2 => return FileFormat::Bzip2,
                Compression::Lzma => return FileFormat::Lzma,
                Compression::Xz => return FileFormat::Xz,
                Compression::None => {}
            }
        }
        FileFormat::Other
    }

    /// The compression codec for stream formats; `None` for containers.
    pub fn compression(&self) -> Option<Compression> {
        match self {
            FileFormat::Gzip => Some(Compression::Gzip),
            FileFormat::Bzip2 => Some(Compression::Bzip2),
            FileFormat::Lzma => Some(Compression::Lzma),
            FileFormat::Xz => Some(Compression::Xz),
            _ => None,
        }
    }
}

/// An in-memory file: a byte buffer tagged with its detected
/// [FileFormat]. All archive and compression operations of the codec
/// work over these buffers.
#[derive(Clone, Debug, Default)]
pub struct MemoryFile {
    data: Vec<u8>,
    format: Option<FileFormat>,
}

impl MemoryFile {
    /// Wrap a buffer; the format is detected lazily.
    pub fn new(data: Vec<u8>) -> Self {
        MemoryFile { data, format: None }
    }

    /// Read a file from disk, detecting its format from content and name.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|err| Error::Io(format!("{}: {}", path.display(), err)))?;
        let format = FileFormat::detect(&data, path.to_str());
        Ok(MemoryFile {
            data,
            format: Some(format),
        })
    }

    /// Write the buffer to disk, creating parent directories. Refuses to
    /// replace an existing file unless `overwrite` is set.
    pub fn write_file(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<(), Error> {
        let path = path.as_ref();
        if !overwrite && path.exists() {
            return Err(Error::FileExists(path.display().to_string()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| Error::Io(format!("{}: {}", parent.display(), err)))?;
            }
        }
        std::fs::write(path, &self.data)
            .map_err(|err| Error::Io(format!("{}: {}", path.display(), err)))
    }

    /// The raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the raw bytes out.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The detected format of the buffer.
    pub fn format(&self) -> FileFormat {
        match self.format {
            Some(format) => format,
            None => FileFormat::detect(&self.data, None),
        }
    }

    /// Compress into a new buffer with the given codec and level.
    pub fn compress(&self, codec: Compression, level: u32) -> Result<MemoryFile, Error> {
        let data = codec.compress(&self.data, level)?;
        Ok(MemoryFile::new(data))
    }

    /// Decompress according to the detected stream format. A buffer which
    /// is not a recognised compressed stream is returned as-is.
    pub fn decompress(&self) -> Result<MemoryFile, Error> {
        match self.format().compression() {
            Some(codec) => Ok(MemoryFile::new(codec.decompress(&self.data)?)),
            None => Ok(self.clone()),
        }
    }

    /// Compress with every codec and keep the smallest output.
    pub fn best_compression(&self, level: u32) -> Result<(Compression, MemoryFile), Error> {
        let (codec, data) = Compression::best(&self.data, level)?;
        Ok((codec, MemoryFile::new(data)))
    }

    /// Iterate the entries of a `tar` or `ar` buffer, decompressing a
    /// compressed tar first. Anything else is not an archive.
    pub fn entries(&self) -> Result<Vec<(ArchiveEntry, Vec<u8>)>, Error> {
        match self.format() {
            FileFormat::Ar => ar::read_ar(&self.data),
            FileFormat::Tar => tar::read_tar(&self.data),
            format => match format.compression() {
                Some(codec) => {
                    let inner = codec.decompress(&self.data)?;
                    tar::read_tar(&inner)
                }
                None => Err(Error::NotAnArchive(format!("{:?}", format))),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::archive::tar::TarWriter;

    #[test]
    fn detects_common_formats() {
        assert_eq!(
            FileFormat::Ar,
            FileFormat::detect(b"!<arch>\nrest", None)
        );
        let gz = Compression::Gzip.compress(b"data", 6).unwrap();
        assert_eq!(FileFormat::Gzip, FileFormat::detect(&gz, None));
        assert_eq!(
            FileFormat::Tar,
            FileFormat::detect(b"", Some("payload.tar"))
        );
        assert_eq!(FileFormat::Other, FileFormat::detect(b"hello", None));
    }

    #[test]
    fn compressed_tar_entries_are_reachable() {
        let mut writer = TarWriter::new();
        writer
            .append(&ArchiveEntry::regular("etc/conf", 2, 0o644), b"x\n")
            .unwrap();
        let tar_bytes = writer.finish().unwrap();

        let file = MemoryFile::new(tar_bytes)
            .compress(Compression::Xz, 6)
            .unwrap();
        let entries = file.entries().unwrap();
        assert_eq!(1, entries.len());
        assert_eq!("etc/conf", entries[0].0.path);
    }

    #[test]
    fn write_respects_overwrite_flag() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sub/file.bin");
        let file = MemoryFile::new(b"one".to_vec());
        file.write_file(&target, false).unwrap();
        assert!(matches!(
            file.write_file(&target, false),
            Err(Error::FileExists(_))
        ));
        file.write_file(&target, true).unwrap();
        let read_back = MemoryFile::read_file(&target).unwrap();
        assert_eq!(b"one", read_back.data());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            MemoryFile::read_file("/does/not/exist"),
            Err(Error::Io(_))
        ));
    }
}

// vim: foldmethod=marker
