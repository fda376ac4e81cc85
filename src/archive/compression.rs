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
use std::io::{Read, Write};

/// Compression codec applied to an archive member or standalone stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Store uncompressed.
    None,

    /// gzip (RFC 1952).
    Gzip,

    /// bzip2.
    Bzip2,

    /// Legacy standalone lzma ("lzma alone").
    Lzma,

    /// xz container around LZMA2.
    Xz,
}

/// Every codec which actually compresses, in the order tried by
/// [Compression::best].
pub static CODECS: &[Compression] = &[
    Compression::Gzip,
    Compression::Bzip2,
    Compression::Lzma,
    Compression::Xz,
];

impl Compression {
    /// The filename suffix for this codec, including the dot; empty for
    /// [Compression::None].
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Bzip2 => ".bz2",
            Compression::Lzma => ".lzma",
            Compression::Xz => ".xz",
        }
    }

    /// Pick a codec from a member or file name suffix.
    pub fn from_extension(name: &str) -> Compression {
        if name.ends_with(".gz") {
            Compression::Gzip
        } else if name.ends_with(".bz2") {
            Compression::Bzip2
        } else if name.ends_with(".lzma") {
            Compression::Lzma
        } else if name.ends_with(".xz") {
            Compression::Xz
        } else {
            Compression::None
        }
    }

    /// Sniff a codec from magic bytes; `None` when the data is not a
    /// recognised compressed stream.
    pub fn detect(data: &[u8]) -> Option<Compression> {
        if data.starts_with(&[0x1f, 0x8b]) {
            Some(Compression::Gzip)
        } else if data.starts_with(b"BZh") {
            Some(Compression::Bzip2)
        } else if data.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Compression::Xz)
        } else if data.len() > 12 && data[0] == 0x5d && data[1] == 0x00 {
            Some(Compression::Lzma)
        } else {
            None
        }
    }

    /// Compress `data` at the given level (1..=9).
    pub fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>, Error> {
        if !(1..=9).contains(&level) && *self != Compression::None {
            return Err(Error::BadLevel(level));
        }
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level));
                encoder.write_all(data).map_err(Error::from_io)?;
                encoder.finish().map_err(Error::from_io)
            }
            Compression::Bzip2 => {
                let mut encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(level));
                encoder.write_all(data).map_err(Error::from_io)?;
                encoder.finish().map_err(Error::from_io)
            }
            Compression::Lzma => {
                let options = xz2::stream::LzmaOptions::new_preset(level)
                    .map_err(|err| Error::Corrupt(err.to_string()))?;
                let stream = xz2::stream::Stream::new_lzma_encoder(&options)
                    .map_err(|err| Error::Corrupt(err.to_string()))?;
                let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
                encoder.write_all(data).map_err(Error::from_io)?;
                encoder.finish().map_err(Error::from_io)
            }
            Compression::Xz => {
                let mut encoder = xz2::write::XzEncoder::new(Vec::new(), level);
                encoder.write_all(data).map_err(Error::from_io)?;
                encoder.finish().map_err(Error::from_io)
            }
        }
    }

    /// Decompress a stream previously produced by this codec.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut ret = Vec::new();
        match self {
            Compression::None => ret.extend_from_slice(data),
            Compression::Gzip => {
                flate2::read::GzDecoder::new(data)
                    .read_to_end(&mut ret)
                    .map_err(Error::from_io)?;
            }
            Compression::Bzip2 => {
                bzip2::read::BzDecoder::new(data)
                    .read_to_end(&mut ret)
                    .map_err(Error::from_io)?;
            }
            Compression::Lzma => {
                let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)
                    .map_err(|err| Error::Corrupt(err.to_string()))?;
                xz2::read::XzDecoder::new_stream(data, stream)
                    .read_to_end(&mut ret)
                    .map_err(Error::from_io)?;
            }
            Compression::Xz => {
                xz2::read::XzDecoder::new(data)
                    .read_to_end(&mut ret)
                    .map_err(Error::from_io)?;
            }
        }
        Ok(ret)
    }

    /// Compress with every codec and keep the smallest result, the
    /// uncompressed form included.
    pub fn best(data: &[u8], level: u32) -> Result<(Compression, Vec<u8>), Error> {
        let mut winner = (Compression::None, data.to_vec());
        for codec in CODECS {
            let compressed = codec.compress(data, level)?;
            if compressed.len() < winner.1.len() {
                winner = (*codec, compressed);
            }
        }
        Ok(winner)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Compression::None => "none",
                Compression::Gzip => "gzip",
                Compression::Bzip2 => "bzip2",
                Compression::Lzma => "lzma",
                Compression::Xz => "xz",
            }
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static SAMPLE: &[u8] = b"wpkg wpkg wpkg wpkg wpkg wpkg wpkg wpkg wpkg wpkg wpkg wpkg";

    #[test]
    fn round_trips_every_codec_and_level() {
        for codec in CODECS {
            for level in 1..=9 {
                let compressed = codec.compress(SAMPLE, level).unwrap();
                let restored = codec.decompress(&compressed).unwrap();
                assert_eq!(SAMPLE, &restored[..], "{} level {}", codec, level);
            }
        }
    }

    #[test]
    fn compressed_streams_detect_as_their_codec() {
        for codec in CODECS {
            let compressed = codec.compress(SAMPLE, 6).unwrap();
            assert_eq!(Some(*codec), Compression::detect(&compressed));
        }
        assert_eq!(None, Compression::detect(SAMPLE));
    }

    #[test]
    fn extension_round_trip() {
        for codec in CODECS {
            assert_eq!(
                *codec,
                Compression::from_extension(&format!("data.tar{}", codec.extension()))
            );
        }
        assert_eq!(Compression::None, Compression::from_extension("data.tar"));
    }

    #[test]
    fn bad_level_is_rejected() {
        assert_eq!(
            Err(Error::BadLevel(0)),
            Compression::Gzip.compress(SAMPLE, 0)
        );
        assert_eq!(
            Err(Error::BadLevel(10)),
            Compression::Xz.compress(SAMPLE, 10)
        );
    }

    #[test]
    fn best_never_loses_to_identity() {
        let (_, best) = Compression::best(SAMPLE, 9).unwrap();
        assert!(best.len() <= SAMPLE.len());
        let restored_empty = Compression::best(b"", 9).unwrap();
        assert_eq!(Compression::None, restored_empty.0);
    }
}

// vim: foldmethod=marker
