//! Page payload compression: zlib, PGLZ, or none.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressAlg {
    #[default]
    None,
    Pglz,
    Zlib,
}

impl fmt::Display for CompressAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompressAlg::None => "none",
            CompressAlg::Pglz => "pglz",
            CompressAlg::Zlib => "zlib",
        };
        f.write_str(s)
    }
}

impl FromStr for CompressAlg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CompressAlg::None),
            "pglz" => Ok(CompressAlg::Pglz),
            "zlib" => Ok(CompressAlg::Zlib),
            _ => anyhow::bail!("invalid compress algorithm value \"{s}\""),
        }
    }
}

/// Compress `src`. `None` means the data did not shrink (or the algorithm is
/// `none`) and the caller must store it raw.
pub fn compress(alg: CompressAlg, level: u32, src: &[u8]) -> Option<Vec<u8>> {
    match alg {
        CompressAlg::None => None,
        CompressAlg::Pglz => postgres_ffi::pglz::compress(src),
        CompressAlg::Zlib => {
            let mut encoder = flate2::write::ZlibEncoder::new(
                Vec::with_capacity(src.len()),
                flate2::Compression::new(level.min(9)),
            );
            encoder.write_all(src).ok()?;
            let out = encoder.finish().ok()?;
            if out.len() < src.len() {
                Some(out)
            } else {
                None
            }
        }
    }
}

/// Decompress `src` into exactly `rawsize` bytes.
pub fn decompress(alg: CompressAlg, src: &[u8], rawsize: usize) -> anyhow::Result<Vec<u8>> {
    match alg {
        CompressAlg::None => anyhow::bail!("invalid compression algorithm"),
        CompressAlg::Pglz => Ok(postgres_ffi::pglz::decompress(src, rawsize)?),
        CompressAlg::Zlib => {
            // A read-based decoder stops at the end of the zlib stream, so
            // alignment padding after the payload does not upset it.
            let mut decoder = flate2::read::ZlibDecoder::new(src);
            let mut out = Vec::with_capacity(rawsize);
            std::io::Read::read_to_end(&mut decoder, &mut out)
                .context("zlib decompression failed")?;
            anyhow::ensure!(
                out.len() == rawsize,
                "page decompressed to {} bytes, expected {rawsize}",
                out.len()
            );
            Ok(out)
        }
    }
}

/// First byte of any zlib stream with the default 32K window.
pub const ZLIB_MAGIC: u8 = 0x78;
