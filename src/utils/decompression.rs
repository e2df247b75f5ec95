//! Transparent decompression of fetched content
//!
//! Guide feeds are commonly published gzip-compressed. The format is sniffed
//! from magic bytes rather than trusted from headers or file names.

use crate::errors::{SourceError, SourceResult};

/// Supported compression formats detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Gzip,
    Uncompressed,
}

pub struct DecompressionService;

impl DecompressionService {
    pub fn detect_compression_format(data: &[u8]) -> CompressionFormat {
        match infer::get(data).map(|kind| kind.mime_type()) {
            Some("application/gzip") => CompressionFormat::Gzip,
            _ => CompressionFormat::Uncompressed,
        }
    }

    /// Decompress `data` if it is compressed, otherwise hand it back unchanged
    pub fn decompress(data: Vec<u8>) -> SourceResult<Vec<u8>> {
        match Self::detect_compression_format(&data) {
            CompressionFormat::Gzip => Self::decompress_gzip(&data),
            CompressionFormat::Uncompressed => Ok(data),
        }
    }

    #[cfg(feature = "compression-gzip")]
    fn decompress_gzip(data: &[u8]) -> SourceResult<Vec<u8>> {
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| SourceError::Decompression {
                message: format!("Failed to decompress gzip data: {e}"),
            })?;
        Ok(decompressed)
    }

    #[cfg(not(feature = "compression-gzip"))]
    fn decompress_gzip(_data: &[u8]) -> SourceResult<Vec<u8>> {
        Err(SourceError::Decompression {
            message: "gzip content received but the compression-gzip feature is disabled"
                .to_string(),
        })
    }
}
