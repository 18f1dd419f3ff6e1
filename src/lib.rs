//! # ECA (Entropy Coding Archiver)
//!
//! A lossless compression and archiving library built on classic entropy
//! coding. Files are compressed with Huffman or Shannon-Fano codes and
//! stored in a seekable archive whose metadata lives in a footer, addressed
//! by an offset pointer at byte 0.
//!
//! ## Features
//!
//! - **Two codecs**: Huffman and Shannon-Fano coding over single bytes,
//!   rebuilt deterministically from per-file frequency tables
//! - **Seekable archives**: per-entry payload offsets let single files be
//!   extracted without reading the rest
//! - **Password gating**: archives can require a password, checked against
//!   a stored SHA-256 digest (payloads are not encrypted)
//! - **Cooperative control**: pause, resume and cancel long operations and
//!   observe throttled 0-100 progress, all through a per-call token
//! - **Parallel compression**: files are encoded concurrently and written
//!   back in input order
//!
//! ## Quick Start
//!
//! ### Encoding in memory
//!
//! ```rust
//! use eca::{encode_data, decode_data, Algorithm};
//!
//! let original = b"abracadabra abracadabra";
//! let (payload, frequencies) = encode_data(original, Algorithm::Huffman).unwrap();
//! let restored = decode_data(&payload, &frequencies, Algorithm::Huffman).unwrap();
//! assert_eq!(restored, original);
//! ```
//!
//! ### Building and reading archives
//!
//! ```rust
//! use eca::{compress_files, extract_all, list_files, ArchiveConfig, Algorithm,
//!           ControlToken, NoPassword};
//! use std::path::Path;
//!
//! # fn example() -> eca::Result<()> {
//! let config = ArchiveConfig::default().with_algorithm(Algorithm::ShannonFano);
//! let ctrl = ControlToken::new();
//!
//! let inputs = ["a.txt", "b.txt"];
//! let result = compress_files(&inputs, Path::new("out.eca"), &config, &ctrl)?;
//! println!("ratio {:.3} in {:?}", result.ratio, result.duration);
//!
//! for entry in list_files(Path::new("out.eca"))? {
//!     println!("{} ({} bytes)", entry.file_name, entry.original_size);
//! }
//!
//! extract_all(Path::new("out.eca"), None, &NoPassword, &ctrl)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Pausing and observing progress
//!
//! ```rust
//! use eca::ControlToken;
//!
//! let ctrl = ControlToken::new();
//! let progress = ctrl.progress_channel();
//! // Hand `ctrl.clone()` to the operation; from here the caller can
//! // ctrl.pause(), ctrl.resume() or ctrl.cancel() at any time.
//! ctrl.report_progress(50);
//! assert_eq!(progress.recv().unwrap(), 50);
//! ```

pub mod bitio;
pub mod codec;
pub mod config;
pub mod container;
pub mod control;
pub mod error;
pub mod freq;
pub mod password;
pub mod single;

// Re-export commonly used types for convenience
pub use codec::{codec_for, Codec, HuffmanCodec, ShannonFanoCodec};
pub use config::{Algorithm, ArchiveConfig};
pub use container::{
    compress_files, extract_all, extract_file, list_files, ArchiveEntry, ArchiveMetadata,
    ARCHIVE_EXTENSION,
};
pub use control::ControlToken;
pub use error::{Error, Result};
pub use freq::FrequencyTable;
pub use password::{hash_password, NoPassword, PasswordPrompt, StaticPassword};
pub use single::{compress_file, decompress_file};

use std::time::Duration;

/// Outcome of a compression run.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Compressed bytes per original byte; lower is better.
    pub ratio: f64,
    pub duration: Duration,
}

impl CompressionResult {
    pub fn new(original_size: u64, compressed_size: u64, duration: Duration) -> Self {
        let ratio = if original_size > 0 {
            compressed_size as f64 / original_size as f64
        } else {
            0.0
        };
        Self { original_size, compressed_size, ratio, duration }
    }
}

/// Compresses a buffer in memory, returning the payload and the frequency
/// table needed to decode it.
///
/// # Example
///
/// ```rust
/// use eca::{encode_data, Algorithm};
///
/// let (payload, frequencies) = encode_data(b"hello world", Algorithm::Huffman).unwrap();
/// assert!(frequencies.count(b'l') == 3);
/// assert!(!payload.is_empty());
/// ```
pub fn encode_data(data: &[u8], algorithm: Algorithm) -> Result<(Vec<u8>, FrequencyTable)> {
    let frequencies = FrequencyTable::from_bytes(data);
    let ctrl = ControlToken::new();
    let payload = codec_for(algorithm).encode(data, &frequencies, &ctrl)?;
    Ok((payload, frequencies))
}

/// Decodes a payload produced by [`encode_data`] under the same frequency
/// table and algorithm.
pub fn decode_data(
    payload: &[u8],
    frequencies: &FrequencyTable,
    algorithm: Algorithm,
) -> Result<Vec<u8>> {
    let ctrl = ControlToken::new();
    codec_for(algorithm).decode(payload, frequencies, &ctrl)
}

/// Library version from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_data_both_algorithms() {
        let original = b"The entropy of a message is a lower bound on its coded size.";
        for algorithm in [Algorithm::Huffman, Algorithm::ShannonFano] {
            let (payload, frequencies) = encode_data(original, algorithm).unwrap();
            let restored = decode_data(&payload, &frequencies, algorithm).unwrap();
            assert_eq!(restored, original.to_vec());
        }
    }

    #[test]
    fn test_skewed_data_compresses() {
        let mut data = vec![b'a'; 4000];
        data.extend_from_slice(b"bcd");
        let (payload, _) = encode_data(&data, Algorithm::Huffman).unwrap();
        // Heavily skewed data approaches one bit per byte.
        assert!(payload.len() < data.len() / 4);
    }

    #[test]
    fn test_empty_data_is_rejected() {
        assert!(matches!(
            encode_data(b"", Algorithm::Huffman),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_compression_result_ratio() {
        let result = CompressionResult::new(1000, 250, Duration::from_millis(5));
        assert!((result.ratio - 0.25).abs() < f64::EPSILON);

        let empty = CompressionResult::new(0, 10, Duration::ZERO);
        assert_eq!(empty.ratio, 0.0);
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
