//! Standalone single-file compression.
//!
//! Predates the archive container and survives alongside it: one input
//! file, one header, one payload. Layout, integers little-endian, strings
//! as u32 byte length + UTF-8:
//!
//! ```text
//! string  algorithm tag
//! string  original extension (with leading dot, "" when none)
//! string  password hash ("" when unprotected)
//! u32     frequency pair count, then (u8 symbol, u32 count) pairs
//! [packed code bits]
//! u32     exact bit count
//! ```

use crate::codec::codec_for;
use crate::config::{Algorithm, ArchiveConfig};
use crate::container::{read_frequencies, read_string, write_frequencies, write_string};
use crate::control::ControlToken;
use crate::error::{Error, Result};
use crate::freq::FrequencyTable;
use crate::password::{hash_password, PasswordPrompt};
use crate::CompressionResult;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compresses one file to `output`. Only the algorithm and password of
/// `config` apply here; the encode itself is single-threaded.
pub fn compress_file(
    input: &Path,
    output: &Path,
    config: &ArchiveConfig,
    ctrl: &ControlToken,
) -> Result<CompressionResult> {
    let started = Instant::now();
    log::info!(
        "compressing {} to {} using {}",
        input.display(),
        output.display(),
        config.algorithm
    );

    let data = fs::read(input)?;
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    let frequencies = FrequencyTable::from_bytes(&data);
    let codec = codec_for(config.algorithm);
    let payload = codec.encode(&data, &frequencies, ctrl)?;

    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    let password_hash = match &config.password {
        Some(password) if !password.trim().is_empty() => hash_password(password),
        _ => String::new(),
    };

    let mut writer = BufWriter::new(File::create(output)?);
    write_string(&mut writer, config.algorithm.as_str())?;
    write_string(&mut writer, &extension)?;
    write_string(&mut writer, &password_hash)?;
    write_frequencies(&mut writer, &frequencies)?;
    writer.write_all(&payload)?;
    let compressed_size = writer.stream_position()?;
    writer.flush()?;

    Ok(CompressionResult::new(
        data.len() as u64,
        compressed_size,
        started.elapsed(),
    ))
}

/// Decompresses a file produced by [`compress_file`], writing the restored
/// bytes next to the input as `stem_decompressed` plus the stored
/// extension, and returns that path.
pub fn decompress_file(
    input: &Path,
    prompt: &dyn PasswordPrompt,
    ctrl: &ControlToken,
) -> Result<PathBuf> {
    log::info!("decompressing {}", input.display());
    let mut reader = BufReader::new(File::open(input)?);
    let algorithm: Algorithm = read_string(&mut reader)?.parse()?;
    let extension = read_string(&mut reader)?;
    let password_hash = read_string(&mut reader)?;

    if !password_hash.is_empty() {
        let entered =
            prompt.request_password("This file is password protected. Enter the password:");
        if entered.trim().is_empty() {
            return Err(Error::Unauthorized(
                "a password is required to decompress this file",
            ));
        }
        if hash_password(&entered) != password_hash {
            return Err(Error::Unauthorized("incorrect password"));
        }
    }

    let frequencies = read_frequencies(&mut reader)?;
    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;

    let codec = codec_for(algorithm);
    let data = codec.decode(&payload, &frequencies, ctrl)?;

    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    let file_name = format!("{}_decompressed{}", stem, extension);
    let path = match input.parent() {
        Some(parent) => parent.join(&file_name),
        None => PathBuf::from(&file_name),
    };
    fs::write(&path, &data)?;
    log::info!("wrote {} ({} bytes)", path.display(), data.len());
    Ok(path)
}
