//! Archive container: many compressed files in one seekable archive.
//!
//! Layout, all integers little-endian, strings as u32 byte length + UTF-8:
//!
//! ```text
//! [0..8)    u64 footer offset (written as 0, patched once the footer lands)
//! [8..F)    entry payloads, back to back, in input order
//! [F..end)  footer: algorithm tag, password hash, creation time, entry
//!           count, then per entry: file name, relative path, original
//!           size, compressed size, data offset, payload length, and the
//!           (symbol, count) frequency pairs
//! ```
//!
//! Entry payloads are codec output, packed bits plus the trailing bit
//! count. Listing follows the pointer and parses the footer without ever
//! touching payload bytes.

use crate::codec::{codec_for, Codec};
use crate::config::{Algorithm, ArchiveConfig};
use crate::control::ControlToken;
use crate::error::{Error, Result};
use crate::freq::FrequencyTable;
use crate::password::{hash_password, PasswordPrompt};
use crate::CompressionResult;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Conventional file extension for archives.
pub const ARCHIVE_EXTENSION: &str = "eca";

/// One compressed file inside an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub relative_path: String,
    pub original_size: u64,
    pub compressed_size: u64,
    /// Absolute offset of this entry's payload in the archive file.
    pub data_offset: u64,
    pub compressed_data_length: u64,
    pub frequencies: FrequencyTable,
}

impl ArchiveEntry {
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, &self.file_name)?;
        write_string(writer, &self.relative_path)?;
        writer.write_u64::<LittleEndian>(self.original_size)?;
        writer.write_u64::<LittleEndian>(self.compressed_size)?;
        writer.write_u64::<LittleEndian>(self.data_offset)?;
        writer.write_u64::<LittleEndian>(self.compressed_data_length)?;
        write_frequencies(writer, &self.frequencies)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let file_name = read_string(reader)?;
        let relative_path = read_string(reader)?;
        let original_size = reader.read_u64::<LittleEndian>()?;
        let compressed_size = reader.read_u64::<LittleEndian>()?;
        let data_offset = reader.read_u64::<LittleEndian>()?;
        let compressed_data_length = reader.read_u64::<LittleEndian>()?;
        let frequencies = read_frequencies(reader)?;
        Ok(Self {
            file_name,
            relative_path,
            original_size,
            compressed_size,
            data_offset,
            compressed_data_length,
            frequencies,
        })
    }
}

/// Footer metadata describing a whole archive.
#[derive(Debug, Clone)]
pub struct ArchiveMetadata {
    pub algorithm: Algorithm,
    /// Lowercase hex SHA-256 of the archive password, empty when the
    /// archive is unprotected.
    pub password_hash: String,
    pub created_unix: u64,
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveMetadata {
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, self.algorithm.as_str())?;
        write_string(writer, &self.password_hash)?;
        writer.write_u64::<LittleEndian>(self.created_unix)?;
        writer.write_u32::<LittleEndian>(self.entries.len() as u32)?;
        for entry in &self.entries {
            entry.write(writer)?;
        }
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let algorithm: Algorithm = read_string(reader)?.parse()?;
        let password_hash = read_string(reader)?;
        let created_unix = reader.read_u64::<LittleEndian>()?;
        let entry_count = reader.read_u32::<LittleEndian>()?;
        let mut entries = Vec::new();
        for _ in 0..entry_count {
            entries.push(ArchiveEntry::read(reader)?);
        }
        Ok(Self { algorithm, password_hash, created_unix, entries })
    }
}

pub(crate) fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    writer.write_u32::<LittleEndian>(value.len() as u32)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

pub(crate) fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u32::<LittleEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| Error::InvalidFormat(format!("invalid UTF-8 in string field: {}", e)))
}

pub(crate) fn write_frequencies<W: Write>(
    writer: &mut W,
    frequencies: &FrequencyTable,
) -> Result<()> {
    writer.write_u32::<LittleEndian>(frequencies.distinct_symbols() as u32)?;
    for (symbol, count) in frequencies.iter() {
        writer.write_u8(symbol)?;
        writer.write_u32::<LittleEndian>(count)?;
    }
    Ok(())
}

pub(crate) fn read_frequencies<R: Read>(reader: &mut R) -> Result<FrequencyTable> {
    let pair_count = reader.read_u32::<LittleEndian>()?;
    if pair_count > 256 {
        return Err(Error::InvalidFormat(format!(
            "{} frequency pairs exceed the byte alphabet",
            pair_count
        )));
    }
    let mut pairs = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let symbol = reader.read_u8()?;
        let count = reader.read_u32::<LittleEndian>()?;
        pairs.push((symbol, count));
    }
    FrequencyTable::from_pairs(pairs)
}

struct EncodedInput {
    index: usize,
    file_name: String,
    relative_path: String,
    original_size: u64,
    frequencies: FrequencyTable,
    payload: Vec<u8>,
}

fn encode_input(
    index: usize,
    path: &Path,
    file_count: usize,
    algorithm: Algorithm,
    ctrl: &ControlToken,
) -> Result<EncodedInput> {
    log::debug!("encoding {} ({}/{})", path.display(), index + 1, file_count);
    let data = fs::read(path)?;
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    let frequencies = FrequencyTable::from_bytes(&data);
    let codec = codec_for(algorithm);
    let payload = codec.encode(&data, &frequencies, &ctrl.slice(index, file_count))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(EncodedInput {
        index,
        file_name,
        relative_path: path.display().to_string(),
        original_size: data.len() as u64,
        frequencies,
        payload,
    })
}

/// Compresses `inputs` into a single archive at `output`.
///
/// Files are encoded in parallel on a local thread pool and written back in
/// input order. The footer offset at byte 0 is patched last, so a cancelled
/// or failed run leaves an archive without a valid footer rather than a
/// misleading one.
pub fn compress_files<P: AsRef<Path> + Sync>(
    inputs: &[P],
    output: &Path,
    config: &ArchiveConfig,
    ctrl: &ControlToken,
) -> Result<CompressionResult> {
    let started = Instant::now();
    let file_count = inputs.len();
    log::info!(
        "compressing {} files into {} using {}",
        file_count,
        output.display(),
        config.algorithm
    );

    let password_hash = match &config.password {
        Some(password) if !password.trim().is_empty() => hash_password(password),
        _ => String::new(),
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.max(1))
        .build()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let mut encoded: Vec<EncodedInput> = pool.install(|| {
        inputs
            .par_iter()
            .enumerate()
            .map(|(index, input)| {
                encode_input(index, input.as_ref(), file_count, config.algorithm, ctrl)
            })
            .collect::<Result<Vec<_>>>()
    })?;
    encoded.sort_by_key(|input| input.index);

    let mut writer = BufWriter::new(File::create(output)?);
    writer.write_u64::<LittleEndian>(0)?;

    let mut metadata = ArchiveMetadata {
        algorithm: config.algorithm,
        password_hash,
        created_unix: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        entries: Vec::with_capacity(encoded.len()),
    };

    let mut original_size = 0u64;
    let mut cursor = 8u64;
    for input in encoded {
        ctrl.check_cancelled()?;
        let payload_length = input.payload.len() as u64;
        writer.write_all(&input.payload)?;
        metadata.entries.push(ArchiveEntry {
            file_name: input.file_name,
            relative_path: input.relative_path,
            original_size: input.original_size,
            compressed_size: payload_length,
            data_offset: cursor,
            compressed_data_length: payload_length,
            frequencies: input.frequencies,
        });
        cursor += payload_length;
        original_size += input.original_size;
    }

    let footer_offset = cursor;
    metadata.write(&mut writer)?;
    let compressed_size = writer.stream_position()?;
    writer.seek(SeekFrom::Start(0))?;
    writer.write_u64::<LittleEndian>(footer_offset)?;
    writer.flush()?;
    ctrl.report_progress(100);

    let result = CompressionResult::new(original_size, compressed_size, started.elapsed());
    log::info!(
        "archive complete: {} -> {} bytes (ratio {:.3}) in {:.2?}",
        result.original_size,
        result.compressed_size,
        result.ratio,
        result.duration
    );
    Ok(result)
}

fn read_metadata<R: Read + Seek>(reader: &mut R) -> Result<ArchiveMetadata> {
    let footer_offset = reader.read_u64::<LittleEndian>()?;
    if footer_offset < 8 {
        return Err(Error::InvalidFormat(format!(
            "footer offset {} points inside the header",
            footer_offset
        )));
    }
    reader.seek(SeekFrom::Start(footer_offset))?;
    ArchiveMetadata::read(reader)
}

/// Reads the entry listing from an archive's footer. Requires no password
/// and leaves the archive untouched.
pub fn list_files(archive: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut reader = BufReader::new(File::open(archive)?);
    let metadata = read_metadata(&mut reader)?;
    log::debug!(
        "listed {} entries from {}",
        metadata.entries.len(),
        archive.display()
    );
    Ok(metadata.entries)
}

fn authorize(metadata: &ArchiveMetadata, prompt: &dyn PasswordPrompt) -> Result<()> {
    if metadata.password_hash.is_empty() {
        return Ok(());
    }
    let entered =
        prompt.request_password("This archive is password protected. Enter the password:");
    if entered.trim().is_empty() {
        return Err(Error::Unauthorized("a password is required to extract files"));
    }
    if hash_password(&entered) != metadata.password_hash {
        return Err(Error::Unauthorized("incorrect password"));
    }
    Ok(())
}

fn resolve_output_dir(archive: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => archive
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn read_and_decode<R: Read + Seek>(
    reader: &mut R,
    entry: &ArchiveEntry,
    codec: &dyn Codec,
    ctrl: &ControlToken,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(entry.data_offset))?;
    let mut payload = vec![0u8; entry.compressed_data_length as usize];
    reader.read_exact(&mut payload)?;
    codec.decode(&payload, &entry.frequencies, ctrl)
}

/// Output name for an extracted entry: `report.txt` becomes
/// `report_decompressed.txt`.
pub(crate) fn decompressed_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}_decompressed.{}", stem, ext),
        None => format!("{}_decompressed", stem),
    }
}

/// Extracts every entry into `output_dir` (the archive's own directory when
/// `None`), returning the written paths in entry order.
pub fn extract_all(
    archive: &Path,
    output_dir: Option<&Path>,
    prompt: &dyn PasswordPrompt,
    ctrl: &ControlToken,
) -> Result<Vec<PathBuf>> {
    let mut reader = BufReader::new(File::open(archive)?);
    let metadata = read_metadata(&mut reader)?;
    authorize(&metadata, prompt)?;

    let target_dir = resolve_output_dir(archive, output_dir);
    fs::create_dir_all(&target_dir)?;
    let codec = codec_for(metadata.algorithm);
    let entry_count = metadata.entries.len();
    log::info!("extracting {} entries from {}", entry_count, archive.display());

    let mut extracted = Vec::with_capacity(entry_count);
    for (index, entry) in metadata.entries.iter().enumerate() {
        ctrl.checkpoint()?;
        let data = read_and_decode(
            &mut reader,
            entry,
            codec.as_ref(),
            &ctrl.slice(index, entry_count),
        )?;
        let path = target_dir.join(decompressed_name(&entry.file_name));
        fs::write(&path, &data)?;
        log::debug!("extracted {} ({} bytes)", path.display(), data.len());
        extracted.push(path);
    }
    ctrl.report_progress(100);
    Ok(extracted)
}

/// Extracts the single entry whose file name matches `file_name`, ASCII
/// case-insensitively.
pub fn extract_file(
    archive: &Path,
    file_name: &str,
    output_dir: Option<&Path>,
    prompt: &dyn PasswordPrompt,
    ctrl: &ControlToken,
) -> Result<PathBuf> {
    let mut reader = BufReader::new(File::open(archive)?);
    let metadata = read_metadata(&mut reader)?;
    authorize(&metadata, prompt)?;

    let entry = metadata
        .entries
        .iter()
        .find(|entry| entry.file_name.eq_ignore_ascii_case(file_name))
        .ok_or_else(|| Error::NotFound(file_name.to_string()))?;

    let target_dir = resolve_output_dir(archive, output_dir);
    fs::create_dir_all(&target_dir)?;
    let codec = codec_for(metadata.algorithm);
    let data = read_and_decode(&mut reader, entry, codec.as_ref(), ctrl)?;
    let path = target_dir.join(decompressed_name(&entry.file_name));
    fs::write(&path, &data)?;
    log::info!("extracted {} from {}", path.display(), archive.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_metadata() -> ArchiveMetadata {
        ArchiveMetadata {
            algorithm: Algorithm::ShannonFano,
            password_hash: hash_password("open sesame"),
            created_unix: 1_700_000_000,
            entries: vec![
                ArchiveEntry {
                    file_name: "notes.txt".to_string(),
                    relative_path: "docs/notes.txt".to_string(),
                    original_size: 1234,
                    compressed_size: 700,
                    data_offset: 8,
                    compressed_data_length: 700,
                    frequencies: FrequencyTable::from_bytes(b"some notes"),
                },
                ArchiveEntry {
                    file_name: "image".to_string(),
                    relative_path: "image".to_string(),
                    original_size: 99,
                    compressed_size: 80,
                    data_offset: 708,
                    compressed_data_length: 80,
                    frequencies: FrequencyTable::from_bytes(&[0, 0, 1, 2, 3]),
                },
            ],
        }
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = sample_metadata();
        let mut buffer = Vec::new();
        metadata.write(&mut buffer).unwrap();

        let restored = ArchiveMetadata::read(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(restored.algorithm, metadata.algorithm);
        assert_eq!(restored.password_hash, metadata.password_hash);
        assert_eq!(restored.created_unix, metadata.created_unix);
        assert_eq!(restored.entries.len(), 2);
        assert_eq!(restored.entries[0].file_name, "notes.txt");
        assert_eq!(restored.entries[0].frequencies, metadata.entries[0].frequencies);
        assert_eq!(restored.entries[1].data_offset, 708);
    }

    #[test]
    fn test_unknown_algorithm_tag_fails_metadata_read() {
        let mut buffer = Vec::new();
        write_string(&mut buffer, "Arithmetic").unwrap();
        write_string(&mut buffer, "").unwrap();
        let err = ArchiveMetadata::read(&mut Cursor::new(&buffer)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(tag) if tag == "Arithmetic"));
    }

    #[test]
    fn test_string_round_trip() {
        let mut buffer = Vec::new();
        write_string(&mut buffer, "héllo wörld").unwrap();
        let restored = read_string(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(restored, "héllo wörld");
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        let buffer = vec![2, 0, 0, 0, 0xFF, 0xFE];
        let err = read_string(&mut Cursor::new(&buffer)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_frequencies_round_trip() {
        let frequencies = FrequencyTable::from_bytes(b"frequency serialization");
        let mut buffer = Vec::new();
        write_frequencies(&mut buffer, &frequencies).unwrap();
        let restored = read_frequencies(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(restored, frequencies);
    }

    #[test]
    fn test_frequencies_reject_oversized_pair_count() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&300u32.to_le_bytes());
        let err = read_frequencies(&mut Cursor::new(&buffer)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_footer_offset_inside_header_is_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&3u64.to_le_bytes());
        let err = read_metadata(&mut Cursor::new(&buffer)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_decompressed_name() {
        assert_eq!(decompressed_name("report.txt"), "report_decompressed.txt");
        assert_eq!(decompressed_name("archive.tar.gz"), "archive.tar_decompressed.gz");
        assert_eq!(decompressed_name("README"), "README_decompressed");
    }
}
