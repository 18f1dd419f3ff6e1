use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Entropy coding algorithm. The variant name doubles as the tag stored in
/// archive headers, so parsing is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Huffman,
    ShannonFano,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Huffman => "Huffman",
            Algorithm::ShannonFano => "ShannonFano",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Huffman" => Ok(Algorithm::Huffman),
            "ShannonFano" => Ok(Algorithm::ShannonFano),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Settings for building an archive.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub algorithm: Algorithm,
    /// Optional archive password. Blank or whitespace-only values are
    /// treated as no password at all.
    pub password: Option<String>,
    pub threads: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Huffman,
            password: None,
            threads: num_cpus::get(),
        }
    }
}

impl ArchiveConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}
