//! Where archive bytes come from.

use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::formats::ArchiveFormat;
use crate::formats::detect_format;
use crate::formats::open_format;

const SNIFF_LEN: usize = 512;

/// A seekable byte stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// An archive on disk or in memory.
///
/// Extraction reads the source twice, once to validate every entry and once
/// to write, so the source has to be re-openable.
///
/// # Examples
///
/// ```
/// use buildprobe_core::ArchiveSource;
///
/// let source = ArchiveSource::from_path("downloads/pip-20.2.1.tar.gz");
/// assert_eq!(source.describe(), "downloads/pip-20.2.1.tar.gz");
///
/// let source = ArchiveSource::from_bytes(vec![0; 1024]);
/// assert_eq!(source.describe(), "<memory: 1024 bytes>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// Archive file on disk.
    File(PathBuf),
    /// Archive held in memory.
    Memory(Vec<u8>),
}

impl ArchiveSource {
    /// Creates a source backed by a file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Creates a source backed by a byte buffer.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Memory(bytes)
    }

    /// Returns the file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory(_) => None,
        }
    }

    /// Human-readable name used in logs and errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Memory(bytes) => format!("<memory: {} bytes>", bytes.len()),
        }
    }

    /// Opens the source and detects its format.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::Io` if the file cannot be opened or read
    /// - `ExtractionError::UnsupportedFormat` if the format is not recognized
    /// - `ExtractionError::InvalidArchive` if a ZIP directory is corrupt
    pub fn open(&self) -> Result<Box<dyn ArchiveFormat + '_>> {
        let mut reader: Box<dyn ReadSeek + '_> = match self {
            Self::File(path) => Box::new(BufReader::new(File::open(path)?)),
            Self::Memory(bytes) => Box::new(Cursor::new(bytes.as_slice())),
        };

        let mut header = [0u8; SNIFF_LEN];
        let len = read_up_to(&mut reader, &mut header)?;
        reader.seek(SeekFrom::Start(0))?;

        let kind = detect_format(&header[..len], self.path())?;
        tracing::debug!(source = %self.describe(), format = kind.name(), "detected archive format");
        open_format(kind, reader)
    }
}

impl From<PathBuf> for ArchiveSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for ArchiveSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ArchiveSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Memory(bytes)
    }
}

fn read_up_to(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
