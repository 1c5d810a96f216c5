//! Entry data copy with a reusable buffer.
//!
//! Read errors come from the archive decoder and are reported as
//! `InvalidArchive`; write errors come from the destination filesystem and
//! stay `Io`.

use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;

use crate::ExtractionError;
use crate::Result;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Heap buffer shared by every entry of one extraction.
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Allocates a 64 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE].into_boxed_slice(),
        }
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies all of `reader` into `writer`, returning the byte count.
///
/// # Errors
///
/// - `ExtractionError::InvalidArchive` if reading the entry fails
/// - `ExtractionError::Io` if writing fails
pub fn copy_entry_data(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let mut total: u64 = 0;

    loop {
        let n = match reader.read(&mut buffer.buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ExtractionError::invalid_archive("reading entry data", e)),
        };

        writer.write_all(&buffer.buf[..n])?;
        total += n as u64;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::UnexpectedEof, "truncated"))
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_copies_across_buffer_boundary() {
        let data = vec![7u8; COPY_BUFFER_SIZE * 2 + 3];
        let mut out = Vec::new();
        let mut buffer = CopyBuffer::new();

        let n = copy_entry_data(&mut data.as_slice(), &mut out, &mut buffer).unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn test_read_failure_is_invalid_archive() {
        let mut out = Vec::new();
        let result = copy_entry_data(&mut FailingReader, &mut out, &mut CopyBuffer::new());
        assert!(matches!(result, Err(ExtractionError::InvalidArchive(_))));
    }

    #[test]
    fn test_write_failure_is_io() {
        let result = copy_entry_data(
            &mut b"data".as_slice(),
            &mut FailingWriter,
            &mut CopyBuffer::new(),
        );
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }
}
