//! Archive construction behind the capability seam.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

use crate::utils::{CompressorError, CompressorResult};

/// One archive under construction: named byte entries, finalized to a
/// single downloadable buffer.
pub trait ArchiveBuilder: Send {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> CompressorResult<()>;
    fn finish(self: Box<Self>) -> CompressorResult<Vec<u8>>;
}

/// Factory for archive builders; what the capability loader yields.
pub trait ArchiveEngine: Send + Sync {
    fn new_archive(&self) -> Box<dyn ArchiveBuilder>;
}

/// Zip engine backed by the `zip` crate.
///
/// Entries are stored uncompressed: every payload is an already-compressed
/// JPEG, so deflating again buys nothing.
#[derive(Debug, Default)]
pub struct ZipArchiveEngine;

impl ArchiveEngine for ZipArchiveEngine {
    fn new_archive(&self) -> Box<dyn ArchiveBuilder> {
        Box::new(ZipBuilder {
            writer: zip::ZipWriter::new(Cursor::new(Vec::new())),
        })
    }
}

struct ZipBuilder {
    writer: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveBuilder for ZipBuilder {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> CompressorResult<()> {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        self.writer
            .start_file(name, options)
            .map_err(|e| CompressorError::archive(e.to_string()))?;
        self.writer
            .write_all(bytes)
            .map_err(|e| CompressorError::archive(e.to_string()))?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> CompressorResult<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| CompressorError::archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn entries_round_trip_through_the_archive() {
        let engine = ZipArchiveEngine;
        let mut builder = engine.new_archive();
        builder.add_entry("compressed_a.jpg", b"aaaa").unwrap();
        builder.add_entry("compressed_b.jpg", b"bbbbbb").unwrap();
        let bytes = builder.finish().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = Vec::new();
        archive
            .by_name("compressed_b.jpg")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"bbbbbb");
    }

    #[test]
    fn an_empty_archive_still_finalizes() {
        let engine = ZipArchiveEngine;
        let bytes = engine.new_archive().finish().unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
