use crate::traits::CSVWrite;
use anyhow::Result;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes records without an implicit header row; callers write their own.
pub struct CSVWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CSVWriter<W> {
    pub fn new(sink: W) -> Self {
        CSVWriter {
            writer: WriterBuilder::new().has_headers(false).from_writer(sink),
        }
    }
}

impl CSVWriter<io::Stdout> {
    pub fn stdout() -> Self {
        CSVWriter::new(io::stdout())
    }
}

impl CSVWriter<File> {
    /// Creates `path` and starts it with a UTF-8 byte order mark so
    /// spreadsheet tools pick the right encoding.
    pub fn create_with_bom(path: &Path) -> Result<Self> {
        let mut file = File::create(path)?;
        file.write_all(UTF8_BOM)?;
        Ok(CSVWriter::new(file))
    }
}

impl<W: Write> CSVWrite for CSVWriter<W> {
    fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        Ok(self.writer.serialize(record)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}
