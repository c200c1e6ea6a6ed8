//! Output sinks for pulled values.

use std::io::{self, Write};

use serde::Deserialize;

use crate::trace::TraceEntry;

/// Receives each entry as soon as it is pulled.
pub trait Sink {
    fn emit(&mut self, entry: &TraceEntry) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, entry: &TraceEntry) -> io::Result<()> {
        (**self).emit(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `value`, or `value -> output` when a pipeline is attached.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Line-oriented sink over any writer.
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn emit(&mut self, entry: &TraceEntry) -> io::Result<()> {
        match (self.format, &entry.output) {
            (OutputFormat::Plain, None) => writeln!(self.writer, "{}", entry.value),
            (OutputFormat::Plain, Some(output)) => {
                writeln!(self.writer, "{} -> {}", entry.value, output)
            }
            (OutputFormat::Json, _) => writeln!(self.writer, "{}", entry.to_value()),
        }
    }
}

/// Collects entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Vec<TraceEntry>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, entry: &TraceEntry) -> io::Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::{BigInt, BigUint};

    use super::*;

    fn entry(index: u64, value: u32, output: Option<i64>) -> TraceEntry {
        TraceEntry {
            index,
            value: BigUint::from(value),
            output: output.map(BigInt::from),
        }
    }

    #[test]
    fn test_plain_lines() {
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Plain);
        sink.emit(&entry(4, 3, None)).unwrap();
        sink.emit(&entry(5, 5, Some(36))).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "3\n5 -> 36\n");
    }

    #[test]
    fn test_json_lines() {
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Json);
        sink.emit(&entry(1, 1, None)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "{\"index\":1,\"value\":\"1\",\"output\":null}\n");
    }

    fn feed<S: Sink>(mut sink: S) {
        sink.emit(&entry(0, 0, None)).unwrap();
    }

    #[test]
    fn test_memory_sink_through_reference() {
        let mut memory = MemorySink::new();
        feed(&mut memory);
        feed(&mut memory);
        assert_eq!(memory.entries().len(), 2);
        assert_eq!(memory.into_entries()[1], entry(0, 0, None));
    }
}
