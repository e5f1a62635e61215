//! JSON Lines writer for the run summary
//!
//! One compact object per profiled statement, in statement order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pgprof_core::{PgprofError, Result};

use crate::artifacts::summary_file_name;
use crate::runner::QueryResult;

/// Line-oriented writer for a run summary
pub struct SummaryWriter<W: Write> {
    inner: W,
    lines: usize,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }

    /// Appends one result as a single JSON line
    pub fn write_result(&mut self, result: &QueryResult) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.inner, result)?;
        self.inner.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flushes and returns the underlying writer
    pub fn finish(mut self) -> std::io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Writes `<run_id>_summary.jsonl` into `dir` and returns its path
pub fn write_summary(dir: &Path, run_id: &str, results: &[QueryResult]) -> Result<PathBuf> {
    let path = dir.join(summary_file_name(run_id));
    let persist = |e: std::io::Error| PgprofError::persistence(&path, e);

    let file = File::create(&path).map_err(persist)?;
    let mut writer = SummaryWriter::new(BufWriter::new(file));
    for result in results {
        writer.write_result(result).map_err(persist)?;
    }
    let lines = writer.lines();
    writer.finish().map_err(persist)?;

    tracing::info!(path = %path.display(), lines, "summary written");
    Ok(path)
}
