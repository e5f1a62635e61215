//! Run directory layout
//!
//! A run writes `query_<NNN>_plan.json` per statement and a single
//! `<run_id>_summary.jsonl` into one directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pgprof_analyzer::DistilledPlan;
use pgprof_core::{PgprofError, Result};

/// File name of the plan artifact for a 1-based statement index
pub fn plan_file_name(index: usize) -> String {
    format!("query_{:03}_plan.json", index)
}

/// File name of the run summary
pub fn summary_file_name(run_id: &str) -> String {
    format!("{}_summary.jsonl", run_id)
}

/// The directory that receives a run's artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the directory, creating it (and parents) if needed
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PgprofError::persistence(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "artifact directory ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plan_path(&self, index: usize) -> PathBuf {
        self.dir.join(plan_file_name(index))
    }

    /// Writes a distilled plan as pretty-printed JSON and returns its file name
    pub fn write_plan(&self, index: usize, plan: &DistilledPlan) -> Result<String> {
        let path = self.plan_path(index);

        let file = File::create(&path).map_err(|e| PgprofError::persistence(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, plan)
            .map_err(|e| PgprofError::persistence(&path, e.into()))?;
        writer
            .flush()
            .map_err(|e| PgprofError::persistence(&path, e))?;

        Ok(plan_file_name(index))
    }
}
