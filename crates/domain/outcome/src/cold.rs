//! Cold log: append-only JSONL partitioned by date and tenant, one line per
//! finished session.

use std::path::PathBuf;

use pulseiq_models::SessionOutcome;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ColdLogWriter {
    dir: PathBuf,
}

impl ColdLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{dir}/{YYYY-MM-DD}/{tenant}.jsonl`
    fn partition_path(&self, outcome: &SessionOutcome) -> PathBuf {
        self.dir
            .join(outcome.ended_at.format("%Y-%m-%d").to_string())
            .join(format!("{}.jsonl", outcome.tenant_id))
    }

    pub async fn append(&self, outcome: &SessionOutcome) -> Result<()> {
        let path = self.partition_path(outcome);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_vec(outcome)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
