//! Append-only report file for the scheduled run.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Writes one titled, timestamped block per run. The file is created if
/// absent and appended otherwise, never truncated.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block: title + local timestamp, separator, body.
    pub async fn append(&self, title: &str, body: &str) -> std::io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M");
        let block = format!("\n{} - {}\n{}\n{}\n", title, timestamp, "=".repeat(50), body);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_creates_then_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_summary.txt");
        let writer = ReportWriter::new(&path);

        writer.append("Weather Report", "first run").await.unwrap();
        writer.append("Weather Report", "second run").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.matches("Weather Report - ").count(), 2);
        // First block survives the second append.
        assert!(contents.contains("first run"));
        assert!(contents.contains("second run"));
        let first = contents.find("first run").unwrap();
        let second = contents.find("second run").unwrap();
        assert!(first < second);
    }
}
