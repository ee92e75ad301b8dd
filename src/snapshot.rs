use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::world::{FrameSnapshot, World};

/// Write-only frame dumps for offline inspection. Nothing reads them back.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_frames: u64,
}

#[derive(Serialize)]
struct FrameDump<'a> {
    captured_at: DateTime<Utc>,
    #[serde(flatten)]
    frame: &'a FrameSnapshot,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval_frames: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_frames,
        }
    }

    pub fn should_write(&self, frame: u64) -> bool {
        self.interval_frames > 0 && frame > 0 && frame % self.interval_frames == 0
    }

    pub fn maybe_write(&self, world: &World, scenario: &str) -> Result<Option<PathBuf>> {
        if !self.should_write(world.frame()) {
            return Ok(None);
        }
        let dir = self.output_dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("frame_{:06}.json", world.frame()));
        let snapshot = world.snapshot(scenario, true);
        let dump = FrameDump {
            captured_at: Utc::now(),
            frame: &snapshot,
        };
        let json = serde_json::to_string_pretty(&dump)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        log::debug!("wrote frame snapshot {}", path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_gates_writes() {
        let writer = SnapshotWriter::new("unused", 30);
        assert!(!writer.should_write(0));
        assert!(!writer.should_write(29));
        assert!(writer.should_write(30));
        assert!(!writer.should_write(31));
        assert!(writer.should_write(60));
        assert!(!SnapshotWriter::new("unused", 0).should_write(30));
    }
}
