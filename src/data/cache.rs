use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::load_file;
use super::model::{AccidentTable, RawTable};
use super::pipeline::derive;
use crate::config::PipelineConfig;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Fingerprint – identity of a snapshot on disk
// ---------------------------------------------------------------------------

/// What we compare to decide whether a snapshot changed since it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DashboardError::MissingArtifact {
                    path: path.to_path_buf(),
                }
            } else {
                DashboardError::Unreadable {
                    path: path.to_path_buf(),
                    source: e.into(),
                }
            }
        })?;
        Ok(Fingerprint {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// SnapshotCache – memoized loader + pipeline output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    pipeline: PipelineConfig,
    raw: Arc<RawTable>,
    accidents: Arc<AccidentTable>,
}

/// Memo map `path → (fingerprint, raw table, cleaned table)`.
///
/// A lookup re-reads only file metadata; the file itself is loaded and
/// derived again only when its fingerprint changed. The cleaned table is
/// additionally keyed by the pipeline settings it was derived with.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleaned table for `path`, loading and deriving only on a miss.
    pub fn get_or_load(&mut self, path: &Path, pipeline: &PipelineConfig) -> Result<Arc<AccidentTable>> {
        let fingerprint = match Fingerprint::of(path) {
            Ok(fp) => fp,
            Err(e) => {
                self.invalidate(path);
                return Err(e);
            }
        };

        if let Some(entry) = self.entries.get_mut(path) {
            if entry.fingerprint == fingerprint {
                if entry.pipeline == *pipeline {
                    log::debug!("Snapshot cache hit for {}", path.display());
                } else {
                    log::info!("Pipeline settings changed, re-deriving {}", path.display());
                    entry.accidents = Arc::new(derive(&entry.raw, pipeline));
                    entry.pipeline = pipeline.clone();
                }
                return Ok(entry.accidents.clone());
            }
            log::info!("Snapshot {} changed on disk, invalidating", path.display());
        }

        let raw = match load_file(path) {
            Ok(raw) => Arc::new(raw),
            Err(e) => {
                self.invalidate(path);
                return Err(e);
            }
        };
        log::info!("Loaded {} raw rows from {}", raw.len(), path.display());
        let accidents = Arc::new(derive(&raw, pipeline));

        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                fingerprint,
                pipeline: pipeline.clone(),
                raw,
                accidents: accidents.clone(),
            },
        );
        Ok(accidents)
    }

    /// Raw table currently cached for `path`, if any.
    #[cfg(test)]
    pub fn raw(&self, path: &Path) -> Option<Arc<RawTable>> {
        self.entries.get(path).map(|e| e.raw.clone())
    }

    /// Forget `path`; the next lookup reloads it.
    pub fn invalidate(&mut self, path: &Path) {
        if self.entries.remove(path).is_some() {
            log::debug!("Dropped cached snapshot {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawColumn;


    const ROW: &str = "機車,2024-03-15,1430,30,,晴,單路部分,男,臺北市政府警察局,中山路,無號誌,戴安全帽,側撞,車與車,25.03,121.54";

    fn write_snapshot(path: &Path, rows: usize) {
        let mut lines = vec![RawColumn::csv_header()];
        lines.extend(std::iter::repeat(ROW.to_string()).take(rows));
        std::fs::write(path, lines.join("\n")).unwrap();
    }

    #[test]
    fn unchanged_snapshot_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path, 3);

        let mut cache = SnapshotCache::new();
        let config = PipelineConfig::default();
        let first = cache.get_or_load(&path, &config).unwrap();
        let second = cache.get_or_load(&path, &config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 3);
        assert_eq!(cache.raw(&path).unwrap().len(), 3);
    }

    #[test]
    fn changed_snapshot_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path, 3);

        let mut cache = SnapshotCache::new();
        let config = PipelineConfig::default();
        let first = cache.get_or_load(&path, &config).unwrap();

        write_snapshot(&path, 5);
        let second = cache.get_or_load(&path, &config).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 5);
    }

    #[test]
    fn new_pipeline_settings_rederive_without_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path, 2);

        let mut cache = SnapshotCache::new();
        let raw_before = {
            cache.get_or_load(&path, &PipelineConfig::default()).unwrap();
            cache.raw(&path).unwrap()
        };
        let cars_only = PipelineConfig {
            vehicle_keyword: "小客車".into(),
            ..PipelineConfig::default()
        };
        let cleaned = cache.get_or_load(&path, &cars_only).unwrap();
        assert!(cleaned.is_empty());
        assert!(Arc::ptr_eq(&raw_before, &cache.raw(&path).unwrap()));
    }

    #[test]
    fn deleted_snapshot_is_missing_and_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path, 1);

        let mut cache = SnapshotCache::new();
        cache.get_or_load(&path, &PipelineConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = cache.get_or_load(&path, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingArtifact { .. }));
        assert!(cache.raw(&path).is_none());
    }

    #[test]
    fn unreadable_rewrite_evicts_stale_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path, 2);

        let mut cache = SnapshotCache::new();
        cache.get_or_load(&path, &PipelineConfig::default()).unwrap();
        assert!(cache.raw(&path).is_some());

        std::fs::write(&path, "發生日期,發生時間\n2024-03-15,1430\n").unwrap();
        let err = cache.get_or_load(&path, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, DashboardError::Unreadable { .. }));
        assert!(cache.raw(&path).is_none());
    }
}
