use crate::data_structures::{DayRecord, HistoryEnvelope, HistoryRecord, LatestPointer, MonthKey};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Month files live at `<root>/<YYYY>/<YYYY-MM>.json`, with a
/// `<root>/latest.json` pointer next to the year directories.
pub struct HistoryStore {
    root: PathBuf,
}

/// Days read from a month file, plus how many entries had to be dropped.
struct MonthRead {
    history: HistoryRecord,
    skipped: usize,
}

impl HistoryStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn month_path(&self, key: MonthKey) -> PathBuf {
        self.root
            .join(format!("{:04}", key.year()))
            .join(format!("{}.json", key))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.root.join("latest.json")
    }

    /// Where a month file is copied before a lossy load lets `save` replace it.
    pub fn backup_path(&self, key: MonthKey) -> PathBuf {
        self.month_path(key).with_extension("json.bak")
    }

    /// Loads a month. A missing or unreadable file yields an empty history,
    /// and day entries that do not parse are skipped one by one. Whenever
    /// anything is dropped the original file is first copied to
    /// [`backup_path`](Self::backup_path).
    pub fn load(&self, key: MonthKey) -> HistoryRecord {
        let path = self.month_path(key);
        if !path.exists() {
            return HistoryRecord::new();
        }

        match self.read_month(&path) {
            Ok(read) => {
                if read.skipped > 0 {
                    tracing::warn!(
                        "Skipped {} unreadable entries in {}",
                        read.skipped,
                        path.display()
                    );
                    self.back_up(key, &path);
                }
                read.history
            }
            Err(e) => {
                tracing::warn!("Treating {} as empty: {:#}", path.display(), e);
                self.back_up(key, &path);
                HistoryRecord::new()
            }
        }
    }

    fn back_up(&self, key: MonthKey, path: &Path) {
        let backup = self.backup_path(key);
        match fs::copy(path, &backup) {
            Ok(_) => tracing::info!("Copied {} to {}", path.display(), backup.display()),
            Err(e) => tracing::warn!("Failed to back up {}: {}", path.display(), e),
        }
    }

    fn read_month(&self, path: &Path) -> Result<MonthRead> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content).context("Failed to parse history")?;

        let Value::Object(mut root) = value else {
            bail!("History is not a JSON object");
        };
        // Enveloped files keep the days under `data`; older files are the bare map.
        let days = match root.remove("data") {
            Some(Value::Object(data)) => data,
            Some(other) => {
                root.insert("data".to_string(), other);
                root
            }
            None => root,
        };

        let mut read = MonthRead {
            history: HistoryRecord::new(),
            skipped: 0,
        };
        for (raw_date, raw_record) in days {
            let date = match raw_date.parse::<NaiveDate>() {
                Ok(date) => date,
                Err(e) => {
                    tracing::warn!("Skipping entry {:?} in {}: {}", raw_date, path.display(), e);
                    read.skipped += 1;
                    continue;
                }
            };
            match serde_json::from_value::<DayRecord>(raw_record) {
                Ok(record) => {
                    read.history.insert(date, record);
                }
                Err(e) => {
                    tracing::warn!("Skipping {} in {}: {}", date, path.display(), e);
                    read.skipped += 1;
                }
            }
        }

        Ok(read)
    }

    pub fn save(&self, key: MonthKey, history: &HistoryRecord, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.month_path(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let envelope = HistoryEnvelope::wrap(history.clone(), now);
        let content = serde_json::to_string_pretty(&envelope)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        tracing::info!("Data for {} updated in {}", key, path.display());
        Ok(path)
    }

    pub fn write_latest(&self, key: MonthKey) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory: {}", self.root.display()))?;

        let path = self.latest_path();
        let content = serde_json::to_string_pretty(&LatestPointer::for_month(key))?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        Ok(())
    }

    pub fn read_latest(&self) -> Option<MonthKey> {
        let content = fs::read_to_string(self.latest_path()).ok()?;
        let pointer: LatestPointer = serde_json::from_str(&content).ok()?;
        pointer.month_key().ok()
    }
}
