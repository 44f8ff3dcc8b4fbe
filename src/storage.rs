use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Result, ScoutError};
use crate::models::{ListingRecord, Snapshot};
use crate::dedup::deduplicate;
use crate::report::ReportDocument;
use crate::scrapers::CrawlOutcome;

/// Timestamped JSON snapshots under a data directory.
///
/// Files are named `<prefix>_<ISO-8601 with ':' and '.' as '-'>.json`, so the
/// lexicographically greatest name is the newest snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn file_name(&self, captured_at: DateTime<Utc>) -> String {
        let stamp = captured_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        format!("{}_{}.json", self.prefix, stamp)
    }

    /// Persist a new snapshot. An existing file is never overwritten.
    pub async fn write(
        &self,
        records: &[ListingRecord],
        captured_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ScoutError::persistence(&self.dir, e))?;

        let path = self.dir.join(self.file_name(captured_at));
        let json = serde_json::to_string_pretty(records)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| ScoutError::persistence(&path, e))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| ScoutError::persistence(&path, e))?;
        file.flush()
            .await
            .map_err(|e| ScoutError::persistence(&path, e))?;

        info!(path = %path.display(), records = records.len(), "💾 Snapshot saved");
        Ok(path)
    }

    /// Deduplicate a crawl's records and persist them.
    ///
    /// A failed crawl with nothing collected is refused so it never shadows
    /// the last good snapshot. Partial results of a failed crawl are kept.
    pub async fn save_crawl(
        &self,
        outcome: CrawlOutcome,
        captured_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        if outcome.termination.is_failure() && outcome.records.is_empty() {
            tracing::warn!(
                reason = outcome.termination.reason_code(),
                "Crawl failed with no listings, keeping previous snapshot"
            );
            return Err(ScoutError::NothingCollected {
                reason: outcome.termination.reason_code().to_string(),
            });
        }

        let raw = outcome.records.len();
        let records = deduplicate(outcome.records);
        info!(
            raw,
            unique = records.len(),
            pages = outcome.pages_visited,
            waited_s = outcome.total_wait.as_secs_f64(),
            "✅ Extracted listings"
        );

        self.write(&records, captured_at).await
    }

    /// Path of the newest snapshot, if any
    pub async fn latest_path(&self) -> Result<Option<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ScoutError::persistence(&self.dir, e)),
        };

        let lead = format!("{}_", self.prefix);
        let mut newest: Option<String> = None;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScoutError::persistence(&self.dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&lead) || !name.ends_with(".json") {
                continue;
            }
            if newest.as_ref().map_or(true, |n| name > *n) {
                newest = Some(name);
            }
        }

        Ok(newest.map(|name| self.dir.join(name)))
    }

    pub async fn load(&self, path: &Path) -> Result<Snapshot> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScoutError::persistence(path, e))?;
        let records: Vec<ListingRecord> = serde_json::from_str(&raw)?;

        let captured_at = self.capture_time(path).unwrap_or_else(|| {
            tracing::warn!(path = %path.display(), "No timestamp in snapshot name, using now");
            Utc::now()
        });

        Ok(Snapshot {
            path: path.to_path_buf(),
            captured_at,
            records,
        })
    }

    pub async fn load_latest(&self) -> Result<Snapshot> {
        let path = self.latest_path().await?.ok_or_else(|| {
            ScoutError::persistence(
                &self.dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no snapshot files found"),
            )
        })?;

        info!(path = %path.display(), "📄 Using latest snapshot");
        self.load(&path).await
    }

    /// Second-precision capture time encoded in a snapshot file name
    pub fn capture_time(&self, path: &Path) -> Option<DateTime<Utc>> {
        let name = path.file_name()?.to_str()?;
        let stamp = name.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        let naive = NaiveDateTime::parse_from_str(stamp.get(..19)?, "%Y-%m-%dT%H-%M-%S").ok()?;
        Some(Utc.from_utc_datetime(&naive))
    }
}

/// Write rendered reports, replacing same-day reports of the same language
pub async fn write_reports(dir: &Path, documents: &[ReportDocument]) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ScoutError::persistence(dir, e))?;

    let mut paths = Vec::with_capacity(documents.len());
    for doc in documents {
        let path = dir.join(doc.file_name());
        tokio::fs::write(&path, &doc.body)
            .await
            .map_err(|e| ScoutError::persistence(&path, e))?;
        info!(path = %path.display(), language = %doc.language, "✅ Report saved");
        paths.push(path);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_round_trips_capture_time() {
        let store = SnapshotStore::new("data", "avito_cars");
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 8, 33, 5).unwrap();

        let name = store.file_name(at);
        assert_eq!(name, "avito_cars_2026-10-18T08-33-05-000Z.json");
        assert_eq!(store.capture_time(Path::new(&name)), Some(at));
    }

    #[test]
    fn capture_time_rejects_foreign_names() {
        let store = SnapshotStore::new("data", "avito_cars");
        assert_eq!(store.capture_time(Path::new("other_2026-10-18T08-33-05-000Z.json")), None);
        assert_eq!(store.capture_time(Path::new("avito_cars_latest.json")), None);
    }
}
