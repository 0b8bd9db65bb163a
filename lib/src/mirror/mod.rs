// lib/src/mirror/mod.rs
// Keeps the flat-file mirrors of the claim list and claim details in step
// with the record store. Each entity has a JSON-lines file and a delimited
// tabular file; both are keyed by the claim's business identifier.

pub mod jsonl;
pub mod locks;
pub mod reporter;
pub mod tabular;

pub use reporter::{LogSyncReporter, SyncReporter};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use models::{Claim, ClaimDetail, DetailRow, MirrorRow, ToMirrorRow};

use crate::config::MirrorConfig;
use crate::errors::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorEntity {
    ClaimList,
    ClaimDetail,
}

impl fmt::Display for MirrorEntity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MirrorEntity::ClaimList => write!(f, "claim list"),
            MirrorEntity::ClaimDetail => write!(f, "claim detail"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorFormat {
    JsonLines,
    Tabular,
}

impl fmt::Display for MirrorFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MirrorFormat::JsonLines => write!(f, "jsonl"),
            MirrorFormat::Tabular => write!(f, "tabular"),
        }
    }
}

/// What happened to one mirror file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The matching row was rewritten.
    Synced,
    /// No file at the configured path; that format is treated as disabled.
    FileAbsent,
    /// The file has no row for this key and was left untouched.
    RowNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSync {
    pub format: MirrorFormat,
    pub path: PathBuf,
    pub outcome: SyncOutcome,
}

/// Per-format outcomes of syncing one entity. Formats without a configured
/// path do not appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub entity: MirrorEntity,
    pub key: String,
    pub files: Vec<FormatSync>,
}

impl SyncReport {
    fn new(entity: MirrorEntity, key: &str) -> Self {
        SyncReport { entity, key: key.to_string(), files: Vec::new() }
    }

    pub fn outcome(&self, format: MirrorFormat) -> Option<SyncOutcome> {
        self.files.iter().find(|f| f.format == format).map(|f| f.outcome)
    }
}

#[derive(Clone)]
pub struct MirrorFileAdapter {
    config: MirrorConfig,
    reporter: Arc<dyn SyncReporter>,
}

impl fmt::Debug for MirrorFileAdapter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MirrorFileAdapter").field("config", &self.config).finish_non_exhaustive()
    }
}

impl MirrorFileAdapter {
    pub fn new(config: MirrorConfig, reporter: Arc<dyn SyncReporter>) -> Self {
        MirrorFileAdapter { config, reporter }
    }

    /// Adapter reporting through the `log` facade.
    pub fn with_logging(config: MirrorConfig) -> Self {
        Self::new(config, Arc::new(LogSyncReporter))
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Brings the claim's row in both claim list mirrors up to date.
    pub async fn sync_claim_list(&self, claim: &Claim) -> Result<SyncReport, SyncError> {
        let targets = [
            (MirrorFormat::JsonLines, self.config.claim_list_jsonl.as_deref()),
            (MirrorFormat::Tabular, self.config.claim_list_tabular.as_deref()),
        ];
        self.sync_entity(MirrorEntity::ClaimList, &claim.to_mirror_row(), &targets).await
    }

    /// Brings the detail's row in both claim detail mirrors up to date.
    /// Detail rows are keyed by the owning claim's business identifier.
    pub async fn sync_claim_detail(&self, detail: &ClaimDetail, business_id: i64) -> Result<SyncReport, SyncError> {
        let row = DetailRow { detail, claim_id: business_id }.to_mirror_row();
        let targets = [
            (MirrorFormat::JsonLines, self.config.claim_detail_jsonl.as_deref()),
            (MirrorFormat::Tabular, self.config.claim_detail_tabular.as_deref()),
        ];
        self.sync_entity(MirrorEntity::ClaimDetail, &row, &targets).await
    }

    /// Every configured format is attempted even if an earlier one fails; the
    /// first failure is returned.
    async fn sync_entity(
        &self,
        entity: MirrorEntity,
        row: &MirrorRow,
        targets: &[(MirrorFormat, Option<&Path>)],
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(entity, row.key());
        let mut first_error = None;
        for (format, path) in targets {
            let Some(path) = path else { continue };
            match self.sync_file(entity, *format, path, row).await {
                Ok(outcome) => report.files.push(FormatSync { format: *format, path: path.to_path_buf(), outcome }),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    async fn sync_file(
        &self,
        entity: MirrorEntity,
        format: MirrorFormat,
        path: &Path,
        row: &MirrorRow,
    ) -> Result<SyncOutcome, SyncError> {
        let lock = locks::lock_for(path);
        let _guard = lock.lock().await;

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.reporter.file_absent(entity, format, path);
                return Ok(SyncOutcome::FileAbsent);
            }
            Err(e) => return Err(io_error(path, e)),
        };

        let shown = path.display().to_string();
        let updated = match format {
            MirrorFormat::JsonLines => jsonl::apply_row(&content, row, &shown)?,
            MirrorFormat::Tabular => tabular::apply_row(&content, row, self.config.delimiter, &shown)?,
        };
        match updated {
            None => {
                self.reporter.row_not_found(entity, format, path, row.key());
                Ok(SyncOutcome::RowNotFound)
            }
            Some(updated) => {
                write_atomically(path, &updated).await?;
                self.reporter.synced(entity, format, path, row.key());
                Ok(SyncOutcome::Synced)
            }
        }
    }
}

/// Writes `content` to a sibling temp file, then renames it over `path`.
async fn write_atomically(path: &Path, content: &str) -> Result<(), SyncError> {
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));
    if let Err(e) = fs::write(&temp, content).await {
        let _ = fs::remove_file(&temp).await;
        return Err(io_error(&temp, e));
    }
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(io_error(path, e));
    }
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> SyncError {
    SyncError::Io { path: path.display().to_string(), source }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Collects reporter calls as `"<outcome> <entity>/<format> <key>"`.
    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl SyncReporter for RecordingReporter {
        fn synced(&self, entity: MirrorEntity, format: MirrorFormat, _path: &Path, key: &str) {
            self.record(format!("synced {}/{} {}", entity, format, key));
        }

        fn file_absent(&self, entity: MirrorEntity, format: MirrorFormat, _path: &Path) {
            self.record(format!("absent {}/{}", entity, format));
        }

        fn row_not_found(&self, entity: MirrorEntity, format: MirrorFormat, _path: &Path, key: &str) {
            self.record(format!("not_found {}/{} {}", entity, format, key));
        }
    }

    fn claim() -> Claim {
        Claim {
            id: 7,
            claim_id: 42,
            patient_name: "Jane Doe".to_string(),
            billed_amount: Decimal::new(120050, 2),
            paid_amount: Decimal::new(10000, 2),
            status: "Paid".to_string(),
            insurer_name: "Acme Health".to_string(),
            discharge_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        }
    }

    fn adapter(dir: &TempDir) -> (MirrorFileAdapter, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        let adapter = MirrorFileAdapter::new(MirrorConfig::in_directory(dir.path()), reporter.clone());
        (adapter, reporter)
    }

    #[tokio::test]
    async fn should_sync_claim_row_in_both_formats() {
        let dir = TempDir::new().unwrap();
        let (adapter, reporter) = adapter(&dir);
        let config = adapter.config().clone();
        let jsonl_path = config.claim_list_jsonl.clone().unwrap();
        let psv_path = config.claim_list_tabular.clone().unwrap();
        std::fs::write(
            &jsonl_path,
            "{\"id\":41,\"status\":\"Open\"}\n{\"id\":42,\"patient_name\":\"jane\",\"billed_amount\":1,\"paid_amount\":0,\"status\":\"Denied\",\"insurer_name\":\"x\",\"discharge_date\":\"2024-01-01\"}\n",
        )
        .unwrap();
        std::fs::write(
            &psv_path,
            "id|patient_name|billed_amount|paid_amount|status|insurer_name|discharge_date\n42|jane|1|0|Denied|x|2024-01-01\n",
        )
        .unwrap();

        let report = adapter.sync_claim_list(&claim()).await.unwrap();
        assert_eq!(report.outcome(MirrorFormat::JsonLines), Some(SyncOutcome::Synced));
        assert_eq!(report.outcome(MirrorFormat::Tabular), Some(SyncOutcome::Synced));

        let jsonl = std::fs::read_to_string(&jsonl_path).unwrap();
        let line: serde_json::Value = serde_json::from_str(jsonl.lines().nth(1).unwrap()).unwrap();
        let row = claim().to_mirror_row();
        for (field, value) in row.fields() {
            assert_eq!(line[*field], serde_json::Value::String(value.clone()), "field {}", field);
        }
        assert_eq!(line["id"], serde_json::json!(42));
        assert_eq!(jsonl.lines().next().unwrap(), "{\"id\":41,\"status\":\"Open\"}");

        let psv = std::fs::read_to_string(&psv_path).unwrap();
        assert_eq!(psv.lines().nth(1).unwrap(), "42|Jane Doe|1200.50|100.00|Paid|Acme Health|2024-03-09");
        assert_eq!(reporter.events(), vec!["synced claim list/jsonl 42", "synced claim list/tabular 42"]);
    }

    #[tokio::test]
    async fn should_leave_file_untouched_when_row_missing() {
        let dir = TempDir::new().unwrap();
        let (adapter, reporter) = adapter(&dir);
        let jsonl_path = adapter.config().claim_list_jsonl.clone().unwrap();
        let original = "{\"id\": 41, \"status\": \"Open\"}\n{\"id\":43}";
        std::fs::write(&jsonl_path, original).unwrap();

        let report = adapter.sync_claim_list(&claim()).await.unwrap();
        assert_eq!(report.outcome(MirrorFormat::JsonLines), Some(SyncOutcome::RowNotFound));
        assert_eq!(report.outcome(MirrorFormat::Tabular), Some(SyncOutcome::FileAbsent));
        assert_eq!(std::fs::read(&jsonl_path).unwrap(), original.as_bytes());
        assert_eq!(reporter.events(), vec!["not_found claim list/jsonl 42", "absent claim list/tabular"]);
    }

    #[tokio::test]
    async fn should_key_detail_rows_by_business_id() {
        let dir = TempDir::new().unwrap();
        let (adapter, _) = adapter(&dir);
        let psv_path = adapter.config().claim_detail_tabular.clone().unwrap();
        std::fs::write(&psv_path, "claim_id|denial_reason|cpt_codes\n42|Missing auth|99213\n").unwrap();
        let detail = ClaimDetail {
            id: 3,
            claim: 7,
            denial_reason: Some("Missing auth. Late filing".to_string()),
            cpt_codes: "99213,99214".to_string(),
        };

        let report = adapter.sync_claim_detail(&detail, 42).await.unwrap();
        assert_eq!(report.entity, MirrorEntity::ClaimDetail);
        assert_eq!(report.outcome(MirrorFormat::Tabular), Some(SyncOutcome::Synced));
        assert_eq!(
            std::fs::read_to_string(&psv_path).unwrap(),
            "claim_id|denial_reason|cpt_codes\n42|Missing auth. Late filing|99213,99214\n"
        );
    }

    #[tokio::test]
    async fn should_skip_unconfigured_formats() {
        let adapter = MirrorFileAdapter::with_logging(MirrorConfig::default());
        let report = adapter.sync_claim_list(&claim()).await.unwrap();
        assert!(report.files.is_empty());
    }

    #[tokio::test]
    async fn should_surface_malformed_files_and_still_sync_other_format() {
        let dir = TempDir::new().unwrap();
        let (adapter, reporter) = adapter(&dir);
        let config = adapter.config().clone();
        std::fs::write(config.claim_list_jsonl.as_ref().unwrap(), "oops\n").unwrap();
        std::fs::write(config.claim_list_tabular.as_ref().unwrap(), "id|status\n42|Open\n").unwrap();

        let err = adapter.sync_claim_list(&claim()).await.unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { line: 1, .. }));
        assert_eq!(
            std::fs::read_to_string(config.claim_list_tabular.as_ref().unwrap()).unwrap(),
            "id|status\n42|Paid\n"
        );
        assert_eq!(reporter.events(), vec!["synced claim list/tabular 42"]);
    }

    #[tokio::test]
    async fn should_serialize_concurrent_syncs_of_one_file() {
        let dir = TempDir::new().unwrap();
        let (adapter, _) = adapter(&dir);
        let psv_path = adapter.config().claim_list_tabular.clone().unwrap();
        let mut content = String::from("id|status\n");
        for id in 1..=20 {
            content.push_str(&format!("{}|Open\n", id));
        }
        std::fs::write(&psv_path, content).unwrap();

        let mut handles = Vec::new();
        for id in 1..=20 {
            let adapter = adapter.clone();
            handles.push(tokio::spawn(async move {
                let mut c = claim();
                c.claim_id = id;
                adapter.sync_claim_list(&c).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let updated = std::fs::read_to_string(&psv_path).unwrap();
        assert_eq!(updated.lines().filter(|l| l.ends_with("|Paid")).count(), 20);
    }
}
