//! JSON files in the state directory.
//!
//! Writes go to a temp file in the same directory and are renamed into place,
//! so a crash never leaves a half-written store behind.

use super::WorkflowError;
use crate::models::{InsightCard, WorkflowItem};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const WORKFLOWS_FILE: &str = "workflows.json";
pub const LAST_INSIGHTS_FILE: &str = "last_insights.json";

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, WorkflowError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| WorkflowError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), WorkflowError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    let json = serde_json::to_string_pretty(value).map_err(|source| WorkflowError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| WorkflowError::Io(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// The workflow board, loaded whole and saved whole.
pub struct WorkflowStore {
    path: PathBuf,
    items: Vec<WorkflowItem>,
}

impl WorkflowStore {
    pub fn open(state_dir: &Path) -> Result<Self, WorkflowError> {
        let path = state_dir.join(WORKFLOWS_FILE);
        let items = read_json(&path)?;
        Ok(Self { path, items })
    }

    pub fn items(&self) -> &[WorkflowItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Result<&WorkflowItem, WorkflowError> {
        self.items
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| WorkflowError::NotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut WorkflowItem, WorkflowError> {
        self.items
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| WorkflowError::NotFound(id.to_string()))
    }

    /// Add a new item at the front, renaming it if its id is taken.
    pub fn insert(&mut self, mut item: WorkflowItem) -> &WorkflowItem {
        let base = item.id.clone();
        let mut n = 1;
        while self.items.iter().any(|w| w.id == item.id) {
            n += 1;
            item.id = format!("{}-{}", base, n);
        }
        self.items.insert(0, item);
        &self.items[0]
    }

    pub fn save(&self) -> Result<(), WorkflowError> {
        write_json_atomic(&self.path, &self.items)
    }
}

/// Insight cards from the most recent page, so they can be turned into
/// workflows by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightSnapshot {
    pub page: String,
    pub generated_at: Option<DateTime<Utc>>,
    pub cards: Vec<InsightCard>,
}

impl InsightSnapshot {
    pub fn load(state_dir: &Path) -> Result<Self, WorkflowError> {
        read_json(&state_dir.join(LAST_INSIGHTS_FILE))
    }

    pub fn save(&self, state_dir: &Path) -> Result<(), WorkflowError> {
        write_json_atomic(&state_dir.join(LAST_INSIGHTS_FILE), self)
    }

    pub fn find(&self, id: &str) -> Result<&InsightCard, WorkflowError> {
        self.cards
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| WorkflowError::InsightNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::workflow::items::create;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::open(&dir.path().join("nested")).unwrap();
        assert!(store.items().is_empty());
        assert!(matches!(store.get("WF-1"), Err(WorkflowError::NotFound(_))));
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");

        let mut store = WorkflowStore::open(&state).unwrap();
        store.insert(create("First", "", 10.0, "ops", now()));
        store.insert(create("Second", "", 20.0, "ops", now()));
        store.save().unwrap();

        let reopened = WorkflowStore::open(&state).unwrap();
        assert_eq!(reopened.items().len(), 2);
        // Newest first; the clashing id was renamed.
        assert_eq!(reopened.items()[0].title, "Second");
        assert_eq!(reopened.items()[0].id, format!("WF-{}-2", now().timestamp_millis()));
        assert_eq!(reopened.get(&reopened.items()[1].id).unwrap().title, "First");
    }

    #[test]
    fn test_corrupt_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WORKFLOWS_FILE), "{not json").unwrap();
        let err = WorkflowStore::open(dir.path()).err().unwrap();
        assert!(matches!(err, WorkflowError::Corrupt { .. }));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let card = InsightCard {
            id: "sla-1-0".to_string(),
            title: "Late shipments".to_string(),
            description: String::new(),
            financial_impact: 1200.0,
            severity: Severity::High,
            tags: vec![],
            suggested_actions: vec![],
            root_cause: String::new(),
            evidence_trail: vec![],
            confidence: 0.88,
            agent_name: "SLAWatchdogAgent".to_string(),
        };
        let snapshot = InsightSnapshot {
            page: "sla".to_string(),
            generated_at: Some(now()),
            cards: vec![card],
        };
        snapshot.save(dir.path()).unwrap();

        let loaded = InsightSnapshot::load(dir.path()).unwrap();
        assert_eq!(loaded.page, "sla");
        assert_eq!(loaded.find("sla-1-0").unwrap().title, "Late shipments");
        assert!(matches!(
            loaded.find("sla-9-9"),
            Err(WorkflowError::InsightNotFound(_))
        ));
    }
}
