//! JSON fixture the CLI runs against.
//!
//! ```json
//! {
//!   "ownership":     [{ "task_id": 2, "original_owner_id": 7, "acting_owner_id": 7 }],
//!   "absences":      [{ "worker_id": 7, "date": "2025-03-10", "present": false }],
//!   "substitutes":   [{ "absent_worker_id": 7, "task_id": 2, "substitute_id": 9 }],
//!   "notifications": []
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use handover_core::domain::{AbsenceRecord, Notification, OwnershipRow, TaskId, WorkerId};

/// Matcher verdict for one task of one absent worker. `substitute_id: null`
/// means nobody qualifies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubstituteEntry {
    pub absent_worker_id: WorkerId,
    pub task_id: TaskId,
    #[serde(default)]
    pub substitute_id: Option<WorkerId>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub ownership: Vec<OwnershipRow>,
    #[serde(default)]
    pub absences: Vec<AbsenceRecord>,
    #[serde(default)]
    pub substitutes: Vec<SubstituteEntry>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("writing fixture {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_shape() {
        let fixture: Fixture = serde_json::from_str(
            r#"{
                "ownership": [{ "task_id": 2, "original_owner_id": 7, "acting_owner_id": 7 }],
                "absences": [{ "worker_id": 7, "date": "2025-03-10", "present": false }],
                "substitutes": [
                    { "absent_worker_id": 7, "task_id": 2, "substitute_id": 9 },
                    { "absent_worker_id": 7, "task_id": 3 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(fixture.ownership.len(), 1);
        assert!(fixture.absences[0].is_absence());
        assert_eq!(fixture.substitutes[0].substitute_id, Some(WorkerId::new(9)));
        assert_eq!(fixture.substitutes[1].substitute_id, None);
        assert!(fixture.notifications.is_empty());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let fixture: Fixture = serde_json::from_str("{}").unwrap();
        assert!(fixture.ownership.is_empty());
        assert!(fixture.substitutes.is_empty());
    }
}
