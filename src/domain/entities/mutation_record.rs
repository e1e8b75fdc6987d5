use crate::domain::value_objects::MutationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    ToggleLike,
    CreateItem,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::ToggleLike => write!(f, "toggle_like"),
            MutationKind::CreateItem => write!(f, "create_item"),
        }
    }
}

/// 楽観的更新1件の進行状態
///
/// `Idle -> Applying -> Pending -> {Committed | RolledBack | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Idle,
    Applying,
    Pending,
    Committed,
    RolledBack,
    /// リクエストは失敗したが楽観的な値は残っている
    Failed,
}

impl MutationState {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            MutationState::Committed | MutationState::RolledBack | MutationState::Failed
        )
    }

    pub fn can_advance_to(&self, next: MutationState) -> bool {
        use MutationState::*;
        matches!(
            (self, next),
            (Idle, Applying)
                | (Applying, Pending)
                | (Pending, Committed)
                | (Pending, RolledBack)
                | (Pending, Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub id: MutationId,
    pub kind: MutationKind,
    pub state: MutationState,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl MutationRecord {
    pub fn new(kind: MutationKind) -> Self {
        Self {
            id: MutationId::generate(),
            kind,
            state: MutationState::Idle,
            started_at: Utc::now(),
            settled_at: None,
            error: None,
        }
    }
}
