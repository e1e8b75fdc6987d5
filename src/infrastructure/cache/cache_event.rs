use crate::domain::value_objects::QueryKey;
use serde::Serialize;

/// キャッシュ変更通知。描画層はこれを受けて再描画する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    PagesChanged { query: QueryKey },
    StatusChanged { query: QueryKey },
    Discarded { query: QueryKey },
    Cleared,
}

impl CacheEvent {
    pub fn query(&self) -> Option<&QueryKey> {
        match self {
            CacheEvent::PagesChanged { query }
            | CacheEvent::StatusChanged { query }
            | CacheEvent::Discarded { query } => Some(query),
            CacheEvent::Cleared => None,
        }
    }
}
