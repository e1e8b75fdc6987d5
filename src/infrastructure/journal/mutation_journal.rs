use crate::domain::entities::{MutationKind, MutationRecord, MutationState};
use crate::domain::value_objects::MutationId;
use chrono::Utc;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

struct JournalState {
    in_flight: HashMap<MutationId, MutationRecord>,
    /// 完了済みの記録。上限を超えると古いものから捨てる。
    settled: LruCache<MutationId, MutationRecord>,
}

/// 進行中・完了済みの楽観的更新の記録
///
/// 進行中の記録はすべて保持し、完了済みの記録は直近 `capacity` 件だけ残す。
#[derive(Clone)]
pub struct MutationJournal {
    state: Arc<RwLock<JournalState>>,
}

impl MutationJournal {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(RwLock::new(JournalState {
                in_flight: HashMap::new(),
                settled: LruCache::new(capacity),
            })),
        }
    }

    pub async fn begin(&self, kind: MutationKind) -> MutationId {
        let record = MutationRecord::new(kind);
        let id = record.id;
        self.state.write().await.in_flight.insert(id, record);
        id
    }

    /// 状態を進める。状態機械に沿わない遷移は記録せず `false` を返す。
    pub async fn advance(&self, id: MutationId, next: MutationState) -> bool {
        self.transition(id, next, None).await
    }

    pub async fn settle(&self, id: MutationId, outcome: MutationState, error: Option<String>) -> bool {
        self.transition(id, outcome, error).await
    }

    pub async fn get(&self, id: MutationId) -> Option<MutationRecord> {
        let state = self.state.read().await;
        state
            .in_flight
            .get(&id)
            .or_else(|| state.settled.peek(&id))
            .cloned()
    }

    pub async fn in_flight(&self) -> usize {
        self.state.read().await.in_flight.len()
    }

    pub async fn retained(&self) -> usize {
        let state = self.state.read().await;
        state.in_flight.len() + state.settled.len()
    }

    /// 進行中と保持中の完了済み記録を開始順に返す
    pub async fn records(&self) -> Vec<MutationRecord> {
        let state = self.state.read().await;
        let mut list: Vec<MutationRecord> = state
            .in_flight
            .values()
            .chain(state.settled.iter().map(|(_, record)| record))
            .cloned()
            .collect();
        list.sort_by_key(|record| record.started_at);
        list
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.in_flight.clear();
        state.settled.clear();
    }

    async fn transition(&self, id: MutationId, next: MutationState, error: Option<String>) -> bool {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let Some(record) = state.in_flight.get_mut(&id) else {
            return false;
        };
        if !record.state.can_advance_to(next) {
            warn!(
                mutation = %id,
                from = ?record.state,
                to = ?next,
                "Ignoring invalid mutation transition"
            );
            return false;
        }
        record.state = next;
        if !next.is_settled() {
            return true;
        }

        record.settled_at = Some(Utc::now());
        record.error = error;
        if let Some(record) = state.in_flight.remove(&id) {
            state.settled.push(id, record);
        }
        true
    }
}
