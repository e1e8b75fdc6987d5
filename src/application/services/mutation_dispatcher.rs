use super::cache_effect::CacheEffect;
use super::mutation::{CreateItem, Mutation, ToggleLike};
use crate::application::ports::feed_transport::{FeedTransport, ToggleLikeResponse};
use crate::application::ports::session_provider::{SessionProvider, SessionState, Viewer};
use crate::domain::entities::{Item, MutationState};
use crate::domain::value_objects::ItemId;
use crate::infrastructure::cache::{FeedCache, FeedEntries};
use crate::infrastructure::journal::MutationJournal;
use crate::shared::config::{MutationConfig, ToggleFailurePolicy};
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 楽観的更新の適用・送信・突き合わせを一元的に行う
#[derive(Clone)]
pub struct MutationDispatcher {
    cache: FeedCache,
    transport: Arc<dyn FeedTransport>,
    session: Arc<dyn SessionProvider>,
    journal: MutationJournal,
    failure_policy: ToggleFailurePolicy,
}

/// 対象投稿と、適用時に発行された通し番号
type IssuedSequence = (ItemId, u64);

impl MutationDispatcher {
    pub fn new(
        cache: FeedCache,
        transport: Arc<dyn FeedTransport>,
        session: Arc<dyn SessionProvider>,
        config: &MutationConfig,
    ) -> Self {
        Self {
            cache,
            transport,
            session,
            journal: MutationJournal::new(config.journal_capacity),
            failure_policy: config.toggle_failure_policy,
        }
    }

    pub fn journal(&self) -> &MutationJournal {
        &self.journal
    }

    pub async fn toggle_like(&self, item_id: ItemId) -> Result<ToggleLikeResponse, AppError> {
        self.execute(ToggleLike::new(item_id)).await
    }

    pub async fn create_item(&self, content: impl Into<String>) -> Result<Item, AppError> {
        self.execute(CreateItem::new(content)).await
    }

    /// `Idle -> Applying -> Pending -> {Committed | RolledBack | Failed}` を1件分進める
    pub async fn execute<M: Mutation>(&self, mutation: M) -> Result<M::Output, AppError> {
        let viewer = self.require_viewer().await?;
        mutation.validate()?;

        let kind = mutation.kind();
        let id = self.journal.begin(kind).await;
        self.journal.advance(id, MutationState::Applying).await;

        // 通し番号の発行と効果の算出・適用は同じクリティカルセクションで行う
        let (optimistic, sequence) = self
            .cache
            .write(|entries| {
                let sequence = mutation
                    .sequence_key()
                    .map(|key| (key.clone(), entries.issue_sequence(key)));
                let effect = mutation.optimistic_effect(entries);
                if let Some(effect) = effect.as_ref() {
                    let touched = effect.apply(entries);
                    debug!(mutation = %id, %kind, touched, "Applied optimistic effect");
                }
                (effect, sequence)
            })
            .await;

        self.journal.advance(id, MutationState::Pending).await;

        match mutation.send(self.transport.as_ref()).await {
            Ok(response) => {
                let settlement = mutation.reconcile(response, &viewer);
                let touched = self
                    .cache
                    .write(|entries| {
                        if !is_latest(entries, sequence.as_ref()) {
                            return None;
                        }
                        settlement.effect.as_ref().map(|effect| effect.apply(entries))
                    })
                    .await;
                match touched {
                    Some(touched) => {
                        debug!(mutation = %id, %kind, touched, "Reconciled with server result")
                    }
                    None => debug!(mutation = %id, %kind, "Left reconciliation to a newer mutation"),
                }
                self.journal
                    .settle(id, MutationState::Committed, None)
                    .await;
                info!(mutation = %id, %kind, "Mutation committed");
                Ok(settlement.output)
            }
            Err(source) => {
                warn!(mutation = %id, %kind, error = %source, "Mutation request failed");
                let outcome = self
                    .compensate(optimistic.as_ref(), sequence.as_ref())
                    .await;
                self.journal
                    .settle(id, outcome, Some(source.to_string()))
                    .await;
                Err(mutation.failure(source))
            }
        }
    }

    async fn compensate(
        &self,
        optimistic: Option<&CacheEffect>,
        sequence: Option<&IssuedSequence>,
    ) -> MutationState {
        let inverse = match self.failure_policy {
            ToggleFailurePolicy::Rollback => optimistic.and_then(CacheEffect::inverse),
            ToggleFailurePolicy::Retain => None,
        };
        self.cache
            .write(|entries| {
                // 後続の変更が発行済みなら、その楽観的な値を巻き戻さない
                if !is_latest(entries, sequence) {
                    return MutationState::Failed;
                }
                match inverse {
                    Some(inverse) => {
                        let touched = inverse.apply(entries);
                        debug!(touched, "Rolled back optimistic effect");
                        MutationState::RolledBack
                    }
                    None => MutationState::Failed,
                }
            })
            .await
    }

    async fn require_viewer(&self) -> Result<Viewer, AppError> {
        match self.session.current().await {
            SessionState::Authenticated(viewer) => Ok(viewer),
            state => {
                warn!(?state, "Rejected mutation without an authenticated session");
                Err(AppError::Unauthenticated)
            }
        }
    }
}

fn is_latest(entries: &mut FeedEntries, sequence: Option<&IssuedSequence>) -> bool {
    sequence.is_none_or(|(item_id, sequence)| entries.settle_sequence(item_id, *sequence))
}
