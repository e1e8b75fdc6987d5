use super::cache_effect::CacheEffect;
use crate::application::ports::feed_transport::{CreatedItem, FeedTransport, ToggleLikeResponse};
use crate::application::ports::session_provider::Viewer;
use crate::domain::entities::{Item, MutationKind};
use crate::domain::value_objects::ItemId;
use crate::infrastructure::cache::FeedEntries;
use crate::shared::error::{AppError, TransportError};
use async_trait::async_trait;

/// サーバー応答を受けた後のキャッシュ効果と呼び出し元への戻り値
#[derive(Debug, Clone)]
pub struct Settlement<T> {
    pub effect: Option<CacheEffect>,
    pub output: T,
}

/// ディスパッチャが実行する変更操作
///
/// 適用・送信・突き合わせの各段階を実装し、実行順序はディスパッチャ側が保証する。
#[async_trait]
pub trait Mutation: Send + Sync {
    type Response: Send;
    type Output: Send;

    fn kind(&self) -> MutationKind;

    /// 送信前の入力検証
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }

    /// 同じ対象への後続の変更に追い越されうる場合のその対象
    ///
    /// 追い越された変更の応答はキャッシュに反映しない。
    fn sequence_key(&self) -> Option<&ItemId> {
        None
    }

    /// サーバー応答前に適用する効果。キャッシュの書き込みロック内で呼ばれる。
    fn optimistic_effect(&self, entries: &FeedEntries) -> Option<CacheEffect>;

    async fn send(&self, transport: &dyn FeedTransport) -> Result<Self::Response, TransportError>;

    /// 権威あるサーバー応答をキャッシュに反映する効果を決める
    fn reconcile(&self, response: Self::Response, viewer: &Viewer) -> Settlement<Self::Output>;

    fn failure(&self, source: TransportError) -> AppError;
}

#[derive(Debug, Clone)]
pub struct ToggleLike {
    pub item_id: ItemId,
}

impl ToggleLike {
    pub fn new(item_id: ItemId) -> Self {
        Self { item_id }
    }
}

#[async_trait]
impl Mutation for ToggleLike {
    type Response = ToggleLikeResponse;
    type Output = ToggleLikeResponse;

    fn kind(&self) -> MutationKind {
        MutationKind::ToggleLike
    }

    fn sequence_key(&self) -> Option<&ItemId> {
        Some(&self.item_id)
    }

    fn optimistic_effect(&self, entries: &FeedEntries) -> Option<CacheEffect> {
        // 直前の楽観的更新も反映済みの現在値から向きを決める
        entries
            .find_item(&self.item_id)
            .map(|item| CacheEffect::LikeSet {
                item_id: self.item_id.clone(),
                liked: !item.liked_by_me,
            })
    }

    async fn send(&self, transport: &dyn FeedTransport) -> Result<Self::Response, TransportError> {
        transport.request_toggle_like(&self.item_id).await
    }

    fn reconcile(&self, response: Self::Response, _viewer: &Viewer) -> Settlement<Self::Output> {
        Settlement {
            effect: Some(CacheEffect::LikeSet {
                item_id: self.item_id.clone(),
                liked: response.added_like,
            }),
            output: response,
        }
    }

    fn failure(&self, source: TransportError) -> AppError {
        AppError::ToggleFailed {
            item_id: self.item_id.clone(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateItem {
    pub content: String,
}

impl CreateItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
impl Mutation for CreateItem {
    type Response = CreatedItem;
    type Output = Item;

    fn kind(&self) -> MutationKind {
        MutationKind::CreateItem
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.content.trim().is_empty() {
            return Err(AppError::invalid_input("content must not be empty"));
        }
        Ok(())
    }

    // IDと作成日時はサーバーが採番するため、応答前に作れる投稿はない
    fn optimistic_effect(&self, _entries: &FeedEntries) -> Option<CacheEffect> {
        None
    }

    async fn send(&self, transport: &dyn FeedTransport) -> Result<Self::Response, TransportError> {
        transport.request_create_item(&self.content).await
    }

    fn reconcile(&self, response: Self::Response, viewer: &Viewer) -> Settlement<Self::Output> {
        let item = Item::new(
            response.id,
            response.created_at,
            self.content.clone(),
            viewer.as_author(),
        );
        Settlement {
            effect: Some(CacheEffect::ItemPrepended { item: item.clone() }),
            output: item,
        }
    }

    fn failure(&self, source: TransportError) -> AppError {
        AppError::CreateFailed { source }
    }
}
