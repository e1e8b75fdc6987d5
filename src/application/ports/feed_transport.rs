use crate::domain::entities::{Item, Page};
use crate::domain::value_objects::{FeedCursor, ItemId, QueryKey};
use crate::shared::error::TransportError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<Item>,
    pub next_cursor: Option<FeedCursor>,
}

impl From<FeedPage> for Page {
    fn from(page: FeedPage) -> Self {
        Page::new(page.items, page.next_cursor)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub added_like: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedItem {
    pub id: ItemId,
    pub created_at: DateTime<Utc>,
}

/// リモートプロシージャ層のポート
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// クエリキーに対応する次のページを取得（`cursor` が `None` なら先頭ページ）
    async fn fetch_page(
        &self,
        query: &QueryKey,
        cursor: Option<&FeedCursor>,
    ) -> Result<FeedPage, TransportError>;

    /// いいねを反転する。結果の向きはサーバーが決める。
    async fn request_toggle_like(
        &self,
        item_id: &ItemId,
    ) -> Result<ToggleLikeResponse, TransportError>;

    async fn request_create_item(&self, content: &str) -> Result<CreatedItem, TransportError>;
}
