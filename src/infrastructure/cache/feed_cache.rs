use super::{CacheEvent, FeedEntries};
use crate::domain::entities::{CacheEntry, FeedSnapshot, Item, Page};
use crate::domain::value_objects::{ItemId, QueryKey};
use crate::shared::config::CacheConfig;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// フィードキャッシュの共有ハンドル
///
/// 各操作は1回の短いクリティカルセクションで完結し、ロックを保持したまま
/// リモート呼び出しを待つことはない。
#[derive(Clone)]
pub struct FeedCache {
    entries: Arc<RwLock<FeedEntries>>,
    events: broadcast::Sender<CacheEvent>,
}

impl FeedCache {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_views).unwrap_or(NonZeroUsize::MIN);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            entries: Arc::new(RwLock::new(FeedEntries::new(capacity))),
            events,
        }
    }

    /// 変更通知を購読する
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// 読み取り専用でエントリ群にアクセスする
    pub async fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&FeedEntries) -> R,
    {
        let entries = self.entries.read().await;
        f(&entries)
    }

    /// 書き込みロック内で `f` を実行し、その間に発生した変更を通知する
    pub async fn write<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut FeedEntries) -> R,
    {
        let (result, events) = {
            let mut entries = self.entries.write().await;
            let result = f(&mut entries);
            (result, entries.drain_events())
        };
        for event in events {
            // 購読者がいない場合の送信失敗は無視する
            let _ = self.events.send(event);
        }
        result
    }

    pub async fn get(&self, query: &QueryKey) -> Option<CacheEntry> {
        self.read(|entries| entries.get(query).cloned()).await
    }

    pub async fn snapshot(&self, query: &QueryKey) -> Option<FeedSnapshot> {
        self.read(|entries| entries.snapshot(query)).await
    }

    pub async fn live_keys(&self) -> Vec<QueryKey> {
        self.read(FeedEntries::live_keys).await
    }

    pub async fn find_item(&self, item_id: &ItemId) -> Option<Item> {
        self.read(|entries| entries.find_item(item_id).cloned()).await
    }

    pub async fn append(&self, query: &QueryKey, page: Page) {
        self.write(|entries| entries.append(query, page)).await
    }

    pub async fn transform<P, F>(&self, predicate: P, update: F) -> usize
    where
        P: Fn(&QueryKey) -> bool,
        F: Fn(Vec<Page>) -> Vec<Page>,
    {
        self.write(|entries| entries.transform(predicate, update))
            .await
    }

    pub async fn discard(&self, query: &QueryKey) -> bool {
        self.write(|entries| entries.discard(query)).await
    }

    pub async fn clear(&self) {
        self.write(FeedEntries::clear).await
    }
}
