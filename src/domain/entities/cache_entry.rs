use super::{Item, Page};
use crate::domain::value_objects::{FeedCursor, ItemId, QueryKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    Idle,
    Loading,
    Failed(String),
}

/// 1つのクエリキーに対応するページ列と読み込み状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pages: Vec<Page>,
    status: EntryStatus,
    generation: u64,
}

impl CacheEntry {
    pub fn new(generation: u64) -> Self {
        Self {
            pages: Vec::new(),
            status: EntryStatus::Idle,
            generation,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn status(&self) -> &EntryStatus {
        &self.status
    }

    /// エントリ生成時に払い出される世代番号。破棄後の遅延レスポンス判定に使う。
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.status == EntryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, EntryStatus::Failed(_))
    }

    pub fn next_cursor(&self) -> Option<&FeedCursor> {
        self.pages.last().and_then(|page| page.next_cursor.as_ref())
    }

    /// まだ1ページも読み込んでいないエントリは続きがあるものとして扱う
    pub fn has_more(&self) -> bool {
        self.pages.last().is_none_or(|page| !page.is_terminal())
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    pub fn find_item(&self, item_id: &ItemId) -> Option<&Item> {
        self.items().find(|item| &item.id == item_id)
    }

    pub fn snapshot(&self, query: &QueryKey) -> FeedSnapshot {
        FeedSnapshot {
            query: query.clone(),
            items: self.items().cloned().collect(),
            is_loading: self.is_loading(),
            is_error: self.is_error(),
            has_more: self.has_more(),
        }
    }

    pub(crate) fn push_page(&mut self, page: Page) {
        self.pages.push(page);
        self.status = EntryStatus::Idle;
    }

    pub(crate) fn set_status(&mut self, status: EntryStatus) {
        self.status = status;
    }

    pub(crate) fn take_pages(&mut self) -> Vec<Page> {
        std::mem::take(&mut self.pages)
    }

    pub(crate) fn set_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
    }
}

/// 描画層に渡す平坦化済みのビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub query: QueryKey,
    pub items: Vec<Item>,
    pub is_loading: bool,
    pub is_error: bool,
    pub has_more: bool,
}

impl FeedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
