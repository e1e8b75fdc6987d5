use super::CacheEvent;
use crate::domain::entities::{CacheEntry, EntryStatus, FeedSnapshot, Item, Page};
use crate::domain::value_objects::{FeedCursor, ItemId, QueryKey};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::debug;

/// 読み込み開始時に払い出されるチケット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub cursor: Option<FeedCursor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStart {
    Ready(LoadTicket),
    Exhausted,
    AlreadyLoading,
}

/// クエリキーごとのページ列を保持する同期データ構造
///
/// 生きているエントリのキー集合がそのままビューレジストリになる。
/// 容量を超えると最も古く使われたビューから破棄される。
pub struct FeedEntries {
    entries: LruCache<QueryKey, CacheEntry>,
    next_generation: u64,
    events: Vec<CacheEvent>,
    /// 投稿ごとに最後に発行された変更の通し番号
    latest_sequences: HashMap<ItemId, u64>,
    next_sequence: u64,
}

impl FeedEntries {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            next_generation: 0,
            events: Vec::new(),
            latest_sequences: HashMap::new(),
            next_sequence: 0,
        }
    }

    pub fn get(&self, query: &QueryKey) -> Option<&CacheEntry> {
        self.entries.peek(query)
    }

    pub fn is_live(&self, query: &QueryKey) -> bool {
        self.entries.contains(query)
    }

    /// 生きているビューのキー（最近使われた順）
    pub fn live_keys(&self) -> Vec<QueryKey> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn snapshot(&self, query: &QueryKey) -> Option<FeedSnapshot> {
        self.get(query).map(|entry| entry.snapshot(query))
    }

    /// いずれかのビューに載っている投稿を探す
    pub fn find_item(&self, item_id: &ItemId) -> Option<&Item> {
        self.entries
            .iter()
            .find_map(|(_, entry)| entry.find_item(item_id))
    }

    /// 取得済みページを末尾に追加する。エントリがなければ作成する。
    pub fn append(&mut self, query: &QueryKey, page: Page) {
        self.ensure_entry(query).push_page(page);
        self.events.push(CacheEvent::PagesChanged {
            query: query.clone(),
        });
    }

    /// 述語を満たす全エントリのページ列を `update` の結果で置き換える
    ///
    /// 存在しないエントリは作成しない。置き換えたエントリ数を返す。
    pub fn transform<P, F>(&mut self, predicate: P, update: F) -> usize
    where
        P: Fn(&QueryKey) -> bool,
        F: Fn(Vec<Page>) -> Vec<Page>,
    {
        let mut touched = Vec::new();
        for (query, entry) in self.entries.iter_mut() {
            if !predicate(query) {
                continue;
            }
            let pages = entry.take_pages();
            entry.set_pages(update(pages));
            touched.push(query.clone());
        }

        let count = touched.len();
        self.events.extend(
            touched
                .into_iter()
                .map(|query| CacheEvent::PagesChanged { query }),
        );
        count
    }

    pub fn begin_load(&mut self, query: &QueryKey) -> LoadStart {
        if let Some(entry) = self.entries.get(query) {
            if entry.is_loading() {
                return LoadStart::AlreadyLoading;
            }
            if !entry.has_more() {
                return LoadStart::Exhausted;
            }
        }

        let entry = self.ensure_entry(query);
        entry.set_status(EntryStatus::Loading);
        let ticket = LoadTicket {
            generation: entry.generation(),
            cursor: entry.next_cursor().cloned(),
        };
        self.events.push(CacheEvent::StatusChanged {
            query: query.clone(),
        });
        LoadStart::Ready(ticket)
    }

    /// 読み込み開始時と同じ世代のエントリが残っている場合だけページを追加する
    pub fn append_if_live(&mut self, query: &QueryKey, generation: u64, page: Page) -> bool {
        let Some(entry) = self.entries.get_mut(query) else {
            return false;
        };
        if entry.generation() != generation {
            return false;
        }
        entry.push_page(page);
        self.events.push(CacheEvent::PagesChanged {
            query: query.clone(),
        });
        true
    }

    pub fn fail_if_live(&mut self, query: &QueryKey, generation: u64, message: String) -> bool {
        let Some(entry) = self.entries.get_mut(query) else {
            return false;
        };
        if entry.generation() != generation {
            return false;
        }
        entry.set_status(EntryStatus::Failed(message));
        self.events.push(CacheEvent::StatusChanged {
            query: query.clone(),
        });
        true
    }

    pub fn discard(&mut self, query: &QueryKey) -> bool {
        if self.entries.pop(query).is_none() {
            return false;
        }
        self.events.push(CacheEvent::Discarded {
            query: query.clone(),
        });
        true
    }

    /// 投稿に対する変更の通し番号を発行し、それ以前の番号を古いものとして扱う
    pub fn issue_sequence(&mut self, item_id: &ItemId) -> u64 {
        self.next_sequence += 1;
        self.latest_sequences
            .insert(item_id.clone(), self.next_sequence);
        self.next_sequence
    }

    /// `sequence` がその投稿で最後に発行された番号なら `true` を返して記録を外す
    ///
    /// より新しい変更が発行済みの場合、この番号の応答は反映しない。
    pub fn settle_sequence(&mut self, item_id: &ItemId, sequence: u64) -> bool {
        if self.latest_sequences.get(item_id) != Some(&sequence) {
            return false;
        }
        self.latest_sequences.remove(item_id);
        true
    }

    pub fn pending_sequences(&self) -> usize {
        self.latest_sequences.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.latest_sequences.clear();
        self.events.push(CacheEvent::Cleared);
    }

    pub(crate) fn drain_events(&mut self) -> Vec<CacheEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_entry(&mut self, query: &QueryKey) -> &mut CacheEntry {
        if !self.entries.contains(query) && self.entries.len() >= self.capacity() {
            if let Some((evicted, _)) = self.entries.pop_lru() {
                debug!(view = %evicted, "Evicted least recently used feed view");
                self.events.push(CacheEvent::Discarded { query: evicted });
            }
        }

        let next_generation = &mut self.next_generation;
        self.entries.get_or_insert_mut(query.clone(), || {
            *next_generation += 1;
            CacheEntry::new(*next_generation)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Author;
    use crate::domain::value_objects::UserId;
    use chrono::Utc;

    fn entries(capacity: usize) -> FeedEntries {
        FeedEntries::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn item(id: &str, author: &str) -> Item {
        Item::new(
            ItemId::new(id).unwrap(),
            Utc::now(),
            format!("content of {id}"),
            Author::new(UserId::new(author).unwrap()),
        )
    }

    fn page(ids: &[&str], next: Option<&str>) -> Page {
        Page::new(
            ids.iter().map(|id| item(id, "alice")).collect(),
            next.map(FeedCursor::new),
        )
    }

    #[test]
    fn append_creates_entry_and_tracks_cursor() {
        let mut cache = entries(4);
        cache.append(&QueryKey::AllItems, page(&["t1", "t2"], Some("c1")));

        let entry = cache.get(&QueryKey::AllItems).unwrap();
        assert_eq!(entry.item_count(), 2);
        assert_eq!(entry.next_cursor().map(FeedCursor::as_str), Some("c1"));
        assert!(entry.has_more());

        cache.append(&QueryKey::AllItems, page(&["t3"], None));
        let entry = cache.get(&QueryKey::AllItems).unwrap();
        assert_eq!(entry.pages().len(), 2);
        assert!(!entry.has_more());
    }

    #[test]
    fn transform_over_absent_key_is_noop() {
        let mut cache = entries(4);
        let touched = cache.transform(|key| key == &QueryKey::FollowingOnly, |pages| pages);

        assert_eq!(touched, 0);
        assert!(cache.get(&QueryKey::FollowingOnly).is_none());
        assert!(cache.is_empty());
        assert!(cache.drain_events().is_empty());
    }

    #[test]
    fn transform_only_touches_matching_keys() {
        let mut cache = entries(4);
        cache.append(&QueryKey::AllItems, page(&["t1"], None));
        cache.append(&QueryKey::FollowingOnly, page(&["t1"], None));
        cache.drain_events();

        let touched = cache.transform(
            |key| key == &QueryKey::AllItems,
            |mut pages| {
                pages[0].items.clear();
                pages
            },
        );

        assert_eq!(touched, 1);
        assert_eq!(cache.get(&QueryKey::AllItems).unwrap().item_count(), 0);
        assert_eq!(cache.get(&QueryKey::FollowingOnly).unwrap().item_count(), 1);
        assert_eq!(
            cache.drain_events(),
            vec![CacheEvent::PagesChanged {
                query: QueryKey::AllItems
            }]
        );
    }

    #[test]
    fn begin_load_refuses_exhausted_and_loading_entries() {
        let mut cache = entries(4);
        let LoadStart::Ready(ticket) = cache.begin_load(&QueryKey::AllItems) else {
            panic!("fresh entry should be loadable");
        };
        assert!(ticket.cursor.is_none());
        assert_eq!(
            cache.begin_load(&QueryKey::AllItems),
            LoadStart::AlreadyLoading
        );

        assert!(cache.append_if_live(&QueryKey::AllItems, ticket.generation, page(&["t1"], None)));
        assert_eq!(cache.begin_load(&QueryKey::AllItems), LoadStart::Exhausted);
    }

    #[test]
    fn stale_generation_is_rejected_after_discard() {
        let mut cache = entries(4);
        let LoadStart::Ready(ticket) = cache.begin_load(&QueryKey::AllItems) else {
            panic!("fresh entry should be loadable");
        };

        assert!(cache.discard(&QueryKey::AllItems));
        assert!(!cache.append_if_live(&QueryKey::AllItems, ticket.generation, page(&["t1"], None)));
        assert!(cache.get(&QueryKey::AllItems).is_none());

        let LoadStart::Ready(fresh) = cache.begin_load(&QueryKey::AllItems) else {
            panic!("recreated entry should be loadable");
        };
        assert_ne!(fresh.generation, ticket.generation);
        assert!(!cache.fail_if_live(&QueryKey::AllItems, ticket.generation, "late".to_string()));
        assert!(cache.get(&QueryKey::AllItems).unwrap().is_loading());
    }

    #[test]
    fn capacity_evicts_least_recently_used_view() {
        let mut cache = entries(2);
        let alice = QueryKey::profile(UserId::new("alice").unwrap());
        cache.append(&QueryKey::AllItems, page(&["t1"], None));
        cache.append(&QueryKey::FollowingOnly, page(&["t2"], None));
        cache.drain_events();

        cache.append(&alice, page(&["t3"], None));

        assert!(!cache.is_live(&QueryKey::AllItems));
        assert!(cache.is_live(&QueryKey::FollowingOnly));
        assert!(cache.is_live(&alice));
        assert_eq!(
            cache.drain_events(),
            vec![
                CacheEvent::Discarded {
                    query: QueryKey::AllItems
                },
                CacheEvent::PagesChanged { query: alice },
            ]
        );
    }

    #[test]
    fn find_item_searches_every_view() {
        let mut cache = entries(4);
        let bob = QueryKey::profile(UserId::new("bob").unwrap());
        cache.append(&bob, Page::new(vec![item("b1", "bob")], None));

        let found = cache.find_item(&ItemId::new("b1").unwrap()).unwrap();
        assert_eq!(found.author.id.as_str(), "bob");
        assert!(cache.find_item(&ItemId::new("missing").unwrap()).is_none());
    }

    #[test]
    fn only_latest_sequence_settles() {
        let mut cache = entries(4);
        let t1 = ItemId::new("t1").unwrap();
        let t2 = ItemId::new("t2").unwrap();

        let older = cache.issue_sequence(&t1);
        let newer = cache.issue_sequence(&t1);
        let other = cache.issue_sequence(&t2);
        assert_eq!(cache.pending_sequences(), 2);

        assert!(!cache.settle_sequence(&t1, older));
        assert!(cache.settle_sequence(&t1, newer));
        assert!(!cache.settle_sequence(&t1, newer));
        assert!(!cache.settle_sequence(&t1, older));
        assert!(cache.settle_sequence(&t2, other));
        assert_eq!(cache.pending_sequences(), 0);
    }

    #[test]
    fn clear_forgets_issued_sequences() {
        let mut cache = entries(4);
        let t1 = ItemId::new("t1").unwrap();
        let sequence = cache.issue_sequence(&t1);

        cache.clear();

        assert_eq!(cache.pending_sequences(), 0);
        assert!(!cache.settle_sequence(&t1, sequence));
    }
}
