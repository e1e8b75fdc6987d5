use super::broadcast::BroadcastTargets;
use crate::domain::entities::{Item, MutationKind, Page};
use crate::domain::value_objects::ItemId;
use crate::infrastructure::cache::FeedEntries;

/// キャッシュに適用する決定的な局所効果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEffect {
    /// 対象投稿のいいね状態を `liked` に揃える（件数は状態が変わるときだけ±1）
    LikeSet { item_id: ItemId, liked: bool },
    /// 先頭ページの先頭に投稿を差し込む
    ItemPrepended { item: Item },
}

impl CacheEffect {
    pub fn kind(&self) -> MutationKind {
        match self {
            CacheEffect::LikeSet { .. } => MutationKind::ToggleLike,
            CacheEffect::ItemPrepended { .. } => MutationKind::CreateItem,
        }
    }

    /// 打ち消す効果。差し込みは楽観的に行わないため対になる効果はない。
    pub fn inverse(&self) -> Option<CacheEffect> {
        match self {
            CacheEffect::LikeSet { item_id, liked } => Some(CacheEffect::LikeSet {
                item_id: item_id.clone(),
                liked: !liked,
            }),
            CacheEffect::ItemPrepended { .. } => None,
        }
    }

    /// ブロードキャスト先の全エントリに適用し、置き換えたエントリ数を返す
    pub fn apply(&self, entries: &mut FeedEntries) -> usize {
        match self {
            CacheEffect::LikeSet { item_id, liked } => {
                let author = entries.find_item(item_id).map(|item| item.author.id.clone());
                let targets = BroadcastTargets::resolve(self.kind(), author.as_ref());
                entries.transform(
                    |query| targets.contains(query),
                    |pages| set_like(pages, item_id, *liked),
                )
            }
            CacheEffect::ItemPrepended { item } => {
                let targets = BroadcastTargets::resolve(self.kind(), Some(&item.author.id));
                entries.transform(
                    |query| targets.contains(query),
                    |pages| prepend(pages, item),
                )
            }
        }
    }
}

fn set_like(pages: Vec<Page>, item_id: &ItemId, liked: bool) -> Vec<Page> {
    pages
        .into_iter()
        .map(|mut page| {
            for item in page.items.iter_mut().filter(|item| &item.id == item_id) {
                item.set_liked(liked);
            }
            page
        })
        .collect()
}

fn prepend(mut pages: Vec<Page>, item: &Item) -> Vec<Page> {
    if let Some(first) = pages.first_mut() {
        first.items.insert(0, item.clone());
    }
    pages
}
