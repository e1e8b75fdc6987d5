use crate::domain::entities::MutationKind;
use crate::domain::value_objects::{QueryKey, UserId};

/// 変更を反映すべきクエリキーの形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    AllItems,
    FollowingOnly,
    /// 対象投稿の作者のプロフィールフィード
    AuthorProfile,
}

const TOGGLE_LIKE_TARGETS: [TargetShape; 3] = [
    TargetShape::AllItems,
    TargetShape::FollowingOnly,
    TargetShape::AuthorProfile,
];
// 新規投稿は他のビューには先回りで載せない
const CREATE_ITEM_TARGETS: [TargetShape; 1] = [TargetShape::AllItems];

impl TargetShape {
    pub fn for_kind(kind: MutationKind) -> &'static [TargetShape] {
        match kind {
            MutationKind::ToggleLike => &TOGGLE_LIKE_TARGETS,
            MutationKind::CreateItem => &CREATE_ITEM_TARGETS,
        }
    }

    pub fn resolve(&self, author: Option<&UserId>) -> Option<QueryKey> {
        match self {
            TargetShape::AllItems => Some(QueryKey::AllItems),
            TargetShape::FollowingOnly => Some(QueryKey::FollowingOnly),
            TargetShape::AuthorProfile => author.cloned().map(QueryKey::Profile),
        }
    }
}

/// 具体的なクエリキーに解決済みのブロードキャスト先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastTargets {
    keys: Vec<QueryKey>,
}

impl BroadcastTargets {
    pub fn resolve(kind: MutationKind, author: Option<&UserId>) -> Self {
        let keys = TargetShape::for_kind(kind)
            .iter()
            .filter_map(|shape| shape.resolve(author))
            .collect();
        Self { keys }
    }

    pub fn contains(&self, query: &QueryKey) -> bool {
        self.keys.contains(query)
    }

    pub fn keys(&self) -> &[QueryKey] {
        &self.keys
    }
}
