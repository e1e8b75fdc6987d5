use super::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// キャッシュされたフィードビューを識別するフィルタ
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum QueryKey {
    /// フィルタなしのタイムライン
    AllItems,
    /// フォロー中ユーザーの投稿のみ
    FollowingOnly,
    /// 特定ユーザーのプロフィールフィード
    Profile(UserId),
}

impl QueryKey {
    pub fn profile(user_id: UserId) -> Self {
        QueryKey::Profile(user_id)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::AllItems => write!(f, "feed:all"),
            QueryKey::FollowingOnly => write!(f, "feed:following"),
            QueryKey::Profile(user_id) => write!(f, "profile:{user_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_keys_compare_by_owner() {
        let alice = UserId::new("alice").unwrap();
        let bob = UserId::new("bob").unwrap();

        assert_eq!(
            QueryKey::profile(alice.clone()),
            QueryKey::profile(alice.clone())
        );
        assert_ne!(QueryKey::profile(alice), QueryKey::profile(bob));
        assert_ne!(QueryKey::AllItems, QueryKey::FollowingOnly);
    }

    #[test]
    fn serializes_with_explicit_tag() {
        let key = QueryKey::profile(UserId::new("alice").unwrap());
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "profile", "user_id": "alice"}));

        let all = serde_json::to_value(QueryKey::AllItems).unwrap();
        assert_eq!(all, serde_json::json!({"kind": "all_items"}));
    }
}
