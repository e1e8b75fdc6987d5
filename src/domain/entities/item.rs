use crate::domain::value_objects::{ItemId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl Author {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            image: None,
        }
    }

    pub fn with_profile(mut self, name: Option<String>, image: Option<String>) -> Self {
        self.name = name;
        self.image = image;
        self
    }
}

/// フィード上の1投稿
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub author: Author,
    pub like_count: u32,
    pub liked_by_me: bool,
}

impl Item {
    pub fn new(id: ItemId, created_at: DateTime<Utc>, content: String, author: Author) -> Self {
        Self {
            id,
            created_at,
            content,
            author,
            like_count: 0,
            liked_by_me: false,
        }
    }

    pub fn with_likes(mut self, like_count: u32, liked_by_me: bool) -> Self {
        self.like_count = like_count;
        self.liked_by_me = liked_by_me;
        self
    }

    /// いいね状態を `liked` に揃える
    ///
    /// 既に同じ状態なら何もしない。状態が変わった場合のみ件数を1増減し、`true` を返す。
    pub fn set_liked(&mut self, liked: bool) -> bool {
        if self.liked_by_me == liked {
            return false;
        }
        self.liked_by_me = liked;
        if liked {
            self.like_count = self.like_count.saturating_add(1);
        } else {
            self.like_count = self.like_count.saturating_sub(1);
        }
        true
    }
}
