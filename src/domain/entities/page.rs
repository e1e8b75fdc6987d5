use super::Item;
use crate::domain::value_objects::FeedCursor;
use serde::{Deserialize, Serialize};

/// サーバー順の投稿列と継続カーソル
///
/// `next_cursor` が `None` のページが終端。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub next_cursor: Option<FeedCursor>,
}

impl Page {
    pub fn new(items: Vec<Item>, next_cursor: Option<FeedCursor>) -> Self {
        Self { items, next_cursor }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_cursor.is_none()
    }
}
