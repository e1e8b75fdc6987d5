use crate::domain::entities::Author;
use crate::domain::value_objects::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: UserId,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl Viewer {
    pub fn as_author(&self) -> Author {
        Author::new(self.id.clone()).with_profile(self.name.clone(), self.image.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Authenticated(Viewer),
    Unauthenticated,
    Loading,
}

impl SessionState {
    pub fn viewer(&self) -> Option<&Viewer> {
        match self {
            SessionState::Authenticated(viewer) => Some(viewer),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.viewer().is_some()
    }

    /// いいねボタンを操作可能にするか（未認証時は件数表示のみ）
    pub fn can_like(&self) -> bool {
        self.is_authenticated()
    }

    /// 投稿フォームを表示するか
    pub fn can_post(&self) -> bool {
        self.is_authenticated()
    }

    /// フォローボタンを表示するか。自分自身はフォローできない。
    pub fn can_follow(&self, target: &UserId) -> bool {
        self.viewer().is_some_and(|viewer| &viewer.id != target)
    }
}

/// 認証セッションのポート
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current(&self) -> SessionState;
}
