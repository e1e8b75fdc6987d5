use crate::application::ports::feed_transport::{
    CreatedItem, FeedPage, FeedTransport, ToggleLikeResponse,
};
use crate::domain::entities::{Author, Item};
use crate::domain::value_objects::{FeedCursor, ItemId, QueryKey, UserId};
use crate::shared::error::TransportError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    FetchPage,
    ToggleLike,
    CreateItem,
}

/// `<created_at_millis>:<item_id>` 形式のページングカーソル
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerCursor {
    created_at: i64,
    item_id: String,
}

impl ServerCursor {
    fn parse(cursor: &str) -> Option<Self> {
        let mut parts = cursor.splitn(2, ':');
        let created_at = parts.next()?.parse().ok()?;
        let item_id = parts.next()?.to_string();
        if item_id.is_empty() {
            return None;
        }
        Some(Self {
            created_at,
            item_id,
        })
    }
}

impl fmt::Display for ServerCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.created_at, self.item_id)
    }
}

#[derive(Debug, Clone)]
struct StoredPost {
    id: ItemId,
    created_at: DateTime<Utc>,
    content: String,
    author_id: UserId,
}

impl StoredPost {
    fn sort_key(&self) -> (i64, &str) {
        (self.created_at.timestamp_millis(), self.id.as_str())
    }
}

#[derive(Default)]
struct ServerState {
    posts: Vec<StoredPost>,
    users: HashMap<UserId, Author>,
    likes: HashSet<(ItemId, UserId)>,
    follows: HashSet<(UserId, UserId)>,
    viewer: Option<UserId>,
    failures: HashMap<RemoteOperation, VecDeque<TransportError>>,
    calls: HashMap<RemoteOperation, usize>,
}

impl ServerState {
    fn record_call(&mut self, operation: RemoteOperation) -> Result<(), TransportError> {
        *self.calls.entry(operation).or_default() += 1;
        match self
            .failures
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front())
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_viewer(&self) -> Result<UserId, TransportError> {
        self.viewer
            .clone()
            .ok_or_else(|| TransportError::Unauthorized("sign in required".to_string()))
    }

    fn matches(&self, post: &StoredPost, query: &QueryKey, viewer: Option<&UserId>) -> bool {
        match query {
            QueryKey::AllItems => true,
            QueryKey::FollowingOnly => viewer.is_some_and(|viewer| {
                self.follows
                    .contains(&(viewer.clone(), post.author_id.clone()))
            }),
            QueryKey::Profile(user_id) => &post.author_id == user_id,
        }
    }

    fn materialize(&self, post: &StoredPost) -> Item {
        let like_count = self
            .likes
            .iter()
            .filter(|(item_id, _)| item_id == &post.id)
            .count();
        let liked_by_me = self
            .viewer
            .as_ref()
            .is_some_and(|viewer| self.likes.contains(&(post.id.clone(), viewer.clone())));
        let author = self
            .users
            .get(&post.author_id)
            .cloned()
            .unwrap_or_else(|| Author::new(post.author_id.clone()));

        Item::new(
            post.id.clone(),
            post.created_at,
            post.content.clone(),
            author,
        )
        .with_likes(u32::try_from(like_count).unwrap_or(u32::MAX), liked_by_me)
    }
}

/// 検証用のインメモリなリモート実装
///
/// サインイン中のユーザーとして振る舞い、投稿を新しい順にページングして返す。
#[derive(Clone)]
pub struct InMemoryFeedServer {
    state: Arc<RwLock<ServerState>>,
    page_size: usize,
}

impl InMemoryFeedServer {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(ServerState::default())),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub async fn register_user(&self, author: Author) {
        let mut state = self.state.write().await;
        state.users.insert(author.id.clone(), author);
    }

    pub async fn sign_in(&self, user_id: UserId) {
        self.state.write().await.viewer = Some(user_id);
    }

    pub async fn sign_out(&self) {
        self.state.write().await.viewer = None;
    }

    pub async fn follow(&self, follower: UserId, followed: UserId) {
        self.state.write().await.follows.insert((follower, followed));
    }

    /// 投稿を直接登録する
    pub async fn seed_post(
        &self,
        author_id: UserId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> ItemId {
        let id = new_item_id();
        let mut state = self.state.write().await;
        state.posts.push(StoredPost {
            id: id.clone(),
            created_at,
            content: content.into(),
            author_id,
        });
        id
    }

    pub async fn seed_like(&self, item_id: ItemId, user_id: UserId) {
        self.state.write().await.likes.insert((item_id, user_id));
    }

    /// 次回の `operation` 呼び出しを `err` で失敗させる
    pub async fn fail_next(&self, operation: RemoteOperation, err: TransportError) {
        let mut state = self.state.write().await;
        state.failures.entry(operation).or_default().push_back(err);
    }

    pub async fn call_count(&self, operation: RemoteOperation) -> usize {
        let state = self.state.read().await;
        state.calls.get(&operation).copied().unwrap_or_default()
    }

    pub async fn item(&self, item_id: &ItemId) -> Option<Item> {
        let state = self.state.read().await;
        state
            .posts
            .iter()
            .find(|post| &post.id == item_id)
            .map(|post| state.materialize(post))
    }
}

fn new_item_id() -> ItemId {
    ItemId::from_uuid(Uuid::new_v4())
}

#[async_trait]
impl FeedTransport for InMemoryFeedServer {
    async fn fetch_page(
        &self,
        query: &QueryKey,
        cursor: Option<&FeedCursor>,
    ) -> Result<FeedPage, TransportError> {
        let mut state = self.state.write().await;
        state.record_call(RemoteOperation::FetchPage)?;

        let viewer = state.viewer.clone();
        if query == &QueryKey::FollowingOnly && viewer.is_none() {
            return Err(TransportError::Unauthorized(
                "following feed requires sign in".to_string(),
            ));
        }

        let cursor = match cursor {
            Some(raw) => Some(ServerCursor::parse(raw.as_str()).ok_or_else(|| {
                TransportError::Rejected(format!("invalid cursor: {raw}"))
            })?),
            None => None,
        };

        let mut matching: Vec<&StoredPost> = state
            .posts
            .iter()
            .filter(|post| state.matches(post, query, viewer.as_ref()))
            .filter(|post| match &cursor {
                Some(cursor) => post.sort_key() < (cursor.created_at, cursor.item_id.as_str()),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

        let has_more = matching.len() > self.page_size;
        matching.truncate(self.page_size);

        let items: Vec<Item> = matching.iter().map(|post| state.materialize(post)).collect();
        let next_cursor = if has_more {
            matching.last().map(|post| {
                FeedCursor::new(
                    ServerCursor {
                        created_at: post.created_at.timestamp_millis(),
                        item_id: post.id.to_string(),
                    }
                    .to_string(),
                )
            })
        } else {
            None
        };

        debug!(view = %query, count = items.len(), has_more, "Served feed page");
        Ok(FeedPage { items, next_cursor })
    }

    async fn request_toggle_like(
        &self,
        item_id: &ItemId,
    ) -> Result<ToggleLikeResponse, TransportError> {
        let mut state = self.state.write().await;
        state.record_call(RemoteOperation::ToggleLike)?;
        let viewer = state.require_viewer()?;

        if !state.posts.iter().any(|post| &post.id == item_id) {
            return Err(TransportError::Rejected(format!("unknown item: {item_id}")));
        }

        let key = (item_id.clone(), viewer);
        let added_like = if state.likes.remove(&key) {
            false
        } else {
            state.likes.insert(key);
            true
        };
        Ok(ToggleLikeResponse { added_like })
    }

    async fn request_create_item(&self, content: &str) -> Result<CreatedItem, TransportError> {
        let mut state = self.state.write().await;
        state.record_call(RemoteOperation::CreateItem)?;
        let viewer = state.require_viewer()?;

        if content.trim().is_empty() {
            return Err(TransportError::Rejected("content is empty".to_string()));
        }

        let id = new_item_id();
        let created_at = Utc::now();
        state.posts.push(StoredPost {
            id: id.clone(),
            created_at,
            content: content.to_string(),
            author_id: viewer,
        });
        Ok(CreatedItem { id, created_at })
    }
}
