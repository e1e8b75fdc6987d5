//! ソーシャルフィードクライアントの楽観的ページングキャッシュ

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    CreatedItem, FeedPage, FeedTransport, SessionProvider, SessionState, ToggleLikeResponse,
    Viewer,
};
pub use application::services::{FeedClient, FeedLoader, LoadOutcome, MutationDispatcher};
pub use domain::entities::{Author, CacheEntry, EntryStatus, FeedSnapshot, Item, Page};
pub use domain::value_objects::{FeedCursor, ItemId, QueryKey, UserId};
pub use infrastructure::cache::{CacheEvent, FeedCache};
pub use shared::{AppConfig, AppError, Result, ToggleFailurePolicy, TransportError};
