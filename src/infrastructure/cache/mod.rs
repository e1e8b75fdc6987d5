pub mod cache_event;
pub mod feed_cache;
pub mod feed_entries;

pub use cache_event::CacheEvent;
pub use feed_cache::FeedCache;
pub use feed_entries::{FeedEntries, LoadStart, LoadTicket};
