pub mod feed_cursor;
pub mod item_id;
pub mod mutation_id;
pub mod query_key;
pub mod user_id;

pub use feed_cursor::FeedCursor;
pub use item_id::ItemId;
pub use mutation_id::MutationId;
pub use query_key::QueryKey;
pub use user_id::UserId;
