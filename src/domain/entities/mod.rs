pub mod cache_entry;
pub mod item;
pub mod mutation_record;
pub mod page;

pub use cache_entry::{CacheEntry, EntryStatus, FeedSnapshot};
pub use item::{Author, Item};
pub use mutation_record::{MutationKind, MutationRecord, MutationState};
pub use page::Page;
