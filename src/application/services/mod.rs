pub mod broadcast;
pub mod cache_effect;
pub mod feed_client;
pub mod feed_loader;
pub mod mutation;
pub mod mutation_dispatcher;

pub use broadcast::{BroadcastTargets, TargetShape};
pub use cache_effect::CacheEffect;
pub use feed_client::FeedClient;
pub use feed_loader::{FeedLoader, LoadOutcome};
pub use mutation::{CreateItem, Mutation, Settlement, ToggleLike};
pub use mutation_dispatcher::MutationDispatcher;
