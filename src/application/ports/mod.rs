pub mod feed_transport;
pub mod session_provider;

pub use feed_transport::{CreatedItem, FeedPage, FeedTransport, ToggleLikeResponse};
pub use session_provider::{SessionProvider, SessionState, Viewer};
