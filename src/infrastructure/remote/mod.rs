pub mod in_memory_server;

pub use in_memory_server::{InMemoryFeedServer, RemoteOperation};
