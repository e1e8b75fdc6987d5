pub mod cache;
pub mod journal;
pub mod remote;
pub mod session;
