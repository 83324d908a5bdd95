pub mod cache;
pub mod client;
pub mod http;
pub mod in_process;
pub mod optimistic;
pub mod remote;

pub use cache::{CacheConfig, ListCache};
pub use client::{CachedPage, TaskClient};
pub use http::HttpRemote;
pub use in_process::InProcessRemote;
pub use optimistic::OptimisticUpdates;
pub use remote::{RemoteError, TaskRemote};
