pub mod error;
pub mod extract;
pub mod fallback;
pub mod pipeline;
pub mod provider;
pub mod scheduler;
pub mod store;
