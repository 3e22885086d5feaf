pub mod client;
pub mod error;
pub mod payload;
pub mod pipeline;
pub mod retry;
