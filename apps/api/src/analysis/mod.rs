pub mod export;
pub mod format;
pub mod generator;
pub mod handlers;
pub mod metrics;
pub mod prompts;
