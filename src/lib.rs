pub mod config;
pub mod deals;
pub mod outreach;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod server;
pub mod source;
pub mod store;
