pub mod client;
pub mod reply;

pub use client::DownstreamClient;
pub use reply::parse_reply;
