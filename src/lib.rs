pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod operations;
pub mod paging;
