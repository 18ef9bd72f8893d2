pub mod auth;
pub mod config;
pub mod endpoint;
pub mod question;
pub mod request;
