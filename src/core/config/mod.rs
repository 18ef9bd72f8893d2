pub mod data;
pub mod io;
pub mod keys;

pub use data::{Config, Environment};
pub use io::ConfigError;
