pub mod config;
pub mod db;
pub mod deploy;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod service;
pub mod store;
pub mod testing;
pub mod types;
pub mod validation;
pub mod verify;

pub use config::Config;
pub use error::PortalError;
