//! HTTP side of the estate admin panel: talks to the content backend's
//! document and image endpoints.

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

pub use client::HttpContentClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
