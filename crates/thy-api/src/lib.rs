#![doc = include_str!("../README.md")]

mod configuration;
mod error;
mod transport;

pub use configuration::{ApiConfiguration, ResourceLocator, DEFAULT_DOMAIN, SUFFIX_DESCRIPTION};
pub use error::ApiError;
pub use reqwest::{Method, StatusCode};
pub use transport::{HttpTransport, Transport};
