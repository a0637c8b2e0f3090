//! HTTP implementations of the pipeline collaborator traits.
//!
//! - [`HttpPrintProvider`]: provider API client with OAuth2
//!   client-credentials auth and an instance-owned token cache.
//! - [`HttpObjectStorage`]: artifact storage under sha256 content keys.
//! - [`HttpLicenseGate`]: feature checks against a membership service.

pub mod config;
pub mod licensing;
pub mod provider;
pub mod storage;
pub mod token;

pub use config::{LicenseConfig, ProviderConfig, StorageConfig};
pub use licensing::HttpLicenseGate;
pub use provider::HttpPrintProvider;
pub use storage::HttpObjectStorage;
pub use token::TokenCache;
