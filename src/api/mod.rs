pub mod client;
#[cfg(test)]
pub mod testserver;
pub mod types;
pub mod upload;

pub use client::{ApiClient, CredentialProvider, FileTokenStore};
pub use types::{BarcodeInfo, ProcessedResult};
pub use upload::upload_image;
