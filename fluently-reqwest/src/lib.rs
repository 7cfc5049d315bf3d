#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod transport;

pub use transport::ReqwestTransport;

/// Re-export of the wrapped client type.
pub use reqwest::Client as ReqwestClient;
