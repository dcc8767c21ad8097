// ABOUTME: Main library entry point for the panelfeed transport layer.
// ABOUTME: Re-exports the public API: TransportResolver, ResolverBuilder, RelayStrategy, TransportError.

//! Resilient retrieval of feed documents.
//!
//! A [`TransportResolver`] tries the target URL directly and, when that fails,
//! walks an ordered list of [`RelayStrategy`] values until one succeeds.
//!
//! # Example
//!
//! ```no_run
//! use panelfeed_transport::{TransportError, TransportResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TransportError> {
//!     let resolver = TransportResolver::builder().build()?;
//!     let xml = resolver.fetch("https://xkcd.com/atom.xml").await?;
//!     println!("{} bytes", xml.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod options;
pub mod relay;
pub mod resolver;
pub mod resource;

pub use crate::error::{ErrorCode, TransportError};
pub use crate::options::{ResolverBuilder, TransportOptions};
pub use crate::relay::{RelayStrategy, DEFAULT_RELAY_TEMPLATES};
pub use crate::resolver::TransportResolver;
pub use crate::resource::{FetchResult, MAX_CONTENT_LENGTH};
