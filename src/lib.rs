//! Marketplace AI
//!
//! The AI layer of a home-services marketplace: search enhancement, expert
//! matching, material recommendations, image analysis and voice
//! transcription, plus a combined catalog search over providers, materials
//! and jobs.
//!
//! Every feature returns an [`Envelope`]: `{"success": true, "data": ...}`
//! or `{"success": false, "error": {"kind", "message"}}` with the message
//! localized to the caller's language. Outbound calls go through a shared
//! [`RequestExecutor`] with a per-attempt timeout and bounded exponential
//! backoff. Each feature can answer from bundled fixtures instead of calling
//! upstream, chosen per feature at construction.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use marketplace_ai::{MarketplaceClient, MarketplaceConfig};
//! use marketplace_ai::types::experts::ExpertMatchRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketplaceClient::builder()
//!         .config(MarketplaceConfig::from_env()?)
//!         .build()?;
//!
//!     let envelope = client
//!         .experts()
//!         .match_experts(
//!             &ExpertMatchRequest::new("Replace the kitchen backsplash")
//!                 .location("Austin, TX")
//!                 .budget(1500.0)
//!                 .language("fr-CA"),
//!         )
//!         .await;
//!
//!     match envelope.into_result() {
//!         Ok(matches) => println!("{}", matches.summary),
//!         Err(error) => eprintln!("{}: {}", error.kind, error.message),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod fixtures;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod services;
pub mod transport;
pub mod types;

pub use client::{MarketplaceClient, MarketplaceClientBuilder};
pub use config::{FeatureModes, MarketplaceConfig, MarketplaceConfigBuilder};
pub use errors::{ErrorInfo, ErrorKind, MarketplaceError, MarketplaceResult};
pub use executor::{RequestExecutor, RequestOptions};
pub use services::ServiceMode;
pub use types::envelope::Envelope;
pub use types::language::LanguageTag;

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
