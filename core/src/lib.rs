//! # pipeline-core
//!
//! Controller library shared by the `dp2` and `dp2admin` command-line
//! clients for a DAISY Pipeline 2 web service: bring-up, script catalog
//! discovery and command synthesis, and the job execution engine.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_core::bringup::ensure_alive;
//! use pipeline_core::client::HttpServiceClient;
//! use pipeline_core::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new();
//!     let mut client = HttpServiceClient::new(config.url(), config.timeout_seconds())?;
//!     let facts = ensure_alive(&mut client, &config).await?;
//!     println!("server version {}", facts.version);
//!     Ok(())
//! }
//! ```

pub mod bringup;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod persist;
pub mod synth;
pub mod uri;

pub use client::{HttpServiceClient, ServiceClient};
pub use config::Config;
pub use error::PipelineError;
