//! PixelLab pixel art API client.
//!
//! The [`catalog`] describes every endpoint; [`payload`] validates arguments
//! against it, [`client`] sends the request, [`normalize`] decodes whatever
//! shape comes back and [`output`] puts the images on disk.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod invocation;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod output;
pub mod payload;
pub mod spritesheet;

pub use catalog::{ApiGeneration, EndpointSpec};
pub use client::{Generation, GenerationEndpoint, PixelLabClient};
pub use config::PixelLabConfig;
pub use error::{PixelLabError, Result, TransportErrorKind};
pub use models::{ImageAsset, InvocationResult, UsageReport};
pub use output::Selection;
pub use payload::{RawArgs, RawValue, RequestPayload};
