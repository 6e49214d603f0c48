//! IPFS Site Deployment
//!
//! Uploads a static site directory to IPFS through a pinning service and
//! points a w3name IPNS record at the resulting content identifier.
//!
//! The flow is a strictly linear pipeline:
//! walk → upload → resolve → publish → report.

pub mod cli;
pub mod config;
pub mod errors;
pub mod name;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod upload;
pub mod walker;

pub use config::{DeployConfig, LogFormat, UnavailablePolicy};
pub use errors::*;
pub use name::{IpnsName, NameKey, NamePublisher, NameService, Resolution, Revision};
pub use pipeline::{DeployPipeline, Stage};
pub use report::PublishReport;
pub use types::*;
pub use upload::{ContentUploader, PinataUploader};
pub use walker::walk_directory;
