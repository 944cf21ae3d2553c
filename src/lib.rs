#![allow(clippy::doc_markdown)] // Allow technical terms like PostGIS, GeoServer in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Spatial Ingestor Core
//!
//! Job orchestration between a data catalog and an external spatial-ingestion
//! microservice.
//!
//! ## Overview
//!
//! When a catalog resource holding spatial data (shapefile, KML, KMZ, grid) is
//! created or changed, the orchestrator submits a job to the microservice,
//! tracks the job in a task status record, applies the microservice's status
//! callbacks, resubmits when the resource changed while the job ran, and
//! purges derived artifacts when the parent resource goes away.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Admission, submission, callbacks, status, purge, dispatch
//! - [`catalog`] - Catalog, task status store and access policy seams
//! - [`microservice`] - HTTP client for the ingestor microservice
//! - [`models`] - Resources, packages, task status records, job references
//! - [`state_machine`] - Task states and transitions
//! - [`config`] - Configuration loading and derived connection settings
//! - [`error`] - Structured error handling
//! - [`events`] - In-process lifecycle event publishing
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use spatial_ingestor::catalog::InMemoryCatalog;
//! use spatial_ingestor::config::ConfigLoader;
//! use spatial_ingestor::microservice::IngestorHttpClient;
//! use spatial_ingestor::models::RequestContext;
//! use spatial_ingestor::orchestration::{Collaborators, SpatialIngestor};
//!
//! # async fn example() -> spatial_ingestor::Result<()> {
//! let config = ConfigLoader::load(None)?;
//! let catalog = Arc::new(InMemoryCatalog::new());
//! let service = Arc::new(IngestorHttpClient::new(&config)?);
//! let ingestor = SpatialIngestor::new(config, Collaborators::in_memory(catalog, service));
//!
//! let ctx = RequestContext::for_user("admin");
//! let report = ingestor
//!     .poller()
//!     .get_status(&ctx, "resource-id", spatial_ingestor::models::JobType::SpatialIngest)
//!     .await?;
//! println!("{}", report.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod microservice;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod utils;

pub use catalog::{AccessPolicy, CatalogClient, InMemoryCatalog, Permission, TaskStatusStore};
pub use config::{ConfigLoader, ConnectionParams, IngestorConfig};
pub use error::{Result, SpatialIngestorError};
pub use events::{EventPublisher, PublishedEvent};
pub use microservice::{IngestorHttpClient, IngestorService, JobRequest};
pub use models::{JobReference, JobType, RequestContext, Resource, TaskError, TaskStatus};
pub use orchestration::{
    CallbackOutcome, CallbackPayload, Collaborators, DispatchOutcome, JobStatusReport,
    PurgeReport, ResourceEvent, SpatialIngestor, SubmitOutcome, SubmitRequest,
};
pub use state_machine::TaskState;
