//! # Spatial Ingestor Bootstrap
//!
//! Wires the orchestration components around one shared configuration, one
//! set of catalog collaborators and one event publisher.
//!
//! The host supplies the catalog side ([`Collaborators`]); the microservice
//! client is either supplied too or built from the configuration.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::admission::AdmissionFilter;
use super::bulk::BulkMaintenance;
use super::callback_handler::CallbackHandler;
use super::dispatcher::EventDispatcher;
use super::ingest_trigger::IngestTrigger;
use super::job_submitter::JobSubmitter;
use super::purge_coordinator::PurgeCoordinator;
use super::status_poller::StatusPoller;
use crate::catalog::{AccessPolicy, CatalogClient, InMemoryCatalog, TaskStatusStore};
use crate::config::{ConfigLoader, IngestorConfig};
use crate::error::Result;
use crate::events::EventPublisher;
use crate::logging::init_structured_logging;
use crate::microservice::{IngestorHttpClient, IngestorService};

/// External systems the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogClient>,
    pub tasks: Arc<dyn TaskStatusStore>,
    pub access: Arc<dyn AccessPolicy>,
    pub service: Arc<dyn IngestorService>,
}

impl Collaborators {
    /// One in-memory catalog playing every catalog-side role
    pub fn in_memory(catalog: Arc<InMemoryCatalog>, service: Arc<dyn IngestorService>) -> Self {
        Self {
            catalog: catalog.clone(),
            tasks: catalog.clone(),
            access: catalog,
            service,
        }
    }

    /// Catalog-side collaborators plus an HTTP client for the microservice
    pub fn with_http_service(
        config: &IngestorConfig,
        catalog: Arc<dyn CatalogClient>,
        tasks: Arc<dyn TaskStatusStore>,
        access: Arc<dyn AccessPolicy>,
    ) -> Result<Self> {
        Ok(Self {
            catalog,
            tasks,
            access,
            service: Arc::new(IngestorHttpClient::new(config)?),
        })
    }
}

/// Summary of a running orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub microservice_configured: bool,
    pub auto_ingest: bool,
    pub event_subscribers: usize,
    pub config_issues: Vec<String>,
}

/// Fully wired orchestrator
pub struct SpatialIngestor {
    config: Arc<IngestorConfig>,
    event_publisher: EventPublisher,
    admission: Arc<AdmissionFilter>,
    submitter: Arc<JobSubmitter>,
    callbacks: CallbackHandler,
    poller: StatusPoller,
    purger: Arc<PurgeCoordinator>,
    trigger: Arc<IngestTrigger>,
    dispatcher: EventDispatcher,
    maintenance: BulkMaintenance,
}

impl SpatialIngestor {
    pub fn new(config: Arc<IngestorConfig>, collaborators: Collaborators) -> Self {
        Self::with_publisher(config, collaborators, EventPublisher::default())
    }

    pub fn with_publisher(
        config: Arc<IngestorConfig>,
        collaborators: Collaborators,
        event_publisher: EventPublisher,
    ) -> Self {
        let Collaborators {
            catalog,
            tasks,
            access,
            service,
        } = collaborators;

        let issues = config.validate();
        if !issues.is_empty() {
            warn!(issues = ?issues, "Spatial ingestor configuration is incomplete");
        }

        let admission = Arc::new(AdmissionFilter::new(config.clone(), catalog.clone()));
        let submitter = Arc::new(JobSubmitter::new(
            config.clone(),
            catalog.clone(),
            tasks.clone(),
            access.clone(),
            service.clone(),
            event_publisher.clone(),
        ));
        let callbacks = CallbackHandler::new(
            catalog.clone(),
            tasks.clone(),
            access.clone(),
            submitter.clone(),
            event_publisher.clone(),
        );
        let poller = StatusPoller::new(config.clone(), tasks, access, service);
        let purger = Arc::new(PurgeCoordinator::new(
            catalog.clone(),
            submitter.clone(),
            event_publisher.clone(),
        ));
        let trigger = Arc::new(IngestTrigger::new(
            catalog.clone(),
            admission.clone(),
            submitter.clone(),
            event_publisher.clone(),
        ));
        let dispatcher = EventDispatcher::new(
            config.clone(),
            admission.clone(),
            trigger.clone(),
            purger.clone(),
        );
        let maintenance =
            BulkMaintenance::new(config.clone(), catalog, trigger.clone(), purger.clone());

        info!(
            auto_ingest = config.auto_ingest,
            microservice = config.microservice_url.as_deref().unwrap_or("<unset>"),
            "Spatial ingestor initialized"
        );

        Self {
            config,
            event_publisher,
            admission,
            submitter,
            callbacks,
            poller,
            purger,
            trigger,
            dispatcher,
            maintenance,
        }
    }

    /// Load configuration from `path` (plus environment overrides) and wire
    /// the HTTP microservice client around the given catalog collaborators
    pub fn bootstrap(
        path: Option<&Path>,
        catalog: Arc<dyn CatalogClient>,
        tasks: Arc<dyn TaskStatusStore>,
        access: Arc<dyn AccessPolicy>,
    ) -> Result<Self> {
        init_structured_logging();
        let config = ConfigLoader::load(path)?;
        let collaborators = Collaborators::with_http_service(&config, catalog, tasks, access)?;
        Ok(Self::new(config, collaborators))
    }

    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }

    pub fn event_publisher(&self) -> &EventPublisher {
        &self.event_publisher
    }

    pub fn admission(&self) -> &AdmissionFilter {
        &self.admission
    }

    pub fn submitter(&self) -> &JobSubmitter {
        &self.submitter
    }

    pub fn callbacks(&self) -> &CallbackHandler {
        &self.callbacks
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub fn purger(&self) -> &PurgeCoordinator {
        &self.purger
    }

    pub fn trigger(&self) -> &IngestTrigger {
        &self.trigger
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn maintenance(&self) -> &BulkMaintenance {
        &self.maintenance
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            microservice_configured: self.config.microservice_base().is_ok(),
            auto_ingest: self.config.auto_ingest,
            event_subscribers: self.event_publisher.subscriber_count(),
            config_issues: self.config.validate(),
        }
    }
}
