//! Application container for testgenie

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::OutputContext;
use crate::error::{TestGenieError, TestGenieResult};
use crate::infra::remote::{GenerationService, HttpGenerationClient, IssueTracker, JiraClient};
use crate::models::config::TestGenieConfig;
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::context::find_project_root;
use crate::services::detector::{ContextDetector, DefaultContextDetector};
use crate::services::extractor::DefaultSymbolExtractor;
use crate::services::interaction::Interaction;
use crate::services::orchestrator::Orchestrator;
use crate::services::writer::AtomicFileWriter;

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) config: TestGenieConfig,
    pub(crate) extractor: Arc<DefaultSymbolExtractor>,
    pub(crate) detector: Arc<dyn ContextDetector>,
}

impl App {
    pub async fn new() -> anyhow::Result<Self> {
        Self::load(true).await
    }

    /// `strict` surfaces config errors; otherwise defaults are used so that
    /// `config init --force` can repair a broken file.
    pub async fn load(strict: bool) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = find_project_root(&cwd);

        tracing::debug!("Initializing testgenie at {:?}", root);

        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = match config_service.load(false).await {
            Ok(config) => config,
            Err(e) if !strict => {
                tracing::warn!("Using default configuration: {}", e);
                TestGenieConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            output: OutputContext::new(root.clone()),
            root,
            config_service,
            config,
            extractor: Arc::new(DefaultSymbolExtractor::new()),
            detector: Arc::new(DefaultContextDetector::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TestGenieConfig {
        &self.config
    }

    /// Wire an orchestrator around `interaction`.
    ///
    /// The API key is checked here so a missing key fails before any gate.
    pub fn orchestrator(&self, interaction: Arc<dyn Interaction>) -> TestGenieResult<Orchestrator> {
        if self.config.generation.require_api_key().is_none() {
            return Err(TestGenieError::Precondition(
                "OpenAI API key is not configured. Set generation.api_key in the config file \
                 or the OPENAI_API_KEY environment variable."
                    .to_string(),
            ));
        }

        let generator: Arc<dyn GenerationService> =
            Arc::new(HttpGenerationClient::new(&self.config.generation)?);

        let tracker = match self.config.tracker.credentials() {
            Some(credentials) => {
                let client = JiraClient::new(credentials, self.config.generation.timeout_secs)?;
                Some(Arc::new(client) as Arc<dyn IssueTracker>)
            }
            None => None,
        };

        tracing::info!(
            "Generation service at {} (tracker: {})",
            self.config.generation.backend_url,
            if tracker.is_some() { "configured" } else { "none" }
        );

        Ok(Orchestrator::new(
            self.extractor.clone(),
            self.detector.clone(),
            generator,
            Arc::new(AtomicFileWriter::new()),
            interaction,
        )
        .with_tracker(tracker))
    }
}
