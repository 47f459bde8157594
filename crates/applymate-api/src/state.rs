//! Application state wiring all services together.
//!
//! The core services are generic over the record store and the image
//! extractor; AppState pins them to the configured infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use applymate_core::agent::coordinator::TurnCoordinator;
use applymate_core::agent::engine::{AgentLoop, LoopSettings};
use applymate_core::inbound::InboundPipeline;
use applymate_core::llm::credential_pool::CredentialPool;
use applymate_core::memory::conversation::ConversationStore;
use applymate_core::tools::set::ToolSet;
use applymate_core::vision::model::VisionExtractor;
use applymate_infra::llm::build_credential_pool;
use applymate_infra::secret::EnvSecrets;
use applymate_infra::store::{ConfiguredRecordStore, open_record_store};
use applymate_infra::transport::WebhookTransport;
use applymate_types::config::AppConfig;

pub type ConcreteCoordinator = TurnCoordinator<ConfiguredRecordStore>;
pub type ConcreteInbound = InboundPipeline<ConfiguredRecordStore, VisionExtractor>;

/// Shared application state, used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: Arc<CredentialPool>,
    pub coordinator: Arc<ConcreteCoordinator>,
    pub inbound: Arc<ConcreteInbound>,
    pub transport: Arc<WebhookTransport>,
    /// Canonical media directory.
    pub media_dir: PathBuf,
    /// Cancelled on shutdown; aborts in-flight turns.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Read secrets, open the record store and wire the services.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let secrets = EnvSecrets::from_env();
        let pool = Arc::new(build_pool(&config, &secrets)?);
        let store = open_record_store(&config.store, &secrets)?;

        let agent = AgentLoop::new(
            pool.clone(),
            Arc::new(ToolSet::new(store)),
            LoopSettings::from_config(&config.llm, &config.agent),
        );
        let shutdown = CancellationToken::new();
        let coordinator = Arc::new(TurnCoordinator::new(
            agent,
            ConversationStore::new(),
            &config.agent,
            shutdown.clone(),
        ));

        let extractor = Arc::new(VisionExtractor::new(pool.clone(), &config.llm));
        let inbound = Arc::new(InboundPipeline::new(coordinator.clone(), extractor));
        let transport = Arc::new(WebhookTransport::new(&config.transport)?);

        tokio::fs::create_dir_all(&config.server.media_dir).await?;
        let media_dir = tokio::fs::canonicalize(&config.server.media_dir).await?;

        tracing::info!(
            credentials = pool.len(),
            store = ?config.store.backend,
            transport_ready = transport.is_ready(),
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            pool,
            coordinator,
            inbound,
            transport,
            media_dir,
            shutdown,
        })
    }
}

/// Build the credential pool alone (no store, no transport).
pub fn build_pool(config: &AppConfig, secrets: &EnvSecrets) -> anyhow::Result<CredentialPool> {
    Ok(build_credential_pool(
        secrets.require_api_keys()?,
        &config.llm,
        config.limits,
    )?)
}
