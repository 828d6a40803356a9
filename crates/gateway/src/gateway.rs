use crate::aggregate::{aggregate, FileSection};
use crate::client::{ChatCompletionsClient, CompletionClient};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use context_scanner::read_many;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that analyzes files and answers questions about them.";

pub type ModelResult = Result<String, GatewayError>;

/// Turns a prompt and a list of root-relative paths into one model answer.
///
/// Every submission is independent: one read per file, one remote call, no
/// retries and no memory of earlier submissions.
#[derive(Clone)]
pub struct ModelGateway {
    root: PathBuf,
    client: Option<Arc<dyn CompletionClient>>,
}

impl ModelGateway {
    pub fn from_config(root: impl Into<PathBuf>, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client: Option<Arc<dyn CompletionClient>> = match &config.api_key {
            Some(key) => {
                let client = ChatCompletionsClient::new(config, key.clone())?;
                log::info!("Model gateway configured: {} ({})", client.endpoint(), config.model);
                Some(Arc::new(client))
            }
            None => {
                log::warn!("Model gateway not configured; submissions are disabled");
                None
            }
        };
        Ok(Self {
            root: root.into(),
            client,
        })
    }

    pub fn with_client(root: impl Into<PathBuf>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            root: root.into(),
            client: Some(client),
        }
    }

    pub fn unconfigured(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            client: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn send(&self, prompt: &str, files: &[String]) -> ModelResult {
        let client = self.client.as_ref().ok_or(GatewayError::NotConfigured)?;
        if prompt.trim().is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }
        if files.is_empty() {
            return Err(GatewayError::EmptySelection);
        }

        let loaded = read_many(&self.root, files)
            .await
            .map_err(|failure| GatewayError::FileRead {
                path: failure.path,
                source: failure.source,
            })?;
        let payload = aggregate(prompt, loaded.into_iter().map(FileSection::from).collect())?;

        log::info!(
            "Submitting prompt ({} chars) with {} files",
            payload.prompt().chars().count(),
            payload.sections().len()
        );
        client.complete(SYSTEM_INSTRUCTION, &payload.render()).await
    }
}
