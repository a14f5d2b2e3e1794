use async_trait::async_trait;
use clap::ValueEnum;
use rig::{
    client::CompletionClient,
    completion::Chat,
    providers::{openai, openrouter},
};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} not set")]
    MissingApiKey(&'static str),

    #[error("completion request failed: {0}")]
    Request(String),
}

/// Which hosted completion API to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LlmProvider {
    #[default]
    Openai,
    Openrouter,
}

impl LlmProvider {
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::Openai => "OPENAI_API_KEY",
            LlmProvider::Openrouter => "OPENROUTER_API_KEY",
        }
    }
}

/// A single system + user exchange
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Outbound text-completion boundary
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// [`CompletionService`] backed by rig agents
pub struct RigCompletionService {
    provider: LlmProvider,
    api_key: String,
}

impl RigCompletionService {
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
        }
    }

    pub fn from_env(provider: LlmProvider) -> Result<Self, LlmError> {
        let var = provider.api_key_var();
        let api_key = std::env::var(var).map_err(|_| LlmError::MissingApiKey(var))?;
        Ok(Self::new(provider, api_key))
    }
}

#[async_trait]
impl CompletionService for RigCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(
            provider = ?self.provider,
            model = %request.model,
            prompt_length = request.user.len(),
            "sending completion request"
        );

        let response = match self.provider {
            LlmProvider::Openai => {
                let client = openai::Client::new(&self.api_key);
                let mut builder = client.agent(&request.model).preamble(&request.system);
                if let Some(temperature) = request.temperature {
                    builder = builder.temperature(temperature);
                }
                let agent = builder.build();
                agent.chat(request.user.clone(), vec![]).await
            }
            LlmProvider::Openrouter => {
                let client = openrouter::Client::new(&self.api_key);
                let mut builder = client.agent(&request.model).preamble(&request.system);
                if let Some(temperature) = request.temperature {
                    builder = builder.temperature(temperature);
                }
                let agent = builder.build();
                agent.chat(request.user.clone(), vec![]).await
            }
        };

        response.map_err(|e| {
            error!(model = %request.model, error = %e, "completion request failed");
            LlmError::Request(e.to_string())
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_name_their_key_variable() {
        assert_eq!(LlmProvider::Openai.api_key_var(), "OPENAI_API_KEY");
        assert_eq!(LlmProvider::Openrouter.api_key_var(), "OPENROUTER_API_KEY");
    }

    #[test]
    fn requests_carry_an_optional_temperature() {
        let request = CompletionRequest::new("gpt-4", "system", "user");
        assert_eq!(request.temperature, None);
        assert_eq!(request.with_temperature(0.3).temperature, Some(0.3));
    }
}
