//! Agent factory for creating ModelAgent trait objects from configuration.

use super::{generic::GenericOpenAIAgent, openai::OpenAIAgent, AgentError, ModelAgent};
use crate::config::{EndpointConfig, EndpointType};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

/// Create an agent from one `[[endpoints]]` entry.
///
/// OpenAI endpoints read their key from the environment variable named by
/// `api_key_env` (default `OPENAI_API_KEY`); a missing variable is a
/// configuration error.
///
/// # Examples
///
/// ```
/// use plotwise::agent::factory::create_agent;
/// use plotwise::config::{EndpointConfig, EndpointType};
/// use reqwest::Client;
/// use std::sync::Arc;
///
/// let endpoint = EndpointConfig {
///     name: "local".to_string(),
///     url: "http://localhost:8000".to_string(),
///     endpoint_type: EndpointType::Generic,
///     api_key_env: None,
///     vision: false,
/// };
/// let agent = create_agent(&endpoint, Arc::new(Client::new())).unwrap();
/// assert_eq!(agent.id(), "local");
/// ```
pub fn create_agent(
    endpoint: &EndpointConfig,
    client: Arc<Client>,
) -> Result<Arc<dyn ModelAgent>, AgentError> {
    match endpoint.endpoint_type {
        EndpointType::OpenAI => {
            let env_var = endpoint.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
            let api_key = std::env::var(env_var).map_err(|e| {
                AgentError::Configuration(format!(
                    "Failed to read API key for endpoint '{}' from env var '{}': {}",
                    endpoint.name, env_var, e
                ))
            })?;

            Ok(Arc::new(OpenAIAgent::new(
                endpoint.name.clone(),
                endpoint.name.clone(),
                endpoint.url.clone(),
                api_key,
                client,
            )))
        }
        EndpointType::Generic => Ok(Arc::new(GenericOpenAIAgent::new(
            endpoint.name.clone(),
            endpoint.name.clone(),
            endpoint.url.clone(),
            endpoint.vision,
            client,
        ))),
    }
}

/// Build one agent per endpoint, keyed by endpoint name.
///
/// Endpoints that no stage references are still built so that a missing
/// key surfaces at startup rather than mid-batch.
pub fn create_agents(
    endpoints: &[EndpointConfig],
    client: Arc<Client>,
) -> Result<HashMap<String, Arc<dyn ModelAgent>>, AgentError> {
    endpoints
        .iter()
        .map(|endpoint| {
            create_agent(endpoint, Arc::clone(&client)).map(|a| (endpoint.name.clone(), a))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, endpoint_type: EndpointType, key_env: Option<&str>) -> EndpointConfig {
        EndpointConfig {
            name: name.to_string(),
            url: "http://localhost:8000".to_string(),
            endpoint_type,
            api_key_env: key_env.map(str::to_string),
            vision: true,
        }
    }

    #[test]
    fn test_create_generic_agent() {
        let agent = create_agent(
            &endpoint("local", EndpointType::Generic, None),
            Arc::new(Client::new()),
        )
        .unwrap();

        assert_eq!(agent.id(), "local");
        assert_eq!(agent.profile().backend_type, "generic");
        assert!(agent.profile().capabilities.vision);
    }

    #[test]
    fn test_create_openai_agent_reads_env() {
        std::env::set_var("PLOTWISE_TEST_FACTORY_KEY", "sk-test");
        let agent = create_agent(
            &endpoint("openai", EndpointType::OpenAI, Some("PLOTWISE_TEST_FACTORY_KEY")),
            Arc::new(Client::new()),
        )
        .unwrap();
        std::env::remove_var("PLOTWISE_TEST_FACTORY_KEY");

        assert_eq!(agent.profile().backend_type, "openai");
        assert!(agent.profile().capabilities.image_generation);
    }

    #[test]
    fn test_create_openai_agent_missing_key() {
        let result = create_agent(
            &endpoint("openai", EndpointType::OpenAI, Some("PLOTWISE_TEST_UNSET_KEY_VAR")),
            Arc::new(Client::new()),
        );

        assert!(matches!(result, Err(AgentError::Configuration(ref msg)) if msg.contains("PLOTWISE_TEST_UNSET_KEY_VAR")));
    }

    #[test]
    fn test_create_agents_keys_by_name() {
        let agents = create_agents(
            &[
                endpoint("a", EndpointType::Generic, None),
                endpoint("b", EndpointType::Generic, None),
            ],
            Arc::new(Client::new()),
        )
        .unwrap();

        assert_eq!(agents.len(), 2);
        assert_eq!(agents["b"].id(), "b");
    }
}
