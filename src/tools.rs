use std::str::FromStr;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tokio::sync::RwLock;

use crate::client::PerplexityClient;
use crate::models::ModelRegistry;
use crate::settings::{SessionCookies, SettingsStore};

// ============================================================================
// Tool names and arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    PerplexityAsk,
    PerplexityListModels,
    PerplexitySetCookies,
}

impl ToolName {
    pub fn description(&self) -> &'static str {
        match self {
            Self::PerplexityAsk => {
                "Ask Perplexity AI a question with real-time web search. Returns an answer synthesized from multiple online sources."
            }
            Self::PerplexityListModels => "List all available Perplexity AI models",
            Self::PerplexitySetCookies => {
                "Set Perplexity cookies for authentication. Get these from browser DevTools after logging into perplexity.ai"
            }
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AskArgs {
    /// The question to ask Perplexity
    pub query: String,
    /// Model to use
    #[serde(default, deserialize_with = "model_key")]
    pub model: Option<String>,
}

/// Reads an optional model key. Values that are not strings count as absent
/// so the registry default applies.
pub(crate) fn model_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(key)) => Ok(Some(key)),
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListModelsArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetCookiesArgs {
    /// The cookie string from browser DevTools
    pub cookies: String,
}

// ============================================================================
// Definitions and results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {}", message.into()),
            }],
            is_error: true,
        }
    }

    /// Concatenated text of all content parts.
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({}));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("properties").or_insert_with(|| json!({}));
    }
    schema
}

// ============================================================================
// Tool host
// ============================================================================

/// Dispatch table for the agent-facing tools. Holds the live client, which is
/// swapped whenever new cookies are stored.
pub struct ToolHost {
    client: RwLock<Arc<PerplexityClient>>,
    settings: SettingsStore,
    registry: ModelRegistry,
}

impl ToolHost {
    pub fn new(client: PerplexityClient, settings: SettingsStore, registry: ModelRegistry) -> Self {
        Self {
            client: RwLock::new(Arc::new(client)),
            settings,
            registry,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub async fn client(&self) -> Arc<PerplexityClient> {
        Arc::clone(&*self.client.read().await)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolName::iter()
            .map(|name| ToolDefinition {
                name: name.to_string(),
                description: name.description().to_string(),
                input_schema: self.input_schema(name),
            })
            .collect()
    }

    fn input_schema(&self, name: ToolName) -> Value {
        match name {
            ToolName::PerplexityAsk => {
                let mut schema = schema_of::<AskArgs>();
                let keys = self.registry.keys();
                schema["properties"]["model"] = json!({
                    "type": "string",
                    "description": format!(
                        "Model to use: {}. Default: {}",
                        keys.join(", "),
                        crate::models::DEFAULT_MODEL_KEY
                    ),
                    "enum": keys,
                });
                schema
            }
            ToolName::PerplexityListModels => schema_of::<ListModelsArgs>(),
            ToolName::PerplexitySetCookies => schema_of::<SetCookiesArgs>(),
        }
    }

    /// Runs a tool by name. Failures are reported in the output, never raised.
    pub async fn call(&self, name: &str, args: Value) -> ToolOutput {
        let Ok(tool) = ToolName::from_str(name) else {
            log::warn!("Unknown tool requested: {}", name);
            return ToolOutput {
                content: vec![ToolContent::Text {
                    text: format!("Unknown tool: {}", name),
                }],
                is_error: true,
            };
        };
        log::debug!("Calling tool {}", tool);

        let args = if args.is_null() { json!({}) } else { args };
        match tool {
            ToolName::PerplexityAsk => self.ask(args).await,
            ToolName::PerplexityListModels => ToolOutput::text(self.registry.describe()),
            ToolName::PerplexitySetCookies => self.set_cookies(args).await,
        }
    }

    async fn ask(&self, args: Value) -> ToolOutput {
        let client = self.client().await;
        if !client.has_cookies() {
            return ToolOutput::error(
                "no session cookies configured. Set PERPLEXITY_COOKIES or call perplexity_set_cookies",
            );
        }

        let args: AskArgs = match serde_json::from_value(args.clone()) {
            Ok(args) => args,
            Err(_) if args.get("query").is_none_or(Value::is_null) => {
                return ToolOutput::error("query is required");
            }
            Err(e) => return ToolOutput::error(format!("invalid arguments: {}", e)),
        };
        if args.query.is_empty() {
            return ToolOutput::error("query is required");
        }

        let Some(model) = self.registry.resolve(args.model.as_deref()) else {
            return ToolOutput::error("no models registered");
        };

        match client.ask(&args.query, &model.id).await {
            Ok(decoded) => ToolOutput::text(
                decoded
                    .answer
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| "No answer received".to_string()),
            ),
            Err(e) => {
                crate::error::log_error(&e);
                ToolOutput::error(e.message)
            }
        }
    }

    async fn set_cookies(&self, args: Value) -> ToolOutput {
        let cookies = match serde_json::from_value::<SetCookiesArgs>(args) {
            Ok(args) if !args.cookies.is_empty() => args.cookies,
            _ => return ToolOutput::error("cookies is required"),
        };

        if let Err(e) = self.settings.save_cookies(&cookies) {
            crate::error::log_error(&e);
            return ToolOutput::error(format!("saving cookies failed: {}", e.message));
        }

        let mut client = self.client.write().await;
        let refreshed = client.with_cookies(SessionCookies::new(cookies));
        *client = Arc::new(refreshed);

        ToolOutput::text(format!("Cookies saved to {}", self.settings.path().display()))
    }
}
