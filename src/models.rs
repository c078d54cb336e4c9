use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_KEY: &str = "sonar";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub key: String,
    /// Identifier sent upstream as `model_preference`.
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ModelInfo {
    fn new(key: &str, id: &str, name: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Short keys users pick from, mapped to upstream model ids. Order is the
/// display order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(vec![
            ModelInfo::new("sonar", "turbo", "Sonar", "Perplexity's fast model"),
            ModelInfo::new("best", "pplx_pro", "Best", "Auto-selects the best model"),
            ModelInfo::new("research", "pplx_alpha", "Research", "Deep research"),
            ModelInfo::new("gpt51", "gpt51", "GPT-5.1", "OpenAI's latest"),
            ModelInfo::new(
                "gpt51-thinking",
                "gpt51_thinking",
                "GPT-5.1 Thinking",
                "With reasoning",
            ),
            ModelInfo::new("claude", "claude45sonnet", "Claude 4.5", "Anthropic's newest"),
            ModelInfo::new(
                "claude-thinking",
                "claude45sonnetthinking",
                "Claude 4.5 Thinking",
                "With reasoning",
            ),
            ModelInfo::new("gemini", "gemini30pro", "Gemini 3 Pro", "Google's model"),
            ModelInfo::new("grok", "grok41nonreasoning", "Grok 4.1", "xAI's model"),
            ModelInfo::new("kimi", "kimik2thinking", "Kimi K2", "Moonshot's model"),
        ])
    }
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelInfo>) -> Self {
        Self { models }
    }

    pub fn get(&self, key: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.key == key)
    }

    /// `sonar`, or the first entry when no `sonar` key is registered.
    pub fn default_model(&self) -> Option<&ModelInfo> {
        self.get(DEFAULT_MODEL_KEY).or_else(|| self.models.first())
    }

    /// Looks up `key`, falling back to the default for unknown or missing keys.
    pub fn resolve(&self, key: Option<&str>) -> Option<&ModelInfo> {
        match key.filter(|k| !k.is_empty()).and_then(|k| self.get(k)) {
            Some(model) => Some(model),
            None => {
                if let Some(k) = key.filter(|k| !k.is_empty()) {
                    log::warn!("Unknown model '{}', using {}", k, DEFAULT_MODEL_KEY);
                }
                self.default_model()
            }
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.key.as_str()).collect()
    }

    /// Human-readable listing, one `- key: Name - description` line per model.
    pub fn describe(&self) -> String {
        let lines: Vec<String> = self
            .models
            .iter()
            .map(|m| format!("- {}: {} - {}", m.key, m.name, m.description))
            .collect();
        format!("Available Perplexity models:\n{}", lines.join("\n"))
    }
}
