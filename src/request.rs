use serde::Serialize;
use uuid::Uuid;

/// Protocol version the capability flags below were captured against.
pub const PROTOCOL_VERSION: &str = "2.18";

/// Optional response block types this client declares it can render.
pub const SUPPORTED_BLOCK_USE_CASES: [&str; 25] = [
    "answer_modes",
    "media_items",
    "knowledge_cards",
    "inline_entity_cards",
    "place_widgets",
    "finance_widgets",
    "prediction_market_widgets",
    "sports_widgets",
    "flight_status_widgets",
    "shopping_widgets",
    "jobs_widgets",
    "search_result_widgets",
    "clarification_responses",
    "inline_images",
    "inline_assets",
    "placeholder_cards",
    "diff_blocks",
    "inline_knowledge_cards",
    "entity_group_v2",
    "refinement_filters",
    "canvas_mode",
    "maps_preview",
    "answer_tabs",
    "price_comparison_widgets",
    "preserve_latex",
];

pub const SUPPORTED_FEATURES: [&str; 1] = ["browser_agent_permission_banner"];

// ============================================================================
// Search defaults
// ============================================================================

/// Locale and search parameters sent with every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDefaults {
    pub language: String,
    pub timezone: String,
    pub search_focus: String,
    pub sources: Vec<String>,
    pub mode: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            timezone: "America/New_York".to_string(),
            search_focus: "internet".to_string(),
            sources: vec!["web".to_string()],
            mode: "concise".to_string(),
        }
    }
}

// ============================================================================
// Wire payload
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RequestPayload {
    pub params: RequestParams,
    pub query_str: String,
}

impl RequestPayload {
    /// Request-scoped correlation id, also sent as `X-Request-Id`.
    pub fn request_id(&self) -> Uuid {
        self.params.frontend_uuid
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestParams {
    pub attachments: Vec<serde_json::Value>,
    pub language: String,
    pub timezone: String,
    pub search_focus: String,
    pub sources: Vec<String>,
    pub search_recency_filter: Option<String>,
    pub frontend_uuid: Uuid,
    pub mode: String,
    pub model_preference: String,
    pub is_related_query: bool,
    pub is_sponsored: bool,
    pub frontend_context_uuid: Uuid,
    pub prompt_source: &'static str,
    pub query_source: &'static str,
    pub is_incognito: bool,
    pub local_search_enabled: bool,
    pub use_schematized_api: bool,
    pub send_back_text_in_streaming_api: bool,
    pub supported_block_use_cases: &'static [&'static str],
    pub supported_features: &'static [&'static str],
    pub client_coordinates: Option<serde_json::Value>,
    pub mentions: Vec<serde_json::Value>,
    pub skip_search_enabled: bool,
    pub is_nav_suggestions_disabled: bool,
    pub always_search_override: bool,
    pub override_no_search: bool,
    pub should_ask_for_mcp_tool_confirmation: bool,
    pub browser_agent_allow_once_from_toggle: bool,
    pub version: &'static str,
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    defaults: SearchDefaults,
}

impl RequestBuilder {
    pub fn new(defaults: SearchDefaults) -> Self {
        Self { defaults }
    }

    /// Builds a fresh payload. The query is passed through unvalidated and
    /// both correlation ids are newly generated on every call.
    pub fn build(&self, query: &str, model_id: &str) -> RequestPayload {
        let defaults = &self.defaults;
        RequestPayload {
            params: RequestParams {
                attachments: Vec::new(),
                language: defaults.language.clone(),
                timezone: defaults.timezone.clone(),
                search_focus: defaults.search_focus.clone(),
                sources: defaults.sources.clone(),
                search_recency_filter: None,
                frontend_uuid: Uuid::new_v4(),
                mode: defaults.mode.clone(),
                model_preference: model_id.to_string(),
                is_related_query: false,
                is_sponsored: false,
                frontend_context_uuid: Uuid::new_v4(),
                prompt_source: "user",
                query_source: "home",
                is_incognito: false,
                local_search_enabled: false,
                use_schematized_api: true,
                send_back_text_in_streaming_api: false,
                supported_block_use_cases: &SUPPORTED_BLOCK_USE_CASES,
                supported_features: &SUPPORTED_FEATURES,
                client_coordinates: None,
                mentions: Vec::new(),
                skip_search_enabled: true,
                is_nav_suggestions_disabled: false,
                always_search_override: false,
                override_no_search: false,
                should_ask_for_mcp_tool_confirmation: true,
                browser_agent_allow_once_from_toggle: false,
                version: PROTOCOL_VERSION,
            },
            query_str: query.to_string(),
        }
    }
}
