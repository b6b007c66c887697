//! Reasoning capability: provider trait + OpenAI-backed implementation.
//!
//! The orchestrator only sees `ResearchModel`; the wire-level mapping of tool
//! calls is the provider's business. Tests inject scripted implementations.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const SEARCH_TOOL_NAME: &str = "web_search";

// ------------------------------------------------------------
// Conversation
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// One research run's conversation. The `id` isolates runs from each other;
/// nothing from a prior run is ever carried over.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, system: &str, instruction: &str) -> Self {
        Self {
            id: id.into(),
            messages: vec![
                Message {
                    role: MessageRole::System,
                    content: system.to_string(),
                },
                Message {
                    role: MessageRole::User,
                    content: instruction.to_string(),
                },
            ],
        }
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message {
            role: MessageRole::Assistant,
            content: content.into(),
        });
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message {
            role: MessageRole::User,
            content: content.into(),
        });
    }
}

// ------------------------------------------------------------
// Model capability
// ------------------------------------------------------------

/// Outcome of a single reasoning turn: either the model wants evidence from
/// the search capability, or it is done and hands back final text.
#[derive(Debug, Clone)]
pub enum ModelTurn {
    Search { query: String },
    Final { text: String },
}

#[async_trait]
pub trait ResearchModel: Send + Sync {
    /// One reasoning step over the conversation so far.
    async fn next_turn(&self, conversation: &Conversation) -> Result<ModelTurn>;

    /// Single-shot extraction: map `input` into JSON conforming to `schema`.
    async fn extract(
        &self,
        system: &str,
        input: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// OpenAI provider
// ------------------------------------------------------------

/// Chat-completions provider. Declares a single `web_search` tool during the
/// research loop and uses strict `json_schema` output for extraction.
pub struct OpenAiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiModel {
    pub fn new(api_key: &str, model: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-perspective-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            // Research turns read several search result batches; this is the
            // per-call wall-clock bound for the whole pipeline.
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %request.model, "chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat API error ({status}): {error_text}"));
        }

        Ok(response.json().await?)
    }

    fn wire_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                },
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl ResearchModel for OpenAiModel {
    async fn next_turn(&self, conversation: &Conversation) -> Result<ModelTurn> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::wire_messages(&conversation.messages),
            temperature: Some(0.3),
            tools: Some(vec![ToolDefinitionWire::web_search()]),
            tool_choice: Some(serde_json::json!("auto")),
            response_format: None,
        };

        let response = self.chat(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no choices in model response"))?;

        if let Some(calls) = choice.message.tool_calls {
            if let Some(tc) = calls.into_iter().find(|c| c.function.name == SEARCH_TOOL_NAME) {
                let args: SearchArgs = serde_json::from_str(&tc.function.arguments)
                    .map_err(|e| anyhow!("malformed {SEARCH_TOOL_NAME} arguments: {e}"))?;
                return Ok(ModelTurn::Search { query: args.query });
            }
        }

        Ok(ModelTurn::Final {
            text: choice.message.content.unwrap_or_default(),
        })
    }

    async fn extract(
        &self,
        system: &str,
        input: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system.to_string(),
                },
                WireMessage {
                    role: "user",
                    content: input.to_string(),
                },
            ],
            // Structured extraction must be deterministic.
            temperature: Some(0.0),
            tools: None,
            tool_choice: None,
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: "news_analysis".to_string(),
                    strict: true,
                    schema,
                },
            }),
        };

        let response = self.chat(&request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("no content in extraction response"))?;

        Ok(serde_json::from_str(&content)?)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Wire types
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinitionWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ToolDefinitionWire {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinitionWire,
}

#[derive(Debug, Serialize)]
struct FunctionDefinitionWire {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

impl ToolDefinitionWire {
    fn web_search() -> Self {
        Self {
            kind: "function",
            function: FunctionDefinitionWire {
                name: SEARCH_TOOL_NAME,
                description: "Search the web for current news coverage of a query.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}
