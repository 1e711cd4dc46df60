//! Reasoning engine seam.
//!
//! The assistant talks to a language model through [`ReasoningEngine`]: it
//! hands over a transcript, a system prompt and optionally a tool menu, and
//! gets back either text or a set of tool calls.

mod openai;

pub use openai::OpenAIEngine;

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One structured piece of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A transcript message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }
}

/// Why the engine stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

/// Whether the engine may call tools on this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// At the engine's discretion.
    #[default]
    Auto,
    None,
}

/// One engine invocation.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub messages: &'a [Message],
    pub system: &'a str,
    /// `None` means no tool menu is offered at all.
    pub tools: Option<&'a [ToolDefinition]>,
    pub tool_choice: ToolChoice,
}

/// A tool invocation requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Opaque id correlating the call with its result.
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// What the engine produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl EngineResponse {
    /// Response consisting of a single text block.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenated text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool calls in the order the engine issued them.
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCallRequest {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn used_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }
}

/// A language model able to answer or request tool calls.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn invoke(&self, request: EngineRequest<'_>) -> Result<EngineResponse>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_helpers() {
        let response = EngineResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                ContentBlock::Text {
                    text: "Let me look ".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "search_course_content".to_string(),
                    input: json!({"query": "MCP"}),
                },
                ContentBlock::Text {
                    text: "that up.".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "call_2".to_string(),
                    name: "get_course_outline".to_string(),
                    input: json!({"course_name": "MCP"}),
                },
            ],
        };

        assert!(response.used_tools());
        assert_eq!(response.text(), "Let me look that up.");

        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[1].name, "get_course_outline");
    }

    #[test]
    fn test_text_only_response() {
        let response = EngineResponse::text_only("Hello");
        assert!(!response.used_tools());
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.text(), "Hello");
    }
}
