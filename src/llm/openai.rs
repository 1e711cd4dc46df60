//! OpenAI chat completions as a reasoning engine.

use super::{
    ContentBlock, EngineRequest, EngineResponse, Message, MessageContent, ReasoningEngine, Role,
    StopReason, ToolChoice,
};
use crate::config::AiSettings;
use crate::error::{CoursemateError, Result};
use crate::openai::create_client_with_timeout;
use crate::tools::ToolDefinition;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FinishReason, FunctionCall,
    FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Reasoning engine backed by OpenAI chat completions with function calling.
pub struct OpenAIEngine {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIEngine {
    /// Create an engine from the `[ai]` settings section.
    pub fn from_settings(settings: &AiSettings) -> Result<Self> {
        let client =
            create_client_with_timeout(Duration::from_secs(settings.request_timeout_secs))?;
        Ok(Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

impl OpenAIEngine {
    /// Build the chat completion request. No `tools` are sent without a menu.
    fn chat_request(&self, request: EngineRequest<'_>) -> Result<CreateChatCompletionRequest> {
        let messages = to_openai_messages(request.system, request.messages)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);

        if let Some(tools) = request.tools.filter(|t| !t.is_empty()) {
            let choice = match request.tool_choice {
                ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
                ToolChoice::None => ChatCompletionToolChoiceOption::None,
            };
            args.tools(to_openai_tools(tools)).tool_choice(choice);
        }

        args.build().map_err(|e| CoursemateError::Llm(e.to_string()))
    }
}

#[async_trait]
impl ReasoningEngine for OpenAIEngine {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn invoke(&self, request: EngineRequest<'_>) -> Result<EngineResponse> {
        let chat_request = self.chat_request(request)?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| CoursemateError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CoursemateError::Llm("No response from model".to_string()))?;

        debug!("Engine finished with {:?}", choice.finish_reason);
        Ok(from_openai_message(choice.message, choice.finish_reason))
    }
}

fn build_error(e: impl std::fmt::Display) -> CoursemateError {
    CoursemateError::Llm(format!("Failed to build message: {}", e))
}

/// Map the system prompt and transcript onto chat completion messages.
///
/// Tool-result blocks become `tool` messages; tool-use blocks become the
/// assistant message's `tool_calls`.
fn to_openai_messages(
    system: &str,
    messages: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut out: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system.to_string())
            .build()
            .map_err(build_error)?
            .into(),
    ];

    for message in messages {
        match (&message.role, &message.content) {
            (Role::User, MessageContent::Text(text)) => {
                out.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(build_error)?
                        .into(),
                );
            }
            (Role::Assistant, MessageContent::Text(text)) => {
                out.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(build_error)?
                        .into(),
                );
            }
            (Role::User, MessageContent::Blocks(blocks)) => {
                let mut text = String::new();
                for block in blocks {
                    match block {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                        } => out.push(
                            ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(tool_use_id.clone())
                                .content(content.clone())
                                .build()
                                .map_err(build_error)?
                                .into(),
                        ),
                        ContentBlock::Text { text: t } => text.push_str(t),
                        ContentBlock::ToolUse { name, .. } => {
                            warn!("Ignoring tool use '{}' in a user message", name);
                        }
                    }
                }
                if !text.is_empty() {
                    out.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(text)
                            .build()
                            .map_err(build_error)?
                            .into(),
                    );
                }
            }
            (Role::Assistant, MessageContent::Blocks(blocks)) => {
                let mut text = String::new();
                let mut tool_calls = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::Text { text: t } => text.push_str(t),
                        ContentBlock::ToolUse { id, name, input } => {
                            tool_calls.push(ChatCompletionMessageToolCall {
                                id: id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: name.clone(),
                                    arguments: input.to_string(),
                                },
                            })
                        }
                        ContentBlock::ToolResult { tool_use_id, .. } => {
                            warn!("Ignoring tool result '{}' in an assistant message", tool_use_id);
                        }
                    }
                }

                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !text.is_empty() {
                    args.content(text);
                }
                if !tool_calls.is_empty() {
                    args.tool_calls(tool_calls);
                }
                out.push(args.build().map_err(build_error)?.into());
            }
        }
    }

    Ok(out)
}

fn to_openai_tools(tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.input_schema.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Map a chat completion choice back onto engine content blocks.
fn from_openai_message(
    message: ChatCompletionResponseMessage,
    finish_reason: Option<FinishReason>,
) -> EngineResponse {
    let mut content = Vec::new();

    if let Some(text) = message.content.filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text { text });
    }

    let tool_calls = message.tool_calls.unwrap_or_default();
    let has_tool_calls = !tool_calls.is_empty();
    for call in tool_calls {
        let input = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
            warn!(
                "Unparsable arguments for tool '{}': {}",
                call.function.name, e
            );
            serde_json::json!({})
        });
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    let stop_reason = match finish_reason {
        _ if has_tool_calls => StopReason::ToolUse,
        Some(FinishReason::ToolCalls) => StopReason::ToolUse,
        Some(FinishReason::Stop) | None => StopReason::EndTurn,
        Some(FinishReason::Length) => StopReason::MaxTokens,
        Some(other) => StopReason::Other(format!("{:?}", other)),
    };

    EngineResponse {
        stop_reason,
        content,
    }
}
