//! Sequential tool-calling response generation.

use super::prompt::{build_system_prompt, RoundGuidance};
use super::state::ConversationState;
use crate::config::Prompts;
use crate::error::CoursemateError;
use crate::llm::{EngineRequest, Message, ReasoningEngine, ToolChoice};
use crate::tools::{SourceRecord, ToolDefinition, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Result of one `generate_response` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Sources gathered across all tool rounds, in round order.
    pub sources: Vec<SourceRecord>,
    /// Tool rounds whose results were folded back.
    pub tool_rounds: usize,
}

impl Answer {
    fn from_state(text: String, state: ConversationState) -> Self {
        let tool_rounds = state.completed_rounds();
        Self {
            text,
            sources: state.into_sources(),
            tool_rounds,
        }
    }

    fn failure(e: &CoursemateError) -> Self {
        Self {
            text: format!("I encountered an error while processing your request: {}", e),
            sources: Vec::new(),
            tool_rounds: 0,
        }
    }
}

/// Drives a reasoning engine through bounded rounds of tool use.
pub struct AiGenerator {
    engine: Arc<dyn ReasoningEngine>,
    prompts: Prompts,
    max_tool_rounds: usize,
}

impl AiGenerator {
    /// Create a generator allowing two tool rounds per query.
    pub fn new(engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            engine,
            prompts: Prompts::default(),
            max_tool_rounds: 2,
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Answer a query, using tools for up to `max_rounds` rounds.
    ///
    /// Without a tool menu or registry a single tool-less call is made.
    /// Engine faults never escape: they degrade into a synthesis over what
    /// was gathered, or into an error message when nothing was.
    #[instrument(skip_all)]
    pub async fn generate_response(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDefinition]>,
        registry: Option<&ToolRegistry>,
        max_rounds: Option<usize>,
    ) -> Answer {
        let max_rounds = max_rounds.unwrap_or(self.max_tool_rounds);

        let (tools, registry) = match (tools, registry) {
            (Some(tools), Some(registry)) if !tools.is_empty() => (tools, registry),
            _ => return self.simple_response(query, history).await,
        };

        let mut state = ConversationState::new(query, max_rounds);
        let mut dispatcher = registry.dispatcher();

        while state.can_use_tools() {
            let round = state.current_round();
            let summary = state.context_summary();
            let system = build_system_prompt(
                &self.prompts,
                history,
                RoundGuidance::for_round(round, max_rounds, &summary),
            );
            debug!("Tool round {} of {}", round, max_rounds);

            let response = match self
                .engine
                .invoke(EngineRequest {
                    messages: state.messages(),
                    system: &system,
                    tools: Some(tools),
                    tool_choice: ToolChoice::Auto,
                })
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    error!("Error in round {}: {}", round, e);
                    return self.recover(state, history, &e).await;
                }
            };

            let calls = response.tool_calls();
            if !response.used_tools() || calls.is_empty() {
                debug!("Engine answered directly in round {}", round);
                return Answer::from_state(response.text(), state);
            }

            info!("Round {}: engine requested {} tool call(s)", round, calls.len());
            state.add_assistant_message(response.content);

            let results = dispatcher.dispatch_all(&calls).await;
            state.add_tool_results(results);
            state.add_sources(dispatcher.collect_sources());
            dispatcher.reset_sources();

            state.advance_round();
        }

        debug!("Tool rounds exhausted, forcing synthesis");
        self.final_response(state, history).await
    }

    async fn simple_response(&self, query: &str, history: Option<&str>) -> Answer {
        let system = build_system_prompt(&self.prompts, history, RoundGuidance::None);
        let messages = [Message::user(query)];

        match self
            .engine
            .invoke(EngineRequest {
                messages: &messages,
                system: &system,
                tools: None,
                tool_choice: ToolChoice::None,
            })
            .await
        {
            Ok(response) => Answer {
                text: response.text(),
                sources: Vec::new(),
                tool_rounds: 0,
            },
            Err(e) => {
                error!("Engine call failed: {}", e);
                Answer::failure(&e)
            }
        }
    }

    /// Synthesize from what earlier rounds gathered, or report the fault.
    async fn recover(
        &self,
        state: ConversationState,
        history: Option<&str>,
        fault: &CoursemateError,
    ) -> Answer {
        if state.completed_rounds() == 0 {
            return Answer::failure(fault);
        }
        self.final_response(state, history).await
    }

    /// One last call with no tool menu.
    async fn final_response(&self, state: ConversationState, history: Option<&str>) -> Answer {
        let system = build_system_prompt(&self.prompts, history, RoundGuidance::Final);

        let result = self
            .engine
            .invoke(EngineRequest {
                messages: state.messages(),
                system: &system,
                tools: None,
                tool_choice: ToolChoice::None,
            })
            .await;

        match result {
            Ok(response) => Answer::from_state(response.text(), state),
            Err(e) => {
                error!("Final synthesis failed: {}", e);
                let text = Answer::failure(&e).text;
                Answer::from_state(text, state)
            }
        }
    }
}
