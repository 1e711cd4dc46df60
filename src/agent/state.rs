//! Per-query conversation state for sequential tool rounds.

use crate::llm::{ContentBlock, Message};
use crate::tools::{SourceRecord, ToolResultRecord};

/// Tool results folded back during one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResults {
    pub round: usize,
    pub results: Vec<ToolResultRecord>,
}

/// State owned by a single `generate_response` call.
///
/// The transcript only grows, sources accumulate in round order, and
/// `current_round` never exceeds `max_rounds + 1`.
#[derive(Debug, Clone)]
pub struct ConversationState {
    current_round: usize,
    max_rounds: usize,
    messages: Vec<Message>,
    sources: Vec<SourceRecord>,
    tool_results_history: Vec<RoundResults>,
}

impl ConversationState {
    /// Seed the transcript with the user's query.
    pub fn new(query: &str, max_rounds: usize) -> Self {
        Self {
            current_round: 1,
            max_rounds,
            messages: vec![Message::user(query)],
            sources: Vec::new(),
            tool_results_history: Vec::new(),
        }
    }

    pub fn current_round(&self) -> usize {
        self.current_round
    }

    /// Tool rounds left, counting the current one.
    pub fn remaining_rounds(&self) -> usize {
        (self.max_rounds + 1).saturating_sub(self.current_round)
    }

    pub fn can_use_tools(&self) -> bool {
        self.current_round <= self.max_rounds
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_sources(self) -> Vec<SourceRecord> {
        self.sources
    }

    /// Rounds whose tool results have been folded back.
    pub fn completed_rounds(&self) -> usize {
        self.tool_results_history.len()
    }

    /// Append the engine's tool-call turn.
    pub fn add_assistant_message(&mut self, content: Vec<ContentBlock>) {
        self.messages.push(Message::assistant_blocks(content));
    }

    /// Append this round's results as one user turn.
    pub fn add_tool_results(&mut self, results: Vec<ToolResultRecord>) {
        if results.is_empty() {
            return;
        }

        let blocks = results
            .iter()
            .map(|r| ContentBlock::ToolResult {
                tool_use_id: r.tool_use_id.clone(),
                content: r.content.clone(),
            })
            .collect();
        self.messages.push(Message::user_blocks(blocks));
        self.tool_results_history.push(RoundResults {
            round: self.current_round,
            results,
        });
    }

    pub fn add_sources(&mut self, sources: Vec<SourceRecord>) {
        self.sources.extend(sources);
    }

    pub fn advance_round(&mut self) {
        if self.can_use_tools() {
            self.current_round += 1;
        }
    }

    /// Which tools each earlier round used, e.g.
    /// `Round 1: Used search_course_content; Round 2: Used get_course_outline`.
    pub fn context_summary(&self) -> String {
        self.tool_results_history
            .iter()
            .filter(|entry| !entry.results.is_empty())
            .map(|entry| {
                let mut names: Vec<&str> = Vec::new();
                for result in &entry.results {
                    if !names.contains(&result.tool_name.as_str()) {
                        names.push(&result.tool_name);
                    }
                }
                format!("Round {}: Used {}", entry.round, names.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MessageContent, Role};

    fn result(id: &str, tool: &str, content: &str) -> ToolResultRecord {
        ToolResultRecord {
            tool_use_id: id.to_string(),
            tool_name: tool.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_new_state() {
        let state = ConversationState::new("What is MCP?", 2);
        assert_eq!(state.current_round(), 1);
        assert_eq!(state.remaining_rounds(), 2);
        assert!(state.can_use_tools());
        assert_eq!(state.messages(), &[Message::user("What is MCP?")]);
        assert_eq!(state.context_summary(), "");
    }

    #[test]
    fn test_round_counter_is_bounded() {
        let mut state = ConversationState::new("q", 2);
        state.advance_round();
        state.advance_round();
        assert_eq!(state.current_round(), 3);
        assert!(!state.can_use_tools());
        assert_eq!(state.remaining_rounds(), 0);

        state.advance_round();
        assert_eq!(state.current_round(), 3);

        let state = ConversationState::new("q", 0);
        assert!(!state.can_use_tools());
    }

    #[test]
    fn test_tool_results_become_one_turn() {
        let mut state = ConversationState::new("q", 2);
        state.add_tool_results(vec![
            result("id1", "search_course_content", "a"),
            result("id2", "get_course_outline", "b"),
        ]);

        let last = state.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        match &last.content {
            MessageContent::Blocks(blocks) => assert_eq!(blocks.len(), 2),
            other => panic!("expected blocks, got {:?}", other),
        }
        assert_eq!(state.completed_rounds(), 1);

        state.add_tool_results(Vec::new());
        assert_eq!(state.completed_rounds(), 1);
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_context_summary_uses_tool_names() {
        let mut state = ConversationState::new("q", 3);
        state.add_tool_results(vec![
            result("id1", "search_course_content", "Course: looks like an outline"),
            result("id2", "search_course_content", "more"),
        ]);
        state.advance_round();
        state.add_tool_results(vec![
            result("id3", "get_course_outline", "x"),
            result("id4", "search_course_content", "y"),
        ]);

        assert_eq!(
            state.context_summary(),
            "Round 1: Used search_course_content; Round 2: Used get_course_outline, search_course_content"
        );
    }

    #[test]
    fn test_sources_accumulate() {
        let mut state = ConversationState::new("q", 2);
        state.add_sources(vec![SourceRecord::new("A", None)]);
        state.add_sources(Vec::new());
        state.add_sources(vec![SourceRecord::new("B", None)]);

        let texts: Vec<String> = state.into_sources().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }
}
