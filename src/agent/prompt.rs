//! System prompt assembly per engine invocation.

use crate::config::Prompts;
use std::collections::HashMap;

/// Round-specific section appended to the base instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundGuidance<'a> {
    /// No tool rounds in play.
    None,
    First {
        round: usize,
        max_rounds: usize,
    },
    Later {
        round: usize,
        max_rounds: usize,
        context_summary: &'a str,
    },
    /// Forced synthesis once tool rounds are exhausted.
    Final,
}

impl<'a> RoundGuidance<'a> {
    /// Guidance for a tool round.
    pub fn for_round(round: usize, max_rounds: usize, context_summary: &'a str) -> Self {
        match (round, max_rounds) {
            (0, _) | (_, 0) => Self::None,
            (1, _) => Self::First { round, max_rounds },
            _ => Self::Later {
                round,
                max_rounds,
                context_summary,
            },
        }
    }
}

fn round_vars(round: usize, max_rounds: usize) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("round".to_string(), round.to_string());
    vars.insert("max_rounds".to_string(), max_rounds.to_string());
    vars.insert(
        "remaining".to_string(),
        (max_rounds + 1).saturating_sub(round).to_string(),
    );
    vars
}

/// Concatenate base instructions, optional history and round guidance.
pub fn build_system_prompt(
    prompts: &Prompts,
    history: Option<&str>,
    guidance: RoundGuidance<'_>,
) -> String {
    let templates = &prompts.agent;
    let mut parts = vec![prompts.render_with_custom(&templates.system, &HashMap::new())];

    if let Some(history) = history.filter(|h| !h.is_empty()) {
        let mut vars = HashMap::new();
        vars.insert("history".to_string(), history.to_string());
        parts.push(Prompts::render(&templates.history, &vars));
    }

    match guidance {
        RoundGuidance::None => {}
        RoundGuidance::First { round, max_rounds } => {
            parts.push(prompts.render_with_custom(&templates.first_round, &round_vars(round, max_rounds)));
        }
        RoundGuidance::Later {
            round,
            max_rounds,
            context_summary,
        } => {
            let mut vars = round_vars(round, max_rounds);
            vars.insert("context_summary".to_string(), context_summary.to_string());
            parts.push(prompts.render_with_custom(&templates.later_round, &vars));
        }
        RoundGuidance::Final => {
            parts.push(prompts.render_with_custom(&templates.final_round, &HashMap::new()));
        }
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guidance_selection() {
        assert_eq!(RoundGuidance::for_round(0, 2, ""), RoundGuidance::None);
        assert_eq!(RoundGuidance::for_round(1, 0, ""), RoundGuidance::None);
        assert_eq!(
            RoundGuidance::for_round(1, 2, ""),
            RoundGuidance::First {
                round: 1,
                max_rounds: 2
            }
        );
        assert!(matches!(
            RoundGuidance::for_round(2, 2, "Round 1: Used x"),
            RoundGuidance::Later { context_summary: "Round 1: Used x", .. }
        ));
    }

    #[test]
    fn test_first_round_prompt() {
        let prompts = Prompts::default();
        let prompt = build_system_prompt(&prompts, None, RoundGuidance::for_round(1, 3, ""));

        assert!(prompt.starts_with(&prompts.agent.system));
        assert!(prompt.contains("Round 1 of 3"));
        assert!(prompt.contains("You have 3 round(s) remaining"));
        assert!(!prompt.contains("Previous conversation"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_later_round_prompt() {
        let prompts = Prompts::default();
        let summary = "Round 1: Used search_course_content";
        let prompt = build_system_prompt(
            &prompts,
            Some("User: hi\nAssistant: hello"),
            RoundGuidance::for_round(2, 2, summary),
        );

        assert!(prompt.contains("\nPrevious conversation:\nUser: hi\nAssistant: hello"));
        assert!(prompt.contains("Round 2 of 2"));
        assert!(prompt.contains("Previous tool usage: Round 1: Used search_course_content"));
        assert!(prompt.contains("You have 1 round(s) remaining"));
    }

    #[test]
    fn test_final_and_plain_prompts() {
        let prompts = Prompts::default();

        let final_prompt = build_system_prompt(&prompts, None, RoundGuidance::Final);
        assert!(final_prompt.contains("FINAL RESPONSE PHASE"));
        assert!(!final_prompt.contains("SEQUENTIAL TOOL USAGE"));

        let plain = build_system_prompt(&prompts, Some(""), RoundGuidance::None);
        assert_eq!(plain, prompts.agent.system);
    }

    #[test]
    fn test_custom_variables_reach_base_prompt() {
        let mut prompts = Prompts::default();
        prompts.agent.system = "You tutor {{audience}}.".to_string();
        prompts
            .variables
            .insert("audience".to_string(), "beginners".to_string());

        let prompt = build_system_prompt(&prompts, None, RoundGuidance::None);
        assert_eq!(prompt, "You tutor beginners.");
    }
}
