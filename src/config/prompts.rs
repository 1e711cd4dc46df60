//! Prompt templates for Coursemate.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the tool-using course assistant.
///
/// `first_round`, `later_round` and `final_round` understand the
/// `{{round}}`, `{{max_rounds}}`, `{{remaining}}` and `{{context_summary}}`
/// placeholders; `history` understands `{{history}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
    pub history: String,
    pub first_round: String,
    pub later_round: String,
    pub final_round: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant for course materials and educational content, with tools for looking up course information.

Available Tools:
1. **search_course_content**: Search inside course materials
   - Use for questions about topics, concepts or detailed lesson content
   - Can be narrowed to a course name and a lesson number

2. **get_course_outline**: Fetch the complete structure of a course
   - Use for questions about course structure, lesson lists or a course overview
   - Returns the course title, course link and every lesson with its number and title

Response Protocol:
- **General knowledge questions**: Answer from your own knowledge without tools
- **Course-specific questions**: Use the appropriate tool first, then answer
- **No meta-commentary**:
  - Give the answer directly, without describing your reasoning, the tools or the kind of question
  - Never say "based on the search results" or "using the outline tool"

When presenting a course outline:
- Include the course title and course link when one exists
- List every lesson with its number and title
- Indent the lesson list clearly

Every response must be:
1. **Brief and focused** - get to the point quickly
2. **Educational** - keep the instructional value
3. **Clear** - use accessible language
4. **Example-supported** - include examples when they help understanding
Answer only what was asked."#
                .to_string(),

            history: "\nPrevious conversation:\n{{history}}".to_string(),

            first_round: r#"
SEQUENTIAL TOOL USAGE - Round {{round}} of {{max_rounds}}:
- You can use tools to gather information
- If the first results show you need related information, you can use tools again in the next round
- Examples of requests that need more than one round:
  * "Courses covering topics similar to X" -> Round 1: outline of or search for X, Round 2: search the related topics
  * "Compare course A with course B" -> Round 1: outline of A, Round 2: outline of B
  * "Which courses cover X and how are they structured" -> Round 1: search for X, Round 2: outlines of the courses found
- Gather the most important information first
- You have {{remaining}} round(s) remaining for tool usage
"#
            .to_string(),

            later_round: r#"
SEQUENTIAL TOOL USAGE - Round {{round}} of {{max_rounds}}:
- Previous tool usage: {{context_summary}}
- You have {{remaining}} round(s) remaining for tool usage
- Use tools only if you still need information to complete the request
- If earlier rounds already gave you enough, answer now without using tools
- Consider a complementary tool (for example an outline after a content search)
"#
            .to_string(),

            final_round: r#"
FINAL RESPONSE PHASE:
- All tool usage rounds are complete and no further tools are available
- Synthesize every tool result gathered so far into one comprehensive answer
- Give a complete, standalone answer based on all gathered information
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
