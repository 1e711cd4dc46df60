//! Course assistant with sequential tool calling.
//!
//! [`AiGenerator`] alternates between the reasoning engine and the tool
//! registry for a bounded number of rounds, accumulating transcript and
//! sources, and always ends with a natural-language answer.

mod generator;
mod prompt;
mod state;

pub use generator::{AiGenerator, Answer};
pub use prompt::{build_system_prompt, RoundGuidance};
pub use state::{ConversationState, RoundResults};
