//! Configuration module for Coursemate.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AiSettings, EmbeddingSettings, GeneralSettings, IngestSettings, PromptSettings,
    SearchSettings, ServerSettings, SessionSettings, Settings, VectorStoreProvider,
    VectorStoreSettings,
};
