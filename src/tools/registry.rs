//! Tool registration and per-query dispatch.

use super::{SourceRecord, Tool, ToolDefinition, ToolOutput};
use crate::error::{CoursemateError, Result};
use crate::llm::ToolCallRequest;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Tool calls of one round running at the same time.
const MAX_CONCURRENT_CALLS: usize = 4;

/// Tools available to the assistant, in registration order.
///
/// Registration happens once at startup; afterwards the registry is shared
/// read-only between queries. Per-query source bookkeeping lives on the
/// [`ToolDispatcher`] returned by [`ToolRegistry::dispatcher`].
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition's name.
    ///
    /// A tool registered under an existing name replaces the earlier one and
    /// keeps its position in the menu.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(CoursemateError::Config(
                "Tool definition must have a name".to_string(),
            ));
        }

        match self.position(&name) {
            Some(index) => {
                warn!("Tool '{}' registered twice, replacing the earlier one", name);
                self.tools[index].1 = tool;
            }
            None => self.tools.push((name, tool)),
        }
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Tool menu offered to the reasoning engine.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|(_, tool)| tool.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name, turning every failure into text for the engine.
    ///
    /// Returns the output together with the registration index of the tool
    /// that produced it.
    pub async fn execute(&self, name: &str, input: serde_json::Value) -> (Option<usize>, ToolOutput) {
        let Some(index) = self.position(name) else {
            warn!("Engine requested unknown tool '{}'", name);
            return (None, ToolOutput::text(format!("Tool '{}' not found", name)));
        };

        info!("Calling tool: {} with args: {}", name, input);
        match self.tools[index].1.execute(input).await {
            Ok(output) => (Some(index), output),
            Err(e) => {
                error!("Tool '{}' failed: {}", name, e);
                (
                    Some(index),
                    ToolOutput::text(format!("Tool execution failed: {}", e)),
                )
            }
        }
    }

    /// Start a dispatch scope for one query.
    pub fn dispatcher(&self) -> ToolDispatcher<'_> {
        ToolDispatcher {
            registry: self,
            last_sources: vec![Vec::new(); self.tools.len()],
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|(n, _)| n == name)
    }
}

/// The outcome of one tool call as fed back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultRecord {
    /// Id of the originating tool call.
    pub tool_use_id: String,
    /// Name of the tool the engine asked for.
    pub tool_name: String,
    pub content: String,
}

/// Query-scoped view of a [`ToolRegistry`].
///
/// Holds the most recent sources each tool produced, so concurrent queries
/// sharing one registry never see each other's attribution.
pub struct ToolDispatcher<'a> {
    registry: &'a ToolRegistry,
    last_sources: Vec<Vec<SourceRecord>>,
}

impl ToolDispatcher<'_> {
    /// Run one tool and return its text.
    pub async fn dispatch(&mut self, name: &str, input: serde_json::Value) -> String {
        let (index, output) = self.registry.execute(name, input).await;
        self.record(index, output)
    }

    /// Run every call of one round concurrently.
    ///
    /// Results come back in the order the calls were issued, one per call.
    pub async fn dispatch_all(&mut self, calls: &[ToolCallRequest]) -> Vec<ToolResultRecord> {
        let registry = self.registry;
        let pending: Vec<_> = calls
            .iter()
            .map(|call| registry.execute(&call.name, call.input.clone()))
            .collect();
        let outputs: Vec<_> = stream::iter(pending)
            .buffered(MAX_CONCURRENT_CALLS)
            .collect()
            .await;

        calls
            .iter()
            .zip(outputs)
            .map(|(call, (index, output))| ToolResultRecord {
                tool_use_id: call.id.clone(),
                tool_name: call.name.clone(),
                content: self.record(index, output),
            })
            .collect()
    }

    /// First non-empty source list, in registration order.
    pub fn collect_sources(&self) -> Vec<SourceRecord> {
        self.last_sources
            .iter()
            .find(|sources| !sources.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Forget every tool's sources.
    pub fn reset_sources(&mut self) {
        for sources in &mut self.last_sources {
            sources.clear();
        }
    }

    // Misses and failures leave a tool's earlier sources in place.
    fn record(&mut self, index: Option<usize>, output: ToolOutput) -> String {
        if let Some(index) = index {
            if !output.sources.is_empty() {
                self.last_sources[index] = output.sources;
            }
        }
        output.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
        source: Option<&'static str>,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: format!("Echo from {}", self.name),
                input_schema: json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
            if input.get("fail").is_some() {
                return Err(CoursemateError::Tool("boom".to_string()));
            }
            let sources = self
                .source
                .map(|s| vec![SourceRecord::new(s, None)])
                .unwrap_or_default();
            Ok(ToolOutput::with_sources(format!("{} says {}", self.name, input), sources))
        }
    }

    fn tool(name: &'static str, source: Option<&'static str>) -> Arc<dyn Tool> {
        Arc::new(EchoTool { name, source })
    }

    #[test]
    fn test_register_rejects_missing_name() {
        let mut registry = ToolRegistry::new();
        let err = registry.register(tool("", None)).unwrap_err();
        assert!(matches!(err, CoursemateError::Config(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_registration_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("alpha", None)).unwrap();
        registry.register(tool("beta", None)).unwrap();
        registry.register(tool("alpha", Some("replacement"))).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "beta"]);
        assert_eq!(registry.definitions().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_in_band() {
        let registry = ToolRegistry::new().with_tool(tool("alpha", None)).unwrap();
        let mut dispatcher = registry.dispatcher();

        let text = dispatcher.dispatch("nonexistent_tool", json!({})).await;
        assert_eq!(text, "Tool 'nonexistent_tool' not found");
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported_in_band() {
        let registry = ToolRegistry::new().with_tool(tool("alpha", Some("a"))).unwrap();
        let mut dispatcher = registry.dispatcher();

        let text = dispatcher.dispatch("alpha", json!({"fail": true})).await;
        assert_eq!(text, "Tool execution failed: Tool error: boom");
        assert!(dispatcher.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_all_keeps_issue_order() {
        let registry = ToolRegistry::new()
            .with_tool(tool("alpha", None))
            .unwrap()
            .with_tool(tool("beta", None))
            .unwrap();
        let mut dispatcher = registry.dispatcher();

        let calls = vec![
            ToolCallRequest {
                id: "id2".to_string(),
                name: "beta".to_string(),
                input: json!({}),
            },
            ToolCallRequest {
                id: "id1".to_string(),
                name: "alpha".to_string(),
                input: json!({"fail": true}),
            },
            ToolCallRequest {
                id: "id3".to_string(),
                name: "gamma".to_string(),
                input: json!({}),
            },
        ];

        let results = dispatcher.dispatch_all(&calls).await;
        let ids: Vec<&str> = results.iter().map(|r| r.tool_use_id.as_str()).collect();
        assert_eq!(ids, vec!["id2", "id1", "id3"]);
        assert_eq!(results[0].content, "beta says {}");
        assert!(results[1].content.starts_with("Tool execution failed"));
        assert_eq!(results[2].content, "Tool 'gamma' not found");
        assert_eq!(results[2].tool_name, "gamma");
    }

    #[tokio::test]
    async fn test_collect_and_reset_sources() {
        let registry = ToolRegistry::new()
            .with_tool(tool("alpha", None))
            .unwrap()
            .with_tool(tool("beta", Some("Beta source")))
            .unwrap()
            .with_tool(tool("gamma", Some("Gamma source")))
            .unwrap();
        let mut dispatcher = registry.dispatcher();
        assert!(dispatcher.collect_sources().is_empty());

        dispatcher.dispatch("gamma", json!({})).await;
        dispatcher.dispatch("beta", json!({})).await;
        dispatcher.dispatch("alpha", json!({})).await;

        // Registration order decides, not call order
        assert_eq!(
            dispatcher.collect_sources(),
            vec![SourceRecord::new("Beta source", None)]
        );

        dispatcher.reset_sources();
        assert!(dispatcher.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_dispatchers_are_isolated() {
        let registry = ToolRegistry::new().with_tool(tool("alpha", Some("a"))).unwrap();
        let mut first = registry.dispatcher();
        let second = registry.dispatcher();

        first.dispatch("alpha", json!({})).await;
        assert_eq!(first.collect_sources().len(), 1);
        assert!(second.collect_sources().is_empty());
    }
}
