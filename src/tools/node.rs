use super::{run_queries, ReflexionTool};
use crate::config::Config;
use crate::messages::{ToolCall, ToolMessage};
use crate::search::{SearchProvider, SearchResult, TavilyClient};
use crate::types::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Arguments the shared handler reads; other schema fields are ignored
#[derive(Debug, Deserialize)]
struct QueryArgs {
    search_queries: Vec<String>,
}

/// Dispatches tool calls to the search handler
#[derive(Clone)]
pub struct ToolNode {
    provider: Arc<dyn SearchProvider>,
}

impl ToolNode {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Build a node backed by a Tavily client from `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = TavilyClient::from_config(&config.search)?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn tools(&self) -> &'static [ReflexionTool] {
        &ReflexionTool::ALL
    }

    /// Function definitions for every registered tool
    pub fn definitions(&self) -> Vec<Value> {
        self.tools().iter().map(ReflexionTool::definition).collect()
    }

    /// Resolve a call to its tool and the queries the shared handler runs
    fn resolve(call: &ToolCall) -> AppResult<(ReflexionTool, Vec<String>)> {
        let tool: ReflexionTool = call.name.parse()?;
        let args: QueryArgs = serde_json::from_value(call.args.clone())
            .map_err(|e| AppError::InvalidArguments(format!("{}: {}", tool, e)))?;

        info!(
            tool = %tool,
            call_id = %call.id,
            query_count = args.search_queries.len(),
            "Dispatching tool call"
        );

        let queries = match tool {
            ReflexionTool::AnswerQuestion | ReflexionTool::ReviseAnswer => args.search_queries,
        };
        Ok((tool, queries))
    }

    fn message(call: &ToolCall, tool: ReflexionTool, batches: &[Vec<SearchResult>]) -> AppResult<ToolMessage> {
        Ok(ToolMessage {
            tool_call_id: call.id.clone(),
            name: tool.name().to_string(),
            content: serde_json::to_string(batches)?,
        })
    }

    /// Execute one tool call
    pub async fn invoke(&self, call: &ToolCall) -> AppResult<ToolMessage> {
        let (tool, queries) = Self::resolve(call)?;
        let batches = run_queries(self.provider.as_ref(), &queries).await?;
        Self::message(call, tool, &batches)
    }

    /// Execute several tool calls; messages come back in call order.
    ///
    /// All calls' queries go to the provider as one batch, so the provider's
    /// concurrency limit holds across calls.
    pub async fn invoke_all(&self, calls: &[ToolCall]) -> AppResult<Vec<ToolMessage>> {
        let resolved = calls.iter().map(Self::resolve).collect::<AppResult<Vec<_>>>()?;

        let all_queries: Vec<String> = resolved
            .iter()
            .flat_map(|(_, queries)| queries.iter().cloned())
            .collect();
        let batches = run_queries(self.provider.as_ref(), &all_queries).await?;

        let mut messages = Vec::with_capacity(calls.len());
        let mut offset = 0;
        for (call, (tool, queries)) in calls.iter().zip(&resolved) {
            let end = offset + queries.len();
            messages.push(Self::message(call, *tool, &batches[offset..end])?);
            offset = end;
        }

        info!(count = messages.len(), queries = all_queries.len(), "Tool calls complete");
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::{hit, StubProvider};
    use serde_json::json;
    use std::time::Duration;

    fn node_with(provider: StubProvider) -> (ToolNode, Arc<StubProvider>) {
        let provider = Arc::new(provider);
        (ToolNode::new(provider.clone()), provider)
    }

    fn decode(message: &ToolMessage) -> Vec<Vec<SearchResult>> {
        serde_json::from_str(&message.content).unwrap()
    }

    #[tokio::test]
    async fn test_both_names_dispatch_identically() {
        let (node, _) = node_with(
            StubProvider::new()
                .with_response("A", &["r1"])
                .with_response("B", &["r2"]),
        );
        let args = json!({"search_queries": ["A", "B"]});

        let first = node
            .invoke(&ToolCall::new("call_1", "AnswerQuestion", args.clone()))
            .await
            .unwrap();
        let second = node
            .invoke(&ToolCall::new("call_2", "ReviseAnswer", args))
            .await
            .unwrap();

        assert_eq!(first.content, second.content);
        assert_eq!(decode(&first), vec![vec![hit("r1")], vec![hit("r2")]]);
        assert_eq!(first.tool_call_id, "call_1");
        assert_eq!(first.name, "AnswerQuestion");
        assert_eq!(second.tool_call_id, "call_2");
        assert_eq!(second.name, "ReviseAnswer");
    }

    #[tokio::test]
    async fn test_extra_schema_fields_ignored() {
        let (node, provider) = node_with(StubProvider::new().with_response("q", &["r"]));
        let call = ToolCall::new(
            "call_1",
            "ReviseAnswer",
            json!({
                "answer": "draft",
                "reflection": {"missing": "m", "superfluous": "s"},
                "search_queries": ["q"],
                "references": ["https://example.com"]
            }),
        );

        let message = node.invoke(&call).await.unwrap();
        assert_eq!(decode(&message), vec![vec![hit("r")]]);
        assert_eq!(provider.seen(), vec!["q".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_queries_make_no_calls() {
        let (node, provider) = node_with(StubProvider::new());
        let message = node
            .invoke(&ToolCall::new("call_1", "AnswerQuestion", json!({"search_queries": []})))
            .await
            .unwrap();

        assert_eq!(message.content, "[]");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (node, provider) = node_with(StubProvider::new());
        let err = node
            .invoke(&ToolCall::new("call_1", "web_search", json!({"search_queries": ["q"]})))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownTool(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (node, _) = node_with(StubProvider::new());

        let missing = node
            .invoke(&ToolCall::new("call_1", "AnswerQuestion", json!({"answer": "a"})))
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::InvalidArguments(ref m) if m.contains("search_queries")));

        let wrong_type = node
            .invoke(&ToolCall::new("call_1", "AnswerQuestion", json!({"search_queries": "q"})))
            .await
            .unwrap_err();
        assert!(matches!(wrong_type, AppError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let (node, _) = node_with(StubProvider::new().failing_on("q"));
        let err = node
            .invoke(&ToolCall::new("call_1", "AnswerQuestion", json!({"search_queries": ["q"]})))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Search(_)));
    }

    #[tokio::test]
    async fn test_invoke_all_keeps_call_order() {
        let (node, provider) = node_with(
            StubProvider::new()
                .with_response("slow", &["s"])
                .with_response("fast", &["f"])
                .with_delay("slow", Duration::from_millis(30)),
        );
        let calls = vec![
            ToolCall::new("call_a", "AnswerQuestion", json!({"search_queries": ["slow"]})),
            ToolCall::new("call_b", "ReviseAnswer", json!({"search_queries": ["fast"]})),
        ];

        let messages = node.invoke_all(&calls).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].tool_call_id, "call_a");
        assert_eq!(decode(&messages[0]), vec![vec![hit("s")]]);
        assert_eq!(messages[1].tool_call_id, "call_b");
        assert_eq!(decode(&messages[1]), vec![vec![hit("f")]]);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_invoke_all_shares_concurrency_limit() {
        let (node, provider) = node_with(
            StubProvider::new()
                .with_concurrency(1)
                .with_response("a", &["ra"])
                .with_response("c", &["rc"])
                .with_delay("a", Duration::from_millis(10))
                .with_delay("b", Duration::from_millis(10))
                .with_delay("c", Duration::from_millis(10)),
        );
        let calls = vec![
            ToolCall::new("call_1", "AnswerQuestion", json!({"search_queries": ["a"]})),
            ToolCall::new("call_2", "ReviseAnswer", json!({"search_queries": []})),
            ToolCall::new("call_3", "AnswerQuestion", json!({"search_queries": ["b", "c"]})),
        ];

        let messages = node.invoke_all(&calls).await.unwrap();
        assert_eq!(provider.peak_in_flight(), 1);
        assert_eq!(provider.calls(), 3);
        assert_eq!(decode(&messages[0]), vec![vec![hit("ra")]]);
        assert_eq!(messages[1].content, "[]");
        assert_eq!(messages[2].tool_call_id, "call_3");
        assert_eq!(decode(&messages[2]), vec![vec![], vec![hit("rc")]]);
    }

    #[tokio::test]
    async fn test_invoke_all_rejects_bad_call_before_searching() {
        let (node, provider) = node_with(StubProvider::new());
        let calls = vec![
            ToolCall::new("call_1", "AnswerQuestion", json!({"search_queries": ["a"]})),
            ToolCall::new("call_2", "AnswerQuestion", json!({"answer": "no queries"})),
        ];

        let err = node.invoke_all(&calls).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArguments(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_invoke_all_empty() {
        let (node, _) = node_with(StubProvider::new());
        assert!(node.invoke_all(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_definitions_cover_both_tools() {
        let (node, _) = node_with(StubProvider::new());
        let names: Vec<String> = node
            .definitions()
            .iter()
            .map(|d| d["function"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["AnswerQuestion", "ReviseAnswer"]);
    }

    #[test]
    fn test_from_config_builds_tavily_node() {
        let config = Config {
            search: crate::config::SearchConfig {
                tavily_api_key: "tvly-test".to_string(),
                ..Default::default()
            },
            logging: Default::default(),
        };
        let node = ToolNode::from_config(&config).unwrap();
        assert_eq!(node.tools().len(), 2);

        let mut config = config;
        config.search.tavily_api_key.clear();
        assert!(matches!(
            ToolNode::from_config(&config),
            Err(AppError::Search(crate::search::SearchError::NoApiKey))
        ));
    }
}
