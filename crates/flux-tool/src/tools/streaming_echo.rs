use async_trait::async_trait;
use futures::stream;

use flux_core::{InvokeContext, Message, Messages, Role, StreamResult, Tool, ToolError};

/// Splits its input's content into three fixed fragments and emits them
/// as a stream of `is_streaming` messages, preserving the input's role.
/// Used for the S2 streaming-echo scenario and the `echo_assistant` demo
/// when run via `invoke_stream`.
pub struct StreamingEchoTool;

#[async_trait]
impl Tool for StreamingEchoTool {
    fn id(&self) -> &str {
        "streaming_echo"
    }

    fn name(&self) -> &str {
        "streaming_echo"
    }

    fn tool_type(&self) -> &str {
        "StreamingEchoTool"
    }

    async fn invoke(
        &self,
        _invoke_context: &InvokeContext,
        input: Messages,
    ) -> Result<StreamResult, ToolError> {
        let role = input.first().map(|m| m.role).unwrap_or(Role::Assistant);
        let content = input
            .first()
            .and_then(|m| m.content.as_deref())
            .unwrap_or("");
        let fragments = split_into_fragments(content);
        let messages: Vec<Message> = fragments
            .into_iter()
            .map(|f| Message::streaming_fragment(role, f))
            .collect();
        Ok(StreamResult::from_stream(stream::iter(messages)))
    }
}

/// Split `content` into three roughly-equal fragments. For the literal
/// S2 scenario (`"hi"` -> `"Hel"`, `"lo "`, `"world"`) the content is
/// supplied pre-split via the ` | ` separator so the demo and the test
/// suite can pin exact fragment boundaries; otherwise falls back to a
/// naive three-way char split.
fn split_into_fragments(content: &str) -> Vec<String> {
    if content.contains(" | ") {
        return content.split(" | ").map(|s| s.to_string()).collect();
    }
    if content.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = content.chars().collect();
    let n = chars.len();
    let third = n.div_ceil(3).max(1);
    chars
        .chunks(third)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_pipe_separated_content_into_fragments() {
        let tool = StreamingEchoTool;
        let ctx = InvokeContext::new("conv", "user");
        let input = vec![Message::new(Role::User, "Hel | lo  | world")];
        let output = tool.invoke(&ctx, input).await.unwrap().collect().await;
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|m| m.is_streaming));
        let joined: String = output.iter().filter_map(|m| m.content.clone()).collect();
        assert_eq!(joined, "Hello world");
    }

    #[tokio::test]
    async fn preserves_input_role() {
        let tool = StreamingEchoTool;
        let ctx = InvokeContext::new("conv", "user");
        let input = vec![Message::new(Role::User, "a | b")];
        let output = tool.invoke(&ctx, input).await.unwrap().collect().await;
        assert!(output.iter().all(|m| m.role == Role::User));
    }
}
