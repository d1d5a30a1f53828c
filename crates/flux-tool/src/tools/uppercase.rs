use async_trait::async_trait;

use flux_core::{InvokeContext, Messages, StreamResult, Tool, ToolError};

/// Upper-cases every message's content, leaving absent content and every
/// other field untouched.
pub struct UppercaseTool;

#[async_trait]
impl Tool for UppercaseTool {
    fn id(&self) -> &str {
        "uppercase"
    }

    fn name(&self) -> &str {
        "uppercase"
    }

    fn tool_type(&self) -> &str {
        "UppercaseTool"
    }

    async fn invoke(
        &self,
        _invoke_context: &InvokeContext,
        input: Messages,
    ) -> Result<StreamResult, ToolError> {
        let output = input
            .into_iter()
            .map(|mut message| {
                message.content = message.content.map(|c| c.to_uppercase());
                message
            })
            .collect();
        Ok(StreamResult::value(output))
    }
}
