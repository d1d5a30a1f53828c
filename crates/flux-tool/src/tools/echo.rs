use async_trait::async_trait;

use flux_core::{InvokeContext, Messages, StreamResult, Tool, ToolError};

/// Returns its input unchanged. Used for the S1/S2 echo scenarios and the
/// `echo_assistant` CLI demo.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn id(&self) -> &str {
        "echo"
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn tool_type(&self) -> &str {
        "EchoTool"
    }

    async fn invoke(
        &self,
        _invoke_context: &InvokeContext,
        input: Messages,
    ) -> Result<StreamResult, ToolError> {
        Ok(StreamResult::value(input))
    }
}
