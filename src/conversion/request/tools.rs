use tracing::debug;

use crate::constants::TOOL_FUNCTION;
use crate::models::{ClaudeTool, OpenAiFunction, OpenAiTool};

pub fn convert_claude_tools(tools: &[ClaudeTool]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|tool| OpenAiTool {
            kind: TOOL_FUNCTION.to_string(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

pub fn convert_openai_tools(tools: &[OpenAiTool]) -> Vec<ClaudeTool> {
    tools
        .iter()
        .filter(|tool| {
            let is_function = tool.kind.eq_ignore_ascii_case(TOOL_FUNCTION);
            if !is_function {
                debug!(
                    phase = "drop_tool_definition",
                    reason = "unsupported_tool_type",
                    tool_type = %tool.kind,
                    "Dropping tool definition"
                );
            }
            is_function
        })
        .map(|tool| ClaudeTool {
            name: tool.function.name.clone(),
            description: tool.function.description.clone(),
            input_schema: tool.function.parameters.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{convert_claude_tools, convert_openai_tools};
    use crate::models::OpenAiTool;

    #[test]
    fn schema_passes_through_both_ways() {
        let schema = json!({"type": "object", "properties": {"q": {"type": "string"}}, "required": ["q"]});
        let openai_tools: Vec<OpenAiTool> = serde_json::from_value(json!([{
            "type": "function",
            "function": {"name": "search", "description": "Search", "parameters": schema}
        }]))
        .expect("tools");

        let claude_tools = convert_openai_tools(&openai_tools);
        assert_eq!(claude_tools[0].input_schema.as_ref(), Some(&schema));

        let back = convert_claude_tools(&claude_tools);
        assert_eq!(back, openai_tools);
    }

    #[test]
    fn drops_non_function_tools() {
        let openai_tools: Vec<OpenAiTool> = serde_json::from_value(json!([
            {"type": "retrieval", "function": {"name": "kb"}},
            {"type": "FUNCTION", "function": {"name": "search"}}
        ]))
        .expect("tools");

        let claude_tools = convert_openai_tools(&openai_tools);
        assert_eq!(claude_tools.len(), 1);
        assert_eq!(claude_tools[0].name, "search");
    }
}
