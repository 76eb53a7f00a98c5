use std::collections::{BTreeMap, HashMap};

use crate::models::ToolCallDelta;

pub const TEXT_BLOCK_INDEX: usize = 0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallBuffer {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallBuffer {
    pub fn absorb(&mut self, delta: &ToolCallDelta) {
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            self.id = id.to_string();
        }
        let Some(function) = delta.function.as_ref() else {
            return;
        };
        if let Some(name) = function.name.as_deref().filter(|name| !name.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(arguments) = function.arguments.as_deref() {
            self.arguments.push_str(arguments);
        }
    }
}

#[derive(Debug, Default)]
pub struct ForwardState {
    pub text_started: bool,
    pub text_chars: usize,
    /// Keyed by the upstream call index, so iteration is in ascending index order.
    pub tool_calls: BTreeMap<usize, ToolCallBuffer>,
}

impl ForwardState {
    pub fn absorb_tool_delta(&mut self, delta: &ToolCallDelta) {
        self.tool_calls.entry(delta.index).or_default().absorb(delta);
    }

    pub fn first_tool_block_index(&self) -> usize {
        if self.text_started {
            TEXT_BLOCK_INDEX + 1
        } else {
            TEXT_BLOCK_INDEX
        }
    }

    pub fn output_token_estimate(&self) -> u64 {
        (self.text_chars / 4) as u64
    }
}

#[derive(Debug, Default)]
pub struct ReverseState {
    pub role_sent: bool,
    next_tool_index: usize,
    tool_index_by_block: HashMap<usize, usize>,
    arguments_by_tool: HashMap<usize, String>,
}

impl ReverseState {
    pub fn register_tool_block(&mut self, block_index: usize) -> usize {
        let tool_index = self.next_tool_index;
        self.next_tool_index += 1;
        self.tool_index_by_block.insert(block_index, tool_index);
        tool_index
    }

    pub fn record_arguments(&mut self, block_index: usize, fragment: &str) -> Option<usize> {
        let tool_index = *self.tool_index_by_block.get(&block_index)?;
        self.arguments_by_tool
            .entry(tool_index)
            .or_default()
            .push_str(fragment);
        Some(tool_index)
    }

    #[cfg(test)]
    pub fn arguments(&self, tool_index: usize) -> Option<&str> {
        self.arguments_by_tool.get(&tool_index).map(String::as_str)
    }
}
