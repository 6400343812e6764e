use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EvalError;

/// Prompt format the completion was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTemplate {
    ChatMl,
    Llama3,
    /// Completion already is the assistant message.
    #[default]
    Raw,
}

impl ChatTemplate {
    fn assistant_header(self) -> Option<&'static str> {
        match self {
            ChatTemplate::ChatMl => Some("<|im_start|>assistant"),
            ChatTemplate::Llama3 => Some("<|start_header_id|>assistant<|end_header_id|>"),
            ChatTemplate::Raw => None,
        }
    }

    fn end_of_turn(self) -> &'static [&'static str] {
        match self {
            ChatTemplate::ChatMl => &["<|im_end|>"],
            ChatTemplate::Llama3 => &["<|eot_id|>", "<|end_of_text|>"],
            ChatTemplate::Raw => &[],
        }
    }
}

impl fmt::Display for ChatTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatTemplate::ChatMl => f.write_str("chatml"),
            ChatTemplate::Llama3 => f.write_str("llama3"),
            ChatTemplate::Raw => f.write_str("raw"),
        }
    }
}

impl FromStr for ChatTemplate {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chatml" => Ok(ChatTemplate::ChatMl),
            "llama3" | "llama-3" => Ok(ChatTemplate::Llama3),
            "raw" | "none" => Ok(ChatTemplate::Raw),
            other => Err(EvalError::UnknownChatTemplate(other.to_string())),
        }
    }
}

/// Last assistant turn of a decoded completion, with turn and EOS markers removed.
///
/// Text without an assistant header is treated as the message itself.
pub fn assistant_message(completion: &str, template: ChatTemplate, eos_token: Option<&str>) -> String {
    let mut message = match template.assistant_header() {
        Some(header) => match completion.rfind(header) {
            Some(start) => &completion[start + header.len()..],
            None => completion,
        },
        None => completion,
    };

    // Anything after the first end-of-turn marker belongs to a later turn.
    for marker in template.end_of_turn() {
        if let Some(end) = message.find(marker) {
            message = &message[..end];
        }
    }

    let mut message = message.to_string();
    if let Some(eos) = eos_token.filter(|t| !t.is_empty()) {
        message = message.replace(eos, "");
    }
    message.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chatml_takes_last_assistant_turn() {
        let completion = "<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\n<tool_call>{}</tool_call><|im_end|>\n";
        assert_eq!(
            assistant_message(completion, ChatTemplate::ChatMl, None),
            "<tool_call>{}</tool_call>"
        );
    }

    #[test]
    fn llama3_strips_eot() {
        let completion = "<|start_header_id|>assistant<|end_header_id|>\n\nhello<|eot_id|>";
        assert_eq!(assistant_message(completion, ChatTemplate::Llama3, None), "hello");
    }

    #[test]
    fn eos_token_is_removed() {
        assert_eq!(assistant_message("answer</s>", ChatTemplate::Raw, Some("</s>")), "answer");
        assert_eq!(assistant_message(" answer ", ChatTemplate::Raw, Some("")), "answer");
    }

    #[test]
    fn missing_header_keeps_whole_completion() {
        assert_eq!(
            assistant_message("plain text<|im_end|>", ChatTemplate::ChatMl, None),
            "plain text"
        );
    }

    #[test]
    fn parses_names() {
        assert_eq!("ChatML".parse::<ChatTemplate>().unwrap(), ChatTemplate::ChatMl);
        assert_eq!("llama3".parse::<ChatTemplate>().unwrap(), ChatTemplate::Llama3);
        assert!("zephyr".parse::<ChatTemplate>().is_err());
        assert_eq!(ChatTemplate::Raw.to_string(), "raw");
    }
}
