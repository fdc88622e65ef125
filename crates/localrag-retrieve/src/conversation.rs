use localrag_core::error::{Error, Result};
use localrag_core::types::Message;

/// The latest message as the query plus formatted preceding turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub query: String,
    pub history: String,
}

impl ConversationTurn {
    /// Split `conversation` into its last message (trimmed) and up to
    /// `history_limit` messages before it.
    pub fn from_messages(conversation: &[Message], history_limit: usize) -> Result<Self> {
        let Some((last, earlier)) = conversation.split_last() else {
            return Err(Error::Input("conversation is empty".into()));
        };
        let start = earlier.len().saturating_sub(history_limit);
        Ok(Self { query: last.content.trim().to_string(), history: format_history(&earlier[start..]) })
    }
}

pub fn format_history(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        match message.role.as_str() {
            "user" => out.push_str(&format!("**User:** {}\n\n", message.content)),
            "assistant" => out.push_str(&format!("**Assistant:** {}\n\n", message.content)),
            role => out.push_str(&format!("**{}**: {}\n\n", capitalize(role), message.content)),
        }
    }
    out.trim().to_string()
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_conversation_is_an_input_error() {
        assert!(matches!(ConversationTurn::from_messages(&[], 12), Err(Error::Input(_))));
    }

    #[test]
    fn last_message_is_the_trimmed_query() {
        let turn = ConversationTurn::from_messages(&[Message::user("  opening hours?\n")], 12).expect("turn");
        assert_eq!(turn.query, "opening hours?");
        assert_eq!(turn.history, "");
    }

    #[test]
    fn history_formats_roles() {
        let messages = vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::new("sYSTEM", "note"),
            Message::user("q"),
        ];
        let turn = ConversationTurn::from_messages(&messages, 12).expect("turn");
        assert_eq!(turn.history, "**User:** hi\n\n**Assistant:** hello\n\n**System**: note");
    }

    #[test]
    fn history_keeps_only_the_most_recent_messages() {
        let messages: Vec<Message> = (0..20).map(|i| Message::user(format!("m{i}"))).collect();
        let turn = ConversationTurn::from_messages(&messages, 12).expect("turn");
        assert_eq!(turn.query, "m19");
        assert!(turn.history.starts_with("**User:** m7\n\n"));
        assert!(turn.history.ends_with("**User:** m18"));
        assert_eq!(turn.history.matches("**User:**").count(), 12);
    }
}
