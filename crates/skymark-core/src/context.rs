//! Prompt assembly for the conversational exchange.

use skymark_types::{ChatTurn, Message};

/// Number of stored messages replayed as context for a new utterance.
pub const CONTEXT_WINDOW: usize = 5;

/// Persona instruction prepended to every prompt and training example.
pub const SYSTEM_PROMPT: &str = "You are Skymark, an AI guide specialized in providing information about studying abroad. You help students with information about universities, scholarships, visa requirements, living costs, and more. Be informative, friendly, and provide detailed responses.";

/// Build the prompt for a new user utterance.
///
/// `history` must be oldest first. Only the last [`CONTEXT_WINDOW`] entries are used,
/// so callers may pass a longer slice without exceeding the window.
pub fn assemble_prompt(history: &[Message], utterance: &str) -> Vec<ChatTurn> {
    let skip = history.len().saturating_sub(CONTEXT_WINDOW);

    let mut turns = Vec::with_capacity(history.len() - skip + 2);
    turns.push(ChatTurn::system(SYSTEM_PROMPT));
    turns.extend(history[skip..].iter().map(Message::to_turn));
    turns.push(ChatTurn::user(utterance));
    turns
}
