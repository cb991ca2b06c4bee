//! Extraction of fine-tuning examples from stored chat history.

use crate::context::SYSTEM_PROMPT;
use crate::Result;
use skymark_types::{ChatTurn, Message, Origin, TrainingExample};
use std::collections::HashMap;

/// Turn the full message store into training examples.
///
/// Messages are grouped per owner in the order given (owners keep first-seen order).
/// Within an owner, turns accumulate into a buffer that is never reset: every
/// assistant turn that closes a buffer of two or more turns emits the whole buffer,
/// so each later example extends the previous one.
pub fn extract_examples(messages: &[Message]) -> Vec<TrainingExample> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Message>> = Vec::new();

    for msg in messages {
        let slot = *index.entry(msg.owner_id.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(msg);
    }

    let mut examples = Vec::new();
    for group in groups.iter().filter(|g| g.len() >= 2) {
        let mut buffer: Vec<ChatTurn> = Vec::with_capacity(group.len());
        for msg in group {
            buffer.push(msg.to_turn());
            if msg.origin == Origin::Assistant && buffer.len() >= 2 {
                let mut turns = Vec::with_capacity(buffer.len() + 1);
                turns.push(ChatTurn::system(SYSTEM_PROMPT));
                turns.extend(buffer.iter().cloned());
                examples.push(TrainingExample { messages: turns });
            }
        }
    }
    examples
}

/// Serialize examples as one JSON record per line.
pub fn to_jsonl(examples: &[TrainingExample]) -> Result<String> {
    let lines = examples
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}
