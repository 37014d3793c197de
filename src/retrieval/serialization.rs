//! Context serializer: passages -> one deterministic text block

use crate::retrieval::Passage;

/// Returned by [`serialize_passages`] for an empty passage list
pub const NO_RELEVANT_CONTEXT: &str = "No relevant context found.";

/// Render passages as numbered chunks separated by a blank line
///
/// Each chunk reads `Chunk <n> (page=<page>): <content>` where `n` is
/// 1-based, a missing page renders as `unknown`, and newlines inside the
/// content collapse to spaces.
pub fn serialize_passages(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return NO_RELEVANT_CONTEXT.to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(idx, passage)| format_chunk(idx + 1, passage))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_chunk(index: usize, passage: &Passage) -> String {
    let page = passage.page.as_deref().unwrap_or("unknown");
    let content = passage.content.replace('\n', " ");
    format!("Chunk {} (page={}): {}", index, page, content.trim())
}
