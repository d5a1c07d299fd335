//! Pluggable search over a thread's memory items.

use crate::memory::types::MemoryItem;

/// Ranks a thread's items by relevance to a query.
///
/// The store hands strategies only unexpired items, in insertion order.
pub trait SearchStrategy: Send + Sync {
    /// Return matching items, most relevant first.
    fn rank(&self, query: &str, items: &[MemoryItem]) -> Vec<MemoryItem>;
}

/// Default strategy: case-insensitive token overlap between the query and
/// the item payload, ties broken by recency.
pub struct TokenOverlap;

impl TokenOverlap {
    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect()
    }

    fn score(query_tokens: &[String], item: &MemoryItem) -> usize {
        let text = item.payload.to_string();
        let item_tokens = Self::tokens(&text);
        query_tokens
            .iter()
            .filter(|qt| item_tokens.iter().any(|it| it == *qt))
            .count()
    }
}

impl SearchStrategy for TokenOverlap {
    fn rank(&self, query: &str, items: &[MemoryItem]) -> Vec<MemoryItem> {
        let query_tokens = Self::tokens(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, MemoryItem)> = items
            .iter()
            .map(|item| (Self::score(&query_tokens, item), item.clone()))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|(sa, ia), (sb, ib)| sb.cmp(sa).then(ib.sequence.cmp(&ia.sequence)));
        scored.into_iter().map(|(_, item)| item).collect()
    }
}
