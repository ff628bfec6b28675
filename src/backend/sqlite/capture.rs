//! Capture policy and category classifier owned by the SQLite store.

const MIN_CAPTURE_CHARS: usize = 10;
const MAX_CAPTURE_CHARS: usize = 500;

/// Phrases that mark a statement as worth remembering.
const CAPTURE_TRIGGERS: &[&str] = &[
    "remember",
    "don't forget",
    "do not forget",
    "note that",
    "i prefer",
    "i like",
    "i love",
    "i hate",
    "i don't like",
    "i want",
    "i need",
    "my name is",
    "call me",
    "i am ",
    "i'm ",
    "i work",
    "i live",
    "my favorite",
    "my favourite",
    "we decided",
    "decided to",
    "always",
    "never",
    "important",
];

/// Markers of text that was itself produced from recalled memories.
const INJECTED_MARKERS: &[&str] = &["<relevant-memories>", "<memory>"];

/// Decide whether conversational text should become a memory.
pub(crate) fn should_capture(text: &str) -> bool {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if !(MIN_CAPTURE_CHARS..=MAX_CAPTURE_CHARS).contains(&len) {
        return false;
    }

    // Commands and questions are requests, not statements
    if trimmed.starts_with('/') || trimmed.ends_with('?') {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if INJECTED_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }

    CAPTURE_TRIGGERS.iter().any(|t| lower.contains(t))
}

fn has_word(words: &[&str], candidates: &[&str]) -> bool {
    words.iter().any(|w| candidates.contains(w))
}

/// Derive a category tag from memory content.
pub(crate) fn classify(content: &str) -> &'static str {
    let lower = content.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    if has_word(
        &words,
        &["prefer", "prefers", "like", "likes", "love", "loves", "hate", "hates", "favorite", "favourite"],
    ) {
        return "preference";
    }

    if has_word(&words, &["decided", "decide", "chose", "choose", "agreed"])
        || lower.contains("going with")
        || lower.contains("will use")
    {
        return "decision";
    }

    if lower.contains("my name is")
        || lower.contains("call me")
        || lower.contains("is called")
        || lower.contains('@')
        || has_word(&words, &["works", "lives", "born"])
    {
        return "entity";
    }

    if has_word(&words, &["is", "are", "was", "were", "has", "have", "uses"]) {
        return "fact";
    }

    "other"
}
