//! Minibuffer: the one-line prompt/input area, its completion state
//! machine, and the `*Completions*` buffer listing candidates.

use std::time::{Duration, Instant};

use core_state::Buffer;
use core_text::Position;
use tracing::trace;

/// What kind of value the active prompt is collecting, which determines
/// where completion candidates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Files,
    Directory,
    Buffer,
    Command,
    Search,
}

/// Completion hasn't been requested yet for the current input (`Fresh`), or
/// `TAB` was pressed and a candidate set is live (`Armed`) — a second `TAB`
/// while armed cycles instead of recomputing candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionState {
    Fresh,
    Armed { candidates: Vec<String>, index: usize },
}

impl Default for CompletionState {
    fn default() -> Self {
        CompletionState::Fresh
    }
}

#[derive(Debug)]
pub struct Prompt {
    pub kind: PromptKind,
    pub label: String,
    pub completion: CompletionState,
}

impl Prompt {
    pub fn new(kind: PromptKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            completion: CompletionState::Fresh,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    at: Instant,
}

const MESSAGE_TTL: Duration = Duration::from_secs(5);

impl StatusMessage {
    pub fn new(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            text: text.into(),
            is_error,
            at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.at.elapsed() >= MESSAGE_TTL
    }
}

/// The minibuffer: a single-line input buffer plus whatever prompt is
/// currently reading from it, and the last transient status message.
pub struct Minibuffer {
    pub input: Buffer,
    pub prompt: Option<Prompt>,
    pub message: Option<StatusMessage>,
}

impl Default for Minibuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Minibuffer {
    pub fn new() -> Self {
        Self {
            input: Buffer::single_line("*minibuffer*"),
            prompt: None,
            message: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.prompt.is_some()
    }

    /// Begin reading input for `kind`, clearing any previous input text.
    pub fn start(&mut self, kind: PromptKind, label: impl Into<String>) {
        self.input = Buffer::single_line("*minibuffer*");
        self.prompt = Some(Prompt::new(kind, label));
        trace!(target: "minibuffer", ?kind, "prompt_started");
    }

    /// Abort the active prompt (`C-g`), per spec returning `EditorError::Cancelled`
    /// at the call site — this just clears local state.
    pub fn cancel(&mut self) {
        self.prompt = None;
        self.input = Buffer::single_line("*minibuffer*");
    }

    /// Finish the active prompt, returning the text collected.
    pub fn finish(&mut self) -> String {
        let text = self.input.to_text();
        self.prompt = None;
        text
    }

    pub fn set_message(&mut self, text: impl Into<String>, is_error: bool) {
        self.message = Some(StatusMessage::new(text, is_error));
    }

    /// The message to display, or `None` once its 5-second TTL has elapsed.
    pub fn live_message(&self) -> Option<&StatusMessage> {
        self.message.as_ref().filter(|m| !m.is_expired())
    }
}

/// Longest common prefix shared by every candidate, or `""` if `candidates`
/// is empty.
pub fn common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut prefix_len = first.len();
    for cand in &candidates[1..] {
        let shared = first
            .char_indices()
            .zip(cand.char_indices())
            .take_while(|((_, a), (_, b))| a == b)
            .last()
            .map(|((i, c), _)| i + c.len_utf8())
            .unwrap_or(0);
        prefix_len = prefix_len.min(shared);
    }
    first[..prefix_len].to_string()
}

/// Build the `*Completions*` special buffer listing `candidates`, one per
/// line.
pub fn completions_buffer(candidates: &[String]) -> Buffer {
    let mut buf = Buffer::special("*Completions*");
    if !candidates.is_empty() {
        let text = candidates.join("\n");
        let data = text.into_bytes();
        // special() marks the buffer read-only; bypass it for construction,
        // matching how `Buffer::from_text` seeds initial content.
        buf.set_read_only(false);
        buf.insert_at(Position::new(0, 0), &data).expect("fresh buffer accepts insert");
        buf.seal_undo();
        buf.set_read_only(true);
    }
    buf
}

/// Window height needed to display a completions list: at least 3 rows
/// even for a single candidate, capped at the available screen rows.
pub fn completions_window_height(candidate_count: usize, max_rows: u16) -> u16 {
    (candidate_count as u16).max(3).min(max_rows.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_prefix_of_similar_names() {
        let cands = vec!["readme.md".to_string(), "readme.txt".to_string()];
        assert_eq!(common_prefix(&cands), "readme.");
    }

    #[test]
    fn common_prefix_empty_when_no_candidates() {
        assert_eq!(common_prefix(&[]), "");
    }

    #[test]
    fn common_prefix_whole_string_when_identical() {
        let cands = vec!["foo".to_string(), "foo".to_string()];
        assert_eq!(common_prefix(&cands), "foo");
    }

    #[test]
    fn completions_window_height_has_floor_of_three() {
        assert_eq!(completions_window_height(1, 20), 3);
        assert_eq!(completions_window_height(10, 20), 10);
        assert_eq!(completions_window_height(50, 20), 20);
    }

    #[test]
    fn completions_buffer_lists_one_per_line() {
        let buf = completions_buffer(&["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(buf.to_text(), "a.txt\nb.txt");
        assert!(buf.read_only());
    }

    #[test]
    fn start_clears_previous_input() {
        let mut mb = Minibuffer::new();
        mb.start(PromptKind::Command, "M-x ");
        mb.input.insert_at(Position::new(0, 0), b"old").unwrap();
        mb.start(PromptKind::Files, "Find file: ");
        assert_eq!(mb.input.to_text(), "");
    }

    #[test]
    fn cancel_clears_prompt() {
        let mut mb = Minibuffer::new();
        mb.start(PromptKind::Search, "Search: ");
        mb.cancel();
        assert!(!mb.is_active());
    }
}
