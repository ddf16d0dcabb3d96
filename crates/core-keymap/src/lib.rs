//! Default keystroke -> command table.
//!
//! Unlike a modal editor's trie of motion/operator/count grammar, a
//! non-modal Emacs-style table only ever needs two levels: a plain chord
//! (`C-f`), or a two-key prefix chord (`C-x` followed by another chord).
//! `resolve` walks at most one prefix hop before returning.

use std::collections::HashMap;

use core_input::{KeyEvent, KeyToken, ModMask, NamedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ForwardChar,
    BackwardChar,
    NextLine,
    PreviousLine,
    ForwardWord,
    BackwardWord,
    MoveBeginningOfLine,
    MoveEndOfLine,
    ScrollUp,
    ScrollDown,
    InsertChar,
    InsertNewline,
    InsertNewlineAndIndent,
    OpenLine,
    DeleteCharBackward,
    DeleteCharForward,
    KillLine,
    KillRegion,
    CopyRegion,
    Yank,
    YankPop,
    SetMark,
    RectangleMarkMode,
    Undo,
    IndentRegion,
    UnindentRegion,
    FindFile,
    SaveBuffer,
    WriteFileAs,
    SwitchBuffer,
    KillBuffer,
    SplitWindow,
    DestroyOtherWindows,
    DestroyWindow,
    FocusNextWindow,
    IsearchForward,
    ExecuteExtendedCommand,
    KeyboardQuit,
    SuspendEditor,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(Command),
    NeedMore,
    Unbound,
}

#[derive(Debug, Clone)]
enum Binding {
    Command(Command),
    Prefix(HashMap<KeyEvent, Binding>),
}

/// Two-level keystroke table: a plain chord maps straight to a command; a
/// prefix chord (`C-x`) maps to a nested table keyed by the next chord.
pub struct Keymap {
    root: HashMap<KeyEvent, Binding>,
    /// Set while a prefix chord has been seen but its continuation hasn't.
    pending_prefix: Option<KeyEvent>,
}

impl Keymap {
    fn new() -> Self {
        Self { root: HashMap::new(), pending_prefix: None }
    }

    fn bind(&mut self, chord: KeyEvent, command: Command) {
        self.root.insert(chord, Binding::Command(command));
    }

    fn bind_prefixed(&mut self, prefix: KeyEvent, chord: KeyEvent, command: Command) {
        let entry = self
            .root
            .entry(prefix)
            .or_insert_with(|| Binding::Prefix(HashMap::new()));
        if let Binding::Prefix(map) = entry {
            map.insert(chord, Binding::Command(command));
        }
    }

    /// Feed one keystroke through the table. While a prefix chord (e.g.
    /// `C-x`) is pending, the next keystroke is looked up in its nested
    /// table instead of the root; any miss there (not just an unbound key)
    /// drops the pending prefix so the next keystroke starts fresh.
    pub fn resolve(&mut self, key: KeyEvent) -> Resolution {
        if let Some(prefix) = self.pending_prefix.take() {
            if let Some(Binding::Prefix(map)) = self.root.get(&prefix) {
                return match map.get(&key) {
                    Some(Binding::Command(c)) => Resolution::Matched(*c),
                    _ => Resolution::Unbound,
                };
            }
        }
        match self.root.get(&key) {
            Some(Binding::Command(c)) => Resolution::Matched(*c),
            Some(Binding::Prefix(_)) => {
                self.pending_prefix = Some(key);
                Resolution::NeedMore
            }
            None => Resolution::Unbound,
        }
    }
}

/// `(name, command)` pairs in the order `M-x` completion should present
/// them — every `Command` except the pure motion keys, which nobody types
/// by name.
const NAMED_COMMANDS: &[(&str, Command)] = &[
    ("find-file", Command::FindFile),
    ("save-buffer", Command::SaveBuffer),
    ("write-file", Command::WriteFileAs),
    ("switch-to-buffer", Command::SwitchBuffer),
    ("kill-buffer", Command::KillBuffer),
    ("split-window", Command::SplitWindow),
    ("delete-other-windows", Command::DestroyOtherWindows),
    ("delete-window", Command::DestroyWindow),
    ("other-window", Command::FocusNextWindow),
    ("isearch-forward", Command::IsearchForward),
    ("undo", Command::Undo),
    ("kill-region", Command::KillRegion),
    ("kill-ring-save", Command::CopyRegion),
    ("yank", Command::Yank),
    ("yank-pop", Command::YankPop),
    ("set-mark-command", Command::SetMark),
    ("rectangle-mark-mode", Command::RectangleMarkMode),
    ("indent-region", Command::IndentRegion),
    ("unindent-region", Command::UnindentRegion),
    ("keyboard-quit", Command::KeyboardQuit),
    ("suspend-emacs", Command::SuspendEditor),
    ("save-buffers-kill-terminal", Command::Quit),
];

/// Every command name `M-x` accepts, in table order.
pub fn all_command_names() -> Vec<&'static str> {
    NAMED_COMMANDS.iter().map(|(name, _)| *name).collect()
}

/// Resolve an `M-x`-typed name to its command, or `None` if unrecognized.
pub fn command_by_name(name: &str) -> Option<Command> {
    NAMED_COMMANDS.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent { token: KeyToken::Char(c), mods: ModMask::CTRL }
}

fn meta(c: char) -> KeyEvent {
    KeyEvent { token: KeyToken::Char(c), mods: ModMask::ALT }
}

fn plain(c: char) -> KeyEvent {
    KeyEvent { token: KeyToken::Char(c), mods: ModMask::empty() }
}

fn named(k: NamedKey) -> KeyEvent {
    KeyEvent { token: KeyToken::Named(k), mods: ModMask::empty() }
}

/// Build the default Emacs-style chord table (spec's `C-x C-f`, `C-w`,
/// `C-y`, `M-w`, `M-y`, `C-_`, `C-space`, `C-g`, and friends).
pub fn default_keymap() -> Keymap {
    let mut km = Keymap::new();

    km.bind(ctrl('f'), Command::ForwardChar);
    km.bind(named(NamedKey::Right), Command::ForwardChar);
    km.bind(ctrl('b'), Command::BackwardChar);
    km.bind(named(NamedKey::Left), Command::BackwardChar);
    km.bind(ctrl('n'), Command::NextLine);
    km.bind(named(NamedKey::Down), Command::NextLine);
    km.bind(ctrl('p'), Command::PreviousLine);
    km.bind(named(NamedKey::Up), Command::PreviousLine);
    km.bind(meta('f'), Command::ForwardWord);
    km.bind(meta('b'), Command::BackwardWord);
    km.bind(ctrl('a'), Command::MoveBeginningOfLine);
    km.bind(named(NamedKey::Home), Command::MoveBeginningOfLine);
    km.bind(ctrl('e'), Command::MoveEndOfLine);
    km.bind(named(NamedKey::End), Command::MoveEndOfLine);
    km.bind(named(NamedKey::PageUp), Command::ScrollUp);
    km.bind(named(NamedKey::PageDown), Command::ScrollDown);

    km.bind(named(NamedKey::Enter), Command::InsertNewline);
    km.bind(ctrl('j'), Command::InsertNewlineAndIndent);
    km.bind(ctrl('o'), Command::OpenLine);
    km.bind(named(NamedKey::Backspace), Command::DeleteCharBackward);
    km.bind(ctrl('d'), Command::DeleteCharForward);
    km.bind(named(NamedKey::Delete), Command::DeleteCharForward);

    km.bind(ctrl('k'), Command::KillLine);
    km.bind(ctrl('w'), Command::KillRegion);
    km.bind(meta('w'), Command::CopyRegion);
    km.bind(ctrl('y'), Command::Yank);
    km.bind(meta('y'), Command::YankPop);
    km.bind(KeyEvent { token: KeyToken::Char(' '), mods: ModMask::CTRL }, Command::SetMark);
    km.bind(ctrl('_'), Command::Undo);
    km.bind(named(NamedKey::Tab), Command::IndentRegion);

    km.bind(ctrl('s'), Command::IsearchForward);
    km.bind(ctrl('g'), Command::KeyboardQuit);
    km.bind(meta('x'), Command::ExecuteExtendedCommand);
    km.bind(ctrl('z'), Command::SuspendEditor);

    km.bind_prefixed(ctrl('x'), ctrl('f'), Command::FindFile);
    km.bind_prefixed(ctrl('x'), ctrl('s'), Command::SaveBuffer);
    km.bind_prefixed(ctrl('x'), ctrl('w'), Command::WriteFileAs);
    km.bind_prefixed(ctrl('x'), plain('b'), Command::SwitchBuffer);
    km.bind_prefixed(ctrl('x'), ctrl('b'), Command::KillBuffer);
    km.bind_prefixed(ctrl('x'), plain('2'), Command::SplitWindow);
    km.bind_prefixed(ctrl('x'), plain('1'), Command::DestroyOtherWindows);
    km.bind_prefixed(ctrl('x'), plain('0'), Command::DestroyWindow);
    km.bind_prefixed(ctrl('x'), plain('o'), Command::FocusNextWindow);
    km.bind_prefixed(ctrl('x'), ctrl('c'), Command::Quit);
    km.bind_prefixed(ctrl('x'), KeyEvent { token: KeyToken::Char(' '), mods: ModMask::empty() }, Command::RectangleMarkMode);

    km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_chord() {
        let mut km = default_keymap();
        assert_eq!(km.resolve(ctrl('f')), Resolution::Matched(Command::ForwardChar));
    }

    #[test]
    fn resolves_two_key_prefix_chord() {
        let mut km = default_keymap();
        assert_eq!(km.resolve(ctrl('x')), Resolution::NeedMore);
        assert_eq!(km.resolve(ctrl('f')), Resolution::Matched(Command::FindFile));
    }

    #[test]
    fn unbound_second_key_drops_pending_prefix() {
        let mut km = default_keymap();
        assert_eq!(km.resolve(ctrl('x')), Resolution::NeedMore);
        assert_eq!(km.resolve(plain('q')), Resolution::Unbound);
        // Prefix was consumed by the failed lookup; next key resolves fresh.
        assert_eq!(km.resolve(ctrl('f')), Resolution::Matched(Command::ForwardChar));
    }

    #[test]
    fn unbound_plain_key_returns_unbound() {
        let mut km = default_keymap();
        assert_eq!(km.resolve(plain('q')), Resolution::Unbound);
    }

    #[test]
    fn command_name_round_trips() {
        assert_eq!(command_by_name("find-file"), Some(Command::FindFile));
        assert_eq!(command_by_name("no-such-command"), None);
        assert!(all_command_names().contains(&"save-buffer"));
    }

    #[test]
    fn control_space_sets_mark() {
        let mut km = default_keymap();
        let chord = KeyEvent { token: KeyToken::Char(' '), mods: ModMask::CTRL };
        assert_eq!(km.resolve(chord), Resolution::Matched(Command::SetMark));
    }

    #[test]
    fn c_x_space_enters_rectangle_mark_mode() {
        let mut km = default_keymap();
        assert_eq!(km.resolve(ctrl('x')), Resolution::NeedMore);
        let space = KeyEvent { token: KeyToken::Char(' '), mods: ModMask::empty() };
        assert_eq!(km.resolve(space), Resolution::Matched(Command::RectangleMarkMode));
    }
}
