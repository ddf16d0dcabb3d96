//! Blocking keystroke decode: `crossterm::event::read()` translated into
//! the editor's minimal `KeyEvent`, plus `SIGTSTP`/`SIGCONT` suspend
//! handling via a flag the main loop polls between reads.

use anyhow::Result;
use bitflags::bitflags;
use crossterm::event::{
    self, Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyModifiers as CKeyModifiers,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModMask: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub token: KeyToken,
    pub mods: ModMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Suspend,
}

/// Set only from the `SIGTSTP` handler (async-signal-safe: a bare atomic
/// store), polled by the main loop between blocking reads.
static SUSPEND_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigtstp(_sig: libc::c_int) {
    SUSPEND_REQUESTED.store(true, Ordering::SeqCst);
}

/// Install the `SIGTSTP` handler. Safe to call once at startup.
pub fn install_signal_handlers() {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_sigtstp as usize;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGTSTP, &action, std::ptr::null_mut());
    }
}

/// Returns `true` and clears the flag if a suspend was requested since the
/// last call.
pub fn take_suspend_request() -> bool {
    SUSPEND_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Re-raise `SIGTSTP` against ourselves with the default disposition so the
/// shell actually stops the process, matching normal job-control behavior;
/// call after the terminal guard has restored cooked mode.
pub fn suspend_self() {
    unsafe {
        libc::signal(libc::SIGTSTP, libc::SIG_DFL);
        libc::raise(libc::SIGTSTP);
        libc::signal(libc::SIGTSTP, on_sigtstp as usize);
    }
}

/// Block for the next terminal event, translating it into the editor's
/// vocabulary. Returns `Ok(None)` for events carrying no actionable
/// information (e.g. key-release on platforms that report it).
pub fn read_event() -> Result<Option<InputEvent>> {
    if take_suspend_request() {
        return Ok(Some(InputEvent::Suspend));
    }
    match event::read()? {
        CEvent::Key(key) => Ok(map_key_event(&key).map(InputEvent::Key)),
        CEvent::Resize(w, h) => {
            trace!(target: "input", w, h, "resize");
            Ok(Some(InputEvent::Resize(w, h)))
        }
        _ => Ok(None),
    }
}

fn map_key_event(event: &CKeyEvent) -> Option<KeyEvent> {
    if !matches!(event.kind, CKeyEventKind::Press | CKeyEventKind::Repeat) {
        return None;
    }
    let token = map_key_token(&event.code)?;
    let mods = map_mod_mask(event.modifiers);
    Some(KeyEvent { token, mods })
}

fn map_key_token(code: &CKeyCode) -> Option<KeyToken> {
    let token = match code {
        CKeyCode::Char(c) => KeyToken::Char(*c),
        CKeyCode::Enter => KeyToken::Named(NamedKey::Enter),
        CKeyCode::Esc => KeyToken::Named(NamedKey::Esc),
        CKeyCode::Backspace => KeyToken::Named(NamedKey::Backspace),
        CKeyCode::Tab | CKeyCode::BackTab => KeyToken::Named(NamedKey::Tab),
        CKeyCode::Up => KeyToken::Named(NamedKey::Up),
        CKeyCode::Down => KeyToken::Named(NamedKey::Down),
        CKeyCode::Left => KeyToken::Named(NamedKey::Left),
        CKeyCode::Right => KeyToken::Named(NamedKey::Right),
        CKeyCode::Home => KeyToken::Named(NamedKey::Home),
        CKeyCode::End => KeyToken::Named(NamedKey::End),
        CKeyCode::PageUp => KeyToken::Named(NamedKey::PageUp),
        CKeyCode::PageDown => KeyToken::Named(NamedKey::PageDown),
        CKeyCode::Delete => KeyToken::Named(NamedKey::Delete),
        _ => return None,
    };
    Some(token)
}

fn map_mod_mask(mods: CKeyModifiers) -> ModMask {
    let mut out = ModMask::empty();
    if mods.contains(CKeyModifiers::CONTROL) {
        out |= ModMask::CTRL;
    }
    if mods.contains(CKeyModifiers::ALT) {
        out |= ModMask::ALT;
    }
    if mods.contains(CKeyModifiers::SHIFT) {
        out |= ModMask::SHIFT;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState as CKeyEventState;

    fn key_event(code: CKeyCode, modifiers: CKeyModifiers, kind: CKeyEventKind) -> CKeyEvent {
        CKeyEvent { code, modifiers, kind, state: CKeyEventState::empty() }
    }

    #[test]
    fn maps_plain_char() {
        let ev = key_event(CKeyCode::Char('a'), CKeyModifiers::NONE, CKeyEventKind::Press);
        let parts = map_key_event(&ev).unwrap();
        assert_eq!(parts.token, KeyToken::Char('a'));
        assert!(parts.mods.is_empty());
    }

    #[test]
    fn maps_control_chord() {
        let ev = key_event(CKeyCode::Char('x'), CKeyModifiers::CONTROL, CKeyEventKind::Press);
        let parts = map_key_event(&ev).unwrap();
        assert_eq!(parts.token, KeyToken::Char('x'));
        assert!(parts.mods.contains(ModMask::CTRL));
    }

    #[test]
    fn maps_named_key() {
        let ev = key_event(CKeyCode::Enter, CKeyModifiers::NONE, CKeyEventKind::Press);
        let parts = map_key_event(&ev).unwrap();
        assert_eq!(parts.token, KeyToken::Named(NamedKey::Enter));
    }

    #[test]
    fn ignores_key_release() {
        let ev = key_event(CKeyCode::Char('a'), CKeyModifiers::NONE, CKeyEventKind::Release);
        assert!(map_key_event(&ev).is_none());
    }

    #[test]
    fn suspend_request_is_consumed_once() {
        SUSPEND_REQUESTED.store(true, Ordering::SeqCst);
        assert!(take_suspend_request());
        assert!(!take_suspend_request());
    }
}
