//! Entry point: CLI parsing, startup wiring, and the synchronous
//! read-dispatch-render loop.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::tty::IsTty;
use tracing_appender::non_blocking::WorkerGuard;

use core_config::{Config, ViewportContext};
use core_input::{InputEvent, KeyToken, ModMask, NamedKey};
use core_keymap::{Command, Keymap, Resolution};
use core_minibuffer::{CompletionState, Minibuffer, PromptKind};
use core_model::{BufferId, EditorState};
use core_render::pipeline::DisplayPipeline;
use core_render::status::MinibufferLine;
use core_render::{clipboard::ClipboardSink, RefreshHint};
use core_state::{Buffer, EditorError};
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalCapabilities, TerminalClipboard};
use core_text::Position;

#[derive(Debug, Parser)]
#[command(name = "emil", version, about = "A small terminal text editor")]
struct Args {
    /// Files to open. A leading `+NUM` token (stripped before parsing) sets
    /// the starting line of the first file opened.
    files: Vec<PathBuf>,
}

/// What action completes the active minibuffer prompt when its `Enter`
/// fires. `Minibuffer`/`Prompt` carry no notion of "what for", so the main
/// loop tracks it alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptAction {
    FindFile,
    SaveAs,
    WriteFileAs,
    SwitchBuffer,
    KillBuffer,
    ExecuteCommand,
    Isearch,
}

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<ExitCode> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let raw_args: Vec<String> = std::env::args().collect();
    let (starting_line, clap_args) = split_starting_line(&raw_args);
    let args = Args::parse_from(clap_args);

    run(args, starting_line)
}

/// Pull a leading `+NUM` token (if any, scanning past argv[0]) out of the
/// argument list before handing the rest to clap, which has no natural way
/// to accept a bare `+123` positional alongside file paths.
fn split_starting_line(raw_args: &[String]) -> (Option<usize>, Vec<String>) {
    let mut out = Vec::with_capacity(raw_args.len());
    let mut line = None;
    for (i, arg) in raw_args.iter().enumerate() {
        if i > 0 && line.is_none() {
            if let Some(rest) = arg.strip_prefix('+') {
                if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                    line = rest.parse().ok();
                    continue;
                }
            }
        }
        out.push(arg.clone());
    }
    (line, out)
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_path = Path::new("emil.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "emil.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
        .ok()
        .map(|()| guard)
}

fn install_panic_hook() {
    static HOOK: std::sync::Once = std::sync::Once::new();
    HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", %info, "panic");
            default_hook(info);
        }));
    });
}

fn run(args: Args, starting_line: Option<usize>) -> Result<ExitCode> {
    let piped_stdin = !std::io::stdin().is_tty();

    let mut stdin_buffer = None;
    if piped_stdin {
        match core_actions::io::load_stdin() {
            Ok(buf) => stdin_buffer = Some(buf),
            Err(_) => {
                eprintln!("emil: standard input is not valid UTF-8 text");
                return Ok(ExitCode::FAILURE);
            }
        }
        reopen_tty_stdin().context("reopening /dev/tty after reading piped stdin")?;
    }

    let mut file_buffers = Vec::new();
    for path in &args.files {
        match core_actions::io::load(path) {
            Ok(buf) => file_buffers.push(buf),
            Err(EditorError::Utf8Invalid) => {
                eprintln!("emil: {}: invalid UTF-8 or binary content", path.display());
                return Ok(ExitCode::FAILURE);
            }
            Err(_) => {
                let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("[No Name]").to_string();
                let mut buf = Buffer::new(name);
                buf.set_filename(path.clone());
                file_buffers.push(buf);
            }
        }
    }

    let (initial, rest) = if let Some(stdin_buf) = stdin_buffer {
        (stdin_buf, file_buffers)
    } else if !file_buffers.is_empty() {
        let mut iter = file_buffers.into_iter();
        let first = iter.next().expect("checked non-empty");
        (first, iter.collect())
    } else {
        (Buffer::new("untitled"), Vec::new())
    };

    let (cols, term_rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let total_rows = term_rows.saturating_sub(1).max(1);
    let content_rows = total_rows.saturating_sub(1).max(1);

    let mut config = core_config::load_from(None).context("loading configuration")?;
    let scroll_margin = config.apply_viewport(ViewportContext::new(cols, content_rows));
    let caps = TerminalCapabilities::detect();

    let mut state = EditorState::new(initial, total_rows, config.clone());
    for buf in rest {
        state.buffers.insert(buf);
    }

    if let Some(line) = starting_line {
        let target_row = line.saturating_sub(1).min(state.focused_buffer().line_count().saturating_sub(1));
        state.focused_buffer_mut().set_cursor(Position::new(target_row, 0));
    }

    let mut runtime = Runtime {
        state,
        minibuffer: Minibuffer::new(),
        pending_action: None,
        config,
        caps,
        clipboard: TerminalClipboard,
        cols,
        total_rows,
        scroll_margin,
        last_yank: None,
        last_was_kill: false,
        quit_confirm_armed: false,
    };

    let mut keymap = core_keymap::default_keymap();
    let mut backend = CrosstermBackend::new();
    backend.enter()?;
    core_input::install_signal_handlers();

    let pipeline = DisplayPipeline::new();
    let mut hint = RefreshHint::Full;

    let outcome = 'outer: loop {
        let line = runtime.minibuffer_line();
        let (frame, effective_hint) = pipeline.render(
            &mut runtime.state,
            runtime.cols,
            runtime.total_rows,
            &line,
            runtime.scroll_margin,
            hint,
        );
        let mut frame = frame;
        runtime.place_minibuffer_cursor(&mut frame);
        backend.paint(&frame, effective_hint)?;
        hint = RefreshHint::CursorOnly;

        let Some(event) = core_input::read_event()? else {
            continue;
        };

        match event {
            InputEvent::Suspend => {
                backend.leave()?;
                core_input::suspend_self();
                backend.enter()?;
                hint = RefreshHint::Full;
            }
            InputEvent::Resize(w, h) => {
                runtime.handle_resize(w, h);
                hint = RefreshHint::Full;
            }
            InputEvent::Key(key) => {
                if runtime.minibuffer.is_active() {
                    match runtime.handle_minibuffer_key(key)? {
                        Flow::Quit => break 'outer Flow::Quit,
                        Flow::Continue => {}
                    }
                    continue;
                }
                match keymap.resolve(key) {
                    Resolution::Matched(cmd) => match runtime.dispatch_command(cmd)? {
                        Flow::Quit => break 'outer Flow::Quit,
                        Flow::Continue => {}
                    },
                    Resolution::NeedMore => {}
                    Resolution::Unbound => {
                        if let KeyToken::Char(c) = key.token {
                            if (key.mods - ModMask::SHIFT).is_empty() {
                                runtime.self_insert(c);
                            }
                        }
                    }
                }
            }
        }
    };

    backend.leave()?;
    match outcome {
        Flow::Quit => Ok(ExitCode::SUCCESS),
        Flow::Continue => Ok(ExitCode::SUCCESS),
    }
}

/// Reopen `/dev/tty` onto fd 0 so keystrokes can still be read after stdin
/// itself was consumed slurping piped input.
fn reopen_tty_stdin() -> Result<()> {
    use std::os::unix::io::AsRawFd;
    let tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")
        .context("opening /dev/tty")?;
    let rc = unsafe { libc::dup2(tty.as_raw_fd(), libc::STDIN_FILENO) };
    if rc < 0 {
        return Err(anyhow::anyhow!("dup2 onto stdin failed: {}", std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Everything the main loop threads through one keystroke at a time.
struct Runtime {
    state: EditorState,
    minibuffer: Minibuffer,
    pending_action: Option<PromptAction>,
    config: Config,
    caps: TerminalCapabilities,
    clipboard: TerminalClipboard,
    cols: u16,
    total_rows: u16,
    scroll_margin: u16,
    last_yank: Option<(Position, Position)>,
    last_was_kill: bool,
    quit_confirm_armed: bool,
}

impl Runtime {
    fn note_error(&mut self, e: EditorError) {
        self.minibuffer.set_message(e.to_string(), true);
    }

    fn minibuffer_line(&self) -> MinibufferLine {
        if let Some(prompt) = &self.minibuffer.prompt {
            MinibufferLine {
                text: format!("{}{}", prompt.label, self.minibuffer.input.to_text()),
                is_error: false,
            }
        } else if let Some(msg) = self.minibuffer.live_message() {
            MinibufferLine { text: msg.text.clone(), is_error: msg.is_error }
        } else {
            MinibufferLine::empty()
        }
    }

    /// Put the hardware cursor on the minibuffer's own line while a prompt
    /// is active; `DisplayPipeline` otherwise always targets the focused
    /// window's buffer cursor.
    fn place_minibuffer_cursor(&self, frame: &mut core_render::Frame) {
        let Some(prompt) = &self.minibuffer.prompt else { return };
        let col = (prompt.label.chars().count() + self.minibuffer.input.cursor().byte) as u16;
        frame.cursor = (col.min(self.cols.saturating_sub(1)), self.total_rows);
    }

    fn handle_resize(&mut self, w: u16, h: u16) {
        self.cols = w;
        let total_rows = h.saturating_sub(1).max(1);
        self.total_rows = total_rows;
        self.state.windows.resize(total_rows);
        let content_rows = total_rows.saturating_sub(1).max(1);
        self.scroll_margin = self.config.apply_viewport(ViewportContext::new(w, content_rows));
    }

    fn start_prompt(&mut self, kind: PromptKind, label: &str, action: PromptAction) {
        self.minibuffer.start(kind, label);
        self.pending_action = Some(action);
    }

    fn self_insert(&mut self, c: char) {
        let buffer = self.state.focused_buffer_mut();
        if let Err(e) = core_actions::editing::insert_char(buffer, c) {
            self.note_error(e);
        }
    }

    fn dispatch_command(&mut self, cmd: Command) -> Result<Flow> {
        if cmd != Command::Quit {
            self.quit_confirm_armed = false;
        }
        if cmd != Command::KillLine && cmd != Command::KillRegion {
            self.last_was_kill = false;
        }

        match cmd {
            Command::ForwardChar => core_actions::movement::forward_char(self.state.focused_buffer_mut()),
            Command::BackwardChar => core_actions::movement::backward_char(self.state.focused_buffer_mut()),
            Command::NextLine => core_actions::movement::next_line(self.state.focused_buffer_mut()),
            Command::PreviousLine => core_actions::movement::previous_line(self.state.focused_buffer_mut()),
            Command::ForwardWord => core_actions::movement::forward_word(self.state.focused_buffer_mut()),
            Command::BackwardWord => core_actions::movement::backward_word(self.state.focused_buffer_mut()),
            Command::MoveBeginningOfLine => core_actions::movement::move_beginning_of_line(self.state.focused_buffer_mut()),
            Command::MoveEndOfLine => core_actions::movement::move_end_of_line(self.state.focused_buffer_mut()),
            Command::ScrollUp => self.scroll_page(false),
            Command::ScrollDown => self.scroll_page(true),

            Command::InsertChar => unreachable!("self-insert bypasses keymap resolution"),
            Command::InsertNewline => {
                let buffer = self.state.focused_buffer_mut();
                if let Err(e) = core_actions::editing::insert_newline(buffer) {
                    self.note_error(e);
                }
            }
            Command::InsertNewlineAndIndent => {
                let buffer = self.state.focused_buffer_mut();
                if let Err(e) = core_actions::editing::insert_newline_and_indent(buffer) {
                    self.note_error(e);
                }
            }
            Command::OpenLine => {
                let buffer = self.state.focused_buffer_mut();
                if let Err(e) = core_actions::editing::open_line(buffer) {
                    self.note_error(e);
                }
            }
            Command::DeleteCharBackward => {
                let buffer = self.state.focused_buffer_mut();
                if let Err(e) = core_actions::editing::delete_char_backward(buffer) {
                    self.note_error(e);
                }
            }
            Command::DeleteCharForward => {
                let buffer = self.state.focused_buffer_mut();
                if let Err(e) = core_actions::editing::delete_char_forward(buffer) {
                    self.note_error(e);
                }
            }
            Command::KillLine => {
                let append = self.last_was_kill;
                let buffer = self.state.focused_buffer_mut();
                match core_actions::editing::kill_line(buffer, &mut self.state.kill_ring, append) {
                    Ok(()) => self.last_was_kill = true,
                    Err(e) => self.note_error(e),
                }
            }
            Command::KillRegion => {
                let buffer = self.state.focused_buffer_mut();
                match core_actions::region::kill_region(buffer, &mut self.state.kill_ring) {
                    Ok(()) => {
                        self.last_was_kill = true;
                        self.maybe_sync_clipboard();
                    }
                    Err(e) => self.note_error(e),
                }
            }
            Command::CopyRegion => {
                let buffer = self.state.focused_buffer_mut();
                core_actions::region::copy_region(buffer, &mut self.state.kill_ring);
                self.maybe_sync_clipboard();
            }
            Command::Yank => {
                let buffer = self.state.focused_buffer_mut();
                match core_actions::editing::yank(buffer, &self.state.kill_ring) {
                    Ok(span) => self.last_yank = span,
                    Err(e) => self.note_error(e),
                }
            }
            Command::YankPop => {
                if let Some(last_yank) = self.last_yank {
                    let buffer = self.state.focused_buffer_mut();
                    match core_actions::editing::yank_pop(buffer, &mut self.state.kill_ring, last_yank) {
                        Ok(span) => self.last_yank = span.or(Some(last_yank)),
                        Err(e) => self.note_error(e),
                    }
                } else {
                    self.minibuffer.set_message("Previous command was not a yank", true);
                }
            }
            Command::SetMark => {
                let buffer = self.state.focused_buffer_mut();
                let pos = buffer.cursor();
                buffer.set_mark(pos);
                self.minibuffer.set_message("Mark set", false);
            }
            Command::RectangleMarkMode => {
                let buffer = self.state.focused_buffer_mut();
                if buffer.rectangle_mode() {
                    buffer.set_rectangle_mode(false);
                    self.minibuffer.set_message("Rectangle mark mode disabled", false);
                } else {
                    let pos = buffer.cursor();
                    buffer.set_mark(pos);
                    buffer.set_rectangle_mode(true);
                    self.minibuffer.set_message("Rectangle mark mode enabled", false);
                }
            }
            Command::Undo => {
                if !self.state.focused_buffer_mut().undo() {
                    self.minibuffer.set_message("No further undo information", true);
                }
            }
            Command::IndentRegion => self.indent_or_unindent(true),
            Command::UnindentRegion => self.indent_or_unindent(false),

            Command::FindFile => self.start_prompt(PromptKind::Files, "Find file: ", PromptAction::FindFile),
            Command::SaveBuffer => self.save_focused_buffer(),
            Command::WriteFileAs => self.start_prompt(PromptKind::Files, "Write file: ", PromptAction::WriteFileAs),
            Command::SwitchBuffer => self.start_prompt(PromptKind::Buffer, "Switch to buffer: ", PromptAction::SwitchBuffer),
            Command::KillBuffer => self.start_prompt(PromptKind::Buffer, "Kill buffer: ", PromptAction::KillBuffer),

            Command::SplitWindow => {
                self.state.sync_cursor_out();
                self.state.windows.split(self.total_rows);
                self.state.sync_cursor_in();
            }
            Command::DestroyOtherWindows => {
                self.state.windows.destroy_others(self.total_rows);
            }
            Command::DestroyWindow => {
                self.state.windows.destroy_focused(self.total_rows);
                self.state.sync_cursor_in();
            }
            Command::FocusNextWindow => {
                self.state.sync_cursor_out();
                self.state.windows.focus_next();
                self.state.sync_cursor_in();
            }

            Command::IsearchForward => self.start_prompt(PromptKind::Search, "I-search: ", PromptAction::Isearch),
            Command::ExecuteExtendedCommand => self.start_prompt(PromptKind::Command, "M-x ", PromptAction::ExecuteCommand),

            Command::KeyboardQuit => {
                self.state.focused_buffer_mut().clear_mark();
                self.minibuffer.set_message("Quit", false);
            }
            Command::SuspendEditor => {
                // Handled by the caller: suspending needs to drop out of raw
                // mode, which this method has no access to.
            }
            Command::Quit => {
                let dirty_count = self.state.buffers.iter().filter(|(_, b)| b.is_dirty()).count();
                if dirty_count > 0 && !self.quit_confirm_armed {
                    self.quit_confirm_armed = true;
                    self.minibuffer
                        .set_message(format!("{dirty_count} unsaved buffer(s); C-x C-c again to quit"), true);
                    return Ok(Flow::Continue);
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn scroll_page(&mut self, forward: bool) {
        let page = self.state.windows.focused().height.saturating_sub(1).max(1) as usize;
        let buffer = self.state.focused_buffer_mut();
        let cur = buffer.cursor();
        let new_row = if forward { cur.row.saturating_add(page) } else { cur.row.saturating_sub(page) };
        buffer.set_cursor(Position::new(new_row, cur.byte));
        buffer.seal_undo();
    }

    fn indent_or_unindent(&mut self, indent: bool) {
        let editing_cfg = self.config.file.editing.clone();
        let buffer = self.state.focused_buffer_mut();
        let (start_row, end_row) = buffer
            .region()
            .map(|r| (r.start.row, r.end.row))
            .unwrap_or((buffer.cursor().row, buffer.cursor().row));
        let result = if indent {
            core_actions::editing::indent_rows(buffer, start_row, end_row, &editing_cfg)
        } else {
            core_actions::editing::unindent_rows(buffer, start_row, end_row, &editing_cfg)
        };
        if let Err(e) = result {
            self.note_error(e);
        }
    }

    fn maybe_sync_clipboard(&mut self) {
        if !self.caps.supports_osc52 {
            return;
        }
        if let Some(text) = self.state.kill_ring.current().map(str::to_string) {
            self.clipboard.copy(&text);
        }
    }

    fn save_focused_buffer(&mut self) {
        let path = self.state.focused_buffer().filename().cloned();
        match path {
            Some(p) => {
                let buffer = self.state.focused_buffer_mut();
                match core_actions::io::save(buffer, &p) {
                    Ok(core_actions::io::SaveOutcome::Clean) => {
                        self.minibuffer.set_message(format!("Wrote {}", p.display()), false)
                    }
                    Ok(core_actions::io::SaveOutcome::ExternalModificationNoted) => self.minibuffer.set_message(
                        format!("Wrote {} (file had changed on disk)", p.display()),
                        false,
                    ),
                    Err(e) => self.note_error(e),
                }
            }
            None => self.start_prompt(PromptKind::Files, "File to save: ", PromptAction::SaveAs),
        }
    }

    fn handle_minibuffer_key(&mut self, key: core_input::KeyEvent) -> Result<Flow> {
        if key.token == KeyToken::Char('g') && key.mods == ModMask::CTRL {
            self.minibuffer.cancel();
            self.pending_action = None;
            self.minibuffer.set_message("Quit", false);
            return Ok(Flow::Continue);
        }
        if key.token == KeyToken::Named(NamedKey::Enter) {
            return self.finish_prompt();
        }
        if key.token == KeyToken::Named(NamedKey::Tab) {
            self.run_completion();
            return Ok(Flow::Continue);
        }
        if key.token == KeyToken::Char('n') && key.mods == ModMask::ALT {
            self.cycle_completion(1);
            return Ok(Flow::Continue);
        }
        if key.token == KeyToken::Char('p') && key.mods == ModMask::ALT {
            self.cycle_completion(usize::MAX);
            return Ok(Flow::Continue);
        }
        if key.token == KeyToken::Named(NamedKey::Backspace) {
            core_actions::editing::delete_char_backward(&mut self.minibuffer.input).ok();
            self.reset_completion();
            return Ok(Flow::Continue);
        }
        if key.token == KeyToken::Named(NamedKey::Left) {
            core_actions::movement::backward_char(&mut self.minibuffer.input);
            return Ok(Flow::Continue);
        }
        if key.token == KeyToken::Named(NamedKey::Right) {
            core_actions::movement::forward_char(&mut self.minibuffer.input);
            return Ok(Flow::Continue);
        }
        if let KeyToken::Char(c) = key.token {
            if (key.mods - ModMask::SHIFT).is_empty() {
                core_actions::editing::insert_char(&mut self.minibuffer.input, c).ok();
                self.reset_completion();
            }
        }
        Ok(Flow::Continue)
    }

    fn reset_completion(&mut self) {
        if let Some(prompt) = self.minibuffer.prompt.as_mut() {
            prompt.completion = CompletionState::Fresh;
        }
    }

    fn replace_minibuffer_input(&mut self, text: &str) {
        let input = &mut self.minibuffer.input;
        let len = input.to_text().len();
        let _ = input.delete_span(Position::new(0, 0), Position::new(0, len), core_state::DeleteDirection::Forward);
        let _ = core_actions::editing::insert_str(input, text);
    }

    fn run_completion(&mut self) {
        let Some(prompt) = self.minibuffer.prompt.as_ref() else { return };
        let kind = prompt.kind;
        let current_buffer = self.state.windows.focused().buffer;
        let input_text = self.minibuffer.input.to_text();
        let candidates = compute_candidates(kind, &input_text, &self.state, current_buffer);

        match candidates.len() {
            0 => {
                self.minibuffer.set_message("No match", true);
                self.reset_completion();
            }
            1 => {
                let only = candidates[0].clone();
                self.replace_minibuffer_input(&only);
                self.reset_completion();
            }
            _ => {
                let prefix = core_minibuffer::common_prefix(&candidates);
                let was_armed = matches!(self.minibuffer.prompt.as_ref().unwrap().completion, CompletionState::Armed { .. });
                if prefix.len() > input_text.len() {
                    self.replace_minibuffer_input(&prefix);
                    self.reset_completion();
                } else if !was_armed {
                    self.minibuffer.set_message("Complete, but not unique", false);
                    if let Some(p) = self.minibuffer.prompt.as_mut() {
                        p.completion = CompletionState::Armed { candidates, index: 0 };
                    }
                } else {
                    self.minibuffer.set_message(candidates.join("  "), false);
                }
            }
        }
    }

    fn cycle_completion(&mut self, step: usize) {
        let Some(prompt) = self.minibuffer.prompt.as_mut() else { return };
        let CompletionState::Armed { candidates, index } = &mut prompt.completion else { return };
        if candidates.is_empty() {
            return;
        }
        *index = if step == usize::MAX {
            (*index + candidates.len() - 1) % candidates.len()
        } else {
            (*index + step) % candidates.len()
        };
        let chosen = candidates[*index].clone();
        self.replace_minibuffer_input(&chosen);
    }

    fn finish_prompt(&mut self) -> Result<Flow> {
        let action = self.pending_action.take();
        let text = self.minibuffer.finish();
        let Some(action) = action else { return Ok(Flow::Continue) };

        match action {
            PromptAction::FindFile => self.apply_find_file(&text),
            PromptAction::SaveAs | PromptAction::WriteFileAs => self.apply_write_file(&text),
            PromptAction::SwitchBuffer => self.apply_switch_buffer(&text),
            PromptAction::KillBuffer => self.apply_kill_buffer(&text),
            PromptAction::Isearch => self.apply_isearch(&text),
            PromptAction::ExecuteCommand => {
                if let Some(cmd) = core_keymap::command_by_name(&text) {
                    return self.dispatch_command(cmd);
                }
                self.minibuffer.set_message(format!("No such command: {text}"), true);
            }
        }
        Ok(Flow::Continue)
    }

    fn apply_find_file(&mut self, text: &str) {
        let path = expand_tilde_path(text);
        match core_actions::io::load(&path) {
            Ok(buf) => {
                let id = self.state.buffers.insert(buf);
                self.state.set_focused_buffer(id);
                self.minibuffer.set_message(format!("Loaded {}", path.display()), false);
            }
            Err(EditorError::Utf8Invalid) => {
                self.minibuffer.set_message(format!("{}: invalid UTF-8 or binary content", path.display()), true);
            }
            Err(EditorError::IoFailed(_)) => {
                let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("[No Name]").to_string();
                let mut buf = Buffer::new(name);
                buf.set_filename(path.clone());
                let id = self.state.buffers.insert(buf);
                self.state.set_focused_buffer(id);
                self.minibuffer.set_message(format!("(New file) {}", path.display()), false);
            }
            Err(e) => self.note_error(e),
        }
    }

    fn apply_write_file(&mut self, text: &str) {
        let path = expand_tilde_path(text);
        let buffer = self.state.focused_buffer_mut();
        match core_actions::io::save(buffer, &path) {
            Ok(core_actions::io::SaveOutcome::Clean) => {
                self.minibuffer.set_message(format!("Wrote {}", path.display()), false)
            }
            Ok(core_actions::io::SaveOutcome::ExternalModificationNoted) => {
                self.minibuffer.set_message(format!("Wrote {} (file had changed on disk)", path.display()), false)
            }
            Err(e) => self.note_error(e),
        }
    }

    fn apply_switch_buffer(&mut self, text: &str) {
        match self.state.buffers.find_by_display_name(text) {
            Some(id) => self.state.set_focused_buffer(id),
            None => self.minibuffer.set_message(format!("No buffer named {text}"), true),
        }
    }

    fn apply_kill_buffer(&mut self, text: &str) {
        let Some(id) = self.state.buffers.find_by_display_name(text) else {
            self.minibuffer.set_message(format!("No buffer named {text}"), true);
            return;
        };
        if self.state.buffers.iter().count() <= 1 {
            self.minibuffer.set_message("Can't kill the last buffer", true);
            return;
        }
        self.state.buffers.remove(id);
        let Some(replacement) = self.state.buffers.iter().next().map(|(bid, _)| bid) else { return };
        let replacement_cursor = self.state.buffers.get(replacement).map(|b| b.cursor()).unwrap_or_default();
        let window_ids: Vec<_> = self.state.windows.windows_top_to_bottom().map(|(wid, _)| wid).collect();
        for wid in window_ids {
            if let Some(window) = self.state.windows.get_mut(wid) {
                if window.buffer == id {
                    window.buffer = replacement;
                    window.cursor = replacement_cursor;
                }
            }
        }
        if self.state.windows.focused().buffer == replacement {
            self.state.focused_buffer_mut().set_cursor(replacement_cursor);
        }
    }

    fn apply_isearch(&mut self, text: &str) {
        let buffer = self.state.focused_buffer_mut();
        if core_actions::search::isearch_forward(buffer, text).is_err() {
            self.minibuffer.set_message("No match", true);
        }
    }
}

fn compute_candidates(kind: PromptKind, prefix: &str, state: &EditorState, current_buffer: BufferId) -> Vec<String> {
    match kind {
        PromptKind::Buffer => state
            .buffers
            .iter()
            .filter(|(id, _)| *id != current_buffer)
            .map(|(_, b)| b.display_name().to_string())
            .filter(|n| n.starts_with(prefix))
            .collect(),
        PromptKind::Search => Vec::new(),
        PromptKind::Command => core_keymap::all_command_names()
            .into_iter()
            .map(str::to_string)
            .filter(|n| n.starts_with(prefix))
            .collect(),
        PromptKind::Files | PromptKind::Directory => file_candidates(prefix, kind == PromptKind::Directory),
    }
}

fn file_candidates(prefix: &str, dirs_only: bool) -> Vec<String> {
    let expanded = expand_tilde(prefix);
    let path = Path::new(&expanded);

    let (dir, file_prefix) = if expanded.is_empty() || expanded.ends_with('/') {
        (path.to_path_buf(), String::new())
    } else {
        let dir = path
            .parent()
            .map(|p| if p.as_os_str().is_empty() { PathBuf::from(".") } else { p.to_path_buf() })
            .unwrap_or_else(|| PathBuf::from("."));
        let file_prefix = path.file_name().and_then(|s| s.to_str()).unwrap_or("").to_string();
        (dir, file_prefix)
    };

    let display_dir = if expanded.is_empty() || expanded.ends_with('/') {
        expanded.clone()
    } else {
        path.parent()
            .map(|p| {
                let s = p.to_string_lossy().to_string();
                if s.is_empty() { s } else { format!("{s}/") }
            })
            .unwrap_or_default()
    };

    let Ok(entries) = std::fs::read_dir(&dir) else { return Vec::new() };
    let mut out = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(&file_prefix) {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if dirs_only && !is_dir {
            continue;
        }
        let mut candidate = format!("{display_dir}{name}");
        if is_dir {
            candidate.push('/');
        }
        out.push(candidate);
    }
    out.sort();
    out
}

fn expand_tilde(input: &str) -> String {
    if let Some(rest) = input.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Ok(home) = std::env::var("HOME") {
                return format!("{home}{rest}");
            }
        }
    }
    input.to_string()
}

fn expand_tilde_path(input: &str) -> PathBuf {
    PathBuf::from(expand_tilde(input))
}
