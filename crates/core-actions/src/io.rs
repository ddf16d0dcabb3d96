//! File load/save.
//!
//! Loading validates UTF-8 strictly (spec §6: embedded NUL or malformed
//! UTF-8 is rejected, not silently replaced) and normalizes CRLF to LF.
//! Saving writes through a temp file in the target's own directory, fsyncs
//! it, then renames it over the destination so a crash mid-write can never
//! leave a half-written file in the original's place.

use std::fs;
use std::io::{Read as _, Write as _};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::SystemTime;

use core_state::{Buffer, EditorError};
use core_text::validate_utf8;
use tracing::{info, warn};

/// Try to take a non-blocking, whole-file advisory lock (`flock`) so a
/// second session opening the same file is told one is already editing it.
/// Advisory locking is itself an external-OS-primitive concern (spec §1);
/// this is the thin adapter, in the same "raw `libc`, no crate wraps this"
/// style as `core-input`'s signal handling. The lock is only held for the
/// duration of `load` itself — `Buffer` keeps no live file descriptor, so
/// it can't hold the lock for the whole editing session; this catches two
/// sessions racing to open the file, not one modifying it mid-session.
fn try_lock_file(file: &fs::File) -> Result<(), EditorError> {
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(EditorError::LockConflict("another process".to_string()))
    }
}

pub fn load(path: &Path) -> Result<Buffer, EditorError> {
    let file = fs::File::open(path).map_err(|e| EditorError::IoFailed(e.to_string()))?;
    let lock_conflict = try_lock_file(&file).err();

    let mut bytes = Vec::new();
    (&file).read_to_end(&mut bytes).map_err(|e| EditorError::IoFailed(e.to_string()))?;
    let text = validate_utf8(&bytes).map_err(|_| EditorError::Utf8Invalid)?;
    let display_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("[No Name]")
        .to_string();
    let mut buffer = Buffer::from_text(display_name, &text, Some(path.to_path_buf()));
    if let Ok(mtime) = file.metadata().and_then(|m| m.modified()) {
        buffer.mark_clean(mtime);
    }
    if let Some(EditorError::LockConflict(holder)) = lock_conflict {
        warn!(target: "actions.io", path = %path.display(), holder = %holder, "lock_conflict");
        buffer.set_read_only(true);
        buffer.set_lock_holder(Some(holder));
    }
    info!(target: "actions.io", path = %path.display(), "file_loaded");
    Ok(buffer)
}

/// What a save actually did, beyond plain success (spec §7
/// `ExternalModification`: a one-time notice, not a blocked save).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Clean,
    /// The file had changed on disk since it was loaded; the save proceeded
    /// and overwrote it anyway, same as the original's save path (which
    /// never consults this check at all — a separate, non-blocking
    /// notifier owns telling the user about drift).
    ExternalModificationNoted,
}

/// Save `buffer` to `path`. A stale on-disk mtime is noted (spec §7
/// `ExternalModification`: "flag the buffer; one-time status message; next
/// save proceeds") but never blocks the write.
pub fn save(buffer: &mut Buffer, path: &Path) -> Result<SaveOutcome, EditorError> {
    let mut outcome = SaveOutcome::Clean;
    if let (Some(loaded_mtime), Ok(meta)) = (buffer.mtime(), fs::metadata(path)) {
        if let Ok(disk_mtime) = meta.modified() {
            if disk_mtime > loaded_mtime {
                warn!(target: "actions.io", path = %path.display(), "external_modification_detected");
                outcome = SaveOutcome::ExternalModificationNoted;
            }
        }
    }

    let text = buffer.to_text();
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| EditorError::IoFailed(e.to_string()))?;

    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file_mut()
            .set_permissions(meta.permissions())
            .map_err(|e| EditorError::IoFailed(e.to_string()))?;
    }

    let bytes = text.as_bytes();
    let mut written = 0;
    while written < bytes.len() {
        let n = tmp
            .as_file_mut()
            .write(&bytes[written..])
            .map_err(|e| EditorError::IoFailed(e.to_string()))?;
        if n == 0 {
            return Err(EditorError::IoFailed("short write".to_string()));
        }
        written += n;
    }
    tmp.as_file_mut().sync_all().map_err(|e| EditorError::IoFailed(e.to_string()))?;

    tmp.persist(path).map_err(|e| EditorError::IoFailed(e.error.to_string()))?;

    let mtime = fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or_else(|_| SystemTime::now());
    buffer.set_filename(path.to_path_buf());
    buffer.mark_clean(mtime);
    info!(target: "actions.io", path = %path.display(), "file_saved");
    Ok(outcome)
}

/// Read stdin fully, validating it the same way a file load would. Used
/// when the editor is invoked with piped input (spec §6).
pub fn load_stdin() -> Result<Buffer, EditorError> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|e| EditorError::IoFailed(e.to_string()))?;
    let text = validate_utf8(&bytes).map_err(|_| EditorError::Utf8Invalid)?;
    let mut buffer = Buffer::from_text("*stdin*", &text, None);
    buffer.set_read_only(true);
    Ok(buffer)
}
