//! Transcript discovery and loading.
//!
//! Reads chat exports from disk into memory in full before parsing. A path
//! may name a single export or a directory, which is walked recursively for
//! `.txt` files.

use std::path::{Path, PathBuf};

use sentinel_core::error::{Result, SentinelError};
use tracing::{debug, warn};

/// Raw contents of one transcript file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// File name without directories, used as the session title.
    pub file_name: String,
    /// Full path the text was read from.
    pub path: PathBuf,
    /// Decoded text. Invalid UTF-8 is replaced, a leading BOM is removed.
    pub text: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.txt` files recursively under `dir`, sorted by path.
pub fn find_transcript_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Transcript path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("txt"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read a single transcript file into memory.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let bytes = std::fs::read(path).map_err(|source| SentinelError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let text = decode_text(&bytes);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read {} bytes from {}", bytes.len(), path.display());

    Ok(Transcript {
        file_name,
        path: path.to_path_buf(),
        text,
    })
}

/// Load every transcript named by `path`.
///
/// A file path yields exactly one transcript. A directory yields one per
/// `.txt` file found; an empty directory is a [`SentinelError::NoTranscripts`]
/// error. Unreadable files inside a directory are skipped with a warning.
pub fn load_transcripts(path: &Path) -> Result<Vec<Transcript>> {
    if !path.is_dir() {
        return Ok(vec![load_transcript(path)?]);
    }

    let files = find_transcript_files(path);
    if files.is_empty() {
        return Err(SentinelError::NoTranscripts(path.to_path_buf()));
    }

    let mut transcripts = Vec::with_capacity(files.len());
    for file in &files {
        match load_transcript(file) {
            Ok(t) => transcripts.push(t),
            Err(e) => warn!("{}", e),
        }
    }

    debug!(
        "Loaded {} of {} transcript files from {}",
        transcripts.len(),
        files.len(),
        path.display()
    );

    Ok(transcripts)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Lossy UTF-8 decode with the byte-order mark stripped.
fn decode_text(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.starts_with('\u{feff}') {
        text.remove(0);
    }
    text
}

// ── Tests ─────────────────────────────────────────────────────────────────────
