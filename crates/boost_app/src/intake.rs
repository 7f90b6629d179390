use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use boost_core::IncomingFile;

/// Reads one candidate file from disk. The media type is guessed from the
/// extension; non-image types are rejected later by the state machine.
pub fn read_candidate(path: &Path) -> Result<IncomingFile> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let media_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(IncomingFile {
        name,
        media_type,
        bytes: Arc::new(bytes),
    })
}
