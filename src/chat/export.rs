//! Transcript export.
//!
//! The export holds every user and assistant turn, one JSON object per line,
//! without the system turn.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Role, Turn};

/// File name offered for downloads.
pub const EXPORT_FILE_NAME: &str = "ai-talks-chat.json";

/// Declared content type: one JSON document per line.
pub const EXPORT_MIME: &str = "application/x-ndjson";

/// A downloadable transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name.
    pub file_name: &'static str,
    /// Declared content type.
    pub mime: &'static str,
    /// The exported text.
    pub data: String,
}

impl ExportArtifact {
    /// Writes the artifact to `path`.
    ///
    /// A directory path receives a file named [`EXPORT_FILE_NAME`]. Returns
    /// the path written.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let target = if path.is_dir() {
            path.join(self.file_name)
        } else {
            path.to_path_buf()
        };
        fs::write(&target, &self.data)
            .map_err(|err| Error::io("failed to write transcript export", err))?;
        Ok(target)
    }
}

/// Exports `transcript`, leaving out the system turn.
pub fn export_transcript(transcript: &[Turn]) -> Result<ExportArtifact> {
    let lines = transcript
        .iter()
        .filter(|turn| turn.role != Role::System)
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ExportArtifact {
        file_name: EXPORT_FILE_NAME,
        mime: EXPORT_MIME,
        data: lines.join("\n"),
    })
}
