use std::path::{Path, PathBuf};

use analysis::source::{JsonLinesSource, SourceError};

#[derive(Debug, Clone)]
pub enum RecordingData {
    MemMapped(std::sync::Arc<memmap2::Mmap>),
    Preloaded(std::sync::Arc<[u8]>),
}

/// One recording on disk, ready to be analysed.
#[derive(Debug, Clone)]
pub struct MatchInput {
    pub path: PathBuf,
    data: RecordingData,
}

impl MatchInput {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;

        // empty files cannot be mapped on every platform
        let data = if file.metadata()?.len() == 0 {
            RecordingData::Preloaded(std::sync::Arc::from(Vec::new()))
        } else {
            let mmap = unsafe { memmap2::MmapOptions::new().map(&file)? };
            RecordingData::MemMapped(std::sync::Arc::new(mmap))
        };

        Ok(Self {
            path: path.to_owned(),
            data,
        })
    }

    pub fn from_bytes(path: impl Into<PathBuf>, bytes: impl Into<std::sync::Arc<[u8]>>) -> Self {
        Self {
            path: path.into(),
            data: RecordingData::Preloaded(bytes.into()),
        }
    }

    pub fn data(&self) -> &[u8] {
        match &self.data {
            RecordingData::MemMapped(v) => v,
            RecordingData::Preloaded(v) => v,
        }
    }

    /// File name without its extension, used to name the exports.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "match".to_owned())
    }

    pub fn source(&self) -> Result<JsonLinesSource<&[u8]>, SourceError> {
        JsonLinesSource::new(self.data())
    }
}
