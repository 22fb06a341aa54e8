use crate::config::cli::LocalStorage;
use crate::core::Storage;
use crate::domain::model::Timeline;
use crate::utils::error::Result;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum TimelineDocument {
    Many(Vec<Timeline>),
    One(Timeline),
}

/// Timelines read from storage plus the number of files that could not be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineBatch {
    pub timelines: Vec<Timeline>,
    pub skipped_files: usize,
}

/// A JSON file holds either one timeline object or an array of them.
pub fn parse_timeline_document(bytes: &[u8]) -> Result<Vec<Timeline>> {
    Ok(match serde_json::from_slice::<TimelineDocument>(bytes)? {
        TimelineDocument::Many(timelines) => timelines,
        TimelineDocument::One(timeline) => vec![timeline],
    })
}

pub struct TimelineReader<S: Storage> {
    storage: S,
    files: Option<Vec<String>>,
}

impl<S: Storage> TimelineReader<S> {
    /// Reads every `*.json` file in the storage root.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            files: None,
        }
    }

    pub fn with_files(storage: S, files: Vec<String>) -> Self {
        Self {
            storage,
            files: Some(files),
        }
    }

    pub async fn read_all(&self) -> Result<TimelineBatch> {
        let files = match &self.files {
            Some(files) => files.clone(),
            None => self.storage.list_files("json").await?,
        };
        tracing::debug!("Reading timelines from {} file(s)", files.len());

        let mut batch = TimelineBatch::default();
        for file in files {
            let bytes = match self.storage.read_file(&file).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping {}: {}", file, e);
                    batch.skipped_files += 1;
                    continue;
                }
            };

            match parse_timeline_document(&bytes) {
                Ok(timelines) => batch.timelines.extend(timelines),
                Err(e) => {
                    tracing::warn!("⚠️ Error reading {}: {}", file, e);
                    batch.skipped_files += 1;
                }
            }
        }

        Ok(batch)
    }
}

impl TimelineReader<LocalStorage> {
    /// A directory is scanned for `*.json`; a file path is read on its own.
    pub fn for_path(path: &str) -> Self {
        let p = Path::new(path);
        if p.is_file() {
            let parent = p
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.to_string_lossy().into_owned())
                .unwrap_or_else(|| ".".to_string());
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Self::with_files(LocalStorage::new(parent), vec![name])
        } else {
            Self::new(LocalStorage::new(path.to_string()))
        }
    }
}
