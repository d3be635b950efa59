use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::shared::constants::VIDEO_EXTENSIONS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Analyze a recorded video (or a folder of them) with a worker pool.
    Batch,
    /// Analyze a live capture device until it ends or is cancelled.
    Realtime,
}

impl FromStr for AnalysisMode {
    type Err = InputValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(AnalysisMode::Batch),
            "realtime" => Ok(AnalysisMode::Realtime),
            _ => Err(InputValidationError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Batch => f.write_str("batch"),
            AnalysisMode::Realtime => f.write_str("realtime"),
        }
    }
}

/// Rejection of invocation parameters, before any frame is read.
#[derive(Error, Debug, PartialEq)]
pub enum InputValidationError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported video format: {} (expected one of: {})", .0.display(), VIDEO_EXTENSIONS.join(", "))]
    UnsupportedExtension(PathBuf),
    #[error("no supported videos in folder: {}", .0.display())]
    EmptyFolder(PathBuf),
    #[error("an input video or folder is required in batch mode")]
    MissingInput,
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),
    #[error("unknown mode {0:?} (expected \"batch\" or \"realtime\")")]
    UnknownMode(String),
    #[error("realtime mode reads from a capture device; {0} only applies to batch mode")]
    BatchOnlyOption(&'static str),
}

/// What a validated request will analyze.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisTarget {
    File(PathBuf),
    /// Every supported video in a folder, sorted by path.
    Folder(Vec<PathBuf>),
    Live,
}

/// Invocation parameters as given by the caller.
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    pub input: Option<PathBuf>,
    pub workers: usize,
    pub mode: AnalysisMode,
}

impl AnalysisRequest {
    /// Checks the request and resolves its target.
    ///
    /// Realtime requests skip the file checks but may not name an input.
    pub fn validate(&self) -> Result<AnalysisTarget, InputValidationError> {
        if self.workers == 0 {
            return Err(InputValidationError::InvalidWorkerCount(self.workers));
        }

        match self.mode {
            AnalysisMode::Realtime => match self.input {
                Some(_) => Err(InputValidationError::BatchOnlyOption("an input path")),
                None => Ok(AnalysisTarget::Live),
            },
            AnalysisMode::Batch => {
                let input = self
                    .input
                    .as_deref()
                    .ok_or(InputValidationError::MissingInput)?;
                resolve_batch_input(input)
            }
        }
    }
}

fn resolve_batch_input(input: &Path) -> Result<AnalysisTarget, InputValidationError> {
    if !input.exists() {
        return Err(InputValidationError::NotFound(input.to_path_buf()));
    }

    if input.is_dir() {
        let mut videos: Vec<PathBuf> = std::fs::read_dir(input)
            .map_err(|_| InputValidationError::NotFound(input.to_path_buf()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_video(path))
            .collect();
        if videos.is_empty() {
            return Err(InputValidationError::EmptyFolder(input.to_path_buf()));
        }
        videos.sort();
        return Ok(AnalysisTarget::Folder(videos));
    }

    if !is_video(input) {
        return Err(InputValidationError::UnsupportedExtension(
            input.to_path_buf(),
        ));
    }
    Ok(AnalysisTarget::File(input.to_path_buf()))
}

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
