//! Download collaborators: where generated reports end up.
//!
//! Report generation never touches the filesystem. Every report is rendered
//! into a [`ReportArtifact`] and handed to a [`DownloadSink`].

use crate::error::{CrawlError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    MasterReport,
    Csv,
    PageFile,
    SitemapReport,
}

/// A complete text blob with the file name it should be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    /// Relative path; per-page files include their domain folder.
    pub filename: String,
    pub content: String,
    pub kind: ArtifactKind,
    /// Whether an interactive collaborator should ask where to save it.
    pub prompt_save_location: bool,
}

impl ReportArtifact {
    pub fn new(filename: impl Into<String>, content: String, kind: ArtifactKind) -> Self {
        Self {
            filename: filename.into(),
            content,
            kind,
            prompt_save_location: false,
        }
    }

    pub fn prompting(mut self) -> Self {
        self.prompt_save_location = true;
        self
    }
}

pub trait DownloadSink: Send + Sync {
    fn deliver(&self, artifact: &ReportArtifact) -> Result<()>;
}

/// Collects artifacts in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<ReportArtifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<ReportArtifact> {
        self.artifacts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    pub fn find(&self, kind: ArtifactKind) -> Vec<ReportArtifact> {
        self.artifacts()
            .into_iter()
            .filter(|a| a.kind == kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, artifact: &ReportArtifact) -> Result<()> {
        self.artifacts
            .lock()
            .map_err(|_| CrawlError::Output("artifact store poisoned".to_string()))?
            .push(artifact.clone());
        Ok(())
    }
}

/// Writes artifacts beneath a root directory.
///
/// Per-page files never overwrite each other: a taken name gets a numeric
/// suffix. Reports with the same name are replaced.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_path(&self, artifact: &ReportArtifact) -> Result<PathBuf> {
        let relative = Path::new(&artifact.filename);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(CrawlError::Output(format!(
                "refusing to write outside output directory: {}",
                artifact.filename
            )));
        }

        let path = self.root.join(relative);
        if artifact.kind == ArtifactKind::PageFile {
            Ok(uniquify(path))
        } else {
            Ok(path)
        }
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, artifact: &ReportArtifact) -> Result<()> {
        let path = self.target_path(artifact)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        save_report(&artifact.content, &path)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// `name.txt` → `name (1).txt`, `name (2).txt`, … until unused.
fn uniquify(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| path.with_file_name(format!("{} ({}){}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}
