//! Completed interviews on disk: one immutable pretty-printed JSON document per
//! interview, named `{RolePrefix}_{SafeName}_{Timestamp}.json`.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::{answers::PersistedInterview, error::Result, role::Role};

pub const DEFAULT_ARCHIVE_DIR: &str = "catalogues";

/// A file that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub file: String,
    pub reason: String,
}

/// One archived interview and the file it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchivedInterview {
    pub file: String,
    pub interview: PersistedInterview,
}

/// Everything readable in the archive directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadedInterviews {
    pub interviews: Vec<ArchivedInterview>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadedInterviews {
    pub fn is_empty(&self) -> bool {
        self.interviews.is_empty()
    }

    pub fn len(&self) -> usize {
        self.interviews.len()
    }

    /// Interviews whose role tag classifies as `role`
    pub fn bucket(&self, role: Role) -> Vec<&PersistedInterview> {
        self.interviews
            .iter()
            .filter(|archived| archived.interview.role() == Some(role))
            .map(|archived| &archived.interview)
            .collect()
    }

    pub fn application(&self) -> Vec<&PersistedInterview> {
        self.bucket(Role::ApplicationOwner)
    }

    pub fn business(&self) -> Vec<&PersistedInterview> {
        self.bucket(Role::BusinessOwner)
    }

    pub fn all(&self) -> Vec<&PersistedInterview> {
        self.interviews.iter().map(|a| &a.interview).collect()
    }
}

/// Directory of persisted interviews
#[derive(Debug, Clone)]
pub struct InterviewArchive {
    dir: PathBuf,
}

impl InterviewArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `interview` to a new file and returns its path.
    ///
    /// Existing files are never overwritten: when the name is already taken
    /// (two interviews for the same entity in the same second) a numeric
    /// suffix is added.
    pub async fn save(&self, interview: &PersistedInterview) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let prefix = interview
            .role()
            .map(|role| role.file_prefix())
            .unwrap_or_else(|| interview.stakeholder_role.replace(' ', ""));
        let stem = file_stem(&prefix, interview.representative_name(), Local::now());
        let body = serde_json::to_vec_pretty(interview)?;

        let mut attempt = 0u32;
        loop {
            let file_name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, attempt)
            };
            let path = self.dir.join(file_name);

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&body).await?;
                    file.flush().await?;
                    info!(path = %path.display(), "interview archived");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Loads every `*.json` file in name order, skipping unreadable ones.
    pub async fn load_all(&self) -> Result<LoadedInterviews> {
        let mut loaded = LoadedInterviews::default();
        if fs::metadata(&self.dir).await.is_err() {
            fs::create_dir_all(&self.dir).await?;
            return Ok(loaded);
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && entry.file_type().await?.is_file()
            {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parsed = match fs::read_to_string(&path).await {
                Ok(text) => serde_json::from_str::<PersistedInterview>(&text)
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match parsed {
                Ok(interview) => loaded.interviews.push(ArchivedInterview { file, interview }),
                Err(reason) => {
                    warn!(file = %file, reason = %reason, "skipping unreadable interview file");
                    loaded.warnings.push(LoadWarning { file, reason });
                }
            }
        }

        info!(
            dir = %self.dir.display(),
            interviews = loaded.interviews.len(),
            skipped = loaded.warnings.len(),
            "archive loaded"
        );
        Ok(loaded)
    }
}

/// Replaces characters that would break the file name.
pub fn safe_name(name: &str) -> String {
    name.replace([' ', '/', '\\'], "_")
}

fn file_stem(prefix: &str, name: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        safe_name(name),
        at.format("%Y%m%d_%H%M%S")
    )
}
