//! Durable registry of seen users
//!
//! An append-only flat file with a `user_id` header and one identifier per
//! line. Appends are serialized behind one async mutex, and the in-memory set
//! makes repeated registrations no-ops.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Header line of the registry file
pub const REGISTRY_HEADER: &str = "user_id";

/// Errors that can occur during registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface for user registries
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Record `user_id` unless already present. Returns `true` for a new user.
    async fn register_if_absent(&self, user_id: i64) -> Result<bool, RegistryError>;
    /// All registered identifiers in registration order.
    async fn user_ids(&self) -> Vec<i64>;
    /// Number of registered users.
    async fn count(&self) -> usize;
    /// Path of the backing file, for exports.
    fn location(&self) -> PathBuf;
}

#[derive(Default)]
struct Entries {
    order: Vec<i64>,
    known: HashSet<i64>,
}

impl Entries {
    fn insert(&mut self, user_id: i64) -> bool {
        if self.known.insert(user_id) {
            self.order.push(user_id);
            true
        } else {
            false
        }
    }
}

/// File-backed [`UserStore`]
pub struct FileUserRegistry {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileUserRegistry {
    /// Open the registry at `path`, creating it with a header if missing.
    ///
    /// Older files with a different header or extra columns are read by
    /// taking the first column of every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let mut entries = Entries::default();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => {
                tokio::fs::write(&path, format!("{REGISTRY_HEADER}\n")).await?;
            }
            Ok(content) => {
                for (index, line) in content.lines().enumerate() {
                    let field = line.split(',').next().unwrap_or_default().trim();
                    if field.is_empty() {
                        continue;
                    }
                    match field.parse::<i64>() {
                        Ok(user_id) => {
                            entries.insert(user_id);
                        }
                        Err(_) if index == 0 => {}
                        Err(_) => warn!(line = index + 1, content = %line, "Skipping malformed registry line"),
                    }
                }
                if !content.ends_with('\n') {
                    append(&path, "\n").await?;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, format!("{REGISTRY_HEADER}\n")).await?;
                info!(path = %path.display(), "Created user registry");
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            path = %path.display(),
            users = entries.order.len(),
            "User registry loaded"
        );
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }
}

async fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    file.sync_data().await
}

#[async_trait]
impl UserStore for FileUserRegistry {
    async fn register_if_absent(&self, user_id: i64) -> Result<bool, RegistryError> {
        let mut entries = self.entries.lock().await;
        if entries.known.contains(&user_id) {
            return Ok(false);
        }
        append(&self.path, &format!("{user_id}\n")).await?;
        entries.insert(user_id);
        info!(user_id, total = entries.order.len(), "New user registered");
        Ok(true)
    }

    async fn user_ids(&self) -> Vec<i64> {
        self.entries.lock().await.order.clone()
    }

    async fn count(&self) -> usize {
        self.entries.lock().await.order.len()
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}
