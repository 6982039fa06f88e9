//! Local filesystem storage implementation.
//!
//! Keeps the snapshot in a single UTF-8 CSV file with a `title,link,date`
//! header. Writes go to a temporary sibling and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::storage::PostStore;

const HEADER: [&str; 3] = ["title", "link", "date"];

/// One stored row. Every column is optional so partial rows still parse.
#[derive(Debug, Deserialize)]
struct StoredRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    date: String,
}

/// CSV file storage backend.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    path: PathBuf,
}

impl CsvStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, returning None if it doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        let written = async {
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(AppError::Io(e));
        }
        Ok(())
    }

    /// Parse stored rows, skipping any that are malformed or have no link.
    fn parse(bytes: &[u8]) -> Vec<Post> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let mut posts = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<StoredRow>() {
            match row {
                Ok(row) if !row.link.trim().is_empty() => posts.push(Post {
                    title: row.title,
                    link: row.link.trim().to_string(),
                    date: row.date,
                }),
                Ok(_) => skipped += 1,
                Err(e) => {
                    log::debug!("Skipping unreadable row: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} unusable rows in stored posts", skipped);
        }
        posts
    }

    /// Encode posts as CSV. The header is written even when there are none.
    fn encode(posts: &[Post]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for post in posts {
            writer.write_record([&post.title, &post.link, &post.date])?;
        }
        writer.into_inner().map_err(|e| AppError::Io(e.into_error()))
    }
}

#[async_trait]
impl PostStore for CsvStorage {
    async fn load_posts(&self) -> Result<Vec<Post>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Self::parse(&bytes)),
            None => {
                log::info!("No stored posts at {}, treating as first run", self.path.display());
                Ok(Vec::new())
            }
        }
    }

    async fn save_current(&self, posts: &[Post]) -> Result<()> {
        let bytes = Self::encode(posts)?;
        self.write_bytes(&bytes).await?;
        log::info!("Saved {} posts to {}", posts.len(), self.path.display());
        Ok(())
    }
}
