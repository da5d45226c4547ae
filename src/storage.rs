//! Object store boundary and the deterministic output key layout.

use crate::error::{CaptionflowError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
    async fn write_object(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;
}

/// Object store backed by a directory: `{root}/{bucket}/{key}`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let escapes = bucket.is_empty()
            || key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(CaptionflowError::Provider(format!(
                "Invalid object location: {}/{}",
                bucket, key
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        if !path.exists() {
            return Err(CaptionflowError::FileNotFound(s3_uri(bucket, key)));
        }
        debug!("Reading {:?}", path);
        Ok(fs::read(&path).await?)
    }

    async fn write_object(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        debug!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(&path, bytes).await?;
        Ok(())
    }
}

pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// Name of the media file without its extension (`talk.final.mp4` → `talk`).
pub fn file_stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

pub fn output_prefix(uuid: &str) -> String {
    format!("outputs/{}/", uuid)
}

pub fn audio_key(uuid: &str, file_name: &str) -> String {
    format!("{}{}_audio.mp4", output_prefix(uuid), file_stem(file_name))
}

pub fn transcript_key(uuid: &str) -> String {
    format!("{}Transcript.json", output_prefix(uuid))
}

pub fn web_captions_key(uuid: &str, language: &str) -> String {
    format!("{}WebCaptions_{}", output_prefix(uuid), language)
}

pub fn srt_key(uuid: &str, language: &str) -> String {
    format!("{}Captions_{}.srt", output_prefix(uuid), language)
}

pub fn hls_prefix(uuid: &str) -> String {
    format!("{}HLS/", output_prefix(uuid))
}

pub fn hls_playlist_key(uuid: &str, file_name: &str) -> String {
    format!("{}{}.m3u8", hls_prefix(uuid), file_stem(file_name))
}
