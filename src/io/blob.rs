use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::model::log::Attachment;

/// Error type for attachment uploads
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("attachment not found: {0}")]
    Missing(PathBuf),
    #[error("attachment has no file name: {0}")]
    NoFileName(PathBuf),
    #[error("could not upload {path}: {source}")]
    Upload { path: PathBuf, source: io::Error },
}

/// Outcome of a batch upload that did not fully succeed
#[derive(Debug)]
pub struct PartialUpload {
    pub error: BlobError,
    /// Blobs written before the failure; nothing references them
    pub orphaned: Vec<Attachment>,
}

/// Copies attachments under `daylog/blobs/<millis>-<name>` and hands back a
/// `file://` URL for each.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: &Path) -> Self {
        BlobStore {
            dir: dir.to_path_buf(),
        }
    }

    /// Upload one file.
    pub fn upload(&self, source: &Path) -> Result<Attachment, BlobError> {
        if !source.is_file() {
            return Err(BlobError::Missing(source.to_path_buf()));
        }
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .map(sanitize_name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| BlobError::NoFileName(source.to_path_buf()))?;

        let upload_err = |e: io::Error| BlobError::Upload {
            path: source.to_path_buf(),
            source: e,
        };
        fs::create_dir_all(&self.dir).map_err(upload_err)?;
        let target = self.reserve(&name).map_err(upload_err)?;
        fs::copy(source, &target).map_err(upload_err)?;

        let absolute = target.canonicalize().unwrap_or(target);
        tracing::debug!(blob = %absolute.display(), "uploaded attachment");
        Ok(Attachment {
            name,
            url: format!("file://{}", absolute.display()),
            kind: content_type(source).to_string(),
        })
    }

    /// Upload every file in parallel. Either all succeed, or the first error
    /// is returned together with the blobs that did get written.
    pub fn upload_all(&self, sources: &[PathBuf]) -> Result<Vec<Attachment>, PartialUpload> {
        let results: Vec<Result<Attachment, BlobError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|path| scope.spawn(move || self.upload(path)))
                .collect();
            handles
                .into_iter()
                .zip(sources)
                .map(|(handle, path)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(BlobError::Upload {
                            path: path.clone(),
                            source: io::Error::other("upload thread panicked"),
                        })
                    })
                })
                .collect()
        });

        let mut uploaded = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(attachment) => uploaded.push(attachment),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => tracing::warn!(error = %e, "additional upload failure"),
            }
        }
        match first_error {
            None => Ok(uploaded),
            Some(error) => Err(PartialUpload {
                error,
                orphaned: uploaded,
            }),
        }
    }

    /// Claim a fresh `<millis>-<name>` path. Same-millisecond uploads of the
    /// same name get a counter suffix.
    fn reserve(&self, name: &str) -> io::Result<PathBuf> {
        let millis = Utc::now().timestamp_millis();
        for n in 0u32.. {
            let file_name = if n == 0 {
                format!("{}-{}", millis, name)
            } else {
                format!("{}-{}-{}", millis, n, name)
            };
            let path = self.dir.join(file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::other("no free blob name"))
    }
}

/// Keep names path-safe: separators and control characters become `_`
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Content type guessed from the extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
