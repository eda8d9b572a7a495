use std::path::{Path, PathBuf};

/// Profile photos stored as plain files under one upload directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
    public_prefix: String,
}

impl PhotoStore {
    /// Creates the upload directory if it does not exist yet.
    pub async fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Result<Self, String> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| format!("cannot create upload directory {}: {e}", root.display()))?;

        tracing::info!(root = %root.display(), "photo store initialized");

        Ok(Self {
            root,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the file and returns the stored (sanitized) file name.
    pub async fn upload(&self, file_name: &str, body: &[u8]) -> Result<String, String> {
        let stored = secure_filename(file_name).ok_or_else(|| format!("unusable file name: {file_name:?}"))?;
        let path = self.root.join(&stored);

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| format!("upload failed: {e}"))?;

        tracing::debug!(path = %path.display(), bytes = body.len(), "photo written");
        Ok(stored)
    }

    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_prefix, file_name)
    }
}

/// Reduces a client-supplied file name to a safe basename of ASCII letters,
/// digits, `.`, `_` and `-`. Returns `None` when nothing usable remains.
pub fn secure_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
