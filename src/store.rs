use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PredictError;

/// URL prefix under which stored artifacts are served.
pub const DEFAULT_URL_PREFIX: &str = "/static/uploads";

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const FALLBACK_EXTENSION: &str = "jpg";

/// Which image of a request pair an artifact holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The "before" image, tagged `t025`.
    Start,
    /// The "after" image, tagged `t105`.
    End,
}

impl Role {
    /// Tag embedded in stored filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            Role::Start => "t025",
            Role::End => "t105",
        }
    }

    /// Name of the multipart field carrying this image.
    pub fn field_name(&self) -> &'static str {
        match self {
            Role::Start => "start_file",
            Role::End => "end_file",
        }
    }
}

/// An uploaded image persisted under the upload root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Which image of the pair this is.
    pub role: Role,
    /// Name of the file inside the upload root.
    pub filename: String,
    /// Full location on disk.
    pub path: PathBuf,
    /// Retrieval path handed back to the client.
    pub public_url: String,
}

/// Flat-file store for uploaded images.
///
/// Files are named `{timestamp}_{role_tag}{ext}` and are never modified or
/// removed once written.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    url_prefix: String,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`, serving artifacts under
    /// [`DEFAULT_URL_PREFIX`]. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_url_prefix(root, DEFAULT_URL_PREFIX)
    }

    /// Creates a store rooted at `root`, serving artifacts under `url_prefix`.
    /// A trailing slash on the prefix is ignored.
    pub fn with_url_prefix(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory the artifacts are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` for `role` of the request stamped `timestamp_ms`.
    ///
    /// The caller is responsible for rejecting empty payloads.
    pub fn store(
        &self,
        role: Role,
        timestamp_ms: u64,
        bytes: &[u8],
        original_filename: Option<&str>,
    ) -> Result<StoredArtifact, PredictError> {
        let filename = format!(
            "{timestamp_ms}_{}.{}",
            role.tag(),
            resolve_extension(original_filename)
        );
        let path = self.root.join(&filename);

        fs::create_dir_all(&self.root)
            .and_then(|_| fs::write(&path, bytes))
            .map_err(|source| PredictError::Storage {
                path: path.clone(),
                source,
            })?;

        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(StoredArtifact {
            role,
            public_url: self.public_url(&filename),
            filename,
            path,
        })
    }

    /// Public retrieval path for a stored filename.
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }

    /// Maps a requested filename to its location, rejecting anything that
    /// could escape the upload root.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let valid = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\', '\0']);
        valid.then(|| self.root.join(filename))
    }

    /// Reads a previously stored artifact. Returns `Ok(None)` when the name is
    /// invalid or no regular file is stored under it.
    pub fn read(&self, filename: &str) -> std::io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(filename) else {
            return Ok(None);
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => fs::read(path).map(Some),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Picks the stored extension (without the dot) from a client filename.
///
/// Keeps `jpg`, `jpeg` and `png` (lowercased); anything else, including a
/// missing name or extension, becomes `jpg`. The payload is not inspected.
pub fn resolve_extension(original_filename: Option<&str>) -> &'static str {
    original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| ALLOWED_EXTENSIONS.into_iter().find(|allowed| *allowed == ext))
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Content type for a stored filename, based on its extension.
pub fn content_type(filename: &str) -> &'static str {
    match resolve_extension(Some(filename)) {
        "png" => "image/png",
        _ => "image/jpeg",
    }
}
