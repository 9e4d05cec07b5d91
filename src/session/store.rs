use std::{
    fs::OpenOptions,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{PhotostripError, PhotostripResult, session::model::Session};

/// Filesystem layout for persisted artifacts:
///
/// - `uploads/{session}_photo_{index}_{token}.jpg`
/// - `uploads/strips/strip_{session}_{token}.jpg`
/// - `sessions/{session}.json`
///
/// Image blobs are write-once; session documents are replaced atomically on update.
#[derive(Clone, Debug)]
pub struct PhotoStore {
    root: PathBuf,
    uploads_dir: PathBuf,
    strips_dir: PathBuf,
    sessions_dir: PathBuf,
}

impl PhotoStore {
    pub fn open(root: impl Into<PathBuf>) -> PhotostripResult<Self> {
        let root = root.into();
        let uploads_dir = root.join("uploads");
        let strips_dir = uploads_dir.join("strips");
        let sessions_dir = root.join("sessions");
        for dir in [&uploads_dir, &strips_dir, &sessions_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create store dir '{}'", dir.display()))?;
        }
        Ok(Self {
            root,
            uploads_dir,
            strips_dir,
            sessions_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_photo(
        &self,
        session_id: &str,
        photo_index: u32,
        jpeg: &[u8],
    ) -> PhotostripResult<PathBuf> {
        validate_id(session_id)?;
        let name = format!("{session_id}_photo_{photo_index}_{}.jpg", unique_token());
        let path = self.uploads_dir.join(name);
        write_once(&path, jpeg)?;
        Ok(path)
    }

    pub fn write_strip(&self, session_id: &str, jpeg: &[u8]) -> PhotostripResult<PathBuf> {
        validate_id(session_id)?;
        let name = format!("strip_{session_id}_{}.jpg", unique_token());
        let path = self.strips_dir.join(name);
        write_once(&path, jpeg)?;
        Ok(path)
    }

    pub fn read_blob(&self, path: &Path) -> PhotostripResult<Vec<u8>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                PhotostripError::not_found(format!("blob '{}'", path.display())),
            ),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read blob '{}'", path.display()))
                .into()),
        }
    }

    /// Removes a blob whose record could not be saved. Failure is logged, not returned, so
    /// the caller can still report the original error.
    pub fn discard_blob(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "discarded unrecorded blob"),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to discard unrecorded blob");
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> PhotostripResult<()> {
        let path = self.session_path(&session.id)?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(session).context("serialize session document")?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("write session document '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("replace session document '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_session(&self, session_id: &str) -> PhotostripResult<Session> {
        let path = self.session_path(session_id)?;
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PhotostripError::not_found(format!(
                    "session '{session_id}'"
                )));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read session document '{}'", path.display()))
                    .into());
            }
        };
        let session = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse session document '{}'", path.display()))?;
        Ok(session)
    }

    fn session_path(&self, session_id: &str) -> PhotostripResult<PathBuf> {
        validate_id(session_id)?;
        Ok(self.sessions_dir.join(format!("{session_id}.json")))
    }
}

/// Eight hex characters, enough to keep repeated captures of one index apart.
fn unique_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(8);
    token
}

fn validate_id(id: &str) -> PhotostripResult<()> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(PhotostripError::validation(format!(
            "invalid session id '{id}'"
        )));
    }
    Ok(())
}

fn write_once(path: &Path, bytes: &[u8]) -> PhotostripResult<()> {
    let mut f = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(PhotostripError::session(format!(
                "'{}' already exists",
                path.display()
            )));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("create '{}'", path.display()))
                .into());
        }
    };
    f.write_all(bytes)
        .with_context(|| format!("write '{}'", path.display()))?;
    f.sync_all()
        .with_context(|| format!("sync '{}'", path.display()))?;
    Ok(())
}
