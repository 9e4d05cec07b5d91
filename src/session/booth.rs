use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    PhotostripError, PhotostripResult,
    codec::{PHOTO_JPEG_QUALITY, RawImage, decode_capture, decode_image, encode_jpeg},
    compose::{CaptionFonts, StripComposer, StripGeometry},
    config::BoothConfig,
    filter::VintageFilter,
    session::{
        lock::SessionLocks,
        model::{NewSession, PhotoRecord, Session, SessionState},
        store::PhotoStore,
    },
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripOutcome {
    pub strip_path: PathBuf,
    pub download_url: String,
}

/// Process-wide photobooth service. Create one at startup and pass it to whatever serves
/// requests. Clones share session locks, so concurrent calls on one session are serialized.
#[derive(Clone, Debug)]
pub struct Booth {
    store: PhotoStore,
    filter: VintageFilter,
    composer: StripComposer,
    locks: SessionLocks,
}

impl Booth {
    pub fn new(store: PhotoStore, composer: StripComposer) -> Self {
        Self {
            store,
            filter: VintageFilter::default(),
            composer,
            locks: SessionLocks::default(),
        }
    }

    pub fn from_config(config: &BoothConfig) -> PhotostripResult<Self> {
        config.validate()?;
        let store = PhotoStore::open(&config.storage_root)?;
        let fonts = CaptionFonts::load(config.caption_fonts.as_slice(), config.load_system_fonts);
        Ok(Self::new(store, StripComposer::new(fonts)))
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    #[tracing::instrument(skip(self, new), fields(layout = %new.layout_name, count = new.photo_count))]
    pub fn create_session(&self, new: NewSession) -> PhotostripResult<Session> {
        StripGeometry::for_count(new.photo_count)?;
        let session = Session::new(new);
        self.store.save_session(&session)?;
        tracing::info!(session_id = %session.id, "session created");
        Ok(session)
    }

    pub fn session(&self, session_id: &str) -> PhotostripResult<Session> {
        self.store.load_session(session_id)
    }

    /// Filters one captured frame and records it at `photo_index`. `payload` is base64 image
    /// data, optionally as a data URL.
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn capture_photo(
        &self,
        session_id: &str,
        photo_index: u32,
        payload: &str,
    ) -> PhotostripResult<PhotoRecord> {
        self.record_capture(session_id, photo_index, || decode_capture(payload))
    }

    /// Same as [`Booth::capture_photo`] for already-binary image data.
    #[tracing::instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn capture_photo_bytes(
        &self,
        session_id: &str,
        photo_index: u32,
        bytes: &[u8],
    ) -> PhotostripResult<PhotoRecord> {
        self.record_capture(session_id, photo_index, || decode_image(bytes))
    }

    fn record_capture(
        &self,
        session_id: &str,
        photo_index: u32,
        decode: impl FnOnce() -> PhotostripResult<RawImage>,
    ) -> PhotostripResult<PhotoRecord> {
        // Fail fast before the filter runs; the check is repeated under the session lock.
        let session = self.store.load_session(session_id)?;
        check_capture(&session, photo_index)?;

        let raw = decode()?;
        let filtered = self.filter.apply(&raw)?;
        let jpeg = encode_jpeg(&filtered, PHOTO_JPEG_QUALITY)?;

        self.locks
            .with_session(session_id, || self.commit_capture(session_id, photo_index, &jpeg))
    }

    fn commit_capture(
        &self,
        session_id: &str,
        photo_index: u32,
        jpeg: &[u8],
    ) -> PhotostripResult<PhotoRecord> {
        let mut session = self.store.load_session(session_id)?;
        check_capture(&session, photo_index)?;

        let file_path = self.store.write_photo(session_id, photo_index, jpeg)?;
        let record = PhotoRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            photo_index,
            timestamp: Utc::now(),
            file_path: file_path.clone(),
        };
        session.photos.push(record.clone());
        if let Err(err) = self.store.save_session(&session) {
            self.store.discard_blob(&file_path);
            return Err(err);
        }

        tracing::info!(
            path = %record.file_path.display(),
            state = ?session.state(),
            "photo captured"
        );
        Ok(record)
    }

    /// Composes the strip for a READY session and marks it completed.
    #[tracing::instrument(skip(self))]
    pub fn generate_strip(&self, session_id: &str) -> PhotostripResult<StripOutcome> {
        self.locks
            .with_session(session_id, || self.generate_locked(session_id))
    }

    fn generate_locked(&self, session_id: &str) -> PhotostripResult<StripOutcome> {
        let mut session = self.store.load_session(session_id)?;
        match session.state() {
            SessionState::Composed => {
                return Err(PhotostripError::session(format!(
                    "strip for session '{session_id}' was already generated"
                )));
            }
            SessionState::Empty | SessionState::Accumulating => {
                return Err(PhotostripError::layout_mismatch(format!(
                    "incomplete photo session: {} of {} photos",
                    session.photos.len(),
                    session.photo_count
                )));
            }
            SessionState::Ready => {}
        }

        let ordered = session.ordered_photos().ok_or_else(|| {
            PhotostripError::layout_mismatch(format!(
                "session '{session_id}' photo indices are not 0..{} without gaps",
                session.photo_count
            ))
        })?;
        let blobs = ordered
            .iter()
            .map(|p| self.store.read_blob(&p.file_path))
            .collect::<PhotostripResult<Vec<_>>>()?;

        let strip = self.composer.compose_jpeg(&blobs, &session.layout())?;
        let strip_path = self.store.write_strip(session_id, &strip)?;

        session.strip_path = Some(strip_path.clone());
        session.completed = true;
        if let Err(err) = self.store.save_session(&session) {
            self.store.discard_blob(&strip_path);
            return Err(err);
        }

        tracing::info!(path = %strip_path.display(), bytes = strip.len(), "strip generated");
        Ok(StripOutcome {
            strip_path,
            download_url: session.download_url(),
        })
    }

    /// Persisted strip bytes, unchanged.
    pub fn download_strip(&self, session_id: &str) -> PhotostripResult<Vec<u8>> {
        let session = self.store.load_session(session_id)?;
        let path = session.strip_path.ok_or_else(|| {
            PhotostripError::not_found(format!("photo strip for session '{session_id}'"))
        })?;
        self.store.read_blob(&path)
    }
}

fn check_capture(session: &Session, photo_index: u32) -> PhotostripResult<()> {
    if session.state() == SessionState::Composed {
        return Err(PhotostripError::session(format!(
            "session '{}' already has a strip",
            session.id
        )));
    }
    if photo_index >= session.photo_count {
        return Err(PhotostripError::validation(format!(
            "photo index {photo_index} out of range for a {}-photo layout",
            session.photo_count
        )));
    }
    if session.photo(photo_index).is_some() {
        return Err(PhotostripError::session(format!(
            "photo {photo_index} of session '{}' was already captured",
            session.id
        )));
    }
    Ok(())
}
