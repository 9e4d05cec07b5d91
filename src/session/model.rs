use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compose::LayoutSpec;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub layout_id: String,
    pub layout_name: String,
    pub photo_count: u32,
}

impl From<&LayoutSpec> for NewSession {
    fn from(layout: &LayoutSpec) -> Self {
        Self {
            layout_id: layout.layout_id.clone().unwrap_or_default(),
            layout_name: layout.layout_name.clone(),
            photo_count: layout.photo_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub session_id: String,
    pub photo_index: u32,
    pub timestamp: DateTime<Utc>,
    pub file_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub layout_id: String,
    pub layout_name: String,
    pub photo_count: u32,
    #[serde(default)]
    pub photos: Vec<PhotoRecord>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub strip_path: Option<PathBuf>,
}

/// Session lifecycle as seen by the compositing core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Empty,
    Accumulating,
    Ready,
    Composed,
}

impl Session {
    pub fn new(new: NewSession) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            layout_id: new.layout_id,
            layout_name: new.layout_name,
            photo_count: new.photo_count,
            photos: Vec::new(),
            created_at: Utc::now(),
            completed: false,
            strip_path: None,
        }
    }

    pub fn layout(&self) -> LayoutSpec {
        LayoutSpec {
            layout_id: Some(self.layout_id.clone()).filter(|id| !id.is_empty()),
            layout_name: self.layout_name.clone(),
            photo_count: self.photo_count,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.completed || self.strip_path.is_some() {
            return SessionState::Composed;
        }
        match self.photos.len() {
            0 => SessionState::Empty,
            n if n < self.photo_count as usize => SessionState::Accumulating,
            _ => SessionState::Ready,
        }
    }

    pub fn photo(&self, photo_index: u32) -> Option<&PhotoRecord> {
        self.photos.iter().find(|p| p.photo_index == photo_index)
    }

    /// Photos sorted by index, provided they are exactly `0..photo_count` with no gaps.
    pub fn ordered_photos(&self) -> Option<Vec<&PhotoRecord>> {
        let mut photos: Vec<&PhotoRecord> = self.photos.iter().collect();
        photos.sort_by_key(|p| p.photo_index);
        let contiguous = photos.len() == self.photo_count as usize
            && photos
                .iter()
                .enumerate()
                .all(|(i, p)| p.photo_index as usize == i);
        contiguous.then_some(photos)
    }

    pub fn download_url(&self) -> String {
        format!("/api/photos/download/{}", self.id)
    }

    pub fn download_filename(&self) -> String {
        format!("photobooth_strip_{}.jpg", self.id)
    }
}
