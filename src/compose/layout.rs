use serde::{Deserialize, Serialize};

use crate::{PhotostripError, PhotostripResult};

pub const CANVAS_WIDTH: u32 = 400;
pub const PHOTO_SIZE: u32 = 380;
pub const MARGIN: u32 = 10;
pub const CAPTION_HEIGHT: u32 = 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    pub layout_name: String,
    pub photo_count: u32,
}

impl LayoutSpec {
    pub fn new(photo_count: u32, layout_name: impl Into<String>) -> Self {
        Self {
            layout_id: None,
            layout_name: layout_name.into(),
            photo_count,
        }
    }

    /// The layouts offered on the booth's selection screen.
    pub fn presets() -> Vec<LayoutSpec> {
        [
            ("layout-a", "Classic Duo", 2),
            ("layout-b", "Triple Story", 3),
            ("layout-c", "Quad Vision", 4),
            ("layout-d", "Memory Gallery", 6),
        ]
        .into_iter()
        .map(|(id, name, count)| LayoutSpec {
            layout_id: Some(id.to_string()),
            layout_name: name.to_string(),
            photo_count: count,
        })
        .collect()
    }

    pub fn preset(layout_id: &str) -> Option<LayoutSpec> {
        Self::presets()
            .into_iter()
            .find(|l| l.layout_id.as_deref() == Some(layout_id))
    }

    pub fn geometry(&self) -> PhotostripResult<StripGeometry> {
        StripGeometry::for_count(self.photo_count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// One photo per row, stacked at a fixed `PHOTO_SIZE + MARGIN` stride.
    Column { photo_height: u32 },
    /// Cells fill the canvas evenly; photos are stretched to the cell.
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GeometryRow {
    photo_count: u32,
    cols: u32,
    rows: u32,
    placement: Placement,
}

const GEOMETRY_TABLE: &[GeometryRow] = &[
    GeometryRow {
        photo_count: 2,
        cols: 1,
        rows: 2,
        placement: Placement::Column {
            photo_height: PHOTO_SIZE,
        },
    },
    GeometryRow {
        photo_count: 3,
        cols: 1,
        rows: 3,
        placement: Placement::Column {
            photo_height: PHOTO_SIZE / 2,
        },
    },
    GeometryRow {
        photo_count: 4,
        cols: 2,
        rows: 2,
        placement: Placement::Grid,
    },
    GeometryRow {
        photo_count: 6,
        cols: 2,
        rows: 3,
        placement: Placement::Grid,
    },
];

/// Where one photo lands on the strip canvas and the size it is resized to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripGeometry {
    pub photo_count: u32,
    pub cols: u32,
    pub rows: u32,
    pub placement: Placement,
}

impl StripGeometry {
    pub fn for_count(photo_count: u32) -> PhotostripResult<Self> {
        GEOMETRY_TABLE
            .iter()
            .find(|row| row.photo_count == photo_count)
            .map(|row| StripGeometry {
                photo_count: row.photo_count,
                cols: row.cols,
                rows: row.rows,
                placement: row.placement,
            })
            .ok_or_else(|| {
                PhotostripError::validation(format!(
                    "unsupported photo_count {photo_count} (expected one of {})",
                    supported_counts()
                ))
            })
    }

    pub fn canvas_width(&self) -> u32 {
        CANVAS_WIDTH
    }

    pub fn canvas_height(&self) -> u32 {
        self.rows * PHOTO_SIZE + (self.rows + 1) * MARGIN + CAPTION_HEIGHT
    }

    pub fn cell_size(&self) -> (u32, u32) {
        match self.placement {
            Placement::Column { photo_height } => (PHOTO_SIZE, photo_height),
            Placement::Grid => {
                let w = (self.canvas_width() - (self.cols + 1) * MARGIN) / self.cols;
                let h = (self.canvas_height() - CAPTION_HEIGHT - (self.rows + 1) * MARGIN)
                    / self.rows;
                (w, h)
            }
        }
    }

    pub fn slot(&self, index: u32) -> Slot {
        let (width, height) = self.cell_size();
        let (x, y) = match self.placement {
            Placement::Column { .. } => (MARGIN, MARGIN + index * (PHOTO_SIZE + MARGIN)),
            Placement::Grid => {
                let col = index % self.cols;
                let row = index / self.cols;
                (
                    MARGIN + col * (width + MARGIN),
                    MARGIN + row * (height + MARGIN),
                )
            }
        };
        Slot {
            x,
            y,
            width,
            height,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.photo_count).map(|i| self.slot(i))
    }
}

fn supported_counts() -> String {
    GEOMETRY_TABLE
        .iter()
        .map(|row| row.photo_count.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
