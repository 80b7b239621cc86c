use serde_derive::Serialize;

use crate::bbox::{BBox, Ltwh};

/// Per-track snapshot handed out for rendering and dumping.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub track_id: u32,
    pub bbox: BBox<Ltwh>,
    pub counted: bool,
}
