use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};

/// One foreground blob reported by a detector for a single frame.
/// Contains (x,y) of the left-top corner, (width,height) of the bounding box
/// in frame pixels and the box area used by the minimum-area filter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(rename = "a")]
    pub area: f32,
}

impl Detection {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            area: w * h,
        }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltwh> {
        BBox::ltwh(self.x, self.y, self.w, self.h)
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.x + self.w / 2.
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.y + self.h / 2.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_preserves_corner_and_size() {
        let det = Detection::new(10.0, 20.0, 40.0, 30.0);
        let bbox = det.bbox();

        assert_eq!(bbox.left(), 10.0);
        assert_eq!(bbox.top(), 20.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 30.0);
        assert_eq!(det.area, 1200.0);
    }

    #[test]
    fn center_matches_bbox_center() {
        let det = Detection::new(0.0, 290.0, 20.0, 20.0);

        assert_eq!(det.cx(), det.bbox().cx());
        assert_eq!(det.cy(), 300.0);
    }
}
