use opencv::{core, prelude::*, tracking};

use crate::bbox::{BBox, Ltwh};
use crate::error::Error;

/// Single-object visual tracker. Each instance is seeded once by its backend
/// and belongs to exactly one track for its lifetime.
pub trait VisualTracker {
    type Frame;

    /// Re-estimates the object's box on the given frame. `Ok(None)` means the
    /// tracker lost its object and the owning track must be retired.
    fn update(&mut self, frame: &Self::Frame) -> Result<Option<BBox<Ltwh>>, Error>;
}

/// Factory seeding fresh trackers on a frame and an initial box.
pub trait TrackerBackend {
    type Frame;
    type Tracker: VisualTracker<Frame = Self::Frame>;

    fn spawn(&mut self, frame: &Self::Frame, bbox: &BBox<Ltwh>) -> Result<Self::Tracker, Error>;
}

/// Kernelized Correlation Filter tracker from OpenCV contrib.
pub struct KcfTracker {
    inner: core::Ptr<tracking::TrackerKCF>,
}

impl VisualTracker for KcfTracker {
    type Frame = core::Mat;

    fn update(&mut self, frame: &core::Mat) -> Result<Option<BBox<Ltwh>>, Error> {
        let mut rect = core::Rect::default();

        // KCF reports a lost target either as `false` or as an error,
        // depending on the OpenCV build.
        match self.inner.update(frame, &mut rect) {
            Ok(true) => Ok(Some(BBox::ltwh(
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
            ))),
            _ => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct KcfBackend;

impl TrackerBackend for KcfBackend {
    type Frame = core::Mat;
    type Tracker = KcfTracker;

    fn spawn(&mut self, frame: &core::Mat, bbox: &BBox<Ltwh>) -> Result<KcfTracker, Error> {
        let params = tracking::TrackerKCF_Params::default()?;
        let mut inner = tracking::TrackerKCF::create(params)?;
        inner.init(frame, to_rect(bbox))?;

        Ok(KcfTracker { inner })
    }
}

fn to_rect(bbox: &BBox<Ltwh>) -> core::Rect {
    core::Rect::new(
        bbox.left() as i32,
        bbox.top() as i32,
        bbox.width() as i32,
        bbox.height() as i32,
    )
}
