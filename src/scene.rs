use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, info};

use crate::bbox::{BBox, Ltwh};
use crate::line::CountingLine;
use crate::tracker::{TrackerBackend, VisualTracker};
use crate::{Detection, Track};

use crate::error::Error;

static SEQ_ID: AtomicU32 = AtomicU32::new(1);

/// One followed object: identity, the latest box reported by its tracker and
/// whether it has already crossed the counting line. The tracker instance
/// lives and dies with the record.
#[derive(Debug)]
pub struct Vehicle<T> {
    pub id: u32,
    pub bbox: BBox<Ltwh>,
    pub counted: bool,
    tracker: T,
}

impl<T> From<&Vehicle<T>> for Track {
    fn from(v: &Vehicle<T>) -> Track {
        Track {
            track_id: v.id,
            bbox: v.bbox,
            counted: v.counted,
        }
    }
}

/// Owner of the active track set. Associates fresh detections with tracks,
/// drives every track's tracker once per frame and applies the counting-line
/// rule.
pub struct Scene<B: TrackerBackend> {
    backend: B,
    line: CountingLine,
    vehicles: Vec<Vehicle<B::Tracker>>,
    count: u64,
}

impl<B: TrackerBackend> Scene<B> {
    pub fn new(backend: B, line: CountingLine) -> Self {
        Self {
            backend,
            line,
            vehicles: Vec::with_capacity(32),
            count: 0,
        }
    }

    /// Runs one frame through the three phases in order: refresh every track
    /// from its tracker, spawn tracks for unmatched detections, apply the
    /// counting line.
    pub fn process(&mut self, frame: &B::Frame, detections: &[Detection]) -> Result<(), Error> {
        self.refresh(frame)?;
        self.associate(frame, detections)?;
        self.apply_line();

        Ok(())
    }

    fn refresh(&mut self, frame: &B::Frame) -> Result<(), Error> {
        let mut i = 0;
        while i < self.vehicles.len() {
            match self.vehicles[i].tracker.update(frame)? {
                Some(bbox) => {
                    self.vehicles[i].bbox = bbox;
                    i += 1;
                }
                None => {
                    // removal is permanent, the object is never re-acquired
                    // under its old identity
                    let lost = self.vehicles.remove(i);
                    debug!(id = lost.id, "tracker lost its target, track retired");
                }
            }
        }

        Ok(())
    }

    fn associate(&mut self, frame: &B::Frame, detections: &[Detection]) -> Result<(), Error> {
        for det in detections {
            let bbox = det.bbox();

            // any non-zero overlap claims the detection, first hit wins
            let matched = self
                .vehicles
                .iter()
                .any(|v| v.bbox.intersection(&bbox) > 0.0);

            if !matched {
                let tracker = self.backend.spawn(frame, &bbox)?;
                let id = SEQ_ID.fetch_add(1, Ordering::SeqCst);
                debug!(id, "spawned track for unmatched detection");

                self.vehicles.push(Vehicle {
                    id,
                    bbox,
                    counted: false,
                    tracker,
                });
            }
        }

        Ok(())
    }

    fn apply_line(&mut self) {
        for v in &mut self.vehicles {
            if self.line.in_band(v.bbox.cy()) {
                // increments on every frame the center dwells inside the band
                self.count += 1;

                if !v.counted {
                    v.counted = true;
                    info!(id = v.id, count = self.count, "vehicle crossed the counting line");
                }
            }
        }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn line(&self) -> &CountingLine {
        &self.line
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.vehicles.iter().map(Into::into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a scripted sequence of update results; once the script runs
    /// dry it keeps reporting the last known box.
    struct FakeTracker {
        steps: VecDeque<Option<BBox<Ltwh>>>,
        hold: BBox<Ltwh>,
    }

    impl VisualTracker for FakeTracker {
        type Frame = ();

        fn update(&mut self, _frame: &()) -> Result<Option<BBox<Ltwh>>, Error> {
            match self.steps.pop_front() {
                Some(Some(bbox)) => {
                    self.hold = bbox;
                    Ok(Some(bbox))
                }
                Some(None) => Ok(None),
                None => Ok(Some(self.hold)),
            }
        }
    }

    /// Hands one script to each spawned tracker, in spawn order. Tracks
    /// without a script stay put on their seed box.
    #[derive(Default)]
    struct FakeBackend {
        scripts: VecDeque<Vec<Option<BBox<Ltwh>>>>,
    }

    impl FakeBackend {
        fn scripted(scripts: Vec<Vec<Option<BBox<Ltwh>>>>) -> Self {
            Self {
                scripts: scripts.into(),
            }
        }
    }

    impl TrackerBackend for FakeBackend {
        type Frame = ();
        type Tracker = FakeTracker;

        fn spawn(&mut self, _frame: &(), bbox: &BBox<Ltwh>) -> Result<FakeTracker, Error> {
            Ok(FakeTracker {
                steps: self.scripts.pop_front().unwrap_or_default().into(),
                hold: *bbox,
            })
        }
    }

    fn det(x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::new(x, y, w, h)
    }

    /// A line no track in these tests can reach.
    fn far_line() -> CountingLine {
        CountingLine::horizontal(10_000.0, 0.0, 800.0)
    }

    #[test]
    fn empty_frame_mutates_nothing() {
        let mut scene = Scene::new(FakeBackend::default(), far_line());

        scene.process(&(), &[]).unwrap();

        assert_eq!(scene.len(), 0);
        assert_eq!(scene.count(), 0);
    }

    #[test]
    fn update_phase_only_removes() {
        let scripts = vec![vec![], vec![None]];
        let mut scene = Scene::new(FakeBackend::scripted(scripts), far_line());

        scene
            .process(&(), &[det(0.0, 0.0, 20.0, 20.0), det(100.0, 0.0, 20.0, 20.0)])
            .unwrap();
        assert_eq!(scene.len(), 2);

        // no detections: the frame can only shrink the track set
        scene.process(&(), &[]).unwrap();
        assert_eq!(scene.len(), 1);

        scene.process(&(), &[]).unwrap();
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn unmatched_detections_spawn_with_increasing_ids() {
        let mut scene = Scene::new(FakeBackend::default(), far_line());

        scene
            .process(&(), &[det(0.0, 0.0, 20.0, 20.0), det(100.0, 0.0, 20.0, 20.0)])
            .unwrap();
        scene.process(&(), &[det(200.0, 0.0, 20.0, 20.0)]).unwrap();

        let tracks = scene.tracks();
        assert_eq!(tracks.len(), 3);
        assert!(tracks[0].track_id < tracks[1].track_id);
        assert!(tracks[1].track_id < tracks[2].track_id);
    }

    #[test]
    fn overlapping_detections_do_not_spawn() {
        let mut scene = Scene::new(FakeBackend::default(), far_line());

        scene.process(&(), &[det(0.0, 0.0, 20.0, 20.0)]).unwrap();
        assert_eq!(scene.len(), 1);

        // both detections overlap the single existing track: no new tracks
        scene
            .process(&(), &[det(5.0, 5.0, 20.0, 20.0), det(10.0, 10.0, 20.0, 20.0)])
            .unwrap();
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn edge_adjacent_detection_spawns() {
        let mut scene = Scene::new(FakeBackend::default(), far_line());

        scene.process(&(), &[det(0.0, 0.0, 20.0, 20.0)]).unwrap();

        // zero intersection area never matches
        scene.process(&(), &[det(20.0, 0.0, 20.0, 20.0)]).unwrap();
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn lost_track_id_is_never_reused() {
        let scripts = vec![vec![None]];
        let mut scene = Scene::new(FakeBackend::scripted(scripts), far_line());

        scene.process(&(), &[det(0.0, 0.0, 20.0, 20.0)]).unwrap();
        let old_id = scene.tracks()[0].track_id;

        // the tracker fails, the track is gone within the same frame and a
        // detection in the same spot becomes a brand new track
        scene.process(&(), &[det(0.0, 0.0, 20.0, 20.0)]).unwrap();

        let tracks = scene.tracks();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].track_id > old_id);
    }

    #[test]
    fn dwell_in_band_counts_every_frame() {
        let line = CountingLine::horizontal(300.0, 0.0, 800.0);
        let steps = vec![
            Some(BBox::ltwh(100.0, 289.0, 20.0, 20.0)), // center 299
            Some(BBox::ltwh(100.0, 290.0, 20.0, 20.0)), // center 300
            Some(BBox::ltwh(100.0, 291.0, 20.0, 20.0)), // center 301
            Some(BBox::ltwh(100.0, 292.0, 20.0, 20.0)), // center 302
        ];
        let mut scene = Scene::new(FakeBackend::scripted(vec![steps]), line);

        // spawn frame, center 298: outside the band
        scene.process(&(), &[det(100.0, 288.0, 20.0, 20.0)]).unwrap();
        assert_eq!(scene.count(), 0);
        assert!(!scene.tracks()[0].counted);

        scene.process(&(), &[]).unwrap(); // 299
        assert_eq!(scene.count(), 1);
        assert!(scene.tracks()[0].counted);

        scene.process(&(), &[]).unwrap(); // 300
        scene.process(&(), &[]).unwrap(); // 301
        assert_eq!(scene.count(), 3);

        // center 302 leaves the band: count freezes, the flag stays set
        scene.process(&(), &[]).unwrap();
        assert_eq!(scene.count(), 3);
        assert!(scene.tracks()[0].counted);
    }
}
