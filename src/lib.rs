pub mod bbox;
pub mod detection;
pub mod detector;
pub mod error;
pub mod line;
pub mod scene;
pub mod track;
pub mod tracker;

pub use detection::Detection;
pub use line::CountingLine;
pub use track::Track;

use detector::{BlobDetectorConfig, Detect, MogDetector};
use error::Error;
use scene::Scene;
use tracker::KcfBackend;

use opencv::core::Mat;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

/// Frame-by-frame vehicle counting over one or more video sources.
pub trait Counting {
    fn update(&mut self, frame: &Mat, src: &str) -> Result<(), Error>;
    fn tracks(&self, src: &str) -> Rc<[Track]>;
    fn count(&self, src: &str) -> u64;
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub line: CountingLine,
    pub detector: BlobDetectorConfig,
}

impl CounterConfig {
    pub fn new(line: CountingLine) -> Self {
        Self {
            line,
            detector: BlobDetectorConfig::default(),
        }
    }
}

struct Lane {
    detector: MogDetector,
    scene: Scene<KcfBackend>,
}

/// Background-subtraction counter: MOG2 blobs associated to KCF-driven
/// tracks, one lane per source.
pub struct BlobCounter {
    config: CounterConfig,
    lanes: HashMap<String, Lane>,
}

impl BlobCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            lanes: HashMap::new(),
        }
    }
}

impl Counting for BlobCounter {
    fn update(&mut self, frame: &Mat, src: &str) -> Result<(), Error> {
        let lane = match self.lanes.entry(src.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Lane {
                detector: MogDetector::new(self.config.detector.clone())?,
                scene: Scene::new(KcfBackend, self.config.line.clone()),
            }),
        };

        let detections = lane.detector.detect(frame)?;
        lane.scene.process(frame, &detections)
    }

    #[inline]
    fn tracks(&self, src: &str) -> Rc<[Track]> {
        if let Some(lane) = self.lanes.get(src) {
            return lane.scene.tracks().into_boxed_slice().into();
        }

        Rc::new([])
    }

    #[inline]
    fn count(&self, src: &str) -> u64 {
        self.lanes.get(src).map(|lane| lane.scene.count()).unwrap_or(0)
    }
}
