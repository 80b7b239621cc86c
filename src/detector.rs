use opencv::{core, imgproc, prelude::*, video};

use crate::detection::Detection;
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct BlobDetectorConfig {
    pub min_area: f32,
    pub blur_kernel: i32,
    pub mask_threshold: f64,
    pub history: i32,
    pub var_threshold: f64,
    pub detect_shadows: bool,
}

impl BlobDetectorConfig {
    pub fn new(min_area: f32) -> Self {
        Self {
            min_area,
            ..Default::default()
        }
    }
}

impl Default for BlobDetectorConfig {
    fn default() -> Self {
        Self {
            min_area: 500.0,
            blur_kernel: 15,
            mask_threshold: 200.0,
            history: 500,
            var_threshold: 16.0,
            detect_shadows: true,
        }
    }
}

/// Foreground blob detector. Implementations keep their own adaptive state
/// across calls (the background model here).
pub trait Detect {
    type Frame;

    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>, Error>;
}

/// MOG2 background subtraction followed by blur, binary threshold and
/// external contour extraction. Boxes at or below `min_area` are dropped.
pub struct MogDetector {
    subtractor: core::Ptr<video::BackgroundSubtractorMOG2>,
    config: BlobDetectorConfig,
    mask: core::Mat,
    blurred: core::Mat,
    binary: core::Mat,
}

impl MogDetector {
    pub fn new(config: BlobDetectorConfig) -> Result<Self, Error> {
        let subtractor = video::create_background_subtractor_mog2(
            config.history,
            config.var_threshold,
            config.detect_shadows,
        )?;

        Ok(Self {
            subtractor,
            config,
            mask: core::Mat::default(),
            blurred: core::Mat::default(),
            binary: core::Mat::default(),
        })
    }

    pub fn config(&self) -> &BlobDetectorConfig {
        &self.config
    }
}

impl Detect for MogDetector {
    type Frame = core::Mat;

    fn detect(&mut self, frame: &core::Mat) -> Result<Vec<Detection>, Error> {
        self.subtractor.apply(frame, &mut self.mask, -1.0)?;

        let ksize = core::Size::new(self.config.blur_kernel, self.config.blur_kernel);
        imgproc::gaussian_blur(
            &self.mask,
            &mut self.blurred,
            ksize,
            0.0,
            0.0,
            core::BORDER_DEFAULT,
        )?;
        imgproc::threshold(
            &self.blurred,
            &mut self.binary,
            self.config.mask_threshold,
            255.0,
            imgproc::THRESH_BINARY,
        )?;

        let mut contours = core::Vector::<core::Vector<core::Point>>::new();
        imgproc::find_contours(
            &self.binary,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            core::Point::default(),
        )?;

        let mut detections = Vec::new();
        for contour in contours.iter() {
            let rect = imgproc::bounding_rect(&contour)?;
            let det = Detection::new(
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
            );

            if det.area > self.config.min_area {
                detections.push(det);
            }
        }

        Ok(detections)
    }
}
