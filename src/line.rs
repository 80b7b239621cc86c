use nalgebra as na;

/// Horizontal counting line: two endpoints sharing a y coordinate and a
/// narrow band around that y. A track is considered crossing while the
/// vertical center of its box lies strictly inside the band.
#[derive(Debug, Clone)]
pub struct CountingLine {
    a: na::Point2<f32>,
    b: na::Point2<f32>,
    band: f32,
}

impl CountingLine {
    pub const DEFAULT_BAND: f32 = 2.0;

    pub fn horizontal(y: f32, x_from: f32, x_to: f32) -> Self {
        Self::with_band(y, x_from, x_to, Self::DEFAULT_BAND)
    }

    pub fn with_band(y: f32, x_from: f32, x_to: f32, band: f32) -> Self {
        Self {
            a: na::Point2::new(x_from, y),
            b: na::Point2::new(x_to, y),
            band,
        }
    }

    #[inline(always)]
    pub fn y(&self) -> f32 {
        self.a.y
    }

    #[inline(always)]
    pub fn band(&self) -> f32 {
        self.band
    }

    #[inline]
    pub fn endpoints(&self) -> (na::Point2<f32>, na::Point2<f32>) {
        (self.a, self.b)
    }

    /// Both bounds are exclusive: a center exactly `band` pixels away from
    /// the line is outside.
    #[inline]
    pub fn in_band(&self, cy: f32) -> bool {
        cy > self.a.y - self.band && cy < self.a.y + self.band
    }
}
