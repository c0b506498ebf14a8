//! Parameter types for the edit pipeline.
//!
//! Every adjustable value is a clamp-on-construction newtype, so out-of-range
//! input from any surface (slider, CLI flag, test) is corrected at the
//! boundary and the render logic never sees an invalid value.
//!
//! ## Types
//!
//! - [`Rotation`] — degrees, -180 to 180, default 0.
//! - [`Zoom`] — scale factor, 0.5 to 2.0, default 1.0.
//! - [`Brightness`] — percent, 50 to 150, default 100 (identity).
//! - [`Contrast`] — percent, 50 to 150, default 100 (identity).
//! - [`EditParams`] — the full parameter set; `Default` is the identity
//!   transform (image renders unchanged).

/// Rotation in degrees (-180 to 180).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation(f32);

impl Rotation {
    pub fn new(degrees: f32) -> Self {
        Self(degrees.clamp(-180.0, 180.0))
    }

    pub fn degrees(self) -> f32 {
        self.0
    }

    pub fn radians(self) -> f32 {
        self.0.to_radians()
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self(0.0)
    }
}

/// Zoom factor (0.5 to 2.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Zoom {
    pub fn new(factor: f32) -> Self {
        Self(factor.clamp(0.5, 2.0))
    }

    pub fn factor(self) -> f32 {
        self.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Brightness percentage (50 to 150). 100 leaves pixels unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness(i32);

impl Brightness {
    pub fn new(percent: i32) -> Self {
        Self(percent.clamp(50, 150))
    }

    pub fn percent(self) -> i32 {
        self.0
    }

    /// Multiplier applied to each channel (percent / 100).
    pub fn multiplier(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self(100)
    }
}

/// Contrast percentage (50 to 150). 100 leaves pixels unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contrast(i32);

impl Contrast {
    pub fn new(percent: i32) -> Self {
        Self(percent.clamp(50, 150))
    }

    pub fn percent(self) -> i32 {
        self.0
    }

    /// Slope of the contrast curve around the mid-gray pivot.
    pub fn multiplier(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Contrast {
    fn default() -> Self {
        Self(100)
    }
}

/// The full set of adjustments applied by the preview renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EditParams {
    pub rotation: Rotation,
    pub zoom: Zoom,
    pub brightness: Brightness,
    pub contrast: Contrast,
}

impl EditParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every parameter is at its identity value.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Restore every parameter to its identity value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_clamps_to_valid_range() {
        assert_eq!(Rotation::new(-400.0).degrees(), -180.0);
        assert_eq!(Rotation::new(90.0).degrees(), 90.0);
        assert_eq!(Rotation::new(181.0).degrees(), 180.0);
    }

    #[test]
    fn zoom_clamps_to_valid_range() {
        assert_eq!(Zoom::new(0.1).factor(), 0.5);
        assert_eq!(Zoom::new(1.3).factor(), 1.3);
        assert_eq!(Zoom::new(5.0).factor(), 2.0);
    }

    #[test]
    fn brightness_clamps_to_valid_range() {
        assert_eq!(Brightness::new(0).percent(), 50);
        assert_eq!(Brightness::new(120).percent(), 120);
        assert_eq!(Brightness::new(500).percent(), 150);
    }

    #[test]
    fn contrast_multiplier_is_percent_over_100() {
        assert_eq!(Contrast::new(150).multiplier(), 1.5);
        assert_eq!(Contrast::new(50).multiplier(), 0.5);
    }

    #[test]
    fn default_params_are_identity() {
        assert!(EditParams::default().is_identity());
    }

    #[test]
    fn reset_restores_identity() {
        let mut params = EditParams::default();
        params.rotation = Rotation::new(45.0);
        params.brightness = Brightness::new(130);
        assert!(!params.is_identity());

        params.reset();
        assert!(params.is_identity());
    }
}
