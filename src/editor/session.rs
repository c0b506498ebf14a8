//! One editing session for one photo.
//!
//! An [`EditSession`] owns the active bitmap and the adjustment parameters,
//! dispatches pointer interaction while crop mode is active, and produces the
//! final encoded image on save. The session is created from an already
//! decoded image — there is no "not yet loaded" state to guard against —
//! and discarded by dropping it (or calling [`EditSession::cancel`]).
//!
//! Crop commits immediately and becomes the new baseline: the committed
//! region replaces the source in place, and rotation/zoom keep applying to
//! whatever is edited next. `reset()` restores parameters only; it does not
//! recover the pre-crop image.

use super::geometry::{self, CropRect, Hit};
use super::params::{Brightness, Contrast, EditParams, Rotation, Zoom};
use super::render;
use image::{ImageEncoder, ImageReader, RgbaImage};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// JPEG quality of saved images.
const JPEG_QUALITY: u8 = 90;

/// Floor on how fast `save()` resolves. The delay is a UI affordance (it
/// drives the caller's loading-state transition), modelled as an explicit
/// timer rather than inferred from encoding work.
pub const SAVE_MIN_LATENCY: Duration = Duration::from_millis(800);

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pointer interaction mode while crop mode is active.
///
/// A tagged union instead of nullable flags, so "dragging and resizing at the
/// same time" is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Idle,
    /// Moving the whole rectangle; the offset is where inside the rectangle
    /// the pointer grabbed it.
    Dragging { grab_dx: f32, grab_dy: f32 },
    Resizing(geometry::Handle),
}

#[derive(Debug)]
struct CropState {
    rect: CropRect,
    interaction: Interaction,
}

/// Interactive editing state for a single photo.
pub struct EditSession {
    source: RgbaImage,
    params: EditParams,
    crop: Option<CropState>,
}

impl EditSession {
    /// Start a session from a decoded bitmap.
    pub fn new(source: RgbaImage) -> Self {
        Self {
            source,
            params: EditParams::default(),
            crop: None,
        }
    }

    /// Start a session from an image file on disk.
    pub fn open(path: &Path) -> Result<Self, EditorError> {
        let img = ImageReader::open(path)?
            .decode()
            .map_err(|e| EditorError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(img.to_rgba8()))
    }

    /// Start a session from encoded image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EditorError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| EditorError::Decode(e.to_string()))?;
        Ok(Self::new(img.to_rgba8()))
    }

    pub fn params(&self) -> &EditParams {
        &self.params
    }

    /// The currently active bitmap (replaced in place by a committed crop).
    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    pub fn crop_mode_active(&self) -> bool {
        self.crop.is_some()
    }

    pub fn crop_rect(&self) -> Option<CropRect> {
        self.crop.as_ref().map(|c| c.rect)
    }

    // =========================================================================
    // Adjustment setters — clamped at the boundary
    // =========================================================================

    pub fn set_rotation(&mut self, degrees: f32) {
        self.params.rotation = Rotation::new(degrees);
    }

    pub fn set_zoom(&mut self, factor: f32) {
        self.params.zoom = Zoom::new(factor);
    }

    pub fn set_brightness(&mut self, percent: i32) {
        self.params.brightness = Brightness::new(percent);
    }

    pub fn set_contrast(&mut self, percent: i32) {
        self.params.contrast = Contrast::new(percent);
    }

    // =========================================================================
    // Crop mode
    // =========================================================================

    /// Enter crop mode. The rectangle resets to the centered inset so resize
    /// handles are always reachable, regardless of any prior crop.
    pub fn enter_crop_mode(&mut self) {
        self.crop = Some(CropState {
            rect: CropRect::centered_inset(),
            interaction: Interaction::Idle,
        });
    }

    /// Leave crop mode without committing.
    pub fn exit_crop_mode(&mut self) {
        self.crop = None;
    }

    /// Set the crop rectangle directly (the non-interactive surface the CLI
    /// and tests drive). Clamped to the same invariants the pointer path
    /// maintains. Ignored when crop mode is not active.
    pub fn set_crop_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if let Some(crop) = &mut self.crop {
            crop.rect = CropRect::new(x, y, width, height);
        }
    }

    /// Pointer pressed at canvas coordinates. Handle zones win over the
    /// rectangle body; outside both, nothing starts.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let Some(crop) = &mut self.crop else { return };
        crop.interaction = match geometry::hit_test(&crop.rect, x, y) {
            Some(Hit::Handle(handle)) => Interaction::Resizing(handle),
            Some(Hit::Body) => Interaction::Dragging {
                grab_dx: x - crop.rect.x,
                grab_dy: y - crop.rect.y,
            },
            None => Interaction::Idle,
        };
    }

    /// Pointer moved; resizes or drags depending on what `pointer_down`
    /// started.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(crop) = &mut self.crop else { return };
        match crop.interaction {
            Interaction::Idle => {}
            Interaction::Resizing(handle) => {
                crop.rect = geometry::resize(&crop.rect, handle, x, y);
            }
            Interaction::Dragging { grab_dx, grab_dy } => {
                crop.rect = geometry::moved_to(&crop.rect, x - grab_dx, y - grab_dy);
            }
        }
    }

    /// Pointer released; ends whichever interaction was active.
    pub fn pointer_up(&mut self) {
        if let Some(crop) = &mut self.crop {
            crop.interaction = Interaction::Idle;
        }
    }

    /// Commit the crop: extract the rectangle from the flat (unrotated,
    /// unscaled, brightness/contrast applied) canvas and make it the new
    /// source. Crop mode ends; rotation and zoom are deliberately kept and
    /// apply to the new baseline. No-op outside crop mode.
    pub fn commit_crop(&mut self) {
        let Some(crop) = self.crop.take() else { return };
        let flat = render::render_flat(&self.source, self.params.brightness, self.params.contrast);
        let (x, y, w, h) = crop.rect.pixel_region();
        self.source = image::imageops::crop_imm(&flat, x, y, w, h).to_image();
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Render the preview canvas for display.
    pub fn render(&self) -> RgbaImage {
        render::render_preview(&self.source, &self.params, self.crop_mode_active())
    }

    /// Encode the current canvas — all active transforms applied, a pending
    /// uncommitted crop ignored — as JPEG, resolving no faster than
    /// [`SAVE_MIN_LATENCY`].
    pub fn save(&self) -> Result<Vec<u8>, EditorError> {
        self.save_with_min_latency(SAVE_MIN_LATENCY)
    }

    /// `save()` with an explicit latency floor (zero for batch callers).
    pub fn save_with_min_latency(&self, min_latency: Duration) -> Result<Vec<u8>, EditorError> {
        let started = Instant::now();

        // A pending crop is not part of the saved output: render with the
        // full transform, never the crop-suspended preview.
        let canvas = render::render_preview(&self.source, &self.params, false);
        let rgb = image::DynamicImage::ImageRgba8(canvas).to_rgb8();

        let mut bytes = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            std::io::Cursor::new(&mut bytes),
            JPEG_QUALITY,
        );
        encoder
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| EditorError::Encode(e.to_string()))?;

        if let Some(remaining) = min_latency.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
        Ok(bytes)
    }

    /// Restore all parameters to identity and exit crop mode. A committed
    /// crop stays — the source is not reverted.
    pub fn reset(&mut self) {
        self.params.reset();
        self.crop = None;
    }

    /// Discard the session. Equivalent to dropping it; named so call sites
    /// read as the user action.
    pub fn cancel(self) {}
}
