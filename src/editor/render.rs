//! Preview canvas renderer.
//!
//! Renders the source bitmap into the fixed 400x400 canvas with the active
//! adjustments applied: translate to center, rotate, scale (zoom x fit), then
//! brightness/contrast. The `image` crate has no arbitrary-angle rotation, so
//! the composite transform is done by inverse-mapping every canvas pixel back
//! into source space with bilinear sampling. Canvas pixels that map outside
//! the source are transparent.
//!
//! The draw always scales the source to fit the canvas while preserving its
//! aspect ratio; zoom multiplies on top of that fit scale. Rendering is a
//! pure function of (source, params) — idempotent, no side effects.

use super::geometry::CANVAS_SIZE;
use super::params::{Brightness, Contrast, EditParams};
use image::{Rgba, RgbaImage};

/// Render the preview canvas.
///
/// While crop mode is active rotation and zoom are suspended (rendered as
/// identity) so crop-rectangle coordinates stay meaningful against an
/// unrotated, unscaled preview.
pub fn render_preview(source: &RgbaImage, params: &EditParams, crop_mode_active: bool) -> RgbaImage {
    if crop_mode_active {
        render_flat(source, params.brightness, params.contrast)
    } else {
        render(
            source,
            params.rotation.radians(),
            params.zoom.factor(),
            params.brightness,
            params.contrast,
        )
    }
}

/// Render with identity rotation/zoom — the crop-mode preview and the
/// offscreen buffer a crop commit extracts from.
pub(crate) fn render_flat(source: &RgbaImage, brightness: Brightness, contrast: Contrast) -> RgbaImage {
    render(source, 0.0, 1.0, brightness, contrast)
}

fn render(
    source: &RgbaImage,
    angle_rad: f32,
    zoom: f32,
    brightness: Brightness,
    contrast: Contrast,
) -> RgbaImage {
    let (sw, sh) = (source.width() as f32, source.height() as f32);
    let canvas = CANVAS_SIZE as f32;
    let fit = (canvas / sw).min(canvas / sh);
    let scale = fit * zoom;
    let (sin, cos) = angle_rad.sin_cos();
    let b = brightness.multiplier();
    let c = contrast.multiplier();

    RgbaImage::from_fn(CANVAS_SIZE, CANVAS_SIZE, |cx, cy| {
        // Inverse transform: canvas pixel center -> continuous source coords.
        let dx = cx as f32 + 0.5 - canvas / 2.0;
        let dy = cy as f32 + 0.5 - canvas / 2.0;
        let ux = (cos * dx + sin * dy) / scale + sw / 2.0;
        let uy = (-sin * dx + cos * dy) / scale + sh / 2.0;

        match sample_bilinear(source, ux, uy) {
            Some(px) => apply_filters(px, b, c),
            None => Rgba([0, 0, 0, 0]),
        }
    })
}

/// Bilinear sample at a continuous source position (pixel centers at +0.5).
/// Returns `None` when the position falls outside the image area.
fn sample_bilinear(img: &RgbaImage, x: f32, y: f32) -> Option<[f32; 4]> {
    let (w, h) = (img.width() as f32, img.height() as f32);
    if x < 0.0 || y < 0.0 || x > w || y > h {
        return None;
    }

    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let max_x = img.width() - 1;
    let max_y = img.height() - 1;
    let x0 = (x0.max(0.0) as u32).min(max_x);
    let y0 = (y0.max(0.0) as u32).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;

    let mut out = [0.0f32; 4];
    for ch in 0..4 {
        let top = p00[ch] as f32 * (1.0 - tx) + p10[ch] as f32 * tx;
        let bottom = p01[ch] as f32 * (1.0 - tx) + p11[ch] as f32 * tx;
        out[ch] = top * (1.0 - ty) + bottom * ty;
    }
    Some(out)
}

/// Brightness then contrast, CSS filter semantics: brightness multiplies each
/// channel, contrast pivots around mid-gray. Alpha is untouched.
fn apply_filters(px: [f32; 4], brightness: f32, contrast: f32) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for ch in 0..3 {
        let v = (px[ch] * brightness - 127.5) * contrast + 127.5;
        out[ch] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = px[3].round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::params::{Rotation, Zoom};

    /// 400x400 source with distinct quadrant colors.
    fn quadrant_source() -> RgbaImage {
        RgbaImage::from_fn(400, 400, |x, y| match (x < 200, y < 200) {
            (true, true) => Rgba([255, 0, 0, 255]),    // top-left red
            (false, true) => Rgba([0, 255, 0, 255]),   // top-right green
            (true, false) => Rgba([0, 0, 255, 255]),   // bottom-left blue
            (false, false) => Rgba([255, 255, 255, 255]),
        })
    }

    fn solid_source(gray: u8) -> RgbaImage {
        RgbaImage::from_pixel(400, 400, Rgba([gray, gray, gray, 255]))
    }

    #[test]
    fn identity_render_reproduces_source_exactly() {
        let source = quadrant_source();
        let canvas = render_preview(&source, &EditParams::default(), false);
        assert_eq!(canvas, source);
    }

    #[test]
    fn crop_mode_suspends_rotation_and_zoom() {
        let source = quadrant_source();
        let mut params = EditParams::default();
        params.rotation = Rotation::new(137.0);
        params.zoom = Zoom::new(1.7);

        let suspended = render_preview(&source, &params, true);
        let identity = render_preview(&source, &EditParams::default(), false);
        assert_eq!(suspended, identity);
    }

    #[test]
    fn rotation_90_maps_top_left_to_top_right() {
        let source = quadrant_source();
        let mut params = EditParams::default();
        params.rotation = Rotation::new(90.0);
        let canvas = render_preview(&source, &params, false);

        // Clockwise quarter turn: red (top-left) lands top-right.
        assert_eq!(canvas.get_pixel(300, 100).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(100, 100).0, [0, 0, 255, 255]);
    }

    #[test]
    fn zoom_out_leaves_transparent_border() {
        let source = quadrant_source();
        let mut params = EditParams::default();
        params.zoom = Zoom::new(0.5);
        let canvas = render_preview(&source, &params, false);

        assert_eq!(canvas.get_pixel(10, 10).0[3], 0, "corner should be transparent");
        assert_eq!(canvas.get_pixel(150, 150).0, [255, 0, 0, 255]);
    }

    #[test]
    fn wide_source_is_letterboxed_vertically() {
        let source = RgbaImage::from_pixel(800, 400, Rgba([9, 9, 9, 255]));
        let canvas = render_preview(&source, &EditParams::default(), false);

        // fit = 0.5, so the draw is 400x200 centered: rows 0..100 are empty.
        assert_eq!(canvas.get_pixel(200, 50).0[3], 0);
        assert_eq!(canvas.get_pixel(200, 200).0, [9, 9, 9, 255]);
        assert_eq!(canvas.get_pixel(200, 350).0[3], 0);
    }

    #[test]
    fn brightness_multiplies_channels() {
        let source = solid_source(100);
        let mut params = EditParams::default();
        params.brightness = Brightness::new(150);
        let canvas = render_preview(&source, &params, false);
        assert_eq!(canvas.get_pixel(200, 200).0, [150, 150, 150, 255]);
    }

    #[test]
    fn contrast_pivots_around_mid_gray() {
        let source = solid_source(100);
        let mut params = EditParams::default();
        params.contrast = Contrast::new(150);
        let canvas = render_preview(&source, &params, false);
        // (100 - 127.5) * 1.5 + 127.5 = 86.25
        assert_eq!(canvas.get_pixel(200, 200).0[0], 86);
    }

    #[test]
    fn filters_clamp_to_channel_range() {
        let source = solid_source(220);
        let mut params = EditParams::default();
        params.brightness = Brightness::new(150);
        let canvas = render_preview(&source, &params, false);
        assert_eq!(canvas.get_pixel(200, 200).0[0], 255);
    }

    #[test]
    fn render_is_idempotent() {
        let source = quadrant_source();
        let mut params = EditParams::default();
        params.rotation = Rotation::new(30.0);
        params.brightness = Brightness::new(120);

        let first = render_preview(&source, &params, false);
        let second = render_preview(&source, &params, false);
        assert_eq!(first, second);
    }
}
