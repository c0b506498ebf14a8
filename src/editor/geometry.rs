//! Pure geometry for the crop rectangle: handle layout, hit testing, and
//! constrained resize/move math.
//!
//! All functions here are pure and testable without a canvas or an image.
//! Coordinates are in canvas pixel space; the canvas is a fixed square of
//! [`CANVAS_SIZE`] pixels. Every function maintains the crop invariants:
//! `width, height >= MIN_CROP_SIZE` and the rectangle fully inside the canvas.

/// Edge length of the square preview canvas, in pixels.
pub const CANVAS_SIZE: u32 = 400;

/// Minimum crop rectangle edge, in pixels.
pub const MIN_CROP_SIZE: f32 = 50.0;

/// Margin of the initial crop rectangle, so resize handles are always
/// reachable on screen regardless of prior state.
pub const CROP_INSET: f32 = 24.0;

/// Half-width of the square tolerance zone around each resize handle.
/// Large enough that corner zones overlap the rectangle interior, which is
/// why handle hit-testing must run before body hit-testing.
pub const HANDLE_TOLERANCE: f32 = 12.0;

const CANVAS: f32 = CANVAS_SIZE as f32;

/// Crop rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    /// Build a rectangle satisfying the crop invariants: dimensions clamped
    /// to `[MIN_CROP_SIZE, CANVAS_SIZE]`, origin clamped so the rectangle
    /// stays fully on-canvas.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let width = width.clamp(MIN_CROP_SIZE, CANVAS);
        let height = height.clamp(MIN_CROP_SIZE, CANVAS);
        Self {
            x: x.clamp(0.0, CANVAS - width),
            y: y.clamp(0.0, CANVAS - height),
            width,
            height,
        }
    }

    /// The rectangle shown on entering crop mode: centered, inset by
    /// [`CROP_INSET`] on all sides.
    pub fn centered_inset() -> Self {
        Self {
            x: CROP_INSET,
            y: CROP_INSET,
            width: CANVAS - 2.0 * CROP_INSET,
            height: CANVAS - 2.0 * CROP_INSET,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the point falls inside the rectangle body.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Integer pixel region for extraction: rounded origin and dimensions.
    pub fn pixel_region(&self) -> (u32, u32, u32, u32) {
        let x = self.x.round() as u32;
        let y = self.y.round() as u32;
        let w = (self.width.round() as u32).min(CANVAS_SIZE - x);
        let h = (self.height.round() as u32).min(CANVAS_SIZE - y);
        (x, y, w, h)
    }
}

/// The eight resize handles: four corners plus four edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    /// Position of the handle on the rectangle outline.
    pub fn position(self, rect: &CropRect) -> (f32, f32) {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        match self {
            Handle::TopLeft => (rect.x, rect.y),
            Handle::Top => (cx, rect.y),
            Handle::TopRight => (rect.right(), rect.y),
            Handle::Right => (rect.right(), cy),
            Handle::BottomRight => (rect.right(), rect.bottom()),
            Handle::Bottom => (cx, rect.bottom()),
            Handle::BottomLeft => (rect.x, rect.bottom()),
            Handle::Left => (rect.x, cy),
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Left | Handle::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Handle::TopRight | Handle::Right | Handle::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Top | Handle::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::Bottom | Handle::BottomRight)
    }
}

/// What a pointer-down hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A resize handle. Takes priority over the body — handle zones overlap
    /// the rectangle interior near corners.
    Handle(Handle),
    /// The rectangle body (drag to move).
    Body,
}

/// Hit-test a pointer position against the handles, then the body.
pub fn hit_test(rect: &CropRect, x: f32, y: f32) -> Option<Hit> {
    for handle in Handle::ALL {
        let (hx, hy) = handle.position(rect);
        if (x - hx).abs() <= HANDLE_TOLERANCE && (y - hy).abs() <= HANDLE_TOLERANCE {
            return Some(Hit::Handle(handle));
        }
    }
    if rect.contains(x, y) {
        return Some(Hit::Body);
    }
    None
}

/// Recompute the rectangle for a pointer at `(x, y)` while `handle` is held.
///
/// Edge handles move one axis, corner handles two. The moving edge is clamped
/// so the rectangle keeps its minimum size and stays inside the canvas.
pub fn resize(rect: &CropRect, handle: Handle, x: f32, y: f32) -> CropRect {
    let mut left = rect.x;
    let mut top = rect.y;
    let mut right = rect.right();
    let mut bottom = rect.bottom();

    if handle.moves_left() {
        left = x.clamp(0.0, right - MIN_CROP_SIZE);
    }
    if handle.moves_right() {
        right = x.clamp(left + MIN_CROP_SIZE, CANVAS);
    }
    if handle.moves_top() {
        top = y.clamp(0.0, bottom - MIN_CROP_SIZE);
    }
    if handle.moves_bottom() {
        bottom = y.clamp(top + MIN_CROP_SIZE, CANVAS);
    }

    CropRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
}

/// Translate the rectangle so its origin lands at `(x, y)`, clamped to keep
/// it fully on-canvas. Dimensions never change during a move.
pub fn moved_to(rect: &CropRect, x: f32, y: f32) -> CropRect {
    CropRect {
        x: x.clamp(0.0, CANVAS - rect.width),
        y: y.clamp(0.0, CANVAS - rect.height),
        ..*rect
    }
}
