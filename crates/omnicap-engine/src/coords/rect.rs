use glam::Vec2;

/// Axis-aligned rectangle in physical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        if self.size.y > 0.0 { self.size.x / self.size.y } else { 0.0 }
    }

    /// Largest rectangle with the given aspect ratio that fits inside `self`,
    /// centered on both axes.
    ///
    /// Wide containers get bars left and right (pillarbox); tall containers get
    /// bars top and bottom (letterbox).
    pub fn fit_aspect(self, aspect: f32) -> Rect {
        if self.is_empty() || aspect <= 0.0 || !aspect.is_finite() {
            return Rect::new(self.origin.x, self.origin.y, 0.0, 0.0);
        }

        let mut w = self.size.x;
        let mut h = w / aspect;
        if h > self.size.y {
            h = self.size.y;
            w = h * aspect;
        }

        Rect::new(
            self.origin.x + (self.size.x - w) * 0.5,
            self.origin.y + (self.size.y - h) * 0.5,
            w,
            h,
        )
    }
}
