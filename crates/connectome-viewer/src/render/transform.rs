use bevy::math::Vec2;

pub const DEFAULT_MIN_SCALE: f32 = 0.05;
pub const DEFAULT_MAX_SCALE: f32 = 5.0;

/// Pan/zoom of the canvas: `screen = (world + offset) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world + self.offset()) * self.scale
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen / self.scale - self.offset()
    }

    /// Multiplies scale by `factor` (clamped) keeping the world point under `pointer` fixed.
    pub fn zoom_at(&mut self, pointer: Vec2, factor: f32, min_scale: f32, max_scale: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.screen_to_world(pointer);
        let scale = (self.scale * factor).clamp(min_scale, max_scale);
        self.scale = scale;
        let offset = pointer / scale - anchor;
        self.x = offset.x;
        self.y = offset.y;
    }

    /// Pans by a screen-space delta. Unbounded.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.x += screen_delta.x / self.scale;
        self.y += screen_delta.y / self.scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Centers `min..max` in a `viewport`-sized canvas with `margin` pixels to spare.
    pub fn fit(&mut self, min: Vec2, max: Vec2, viewport: Vec2, margin: f32, min_scale: f32, max_scale: f32) {
        let size = (max - min).max(Vec2::splat(1.0));
        let avail = (viewport - Vec2::splat(margin * 2.0)).max(Vec2::splat(1.0));
        let scale = (avail.x / size.x).min(avail.y / size.y).clamp(min_scale, max_scale);
        if !scale.is_finite() {
            return;
        }
        let center = (min + max) * 0.5;
        let offset = viewport * 0.5 / scale - center;
        *self = Self {
            x: offset.x,
            y: offset.y,
            scale,
        };
    }
}

/// Wheel delta (pixels, positive = scroll down) to a zoom factor.
pub fn wheel_factor(delta_y: f32, sensitivity: f32) -> f32 {
    (1.0 - delta_y * sensitivity).max(0.01)
}
