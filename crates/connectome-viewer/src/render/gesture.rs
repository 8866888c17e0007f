use bevy::math::Vec2;

/// Separates clicks from drags by the total pointer travel while the button is held.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerGesture {
    down_at: Option<Vec2>,
    last: Vec2,
    travel: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEnd {
    Click(Vec2),
    Drag,
}

impl PointerGesture {
    pub fn is_active(&self) -> bool {
        self.down_at.is_some()
    }

    pub fn press(&mut self, at: Vec2) {
        self.down_at = Some(at);
        self.last = at;
        self.travel = 0.0;
    }

    /// Returns the delta since the previous move while pressed.
    pub fn move_to(&mut self, at: Vec2) -> Option<Vec2> {
        self.down_at?;
        let delta = at - self.last;
        self.travel += delta.length();
        self.last = at;
        Some(delta)
    }

    pub fn release(&mut self, at: Vec2, threshold: f32) -> Option<GestureEnd> {
        self.move_to(at);
        self.down_at.take()?;
        if self.travel < threshold {
            Some(GestureEnd::Click(at))
        } else {
            Some(GestureEnd::Drag)
        }
    }

    pub fn cancel(&mut self) {
        self.down_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f32 = 4.0;

    #[test]
    fn one_pixel_is_a_click() {
        let mut g = PointerGesture::default();
        g.press(Vec2::new(100.0, 100.0));
        g.move_to(Vec2::new(101.0, 100.0));
        assert_eq!(
            g.release(Vec2::new(101.0, 100.0), THRESHOLD),
            Some(GestureEnd::Click(Vec2::new(101.0, 100.0)))
        );
    }

    #[test]
    fn fifty_pixels_is_a_drag() {
        let mut g = PointerGesture::default();
        g.press(Vec2::new(100.0, 100.0));
        g.move_to(Vec2::new(125.0, 100.0));
        assert_eq!(g.release(Vec2::new(150.0, 100.0), THRESHOLD), Some(GestureEnd::Drag));
    }

    #[test]
    fn travel_is_cumulative_not_net() {
        let mut g = PointerGesture::default();
        g.press(Vec2::ZERO);
        for _ in 0..5 {
            g.move_to(Vec2::new(3.0, 0.0));
            g.move_to(Vec2::ZERO);
        }
        assert_eq!(g.release(Vec2::ZERO, THRESHOLD), Some(GestureEnd::Drag));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut g = PointerGesture::default();
        assert_eq!(g.release(Vec2::ZERO, THRESHOLD), None);
    }
}
