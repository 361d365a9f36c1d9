use super::Color;

/// Four-corner color fill for a quad.
///
/// Corner order follows the backend convention: `c0` top-left, `c1`
/// bottom-left, `c2` bottom-right, `c3` top-right. Colors are interpolated
/// bilinearly across the quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadGradient {
    pub c0: Color,
    pub c1: Color,
    pub c2: Color,
    pub c3: Color,
}

impl QuadGradient {
    #[inline]
    pub const fn new(c0: Color, c1: Color, c2: Color, c3: Color) -> Self {
        Self { c0, c1, c2, c3 }
    }

    #[inline]
    pub const fn uniform(color: Color) -> Self {
        Self::new(color, color, color, color)
    }

    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.c0 == self.c1 && self.c0 == self.c2 && self.c0 == self.c3
    }

    /// Color at normalized quad position `(u, v)`, both in `[0, 1]`.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let top = self.c0.lerp(self.c3, u);
        let bottom = self.c1.lerp(self.c2, u);
        top.lerp(bottom, v)
    }

    /// Color of pixel `(i, j)` (pixel centers) inside a `w × h` quad, as RGBA8.
    #[inline]
    pub fn pixel_rgba8(&self, i: i32, j: i32, w: i32, h: i32) -> [u8; 4] {
        if self.is_uniform() {
            return self.c0.to_rgba8();
        }
        let u = (i as f32 + 0.5) / w.max(1) as f32;
        let v = (j as f32 + 0.5) / h.max(1) as f32;
        self.sample(u, v).to_rgba8()
    }

    /// True when sampling always yields opaque white (the tint identity).
    #[inline]
    pub fn is_identity_tint(&self) -> bool {
        self.is_uniform() && self.c0.to_rgba8() == [255, 255, 255, 255]
    }
}

impl From<Color> for QuadGradient {
    fn from(color: Color) -> Self {
        Self::uniform(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_match_inputs() {
        let g = QuadGradient::new(
            Color::new(1.0, 0.0, 0.0, 1.0),
            Color::new(0.0, 1.0, 0.0, 1.0),
            Color::new(0.0, 0.0, 1.0, 1.0),
            Color::new(1.0, 1.0, 1.0, 1.0),
        );
        assert_eq!(g.sample(0.0, 0.0), g.c0);
        assert_eq!(g.sample(0.0, 1.0), g.c1);
        assert_eq!(g.sample(1.0, 1.0), g.c2);
        assert_eq!(g.sample(1.0, 0.0), g.c3);
    }

    #[test]
    fn center_is_average_of_corners() {
        let g = QuadGradient::new(Color::BLACK, Color::BLACK, Color::WHITE, Color::WHITE);
        let c = g.sample(0.5, 0.5);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn white_uniform_is_identity_tint() {
        assert!(QuadGradient::uniform(Color::WHITE).is_identity_tint());
        assert!(!QuadGradient::uniform(Color::BLACK).is_identity_tint());
    }
}
