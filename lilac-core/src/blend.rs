//! Porter-Duff "source-over" compositing in linear space, with a one-entry
//! result cache (component B).

use crate::color::{Color, LinearColor};
use crate::gamma::GammaTable;

/// Below this linear alpha, the composited result is snapped to fully
/// transparent rather than divided through to unpremultiply.
pub const ALPHA_EPSILON: f64 = 1e-4;

/// Caches the most recent `(over, under) -> result` triple. The blend
/// function is pure, so an exact-match cache on the input pair is always
/// correct; it is not normalized or generation-tagged because the gamma
/// table never changes after construction.
pub struct Blender {
    gamma: GammaTable,
    cache: Option<(Color, Color, Color)>,
}

impl Blender {
    #[must_use]
    pub fn new(gamma: GammaTable) -> Self {
        Self { gamma, cache: None }
    }

    #[must_use]
    pub fn gamma(&self) -> &GammaTable {
        &self.gamma
    }

    /// `blend(over, under) -> result`. All three are packed sRGB ARGB.
    pub fn blend(&mut self, over: Color, under: Color) -> Color {
        if over.alpha() == 255 {
            return over;
        }
        if over.alpha() == 0 {
            return under;
        }

        if let Some((cached_over, cached_under, cached_result)) = self.cache
            && cached_over == over
            && cached_under == under
        {
            return cached_result;
        }

        let result = self.blend_uncached(over, under);
        self.cache = Some((over, under, result));
        result
    }

    fn to_linear(&self, color: Color) -> LinearColor {
        let a = f64::from(color.alpha()) / 255.0;
        LinearColor {
            a,
            r: self.gamma.undo(color.red()) * a,
            g: self.gamma.undo(color.green()) * a,
            b: self.gamma.undo(color.blue()) * a,
        }
    }

    fn blend_uncached(&self, over: Color, under: Color) -> Color {
        let over = self.to_linear(over);
        let under = self.to_linear(under);
        let inv_a = 1.0 - over.a;

        let composed = LinearColor {
            a: over.a + under.a * inv_a,
            r: over.r + under.r * inv_a,
            g: over.g + under.g * inv_a,
            b: over.b + under.b * inv_a,
        };

        if !composed.a.is_finite() || composed.a < ALPHA_EPSILON {
            return Color::from_argb(0, 0, 0, 0);
        }

        let unpremultiply = |channel: f64| (channel / composed.a).clamp(0.0, 1.0);
        let r = self.gamma.correct(unpremultiply(composed.r));
        let g = self.gamma.correct(unpremultiply(composed.g));
        let b = self.gamma.correct(unpremultiply(composed.b));
        let a = (composed.a * 255.0).floor().clamp(0.0, 255.0) as u8;

        Color::from_argb(a, r, g, b)
    }
}
