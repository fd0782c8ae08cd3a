use kurbo::{Affine, Vec2};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 3.0;

/// Pan offset and zoom scale for the user photo.
///
/// The offset is intentionally unbounded: the photo may be panned fully out
/// of view. Scale stays within [`MIN_SCALE`, `MAX_SCALE`] after any mutation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// Back to scale 1, offset (0,0). Called when a new user photo loads.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn apply_pan(&mut self, dx: f64, dy: f64) {
        self.offset += Vec2::new(dx, dy);
    }

    /// Multiplicative zoom, clamped after the update so repeated small
    /// factors converge at the boundary instead of overshooting it.
    pub fn apply_zoom(&mut self, factor: f64) {
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Translation composed first: scaling does not affect the pan amount.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }
}
