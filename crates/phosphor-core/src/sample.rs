use glam::{DVec2, Vec2};

/// One point on the oscilloscope trace, in normalized device coordinates.
///
/// The layout is two packed `f32`s so a slice of samples can be handed to the
/// GPU as a vertex buffer without conversion.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
}

const EPSILON: f32 = 0.0001;

impl Sample {
    pub const ZERO: Sample = Sample { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Approximate equality using epsilon comparison
    pub fn approx_eq(&self, other: &Sample) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }
}

impl From<Vec2> for Sample {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<DVec2> for Sample {
    fn from(v: DVec2) -> Self {
        Self { x: v.x as f32, y: v.y as f32 }
    }
}

impl From<Sample> for Vec2 {
    fn from(s: Sample) -> Self {
        Vec2::new(s.x, s.y)
    }
}

/// View a slice of samples as raw bytes for buffer uploads.
pub fn as_bytes(samples: &[Sample]) -> &[u8] {
    // Sample is repr(C) with two f32 fields and no padding.
    unsafe {
        std::slice::from_raw_parts(
            samples.as_ptr() as *const u8,
            std::mem::size_of_val(samples),
        )
    }
}
