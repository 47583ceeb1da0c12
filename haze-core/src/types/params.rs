//! Encoding and decoding parameters.

use serde::Serialize;

use crate::constants::{
    DEFAULT_COMPONENT_X, DEFAULT_COMPONENT_Y, DEFAULT_DECODE_HEIGHT, DEFAULT_DECODE_WIDTH,
    DEFAULT_PUNCH, MAX_COMPONENTS, MAX_DECODE_DIMENSION, MAX_PUNCH, MIN_COMPONENTS,
};
use crate::error::{HazeError, Result};

/// Blurhash component counts, always within `1..=9`.
///
/// The fields are private so a value can only be built through [`EncodeParams::new`],
/// which clamps. Cache keys and the codec therefore always see the clamped values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EncodeParams {
    component_x: u32,
    component_y: u32,
}

impl EncodeParams {
    /// Creates parameters, clamping both counts into `1..=9`.
    pub fn new(component_x: i64, component_y: i64) -> Self {
        Self {
            component_x: clamp_component(component_x),
            component_y: clamp_component(component_y),
        }
    }

    /// Creates parameters from optional counts, falling back to the 4×3 default.
    pub fn from_optional(component_x: Option<i64>, component_y: Option<i64>) -> Self {
        Self::new(
            component_x.unwrap_or(DEFAULT_COMPONENT_X as i64),
            component_y.unwrap_or(DEFAULT_COMPONENT_Y as i64),
        )
    }

    /// Horizontal component count.
    pub fn component_x(&self) -> u32 {
        self.component_x
    }

    /// Vertical component count.
    pub fn component_y(&self) -> u32 {
        self.component_y
    }
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            component_x: DEFAULT_COMPONENT_X,
            component_y: DEFAULT_COMPONENT_Y,
        }
    }
}

fn clamp_component(value: i64) -> u32 {
    value.clamp(MIN_COMPONENTS as i64, MAX_COMPONENTS as i64) as u32
}

/// Preview rendering parameters, validated on construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeParams {
    width: u32,
    height: u32,
    punch: f32,
}

impl DecodeParams {
    /// Validates and creates render parameters.
    ///
    /// `width` and `height` must lie in `(0, 1000]`, `punch` in `(0, 10]`.
    pub fn new(width: i64, height: i64, punch: f32) -> Result<Self> {
        let max = MAX_DECODE_DIMENSION as i64;
        if width <= 0 || width > max || height <= 0 || height > max {
            return Err(HazeError::Validation(format!(
                "width and height must be between 1 and {}",
                MAX_DECODE_DIMENSION
            )));
        }

        // Written as a negated range check so NaN is rejected as well.
        if !(punch > 0.0 && punch <= MAX_PUNCH) {
            return Err(HazeError::Validation(format!(
                "punch must be greater than 0 and at most {}",
                MAX_PUNCH
            )));
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            punch,
        })
    }

    /// Preview width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Preview height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Contrast factor.
    pub fn punch(&self) -> f32 {
        self.punch
    }
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_DECODE_WIDTH,
            height: DEFAULT_DECODE_HEIGHT,
            punch: DEFAULT_PUNCH,
        }
    }
}
