/// Progress curve applied to spark travel and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// `t` is expected in `[0, 1]`.
    #[inline(always)]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }

    /// Host-side code for the easing, as passed through `spark_configure`.
    /// Unknown codes fall back to ease-out.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Easing::Linear,
            1 => Easing::EaseIn,
            3 => Easing::EaseInOut,
            _ => Easing::EaseOut,
        }
    }
}
