//! Angle normalization and angle-to-pixel mapping for equirectangular frames

/// An angle type that can be folded into the canonical `[0, 360)` range.
pub trait Degrees: Copy {
    fn constrain(self) -> Self;
}

macro_rules! impl_int_degrees {
    ($($t:ty),*) => {
        $(
            impl Degrees for $t {
                #[inline]
                fn constrain(self) -> Self {
                    self.rem_euclid(360)
                }
            }
        )*
    };
}

macro_rules! impl_float_degrees {
    ($($t:ty),*) => {
        $(
            impl Degrees for $t {
                #[inline]
                fn constrain(self) -> Self {
                    let r = self.rem_euclid(360.0);
                    // rem_euclid rounds tiny negative inputs up to exactly 360
                    if r >= 360.0 {
                        0.0
                    } else {
                        r
                    }
                }
            }
        )*
    };
}

impl_int_degrees!(i32, i64);
impl_float_degrees!(f32, f64);

/// Wrap an angle into `[0, 360)`. Negative inputs wrap forward.
#[inline]
pub fn constrain_angle<A: Degrees>(angle: A) -> A {
    angle.constrain()
}

/// Column of a horizontal angle in a frame spanning 360° over `width` pixels.
#[inline]
pub fn angle_to_col(angle: f64, width: u32) -> u32 {
    let col = (angle * f64::from(width) / 360.0).floor() as u32;
    col.min(width.saturating_sub(1))
}

/// Pixel count covered by `angle` degrees of a 360° wide frame.
#[inline]
pub fn angle_to_width(angle: f64, width: u32) -> u32 {
    (angle * f64::from(width) / 360.0).floor() as u32
}

/// Row of a vertical angle inside one eye's half, which spans 180°.
#[inline]
pub fn angle_to_row(angle: f64, half_height: u32) -> u32 {
    let row = (angle * f64::from(half_height) / 180.0).floor() as u32;
    row.min(half_height)
}
