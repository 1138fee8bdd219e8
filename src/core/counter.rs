use num_traits as num;
use std::fmt;

/// This trait represents the operations a histogram must be able to perform on the underlying
/// counter type. The `ToPrimitive` trait is needed to perform floating point operations on the
/// counts (usually for percentiles). The `FromPrimitive` to convert back into an integer count.
/// Partial ordering is used for threshholding, also usually in the context of percentiles.
pub trait Counter:
    num::Num
    + num::ToPrimitive
    + num::FromPrimitive
    + num::Saturating
    + num::CheckedSub
    + num::CheckedAdd
    + Copy
    + PartialOrd<Self>
    + fmt::Debug
{
    /// Counter as a f64.
    fn as_f64(&self) -> f64;
    /// Counter as a u64.
    fn as_u64(&self) -> u64;
    /// Counter from a u64, saturating at the counter's maximum. Packed storage keeps 64-bit
    /// logical cells regardless of the counter type, so reads must narrow without wrapping.
    fn from_u64_bounded(value: u64) -> Self;
}

impl Counter for u8 {
    #[inline]
    fn as_f64(&self) -> f64 {
        f64::from(*self)
    }
    #[inline]
    fn as_u64(&self) -> u64 {
        u64::from(*self)
    }
    #[inline]
    fn from_u64_bounded(value: u64) -> Self {
        if value > u64::from(u8::max_value()) {
            u8::max_value()
        } else {
            value as u8
        }
    }
}

impl Counter for u16 {
    #[inline]
    fn as_f64(&self) -> f64 {
        f64::from(*self)
    }
    #[inline]
    fn as_u64(&self) -> u64 {
        u64::from(*self)
    }
    #[inline]
    fn from_u64_bounded(value: u64) -> Self {
        if value > u64::from(u16::max_value()) {
            u16::max_value()
        } else {
            value as u16
        }
    }
}

impl Counter for u32 {
    #[inline]
    fn as_f64(&self) -> f64 {
        f64::from(*self)
    }
    #[inline]
    fn as_u64(&self) -> u64 {
        u64::from(*self)
    }
    #[inline]
    fn from_u64_bounded(value: u64) -> Self {
        if value > u64::from(u32::max_value()) {
            u32::max_value()
        } else {
            value as u32
        }
    }
}

impl Counter for u64 {
    #[inline]
    fn as_f64(&self) -> f64 {
        *self as f64
    }
    #[inline]
    fn as_u64(&self) -> u64 {
        *self
    }
    #[inline]
    fn from_u64_bounded(value: u64) -> Self {
        value
    }
}
