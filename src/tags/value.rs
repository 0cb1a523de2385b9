//! Scalar to tag value coercion.
//!
//! Typed call sites go through [`TagValue`]; dynamically typed argument lists
//! go through [`coerce`], which reports unsupported types as `None`.

use std::any::Any;
use std::fmt::Display;

/// Literal used for absent scalars.
pub const NIL: &str = "nil";

/// A scalar that renders to a tag value.
pub trait TagValue {
    fn to_tag_value(&self) -> String;
}

macro_rules! display_tag_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TagValue for $ty {
                fn to_tag_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_tag_value!(
    str, String, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl<T: TagValue + ?Sized> TagValue for &T {
    fn to_tag_value(&self) -> String {
        (**self).to_tag_value()
    }
}

impl<T: TagValue> TagValue for Option<T> {
    fn to_tag_value(&self) -> String {
        match self {
            Some(value) => value.to_tag_value(),
            None => NIL.to_string(),
        }
    }
}

impl<T: TagValue + ?Sized> TagValue for Box<T> {
    fn to_tag_value(&self) -> String {
        (**self).to_tag_value()
    }
}

macro_rules! try_downcast {
    ($value:expr, $($ty:ty),*) => {
        $(
            if let Some(v) = $value.downcast_ref::<$ty>() {
                return Some(v.to_tag_value());
            }
            if let Some(v) = $value.downcast_ref::<Option<$ty>>() {
                return Some(v.to_tag_value());
            }
            if let Some(v) = $value.downcast_ref::<Box<$ty>>() {
                return Some(v.to_tag_value());
            }
        )*
    };
}

/// Convert a dynamically typed scalar into its tag string.
///
/// Supports strings, every integer and float width, booleans, and `Option`s
/// or `Box`es of those. `None` and `()` render as `"nil"`. Anything else
/// returns `None` and must be skipped by the caller.
pub fn coerce(value: &dyn Any) -> Option<String> {
    if value.is::<()>() {
        return Some(NIL.to_string());
    }
    try_downcast!(
        value, &'static str, String, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64,
        u128, usize, f32, f64
    );
    None
}

/// Render a boolean tag value.
pub fn bool_tag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Any primitive integer, of any width or signedness.
pub trait Integer: Copy + Display {
    /// The value as `i64`, clamped to `i64::MIN..=i64::MAX`.
    fn saturating_i64(self) -> i64;
}

macro_rules! signed_integer {
    ($($ty:ty),*) => {
        $(
            impl Integer for $ty {
                fn saturating_i64(self) -> i64 {
                    i64::try_from(self).unwrap_or(if self < 0 { i64::MIN } else { i64::MAX })
                }
            }
        )*
    };
}

macro_rules! unsigned_integer {
    ($($ty:ty),*) => {
        $(
            impl Integer for $ty {
                fn saturating_i64(self) -> i64 {
                    i64::try_from(self).unwrap_or(i64::MAX)
                }
            }
        )*
    };
}

signed_integer!(i8, i16, i32, i64, i128, isize);
unsigned_integer!(u8, u16, u32, u64, u128, usize);

/// Render an integer tag value.
pub fn int_tag<T: Integer>(value: T) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_formatting() {
        assert_eq!(coerce(&42i32).as_deref(), Some("42"));
        assert_eq!(coerce(&-7i8).as_deref(), Some("-7"));
        assert_eq!(coerce(&u64::MAX).as_deref(), Some("18446744073709551615"));
        assert_eq!(coerce(&42.42f64).as_deref(), Some("42.42"));
        assert_eq!(coerce(&42.42f32).as_deref(), Some("42.42"));
        assert_eq!(coerce(&true).as_deref(), Some("true"));
        assert_eq!(coerce(&"foo").as_deref(), Some("foo"));
        assert_eq!(coerce(&String::from("bar")).as_deref(), Some("bar"));
    }

    #[test]
    fn test_optional_and_nil() {
        assert_eq!(coerce(&Some(5u16)).as_deref(), Some("5"));
        assert_eq!(coerce(&None::<i64>).as_deref(), Some("nil"));
        assert_eq!(coerce(&()).as_deref(), Some("nil"));
        assert_eq!(coerce(&Box::new(1.5f64)).as_deref(), Some("1.5"));
    }

    #[test]
    fn test_unsupported_type() {
        struct Payload {
            _id: u32,
        }
        assert_eq!(coerce(&Payload { _id: 1 }), None);
        assert_eq!(coerce(&vec![1, 2, 3]), None);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(bool_tag(true), "true");
        assert_eq!(bool_tag(false), "false");
        assert_eq!(int_tag(12u8), "12");
        assert_eq!(int_tag(-3i64), "-3");
        assert_eq!(int_tag(7usize), "7");
        assert_eq!(int_tag(-2isize), "-2");
        assert_eq!(int_tag(u64::MAX), "18446744073709551615");
        assert_eq!(int_tag(u128::MAX), u128::MAX.to_string());
        assert_eq!(None::<&str>.to_tag_value(), "nil");
    }

    #[test]
    fn test_saturating_i64() {
        assert_eq!(5usize.saturating_i64(), 5);
        assert_eq!(u64::MAX.saturating_i64(), i64::MAX);
        assert_eq!(u128::MAX.saturating_i64(), i64::MAX);
        assert_eq!(i128::MIN.saturating_i64(), i64::MIN);
        assert_eq!((-4isize).saturating_i64(), -4);
        assert_eq!(i64::MIN.saturating_i64(), i64::MIN);
    }
}
