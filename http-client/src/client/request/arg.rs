use serde_json::Value as JsonValue;
use std::{
    borrow::Cow,
    fmt::{self, Display},
};
use thiserror::Error;

/// 请求参数值
///
/// 所有可以作为请求参数的值都会先被转换为该类型，再由 [`ArgValue::stringify`] 转换为字符串
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ArgValue {
    /// 空值，对应的参数将被忽略
    Absent,

    /// 字符串
    Text(String),

    /// 32 位整型
    Int32(i32),

    /// 64 位整型
    Int64(i64),

    /// 32 位浮点型
    Float32(f32),

    /// 64 位浮点型
    Float64(f64),

    /// 字符
    Char(char),

    /// 布尔值
    Bool(bool),

    /// 已经通过 [`Display`] 渲染过的值
    Rendered(String),
}

impl ArgValue {
    /// 通过任意实现了 [`Display`] 的值创建参数值
    #[inline]
    pub fn rendered(value: impl Display) -> Self {
        Self::Rendered(value.to_string())
    }

    /// 判断是否为空值
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// 将参数值转换为字符串
    ///
    /// 空值返回 [`None`]。
    /// 浮点数使用最短的可往返十进制表示，不使用科学计数法，
    /// 非有限值分别表示为 `+Inf`，`-Inf` 和 `NaN`。
    pub fn stringify(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Text(s) | Self::Rendered(s) => Some(s.to_owned()),
            Self::Int32(i) => Some(i.to_string()),
            Self::Int64(i) => Some(i.to_string()),
            Self::Float32(f) => Some(stringify_float(*f, f.is_nan(), f.is_infinite(), f.is_sign_positive())),
            Self::Float64(f) => Some(stringify_float(*f, f.is_nan(), f.is_infinite(), f.is_sign_positive())),
            Self::Char(c) => Some(c.to_string()),
            Self::Bool(b) => Some(b.to_string()),
        }
    }
}

fn stringify_float(f: impl Display, is_nan: bool, is_infinite: bool, is_positive: bool) -> String {
    if is_nan {
        "NaN".to_owned()
    } else if is_infinite && is_positive {
        "+Inf".to_owned()
    } else if is_infinite {
        "-Inf".to_owned()
    } else {
        f.to_string()
    }
}

impl Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stringify() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

/// 不支持的请求参数类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported argument type: {kind}")]
pub struct UnsupportedArgument {
    kind: Cow<'static, str>,
}

impl UnsupportedArgument {
    /// 创建不支持的请求参数类型错误
    #[inline]
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self { kind: kind.into() }
    }

    /// 获取不支持的参数类型描述
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// 可以转换为请求参数值的类型
pub trait IntoArgValue {
    /// 转换为请求参数值
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument>;
}

impl IntoArgValue for ArgValue {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        Ok(self)
    }
}

impl IntoArgValue for &str {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        Ok(ArgValue::Text(self.to_owned()))
    }
}

impl IntoArgValue for String {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        Ok(ArgValue::Text(self))
    }
}

impl IntoArgValue for &String {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        Ok(ArgValue::Text(self.to_owned()))
    }
}

impl IntoArgValue for Cow<'_, str> {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        Ok(ArgValue::Text(self.into_owned()))
    }
}

macro_rules! impl_into_arg_value_for_scalar {
    ($ty:ty, $variant:ident) => {
        impl IntoArgValue for $ty {
            #[inline]
            fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
                Ok(ArgValue::$variant(self))
            }
        }

        impl IntoArgValue for &$ty {
            #[inline]
            fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
                Ok(ArgValue::$variant(*self))
            }
        }
    };
}

impl_into_arg_value_for_scalar!(i32, Int32);
impl_into_arg_value_for_scalar!(i64, Int64);
impl_into_arg_value_for_scalar!(f32, Float32);
impl_into_arg_value_for_scalar!(f64, Float64);
impl_into_arg_value_for_scalar!(char, Char);
impl_into_arg_value_for_scalar!(bool, Bool);

impl<T: IntoArgValue> IntoArgValue for Option<T> {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        match self {
            Some(value) => value.into_arg_value(),
            None => Ok(ArgValue::Absent),
        }
    }
}

/// 通过 [`Display`] 渲染为请求参数的值
///
/// 用于传入没有直接实现 [`IntoArgValue`] 的类型，例如无符号整型或自定义类型
#[derive(Debug, Clone, Copy)]
pub struct Rendered<T>(pub T);

impl<T: Display> IntoArgValue for Rendered<T> {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        Ok(ArgValue::rendered(self.0))
    }
}

impl IntoArgValue for &JsonValue {
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        match self {
            JsonValue::Null => Ok(ArgValue::Absent),
            JsonValue::Bool(b) => Ok(ArgValue::Bool(*b)),
            JsonValue::String(s) => Ok(ArgValue::Text(s.to_owned())),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ArgValue::Int64(i))
                } else if n.is_u64() {
                    Ok(ArgValue::rendered(n))
                } else if let Some(f) = n.as_f64() {
                    Ok(ArgValue::Float64(f))
                } else {
                    Ok(ArgValue::rendered(n))
                }
            }
            JsonValue::Array(_) => Err(UnsupportedArgument::new("json array")),
            JsonValue::Object(_) => Err(UnsupportedArgument::new("json object")),
        }
    }
}

impl IntoArgValue for JsonValue {
    #[inline]
    fn into_arg_value(self) -> Result<ArgValue, UnsupportedArgument> {
        (&self).into_arg_value()
    }
}

/// 判断参数值是否与默认值相同，相同则忽略该参数，否则返回参数字符串
pub(super) fn resolve_with_default(value: &ArgValue, default: &ArgValue) -> Option<String> {
    if value == default {
        return None;
    }
    let stringified = value.stringify();
    if stringified == default.stringify() {
        None
    } else {
        stringified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify_scalars() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!("text".into_arg_value()?.stringify().as_deref(), Some("text"));
        assert_eq!((-42i32).into_arg_value()?.stringify().as_deref(), Some("-42"));
        assert_eq!(i64::MAX.into_arg_value()?.stringify().as_deref(), Some("9223372036854775807"));
        assert_eq!('x'.into_arg_value()?.stringify().as_deref(), Some("x"));
        assert_eq!(true.into_arg_value()?.stringify().as_deref(), Some("true"));
        assert_eq!(false.into_arg_value()?.stringify().as_deref(), Some("false"));
        assert_eq!(Rendered(7u64).into_arg_value()?.stringify().as_deref(), Some("7"));
        Ok(())
    }

    #[test]
    fn test_stringify_floats() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!(1.5f64.into_arg_value()?.stringify().as_deref(), Some("1.5"));
        assert_eq!(0.1f32.into_arg_value()?.stringify().as_deref(), Some("0.1"));
        assert_eq!(1e21f64.into_arg_value()?.stringify().as_deref(), Some("1000000000000000000000"));
        assert_eq!(3.0f64.into_arg_value()?.stringify().as_deref(), Some("3"));
        assert_eq!(f64::NAN.into_arg_value()?.stringify().as_deref(), Some("NaN"));
        assert_eq!(f64::INFINITY.into_arg_value()?.stringify().as_deref(), Some("+Inf"));
        assert_eq!(f32::NEG_INFINITY.into_arg_value()?.stringify().as_deref(), Some("-Inf"));
        Ok(())
    }

    #[test]
    fn test_absent_values() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        assert!(None::<i32>.into_arg_value()?.is_absent());
        assert!(None::<&str>.into_arg_value()?.is_absent());
        assert!(None::<bool>.into_arg_value()?.is_absent());
        assert!(None::<f64>.into_arg_value()?.is_absent());
        assert!(None::<char>.into_arg_value()?.is_absent());
        assert_eq!(Some(5i64).into_arg_value()?.stringify().as_deref(), Some("5"));
        assert_eq!(Some(&2.5f32).into_arg_value()?.stringify().as_deref(), Some("2.5"));
        assert_eq!(ArgValue::Absent.stringify(), None);
        Ok(())
    }

    #[test]
    fn test_json_values() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        assert!(json!(null).into_arg_value()?.is_absent());
        assert_eq!(json!("s").into_arg_value()?, ArgValue::Text("s".to_owned()));
        assert_eq!(json!(12).into_arg_value()?, ArgValue::Int64(12));
        assert_eq!(json!(u64::MAX).into_arg_value()?.stringify().as_deref(), Some("18446744073709551615"));
        assert_eq!(json!(0.25).into_arg_value()?, ArgValue::Float64(0.25));
        assert_eq!(json!(true).into_arg_value()?, ArgValue::Bool(true));
        assert_eq!(
            json!([1, 2]).into_arg_value().unwrap_err(),
            UnsupportedArgument::new("json array")
        );
        assert!(json!({"a": 1}).into_arg_value().is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_with_default() {
        env_logger::builder().is_test(true).try_init().ok();

        assert_eq!(resolve_with_default(&ArgValue::Int32(0), &ArgValue::Int32(0)), None);
        assert_eq!(
            resolve_with_default(&ArgValue::Int32(1), &ArgValue::Int32(0)).as_deref(),
            Some("1")
        );
        assert_eq!(
            resolve_with_default(&ArgValue::Text("7".to_owned()), &ArgValue::Int64(7)),
            None
        );
        assert_eq!(resolve_with_default(&ArgValue::Absent, &ArgValue::Int32(0)), None);
        assert_eq!(resolve_with_default(&ArgValue::Absent, &ArgValue::Absent), None);
        assert_eq!(
            resolve_with_default(&ArgValue::Bool(true), &ArgValue::Absent).as_deref(),
            Some("true")
        );
    }
}
