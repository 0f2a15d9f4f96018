use anyhow::Result as AnyResult;
use serde::de::DeserializeOwned;
use std::{
    any::type_name,
    fmt::{self, Debug},
    str::from_utf8,
};

/// 响应体解析接口
///
/// 每个请求可以注册多个解析器，它们会依次解析同一份响应体
pub trait ResponseUnmarshaller {
    /// 解析响应体
    fn unmarshal(&mut self, body: &[u8]) -> AnyResult<()>;
}

impl<F: FnMut(&[u8]) -> AnyResult<()>> ResponseUnmarshaller for F {
    #[inline]
    fn unmarshal(&mut self, body: &[u8]) -> AnyResult<()> {
        self(body)
    }
}

/// JSON 响应体解析器
pub struct JsonUnmarshaller<'a, T> {
    output: &'a mut T,
}

impl<'a, T: DeserializeOwned> JsonUnmarshaller<'a, T> {
    /// 创建 JSON 响应体解析器，解析结果写入 `output`
    #[inline]
    pub fn new(output: &'a mut T) -> Self {
        Self { output }
    }
}

impl<T: DeserializeOwned> ResponseUnmarshaller for JsonUnmarshaller<'_, T> {
    #[inline]
    fn unmarshal(&mut self, body: &[u8]) -> AnyResult<()> {
        *self.output = serde_json::from_slice(body)?;
        Ok(())
    }
}

impl<T> Debug for JsonUnmarshaller<'_, T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonUnmarshaller").field("output", &type_name::<T>()).finish()
    }
}

/// XML 响应体解析器
pub struct XmlUnmarshaller<'a, T> {
    output: &'a mut T,
}

impl<'a, T: DeserializeOwned> XmlUnmarshaller<'a, T> {
    /// 创建 XML 响应体解析器，解析结果写入 `output`
    #[inline]
    pub fn new(output: &'a mut T) -> Self {
        Self { output }
    }
}

impl<T: DeserializeOwned> ResponseUnmarshaller for XmlUnmarshaller<'_, T> {
    #[inline]
    fn unmarshal(&mut self, body: &[u8]) -> AnyResult<()> {
        *self.output = quick_xml::de::from_str(from_utf8(body)?)?;
        Ok(())
    }
}

impl<T> Debug for XmlUnmarshaller<'_, T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlUnmarshaller").field("output", &type_name::<T>()).finish()
    }
}

/// 创建 JSON 响应体解析器
#[inline]
pub fn from_json<T: DeserializeOwned>(output: &mut T) -> JsonUnmarshaller<'_, T> {
    JsonUnmarshaller::new(output)
}

/// 创建 XML 响应体解析器
#[inline]
pub fn from_xml<T: DeserializeOwned>(output: &mut T) -> XmlUnmarshaller<'_, T> {
    XmlUnmarshaller::new(output)
}
