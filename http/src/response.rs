use super::error::Error;
use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, HeaderValue, IntoHeaderName},
    response::Response as HttpResponse,
    status::StatusCode,
    Extensions, Version,
};
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Result as IoResult},
    mem::take,
    result,
};

/// HTTP 响应体
pub struct ResponseBody(ResponseBodyInner);

enum ResponseBodyInner {
    Reader(Box<dyn Read + Send + Sync>),
    Bytes(Cursor<Vec<u8>>),
}

impl ResponseBody {
    /// 通过输入流创建 HTTP 响应体
    #[inline]
    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        Self(ResponseBodyInner::Reader(Box::new(reader)))
    }

    /// 通过二进制数据创建 HTTP 响应体
    #[inline]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(ResponseBodyInner::Bytes(Cursor::new(bytes)))
    }

    /// 判断响应体是否已经完整读入内存
    #[inline]
    pub fn is_bytes(&self) -> bool {
        matches!(self.0, ResponseBodyInner::Bytes(_))
    }
}

impl Default for ResponseBody {
    #[inline]
    fn default() -> Self {
        Self::from_bytes(Default::default())
    }
}

impl Read for ResponseBody {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.0 {
            ResponseBodyInner::Reader(reader) => reader.read(buf),
            ResponseBodyInner::Bytes(bytes) => bytes.read(buf),
        }
    }
}

impl Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ResponseBodyInner::Reader(_) => f.debug_tuple("Reader").finish(),
            ResponseBodyInner::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.get_ref().len()).finish(),
        }
    }
}

/// HTTP 响应
#[derive(Debug, Default)]
pub struct Response {
    inner: HttpResponse<ResponseBody>,
}

impl Response {
    /// 创建 HTTP 响应构建器
    #[inline]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// 获取 HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    /// 获取 HTTP 状态码的可变引用
    #[inline]
    pub fn status_code_mut(&mut self) -> &mut StatusCode {
        self.inner.status_mut()
    }

    /// 获取 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// 获取 HTTP Headers 的可变引用
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// 获取 HTTP Header
    #[inline]
    pub fn header(&self, header_name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.inner.headers().get(header_name.as_ref())
    }

    /// 获取 HTTP 版本
    #[inline]
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// 获取扩展信息
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        self.inner.extensions()
    }

    /// 获取扩展信息的可变引用
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.inner.extensions_mut()
    }

    /// 获取 HTTP 响应体
    #[inline]
    pub fn body(&self) -> &ResponseBody {
        self.inner.body()
    }

    /// 获取 HTTP 响应体的可变引用
    #[inline]
    pub fn body_mut(&mut self) -> &mut ResponseBody {
        self.inner.body_mut()
    }

    /// 转换为 HTTP 响应体
    #[inline]
    pub fn into_body(self) -> ResponseBody {
        self.inner.into_body()
    }

    /// 将响应体完整读入内存后返回其内容，响应体本身替换为内存副本
    pub fn fulfill_body(&mut self) -> IoResult<&[u8]> {
        let body = &mut self.inner.body_mut().0;
        if let ResponseBodyInner::Reader(reader) = body {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            *body = ResponseBodyInner::Bytes(Cursor::new(buf));
        }
        Ok(match body {
            ResponseBodyInner::Bytes(bytes) => bytes.get_ref().as_slice(),
            ResponseBodyInner::Reader(_) => &[],
        })
    }

    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl From<HttpResponse<ResponseBody>> for Response {
    #[inline]
    fn from(inner: HttpResponse<ResponseBody>) -> Self {
        Self { inner }
    }
}

/// HTTP 响应构建器
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    /// 设置 HTTP 状态码
    #[inline]
    pub fn status_code(&mut self, status_code: StatusCode) -> &mut Self {
        *self.inner.inner.status_mut() = status_code;
        self
    }

    /// 设置 HTTP 版本
    #[inline]
    pub fn version(&mut self, version: Version) -> &mut Self {
        *self.inner.inner.version_mut() = version;
        self
    }

    /// 设置 HTTP Headers
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        *self.inner.inner.headers_mut() = headers;
        self
    }

    /// 设置 HTTP Header
    #[inline]
    pub fn header(&mut self, header_name: impl IntoHeaderName, header_value: HeaderValue) -> &mut Self {
        self.inner.inner.headers_mut().insert(header_name, header_value);
        self
    }

    /// 设置 HTTP 响应体
    #[inline]
    pub fn body(&mut self, body: ResponseBody) -> &mut Self {
        *self.inner.inner.body_mut() = body;
        self
    }

    /// 以二进制数据设置 HTTP 响应体
    #[inline]
    pub fn bytes_as_body(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.body(ResponseBody::from_bytes(bytes.into()))
    }

    /// 构建 HTTP 响应，同时重置构建器
    #[inline]
    pub fn build(&mut self) -> Response {
        take(&mut self.inner)
    }
}

/// HTTP 响应结果
pub type Result = result::Result<Response, Error>;
