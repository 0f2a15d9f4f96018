use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, HeaderName, HeaderValue, IntoHeaderName},
    method::Method,
    uri::Uri,
    Extensions, Version,
};
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Result as IoResult},
    mem::take,
};

/// HTTP 请求体
///
/// 可以是内存数据，也可以是只能读取一次的输入流。
/// 输入流在请求体被丢弃时一同被丢弃，以此释放其持有的资源。
pub struct RequestBody(RequestBodyInner);

enum RequestBodyInner {
    Bytes(Cursor<Vec<u8>>),
    Reader {
        reader: Box<dyn Read + Send>,
        size: Option<u64>,
    },
}

impl RequestBody {
    /// 通过内存数据创建请求体
    #[inline]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(RequestBodyInner::Bytes(Cursor::new(bytes)))
    }

    /// 通过长度未知的输入流创建请求体
    #[inline]
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self(RequestBodyInner::Reader {
            reader: Box::new(reader),
            size: None,
        })
    }

    /// 通过长度已知的输入流创建请求体
    #[inline]
    pub fn from_reader_with_size(reader: impl Read + Send + 'static, size: u64) -> Self {
        Self(RequestBodyInner::Reader {
            reader: Box::new(reader),
            size: Some(size),
        })
    }

    /// 获取请求体长度
    ///
    /// 如果是长度未知的输入流，则返回 [`None`]
    #[inline]
    pub fn size(&self) -> Option<u64> {
        match &self.0 {
            RequestBodyInner::Bytes(bytes) => Some(bytes.get_ref().len() as u64),
            RequestBodyInner::Reader { size, .. } => *size,
        }
    }
}

impl Default for RequestBody {
    #[inline]
    fn default() -> Self {
        Self::from_bytes(Default::default())
    }
}

impl From<Vec<u8>> for RequestBody {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for RequestBody {
    #[inline]
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl Read for RequestBody {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.0 {
            RequestBodyInner::Bytes(bytes) => bytes.read(buf),
            RequestBodyInner::Reader { reader, .. } => reader.read(buf),
        }
    }
}

impl Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            RequestBodyInner::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.get_ref().len()).finish(),
            RequestBodyInner::Reader { size, .. } => f.debug_struct("Reader").field("size", size).finish(),
        }
    }
}

/// HTTP 请求
///
/// 封装 HTTP 请求相关字段，由请求分发层构建后交给 [`crate::HttpCaller`] 发送
#[derive(Debug, Default)]
pub struct Request {
    url: Uri,
    method: Method,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
    body: RequestBody,
}

impl Request {
    /// 创建 HTTP 请求构建器
    #[inline]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// 获取 HTTP 请求 URL
    #[inline]
    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// 获取 HTTP 请求 URL 的可变引用
    #[inline]
    pub fn url_mut(&mut self) -> &mut Uri {
        &mut self.url
    }

    /// 获取请求 HTTP 方法
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 获取请求 HTTP 方法的可变引用
    #[inline]
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    /// 获取请求 HTTP 版本
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// 获取请求 HTTP 版本的可变引用
    #[inline]
    pub fn version_mut(&mut self) -> &mut Version {
        &mut self.version
    }

    /// 获取请求 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取请求 HTTP Headers 的可变引用
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 获取请求 HTTP Header
    #[inline]
    pub fn header(&self, header_name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(header_name.as_ref())
    }

    /// 获取扩展信息
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// 获取扩展信息的可变引用
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// 获取请求体
    #[inline]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// 获取请求体的可变引用
    #[inline]
    pub fn body_mut(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    /// 转换为请求体
    #[inline]
    pub fn into_body(self) -> RequestBody {
        self.body
    }

    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
    }
}

/// HTTP 请求构建器
#[derive(Debug, Default)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    /// 设置 HTTP 请求 URL
    #[inline]
    pub fn url(&mut self, url: Uri) -> &mut Self {
        self.inner.url = url;
        self
    }

    /// 设置请求 HTTP 方法
    #[inline]
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.inner.method = method;
        self
    }

    /// 设置请求 HTTP 版本
    #[inline]
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.inner.version = version;
        self
    }

    /// 设置请求 HTTP Headers
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.inner.headers = headers;
        self
    }

    /// 设置请求 HTTP Header，同名 Header 将被覆盖
    #[inline]
    pub fn header(&mut self, header_name: impl IntoHeaderName, header_value: HeaderValue) -> &mut Self {
        self.inner.headers.insert(header_name, header_value);
        self
    }

    /// 追加请求 HTTP Header
    #[inline]
    pub fn append_header(&mut self, header_name: HeaderName, header_value: HeaderValue) -> &mut Self {
        self.inner.headers.append(header_name, header_value);
        self
    }

    /// 添加扩展信息
    #[inline]
    pub fn add_extension<T: Send + Sync + 'static>(&mut self, val: T) -> &mut Self {
        self.inner.extensions.insert(val);
        self
    }

    /// 设置请求体
    #[inline]
    pub fn body(&mut self, body: RequestBody) -> &mut Self {
        self.inner.body = body;
        self
    }

    /// 构建 HTTP 请求，同时重置构建器
    #[inline]
    pub fn build(&mut self) -> Request {
        take(&mut self.inner)
    }
}
