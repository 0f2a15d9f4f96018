use anyhow::Error as AnyError;
use http::uri::Uri;
use std::{
    error,
    fmt::{self, Debug, Display},
};

/// HTTP 响应错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 非法的请求 / 响应错误
    InvalidRequestResponse,

    /// 非法的 URL
    InvalidUrl,

    /// 非法的 HTTP 头
    InvalidHeader,

    /// 网络连接失败
    ConnectError,

    /// 代理连接失败
    ProxyError,

    /// DNS 服务器连接失败
    DnsServerError,

    /// 发送失败
    SendError,

    /// 接受失败
    ReceiveError,

    /// 本地 IO 失败
    LocalIoError,

    /// 超时失败
    TimeoutError,

    /// SSL 错误
    SslError,

    /// 重定向次数过多
    TooManyRedirect,

    /// 传输替身收到了未预期的请求
    UnexpectedCall,

    /// 未知错误
    UnknownError,
}

/// HTTP 响应错误
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
    url: Option<Uri>,
}

/// HTTP 响应错误构建器
#[derive(Debug)]
pub struct ErrorBuilder {
    inner: Error,
}

impl Error {
    /// 创建 HTTP 响应错误构建器
    #[inline]
    pub fn builder(kind: ErrorKind, err: impl Into<AnyError>) -> ErrorBuilder {
        ErrorBuilder {
            inner: Self {
                kind,
                error: err.into(),
                url: None,
            },
        }
    }

    /// 创建 HTTP 响应错误构建器
    #[inline]
    pub fn builder_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> ErrorBuilder {
        Self::builder(kind, AnyError::msg(msg))
    }

    /// 获取 HTTP 响应错误类型
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取发生错误的请求 URL
    #[inline]
    pub fn url(&self) -> Option<&Uri> {
        self.url.as_ref()
    }

    /// 转换为内部错误
    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }
}

impl ErrorBuilder {
    /// 设置发生错误的请求 URL
    #[inline]
    #[must_use]
    pub fn url(mut self, url: &Uri) -> Self {
        self.inner.url = Some(url.to_owned());
        self
    }

    /// 构建 HTTP 响应错误
    #[inline]
    pub fn build(self) -> Error {
        self.inner
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(url) = &self.url {
            write!(f, "[{:?}] {}: {}", self.kind, url, self.error)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.error)
        }
    }
}

impl error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
