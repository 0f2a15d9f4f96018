use super::request::UnsupportedArgument;
use anyhow::Error as AnyError;
use reqkit_http::{uri::InvalidUri, Response, ResponseError, ResponseErrorKind};
use std::io::Error as IoError;
use thiserror::Error as ThisError;

/// 请求错误
#[derive(ThisError, Debug)]
#[non_exhaustive]
pub enum Error {
    /// 传入了不支持的请求参数
    #[error(transparent)]
    UnsupportedArgument(#[from] UnsupportedArgument),

    /// 非法的请求 URL
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        /// 请求 URL
        url: String,
        /// 解析错误
        #[source]
        source: InvalidUri,
    },

    /// 非法的 HTTP 头
    #[error("invalid header {name:?}: {message}")]
    InvalidHeader {
        /// HTTP 头名称
        name: String,
        /// 错误信息
        message: String,
    },

    /// 读取请求体失败
    #[error("failed to read request body: {0}")]
    Body(#[from] IoError),

    /// HTTP 传输失败，没有收到响应
    #[error(transparent)]
    Transport(#[from] ResponseError),

    /// 解析响应体失败，响应依然可用
    #[error("failed to unmarshal response body: {error}")]
    Unmarshal {
        /// HTTP 响应，响应体已经被读入内存，可以重复读取
        response: Box<Response>,
        /// 最后一个失败的解析错误
        error: AnyError,
    },

    /// 请求在发送前被拒绝
    #[error("request is vetoed: {0}")]
    Vetoed(AnyError),

    /// 请求已经被发送过
    #[error("request has already been dispatched")]
    AlreadyDispatched,
}

impl Error {
    /// 获取 HTTP 传输错误类型
    #[inline]
    pub fn transport_kind(&self) -> Option<ResponseErrorKind> {
        match self {
            Self::Transport(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// 获取 HTTP 响应
    ///
    /// 仅在解析响应体失败时存在
    #[inline]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Unmarshal { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }

    /// 转换为 HTTP 响应
    #[inline]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Unmarshal { response, .. } => Some(*response),
            _ => None,
        }
    }
}

/// 请求结果
pub type Result<T> = std::result::Result<T, Error>;
