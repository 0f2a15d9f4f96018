//! 请求级替身
//!
//! 为 [`Client`](super::Client) 设置 [`RequestAnalyzer`] 后，[`Request::call`](super::Request::call)
//! 不再编码请求，也不再经过限速器和 HTTP 传输，
//! 而是将请求的快照 [`InterceptedRequest`] 直接交给分析器，分析器给出的响应依然会被所有响应体解析器解析。
//!
//! [`MockRequestAnalyzer`] 与 [`reqkit_http::mock::MockHttpCaller`] 用法相同，
//! 可以设置处理函数直接应答，也可以通过 [`MockRequestAnalyzer::examine`] 在测试线程中逐个应答。

use super::request::Params;
use cookie::Cookie;
use crossbeam_channel::{bounded, Receiver, Sender};
use indexmap::IndexMap;
use log::debug;
use reqkit_http::{Method, ResponseError, ResponseErrorKind, ResponseResult};
use std::{
    fmt::{self, Debug},
    sync::RwLock,
};

/// 请求分析接口
pub trait RequestAnalyzer: Debug + Send + Sync {
    /// 分析被拦截的请求并给出应答
    fn analyze(&self, request: InterceptedRequest) -> ResponseResult;
}

/// 被拦截的请求快照
///
/// 上传的文件只保留字段名和文件名，文件数据不会被读取
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub(super) method: Method,
    pub(super) url: String,
    pub(super) path: String,
    pub(super) headers: IndexMap<String, String>,
    pub(super) cookies: Vec<Cookie<'static>>,
    pub(super) basic_auth: Option<(String, String)>,
    pub(super) query_params: Params,
    pub(super) form_params: Params,
    pub(super) auto_params: Params,
    pub(super) files: Vec<(String, String)>,
    pub(super) multipart: bool,
}

impl InterceptedRequest {
    /// 获取 HTTP 方法
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 获取完整的请求 URL
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 获取请求路径
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取 HTTP 头，名称都是小写的
    #[inline]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// 获取 Cookies
    #[inline]
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// 获取 HTTP Basic 认证的用户名和密码
    #[inline]
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        self.basic_auth
            .as_ref()
            .map(|(user, password)| (user.as_str(), password.as_str()))
    }

    /// 获取查询参数
    #[inline]
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    /// 获取表单参数
    #[inline]
    pub fn form_params(&self) -> &Params {
        &self.form_params
    }

    /// 获取自动参数
    #[inline]
    pub fn auto_params(&self) -> &Params {
        &self.auto_params
    }

    /// 获取上传文件的字段名和文件名
    #[inline]
    pub fn files(&self) -> &[(String, String)] {
        &self.files
    }

    /// 是否强制使用 Multipart 表单
    #[inline]
    pub fn is_multipart(&self) -> bool {
        self.multipart
    }
}

type Analyzer = Box<dyn Fn(InterceptedRequest) -> ResponseResult + Send + Sync>;

/// 请求级替身
#[derive(Default)]
pub struct MockRequestAnalyzer {
    analyzer: RwLock<Option<Analyzer>>,
}

/// 请求检查器
///
/// 从 `requests` 接收被拦截的请求快照，向 `responses` 发送对应的应答
#[derive(Debug)]
pub struct RequestExaminer {
    /// 被拦截的请求快照
    pub requests: Receiver<InterceptedRequest>,

    /// 应答
    pub responses: Sender<ResponseResult>,
}

impl MockRequestAnalyzer {
    /// 创建请求级替身
    ///
    /// 在设置处理函数前，所有请求都会得到 [`ResponseErrorKind::UnexpectedCall`] 错误
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// 设置处理函数，替换之前设置的处理函数
    pub fn analyze_with(&self, analyzer: impl Fn(InterceptedRequest) -> ResponseResult + Send + Sync + 'static) {
        *self.analyzer.write().unwrap_or_else(|err| err.into_inner()) = Some(Box::new(analyzer));
    }

    /// 设置以同步信道转交请求快照的处理函数，并返回信道的另一端
    pub fn examine(&self) -> RequestExaminer {
        let (request_sender, request_receiver) = bounded::<InterceptedRequest>(0);
        let (response_sender, response_receiver) = bounded::<ResponseResult>(0);
        self.analyze_with(move |request| {
            request_sender.send(request).map_err(|_| {
                ResponseError::builder_with_msg(ResponseErrorKind::UnexpectedCall, "request examiner is gone").build()
            })?;
            response_receiver.recv().map_err(|_| {
                ResponseError::builder_with_msg(ResponseErrorKind::UnexpectedCall, "response is not provided").build()
            })?
        });
        RequestExaminer {
            requests: request_receiver,
            responses: response_sender,
        }
    }
}

impl RequestAnalyzer for MockRequestAnalyzer {
    fn analyze(&self, request: InterceptedRequest) -> ResponseResult {
        debug!("mock request analyzer: {} {}", request.method(), request.url());
        let analyzer = self.analyzer.read().unwrap_or_else(|err| err.into_inner());
        match analyzer.as_ref() {
            Some(analyzer) => analyzer(request),
            None => Err(ResponseError::builder_with_msg(
                ResponseErrorKind::UnexpectedCall,
                "received a request it was not expecting",
            )
            .build()),
        }
    }
}

impl Debug for MockRequestAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analyzed = self
            .analyzer
            .read()
            .map(|analyzer| analyzer.is_some())
            .unwrap_or_default();
        f.debug_struct("MockRequestAnalyzer").field("analyzed", &analyzed).finish()
    }
}
