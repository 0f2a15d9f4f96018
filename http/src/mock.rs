//! HTTP 传输替身
//!
//! [`MockHttpCaller`] 不发送任何网络请求。
//! 它可以通过 [`MockHttpCaller::analyze_with`] 设置一个处理函数直接应答请求，
//! 也可以通过 [`MockHttpCaller::examine`] 获取一个 [`Examiner`]，
//! 在测试线程中逐个接收被拦截的请求并手动给出应答。
//!
//! [`Examiner`] 的两个信道都是零容量的同步信道，
//! 调用方会阻塞直到测试线程取走请求，再阻塞直到测试线程给出应答。

use super::{HttpCaller, Request, ResponseError, ResponseErrorKind, ResponseResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use std::{
    fmt::{self, Debug},
    sync::RwLock,
};

/// 传输替身给出的应答，即 HTTP 响应或 HTTP 响应错误
pub type ResponseAndError = ResponseResult;

type Analyzer = Box<dyn Fn(Request) -> ResponseAndError + Send + Sync>;

/// HTTP 传输替身
#[derive(Default)]
pub struct MockHttpCaller {
    analyzer: RwLock<Option<Analyzer>>,
}

/// 请求检查器
///
/// 从 `requests` 接收被拦截的请求，向 `responses` 发送对应的应答
#[derive(Debug)]
pub struct Examiner {
    /// 被拦截的请求
    pub requests: Receiver<Request>,

    /// 应答
    pub responses: Sender<ResponseAndError>,
}

impl MockHttpCaller {
    /// 创建传输替身
    ///
    /// 在设置处理函数前，所有请求都会得到 [`ResponseErrorKind::UnexpectedCall`] 错误
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// 设置处理函数，替换之前设置的处理函数
    pub fn analyze_with(&self, analyzer: impl Fn(Request) -> ResponseAndError + Send + Sync + 'static) {
        *self.analyzer.write().unwrap_or_else(|err| err.into_inner()) = Some(Box::new(analyzer));
    }

    /// 设置以同步信道转交请求的处理函数，并返回信道的另一端
    pub fn examine(&self) -> Examiner {
        let (request_sender, request_receiver) = bounded::<Request>(0);
        let (response_sender, response_receiver) = bounded::<ResponseAndError>(0);
        self.analyze_with(move |request| {
            let url = request.url().to_owned();
            request_sender.send(request).map_err(|_| {
                ResponseError::builder_with_msg(ResponseErrorKind::UnexpectedCall, "request examiner is gone")
                    .url(&url)
                    .build()
            })?;
            response_receiver.recv().map_err(|_| {
                ResponseError::builder_with_msg(ResponseErrorKind::UnexpectedCall, "response is not provided")
                    .url(&url)
                    .build()
            })?
        });
        Examiner {
            requests: request_receiver,
            responses: response_sender,
        }
    }
}

impl HttpCaller for MockHttpCaller {
    fn call(&self, request: Request) -> ResponseResult {
        debug!("mock http caller: {} {}", request.method(), request.url());
        let analyzer = self.analyzer.read().unwrap_or_else(|err| err.into_inner());
        if let Some(analyzer) = analyzer.as_ref() {
            analyzer(request)
        } else {
            Err(ResponseError::builder_with_msg(
                ResponseErrorKind::UnexpectedCall,
                "received a request it was not expecting",
            )
            .url(request.url())
            .build())
        }
    }
}

impl Debug for MockHttpCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analyzed = self
            .analyzer
            .read()
            .map(|analyzer| analyzer.is_some())
            .unwrap_or_default();
        f.debug_struct("MockHttpCaller").field("analyzed", &analyzed).finish()
    }
}
