#![deny(
    missing_debug_implementations,
    large_assignments,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_docs,
    non_ascii_idents,
    trivial_numeric_casts,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]

//! # reqkit-http
//!
//! ## HTTP 传输接口
//!
//! 定义请求分发层所依赖的阻塞 HTTP 传输接口 [`HttpCaller`]，
//! 以及该接口所使用的 HTTP 请求，HTTP 响应和 HTTP 响应错误类型。
//!
//! 真正发送 HTTP 请求的实现由其他库提供，例如 `reqkit-ureq`。
//! [`mock`] 模块提供了一个基于同步信道的传输替身，便于在测试中逐个拦截并应答请求。

mod error;
pub mod mock;
mod request;
mod response;

pub use error::{Error as ResponseError, ErrorBuilder as ResponseErrorBuilder, ErrorKind as ResponseErrorKind};
pub use http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    method::Method,
    status::StatusCode,
    uri::{self, Uri},
    Extensions, Version,
};
pub use request::{Request, RequestBody, RequestBuilder};
pub use response::{Response, ResponseBody, ResponseBuilder, Result as ResponseResult};

use header::CONTENT_TYPE;
use mime::APPLICATION_WWW_FORM_URLENCODED;
use std::fmt::Debug;

/// HTTP 请求处理接口
///
/// 实现该接口，即可处理所有请求分发层发送的 HTTP 请求。
/// 接口实现必须可以在多个线程间共享，同一个实例会被多个并发请求同时使用。
pub trait HttpCaller: Debug + Send + Sync {
    /// 阻塞发送 HTTP 请求
    ///
    /// 请求的所有权交给接口实现，请求体中的数据源会在请求被丢弃时释放。
    fn call(&self, request: Request) -> ResponseResult;

    /// 发送 GET 请求
    fn get(&self, url: &str) -> ResponseResult {
        self.call(make_simple_request(Method::GET, url)?.build())
    }

    /// 发送 HEAD 请求
    fn head(&self, url: &str) -> ResponseResult {
        self.call(make_simple_request(Method::HEAD, url)?.build())
    }

    /// 发送 POST 请求
    fn post(&self, url: &str, content_type: &str, body: RequestBody) -> ResponseResult {
        let content_type = HeaderValue::from_str(content_type).map_err(|err| {
            ResponseError::builder_with_msg(
                ResponseErrorKind::InvalidHeader,
                format!("invalid header value({:?}): {}", content_type, err),
            )
            .build()
        })?;
        self.call(
            make_simple_request(Method::POST, url)?
                .header(CONTENT_TYPE, content_type)
                .body(body)
                .build(),
        )
    }

    /// 发送表单 POST 请求
    fn post_form(&self, url: &str, pairs: &[(&str, &str)]) -> ResponseResult {
        let form = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.post(url, APPLICATION_WWW_FORM_URLENCODED.as_ref(), RequestBody::from(form))
    }

    /// 关闭空闲连接
    ///
    /// 默认实现不做任何事
    #[inline]
    fn close_idle_connections(&self) {}
}

fn make_simple_request(method: Method, url: &str) -> Result<RequestBuilder, ResponseError> {
    let url = url
        .parse::<Uri>()
        .map_err(|err| ResponseError::builder(ResponseErrorKind::InvalidUrl, err).build())?;
    let mut builder = Request::builder();
    builder.method(method).url(url);
    Ok(builder)
}
