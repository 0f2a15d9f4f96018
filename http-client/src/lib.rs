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

//! # reqkit-http-client
//!
//! ## 声明式 HTTP 请求构建与发送
//!
//! 通过 [`Client`] 创建 [`Request`]，链式设置请求方法，路径，查询参数，表单参数，自动参数，
//! HTTP 头，Cookie，Basic 认证，上传文件和响应体解析器，最后调用 [`Request::call`] 阻塞发送。
//!
//! 上传文件时请求体是流式的 Multipart 表单，文件数据不会被预先读入内存。
//! 请求发送前可以经过 [`Pacer`] 限速，以及 [`ClientBuilder::last_chance`] 设置的最后检查。
//!
//! 默认启用 `ureq` 功能，使用 `reqkit-ureq` 作为 HTTP 传输；
//! 禁用后需要在创建 [`Client`] 时传入 [`http::HttpCaller`] 的实现。

mod client;

pub use client::{
    from_json, from_xml, ArgValue, ChainedReader, Client, ClientBuilder, Error, FileAttachment, IntoArgValue,
    JsonUnmarshaller, LastChance, MultipartBody, MultipartClosed, Pacer, Params, Rendered, Request, ResponseUnmarshaller,
    Result, Ticker, UnsupportedArgument, XmlUnmarshaller,
};

pub use client::mock;
pub use cookie;
pub use reqkit_http as http;

#[cfg(feature = "ureq")]
pub use reqkit_ureq as ureq;
