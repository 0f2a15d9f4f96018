use super::{
    super::{
        call::{execute, unmarshal_response, Dispatch},
        mock::InterceptedRequest,
        unmarshal::{JsonUnmarshaller, ResponseUnmarshaller, XmlUnmarshaller},
        Client, Error, Result,
    },
    arg::{resolve_with_default, IntoArgValue, UnsupportedArgument},
    multipart::{self, FileAttachment, MultipartBody},
    params::Params,
};
use cookie::Cookie;
use indexmap::IndexMap;
use log::{info, warn};
use mime::APPLICATION_WWW_FORM_URLENCODED;
use reqkit_http::{Method, RequestBody, Response};
use serde::de::DeserializeOwned;
use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Read},
    mem::take,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Query,
    Form,
    Auto,
}

/// 构建请求时记录下来的错误，每次发送都会返回它的副本
#[derive(Debug, Clone)]
enum DeferredError {
    UnsupportedArgument(UnsupportedArgument),
    Body { kind: IoErrorKind, message: String },
}

impl DeferredError {
    fn to_error(&self) -> Error {
        match self {
            Self::UnsupportedArgument(err) => err.to_owned().into(),
            Self::Body { kind, message } => Error::Body(IoError::new(*kind, message.to_owned())),
        }
    }
}

impl From<&IoError> for DeferredError {
    #[inline]
    fn from(err: &IoError) -> Self {
        Self::Body {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug)]
struct CachedBody {
    bytes: Vec<u8>,
    content_type: String,
}

/// HTTP 请求
///
/// 由 [`Client`] 创建，通过链式调用设置请求参数，最后调用 [`Request::call`] 发送。
///
/// 请求参数分为三组：查询参数总是出现在 URL 中，表单参数总是出现在请求体中，
/// 自动参数则在 GET 请求时出现在 URL 中，其他请求时出现在请求体中。
///
/// 参数值无法转换时，错误会被记录下来，并在 [`Request::call`] 时返回，请求不会被发送。
pub struct Request<'r> {
    client: &'r Client,
    path: String,
    method: Method,
    query_params: Params,
    form_params: Params,
    auto_params: Params,
    files: IndexMap<String, Vec<FileAttachment>>,
    headers: IndexMap<String, String>,
    basic_auth: Option<(String, String)>,
    cookies: Vec<Cookie<'static>>,
    force_multipart: bool,
    unmarshallers: Vec<Box<dyn ResponseUnmarshaller + Send + 'r>>,
    cached_body: Option<CachedBody>,
    deferred_error: Option<DeferredError>,
    dispatched: bool,
}

impl<'r> Request<'r> {
    pub(in super::super) fn new(client: &'r Client, path: String) -> Self {
        Self {
            client,
            path,
            method: Method::GET,
            query_params: Default::default(),
            form_params: Default::default(),
            auto_params: Default::default(),
            files: Default::default(),
            headers: Default::default(),
            basic_auth: None,
            cookies: Default::default(),
            force_multipart: false,
            unmarshallers: Default::default(),
            cached_body: None,
            deferred_error: None,
            dispatched: false,
        }
    }

    /// 设置 HTTP 方法
    #[inline]
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// 设置请求路径，路径会被追加在根 URL 之后
    #[inline]
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = path.into();
        self
    }

    /// 设置 HTTP 头，名称不区分大小写，同名的 HTTP 头将被覆盖
    #[inline]
    pub fn header(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.as_ref().to_lowercase(), value.into());
        self
    }

    /// 追加 Cookie
    #[inline]
    pub fn cookie(&mut self, cookie: impl Into<Cookie<'static>>) -> &mut Self {
        self.cookies.push(cookie.into());
        self
    }

    /// 设置 HTTP Basic 认证
    ///
    /// 用户名和密码都为空时不会发送认证信息
    #[inline]
    pub fn basic_authentication(&mut self, user: impl Into<String>, password: impl Into<String>) -> &mut Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    /// 强制使用 Multipart 表单作为请求体
    #[inline]
    pub fn multipart(&mut self) -> &mut Self {
        self.force_multipart = true;
        self
    }

    /// 添加自动参数，空值将被忽略
    #[inline]
    pub fn arg(&mut self, key: impl Into<String>, value: impl IntoArgValue) -> &mut Self {
        self.add_arg(Bucket::Auto, key.into(), value)
    }

    /// 添加查询参数，空值将被忽略
    #[inline]
    pub fn url_arg(&mut self, key: impl Into<String>, value: impl IntoArgValue) -> &mut Self {
        self.add_arg(Bucket::Query, key.into(), value)
    }

    /// 添加表单参数，空值将被忽略
    #[inline]
    pub fn form_arg(&mut self, key: impl Into<String>, value: impl IntoArgValue) -> &mut Self {
        self.add_arg(Bucket::Form, key.into(), value)
    }

    /// 添加自动参数，空值或与默认值相同的值将被忽略
    ///
    /// 转换为字符串后相同也视为相同，例如 `3` 与 `"3"`
    #[inline]
    pub fn arg_default(
        &mut self,
        key: impl Into<String>,
        value: impl IntoArgValue,
        default: impl IntoArgValue,
    ) -> &mut Self {
        self.add_arg_with_default(Bucket::Auto, key.into(), value, default)
    }

    /// 添加查询参数，空值或与默认值相同的值将被忽略
    #[inline]
    pub fn url_arg_default(
        &mut self,
        key: impl Into<String>,
        value: impl IntoArgValue,
        default: impl IntoArgValue,
    ) -> &mut Self {
        self.add_arg_with_default(Bucket::Query, key.into(), value, default)
    }

    /// 添加表单参数，空值或与默认值相同的值将被忽略
    #[inline]
    pub fn form_arg_default(
        &mut self,
        key: impl Into<String>,
        value: impl IntoArgValue,
        default: impl IntoArgValue,
    ) -> &mut Self {
        self.add_arg_with_default(Bucket::Form, key.into(), value, default)
    }

    /// 添加上传的文件，有文件时请求体总是 Multipart 表单
    ///
    /// 文件数据只会被读取一次
    #[inline]
    pub fn file_arg(
        &mut self,
        key: impl Into<String>,
        file_name: impl Into<String>,
        source: impl Read + Send + 'static,
    ) -> &mut Self {
        self.files
            .entry(key.into())
            .or_default()
            .push(FileAttachment::new(file_name, source));
        self
    }

    /// 注册响应体解析器，所有解析器都会依次解析同一份响应体
    #[inline]
    pub fn unmarshal_with(&mut self, unmarshaller: impl ResponseUnmarshaller + Send + 'r) -> &mut Self {
        self.unmarshallers.push(Box::new(unmarshaller));
        self
    }

    /// 将 JSON 响应体解析到 `output`
    #[inline]
    pub fn json_into<T: DeserializeOwned + Send>(&mut self, output: &'r mut T) -> &mut Self {
        self.unmarshal_with(JsonUnmarshaller::new(output))
    }

    /// 将 XML 响应体解析到 `output`
    #[inline]
    pub fn xml_into<T: DeserializeOwned + Send>(&mut self, output: &'r mut T) -> &mut Self {
        self.unmarshal_with(XmlUnmarshaller::new(output))
    }

    /// 将请求体读入内存并打印请求信息
    ///
    /// 调用后请求体被固定下来，之后获取的请求体都是这份内存副本，
    /// 因此调用后不应再修改请求参数
    pub fn debug_print(&mut self) -> &mut Self {
        match self.materialize() {
            Ok(()) => {
                let body = self
                    .cached_body
                    .as_ref()
                    .map(|cached| String::from_utf8_lossy(&cached.bytes).into_owned())
                    .unwrap_or_default();
                info!(
                    "Request URL: {}\nUser agent: {}\nOther request headers: {:?}\nRequest body:\n{}\n",
                    self.url().unwrap_or_else(|err| format!("<{}>", err)),
                    self.client.agent_name(),
                    self.headers,
                    body,
                );
            }
            Err(err) => warn!("failed to materialize request body of {}: {}", self.target(), err),
        }
        self
    }

    /// 将请求体读入内存并缓存
    ///
    /// 读取失败时错误会被记录下来，之后获取请求体或发送请求都会返回该错误
    fn materialize(&mut self) -> Result<()> {
        let mut bytes = Vec::new();
        let mut content_type = String::new();
        if let Some((mut body, body_type)) = self.build_body()? {
            if let Err(err) = body.read_to_end(&mut bytes) {
                self.defer_error(DeferredError::from(&err));
                return Err(err.into());
            }
            content_type = body_type;
        }
        self.cached_body = Some(CachedBody { bytes, content_type });
        Ok(())
    }

    /// 获取请求目标，即根 URL 与请求路径的拼接
    #[inline]
    pub fn target(&self) -> String {
        format!("{}{}", self.client.root(), self.path)
    }

    /// 获取请求路径
    #[inline]
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// 获取 HTTP 方法
    #[inline]
    pub fn verb(&self) -> &Method {
        &self.method
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

    /// 获取 HTTP 客户端
    #[inline]
    pub fn client(&self) -> &'r Client {
        self.client
    }

    /// 获取完整的请求 URL
    ///
    /// GET 请求的自动参数追加在查询参数之后
    pub fn url(&self) -> Result<String> {
        self.check_arguments()?;
        let mut query = self.query_params.encode();
        if self.method == Method::GET {
            self.auto_params.encode_after(&mut query);
        }
        let mut url = self.target();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// 获取请求体及其 Content-Type
    ///
    /// 调用过 [`Request::debug_print`] 后返回缓存的请求体，缓存为空时返回 [`None`]。
    /// 否则在强制使用 Multipart 或有上传文件时返回 Multipart 表单，
    /// 其余情况返回 `application/x-www-form-urlencoded` 表单。
    /// 非 GET 请求的自动参数追加在表单参数之后。
    ///
    /// 文件数据只能读取一次，因此有上传文件时请求体会先被读入内存并固定下来，
    /// 与 [`Request::debug_print`] 相同，之后发送的正是这份请求体。
    pub fn body(&mut self) -> Result<Option<(RequestBody, String)>> {
        if self.cached_body.is_none() && !self.files.is_empty() {
            self.materialize()?;
        }
        self.build_body()
    }

    fn build_body(&mut self) -> Result<Option<(RequestBody, String)>> {
        self.check_deferred_error()?;
        if let Some(cached) = &self.cached_body {
            if cached.bytes.is_empty() {
                return Ok(None);
            }
            return Ok(Some((
                RequestBody::from_bytes(cached.bytes.to_owned()),
                cached.content_type.to_owned(),
            )));
        }

        let auto_params = if self.method == Method::GET {
            None
        } else {
            Some(&self.auto_params)
        };
        if self.force_multipart || !self.files.is_empty() {
            let params = self
                .form_params
                .iter()
                .chain(auto_params.into_iter().flat_map(|params| params.iter()));
            self.force_multipart = true;
            let files = take(&mut self.files)
                .into_iter()
                .flat_map(|(key, files)| files.into_iter().map(move |file| (key.to_owned(), file)));
            let (reader, content_type) = multipart::build(params, files, MultipartBody::new());
            Ok(Some((RequestBody::from_reader(reader), content_type)))
        } else {
            let mut form = self.form_params.encode();
            if let Some(auto_params) = auto_params {
                auto_params.encode_after(&mut form);
            }
            Ok(Some((
                RequestBody::from(form),
                APPLICATION_WWW_FORM_URLENCODED.to_string(),
            )))
        }
    }

    /// 发送请求
    ///
    /// 依次执行：检查参数错误，设置 User-Agent，执行发送前的最后检查，等待请求限速器，发送请求，解析响应体。
    /// 每个请求只能发送一次。
    ///
    /// 有响应体解析器解析失败时，返回最后一个解析错误，错误中依然包含 HTTP 响应。
    ///
    /// 参数错误和请求体读取错误不会因为被返回过而消失，再次发送依然返回同样的错误。
    pub fn call(&mut self) -> Result<Response> {
        if self.dispatched {
            return Err(Error::AlreadyDispatched);
        }
        self.check_deferred_error()?;

        let client = self.client;
        if !client.agent_name().is_empty() {
            self.header("user-agent", client.agent_name());
        }
        if let Some(last_chance) = client.last_chance() {
            last_chance(self).map_err(Error::Vetoed)?;
        }
        self.check_deferred_error()?;
        self.dispatched = true;

        if let Some(analyzer) = client.request_analyzer() {
            let response = analyzer.analyze(self.intercept()?)?;
            return unmarshal_response(response, None, &mut self.unmarshallers);
        }

        if let Some(pacer) = client.pacer() {
            pacer.wait();
        }

        let url = self.url()?;
        let body = if self.method == Method::GET {
            None
        } else {
            self.build_body()?
        };
        let dispatch = Dispatch {
            method: self.method.to_owned(),
            url,
            headers: &self.headers,
            body,
            basic_auth: self.basic_auth.as_ref(),
            cookies: &self.cookies,
        };
        execute(client.http_caller(), dispatch, &mut self.unmarshallers)
    }

    fn add_arg(&mut self, bucket: Bucket, key: String, value: impl IntoArgValue) -> &mut Self {
        match value.into_arg_value() {
            Ok(value) => {
                if let Some(value) = value.stringify() {
                    self.bucket_mut(bucket).add(key, value);
                }
            }
            Err(err) => self.defer_error(DeferredError::UnsupportedArgument(err)),
        }
        self
    }

    fn add_arg_with_default(
        &mut self,
        bucket: Bucket,
        key: String,
        value: impl IntoArgValue,
        default: impl IntoArgValue,
    ) -> &mut Self {
        match (value.into_arg_value(), default.into_arg_value()) {
            (Ok(value), Ok(default)) => {
                if let Some(value) = resolve_with_default(&value, &default) {
                    self.bucket_mut(bucket).add(key, value);
                }
            }
            (Err(err), _) | (_, Err(err)) => self.defer_error(DeferredError::UnsupportedArgument(err)),
        }
        self
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Params {
        match bucket {
            Bucket::Query => &mut self.query_params,
            Bucket::Form => &mut self.form_params,
            Bucket::Auto => &mut self.auto_params,
        }
    }

    fn intercept(&self) -> Result<InterceptedRequest> {
        Ok(InterceptedRequest {
            method: self.method.to_owned(),
            url: self.url()?,
            path: self.path.to_owned(),
            headers: self.headers.to_owned(),
            cookies: self.cookies.to_owned(),
            basic_auth: self.basic_auth.to_owned(),
            query_params: self.query_params.to_owned(),
            form_params: self.form_params.to_owned(),
            auto_params: self.auto_params.to_owned(),
            files: self
                .files
                .iter()
                .flat_map(|(key, files)| files.iter().map(move |file| (key.to_owned(), file.file_name().to_owned())))
                .collect(),
            multipart: self.force_multipart,
        })
    }

    fn defer_error(&mut self, err: DeferredError) {
        if self.deferred_error.is_none() {
            self.deferred_error = Some(err);
        }
    }

    fn check_deferred_error(&self) -> Result<()> {
        match &self.deferred_error {
            Some(err) => Err(err.to_error()),
            None => Ok(()),
        }
    }

    fn check_arguments(&self) -> Result<()> {
        match &self.deferred_error {
            Some(DeferredError::UnsupportedArgument(err)) => Err(err.to_owned().into()),
            _ => Ok(()),
        }
    }
}

impl Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("query_params", &self.query_params)
            .field("form_params", &self.form_params)
            .field("auto_params", &self.auto_params)
            .field("files", &self.files)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("force_multipart", &self.force_multipart)
            .field("unmarshallers", &self.unmarshallers.len())
            .field("cached_body", &self.cached_body)
            .field("deferred_error", &self.deferred_error)
            .field("dispatched", &self.dispatched)
            .finish()
    }
}
