use super::{mock::RequestAnalyzer, pacer::Ticker, Pacer, Request};
use anyhow::Result as AnyResult;
use reqkit_http::{HttpCaller, Method};
use std::{
    fmt::{self, Debug},
    sync::Arc,
    time::Duration,
};

/// 发送前的最后检查
///
/// 在请求发送前被调用，可以修改请求；返回错误将取消本次请求
pub type LastChance = Arc<dyn Fn(&mut Request<'_>) -> AnyResult<()> + Send + Sync>;

/// HTTP 客户端
///
/// 所有请求共享根 URL，请求限速器，HTTP 传输和发送前的最后检查。
/// 克隆开销很小，克隆后的实例共享相同的内部状态。
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    root: String,
    agent_name: String,
    pacer: Option<Arc<dyn Pacer>>,
    http_caller: Arc<dyn HttpCaller>,
    last_chance: Option<LastChance>,
    request_analyzer: Option<Arc<dyn RequestAnalyzer>>,
}

impl Client {
    /// 创建 HTTP 客户端，使用默认的 HTTP 传输
    #[inline]
    #[cfg(feature = "ureq")]
    pub fn new(root: impl Into<String>) -> Self {
        Self::builder(root).build()
    }

    /// 创建 HTTP 客户端构建器，使用默认的 HTTP 传输
    #[inline]
    #[cfg(feature = "ureq")]
    pub fn builder(root: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(root, Arc::new(reqkit_ureq::Client::default()))
    }

    /// 创建 HTTP 客户端
    #[inline]
    #[cfg(not(feature = "ureq"))]
    pub fn new(root: impl Into<String>, http_caller: Arc<dyn HttpCaller>) -> Self {
        Self::builder(root, http_caller).build()
    }

    /// 创建 HTTP 客户端构建器
    #[inline]
    #[cfg(not(feature = "ureq"))]
    pub fn builder(root: impl Into<String>, http_caller: Arc<dyn HttpCaller>) -> ClientBuilder {
        ClientBuilder::new(root, http_caller)
    }

    /// 创建 GET 请求，`path` 将被追加在根 URL 之后
    #[inline]
    pub fn new_request(&self, path: impl Into<String>) -> Request<'_> {
        Request::new(self, path.into())
    }

    /// 创建 GET 请求
    #[inline]
    pub fn get(&self, path: impl Into<String>) -> Request<'_> {
        self.request_with_method(Method::GET, path)
    }

    /// 创建 POST 请求
    #[inline]
    pub fn post(&self, path: impl Into<String>) -> Request<'_> {
        self.request_with_method(Method::POST, path)
    }

    /// 创建 PUT 请求
    #[inline]
    pub fn put(&self, path: impl Into<String>) -> Request<'_> {
        self.request_with_method(Method::PUT, path)
    }

    /// 创建 PATCH 请求
    #[inline]
    pub fn patch(&self, path: impl Into<String>) -> Request<'_> {
        self.request_with_method(Method::PATCH, path)
    }

    /// 创建 DELETE 请求
    #[inline]
    pub fn delete(&self, path: impl Into<String>) -> Request<'_> {
        self.request_with_method(Method::DELETE, path)
    }

    /// 创建 HEAD 请求
    #[inline]
    pub fn head(&self, path: impl Into<String>) -> Request<'_> {
        self.request_with_method(Method::HEAD, path)
    }

    fn request_with_method(&self, method: Method, path: impl Into<String>) -> Request<'_> {
        let mut request = self.new_request(path);
        request.method(method);
        request
    }

    /// 获取根 URL
    #[inline]
    pub fn root(&self) -> &str {
        &self.inner.root
    }

    /// 获取客户端名称，非空时作为 User-Agent 发送
    #[inline]
    pub fn agent_name(&self) -> &str {
        &self.inner.agent_name
    }

    /// 获取 HTTP 传输
    #[inline]
    pub fn http_caller(&self) -> &dyn HttpCaller {
        self.inner.http_caller.as_ref()
    }

    /// 获取请求限速器
    #[inline]
    pub fn pacer(&self) -> Option<&dyn Pacer> {
        self.inner.pacer.as_deref()
    }

    #[inline]
    pub(super) fn last_chance(&self) -> Option<&LastChance> {
        self.inner.last_chance.as_ref()
    }

    #[inline]
    pub(super) fn request_analyzer(&self) -> Option<&dyn RequestAnalyzer> {
        self.inner.request_analyzer.as_deref()
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("root", &self.inner.root)
            .field("agent_name", &self.inner.agent_name)
            .field("pacer", &self.inner.pacer)
            .field("http_caller", &self.inner.http_caller)
            .field("last_chance", &self.inner.last_chance.is_some())
            .field("request_analyzer", &self.inner.request_analyzer)
            .finish()
    }
}

/// HTTP 客户端构建器
pub struct ClientBuilder {
    root: String,
    agent_name: String,
    pacer: Option<Arc<dyn Pacer>>,
    http_caller: Arc<dyn HttpCaller>,
    last_chance: Option<LastChance>,
    request_analyzer: Option<Arc<dyn RequestAnalyzer>>,
}

impl ClientBuilder {
    #[inline]
    fn new(root: impl Into<String>, http_caller: Arc<dyn HttpCaller>) -> Self {
        Self {
            root: root.into(),
            agent_name: Default::default(),
            pacer: None,
            http_caller,
            last_chance: None,
            request_analyzer: None,
        }
    }

    /// 设置请求限速器
    #[inline]
    #[must_use]
    pub fn pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Some(Arc::new(pacer));
        self
    }

    /// 设置请求限速器为每隔 `interval` 允许发送一个请求
    #[inline]
    #[must_use]
    pub fn ticker(self, interval: Duration) -> Self {
        self.pacer(Ticker::new(interval))
    }

    /// 设置 HTTP 传输
    #[inline]
    #[must_use]
    pub fn http_caller(mut self, http_caller: Arc<dyn HttpCaller>) -> Self {
        self.http_caller = http_caller;
        self
    }

    /// 设置发送前的最后检查
    #[inline]
    #[must_use]
    pub fn last_chance(
        mut self,
        last_chance: impl Fn(&mut Request<'_>) -> AnyResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.last_chance = Some(Arc::new(last_chance));
        self
    }

    /// 设置请求分析器
    ///
    /// 设置后请求不再被编码和发送，而是直接交给分析器应答，用于测试
    #[inline]
    #[must_use]
    pub fn request_analyzer(mut self, request_analyzer: Arc<dyn RequestAnalyzer>) -> Self {
        self.request_analyzer = Some(request_analyzer);
        self
    }

    /// 设置客户端名称
    #[inline]
    #[must_use]
    pub fn agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = agent_name.into();
        self
    }

    /// 构建 HTTP 客户端
    #[inline]
    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                root: self.root,
                agent_name: self.agent_name,
                pacer: self.pacer,
                http_caller: self.http_caller,
                last_chance: self.last_chance,
                request_analyzer: self.request_analyzer,
            }),
        }
    }
}

impl Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("root", &self.root)
            .field("agent_name", &self.agent_name)
            .field("pacer", &self.pacer)
            .field("http_caller", &self.http_caller)
            .field("last_chance", &self.last_chance.is_some())
            .field("request_analyzer", &self.request_analyzer)
            .finish()
    }
}
