use std::sync::Arc;
use reqwest::cookie::Jar;
use tokio::runtime::{Handle, Runtime};
use url::Url;
use crate::client::Wasp;
use crate::dispatch::{CallbackExecutor, DeliveryThread};
use crate::error::{Error, Result};
use crate::interceptor::{InterceptorChain, RequestInterceptor};
use crate::parser::{JsonParser, Parser};
use crate::transport::{
    CookieHandler, CookiePolicy, HttpStack, KeyStore, MockTransport, ReqwestStack, SslTrust, Transport,
};

/// 日志级别，按客户端实例生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    None,
    FullRestOnly,
    FullImageOnly,
    Full,
}

impl LogLevel {
    pub fn logs_rest(self) -> bool {
        matches!(self, LogLevel::FullRestOnly | LogLevel::Full)
    }

    pub fn logs_images(self) -> bool {
        matches!(self, LogLevel::FullImageOnly | LogLevel::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    #[default]
    Live,
    Mock,
}

/// 构建完成后不可变的客户端配置，由所有调度器共享
pub(crate) struct ClientConfig {
    pub(crate) endpoint: Url,
    pub(crate) parser: Arc<dyn Parser>,
    pub(crate) default_parser: Arc<dyn Parser>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) log_level: LogLevel,
    pub(crate) network_mode: NetworkMode,
    pub(crate) interceptors: InterceptorChain,
    pub(crate) runtime: RuntimeHandle,
    pub(crate) executor: Arc<dyn CallbackExecutor>,
}

/// 执行请求任务的运行时
pub(crate) enum RuntimeHandle {
    Shared(Handle),
    Owned(OwnedRuntime),
}

impl RuntimeHandle {
    pub(crate) fn handle(&self) -> &Handle {
        match self {
            RuntimeHandle::Shared(handle) => handle,
            RuntimeHandle::Owned(owned) => &owned.handle,
        }
    }
}

/// 客户端自带的运行时，释放时不等待未完成的任务
pub(crate) struct OwnedRuntime {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl OwnedRuntime {
    fn start() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("wasp-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::configuration(format!("failed to start worker runtime: {e}")))?;
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// 校验并解析服务地址
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    if endpoint.trim().is_empty() {
        return Err(Error::configuration("endpoint must not be empty or blank"));
    }
    if endpoint.ends_with('/') {
        return Err(Error::configuration(format!(
            "endpoint `{endpoint}` must not end with '/'"
        )));
    }

    let url = Url::parse(endpoint)
        .map_err(|e| Error::configuration(format!("invalid endpoint `{endpoint}`: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::configuration(format!(
            "endpoint `{endpoint}` is not a base URL"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::configuration(format!(
            "endpoint `{endpoint}` must not carry a query or fragment"
        )));
    }
    Ok(url)
}

/// 客户端构建器
///
/// 带校验的设置方法返回 `Result<Self>`，在调用处立即报告错误。
#[derive(Default)]
pub struct WaspBuilder {
    endpoint: Option<Url>,
    parser: Option<Arc<dyn Parser>>,
    default_parser: Option<Arc<dyn Parser>>,
    log_level: LogLevel,
    network_mode: NetworkMode,
    http_stack: Option<Box<dyn HttpStack>>,
    transport: Option<Arc<dyn Transport>>,
    mock_transport: Option<MockTransport>,
    ssl_trust: Option<SslTrust>,
    cookie_handler: Option<CookieHandler>,
    interceptors: InterceptorChain,
    runtime: Option<Handle>,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

impl WaspBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = Some(parse_endpoint(endpoint)?);
        Ok(self)
    }

    pub fn set_parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// 用于错误响应体以及未单独设置解析器时
    pub fn set_default_parser(mut self, parser: impl Parser + 'static) -> Self {
        self.default_parser = Some(Arc::new(parser));
        self
    }

    pub fn set_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn set_network_mode(mut self, network_mode: NetworkMode) -> Self {
        self.network_mode = network_mode;
        self
    }

    pub fn set_http_stack(mut self, stack: impl HttpStack + 'static) -> Self {
        self.http_stack = Some(Box::new(stack));
        self
    }

    /// 原样使用调用方的传输层，不能再配置证书或 Cookie 策略
    pub fn set_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn set_mock_transport(mut self, mock: MockTransport) -> Self {
        self.mock_transport = Some(mock);
        self
    }

    pub fn trust_certificates(self) -> Result<Self> {
        self.with_trust(SslTrust::TrustAll)
    }

    pub fn trust_certificates_with(self, keystore: KeyStore) -> Result<Self> {
        self.with_trust(SslTrust::Pinned(keystore))
    }

    fn with_trust(mut self, trust: SslTrust) -> Result<Self> {
        if self.ssl_trust.is_some() {
            return Err(Error::configuration("an SSL trust strategy is already configured"));
        }
        self.ssl_trust = Some(trust);
        Ok(self)
    }

    pub fn enable_cookies(mut self, policy: CookiePolicy) -> Self {
        self.cookie_handler = Some(CookieHandler::new(policy));
        self
    }

    pub fn enable_cookies_with_store(mut self, jar: Arc<Jar>, policy: CookiePolicy) -> Self {
        self.cookie_handler = Some(CookieHandler::with_jar(jar, policy));
        self
    }

    /// 用单个拦截器替换整条链
    pub fn set_request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors = InterceptorChain::new();
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn add_request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn set_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn set_callback_executor(mut self, executor: impl CallbackExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    pub fn build(self) -> Result<Wasp> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::configuration("endpoint is required"))?;

        if self.transport.is_some() && (self.ssl_trust.is_some() || self.cookie_handler.is_some()) {
            return Err(Error::configuration(
                "SSL trust and cookie policy cannot be applied to a caller-provided transport, use set_http_stack instead",
            ));
        }

        let default_parser = self
            .default_parser
            .unwrap_or_else(|| Arc::new(JsonParser));
        let parser = self.parser.unwrap_or_else(|| default_parser.clone());

        let transport: Arc<dyn Transport> = match (self.network_mode, self.transport) {
            (NetworkMode::Mock, _) => {
                log::debug!("network mode is MOCK, requests never leave the process");
                Arc::new(self.mock_transport.unwrap_or_default())
            }
            (NetworkMode::Live, Some(transport)) => transport,
            (NetworkMode::Live, None) => {
                let mut stack = self
                    .http_stack
                    .unwrap_or_else(|| Box::new(ReqwestStack::new()));
                if let Some(trust) = self.ssl_trust {
                    stack.set_ssl_trust(trust)?;
                }
                if let Some(handler) = self.cookie_handler {
                    stack.set_cookie_handler(handler);
                }
                stack.into_transport()?
            }
        };

        let runtime = match self.runtime.or_else(|| Handle::try_current().ok()) {
            Some(handle) => RuntimeHandle::Shared(handle),
            None => RuntimeHandle::Owned(OwnedRuntime::start()?),
        };

        let executor: Arc<dyn CallbackExecutor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(DeliveryThread::spawn()?),
        };

        Ok(Wasp::from_config(ClientConfig {
            endpoint,
            parser,
            default_parser,
            transport,
            log_level: self.log_level,
            network_mode: self.network_mode,
            interceptors: self.interceptors,
            runtime,
            executor,
        }))
    }
}
