pub mod call;
pub mod delivery;
mod logging;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use url::Url;
use crate::config::ClientConfig;
use crate::decode::Decoder;
use crate::error::{ContractError, Error, Result, ServiceError};
use crate::interceptor::Flow;
use crate::request::{Arguments, ExpectedTypes, RequestDescriptor, RequestTemplate, build_descriptor};
use crate::response::{RawResponse, Response};

pub use call::{Call, CallHandle, Callback};
pub use delivery::{CallbackExecutor, DeliveryThread, Job};

/// 由 `#[service]` 为生成的客户端实现
pub trait ServiceContract: Sized + 'static {
    const NAME: &'static str;

    /// 服务级地址，覆盖客户端配置的地址
    const ENDPOINT: Option<&'static str> = None;

    fn methods() -> &'static [&'static str];

    fn template(method: &str) -> Option<RequestTemplate>;

    fn from_dispatcher(dispatcher: Dispatcher) -> Self;
}

/// 运行时构造的服务定义，不经过宏
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    name: String,
    endpoint: Option<String>,
    templates: Vec<RequestTemplate>,
}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            templates: Vec::new(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn method(mut self, template: RequestTemplate) -> Self {
        self.templates.push(template);
        self
    }
}

type DeriveFn = Arc<dyn Fn(&str) -> Option<RequestTemplate> + Send + Sync>;

/// 绑定到单个服务契约的调度器
///
/// 克隆共享同一份模板缓存；可被多个调用方并发使用。
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    service: String,
    endpoint: Url,
    methods: Vec<String>,
    derive: DeriveFn,
    templates: RwLock<HashMap<String, Arc<RequestTemplate>>>,
    config: Arc<ClientConfig>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("service", &self.inner.service)
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("methods", &self.inner.methods)
            .finish()
    }
}

impl Dispatcher {
    pub(crate) fn for_contract<S: ServiceContract>(config: Arc<ClientConfig>) -> Result<Self> {
        let methods = S::methods().iter().map(|m| m.to_string()).collect();
        let endpoint = S::ENDPOINT.map(str::to_string);
        Self::new(config, S::NAME.to_string(), endpoint, methods, Arc::new(S::template))
    }

    pub(crate) fn for_definition(config: Arc<ClientConfig>, definition: ServiceDefinition) -> Result<Self> {
        for template in &definition.templates {
            template.validate()?;
        }

        let methods = definition.templates.iter().map(|t| t.name.clone()).collect();
        let table: HashMap<String, RequestTemplate> = definition
            .templates
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        let derive: DeriveFn = Arc::new(move |method: &str| table.get(method).cloned());

        Self::new(config, definition.name, definition.endpoint, methods, derive)
    }

    fn new(
        config: Arc<ClientConfig>,
        service: String,
        endpoint: Option<String>,
        methods: Vec<String>,
        derive: DeriveFn,
    ) -> Result<Self> {
        if service.trim().is_empty() {
            return Err(ContractError::MissingName.into());
        }
        if methods.is_empty() {
            return Err(ContractError::NoMethods { service }.into());
        }

        let endpoint = match endpoint {
            Some(endpoint) => crate::config::parse_endpoint(&endpoint)?,
            None => config.endpoint.clone(),
        };

        log::debug!("created dispatcher for `{}` at {}", service, endpoint);
        Ok(Self {
            inner: Arc::new(DispatcherInner {
                service,
                endpoint,
                methods,
                derive,
                templates: RwLock::new(HashMap::new()),
                config,
            }),
        })
    }

    pub fn service(&self) -> &str {
        &self.inner.service
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.inner.methods.iter().map(String::as_str)
    }

    /// 取方法模板，首次使用时派生并缓存
    pub fn template(&self, method: &str) -> Result<Arc<RequestTemplate>> {
        if let Some(template) = self
            .inner
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
        {
            return Ok(template.clone());
        }

        let unsupported = || ContractError::UnsupportedMethod {
            service: self.inner.service.clone(),
            method: method.to_string(),
        };
        if !self.inner.methods.iter().any(|m| m == method) {
            return Err(unsupported().into());
        }
        let template = (self.inner.derive)(method).ok_or_else(unsupported)?;
        template.validate()?;
        log::debug!("derived template for `{}::{}`", self.inner.service, method);

        // 并发的首次派生结果相同，保留先写入的一份
        let mut templates = self
            .inner
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let template = templates
            .entry(method.to_string())
            .or_insert_with(|| Arc::new(template));
        Ok(template.clone())
    }

    /// 异步调用，返回在客户端运行时上执行的 [`Call`]
    pub fn call<T: Send + 'static>(&self, method: &str, arguments: Arguments, decoder: Decoder<T>) -> Call<T> {
        let dispatcher = self.clone();
        let method = method.to_string();
        let task = self
            .inner
            .config
            .runtime
            .handle()
            .spawn(async move { dispatcher.dispatch(&method, arguments, decoder).await });
        Call::new(task)
    }

    /// 同步调用，阻塞当前线程直到完成
    ///
    /// 在异步运行时内调用会返回 [`ContractError::BlockingInAsyncContext`]。
    pub fn call_blocking<T>(&self, method: &str, arguments: Arguments, decoder: Decoder<T>) -> Result<Response<T>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ContractError::BlockingInAsyncContext {
                method: method.to_string(),
            }
            .into());
        }
        self.inner
            .config
            .runtime
            .handle()
            .block_on(self.dispatch(method, arguments, decoder))
    }

    /// 回调调用，结果在回调执行器上投递
    pub fn enqueue<T, C>(&self, method: &str, arguments: Arguments, decoder: Decoder<T>, callback: C) -> CallHandle
    where
        T: Send + 'static,
        C: Callback<T>,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let dispatcher = self.clone();
        let executor = self.inner.config.executor.clone();
        let method = method.to_string();

        let task = self.inner.config.runtime.handle().spawn(async move {
            let result = dispatcher.dispatch(&method, arguments, decoder).await;
            if flag.load(Ordering::Acquire) {
                log::debug!("`{}` was cancelled, discarding its result", method);
                return;
            }
            executor.execute(Box::new(move || {
                if flag.load(Ordering::Acquire) {
                    return;
                }
                match result {
                    Ok(response) => callback.on_success(response),
                    Err(err) => callback.on_error(err),
                }
            }));
        });

        CallHandle::new(cancelled, task)
    }

    async fn dispatch<T>(&self, method: &str, arguments: Arguments, decoder: Decoder<T>) -> Result<Response<T>> {
        let config = &self.inner.config;
        let template = self.template(method)?;

        let mut request = build_descriptor(
            &template,
            &self.inner.endpoint,
            arguments,
            config.parser.as_ref(),
            ExpectedTypes::of::<T>(),
        )?;

        let chain = config.interceptors.with_method_interceptors(&template.interceptors);
        if let Some(token) = chain.auth_token() {
            if template.auth || token.filter_all {
                apply_auth(&mut request, &token.token)?;
            }
        }

        let log_rest = config.log_level.logs_rest();
        let started = Instant::now();
        let raw = match chain.before_request(request).await? {
            Flow::Proceed(request) => {
                if log_rest {
                    logging::log_request(&request);
                }
                config.transport.execute(request).await?
            }
            Flow::Respond(response) => response,
        };
        let raw = chain.after_response(raw).await?;
        let network_time = started.elapsed();
        if log_rest {
            logging::log_response(&raw, network_time);
        }

        self.decode(raw, network_time, decoder)
    }

    fn decode<T>(&self, raw: RawResponse, network_time: std::time::Duration, decoder: Decoder<T>) -> Result<Response<T>> {
        let config = &self.inner.config;

        if !raw.is_success() {
            let body = config
                .default_parser
                .deserialize(&raw.body, std::any::type_name::<serde_json::Value>())
                .ok()
                .filter(|value| !value.is_null());
            return Err(ServiceError {
                status: raw.status,
                url: raw.url,
                headers: raw.headers,
                raw_body: raw.body,
                body,
            }
            .into());
        }

        let body = decoder(config.parser.as_ref(), &raw)?;
        Ok(Response {
            status: raw.status,
            length: raw.body.len(),
            headers: raw.headers,
            url: raw.url,
            body,
            network_time,
        })
    }
}

fn apply_auth(request: &mut RequestDescriptor, token: &str) -> Result<()> {
    if request.headers.contains_key(AUTHORIZATION) {
        return Ok(());
    }
    let value = HeaderValue::from_str(token)
        .map_err(|e| Error::Interceptor(anyhow::anyhow!("invalid auth token: {e}")))?;
    request.headers.insert(AUTHORIZATION, value);
    Ok(())
}
