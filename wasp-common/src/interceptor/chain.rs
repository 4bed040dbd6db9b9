use std::sync::Arc;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use crate::error::{Error, Result};
use crate::interceptor::{AuthToken, Flow, RequestInterceptor};
use crate::request::RequestDescriptor;
use crate::response::RawResponse;

/// 拦截器链
///
/// 前置钩子按注册顺序执行，后置钩子逆序执行；空链为恒等变换。
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// 方法级拦截器排在全局链之后
    pub fn with_method_interceptors(&self, method: &[Arc<dyn RequestInterceptor>]) -> Self {
        if method.is_empty() {
            return self.clone();
        }
        let mut interceptors = self.interceptors.clone();
        interceptors.extend(method.iter().cloned());
        Self { interceptors }
    }

    pub async fn before_request(&self, mut request: RequestDescriptor) -> Result<Flow> {
        for interceptor in &self.interceptors {
            match interceptor
                .before_request(request)
                .await
                .map_err(Error::Interceptor)?
            {
                Flow::Proceed(next) => request = next,
                Flow::Respond(response) => {
                    log::debug!("interceptor short-circuited the request");
                    return Ok(Flow::Respond(response));
                }
            }
        }
        Ok(Flow::Proceed(request))
    }

    pub async fn after_response(&self, mut response: RawResponse) -> Result<RawResponse> {
        for interceptor in self.interceptors.iter().rev() {
            response = interceptor
                .after_response(response)
                .await
                .map_err(Error::Interceptor)?;
        }
        Ok(response)
    }

    /// 第一个提供令牌的拦截器生效
    pub fn auth_token(&self) -> Option<AuthToken> {
        self.interceptors.iter().find_map(|i| i.auth_token())
    }
}

/// 为每个请求注入固定头部
#[derive(Debug, Clone, Default)]
pub struct HeaderInterceptor {
    headers: HeaderMap,
}

impl HeaderInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::configuration(format!("invalid header name `{name}`: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::configuration(format!("invalid value for header `{name}`: {e}")))?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }
}

#[async_trait]
impl RequestInterceptor for HeaderInterceptor {
    async fn before_request(&self, mut request: RequestDescriptor) -> anyhow::Result<Flow> {
        for (name, value) in &self.headers {
            if !request.headers.contains_key(name) {
                request.headers.insert(name.clone(), value.clone());
            }
        }
        Ok(Flow::Proceed(request))
    }
}
