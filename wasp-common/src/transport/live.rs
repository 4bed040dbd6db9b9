use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use url::Url;
use crate::error::{Error, Result, TransportError, TransportErrorKind};
use crate::request::RequestDescriptor;
use crate::response::RawResponse;
use crate::transport::{CookieHandler, HttpStack, PolicyCookieStore, SslTrust, Transport};
use crate::types::RetryPolicy;

const DEFAULT_USER_AGENT: &str = concat!("wasp/", env!("CARGO_PKG_VERSION"));

/// 基于 reqwest 的默认 HTTP 栈
#[derive(Debug, Default)]
pub struct ReqwestStack {
    trust: Option<SslTrust>,
    cookies: Option<CookieHandler>,
    proxy: Option<reqwest::Proxy>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    retry: Option<RetryPolicy>,
}

impl ReqwestStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有请求经由代理发送
    pub fn proxy(mut self, url: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(url)
            .map_err(|e| Error::configuration(format!("invalid proxy url `{url}`: {e}")))?;
        self.proxy = Some(proxy);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// 未声明 `retry` 的方法使用的默认重试策略
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }
}

impl HttpStack for ReqwestStack {
    fn set_ssl_trust(&mut self, trust: SslTrust) -> Result<()> {
        if self.trust.is_some() {
            return Err(Error::configuration("an SSL trust strategy is already configured"));
        }
        self.trust = Some(trust);
        Ok(())
    }

    fn set_cookie_handler(&mut self, handler: CookieHandler) {
        self.cookies = Some(handler);
    }

    fn into_transport(self: Box<Self>) -> Result<Arc<dyn Transport>> {
        let stack = *self;
        let mut builder = reqwest::Client::builder()
            .user_agent(stack.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        match stack.trust {
            Some(SslTrust::TrustAll) => {
                log::warn!("TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
            Some(SslTrust::Pinned(keystore)) => {
                builder = builder.tls_built_in_root_certs(false);
                for certificate in keystore.certificates()? {
                    builder = builder.add_root_certificate(certificate);
                }
            }
            None => {}
        }

        if let Some(handler) = stack.cookies {
            builder = builder.cookie_provider(Arc::new(PolicyCookieStore::new(handler)));
        }
        if let Some(proxy) = stack.proxy {
            builder = builder.proxy(proxy);
        }
        if let Some(timeout) = stack.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = stack.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Arc::new(ReqwestTransport {
            client,
            retry: stack.retry,
        }))
    }
}

/// 实时传输层，负责重试
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry: Option<RetryPolicy>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, retry: None }
    }

    async fn send_once(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.verb.to_reqwest(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_error(e, &request.url))?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(e, &request.url))?;

        Ok(RawResponse {
            status,
            headers,
            url,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError> {
        let policy = request
            .retry
            .as_ref()
            .or(self.retry.as_ref())
            .filter(|policy| policy.allows(&request.verb));
        let max_attempts = policy.map_or(1, |policy| policy.max_attempts.max(1));

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.send_once(&request).await {
                Ok(response) => {
                    let retryable = policy.is_some_and(|p| p.should_retry_status(response.status.as_u16()));
                    if let Some(policy) = policy.filter(|_| retryable && attempt < max_attempts) {
                        log::warn!(
                            "Request failed with status {}, retrying attempt {}/{}",
                            response.status,
                            attempt + 1,
                            max_attempts
                        );
                        tokio::time::sleep(policy.calculate_delay(attempt)).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    let retryable = err.kind != TransportErrorKind::Tls;
                    if let Some(policy) = policy.filter(|_| retryable && attempt < max_attempts) {
                        log::warn!(
                            "Network error on attempt {}/{}, retrying: {}",
                            attempt,
                            max_attempts,
                            err
                        );
                        tokio::time::sleep(policy.calculate_delay(attempt)).await;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

fn map_error(err: reqwest::Error, url: &Url) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if is_tls_failure(&err) {
        TransportErrorKind::Tls
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Io
    };
    TransportError::new(kind, url.clone(), err.to_string()).with_source(err)
}

/// reqwest 不单独暴露 TLS 错误，只能沿错误链查找
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let message = cause.to_string().to_ascii_lowercase();
        if ["certificate", "tls", "ssl", "handshake"]
            .iter()
            .any(|needle| message.contains(needle))
        {
            return true;
        }
        source = cause.source();
    }
    false
}
