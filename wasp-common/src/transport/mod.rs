pub mod cookie;
pub mod live;
pub mod mock;

use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use crate::error::{Error, Result, TransportError};
use crate::request::RequestDescriptor;
use crate::response::RawResponse;

pub use cookie::{CookieHandler, CookiePolicy, PolicyCookieStore};
pub use mock::{MockResponse, MockTransport};
pub use live::{ReqwestStack, ReqwestTransport};

/// 执行请求描述的传输层
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError>;
}

/// 可配置的实时 HTTP 栈
///
/// 构建客户端时先注入证书与 Cookie 策略，再转换为传输层。
pub trait HttpStack: Send {
    fn set_ssl_trust(&mut self, trust: SslTrust) -> Result<()>;

    fn set_cookie_handler(&mut self, handler: CookieHandler);

    fn into_transport(self: Box<Self>) -> Result<Arc<dyn Transport>>;
}

/// TLS 信任策略，两者互斥
#[derive(Debug, Clone)]
pub enum SslTrust {
    /// 信任任意证书
    TrustAll,
    /// 仅信任给定的证书
    Pinned(KeyStore),
}

/// PEM 格式的受信证书集合
#[derive(Clone)]
pub struct KeyStore {
    pem: Vec<u8>,
    count: usize,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore").field("certificates", &self.count).finish()
    }
}

impl KeyStore {
    /// 解析 PEM 证书包，至少包含一张证书
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> Result<Self> {
        let pem = pem.into();
        let certificates = reqwest::Certificate::from_pem_bundle(&pem)
            .map_err(|e| Error::configuration(format!("invalid PEM certificate bundle: {e}")))?;
        if certificates.is_empty() {
            return Err(Error::configuration("certificate bundle contains no certificates"));
        }
        Ok(Self {
            count: certificates.len(),
            pem,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            Error::configuration(format!("cannot read certificates from {}: {e}", path.display()))
        })?;
        Self::from_pem(pem)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn certificates(&self) -> Result<Vec<reqwest::Certificate>> {
        reqwest::Certificate::from_pem_bundle(&self.pem)
            .map_err(|e| Error::configuration(format!("invalid PEM certificate bundle: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystore_rejects_garbage() {
        assert!(matches!(KeyStore::from_pem("not a certificate"), Err(Error::Configuration(_))));
        assert!(matches!(KeyStore::from_pem(""), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_keystore_missing_file() {
        let err = KeyStore::from_file("/definitely/not/here.pem").unwrap_err();
        assert!(err.to_string().contains("cannot read certificates"));
    }
}
