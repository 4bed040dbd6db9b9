use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 客户端统一错误类型
///
/// 配置与契约错误在创建阶段立即返回；传输、解析、服务错误按调用返回，
/// 与成功结果走同一通道。
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to serialize request body as {content_type}")]
    Serialization {
        content_type: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("interceptor failed: {0:#}")]
    Interceptor(anyhow::Error),

    #[error("call was cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// 响应状态码（传输失败时为 None）
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Parse(err) => Some(err.status),
            Error::Service(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// 服务契约错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("service contract has no name")]
    MissingName,

    #[error("service `{service}` declares no methods")]
    NoMethods { service: String },

    #[error("method `{method}` is not part of service `{service}`")]
    UnsupportedMethod { service: String, method: String },

    #[error("placeholder `{{{name}}}` in `{path}` has no matching path argument")]
    UnresolvedPathParameter { name: String, path: String },

    #[error("path argument `{name}` does not match any placeholder in `{path}`")]
    UnusedPathParameter { name: String, path: String },

    #[error("method `{method}` has an invalid header `{name}`")]
    InvalidHeader { method: String, name: String },

    #[error("method `{method}` declares both a body and form fields")]
    BodyAndFields { method: String },

    #[error("method `{method}` declares more than one body")]
    MultipleBodies { method: String },

    #[error("method `{method}` resolves to an invalid url: {reason}")]
    InvalidUrl { method: String, reason: String },

    #[error("blocking method `{method}` was called from inside an async runtime")]
    BlockingInAsyncContext { method: String },
}

/// 传输层失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Tls,
    Io,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Io => "io",
        })
    }
}

#[derive(Debug, Error)]
#[error("{kind} error for {url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: Url,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, url: Url, message: impl Into<String>) -> Self {
        Self {
            kind,
            url,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// 响应体无法解析为目标类型
#[derive(Debug, Error)]
#[error("failed to parse {status} response as `{target}`")]
pub struct ParseError {
    pub target: &'static str,
    pub raw_body: Bytes,
    pub status: StatusCode,
    #[source]
    pub source: BoxError,
}

impl ParseError {
    /// 原始响应体的文本形式（诊断用）
    pub fn raw_text(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }
}

/// 服务端返回了非 2xx 状态
#[derive(Debug, Error)]
#[error("service responded {status} for {url}")]
pub struct ServiceError {
    pub status: StatusCode,
    pub url: Url,
    pub headers: HeaderMap,
    pub raw_body: Bytes,
    /// 用默认解析器解析出的错误体，无法解析时为 None
    pub body: Option<Value>,
}

impl ServiceError {
    /// 将错误体转换为调用方声明的错误类型
    pub fn body_as<E: DeserializeOwned>(&self) -> Option<E> {
        self.body
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn url() -> Url {
        Url::parse("https://api.example.com/users/1").unwrap()
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new(TransportErrorKind::Connect, url(), "connection refused");
        assert_eq!(
            err.to_string(),
            "connect error for https://api.example.com/users/1: connection refused"
        );
        assert!(Error::from(err).is_transport());
    }

    #[test]
    fn test_contract_error_display() {
        let err = ContractError::UnresolvedPathParameter {
            name: "id".into(),
            path: "/users/{id}".into(),
        };
        assert_eq!(
            err.to_string(),
            "placeholder `{id}` in `/users/{id}` has no matching path argument"
        );
    }

    #[test]
    fn test_service_error_body_as() {
        #[derive(Deserialize)]
        struct ApiError {
            code: u32,
        }

        let err = ServiceError {
            status: StatusCode::NOT_FOUND,
            url: url(),
            headers: HeaderMap::new(),
            raw_body: Bytes::from_static(b"{\"code\": 44}"),
            body: Some(serde_json::json!({ "code": 44 })),
        };

        assert_eq!(err.body_as::<ApiError>().map(|e| e.code), Some(44));
        assert!(err.body_as::<Vec<u8>>().is_none());
        assert_eq!(Error::from(err).status(), Some(StatusCode::NOT_FOUND));
    }
}
