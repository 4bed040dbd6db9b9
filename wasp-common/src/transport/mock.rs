use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use crate::error::{TransportError, TransportErrorKind};
use crate::request::{MockSource, RequestDescriptor};
use crate::response::RawResponse;
use crate::transport::Transport;
use crate::types::HttpMethod;

/// 预置的 mock 响应
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    failure: Option<TransportErrorKind>,
}

impl MockResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            failure: None,
        }
    }

    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status, body).header(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
    }

    /// 模拟传输层失败
    pub fn failure(kind: TransportErrorKind) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            failure: Some(kind),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MockKey {
    Method(String),
    Route(HttpMethod, String),
}

#[derive(Debug, Default)]
struct MockState {
    seeds: HashMap<MockKey, MockResponse>,
    counts: HashMap<String, usize>,
    /// 仅在 [`MockTransport::recording`] 下记录
    executed: Option<Vec<RequestDescriptor>>,
}

/// 不访问网络的传输层
///
/// 查找顺序：按契约方法名预置的响应、按动词加路径预置的响应、方法声明的 `mock`。
/// 克隆共享同一份状态。默认只按方法名计数；完整请求只在 [`MockTransport::recording`]
/// 创建的实例上保留，供测试断言。
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    fixture_root: Option<PathBuf>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保留每个已执行请求的副本，内存随请求数增长
    pub fn recording() -> Self {
        let transport = Self::default();
        transport.lock().executed = Some(Vec::new());
        transport
    }

    /// 相对路径的 fixture 文件基于该目录解析
    pub fn with_fixture_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fixture_root = Some(root.into());
        self
    }

    pub fn seed(&self, method_name: &str, response: MockResponse) -> &Self {
        self.lock().seeds.insert(MockKey::Method(method_name.to_string()), response);
        self
    }

    /// `path` 为不含查询串的完整 URL 路径
    pub fn seed_route(&self, verb: HttpMethod, path: &str, response: MockResponse) -> &Self {
        self.lock()
            .seeds
            .insert(MockKey::Route(verb, path.to_string()), response);
        self
    }

    pub fn respond(&self, method_name: &str, status: StatusCode, body: impl Into<Bytes>) -> &Self {
        self.seed(method_name, MockResponse::new(status, body))
    }

    pub fn fail(&self, method_name: &str, kind: TransportErrorKind) -> &Self {
        self.seed(method_name, MockResponse::failure(kind))
    }

    /// 已执行请求的快照，未开启记录时为空
    pub fn executed(&self) -> Vec<RequestDescriptor> {
        self.lock().executed.clone().unwrap_or_default()
    }

    pub fn is_recording(&self) -> bool {
        self.lock().executed.is_some()
    }

    pub fn executed_count(&self, method_name: &str) -> usize {
        self.lock().counts.get(method_name).copied().unwrap_or(0)
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.seeds.clear();
        state.counts.clear();
        if let Some(executed) = state.executed.as_mut() {
            executed.clear();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, request: &RequestDescriptor) -> Option<MockResponse> {
        let mut state = self.lock();
        *state.counts.entry(request.method_name.clone()).or_default() += 1;
        if let Some(executed) = state.executed.as_mut() {
            executed.push(request.clone());
        }
        state
            .seeds
            .get(&MockKey::Method(request.method_name.clone()))
            .or_else(|| {
                state
                    .seeds
                    .get(&MockKey::Route(request.verb, request.url.path().to_string()))
            })
            .cloned()
    }

    fn resolve_fixture(&self, path: &Path) -> PathBuf {
        match &self.fixture_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError> {
        let seeded = self.lookup(&request);

        let response = match (seeded, &request.mock) {
            (Some(seeded), _) => seeded,
            (None, Some(mock)) => {
                let status = StatusCode::from_u16(mock.status).map_err(|e| {
                    TransportError::new(TransportErrorKind::Io, request.url.clone(), "invalid mock status")
                        .with_source(e)
                })?;
                let body = match &mock.source {
                    MockSource::Body(body) => Bytes::from(body.clone()),
                    MockSource::File(path) => {
                        let path = self.resolve_fixture(path);
                        let content = tokio::fs::read(&path).await.map_err(|e| {
                            TransportError::new(
                                TransportErrorKind::Io,
                                request.url.clone(),
                                format!("cannot read mock fixture {}", path.display()),
                            )
                            .with_source(e)
                        })?;
                        Bytes::from(content)
                    }
                };
                MockResponse::new(status, body)
            }
            (None, None) => {
                return Err(TransportError::new(
                    TransportErrorKind::Io,
                    request.url.clone(),
                    format!("no mock response for `{}` ({} {})", request.method_name, request.verb, request.url.path()),
                ));
            }
        };

        if let Some(kind) = response.failure {
            return Err(TransportError::new(kind, request.url, "simulated transport failure"));
        }

        Ok(RawResponse {
            status: response.status,
            headers: response.headers,
            url: request.url,
            body: response.body,
        })
    }
}
