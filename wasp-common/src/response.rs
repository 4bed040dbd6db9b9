use std::time::Duration;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use url::Url;

/// 传输层返回的原始响应
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// 重定向后的最终地址
    pub url: Url,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// 解码后的响应
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    pub body: T,
    /// 请求发出到收到响应的耗时
    pub network_time: Duration,
    /// 原始响应体长度
    pub length: usize,
}

impl<T> Response<T> {
    pub fn into_body(self) -> T {
        self.body
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            url: self.url,
            body: f(self.body),
            network_time: self.network_time,
            length: self.length,
        }
    }
}
