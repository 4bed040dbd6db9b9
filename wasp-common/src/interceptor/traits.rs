use async_trait::async_trait;
use crate::request::RequestDescriptor;
use crate::response::RawResponse;

/// 前置钩子的处理结果
#[derive(Debug)]
pub enum Flow {
    /// 继续发送（可能已修改的）请求
    Proceed(RequestDescriptor),
    /// 直接返回响应，不再访问传输层
    Respond(RawResponse),
}

/// 鉴权令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// 完整的 `Authorization` 头部值，如 `Bearer abc`
    pub token: String,
    /// 为 true 时对所有请求生效，否则只对标注了 `auth` 的方法生效
    pub filter_all: bool,
}

impl AuthToken {
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self {
            token: format!("Bearer {}", token.as_ref()),
            filter_all: false,
        }
    }

    pub fn for_all_requests(mut self) -> Self {
        self.filter_all = true;
        self
    }
}

/// Wasp 请求拦截器接口
///
/// 全部方法都有恒等默认实现，只需覆盖关心的钩子。
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// 请求前处理
    async fn before_request(&self, request: RequestDescriptor) -> anyhow::Result<Flow> {
        Ok(Flow::Proceed(request))
    }

    /// 响应后处理
    async fn after_response(&self, response: RawResponse) -> anyhow::Result<RawResponse> {
        Ok(response)
    }

    /// 提供鉴权令牌
    fn auth_token(&self) -> Option<AuthToken> {
        None
    }
}

/// 空拦截器实现，用于测试和默认情况
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpInterceptor;

impl RequestInterceptor for NoOpInterceptor {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;
    use reqwest::header::HeaderMap;
    use url::Url;

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor {
            method_name: "ping".into(),
            verb: HttpMethod::Get,
            url: Url::parse("https://api.example.com/ping").unwrap(),
            headers: HeaderMap::new(),
            body: None,
            expected: crate::request::ExpectedTypes::of::<String>(),
            mock: None,
            retry: None,
        }
    }

    #[tokio::test]
    async fn test_no_op_interceptor_proceeds() {
        let flow = NoOpInterceptor.before_request(descriptor()).await.unwrap();
        match flow {
            Flow::Proceed(request) => assert_eq!(request.method_name, "ping"),
            Flow::Respond(_) => panic!("no-op interceptor must not respond"),
        }
        assert!(NoOpInterceptor.auth_token().is_none());
    }

    #[test]
    fn test_bearer_token() {
        let token = AuthToken::bearer("abc");
        assert_eq!(token.token, "Bearer abc");
        assert!(!token.filter_all);
        assert!(token.for_all_requests().filter_all);
    }
}
