use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use reqwest::header::{HeaderName, HeaderValue};
use crate::error::ContractError;
use crate::interceptor::RequestInterceptor;
use crate::types::{ContentType, HttpMethod, RetryPolicy};

/// 参数在请求中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    Path,
    Query,
    QueryMap,
    Header,
    Body,
    Field,
    FieldMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub role: ParamRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSource {
    Body(String),
    File(PathBuf),
}

/// 方法声明的 mock 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSpec {
    pub status: u16,
    pub source: MockSource,
}

impl MockSpec {
    pub fn body(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            source: MockSource::Body(body.into()),
        }
    }

    pub fn file(status: u16, path: impl Into<PathBuf>) -> Self {
        Self {
            status,
            source: MockSource::File(path.into()),
        }
    }
}

/// 单个契约方法的请求模板
///
/// 由 `#[service]` 生成的代码或 [`crate::ServiceDefinition`] 构造，派生后不再变化。
#[derive(Clone)]
pub struct RequestTemplate {
    pub name: String,
    pub verb: HttpMethod,
    /// 相对路径，可带 `{name}` 占位符和静态查询串
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<ParamSpec>,
    pub content_type: ContentType,
    pub retry: Option<RetryPolicy>,
    pub mock: Option<MockSpec>,
    pub auth: bool,
    pub interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl std::fmt::Debug for RequestTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestTemplate")
            .field("name", &self.name)
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("content_type", &self.content_type)
            .field("retry", &self.retry)
            .field("mock", &self.mock)
            .field("auth", &self.auth)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl RequestTemplate {
    pub fn new(name: impl Into<String>, verb: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verb,
            path: path.into(),
            headers: Vec::new(),
            params: Vec::new(),
            content_type: ContentType::default(),
            retry: None,
            mock: None,
            auth: false,
            interceptors: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 参数按声明顺序登记
    pub fn param(mut self, name: impl Into<String>, role: ParamRole) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            role,
        });
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn mock(mut self, mock: MockSpec) -> Self {
        self.mock = Some(mock);
        self
    }

    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// 路径部分（不含静态查询串）
    pub fn path_only(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// 静态查询串
    pub fn static_query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query).filter(|q| !q.is_empty())
    }

    /// 按出现顺序提取路径中的占位符名
    pub fn placeholders(&self) -> Vec<&str> {
        extract_placeholders(self.path_only())
    }

    /// 检查模板自身的一致性，在创建客户端时调用
    pub fn validate(&self) -> Result<(), ContractError> {
        let path = self.path_only();
        if !path.starts_with('/') {
            return Err(ContractError::InvalidUrl {
                method: self.name.clone(),
                reason: format!("path `{}` must start with '/'", self.path),
            });
        }
        if has_empty_placeholder(path) {
            return Err(ContractError::InvalidUrl {
                method: self.name.clone(),
                reason: format!("path `{}` contains an empty `{{}}` placeholder", self.path),
            });
        }

        for (name, value) in &self.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
                return Err(ContractError::InvalidHeader {
                    method: self.name.clone(),
                    name: name.clone(),
                });
            }
        }

        let mut bodies = 0;
        let mut fields = false;
        let mut path_params = Vec::new();
        for param in &self.params {
            match param.role {
                ParamRole::Body => bodies += 1,
                ParamRole::Field | ParamRole::FieldMap => fields = true,
                ParamRole::Path => path_params.push(param.name.as_str()),
                ParamRole::Header => {
                    if HeaderName::from_bytes(param.name.as_bytes()).is_err() {
                        return Err(ContractError::InvalidHeader {
                            method: self.name.clone(),
                            name: param.name.clone(),
                        });
                    }
                }
                ParamRole::Query | ParamRole::QueryMap => {}
            }
        }
        if bodies > 1 {
            return Err(ContractError::MultipleBodies {
                method: self.name.clone(),
            });
        }
        if bodies == 1 && fields {
            return Err(ContractError::BodyAndFields {
                method: self.name.clone(),
            });
        }

        let placeholders = self.placeholders();
        for placeholder in &placeholders {
            if !resolves(placeholder, &path_params) {
                return Err(ContractError::UnresolvedPathParameter {
                    name: placeholder.to_string(),
                    path: self.path.clone(),
                });
            }
        }
        for (index, name) in path_params.iter().enumerate() {
            let used = placeholders
                .iter()
                .any(|p| p == name || p.parse::<usize>().ok() == Some(index));
            if !used {
                return Err(ContractError::UnusedPathParameter {
                    name: name.to_string(),
                    path: self.path.clone(),
                });
            }
        }

        Ok(())
    }
}

/// 占位符按名称匹配，纯数字占位符按路径参数的位置匹配
fn resolves(placeholder: &str, path_params: &[&str]) -> bool {
    if path_params.contains(&placeholder) {
        return true;
    }
    placeholder
        .parse::<usize>()
        .is_ok_and(|index| index < path_params.len())
}

fn has_empty_placeholder(path: &str) -> bool {
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return false;
        };
        if after[..end].trim().is_empty() {
            return true;
        }
        rest = &after[end + 1..];
    }
    false
}

/// 提取 `{name}` 占位符，忽略空的 `{}`（由 [`RequestTemplate::validate`] 拒绝）
pub fn extract_placeholders(path: &str) -> Vec<&str> {
    let mut placeholders = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = path;

    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() && seen.insert(name) {
            placeholders.push(name);
        }
        rest = &after[end + 1..];
    }

    placeholders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_template() -> RequestTemplate {
        RequestTemplate::new("user", HttpMethod::Get, "/users/{id}/posts/{post}")
            .param("id", ParamRole::Path)
            .param("post", ParamRole::Path)
    }

    #[test]
    fn test_extract_placeholders() {
        assert_eq!(extract_placeholders("/users/{id}/posts/{post}"), vec!["id", "post"]);
        assert_eq!(extract_placeholders("/a/{id}/b/{id}"), vec!["id"]);
        assert_eq!(extract_placeholders("/a/{}/b"), Vec::<&str>::new());
        assert_eq!(extract_placeholders("/a/{open"), Vec::<&str>::new());
    }

    #[test]
    fn test_static_query_is_split() {
        let template = RequestTemplate::new("search", HttpMethod::Get, "/search?v=2");
        assert_eq!(template.path_only(), "/search");
        assert_eq!(template.static_query(), Some("v=2"));
        template.validate().unwrap();
    }

    #[test]
    fn test_valid_template() {
        user_template().validate().unwrap();
    }

    #[test]
    fn test_positional_placeholder() {
        RequestTemplate::new("user", HttpMethod::Get, "/users/{0}")
            .param("id", ParamRole::Path)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_unresolved_placeholder() {
        let err = RequestTemplate::new("user", HttpMethod::Get, "/users/{id}")
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::UnresolvedPathParameter {
                name: "id".into(),
                path: "/users/{id}".into()
            }
        );
    }

    #[test]
    fn test_unused_path_param() {
        let err = RequestTemplate::new("user", HttpMethod::Get, "/users")
            .param("id", ParamRole::Path)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ContractError::UnusedPathParameter { .. }));
    }

    #[test]
    fn test_body_and_fields() {
        let err = RequestTemplate::new("login", HttpMethod::Post, "/login")
            .param("payload", ParamRole::Body)
            .param("user", ParamRole::Field)
            .validate()
            .unwrap_err();
        assert_eq!(err, ContractError::BodyAndFields { method: "login".into() });
    }

    #[test]
    fn test_invalid_static_header() {
        let err = RequestTemplate::new("a", HttpMethod::Get, "/a")
            .header("Bad Header", "x")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidHeader { .. }));
    }

    #[test]
    fn test_relative_path_rejected() {
        let err = RequestTemplate::new("a", HttpMethod::Get, "a").validate().unwrap_err();
        assert!(matches!(err, ContractError::InvalidUrl { .. }));
    }

    #[test]
    fn test_empty_placeholder_rejected() {
        let err = RequestTemplate::new("a", HttpMethod::Get, "/a/{}/b").validate().unwrap_err();
        assert!(matches!(err, ContractError::InvalidUrl { ref reason, .. } if reason.contains("{}")));

        let err = RequestTemplate::new("a", HttpMethod::Get, "/a/{ }")
            .param("id", ParamRole::Path)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidUrl { .. }));
    }
}
