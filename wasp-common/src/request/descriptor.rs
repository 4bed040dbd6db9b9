use std::collections::HashSet;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;
use crate::error::{ContractError, Error, Result};
use crate::parser::Parser;
use crate::request::{Arguments, MockSpec, RequestTemplate};
use crate::types::{ContentType, HttpMethod, RetryPolicy};

/// 调用方期望的成功/失败类型名，仅用于诊断与日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedTypes {
    pub success: &'static str,
    pub failure: &'static str,
}

impl ExpectedTypes {
    pub fn of<T>() -> Self {
        Self {
            success: std::any::type_name::<T>(),
            failure: std::any::type_name::<serde_json::Value>(),
        }
    }
}

/// 单次调用解析完成的请求
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method_name: String,
    pub verb: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub expected: ExpectedTypes,
    pub mock: Option<MockSpec>,
    pub retry: Option<RetryPolicy>,
}

/// 由模板和实参构建请求描述，不做任何 I/O
pub fn build_descriptor(
    template: &RequestTemplate,
    endpoint: &Url,
    arguments: Arguments,
    parser: &dyn Parser,
    expected: ExpectedTypes,
) -> Result<RequestDescriptor> {
    let url = resolve_url(template, endpoint, &arguments)?;
    let mut headers = merge_headers(template, &arguments)?;

    let body = match (arguments.body, arguments.fields.is_empty()) {
        (Some(_), false) => {
            return Err(ContractError::BodyAndFields {
                method: template.name.clone(),
            }
            .into());
        }
        (Some(value), true) => {
            let content_type = template.content_type;
            let value = value.map_err(|source| Error::Serialization {
                content_type: content_type.mime(),
                source: source.into(),
            })?;
            let bytes = parser
                .serialize(&value, content_type)
                .map_err(|source| Error::Serialization {
                    content_type: content_type.mime(),
                    source,
                })?;
            set_default_content_type(&mut headers, content_type);
            Some(Bytes::from(bytes))
        }
        (None, false) => {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            form.extend_pairs(&arguments.fields);
            set_default_content_type(&mut headers, ContentType::FormUrlEncoded);
            Some(Bytes::from(form.finish()))
        }
        (None, true) => None,
    };

    Ok(RequestDescriptor {
        method_name: template.name.clone(),
        verb: template.verb,
        url,
        headers,
        body,
        expected,
        mock: template.mock.clone(),
        retry: template.retry.clone(),
    })
}

fn resolve_url(template: &RequestTemplate, endpoint: &Url, arguments: &Arguments) -> Result<Url> {
    let invalid = |reason: String| ContractError::InvalidUrl {
        method: template.name.clone(),
        reason,
    };

    let mut used = vec![false; arguments.path.len()];
    let mut segments = Vec::new();
    for raw in template.path_only().trim_start_matches('/').split('/') {
        segments.push(substitute(raw, template, arguments, &mut used)?);
    }

    if let Some(index) = used.iter().position(|used| !used) {
        return Err(ContractError::UnusedPathParameter {
            name: arguments.path[index].0.clone(),
            path: template.path.clone(),
        }
        .into());
    }

    let mut url = endpoint.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| invalid(format!("endpoint `{endpoint}` cannot be a base")))?;
        path.pop_if_empty();
        path.extend(segments.iter().map(String::as_str));
    }

    url.set_query(template.static_query());
    if !arguments.query.is_empty() {
        url.query_pairs_mut().extend_pairs(&arguments.query);
    }

    Ok(url)
}

/// 替换单个路径段中的占位符，实参原样代入，由 `Url` 负责转义
fn substitute(
    segment: &str,
    template: &RequestTemplate,
    arguments: &Arguments,
    used: &mut [bool],
) -> Result<String> {
    let mut resolved = String::with_capacity(segment.len());
    let mut rest = segment;

    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        resolved.push_str(&rest[..start]);

        let name = after[..end].trim();
        let index = arguments
            .path
            .iter()
            .position(|(arg, _)| arg == name)
            .or_else(|| name.parse::<usize>().ok().filter(|i| *i < arguments.path.len()))
            .ok_or_else(|| ContractError::UnresolvedPathParameter {
                name: name.to_string(),
                path: template.path.clone(),
            })?;

        used[index] = true;
        resolved.push_str(&arguments.path[index].1);
        rest = &after[end + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}

fn merge_headers(template: &RequestTemplate, arguments: &Arguments) -> Result<HeaderMap> {
    let invalid = |name: &str| ContractError::InvalidHeader {
        method: template.name.clone(),
        name: name.to_string(),
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &template.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid(name))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid(name))?;
        headers.append(header_name, header_value);
    }

    // 调用级头部覆盖同名的静态头部
    let mut overridden = HashSet::new();
    for (name, value) in &arguments.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid(name))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid(name))?;
        if overridden.insert(header_name.clone()) {
            headers.remove(&header_name);
        }
        headers.append(header_name, header_value);
    }

    Ok(headers)
}

fn set_default_content_type(headers: &mut HeaderMap, content_type: ContentType) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.mime()));
    }
}
