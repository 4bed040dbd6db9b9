use serde_json::Value;
use crate::error::BoxError;
use crate::types::ContentType;

/// 请求体序列化与响应体反序列化的边界
///
/// 解析器只处理 `serde_json::Value`，类型转换由 [`crate::decode`] 完成，
/// 因此可以作为 `Arc<dyn Parser>` 在配置中共享。
pub trait Parser: Send + Sync + std::fmt::Debug {
    fn serialize(&self, value: &Value, content_type: ContentType) -> Result<Vec<u8>, BoxError>;

    /// `target` 为调用方期望的类型名，仅用于诊断
    fn deserialize(&self, body: &[u8], target: &'static str) -> Result<Value, BoxError>;
}

/// 默认 JSON 解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn serialize(&self, value: &Value, content_type: ContentType) -> Result<Vec<u8>, BoxError> {
        match content_type {
            ContentType::Json => Ok(serde_json::to_vec(value)?),
            ContentType::FormUrlEncoded => encode_form(value),
        }
    }

    fn deserialize(&self, body: &[u8], _target: &'static str) -> Result<Value, BoxError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// 将扁平对象编码为 `application/x-www-form-urlencoded`
fn encode_form(value: &Value) -> Result<Vec<u8>, BoxError> {
    let Value::Object(map) = value else {
        return Err("form body must serialize to a flat object".into());
    };

    let mut form = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    form.append_pair(key, &scalar_to_string(item)?);
                }
            }
            other => {
                form.append_pair(key, &scalar_to_string(other)?);
            }
        }
    }
    Ok(form.finish().into_bytes())
}

pub(crate) fn scalar_to_string(value: &Value) -> Result<String, BoxError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => {
            Err(format!("nested value cannot be encoded as a form or query value: {value}").into())
        }
    }
}
