//! 响应体到调用方类型的转换
//!
//! 生成的客户端根据方法返回类型选择解码器：`String` 走 [`text`]，
//! `Vec<u8>` 走 [`bytes`]，`()` 走 [`unit`]，其余类型走 [`json`]。

use bytes::Bytes;
use serde::de::DeserializeOwned;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::response::RawResponse;

pub type Decoder<T> = fn(&dyn Parser, &RawResponse) -> Result<T, ParseError>;

pub fn json<T: DeserializeOwned>(parser: &dyn Parser, raw: &RawResponse) -> Result<T, ParseError> {
    let target = std::any::type_name::<T>();
    let value = parser
        .deserialize(&raw.body, target)
        .map_err(|source| parse_error(target, raw, source))?;
    serde_json::from_value(value).map_err(|source| parse_error(target, raw, source.into()))
}

pub fn text(_parser: &dyn Parser, raw: &RawResponse) -> Result<String, ParseError> {
    String::from_utf8(raw.body.to_vec())
        .map_err(|source| parse_error("alloc::string::String", raw, source.into()))
}

pub fn bytes(_parser: &dyn Parser, raw: &RawResponse) -> Result<Vec<u8>, ParseError> {
    Ok(raw.body.to_vec())
}

/// 丢弃响应体
pub fn unit(_parser: &dyn Parser, _raw: &RawResponse) -> Result<(), ParseError> {
    Ok(())
}

fn parse_error(target: &'static str, raw: &RawResponse, source: crate::error::BoxError) -> ParseError {
    ParseError {
        target,
        raw_body: Bytes::clone(&raw.body),
        status: raw.status,
        source,
    }
}
