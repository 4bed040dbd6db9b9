//! Wasp 运行时核心
//!
//! 服务契约由 `wasp-macro` 的 `#[service]` 生成，运行时负责把每次方法调用
//! 变成请求描述，经拦截器链交给传输层，再把响应解码后交还调用方。

pub mod client;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod image;
pub mod interceptor;
pub mod parser;
pub mod parsing;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use client::Wasp;
pub use config::{LogLevel, NetworkMode, WaspBuilder};
pub use decode::Decoder;
pub use dispatch::{
    Call, CallHandle, Callback, CallbackExecutor, DeliveryThread, Dispatcher, Job, ServiceContract,
    ServiceDefinition,
};
pub use error::{
    BoxError, ContractError, Error, ParseError, Result, ServiceError, TransportError, TransportErrorKind,
};
pub use image::{HttpImageFetcher, Image, ImageCache, ImageFetcher, ImageHandler, ImageRequest};
pub use interceptor::{AuthToken, Flow, HeaderInterceptor, InterceptorChain, NoOpInterceptor, RequestInterceptor};
pub use parser::{JsonParser, Parser};
pub use parsing::{parse_handler_args, parse_param_attrs, parse_service_args, role_from_attribute, split_header};
pub use request::{
    Arguments, ExpectedTypes, MockSource, MockSpec, ParamRole, ParamSpec, RequestDescriptor, RequestTemplate,
    build_descriptor, extract_placeholders,
};
pub use response::{RawResponse, Response};
pub use reqwest::StatusCode;
pub use transport::{
    CookieHandler, CookiePolicy, HttpStack, KeyStore, MockResponse, MockTransport, ReqwestStack, ReqwestTransport,
    SslTrust, Transport,
};
pub use types::{ContentType, HandlerArgs, HttpMethod, MockArgs, ParamArgs, RetryConfig, RetryPolicy, ServiceArgs};

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
}
