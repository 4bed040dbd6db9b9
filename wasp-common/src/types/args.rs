use syn::punctuated::Punctuated;
use syn::{LitStr, Path, Token};
use crate::request::ParamRole;
use crate::types::http::{HttpMethod, ContentType};
use crate::types::retry::RetryConfig;

/// 方法级属性参数配置（`#[get(...)]`、`#[post(...)]` ...）
pub struct HandlerArgs {
    pub path: LitStr,
    pub method: HttpMethod,
    pub content_type: Option<ContentType>,
    pub headers: Punctuated<LitStr, Token![,]>,
    pub interceptor: Option<Path>,
    pub retry: Option<RetryConfig>,
    pub mock: Option<MockArgs>,
    pub auth: bool,
}

/// Mock 响应配置
///
/// - `mock = "fixtures/user.json"`
/// - `mock(status = 404, body = "{}")`
/// - `mock(status = 200, file = "fixtures/user.json")`
pub struct MockArgs {
    pub status: u16,
    pub file: Option<LitStr>,
    pub body: Option<LitStr>,
}

/// 服务级属性参数配置（`#[service(...)]`）
pub struct ServiceArgs {
    pub endpoint: Option<LitStr>,
}

/// 参数级属性（`#[path]`、`#[query("page")]` ...）
pub struct ParamArgs {
    pub role: ParamRole,
    pub name: Option<LitStr>,
}
