use proc_macro2::Ident;
use syn::parse::{Parse, ParseStream};

/// HTTP 方法枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    /// 返回HTTP方法的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
        }
    }

    /// 从属性名解析（`get`、`post` ...）
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "head" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    /// 返回生成代码中使用的枚举变体标识符
    pub fn variant_ident(&self) -> Ident {
        Ident::new(
            match self {
                HttpMethod::Get => "Get",
                HttpMethod::Post => "Post",
                HttpMethod::Put => "Put",
                HttpMethod::Delete => "Delete",
                HttpMethod::Patch => "Patch",
                HttpMethod::Head => "Head",
            },
            proc_macro2::Span::call_site(),
        )
    }

    /// 转换为 reqwest 的方法类型
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// 是否幂等（决定默认是否允许重试）
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内容类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    FormUrlEncoded,
}

impl ContentType {
    /// 请求头中使用的 MIME 类型
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json; charset=UTF-8",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    pub fn variant_ident(&self) -> Ident {
        Ident::new(
            match self {
                ContentType::Json => "Json",
                ContentType::FormUrlEncoded => "FormUrlEncoded",
            },
            proc_macro2::Span::call_site(),
        )
    }

    pub(crate) fn from_ident(name: &str) -> Option<Self> {
        match name {
            "json" => Some(ContentType::Json),
            "form_urlencoded" => Some(ContentType::FormUrlEncoded),
            _ => None,
        }
    }
}

impl Parse for ContentType {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;
        ContentType::from_ident(&ident.to_string()).ok_or_else(|| {
            syn::Error::new_spanned(
                ident,
                "content_type must be one of 'json' or 'form_urlencoded'",
            )
        })
    }
}
