use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{LitStr, Meta, Path, Token};
use crate::types::{ContentType, HandlerArgs, HttpMethod, MockArgs, RetryConfig};

impl Parse for HandlerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut path = None;
        let mut content_type = None;
        let mut headers = Punctuated::new();
        let mut interceptor = None;
        let mut retry = None;
        let mut mock = None;
        let mut auth = false;

        let pairs = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;
        for pair in pairs {
            match pair {
                Meta::NameValue(name_value) => {
                    let key = name_value.path.get_ident().ok_or_else(|| {
                        syn::Error::new_spanned(&name_value.path, "expected identifier as key")
                    })?;

                    match key.to_string().as_str() {
                        "path" | "url" => {
                            path = Some(parse_path_value(&name_value.value)?);
                        }
                        "content_type" => {
                            content_type = Some(parse_content_type_value(&name_value.value)?);
                        }
                        "header" => {
                            headers.push(parse_header_value(&name_value.value)?);
                        }
                        "interceptor" => {
                            interceptor = Some(parse_interceptor_value(&name_value.value)?);
                        }
                        "retry" => {
                            retry = Some(parse_retry_value(&name_value.value)?);
                        }
                        "mock" => {
                            mock = Some(parse_mock_file_value(&name_value.value)?);
                        }
                        _ => {
                            return Err(syn::Error::new_spanned(
                                key,
                                "Only 'path', 'content_type', 'header', 'interceptor', 'retry', 'mock' and 'auth' are supported",
                            ));
                        }
                    }
                }
                Meta::List(list) if list.path.is_ident("mock") => {
                    mock = Some(parse_mock_list(&list)?);
                }
                Meta::Path(flag) if flag.is_ident("auth") => {
                    auth = true;
                }
                other => {
                    return Err(syn::Error::new_spanned(other, "expected key-value pair"));
                }
            }
        }

        let path = path.ok_or_else(|| syn::Error::new(input.span(), "Missing required 'path' parameter"))?;

        Ok(HandlerArgs {
            // 由具体的动词属性覆盖
            method: HttpMethod::Get,
            path,
            content_type,
            headers,
            interceptor,
            retry,
            mock,
            auth,
        })
    }
}

fn parse_str_value(value: &syn::Expr, message: &str) -> syn::Result<LitStr> {
    if let syn::Expr::Lit(syn::ExprLit {
        lit: syn::Lit::Str(lit),
        ..
    }) = value
    {
        Ok(lit.clone())
    } else {
        Err(syn::Error::new_spanned(value, message))
    }
}

fn parse_path_value(value: &syn::Expr) -> syn::Result<LitStr> {
    let lit = parse_str_value(value, "path must be a string literal")?;
    if !lit.value().starts_with('/') {
        return Err(syn::Error::new_spanned(&lit, "path must start with '/'"));
    }
    Ok(lit)
}

fn parse_content_type_value(value: &syn::Expr) -> syn::Result<ContentType> {
    if let syn::Expr::Path(expr_path) = value {
        let ident = expr_path.path.get_ident().ok_or_else(|| {
            syn::Error::new_spanned(
                expr_path,
                "content_type must be a simple identifier",
            )
        })?;
        ContentType::from_ident(&ident.to_string()).ok_or_else(|| {
            syn::Error::new_spanned(
                ident,
                "content_type must be one of 'json' or 'form_urlencoded'",
            )
        })
    } else {
        Err(syn::Error::new_spanned(
            value,
            "content_type must be an identifier (e.g., json or form_urlencoded)",
        ))
    }
}

fn parse_header_value(value: &syn::Expr) -> syn::Result<LitStr> {
    let lit = parse_str_value(value, "header must be a string literal")?;
    if split_header(&lit.value()).is_none() {
        return Err(syn::Error::new_spanned(
            &lit,
            "header must be in 'Key: Value' format with a colon separator",
        ));
    }
    Ok(lit)
}

/// 拆分 `Key: Value` 形式的头部声明
pub fn split_header(header: &str) -> Option<(&str, &str)> {
    let (name, value) = header.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

fn parse_interceptor_value(value: &syn::Expr) -> syn::Result<Path> {
    if let syn::Expr::Path(expr_path) = value {
        Ok(expr_path.path.clone())
    } else {
        Err(syn::Error::new_spanned(
            value,
            "interceptor must be a type path",
        ))
    }
}

fn parse_retry_value(value: &syn::Expr) -> syn::Result<RetryConfig> {
    let lit = parse_str_value(
        value,
        "retry must be a string literal (e.g., \"exponential(3, 100ms)\")",
    )?;
    RetryConfig::parse(&lit)
}

fn parse_mock_file_value(value: &syn::Expr) -> syn::Result<MockArgs> {
    let file = parse_str_value(value, "mock must be a fixture path or mock(...)")?;
    Ok(MockArgs {
        status: 200,
        file: Some(file),
        body: None,
    })
}

fn parse_mock_list(list: &syn::MetaList) -> syn::Result<MockArgs> {
    let mut status = 200;
    let mut file = None;
    let mut body = None;

    let nested = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
    for meta in nested {
        let Meta::NameValue(nv) = meta else {
            return Err(syn::Error::new_spanned(meta, "Expected key-value pair in mock configuration"));
        };

        if nv.path.is_ident("status") {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Int(lit),
                ..
            }) = &nv.value
            {
                status = lit.base10_parse::<u16>()?;
                if !(100..=999).contains(&status) {
                    return Err(syn::Error::new_spanned(lit, "status must be a valid HTTP status code"));
                }
            } else {
                return Err(syn::Error::new_spanned(&nv.value, "status must be an integer literal"));
            }
        } else if nv.path.is_ident("file") {
            file = Some(parse_str_value(&nv.value, "file must be a string literal")?);
        } else if nv.path.is_ident("body") {
            body = Some(parse_str_value(&nv.value, "body must be a string literal")?);
        } else {
            return Err(syn::Error::new_spanned(
                &nv.path,
                "Only 'status', 'file' or 'body' are supported in mock configuration",
            ));
        }
    }

    if file.is_some() && body.is_some() {
        return Err(syn::Error::new_spanned(
            &list.path,
            "mock accepts either 'file' or 'body', not both",
        ));
    }

    Ok(MockArgs { status, file, body })
}

/// 解析处理器参数的公共函数
pub fn parse_handler_args(input: ParseStream) -> syn::Result<HandlerArgs> {
    HandlerArgs::parse(input)
}
