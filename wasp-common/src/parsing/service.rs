use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{LitStr, Token};
use crate::types::ServiceArgs;

impl Parse for ServiceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut endpoint = None;

        let pairs = Punctuated::<syn::Meta, Token![,]>::parse_terminated(input)?;
        for meta in pairs {
            match meta {
                syn::Meta::NameValue(nv) => {
                    if nv.path.is_ident("endpoint") {
                        endpoint = Some(parse_endpoint_value(&nv.value)?);
                    } else {
                        return Err(syn::Error::new_spanned(
                            nv.path,
                            "Only 'endpoint' is supported",
                        ));
                    }
                }
                _ => {
                    return Err(syn::Error::new_spanned(meta, "Expected key-value pair"));
                }
            }
        }

        Ok(ServiceArgs { endpoint })
    }
}

fn parse_endpoint_value(value: &syn::Expr) -> syn::Result<LitStr> {
    if let syn::Expr::Lit(syn::ExprLit {
        lit: syn::Lit::Str(lit),
        ..
    }) = value
    {
        let endpoint = lit.value();
        if endpoint.trim().is_empty() {
            return Err(syn::Error::new_spanned(lit, "endpoint must not be empty"));
        }
        if endpoint.ends_with('/') {
            return Err(syn::Error::new_spanned(lit, "endpoint must not end with '/'"));
        }
        Ok(lit.clone())
    } else {
        Err(syn::Error::new_spanned(
            value,
            "endpoint must be a string literal",
        ))
    }
}

/// 解析服务级参数的公共函数
pub fn parse_service_args(input: ParseStream) -> syn::Result<ServiceArgs> {
    ServiceArgs::parse(input)
}
