use heck::ToTrainCase;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::ext::IdentExt;
use syn::{FnArg, Pat, Signature};
use wasp_common::{ParamRole, extract_placeholders, parse_param_attrs};
use crate::error::single_generic;

/// 契约方法的一个请求参数
#[derive(Debug, Clone)]
pub struct ParamModel {
    pub ident: Ident,
    pub role: ParamRole,
    /// 请求中使用的名称：占位符名、查询参数名、头部名或表单字段名
    pub name: String,
    pub optional: bool,
}

/// 按声明顺序解析参数角色
///
/// 未标注角色、但名称与路径占位符相同的参数视为路径参数。
pub fn classify_params(sig: &Signature, path: &str, callback: Option<usize>) -> syn::Result<Vec<ParamModel>> {
    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        Some(other) => {
            return Err(syn::Error::new_spanned(other, "first parameter must be `&self`"));
        }
        None => {
            return Err(syn::Error::new_spanned(sig, "service methods must take `&self`"));
        }
    }

    let placeholders = extract_placeholders(path.split('?').next().unwrap_or(path));
    let mut params = Vec::new();

    for (index, input) in inputs.enumerate() {
        if Some(index) == callback {
            continue;
        }
        let FnArg::Typed(pat_type) = input else {
            return Err(syn::Error::new_spanned(input, "unexpected receiver"));
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "service method parameters must be plain identifiers",
            ));
        };
        let ident = pat_ident.ident.clone();
        let plain = ident.unraw().to_string();

        let (role, name) = match parse_param_attrs(&pat_type.attrs)? {
            Some(args) => {
                let name = match (args.name, args.role) {
                    (Some(name), _) => name.value(),
                    (None, ParamRole::Header) => plain.to_train_case(),
                    (None, _) => plain.clone(),
                };
                (args.role, name)
            }
            None if placeholders.contains(&plain.as_str()) => (ParamRole::Path, plain.clone()),
            None => {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    format!(
                        "parameter `{plain}` needs a role attribute such as #[path], #[query], #[header] or #[body]"
                    ),
                ));
            }
        };

        let optional = single_generic(&pat_type.ty, "Option").is_some();
        if optional && matches!(role, ParamRole::Path | ParamRole::QueryMap | ParamRole::FieldMap) {
            return Err(syn::Error::new_spanned(
                &pat_type.ty,
                "only query, header, field and body parameters may be optional",
            ));
        }

        params.push(ParamModel {
            ident,
            role,
            name,
            optional,
        });
    }

    Ok(params)
}

pub fn role_ident(role: ParamRole) -> Ident {
    let variant = match role {
        ParamRole::Path => "Path",
        ParamRole::Query => "Query",
        ParamRole::QueryMap => "QueryMap",
        ParamRole::Header => "Header",
        ParamRole::Body => "Body",
        ParamRole::Field => "Field",
        ParamRole::FieldMap => "FieldMap",
    };
    Ident::new(variant, Span::call_site())
}

/// 把实参写入 `Arguments` 的链式调用
pub fn argument_call(param: &ParamModel) -> proc_macro2::TokenStream {
    let ident = &param.ident;
    let name = &param.name;
    match (param.role, param.optional) {
        (ParamRole::Path, _) => quote! { .path(#name, #ident) },
        (ParamRole::Query, false) => quote! { .query(#name, #ident) },
        (ParamRole::Query, true) => quote! { .query_opt(#name, #ident) },
        (ParamRole::QueryMap, _) => quote! { .query_map(#ident) },
        (ParamRole::Header, false) => quote! { .header(#name, #ident) },
        (ParamRole::Header, true) => quote! { .header_opt(#name, #ident) },
        (ParamRole::Body, _) => quote! { .body(&#ident) },
        (ParamRole::Field, false) => quote! { .field(#name, #ident) },
        (ParamRole::Field, true) => quote! { .field_opt(#name, #ident) },
        (ParamRole::FieldMap, _) => quote! { .field_map(#ident) },
    }
}
