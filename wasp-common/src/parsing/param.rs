use syn::parse::{Parse, ParseStream};
use syn::{Attribute, LitStr};
use crate::request::ParamRole;
use crate::types::ParamArgs;

/// 参数属性名与角色的对应关系
pub fn role_from_attribute(name: &str) -> Option<ParamRole> {
    match name {
        "path" => Some(ParamRole::Path),
        "query" => Some(ParamRole::Query),
        "query_map" => Some(ParamRole::QueryMap),
        "header" => Some(ParamRole::Header),
        "body" => Some(ParamRole::Body),
        "field" => Some(ParamRole::Field),
        "field_map" => Some(ParamRole::FieldMap),
        _ => None,
    }
}

/// 属性括号内只接受一个可选的名称字面量
struct ParamName(Option<LitStr>);

impl Parse for ParamName {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(ParamName(None));
        }
        let lit: LitStr = input.parse()?;
        if lit.value().is_empty() {
            return Err(syn::Error::new_spanned(&lit, "parameter name must not be empty"));
        }
        Ok(ParamName(Some(lit)))
    }
}

/// 从参数的属性列表中找出角色属性
///
/// 返回 `Ok(None)` 表示参数没有角色标注；同一参数出现多个角色属性时报错。
pub fn parse_param_attrs(attrs: &[Attribute]) -> syn::Result<Option<ParamArgs>> {
    let mut found: Option<ParamArgs> = None;

    for attr in attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        let Some(role) = role_from_attribute(&ident.to_string()) else {
            continue;
        };

        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "a parameter can only have one role attribute"));
        }

        let name = match &attr.meta {
            syn::Meta::Path(_) => None,
            syn::Meta::List(list) => syn::parse2::<ParamName>(list.tokens.clone())?.0,
            syn::Meta::NameValue(nv) => {
                return Err(syn::Error::new_spanned(nv, "use #[role(\"name\")] instead of #[role = ...]"));
            }
        };

        if name.is_some() && matches!(role, ParamRole::Body | ParamRole::QueryMap | ParamRole::FieldMap) {
            return Err(syn::Error::new_spanned(attr, "this role does not take a name"));
        }

        found = Some(ParamArgs { role, name });
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn attrs_of(param: syn::FnArg) -> Vec<Attribute> {
        match param {
            syn::FnArg::Typed(pat) => pat.attrs,
            syn::FnArg::Receiver(recv) => recv.attrs,
        }
    }

    #[test]
    fn test_bare_role() {
        let attrs = attrs_of(parse_quote! { #[query] page: u32 });
        let args = parse_param_attrs(&attrs).unwrap().unwrap();
        assert_eq!(args.role, ParamRole::Query);
        assert!(args.name.is_none());
    }

    #[test]
    fn test_named_role() {
        let attrs = attrs_of(parse_quote! { #[header("X-Trace")] trace: &str });
        let args = parse_param_attrs(&attrs).unwrap().unwrap();
        assert_eq!(args.role, ParamRole::Header);
        assert_eq!(args.name.unwrap().value(), "X-Trace");
    }

    #[test]
    fn test_unannotated() {
        let attrs = attrs_of(parse_quote! { #[allow(unused)] id: u32 });
        assert!(parse_param_attrs(&attrs).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_roles() {
        let attrs = attrs_of(parse_quote! { #[query] #[path] id: u32 });
        assert!(parse_param_attrs(&attrs).is_err());
    }

    #[test]
    fn test_named_body_rejected() {
        let attrs = attrs_of(parse_quote! { #[body("user")] user: User });
        assert!(parse_param_attrs(&attrs).is_err());
    }
}
