use proc_macro::TokenStream;
use syn::{Attribute, FnArg, TraitItem, TraitItemFn};
use wasp_common::{HttpMethod, role_from_attribute};

/// 动词属性只在 `#[service]` trait 内部有意义，由外层宏解析
pub fn misplaced_verb(verb: &str, item: TokenStream) -> TokenStream {
    let item = proc_macro2::TokenStream::from(item);
    let message = format!("#[{verb}] must be used on a method inside a #[service] trait");
    let error = syn::Error::new(proc_macro2::Span::call_site(), message).into_compile_error();
    quote::quote! { #error #item }.into()
}

/// 方法上的动词属性
pub fn verb_of(attr: &Attribute) -> Option<HttpMethod> {
    attr.path()
        .get_ident()
        .and_then(|ident| HttpMethod::from_attribute(&ident.to_string()))
}

fn is_role_attribute(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| role_from_attribute(&ident.to_string()).is_some())
}

/// 去掉方法上的动词属性和参数上的角色属性
pub fn strip_method_attributes(method: &mut TraitItemFn) {
    method.attrs.retain(|attr| verb_of(attr).is_none());
    for input in method.sig.inputs.iter_mut() {
        if let FnArg::Typed(pat_type) = input {
            pat_type.attrs.retain(|attr| !is_role_attribute(attr));
        }
    }
}

/// 输出的 trait 中不再保留宏专用的属性
pub fn strip_trait_attributes(items: &mut [TraitItem]) {
    for item in items {
        if let TraitItem::Fn(method) = item {
            strip_method_attributes(method);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_strip_method_attributes() {
        let mut method: TraitItemFn = parse_quote! {
            #[doc = "kept"]
            #[get(path = "/users/{id}")]
            fn user(&self, #[path] id: u32, #[query("q")] q: &str) -> Result<String>;
        };
        strip_method_attributes(&mut method);

        assert_eq!(method.attrs.len(), 1);
        assert!(method.attrs[0].path().is_ident("doc"));
        for input in &method.sig.inputs {
            if let FnArg::Typed(pat_type) = input {
                assert!(pat_type.attrs.is_empty());
            }
        }
    }

    #[test]
    fn test_verb_of() {
        let attr: Attribute = parse_quote!(#[delete(path = "/x")]);
        assert_eq!(verb_of(&attr), Some(HttpMethod::Delete));

        let attr: Attribute = parse_quote!(#[allow(unused)]);
        assert_eq!(verb_of(&attr), None);
    }
}
