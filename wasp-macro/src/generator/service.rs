use quote::{format_ident, quote};
use syn::{ItemTrait, TraitItem};
use wasp_common::ServiceArgs;
use crate::common::strip_trait_attributes;
use super::method::MethodModel;

/// 生成服务契约的客户端实现
///
/// 输出三部分：去掉宏属性后的 trait、`<Trait>Client` 结构体，
/// 以及该结构体对 `ServiceContract` 和原 trait 的实现。
pub fn generate_service(mut input: ItemTrait, args: &ServiceArgs) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[service] traits must not be generic",
        ));
    }

    let mut methods = Vec::new();
    for item in &input.items {
        match item {
            TraitItem::Fn(method) => methods.push(MethodModel::analyze(method)?),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "#[service] traits may only contain methods",
                ));
            }
        }
    }

    strip_trait_attributes(&mut input.items);
    input.attrs.push(syn::parse_quote!(#[allow(async_fn_in_trait)]));

    let trait_name = &input.ident;
    let service_name = trait_name.to_string();
    let client_name = format_ident!("{}Client", trait_name);
    let vis = &input.vis;

    let endpoint = match &args.endpoint {
        Some(endpoint) => quote! { ::core::option::Option::Some(#endpoint) },
        None => quote! { ::core::option::Option::None },
    };

    let method_names = methods.iter().map(|method| &method.name);
    let template_arms = methods
        .iter()
        .map(MethodModel::template_arm)
        .collect::<syn::Result<Vec<_>>>()?;
    let implementations = methods
        .iter()
        .map(MethodModel::implementation)
        .collect::<syn::Result<Vec<_>>>()?;

    let client_doc = format!("Generated client for [`{service_name}`].");

    Ok(quote! {
        #input

        #[doc = #client_doc]
        #[derive(Debug, Clone)]
        #vis struct #client_name {
            dispatcher: ::wasp_common::Dispatcher,
        }

        impl #client_name {
            /// 该客户端使用的调度器
            pub fn dispatcher(&self) -> &::wasp_common::Dispatcher {
                &self.dispatcher
            }
        }

        impl ::wasp_common::ServiceContract for #client_name {
            const NAME: &'static str = #service_name;
            const ENDPOINT: ::core::option::Option<&'static str> = #endpoint;

            fn methods() -> &'static [&'static str] {
                &[#(#method_names),*]
            }

            fn template(method: &str) -> ::core::option::Option<::wasp_common::RequestTemplate> {
                match method {
                    #(#template_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn from_dispatcher(dispatcher: ::wasp_common::Dispatcher) -> Self {
                Self { dispatcher }
            }
        }

        impl #trait_name for #client_name {
            #(#implementations)*
        }
    })
}
