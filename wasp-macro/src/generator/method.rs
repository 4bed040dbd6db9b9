use quote::quote;
use syn::{FnArg, Pat, TraitItemFn};
use wasp_common::{HandlerArgs, parse_handler_args};
use crate::common::{strip_method_attributes, verb_of};
use crate::conversion::decoder_for;
use crate::error::{MethodKind, ReturnShape, validate_signature};
use crate::request::{ParamModel, TemplateModel, argument_call, classify_params};

/// 一个契约方法解析后的全部信息
pub struct MethodModel {
    pub name: String,
    pub args: HandlerArgs,
    pub params: Vec<ParamModel>,
    pub shape: ReturnShape,
    /// 去掉宏属性后的方法声明
    pub declaration: TraitItemFn,
}

impl MethodModel {
    pub fn analyze(method: &TraitItemFn) -> syn::Result<Self> {
        if method.default.is_some() {
            return Err(syn::Error::new_spanned(
                &method.default,
                "service methods must not have a default body",
            ));
        }
        if !method.sig.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &method.sig.generics,
                "service methods must not declare generic parameters",
            ));
        }

        let mut verbs = method.attrs.iter().filter_map(|attr| verb_of(attr).map(|verb| (attr, verb)));
        let (attr, verb) = verbs.next().ok_or_else(|| {
            syn::Error::new_spanned(
                &method.sig.ident,
                "service methods need an HTTP verb attribute such as #[get(path = \"/...\")]",
            )
        })?;
        if let Some((extra, _)) = verbs.next() {
            return Err(syn::Error::new_spanned(extra, "only one HTTP verb attribute is allowed"));
        }

        let mut args = attr.parse_args_with(parse_handler_args)?;
        args.method = verb;

        let shape = validate_signature(&method.sig)?;
        let params = classify_params(&method.sig, &args.path.value(), shape.callback)?;
        let name = method.sig.ident.to_string();

        TemplateModel {
            name: name.clone(),
            args: &args,
            params: &params,
        }
        .validate()?;

        let mut declaration = method.clone();
        strip_method_attributes(&mut declaration);

        Ok(Self {
            name,
            args,
            params,
            shape,
            declaration,
        })
    }

    /// `ServiceContract::template` 中该方法的分支
    pub fn template_arm(&self) -> syn::Result<proc_macro2::TokenStream> {
        let name = &self.name;
        let template = TemplateModel {
            name: self.name.clone(),
            args: &self.args,
            params: &self.params,
        }
        .to_tokens()?;
        Ok(quote! { #name => ::core::option::Option::Some(#template), })
    }

    /// 客户端结构体上的 trait 方法实现
    pub fn implementation(&self) -> syn::Result<proc_macro2::TokenStream> {
        let sig = &self.declaration.sig;
        let attrs = &self.declaration.attrs;
        let name = &self.name;
        let decoder = decoder_for(&self.shape.body);
        let arguments = self.params.iter().map(argument_call);

        let into_body = (!self.shape.full_response).then(|| quote! { .map(::wasp_common::Response::into_body) });

        let call = match self.shape.kind {
            MethodKind::Async => quote! {
                self.dispatcher
                    .call(#name, arguments, #decoder)
                    .await
                    #into_body
                    .map_err(::core::convert::Into::into)
            },
            MethodKind::Blocking => quote! {
                self.dispatcher
                    .call_blocking(#name, arguments, #decoder)
                    #into_body
                    .map_err(::core::convert::Into::into)
            },
            MethodKind::Callback => {
                let callback = self.callback_ident()?;
                quote! { self.dispatcher.enqueue(#name, arguments, #decoder, #callback) }
            }
        };

        // 文档注释之类的属性保留在 trait 上，实现里只保留 cfg 等
        let attrs = attrs.iter().filter(|attr| !attr.path().is_ident("doc"));

        Ok(quote! {
            #(#attrs)*
            #sig {
                let arguments = ::wasp_common::Arguments::new() #(#arguments)*;
                #call
            }
        })
    }

    fn callback_ident(&self) -> syn::Result<&syn::Ident> {
        let index = self.shape.callback.unwrap_or_default();
        match self.declaration.sig.inputs.iter().nth(index + 1) {
            Some(FnArg::Typed(pat_type)) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => Ok(&pat_ident.ident),
                other => Err(syn::Error::new_spanned(other, "callback parameter must be a plain identifier")),
            },
            _ => Err(syn::Error::new_spanned(&self.declaration.sig, "missing callback parameter")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_analyze_get() {
        let method: TraitItemFn = parse_quote! {
            #[get(path = "/users/{id}", header = "Accept: application/json")]
            async fn user(&self, id: u32) -> wasp_common::Result<User>;
        };
        let model = MethodModel::analyze(&method).unwrap();
        assert_eq!(model.name, "user");
        assert_eq!(model.params.len(), 1);
        assert!(model.declaration.attrs.is_empty());

        let body = model.implementation().unwrap().to_string();
        assert!(body.contains("\"user\""));
        assert!(body.contains("call"));
        assert!(body.contains("into_body"));
    }

    #[test]
    fn test_verb_overrides_default_method() {
        let method: TraitItemFn = parse_quote! {
            #[delete(path = "/users/{id}")]
            fn remove(&self, id: u32) -> Result<()>;
        };
        let model = MethodModel::analyze(&method).unwrap();
        assert_eq!(model.args.method, wasp_common::HttpMethod::Delete);
        assert_eq!(model.shape.kind, MethodKind::Blocking);
    }

    #[test]
    fn test_callback_method() {
        let method: TraitItemFn = parse_quote! {
            #[get(path = "/users")]
            fn users(&self, #[query] page: Option<u32>, done: impl Callback<Vec<User>>) -> CallHandle;
        };
        let model = MethodModel::analyze(&method).unwrap();
        let body = model.implementation().unwrap().to_string();
        assert!(body.contains("enqueue"));
        assert!(body.contains("done"));
        assert!(body.contains("query_opt"));
    }

    #[test]
    fn test_missing_verb() {
        let method: TraitItemFn = parse_quote! {
            fn user(&self) -> Result<User>;
        };
        assert!(MethodModel::analyze(&method).is_err());
    }

    #[test]
    fn test_two_verbs() {
        let method: TraitItemFn = parse_quote! {
            #[get(path = "/a")]
            #[post(path = "/a")]
            fn user(&self) -> Result<User>;
        };
        assert!(MethodModel::analyze(&method).is_err());
    }

    #[test]
    fn test_unresolved_placeholder_is_compile_error() {
        let method: TraitItemFn = parse_quote! {
            #[get(path = "/users/{id}")]
            fn user(&self, #[query] id: u32) -> Result<User>;
        };
        let err = MethodModel::analyze(&method).err().unwrap();
        assert!(err.to_string().contains("{id}"));
    }
}
