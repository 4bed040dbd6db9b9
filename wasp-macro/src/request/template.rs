use proc_macro2::Literal;
use quote::quote;
use syn::LitStr;
use wasp_common::{HandlerArgs, RequestTemplate, RetryPolicy, split_header};
use super::params::{ParamModel, role_ident};

/// 方法模板在编译期的描述，用于校验和生成模板构造代码
pub struct TemplateModel<'a> {
    pub name: String,
    pub args: &'a HandlerArgs,
    pub params: &'a [ParamModel],
}

impl TemplateModel<'_> {
    /// 在编译期构造一份同样的模板并执行运行时的一致性检查
    pub fn validate(&self) -> syn::Result<()> {
        let mut template = RequestTemplate::new(self.name.clone(), self.args.method, self.args.path.value());
        for header in &self.args.headers {
            let (name, value) = split_header_lit(header)?;
            template = template.header(name, value);
        }
        for param in self.params {
            template = template.param(param.name.clone(), param.role);
        }

        template
            .validate()
            .map_err(|err| syn::Error::new(self.args.path.span(), err.to_string()))
    }

    /// 生成 `RequestTemplate` 构造表达式
    pub fn to_tokens(&self) -> syn::Result<proc_macro2::TokenStream> {
        let name = &self.name;
        let verb = self.args.method.variant_ident();
        let path = &self.args.path;

        let headers = self
            .args
            .headers
            .iter()
            .map(|header| {
                let (name, value) = split_header_lit(header)?;
                Ok(quote! { .header(#name, #value) })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        let params = self.params.iter().map(|param| {
            let name = &param.name;
            let role = role_ident(param.role);
            quote! { .param(#name, ::wasp_common::ParamRole::#role) }
        });

        let content_type = self.args.content_type.map(|content_type| {
            let variant = content_type.variant_ident();
            quote! { .content_type(::wasp_common::ContentType::#variant) }
        });

        let retry = self.args.retry.as_ref().map(|config| {
            let policy = retry_policy_tokens(&config.policy);
            quote! { .retry(#policy) }
        });

        let mock = self.args.mock.as_ref().map(|mock| {
            let status = mock.status;
            match (&mock.body, &mock.file) {
                (Some(body), _) => quote! { .mock(::wasp_common::MockSpec::body(#status, #body)) },
                (None, Some(file)) => {
                    let file = fixture_path(file);
                    quote! { .mock(::wasp_common::MockSpec::file(#status, #file)) }
                }
                (None, None) => quote! { .mock(::wasp_common::MockSpec::body(#status, "")) },
            }
        });

        let auth = self.args.auth.then(|| quote! { .auth(true) });

        let interceptor = self.args.interceptor.as_ref().map(|path| {
            quote! {
                .interceptor(::std::sync::Arc::new(<#path as ::core::default::Default>::default()))
            }
        });

        Ok(quote! {
            ::wasp_common::RequestTemplate::new(#name, ::wasp_common::HttpMethod::#verb, #path)
                #(#headers)*
                #(#params)*
                #content_type
                #retry
                #mock
                #auth
                #interceptor
        })
    }
}

fn split_header_lit(header: &LitStr) -> syn::Result<(String, String)> {
    let value = header.value();
    split_header(&value)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| syn::Error::new(header.span(), "header must be in 'Key: Value' format"))
}

/// 相对路径的 fixture 以声明服务的 crate 根目录为基准
fn fixture_path(file: &LitStr) -> proc_macro2::TokenStream {
    if std::path::Path::new(&file.value()).is_absolute() {
        quote! { #file }
    } else {
        quote! { ::std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(#file) }
    }
}

/// 重试策略在编译期已解析完毕，直接展开为结构体字面量
pub fn retry_policy_tokens(policy: &RetryPolicy) -> proc_macro2::TokenStream {
    let max_attempts = policy.max_attempts;
    let base_delay_ms = policy.base_delay_ms;
    let max_delay_ms = policy.max_delay_ms;
    let exponential_base = Literal::f64_suffixed(policy.exponential_base);
    let jitter_ratio = Literal::f64_suffixed(policy.jitter_ratio);
    let idempotent_only = policy.idempotent_only;

    quote! {
        ::wasp_common::RetryPolicy {
            max_attempts: #max_attempts,
            base_delay_ms: #base_delay_ms,
            max_delay_ms: #max_delay_ms,
            exponential_base: #exponential_base,
            jitter_ratio: #jitter_ratio,
            idempotent_only: #idempotent_only,
        }
    }
}
