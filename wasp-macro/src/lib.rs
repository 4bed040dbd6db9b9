mod common;
mod conversion;
mod error;
mod generator;
mod request;

use proc_macro::TokenStream;
use syn::{ItemTrait, parse_macro_input};
use wasp_common::parse_service_args;
use crate::common::misplaced_verb;
use crate::generator::generate_service;

/// 把带注解的 trait 变成服务契约
///
/// 生成 `<Trait>Client`，它实现该 trait 与 `wasp_common::ServiceContract`，
/// 通过 `Wasp::create::<<Trait>Client>()` 获得实例。
#[proc_macro_attribute]
pub fn service(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with parse_service_args);
    let input = parse_macro_input!(item as ItemTrait);

    generate_service(input, &args)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_attribute]
pub fn get(_args: TokenStream, item: TokenStream) -> TokenStream {
    misplaced_verb("get", item)
}

#[proc_macro_attribute]
pub fn post(_args: TokenStream, item: TokenStream) -> TokenStream {
    misplaced_verb("post", item)
}

#[proc_macro_attribute]
pub fn put(_args: TokenStream, item: TokenStream) -> TokenStream {
    misplaced_verb("put", item)
}

#[proc_macro_attribute]
pub fn delete(_args: TokenStream, item: TokenStream) -> TokenStream {
    misplaced_verb("delete", item)
}

#[proc_macro_attribute]
pub fn patch(_args: TokenStream, item: TokenStream) -> TokenStream {
    misplaced_verb("patch", item)
}

#[proc_macro_attribute]
pub fn head(_args: TokenStream, item: TokenStream) -> TokenStream {
    misplaced_verb("head", item)
}
