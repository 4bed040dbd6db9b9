use quote::quote;
use syn::Type;
use crate::error::single_generic;

/// 根据响应体类型选择解码器
///
/// - `String`: 按 UTF-8 文本
/// - `Vec<u8>`: 原始字节
/// - `()`: 忽略响应体
/// - 其他类型: 经配置的解析器反序列化
pub fn decoder_for(body: &Type) -> proc_macro2::TokenStream {
    match body {
        Type::Tuple(tuple) if tuple.elems.is_empty() => quote! { ::wasp_common::decode::unit },
        Type::Path(type_path) => {
            let is = |name: &str| {
                type_path
                    .path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident == name && segment.arguments.is_none())
            };
            if is("String") {
                quote! { ::wasp_common::decode::text }
            } else if single_generic(body, "Vec").is_some_and(is_u8) {
                quote! { ::wasp_common::decode::bytes }
            } else {
                quote! { ::wasp_common::decode::json::<#body> }
            }
        }
        _ => quote! { ::wasp_common::decode::json::<#body> },
    }
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(type_path) if type_path.path.is_ident("u8"))
}
