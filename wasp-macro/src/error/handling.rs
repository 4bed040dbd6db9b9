use syn::{FnArg, GenericArgument, PathArguments, ReturnType, Signature, Type, TypeParamBound};

/// 契约方法的调用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// `async fn ... -> Result<T>`
    Async,
    /// `fn ... -> Result<T>`，阻塞调用线程
    Blocking,
    /// `fn ...(callback: impl Callback<T>) -> CallHandle`
    Callback,
}

/// 方法签名解析出的返回形态
#[derive(Debug, Clone)]
pub struct ReturnShape {
    pub kind: MethodKind,
    /// 需要解码的响应体类型
    pub body: Type,
    /// 返回完整的 `Response<T>` 而不只是响应体
    pub full_response: bool,
    /// 回调参数的下标（不含 `self`）
    pub callback: Option<usize>,
}

/// 校验返回类型并确定调用方式
pub fn validate_signature(sig: &Signature) -> syn::Result<ReturnShape> {
    let callback = find_callback(sig)?;

    match callback {
        Some((index, body)) => {
            if sig.asyncness.is_some() {
                return Err(syn::Error::new_spanned(
                    sig.asyncness,
                    "callback methods must not be async",
                ));
            }
            if !returns_call_handle(&sig.output) {
                return Err(syn::Error::new_spanned(
                    &sig.output,
                    "callback methods must return CallHandle",
                ));
            }
            Ok(ReturnShape {
                kind: MethodKind::Callback,
                body,
                full_response: true,
                callback: Some(index),
            })
        }
        None => {
            let ok_type = extract_result_ok(&sig.output)?;
            let (body, full_response) = match single_generic(ok_type, "Response") {
                Some(inner) => (inner.clone(), true),
                None => (ok_type.clone(), false),
            };
            let kind = if sig.asyncness.is_some() {
                MethodKind::Async
            } else {
                MethodKind::Blocking
            };
            Ok(ReturnShape {
                kind,
                body,
                full_response,
                callback: None,
            })
        }
    }
}

/// 提取 `Result<T>` / `Result<T, E>` 中的 `T`
fn extract_result_ok(output: &ReturnType) -> syn::Result<&Type> {
    let ReturnType::Type(_, ty) = output else {
        return Err(syn::Error::new_spanned(
            output,
            "service methods must return Result<T>, or CallHandle with a callback parameter",
        ));
    };
    let Type::Path(type_path) = &**ty else {
        return Err(syn::Error::new_spanned(ty, "return type must be Result<T>"));
    };
    let last_segment = type_path
        .path
        .segments
        .last()
        .ok_or_else(|| syn::Error::new_spanned(ty, "return type path must not be empty"))?;
    if last_segment.ident != "Result" {
        return Err(syn::Error::new_spanned(ty, "return type must be Result<T>"));
    }

    let PathArguments::AngleBracketed(args) = &last_segment.arguments else {
        return Err(syn::Error::new_spanned(ty, "Result<T> must have generic arguments"));
    };
    if args.args.is_empty() || args.args.len() > 2 {
        return Err(syn::Error::new_spanned(ty, "Result must have one or two type parameters"));
    }
    match &args.args[0] {
        GenericArgument::Type(ok_type) => Ok(ok_type),
        other => Err(syn::Error::new_spanned(other, "expected a type")),
    }
}

fn returns_call_handle(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match &**ty {
            Type::Path(type_path) => type_path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "CallHandle" && segment.arguments.is_none()),
            _ => false,
        },
        ReturnType::Default => false,
    }
}

/// 找出 `impl Callback<T>` 参数，返回其下标与 `T`
fn find_callback(sig: &Signature) -> syn::Result<Option<(usize, Type)>> {
    let mut found = None;
    for (index, input) in sig.inputs.iter().skip(1).enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Some(body) = callback_body(&pat_type.ty) else {
            continue;
        };
        if found.is_some() {
            return Err(syn::Error::new_spanned(pat_type, "only one callback parameter is allowed"));
        }
        found = Some((index, body.clone()));
    }
    Ok(found)
}

fn callback_body(ty: &Type) -> Option<&Type> {
    let Type::ImplTrait(impl_trait) = ty else {
        return None;
    };
    impl_trait.bounds.iter().find_map(|bound| match bound {
        TypeParamBound::Trait(bound) => {
            let segment = bound.path.segments.last()?;
            if segment.ident != "Callback" {
                return None;
            }
            match &segment.arguments {
                PathArguments::AngleBracketed(args) if args.args.len() == 1 => match &args.args[0] {
                    GenericArgument::Type(body) => Some(body),
                    _ => None,
                },
                _ => None,
            }
        }
        _ => None,
    })
}

/// 若 `ty` 形如 `Name<T>`，返回 `T`
pub fn single_generic<'a>(ty: &'a Type, name: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != name {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match &args.args[0] {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
