//! Procedural macros for routeshim.
//!
//! `#[controller]` turns an inherent `impl` block into a compile-time action table. Every
//! `pub fn` with a receiver becomes an action named after the method. Arguments typed as a
//! reference receive the request; every other argument is bound by *name* from the route's path
//! variables, falling back to `#[param(default = "...")]`, and is converted with `FromStr`.
//!
//! ```rust,ignore
//! #[derive(Default)]
//! pub struct UserController;
//!
//! #[controller]
//! impl UserController {
//!     pub fn profile(&mut self, req: &mut HandlerRequest, #[param(default = "")] name: String) -> ActionResult {
//!         req.view("user/profile", context! { name })
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, Attribute, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat,
    Result as SynResult, Token, Type, Visibility,
};

struct ControllerArgs {
    name: Option<LitStr>,
}

impl Parse for ControllerArgs {
    fn parse(input: ParseStream) -> SynResult<Self> {
        if input.is_empty() {
            return Ok(ControllerArgs { name: None });
        }
        let ident: Ident = input.parse()?;
        if ident != "name" {
            return Err(syn::Error::new(
                ident.span(),
                "expected `name = \"ControllerName\"`",
            ));
        }
        input.parse::<Token![=]>()?;
        let name: LitStr = input.parse()?;
        Ok(ControllerArgs { name: Some(name) })
    }
}

#[derive(Default)]
struct ParamAttr {
    default: Option<LitStr>,
    rename: Option<LitStr>,
}

/// Removes every `#[param(...)]` attribute from `attrs` and returns the merged options.
fn take_param_attr(attrs: &mut Vec<Attribute>) -> SynResult<ParamAttr> {
    let mut out = ParamAttr::default();
    let mut error: Option<syn::Error> = None;
    attrs.retain(|attr| {
        if !attr.path().is_ident("param") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                out.default = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("name") {
                out.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported #[param] option, expected `default` or `name`"))
            }
        });
        if let Err(e) = parsed {
            match error.as_mut() {
                Some(existing) => existing.combine(e),
                None => error = Some(e),
            }
        }
        false
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

fn strip_param_attrs(method: &mut ImplItemFn) -> SynResult<()> {
    for arg in method.sig.inputs.iter_mut() {
        if let FnArg::Typed(pat_type) = arg {
            take_param_attr(&mut pat_type.attrs)?;
        }
    }
    Ok(())
}

fn type_name(ty: &Type) -> SynResult<String> {
    if let Type::Path(path) = ty {
        if let Some(seg) = path.path.segments.last() {
            return Ok(seg.ident.to_string());
        }
    }
    Err(syn::Error::new(
        ty.span(),
        "#[controller] needs a named type; use #[controller(name = \"...\")]",
    ))
}

fn expand_action(self_ty: &Type, method: &mut ImplItemFn) -> SynResult<TokenStream2> {
    let fn_ident = method.sig.ident.clone();
    let action_name = fn_ident.to_string().trim_start_matches("r#").to_string();
    let wrapper = format_ident!("__routeshim_action_{}", action_name);

    let mut specs = Vec::new();
    let mut lets = Vec::new();
    let mut call_args = Vec::new();
    let mut bound = 0usize;
    let mut saw_request = false;

    for arg in method.sig.inputs.iter_mut() {
        let FnArg::Typed(pat_type) = arg else {
            continue;
        };
        let attr = take_param_attr(&mut pat_type.attrs)?;

        if let Type::Reference(_) = &*pat_type.ty {
            if attr.default.is_some() || attr.rename.is_some() {
                return Err(syn::Error::new(
                    pat_type.span(),
                    "#[param] cannot be used on the request argument",
                ));
            }
            if saw_request {
                return Err(syn::Error::new(
                    pat_type.span(),
                    "an action takes at most one request argument",
                ));
            }
            saw_request = true;
            call_args.push(quote!(&mut *req));
            continue;
        }

        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return Err(syn::Error::new(
                pat_type.pat.span(),
                "action parameters must be plain identifiers",
            ));
        };
        let param_name = match attr.rename {
            Some(lit) => lit.value(),
            None => pat_ident
                .ident
                .to_string()
                .trim_start_matches("r#")
                .to_string(),
        };
        let default = match attr.default {
            Some(lit) => quote!(::core::option::Option::Some(#lit)),
            None => quote!(::core::option::Option::None),
        };
        specs.push(quote! {
            ::routeshim::controller::ParamSpec { name: #param_name, default: #default }
        });

        let ty = &pat_type.ty;
        let local = format_ident!("__arg{}", bound);
        lets.push(quote! { let #local: #ty = args.parse(#bound)?; });
        call_args.push(quote!(#local));
        bound += 1;
    }

    Ok(quote! {
        {
            #[allow(unused_variables, non_snake_case)]
            fn #wrapper(
                req: &mut ::routeshim::dispatcher::HandlerRequest,
                args: &::routeshim::controller::BoundArgs,
            ) -> ::routeshim::controller::ActionResult {
                #(#lets)*
                #[allow(unused_mut)]
                let mut controller = <#self_ty as ::core::default::Default>::default();
                ::routeshim::controller::IntoActionResult::into_action_result(
                    controller.#fn_ident(#(#call_args),*),
                )
            }
            ::routeshim::controller::Action::new(#action_name, ::std::vec![#(#specs),*], #wrapper)
        }
    })
}

fn expand(args: ControllerArgs, input: &mut ItemImpl) -> SynResult<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[controller] does not support generic impl blocks",
        ));
    }
    if input.trait_.is_some() {
        return Err(syn::Error::new(
            input.span(),
            "#[controller] goes on an inherent impl block",
        ));
    }

    let self_ty = (*input.self_ty).clone();
    let controller_name = match args.name {
        Some(lit) => lit.value(),
        None => type_name(&self_ty)?,
    };

    let mut actions = Vec::new();
    for item in input.items.iter_mut() {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let is_action =
            matches!(method.vis, Visibility::Public(_)) && method.sig.receiver().is_some();
        if is_action {
            actions.push(expand_action(&self_ty, method)?);
        } else {
            strip_param_attrs(method)?;
        }
    }

    Ok(quote! {
        #input

        impl ::routeshim::controller::Controller for #self_ty {
            const NAME: &'static str = #controller_name;

            fn actions() -> ::std::vec::Vec<::routeshim::controller::Action> {
                ::std::vec![#(#actions),*]
            }
        }
    })
}

/// Generates the [`Controller`] action table for an inherent impl block.
///
/// [`Controller`]: ../routeshim/controller/trait.Controller.html
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ControllerArgs);
    let mut input = parse_macro_input!(item as ItemImpl);
    match expand(args, &mut input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
