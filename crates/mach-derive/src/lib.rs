//! Mach Derive Macros: Generated Stand-ins
//!
//! Rust has no runtime proxies, so every capability set (trait) needs an
//! adapter that turns method calls into `(method, arguments)` events for a
//! `mach::MockDispatcher`. This crate generates that adapter.
//!
//! # Example
//!
//! ```ignore
//! #[mach::mock]
//! trait Rocket {
//!     fn throttle(&self, value: i32);
//!     fn ask_mission_control(&self, question: &str) -> String;
//! }
//!
//! // Generates `RocketMock`, implementing `Rocket` and `mach::StandIn`
//! let engine = mach::MockEngine::new();
//! let rocket: RocketMock = engine.mock("rocket");
//! ```
//!
//! # Attributes
//!
//! - `#[mock(name = "CustomName")]` - Override the generated struct name
//!   (defaults to the trait name followed by `Mock`)
//!
//! # Restrictions
//!
//! - Receivers must be `&self` or `&mut self`
//! - Methods must not be generic, `async`, or return references
//! - Reference arguments are recorded through `ToOwned` (`&str` as `String`)

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote, ToTokens};
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, FnArg, Ident, ItemTrait, Lit, Meta, Pat, ReturnType, TraitItem,
    TraitItemFn, Type,
};

/// Generate a stand-in struct for a trait.
///
/// The trait itself is emitted unchanged. Alongside it the macro emits:
///
/// - `pub struct <Trait>Mock` holding a `mach::MockDispatcher`
/// - `impl mach::StandIn for <Trait>Mock`
/// - `impl <Trait> for <Trait>Mock`, forwarding every method to the dispatcher
/// - `PartialEq`, `Debug` and `Display` delegating to the dispatcher
#[proc_macro_attribute]
pub fn mock(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_trait = parse_macro_input!(item as ItemTrait);
    let name_override = if attr.is_empty() {
        None
    } else {
        let meta = parse_macro_input!(attr as Meta);
        match extract_name(&meta) {
            Ok(name) => Some(name),
            Err(err) => return err.to_compile_error().into(),
        }
    };

    match expand_mock(&item_trait, name_override) {
        Ok(stand_in) => TokenStream::from(quote! {
            #item_trait
            #stand_in
        }),
        Err(err) => {
            let err = err.to_compile_error();
            TokenStream::from(quote! {
                #item_trait
                #err
            })
        }
    }
}

fn expand_mock(item_trait: &ItemTrait, name_override: Option<String>) -> syn::Result<TokenStream2> {
    if !item_trait.generics.params.is_empty() {
        return Err(syn::Error::new(
            item_trait.generics.span(),
            "mach::mock does not support generic traits",
        ));
    }

    let trait_ident = &item_trait.ident;
    let vis = &item_trait.vis;
    let mock_ident = name_override.map_or_else(
        || format_ident!("{}Mock", trait_ident),
        |name| format_ident!("{}", name),
    );
    let trait_name = trait_ident.to_string();

    let methods = item_trait
        .items
        .iter()
        .map(|item| match item {
            TraitItem::Fn(method) => expand_method(&trait_name, method),
            other => Err(syn::Error::new(
                other.span(),
                "mach::mock only supports traits made of methods",
            )),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let doc = format!("Stand-in for [`{trait_name}`], generated by `mach::mock`");

    Ok(quote! {
        #[doc = #doc]
        #vis struct #mock_ident {
            dispatcher: ::mach::MockDispatcher,
        }

        impl ::mach::StandIn for #mock_ident {
            const CAPABILITY: &'static str = concat!(module_path!(), "::", #trait_name);

            fn from_dispatcher(dispatcher: ::mach::MockDispatcher) -> Self {
                Self { dispatcher }
            }

            fn dispatcher(&self) -> &::mach::MockDispatcher {
                &self.dispatcher
            }
        }

        impl ::std::cmp::PartialEq for #mock_ident {
            fn eq(&self, other: &Self) -> bool {
                self.dispatcher == other.dispatcher
            }
        }

        impl ::std::fmt::Debug for #mock_ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.dispatcher, f)
            }
        }

        impl ::std::fmt::Display for #mock_ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.dispatcher, f)
            }
        }

        impl #trait_ident for #mock_ident {
            #(#methods)*
        }
    })
}

fn expand_method(trait_name: &str, method: &TraitItemFn) -> syn::Result<TokenStream2> {
    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new(
            sig.asyncness.span(),
            "mach::mock does not support async methods",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "mach::mock does not support generic methods",
        ));
    }

    let mut receiver = None;
    let mut params = Vec::new();
    for (index, input) in sig.inputs.iter().enumerate() {
        match input {
            FnArg::Receiver(recv) => {
                if recv.reference.is_none() {
                    return Err(syn::Error::new(
                        recv.span(),
                        "mach::mock requires a `&self` or `&mut self` receiver",
                    ));
                }
                receiver = Some(recv);
            }
            FnArg::Typed(typed) => {
                let ident = match typed.pat.as_ref() {
                    Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                        pat.ident.clone()
                    }
                    _ => format_ident!("arg{}", index),
                };
                params.push((ident, typed.ty.as_ref().clone()));
            }
        }
    }
    let Some(receiver) = receiver else {
        return Err(syn::Error::new(
            sig.span(),
            "mach::mock requires a `&self` or `&mut self` receiver",
        ));
    };

    let output_ty = match &sig.output {
        ReturnType::Default => None,
        ReturnType::Type(_, ty) if is_unit(ty) => None,
        ReturnType::Type(_, ty) => {
            if matches!(ty.as_ref(), Type::Reference(_) | Type::ImplTrait(_)) {
                return Err(syn::Error::new(
                    ty.span(),
                    "mach::mock cannot return references or `impl Trait`",
                ));
            }
            Some(ty.as_ref().clone())
        }
    };

    let name = &sig.ident;
    let method_name = name.to_string();
    let signature = render_signature(trait_name, method, &params);
    let descriptor = if output_ty.is_some() {
        quote!(::mach::Method::new)
    } else {
        quote!(::mach::Method::unit)
    };

    let param_decls = params.iter().map(|(ident, ty)| quote!(#ident: #ty));
    let values = params.iter().map(|(ident, ty)| to_value(ident, ty));
    let output = &sig.output;
    let attrs = method
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"));

    let body = match &output_ty {
        Some(ty) => quote! {
            self.dispatcher.call::<#ty>(METHOD, args)
        },
        None => quote! {
            self.dispatcher.call_unit(METHOD, args)
        },
    };

    Ok(quote! {
        #(#attrs)*
        fn #name(#receiver, #(#param_decls),*) #output {
            const METHOD: ::mach::Method = #descriptor(
                concat!(module_path!(), "::", #trait_name),
                #method_name,
                #signature,
            );
            let args: ::std::vec::Vec<::mach::Value> = ::std::vec![#(#values),*];
            #body
        }
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract the `name` from `#[mock(name = "...")]`
fn extract_name(meta: &Meta) -> syn::Result<String> {
    if let Meta::NameValue(nv) = meta {
        if nv.path.is_ident("name") {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: Lit::Str(s), ..
            }) = &nv.value
            {
                return Ok(s.value());
            }
        }
    }
    Err(syn::Error::new(
        meta.span(),
        "expected `#[mock]` or `#[mock(name = \"...\")]`",
    ))
}

/// Expression turning a parameter into a `mach::Value`
fn to_value(ident: &Ident, ty: &Type) -> TokenStream2 {
    if matches!(ty, Type::Reference(_)) {
        quote!(::mach::Value::new(::std::borrow::ToOwned::to_owned(&*#ident)))
    } else {
        quote!(::mach::Value::new(#ident))
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Render `fn Trait::name(&self, a: A) -> R` for failure messages
fn render_signature(trait_name: &str, method: &TraitItemFn, params: &[(Ident, Type)]) -> String {
    let sig = &method.sig;
    let mut parts = Vec::with_capacity(params.len() + 1);
    for input in &sig.inputs {
        if let FnArg::Receiver(recv) = input {
            parts.push(tidy_tokens(&recv.to_token_stream().to_string()));
        }
    }
    for (ident, ty) in params {
        parts.push(format!(
            "{}: {}",
            ident,
            tidy_tokens(&ty.to_token_stream().to_string())
        ));
    }

    let output = match &sig.output {
        ReturnType::Default => String::new(),
        ReturnType::Type(_, ty) => format!(" -> {}", tidy_tokens(&ty.to_token_stream().to_string())),
    };

    format!(
        "fn {}::{}({}){}",
        trait_name,
        sig.ident,
        parts.join(", "),
        output
    )
}

/// Collapse the spacing `proc_macro2` puts between tokens
fn tidy_tokens(s: &str) -> String {
    const RULES: [(&str, &str); 11] = [
        (" ::", "::"),
        (":: ", "::"),
        (" <", "<"),
        ("< ", "<"),
        (" >", ">"),
        ("& ", "&"),
        (" ,", ","),
        ("( ", "("),
        (" )", ")"),
        ("[ ", "["),
        (" ]", "]"),
    ];
    let mut tidy = s.to_string();
    for (from, to) in RULES {
        while tidy.contains(from) {
            tidy = tidy.replace(from, to);
        }
    }
    tidy.replace("->", " -> ").replace("  ", " ")
}
