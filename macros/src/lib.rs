//! Derive macros for Action Chain
//!
//! This crate provides procedural macros to reduce boilerplate when defining
//! action types for chains.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Implements `action_chain_core::Action` for enums
//!
//! # Example
//!
//! ```ignore
//! use action_chain_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     AddTodo { title: String },
//!
//!     #[action(rename = "todo/toggled")]
//!     Toggled(u32),
//! }
//!
//! // Generated:
//! assert_eq!(TodoAction::Toggled(1).action_type(), "todo/toggled");
//! assert_eq!(TodoAction::ACTION_TYPES, &["AddTodo", "todo/toggled"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Variant};

/// Derive macro for Action enums
///
/// Implements `action_chain_core::Action` with:
/// - `action_type()` - the variant name, or the `rename` given in `#[action(...)]`
/// - `payload()` - the action itself (`type Payload = Self`)
///
/// It also generates an `ACTION_TYPES` constant listing every type string in
/// declaration order.
///
/// # Attributes
///
/// - `#[action(rename = "...")]` - Use a custom type string for a variant
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type, or an enum without variants
/// - A variant is renamed to an empty string
/// - Two variants resolve to the same type string
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum SessionAction {
///     Login { user: String },
///
///     #[action(rename = "session/expired")]
///     Expired,
/// }
///
/// let chain = ActionChain::new()
///     .chain("Login", |_: &SessionAction, action: &SessionAction| {
///         NextAction::from(SessionAction::Expired)
///     });
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_action(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_action(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Action)] can only be used on enums",
        ));
    };

    if data_enum.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Action)] needs at least one variant",
        ));
    }

    let mut seen = HashSet::new();
    let mut type_names = Vec::with_capacity(data_enum.variants.len());
    let mut arms = Vec::with_capacity(data_enum.variants.len());

    for variant in &data_enum.variants {
        let type_name = action_type_name(variant)?;
        if !seen.insert(type_name.clone()) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("action type `{type_name}` is used by more than one variant"),
            ));
        }

        let variant_name = &variant.ident;
        arms.push(match &variant.fields {
            Fields::Named(_) => quote! { Self::#variant_name { .. } => #type_name, },
            Fields::Unnamed(_) => quote! { Self::#variant_name(..) => #type_name, },
            Fields::Unit => quote! { Self::#variant_name => #type_name, },
        });
        type_names.push(type_name);
    }

    Ok(quote! {
        impl #impl_generics ::action_chain_core::Action for #name #ty_generics #where_clause {
            type Payload = Self;

            fn action_type(&self) -> &str {
                match self {
                    #(#arms)*
                }
            }

            fn payload(&self) -> &Self {
                self
            }
        }

        impl #impl_generics #name #ty_generics #where_clause {
            /// Every action type string of this enum, in declaration order
            pub const ACTION_TYPES: &'static [&'static str] = &[#(#type_names),*];
        }
    })
}

/// The type string for a variant: its name unless renamed
fn action_type_name(variant: &Variant) -> syn::Result<String> {
    let mut type_name = variant.ident.to_string();

    for attr in variant.attrs.iter().filter(|attr| attr.path().is_ident("action")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(syn::Error::new_spanned(value, "action type must not be empty"));
                }
                type_name = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported action attribute, expected `rename`"))
            }
        })?;
    }

    Ok(type_name)
}
