//! Procedural macros for declargs
//!
//! `#[derive(CommandLine)]` turns an annotated configuration struct into a
//! two-phase declaration: `declare_with` registers every field as a flag or
//! command node, `assign_with` extracts the parsed values back into the
//! struct. Field behavior is controlled with `#[cli(...)]` attributes; see
//! the declargs crate documentation for the full key table.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Error, Field, Fields, GenericArgument, LitBool, LitInt,
    LitStr, PathArguments, Type,
};

#[proc_macro_derive(CommandLine, attributes(cli))]
pub fn derive_command_line(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(|e| e.to_compile_error()).into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(&input.ident, "CommandLine can only be derived for structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new_spanned(&input.ident, "CommandLine requires named fields"));
    };

    let mut declares: Vec<TokenStream2> = Vec::new();
    let mut assigns: Vec<TokenStream2> = Vec::new();
    for field in &fields.named {
        let meta = FieldMeta::parse(field)?;
        if meta.ignore {
            continue;
        }
        let (declare, assign) = expand_field(field, &meta)?;
        declares.push(declare);
        assigns.push(assign);
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::declargs::CommandLine for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn declare_with(
                parser: &mut ::declargs::Parser,
                ctx: &::declargs::DeclContext,
            ) -> ::declargs::Result<()> {
                #(#declares)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn assign_with(
                &mut self,
                parser: &::declargs::Parser,
                ctx: &::declargs::DeclContext,
            ) -> ::declargs::Result<()> {
                #(#assigns)*
                Ok(())
            }
        }
    })
}

/// Parsed `#[cli(...)]` attribute state for one field.
#[derive(Default)]
struct FieldMeta {
    name: Option<String>,
    short: Option<String>,
    desc: Option<String>,
    name_key: Option<String>,
    desc_key: Option<String>,
    kind: Option<String>,
    required: bool,
    default: Option<String>,
    paths: Vec<String>,
    accepted: Vec<(String, String)>,
    validators: Option<String>,
    pos: Option<usize>,
    secure: bool,
    prompt: Option<String>,
    command: bool,
    nested: bool,
    capacity: Option<i64>,
    ignore: bool,
}

impl FieldMeta {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut meta = FieldMeta::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("cli") {
                continue;
            }
            attr.parse_nested_meta(|nested| {
                let path = &nested.path;
                if path.is_ident("name") {
                    meta.name = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("short") {
                    meta.short = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("desc") {
                    meta.desc = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("name_key") {
                    meta.name_key = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("desc_key") {
                    meta.desc_key = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("kind") {
                    meta.kind = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("required") {
                    meta.required = parse_bool_value(&nested)?;
                } else if path.is_ident("default") {
                    meta.default = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("path") {
                    let raw = nested.value()?.parse::<LitStr>()?.value();
                    meta.paths =
                        raw.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect();
                } else if path.is_ident("accepted") {
                    let mut pattern = None;
                    let mut desc = None;
                    nested.parse_nested_meta(|inner| {
                        if inner.path.is_ident("pattern") {
                            pattern = Some(inner.value()?.parse::<LitStr>()?.value());
                        } else if inner.path.is_ident("desc") {
                            desc = Some(inner.value()?.parse::<LitStr>()?.value());
                        } else {
                            return Err(inner.error("expected `pattern` or `desc`"));
                        }
                        Ok(())
                    })?;
                    let pattern = pattern
                        .ok_or_else(|| nested.error("accepted(...) requires a `pattern`"))?;
                    let desc = desc.unwrap_or_else(|| pattern.clone());
                    meta.accepted.push((pattern, desc));
                } else if path.is_ident("validators") {
                    meta.validators = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("pos") {
                    meta.pos = Some(nested.value()?.parse::<LitInt>()?.base10_parse()?);
                } else if path.is_ident("secure") {
                    meta.secure = parse_bool_value(&nested)?;
                } else if path.is_ident("prompt") {
                    meta.prompt = Some(nested.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("command") {
                    meta.command = parse_bool_value(&nested)?;
                } else if path.is_ident("nested") {
                    meta.nested = parse_bool_value(&nested)?;
                } else if path.is_ident("capacity") {
                    meta.capacity = Some(nested.value()?.parse::<LitInt>()?.base10_parse()?);
                } else if path.is_ident("ignore") {
                    meta.ignore = parse_bool_value(&nested)?;
                } else {
                    return Err(nested.error("unknown #[cli(...)] attribute"));
                }
                Ok(())
            })?;
        }
        Ok(meta)
    }
}

// bare markers (`required`) and explicit forms (`required = true`) both work
fn parse_bool_value(nested: &syn::meta::ParseNestedMeta) -> syn::Result<bool> {
    if nested.input.peek(syn::Token![=]) {
        Ok(nested.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

/// Structural shape of a field type, by syntax.
enum Shape<'a> {
    Bool,
    VecOf(&'a Type),
    OptionOf(&'a Type),
    Plain(&'a Type),
}

fn classify(ty: &Type) -> Shape<'_> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            let ident = segment.ident.to_string();
            match ident.as_str() {
                "bool" => return Shape::Bool,
                "Vec" | "Option" => {
                    if let PathArguments::AngleBracketed(args) = &segment.arguments {
                        if let Some(GenericArgument::Type(inner)) = args.args.first() {
                            return if ident == "Vec" {
                                Shape::VecOf(inner)
                            } else {
                                Shape::OptionOf(inner)
                            };
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Shape::Plain(ty)
}

/// Tokens computing the canonical leaf name at runtime (explicit attribute
/// name, or the parser's flag-name converter over the field name).
fn leaf_tokens(field_name: &str, meta: &FieldMeta) -> TokenStream2 {
    match &meta.name {
        Some(explicit) => quote! { #explicit.to_string() },
        None => quote! { parser.convert_flag_name(#field_name) },
    }
}

fn paths_tokens(meta: &FieldMeta) -> TokenStream2 {
    let paths = &meta.paths;
    quote! { ctx.paths_for(&[#(#paths.to_string()),*]) }
}

fn expand_field(field: &Field, meta: &FieldMeta) -> syn::Result<(TokenStream2, TokenStream2)> {
    let ident = field.ident.as_ref().expect("named field");
    let field_name = ident.to_string();
    let ty = &field.ty;

    if meta.command {
        return expand_command_field(field, meta);
    }
    if meta.nested {
        return expand_nested_field(field, meta);
    }

    // scalar leaf
    let shape = classify(ty);
    let ctor = match meta.kind.as_deref() {
        Some("single") => quote! { ::declargs::Argument::single() },
        Some("chained") => quote! { ::declargs::Argument::chained() },
        Some("standalone") => {
            if !matches!(shape, Shape::Bool) {
                return Err(Error::new_spanned(ty, "standalone flags require a bool field"));
            }
            quote! { ::declargs::Argument::standalone() }
        }
        Some("file") => quote! { ::declargs::Argument::file() },
        Some(other) => {
            return Err(Error::new_spanned(
                field,
                format!("unknown kind '{other}' (expected single, chained, standalone, file)"),
            ))
        }
        None => match shape {
            Shape::Bool => quote! { ::declargs::Argument::standalone() },
            Shape::VecOf(_) => quote! { ::declargs::Argument::chained() },
            _ => quote! { ::declargs::Argument::single() },
        },
    };

    let leaf = leaf_tokens(&field_name, meta);
    let paths = paths_tokens(meta);

    let mut configure: Vec<TokenStream2> = Vec::new();
    if let Some(short) = &meta.short {
        configure.push(quote! { __arg = __arg.short(#short); });
    }
    if let Some(desc) = &meta.desc {
        configure.push(quote! { __arg = __arg.description(#desc); });
    }
    if let Some(key) = &meta.name_key {
        configure.push(quote! { __arg = __arg.name_key(#key); });
    }
    if let Some(key) = &meta.desc_key {
        configure.push(quote! { __arg = __arg.desc_key(#key); });
    }
    if meta.required {
        configure.push(quote! { __arg = __arg.required(true); });
    }
    if let Some(default) = &meta.default {
        configure.push(quote! { __arg = __arg.default_value(#default); });
    }
    if let Some(pos) = meta.pos {
        configure.push(quote! { __arg = __arg.position(#pos); });
    }
    if meta.secure {
        let prompt = match &meta.prompt {
            Some(p) => quote! { Some(#p.to_string()) },
            None => quote! { None },
        };
        configure.push(quote! { __arg = __arg.secure(#prompt); });
    }
    for (pattern, desc) in &meta.accepted {
        configure.push(quote! { __arg = __arg.accepted(#pattern, #desc); });
    }
    if let Some(spec) = &meta.validators {
        configure.push(quote! {
            for __v in ::declargs::validate::parse_validators(#spec)? {
                __arg = __arg.validator(__v);
            }
        });
    }
    if let Some(capacity) = meta.capacity {
        configure.push(quote! {
            let __cap = parser.check_capacity(#field_name, #capacity)?;
            __arg = __arg.capacity(__cap);
        });
    }

    let declare = quote! {
        {
            let __leaf = #leaf;
            let __name = ctx.flag_name(&__leaf);
            let __paths = #paths;
            let __path_refs: ::std::vec::Vec<&str> =
                __paths.iter().map(|p| p.as_str()).collect();
            #[allow(unused_mut)]
            let mut __arg = #ctor;
            #(#configure)*
            parser.add_flag_to(&__name, __arg, &__path_refs)?;
        }
    };

    let assign = match shape {
        Shape::VecOf(inner) => quote! {
            {
                let __leaf = #leaf;
                let __name = ctx.flag_name(&__leaf);
                let __paths = #paths;
                if parser.get_scoped(&__name, &__paths).is_some() {
                    let mut __out = ::std::vec::Vec::new();
                    for __fragment in parser.get_list_scoped(&__name, &__paths) {
                        __out.push(
                            <#inner as ::declargs::FromArgValue>::from_arg_value(&__fragment)
                                .map_err(|__e| {
                                    ::declargs::ParseError::processing_field(__name.clone(), __e)
                                })?,
                        );
                    }
                    self.#ident = __out;
                }
            }
        },
        _ => quote! {
            {
                let __leaf = #leaf;
                let __name = ctx.flag_name(&__leaf);
                let __paths = #paths;
                if let Some(__value) = parser.get_scoped(&__name, &__paths) {
                    self.#ident = <#ty as ::declargs::FromArgValue>::from_arg_value(__value)
                        .map_err(|__e| {
                            ::declargs::ParseError::processing_field(__name.clone(), __e)
                        })?;
                }
            }
        },
    };

    Ok((declare, assign))
}

fn expand_nested_field(field: &Field, meta: &FieldMeta) -> syn::Result<(TokenStream2, TokenStream2)> {
    let ident = field.ident.as_ref().expect("named field");
    let field_name = ident.to_string();
    let leaf = leaf_tokens(&field_name, meta);

    match classify(&field.ty) {
        Shape::Plain(inner_ty) => {
            let declare = quote! {
                {
                    let __leaf = #leaf;
                    <#inner_ty as ::declargs::CommandLine>::declare_with(
                        parser,
                        &ctx.child_field(&__leaf),
                    )?;
                }
            };
            let assign = quote! {
                {
                    let __leaf = #leaf;
                    ::declargs::CommandLine::assign_with(&mut self.#ident, parser, &ctx.child_field(&__leaf))?;
                }
            };
            Ok((declare, assign))
        }
        Shape::OptionOf(inner_ty) => {
            let declare = quote! {
                {
                    let __leaf = #leaf;
                    <#inner_ty as ::declargs::CommandLine>::declare_with(
                        parser,
                        &ctx.child_field(&__leaf),
                    )?;
                }
            };
            let assign = quote! {
                {
                    let __leaf = #leaf;
                    let __child = ctx.child_field(&__leaf);
                    if parser.any_set_under(__child.prefix(), __child.command_path()) {
                        let mut __value = <#inner_ty as ::std::default::Default>::default();
                        ::declargs::CommandLine::assign_with(&mut __value, parser, &__child)?;
                        self.#ident = Some(__value);
                    }
                }
            };
            Ok((declare, assign))
        }
        Shape::VecOf(inner_ty) => {
            let Some(capacity) = meta.capacity else {
                return Err(Error::new_spanned(
                    field,
                    "nested Vec fields require #[cli(capacity = N)]",
                ));
            };
            let declare = quote! {
                {
                    let __leaf = #leaf;
                    let __child = ctx.child_field(&__leaf);
                    let __cap = parser.check_capacity(#field_name, #capacity)?;
                    for __i in 0..__cap {
                        <#inner_ty as ::declargs::CommandLine>::declare_with(
                            parser,
                            &__child.child_index(__i),
                        )?;
                    }
                }
            };
            let assign = quote! {
                {
                    let __leaf = #leaf;
                    let __child = ctx.child_field(&__leaf);
                    let __cap = parser.check_capacity(#field_name, #capacity)?;
                    self.#ident.clear();
                    for __i in 0..__cap {
                        let mut __element = <#inner_ty as ::std::default::Default>::default();
                        ::declargs::CommandLine::assign_with(&mut __element, parser, &__child.child_index(__i))?;
                        self.#ident.push(__element);
                    }
                }
            };
            Ok((declare, assign))
        }
        Shape::Bool => Err(Error::new_spanned(field, "bool fields cannot be nested structs")),
    }
}

fn expand_command_field(field: &Field, meta: &FieldMeta) -> syn::Result<(TokenStream2, TokenStream2)> {
    let ident = field.ident.as_ref().expect("named field");
    let field_name = ident.to_string();
    let ty = &field.ty;
    if !matches!(classify(ty), Shape::Plain(_)) {
        return Err(Error::new_spanned(field, "command fields must be plain struct types"));
    }

    let leaf = leaf_tokens(&field_name, meta);
    let mut configure: Vec<TokenStream2> = Vec::new();
    if let Some(desc) = &meta.desc {
        configure.push(quote! { __cmd = __cmd.description(#desc); });
    }
    if let Some(key) = &meta.name_key {
        configure.push(quote! { __cmd = __cmd.name_key(#key); });
    }
    if let Some(key) = &meta.desc_key {
        configure.push(quote! { __cmd = __cmd.desc_key(#key); });
    }

    let declare = quote! {
        {
            let __leaf = #leaf;
            #[allow(unused_mut)]
            let mut __cmd = ::declargs::Command::new(&__leaf);
            #(#configure)*
            parser.add_subcommand(ctx.command_path(), __cmd)?;
            <#ty as ::declargs::CommandLine>::declare_with(parser, &ctx.child_command(&__leaf))?;
        }
    };
    let assign = quote! {
        {
            let __leaf = #leaf;
            ::declargs::CommandLine::assign_with(&mut self.#ident, parser, &ctx.child_command(&__leaf))?;
        }
    };
    Ok((declare, assign))
}
