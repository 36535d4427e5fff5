//! Procedural macros for defining commands
//!
//! This crate provides the `#[command]` attribute macro, which records a
//! function's name, parameters, defaults and documentation so commandr can
//! expose it as a subcommand.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parenthesized,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    Attribute, Expr, FnArg, GenericArgument, Ident, ItemFn, Lit, LitStr, Meta, Pat, PathArguments,
    Token, Type,
};

/// Attribute macro turning a function into a command
///
/// # Usage
///
/// ```ignore
/// /// Greet someone.
/// ///
/// /// Arguments:
/// ///   name - Name to greet.
/// #[command("greet", validate(name = ["Kevin", "Nick"]), transform(name = capitalize))]
/// fn say_greeting(name: String, #[arg(default = "Mr.")] title: String) {
///     println!("Hello, {title} {name}!");
/// }
/// ```
///
/// Alongside the function this generates `say_greeting_callable()`, returning
/// the declared callable, and `say_greeting_command()`, returning a
/// `CommandSpec` ready for registration.
///
/// Parameters must be owned types that deserialize from JSON. A parameter
/// without `#[arg(default = ...)]` is required. The default is any `json!`
/// literal; a `bool` default makes the argument a presence flag.
///
/// The type of a parameter follows from its default, so a required
/// parameter receives the raw text. It must be `String` or `Option<String>`
/// unless a `transform(...)` entry converts the text; anything else is a
/// compile error.
///
/// In `validate(...)`, an array literal becomes `Validator::one_of`, a path or
/// closure becomes `Validator::predicate`, and any other expression must
/// already evaluate to a `Validator`. Each `transform(...)` entry is a
/// function or closure taking the argument name and the raw text.
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as CommandArgs);
    let input = parse_macro_input!(item as ItemFn);

    match expand(args, input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(error) => TokenStream::from(error.to_compile_error()),
    }
}

fn expand(args: CommandArgs, mut input: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &input.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "command functions cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "command functions cannot be generic",
        ));
    }

    let mut params = Vec::new();
    for arg in input.sig.inputs.iter_mut() {
        let typed = match arg {
            FnArg::Typed(typed) => typed,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "command functions cannot take self",
                ))
            }
        };
        let ident = match typed.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.clone(),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "command parameters must be plain identifiers",
                ))
            }
        };
        let default = take_default(&mut typed.attrs)?;
        let transformed = args.transform.iter().any(|rule| rule.argument == ident);
        if default.is_none() && !transformed && !is_text_type(&typed.ty) {
            return Err(syn::Error::new_spanned(
                &typed.ty,
                format!(
                    "required parameter '{}' receives raw text and must be String or \
                     Option<String>; give it #[arg(default = ...)] or a transform",
                    ident
                ),
            ));
        }
        params.push(ParamInfo { ident, default });
    }

    for rule in args.validate.iter().chain(args.transform.iter()) {
        if !params.iter().any(|param| param.ident == rule.argument) {
            return Err(syn::Error::new_spanned(
                &rule.argument,
                format!("'{}' is not a parameter of this command", rule.argument),
            ));
        }
    }

    let vis = &input.vis;
    let fn_ident = &input.sig.ident;
    let fn_name = fn_ident.to_string();
    let callable_ident = format_ident!("{}_callable", fn_ident);
    let command_ident = format_ident!("{}_command", fn_ident);
    let doc = extract_doc_comment(&input.attrs);

    let param_decls = params.iter().map(|param| {
        let name = param.ident.to_string();
        match &param.default {
            Some(tokens) => quote! {
                .param(::commandr::Parameter::optional(#name, ::commandr::json!(#tokens)))
            },
            None => quote! {
                .param(::commandr::Parameter::required(#name))
            },
        }
    });
    let args_ident = if params.is_empty() {
        format_ident!("_args")
    } else {
        format_ident!("args")
    };
    let param_reads = params.iter().map(|param| {
        let name = param.ident.to_string();
        quote! { #args_ident.get(#name)? }
    });

    let name_call = args.name.as_ref().map(|name| quote! { .name(#name) });
    let validate_calls = args.validate.iter().map(|rule| {
        let argument = rule.argument.to_string();
        let validator = validator_expr(&rule.expr);
        quote! { .validate(#argument, #validator) }
    });
    let transform_calls = args.transform.iter().map(|rule| {
        let argument = rule.argument.to_string();
        let expr = &rule.expr;
        quote! { .transform(#argument, #expr) }
    });

    let expanded = quote! {
        #input

        #[allow(dead_code)]
        #vis fn #callable_ident() -> ::commandr::Declared {
            ::commandr::Declared::new(
                ::commandr::Signature::new(#fn_name)
                    #(#param_decls)*,
                #doc,
                |#args_ident: &::commandr::Arguments| -> ::commandr::anyhow::Result<()> {
                    ::commandr::IntoOutcome::into_outcome(#fn_ident(#(#param_reads),*))
                },
            )
        }

        #[allow(dead_code)]
        #vis fn #command_ident() -> ::commandr::CommandSpec {
            ::commandr::CommandSpec::new(#callable_ident())
                #name_call
                #(#validate_calls)*
                #(#transform_calls)*
        }
    };

    Ok(expanded)
}

struct ParamInfo {
    ident: Ident,
    default: Option<TokenStream2>,
}

/// Arguments for the #[command(...)] attribute
#[derive(Default)]
struct CommandArgs {
    name: Option<LitStr>,
    validate: Vec<Rule>,
    transform: Vec<Rule>,
}

/// One `argument = expr` entry inside `validate(...)` or `transform(...)`
struct Rule {
    argument: Ident,
    expr: Expr,
}

impl Parse for Rule {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let argument: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        let expr: Expr = input.parse()?;
        Ok(Rule { argument, expr })
    }
}

impl Parse for CommandArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = CommandArgs::default();

        while !input.is_empty() {
            if input.peek(LitStr) {
                args.name = Some(input.parse()?);
            } else {
                let ident: Ident = input.parse()?;
                match ident.to_string().as_str() {
                    "name" => {
                        input.parse::<Token![=]>()?;
                        args.name = Some(input.parse()?);
                    }
                    "validate" | "transform" => {
                        let content;
                        parenthesized!(content in input);
                        let rules = Punctuated::<Rule, Token![,]>::parse_terminated(&content)?;
                        if ident == "validate" {
                            args.validate.extend(rules);
                        } else {
                            args.transform.extend(rules);
                        }
                    }
                    other => {
                        return Err(syn::Error::new_spanned(
                            ident,
                            format!("unknown attribute: {}", other),
                        ))
                    }
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

/// Wrap a validate rule expression in the matching `Validator` constructor
fn validator_expr(expr: &Expr) -> TokenStream2 {
    match expr {
        Expr::Array(_) => quote! { ::commandr::Validator::one_of(#expr) },
        Expr::Path(_) | Expr::Closure(_) => quote! { ::commandr::Validator::predicate(#expr) },
        other => quote! { #other },
    }
}

/// Remove `#[arg(default = ...)]` from a parameter, returning the default tokens
fn take_default(attrs: &mut Vec<Attribute>) -> syn::Result<Option<TokenStream2>> {
    let mut default = None;
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("arg") {
            kept.push(attr);
            continue;
        }
        let tokens = attr.parse_args_with(|input: ParseStream| {
            let key: Ident = input.parse()?;
            if key != "default" {
                return Err(syn::Error::new_spanned(
                    &key,
                    format!("unknown arg option: {}", key),
                ));
            }
            input.parse::<Token![=]>()?;
            input.parse::<TokenStream2>()
        })?;
        if tokens.is_empty() {
            return Err(syn::Error::new_spanned(attr, "expected a default value"));
        }
        default = Some(tokens);
    }

    *attrs = kept;
    Ok(default)
}

/// Check if type is `String` or `Option<String>`
fn is_text_type(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    if segment.ident == "String" {
        return true;
    }
    if segment.ident == "Option" {
        if let PathArguments::AngleBracketed(args) = &segment.arguments {
            if let Some(GenericArgument::Type(inner)) = args.args.first() {
                return is_text_type(inner) && !is_option(inner);
            }
        }
    }
    false
}

fn is_option(ty: &Type) -> bool {
    matches!(ty, Type::Path(path) if path.path.segments.last().is_some_and(|s| s.ident == "Option"))
}

/// Extract doc comment lines, one leading space removed from each
fn extract_doc_comment(attrs: &[Attribute]) -> String {
    let docs: Vec<String> = attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let Expr::Lit(lit) = &nv.value {
                        if let Lit::Str(s) = &lit.lit {
                            let line = s.value();
                            return Some(line.strip_prefix(' ').unwrap_or(&line).to_string());
                        }
                    }
                }
            }
            None
        })
        .collect();

    docs.join("\n")
}
