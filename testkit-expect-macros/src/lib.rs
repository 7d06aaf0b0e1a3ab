//! Procedural macros for testkit-expect
//!
//! This crate provides the `#[testkit_expect::test]` attribute macro, which
//! registers an async function as a test run by
//! `testkit_expect::run_async_test_with`.
//!
//! # Example
//!
//! ```rust,ignore
//! use testkit_expect::prelude::*;
//!
//! #[testkit_expect::test(timeout = 2.5)]
//! async fn connects(cx: TestContext) -> Result<(), TestError> {
//!     let connected = cx.wait_until(|| server.is_listening()).await;
//!     assert!(connected);
//!     Ok(())
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, ItemFn, Lit, ReturnType, Token, Type,
};

/// Options accepted by the test macro.
struct TestConfig {
    /// Seconds the body is given to settle
    timeout_secs: f64,
    /// Whether an `Err` from the body fails the test
    fail_on_error: bool,
    /// Name reported in failures; defaults to the function name
    description: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 1.0,
            fail_on_error: true,
            description: None,
        }
    }
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "timeout" => {
                    let lit: Lit = input.parse()?;
                    let secs: f64 = match &lit {
                        Lit::Float(f) => f.base10_parse()?,
                        Lit::Int(i) => i.base10_parse()?,
                        _ => {
                            return Err(syn::Error::new_spanned(
                                lit,
                                "timeout must be a number of seconds",
                            ));
                        }
                    };
                    if !secs.is_finite() || secs <= 0.0 {
                        return Err(syn::Error::new_spanned(lit, "timeout must be positive"));
                    }
                    config.timeout_secs = secs;
                }
                "fail_on_error" => {
                    let lit: Lit = input.parse()?;
                    match lit {
                        Lit::Bool(b) => config.fail_on_error = b.value(),
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "fail_on_error must be `true` or `false`",
                            ));
                        }
                    }
                }
                "description" => {
                    let lit: Lit = input.parse()?;
                    match lit {
                        Lit::Str(s) => config.description = Some(s.value()),
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "description must be a string",
                            ));
                        }
                    }
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Determines if a function parameter is requesting the `TestContext`.
fn is_context_param(arg: &FnArg) -> bool {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return segment.ident == "TestContext";
            }
        }
    }
    false
}

/// Registers an async function as a test with a deadline.
///
/// The function runs on a fresh current-thread runtime. It fails if it
/// returns `Err` (unless `fail_on_error = false`), if it records a failure
/// on its `TestContext`, or if it does not finish within `timeout` seconds.
///
/// # Basic Usage
///
/// ```rust,ignore
/// #[testkit_expect::test]
/// async fn test_basic() {
///     tokio::task::yield_now().await;
/// }
/// ```
///
/// # With TestContext Injection
///
/// Add a `cx: TestContext` parameter to receive the test's context:
///
/// ```rust,ignore
/// use testkit_expect::prelude::*;
///
/// #[testkit_expect::test]
/// async fn test_with_context(cx: TestContext) -> Result<(), TestError> {
///     let ready = cx.wait_for(|| Some(42)).await;
///     assert_eq!(ready, Some(42));
///     Ok(())
/// }
/// ```
///
/// # Configuration Options
///
/// - `timeout = 2.5` - Seconds the body is given to settle (default: 1.0)
/// - `fail_on_error = false` - Let the body return `Err` without failing
/// - `description = "..."` - Name used in failure messages
///
/// ```rust,ignore
/// #[testkit_expect::test(timeout = 5, fail_on_error = false)]
/// async fn test_slow_rejection() -> Result<(), TestError> {
///     Err(TestError::new("tolerated"))
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(config, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: TestConfig, input: ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let output = &input.sig.output;

    if input.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &input.sig,
            "test function must be async",
        ));
    }
    if !input.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.sig.generics,
            "test function cannot be generic",
        ));
    }

    let mut params = input.sig.inputs.iter();
    let context_param = params.next();
    if let Some(arg) = context_param {
        if !is_context_param(arg) {
            return Err(syn::Error::new_spanned(
                arg,
                "the only parameter a test can take is a `TestContext`",
            ));
        }
    }
    if let Some(extra) = params.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "the only parameter a test can take is a `TestContext`",
        ));
    }

    let description = config
        .description
        .clone()
        .unwrap_or_else(|| name.to_string());
    let timeout_secs = config.timeout_secs;
    let fail_on_error = config.fail_on_error;

    let inner_params = context_param.map_or_else(|| quote! {}, |arg| quote! { #arg });
    let inner_call = if context_param.is_some() {
        quote! { __testkit_body(cx) }
    } else {
        quote! { __testkit_body() }
    };

    // A unit body is adapted to the fallible shape the runner expects.
    let runner_body = match output {
        ReturnType::Default => quote! {
            |cx: ::testkit_expect::TestContext| async move {
                let _ = &cx;
                #inner_call.await;
                ::core::result::Result::<(), ::testkit_expect::TestError>::Ok(())
            }
        },
        ReturnType::Type(..) => quote! {
            |cx: ::testkit_expect::TestContext| {
                let _ = &cx;
                #inner_call
            }
        },
    };

    Ok(quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis fn #name() {
            async fn __testkit_body(#inner_params) #output #body

            ::testkit_expect::run_async_test_with(
                #description,
                ::testkit_expect::AsyncTestConfig::new()
                    .timeout(::std::time::Duration::from_secs_f64(#timeout_secs))
                    .fail_on_error(#fail_on_error),
                #runner_body,
            );
        }
    })
}
