use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, ItemFn, Pat, Type, parse_macro_input};

/// Derive a `RuntimeMethod` implementation from a function.
///
/// The function parameters become positional arguments, extracted in
/// order with type validation generated from the parameter types. The
/// generated type is named after the function in PascalCase with a
/// `Method` suffix and is registered like any other method:
///
/// ```ignore
/// #[runtime_method(name = "changeToDoge")]
/// fn change_to_doge(_input: String) -> Result<Value, EvalError> {
///     Ok(Value::from("doge"))
/// }
///
/// let runtime = Runtime::new().with(ChangeToDogeMethod);
/// ```
///
/// # Attribute syntax
///
/// ```ignore
/// #[runtime_method]                    // called by the function's name
/// #[runtime_method(name = "toDoge")]   // called as `__runtime.toDoge(..)`
/// ```
///
/// # Supported parameter types
/// - `Value`: accepts anything, a missing argument becomes null
/// - `String`: the argument must be a string
/// - `f64`: the argument must be a number
/// - `bool`: the argument must be a bool
/// - `Vec<Value>`: the argument must be an array
///
/// The function must return `Result<Value, EvalError>`.
#[proc_macro_attribute]
pub fn runtime_method(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MethodArgs);
    let input_fn = parse_macro_input!(item as ItemFn);

    match expand(args, &input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: MethodArgs, input_fn: &ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let fn_name = &input_fn.sig.ident;
    let struct_name = format_ident!("{}Method", to_pascal_case(&fn_name.to_string()));
    let method_name = args.name.unwrap_or_else(|| fn_name.to_string());
    let vis = &input_fn.vis;

    let mut param_extractions = Vec::new();
    let mut param_names = Vec::new();
    let mut param_types = Vec::new();
    let mut param_defs = Vec::new();

    for (index, fn_arg) in input_fn.sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = fn_arg else {
            return Err(syn::Error::new_spanned(
                fn_arg,
                "runtime methods cannot take `self`",
            ));
        };
        let Pat::Ident(ident) = &*pat_type.pat else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "expected a plain identifier pattern",
            ));
        };

        let param_name = &ident.ident;
        let param_name_str = param_name.to_string();
        let extraction = generate_arg_extraction(&param_name_str, &pat_type.ty, index)?;

        param_extractions.push(extraction.code);
        param_names.push(param_name.clone());
        param_types.push(extraction.rust_type);

        let value_type = extraction.value_type;
        let required = extraction.required;
        param_defs.push(quote! {
            sugarml_gen::runtime::ParamDef {
                name: #param_name_str.to_string(),
                expected_type: Some(#value_type),
                required: #required,
            }
        });
    }

    let fn_body = &input_fn.block;

    Ok(quote! {
        #vis struct #struct_name;

        impl #struct_name {
            fn execute(#(#param_names: #param_types),*) -> Result<sugarml_gen::Value, sugarml_gen::EvalError> {
                #fn_body
            }
        }

        impl sugarml_gen::runtime::RuntimeMethod for #struct_name {
            fn call(
                &self,
                args: Vec<sugarml_gen::Value>,
            ) -> Result<sugarml_gen::Value, sugarml_gen::EvalError> {
                #(#param_extractions)*
                Self::execute(#(#param_names),*)
            }

            fn signature(&self) -> sugarml_gen::runtime::MethodSignature {
                sugarml_gen::runtime::MethodSignature {
                    name: #method_name.to_string(),
                    params: vec![#(#param_defs),*],
                }
            }
        }
    })
}

struct Extraction {
    code: proc_macro2::TokenStream,
    value_type: proc_macro2::TokenStream,
    rust_type: proc_macro2::TokenStream,
    required: bool,
}

/// Generate extraction code for one positional argument.
fn generate_arg_extraction(name: &str, ty: &Type, index: usize) -> syn::Result<Extraction> {
    let ident = format_ident!("{}", name);
    let type_str = quote!(#ty).to_string().replace(' ', "");

    if type_str == "Value" {
        return Ok(Extraction {
            code: quote! {
                let #ident = args.get(#index).cloned().unwrap_or(sugarml_gen::Value::Null);
            },
            value_type: quote! { sugarml_gen::runtime::ValueType::Any },
            rust_type: quote! { sugarml_gen::Value },
            required: false,
        });
    }

    let (variant, expected, value_type, rust_type, take) = match type_str.as_str() {
        "String" => (
            quote! { String },
            "string",
            quote! { String },
            quote! { String },
            quote! { v.clone() },
        ),
        "f64" => (
            quote! { Number },
            "number",
            quote! { Number },
            quote! { f64 },
            quote! { *v },
        ),
        "bool" => (
            quote! { Bool },
            "bool",
            quote! { Bool },
            quote! { bool },
            quote! { *v },
        ),
        "Vec<Value>" => (
            quote! { Array },
            "array",
            quote! { Array },
            quote! { Vec<sugarml_gen::Value> },
            quote! { v.clone() },
        ),
        other => {
            return Err(syn::Error::new_spanned(
                ty,
                format!(
                    "unsupported parameter type `{other}`, expected Value, String, f64, bool or Vec<Value>"
                ),
            ));
        }
    };

    Ok(Extraction {
        code: quote! {
            let #ident = match args.get(#index) {
                Some(sugarml_gen::Value::#variant(v)) => #take,
                Some(other) => return Err(sugarml_gen::EvalError::type_error(#expected, other.type_name())),
                None => return Err(sugarml_gen::EvalError::new(
                    sugarml_gen::EvalErrorKind::TypeError,
                    format!("missing required argument at position {}: {}", #index, #name),
                )),
            };
        },
        value_type: quote! { sugarml_gen::runtime::ValueType::#value_type },
        rust_type,
        required: true,
    })
}

fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

// -- Attribute arg parsing -----------------------------------------------

struct MethodArgs {
    name: Option<String>,
}

impl syn::parse::Parse for MethodArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(MethodArgs { name: None });
        }
        let ident: syn::Ident = input.parse()?;
        if ident != "name" {
            return Err(syn::Error::new(ident.span(), "expected `name`"));
        }
        input.parse::<syn::Token![=]>()?;
        let lit: syn::LitStr = input.parse()?;
        Ok(MethodArgs {
            name: Some(lit.value()),
        })
    }
}
