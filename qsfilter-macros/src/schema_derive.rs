use super::*;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Boolean,
    Numeric,
    Temporal,
    Text,
    List,
}

impl Kind {
    fn parse(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "boolean" | "bool" => Ok(Kind::Boolean),
            "numeric" | "number" => Ok(Kind::Numeric),
            "temporal" | "date" | "datetime" => Ok(Kind::Temporal),
            "text" | "string" => Ok(Kind::Text),
            "list" => Ok(Kind::List),
            other => Err(Error::new(
                lit.span(),
                format!("unknown filter kind '{other}'. Supported kinds: boolean, numeric, temporal, text, list"),
            )),
        }
    }

    fn tokens(self) -> TokenStream2 {
        match self {
            Kind::Boolean => quote! { ::qsfilter::FieldKind::Boolean },
            Kind::Numeric => quote! { ::qsfilter::FieldKind::Numeric },
            Kind::Temporal => quote! { ::qsfilter::FieldKind::Temporal },
            Kind::Text => quote! { ::qsfilter::FieldKind::Text },
            Kind::List => quote! { ::qsfilter::FieldKind::List },
        }
    }
}

struct ParsedField {
    ident: syn::Ident,
    name: String,
    kind: Kind,
    filterable: bool,
    sortable: bool,
    renamed: bool,
}

struct ComputedField {
    name: String,
    kind: Kind,
}

pub(crate) struct ParsedSchema {
    input: DeriveInput,
    fields: Vec<ParsedField>,
    computed: Vec<ComputedField>,
}

impl ParsedSchema {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => &fields.named,
                _ => return Err(Error::new_spanned(input, "FilterSchema only supports structs with named fields")),
            },
            _ => return Err(Error::new_spanned(input, "FilterSchema can only be derived for structs")),
        };

        let computed = parse_computed(&input.attrs)?;

        let mut fields = Vec::new();
        for field in named {
            let Some(ident) = field.ident.clone() else {
                continue;
            };

            let mut skip = false;
            let mut filterable = false;
            let mut sortable = false;
            let mut rename = None;
            let mut kind = None;

            for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("filter")) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("skip") {
                        skip = true;
                    } else if meta.path.is_ident("filterable") {
                        filterable = true;
                    } else if meta.path.is_ident("sortable") {
                        sortable = true;
                    } else if meta.path.is_ident("rename") {
                        let lit: LitStr = meta.value()?.parse()?;
                        rename = Some(lit.value());
                    } else if meta.path.is_ident("kind") {
                        let lit: LitStr = meta.value()?.parse()?;
                        kind = Some(Kind::parse(&lit)?);
                    } else {
                        return Err(meta.error("unsupported filter attribute"));
                    }
                    Ok(())
                })?;
            }

            if skip {
                continue;
            }

            let kind = match kind {
                Some(kind) => kind,
                None => infer_kind(&field.ty).ok_or_else(|| {
                    Error::new(
                        field.ty.span(),
                        "cannot infer the filter kind of this type; add #[filter(kind = \"...\")] or #[filter(skip)]",
                    )
                })?,
            };

            fields.push(ParsedField {
                name: rename.clone().unwrap_or_else(|| ident.to_string()),
                renamed: rename.is_some(),
                ident,
                kind,
                filterable,
                sortable,
            });
        }

        for computed_field in &computed {
            if fields.iter().any(|field| field.name == computed_field.name) {
                return Err(Error::new_spanned(
                    input,
                    format!("computed field '{}' clashes with a declared field", computed_field.name),
                ));
            }
        }

        Ok(Self {
            input: input.clone(),
            fields,
            computed,
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.input.ident;
        let (impl_generics, ty_generics, where_clause) = self.input.generics.split_for_impl();

        let descriptors = self.fields.iter().map(|field| {
            let field_name = &field.name;
            let kind = field.kind.tokens();
            let filterable = field.filterable;
            let sortable = field.sortable;
            let source = if field.renamed {
                let attribute = field.ident.to_string();
                quote! { ::qsfilter::FieldSource::Attribute(#attribute.to_string()) }
            } else {
                quote! { ::qsfilter::FieldSource::Declared }
            };
            quote! {
                .with_field(::qsfilter::FieldDescriptor {
                    name: #field_name.to_string(),
                    kind: #kind,
                    filterable: #filterable,
                    sortable: #sortable,
                    source: #source,
                })
            }
        });

        let computed = self.computed.iter().map(|field| {
            let field_name = &field.name;
            let kind = field.kind.tokens();
            quote! { .computed(#field_name, #kind) }
        });

        let arms = self.fields.iter().map(|field| {
            let ident = &field.ident;
            let attribute = ident.to_string();
            quote! {
                #attribute => Some(::qsfilter::IntoFieldValue::to_field_value(&self.#ident)),
            }
        });

        quote! {
            impl #impl_generics ::qsfilter::DeclaredSchema for #name #ty_generics #where_clause {
                fn schema() -> ::qsfilter::Schema {
                    ::qsfilter::Schema::builder()
                        #(#descriptors)*
                        #(#computed)*
                        .build()
                }
            }

            impl #impl_generics ::qsfilter::FilterTarget for #name #ty_generics #where_clause {
                fn field_value(&self, attribute: &str) -> Option<::qsfilter::FieldValue> {
                    match attribute {
                        #(#arms)*
                        _ => None,
                    }
                }
            }
        }
    }
}

fn parse_computed(attrs: &[Attribute]) -> Result<Vec<ComputedField>> {
    let mut computed = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("filter")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("computed") {
                return Err(meta.error("expected computed(name = \"...\", kind = \"...\")"));
            }
            let mut name = None;
            let mut kind = None;
            meta.parse_nested_meta(|inner| {
                if inner.path.is_ident("name") {
                    let lit: LitStr = inner.value()?.parse()?;
                    name = Some(lit.value());
                } else if inner.path.is_ident("kind") {
                    let lit: LitStr = inner.value()?.parse()?;
                    kind = Some(Kind::parse(&lit)?);
                } else {
                    return Err(inner.error("unsupported computed field attribute"));
                }
                Ok(())
            })?;
            match (name, kind) {
                (Some(name), Some(kind)) => {
                    computed.push(ComputedField { name, kind });
                    Ok(())
                }
                _ => Err(meta.error("computed fields require both name and kind")),
            }
        })?;
    }
    Ok(computed)
}

fn infer_kind(ty: &Type) -> Option<Kind> {
    match ty {
        Type::Reference(reference) => infer_kind(&reference.elem),
        Type::Path(TypePath { path, .. }) => {
            let segment = path.segments.last()?;
            match segment.ident.to_string().as_str() {
                "Option" => infer_kind(first_generic(&segment.arguments)?),
                "bool" => Some(Kind::Boolean),
                "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" | "f32"
                | "f64" => Some(Kind::Numeric),
                "String" | "str" => Some(Kind::Text),
                "Vec" => Some(Kind::List),
                "DateTime" | "NaiveDateTime" | "NaiveDate" => Some(Kind::Temporal),
                _ => None,
            }
        }
        _ => None,
    }
}

fn first_generic(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}
