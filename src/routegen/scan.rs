// src/routegen/scan.rs

//! Source scanning with `syn`.

use std::path::{Component, Path};

use syn::{Attribute, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, Meta, Type, Visibility};
use tracing::{debug, warn};

use crate::errors::GenerationError;
use crate::fs::{FileSystem, walk_files};
use crate::routegen::model::{Endpoint, HandlerMethod};
use crate::types::HttpMethod;

/// Result of scanning a source tree.
#[derive(Debug, Default)]
pub struct ScanOutput {
    /// In file order, then declaration order.
    pub endpoints: Vec<Endpoint>,
    /// Non-fatal findings, e.g. marked methods that are not `pub`.
    pub warnings: Vec<String>,
}

/// Scan every `.rs` file below `src_root` for endpoint impl blocks.
pub fn scan_sources(fs: &dyn FileSystem, src_root: &Path) -> Result<ScanOutput, GenerationError> {
    let files = walk_files(fs, src_root).map_err(|source| GenerationError::Source {
        path: src_root.to_path_buf(),
        source,
    })?;

    let mut out = ScanOutput::default();
    for file in files.iter().filter(|p| p.extension().is_some_and(|e| e == "rs")) {
        let rel = file.strip_prefix(src_root).unwrap_or(file);
        let Some(module) = module_path_for(rel) else {
            debug!(file = ?file, "not a module file; skipping");
            continue;
        };

        let content = fs
            .read_to_string(file)
            .map_err(|source| GenerationError::Source {
                path: file.clone(),
                source,
            })?;
        let parsed = syn::parse_file(&content).map_err(|e| GenerationError::Parse {
            file: file.clone(),
            message: e.to_string(),
        })?;

        scan_items(&parsed.items, &module, file, &mut out)?;
    }

    debug!(endpoints = out.endpoints.len(), "scanned sources");
    Ok(out)
}

/// Module path of a file relative to the source root.
///
/// `lib.rs` and `main.rs` are the crate root, `foo/mod.rs` is `foo`,
/// `foo/bar.rs` is `foo::bar`. Returns `None` for files whose path cannot be
/// a module (e.g. `bin/tool.rs` siblings with dashes in their names).
pub fn module_path_for(rel: &Path) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    let file = segments.pop()?;
    let stem = file.strip_suffix(".rs")?;
    match (segments.is_empty(), stem) {
        (true, "lib" | "main") => {}
        (_, "mod") => {}
        _ => segments.push(stem.to_string()),
    }

    segments
        .iter()
        .all(|s| syn::parse_str::<syn::Ident>(s).is_ok())
        .then_some(segments)
}

fn scan_items(
    items: &[Item],
    module: &[String],
    file: &Path,
    out: &mut ScanOutput,
) -> Result<(), GenerationError> {
    for item in items {
        match item {
            Item::Impl(imp) => {
                if let Some(attr) = imp.attrs.iter().find(|a| is_marker(a, "endpoint")) {
                    let endpoint = parse_endpoint(imp, attr, module, file, &mut out.warnings)?;
                    debug!(endpoint = %endpoint.qualified_name(), base = %endpoint.base_path, "found endpoint");
                    out.endpoints.push(endpoint);
                }
            }
            Item::Mod(m) if !is_cfg_test(&m.attrs) => {
                if let Some((_, inner)) = &m.content {
                    let mut nested = module.to_vec();
                    nested.push(m.ident.to_string());
                    scan_items(inner, &nested, file, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// True if `attr` is `#[name]`, `#[name(...)]` or `#[some::path::name...]`.
fn is_marker(attr: &Attribute, name: &str) -> bool {
    attr.path().segments.last().is_some_and(|s| s.ident == name)
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|a| {
        a.path().is_ident("cfg")
            && a
                .parse_args::<syn::Ident>()
                .is_ok_and(|ident| ident == "test")
    })
}

fn parse_endpoint(
    imp: &ItemImpl,
    attr: &Attribute,
    module: &[String],
    file: &Path,
    warnings: &mut Vec<String>,
) -> Result<Endpoint, GenerationError> {
    let type_name = match imp.self_ty.as_ref() {
        Type::Path(tp) if tp.qself.is_none() => tp
            .path
            .segments
            .last()
            .filter(|s| s.arguments.is_empty())
            .map(|s| s.ident.to_string()),
        _ => None,
    };
    let Some(type_name) = type_name else {
        return Err(malformed(
            file.display().to_string(),
            "an endpoint must be a plain named type",
        ));
    };
    let location = format!("{}:{}", file.display(), type_name);

    if imp.trait_.is_some() {
        return Err(malformed(location, "trait impls cannot be endpoints"));
    }
    if !imp.generics.params.is_empty() {
        return Err(malformed(location, "generic impls cannot be endpoints"));
    }

    let base_path = path_argument(attr)
        .map_err(|message| malformed(location.clone(), message))?
        .unwrap_or_else(|| "/".to_string());
    if !base_path.starts_with('/') {
        return Err(malformed(
            location,
            format!("base path \"{base_path}\" must start with '/'"),
        ));
    }

    let mut type_path = module.to_vec();
    type_path.push(type_name.clone());
    let mut endpoint = Endpoint {
        type_path,
        base_path,
        handlers: Vec::new(),
        source: file.to_path_buf(),
    };

    for item in &imp.items {
        let ImplItem::Fn(func) = item else {
            continue;
        };
        for method in [HttpMethod::Get, HttpMethod::Post] {
            let Some(marker) = func.attrs.iter().find(|a| is_marker(a, method.marker())) else {
                continue;
            };
            let name = func.sig.ident.to_string();
            let location = endpoint.location(&name);

            if !matches!(func.vis, Visibility::Public(_)) {
                let message = format!("{location}: #[{}] method is not `pub`; skipped", method.marker());
                warn!("{message}");
                warnings.push(message);
                continue;
            }

            check_signature(func, method).map_err(|message| malformed(location.clone(), message))?;
            let sub_path = path_argument(marker)
                .map_err(|message| malformed(location.clone(), message))?
                .unwrap_or_default();

            endpoint.handlers.push(HandlerMethod {
                method,
                name,
                sub_path,
            });
        }
    }

    Ok(endpoint)
}

/// Read `path = "..."` from a marker. `Ok(None)` if the marker has no
/// arguments.
fn path_argument(attr: &Attribute) -> Result<Option<String>, String> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::NameValue(_) => Err("expected `(path = \"...\")` arguments".to_string()),
        Meta::List(list) if list.tokens.is_empty() => Ok(None),
        Meta::List(_) => {
            let mut value = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("path") {
                    let lit: syn::LitStr = meta
                        .value()?
                        .parse()
                        .map_err(|e| meta.error(format!("path must be a string literal: {e}")))?;
                    value = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown key; only `path` is supported"))
                }
            })
            .map_err(|e| e.to_string())?;
            Ok(value)
        }
    }
}

fn check_signature(func: &ImplItemFn, method: HttpMethod) -> Result<(), String> {
    let sig = &func.sig;
    if sig.asyncness.is_some() {
        return Err("handlers cannot be async".to_string());
    }
    if !sig.generics.params.is_empty() {
        return Err("handlers cannot be generic".to_string());
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => return Err("handlers must take `&self`".to_string()),
    }

    let extra = inputs.count();
    match (method, extra) {
        (HttpMethod::Get, 0) | (HttpMethod::Post, 1) => Ok(()),
        (HttpMethod::Get, n) => Err(format!("GET handlers take no arguments besides `&self`, found {n}")),
        (HttpMethod::Post, n) => Err(format!(
            "POST handlers take exactly one body argument besides `&self`, found {n}"
        )),
    }
}

fn malformed(location: impl Into<String>, message: impl Into<String>) -> GenerationError {
    GenerationError::Malformed {
        location: location.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_paths_follow_file_layout() {
        let p = |s: &str| module_path_for(Path::new(s));
        assert_eq!(p("lib.rs"), Some(vec![]));
        assert_eq!(p("main.rs"), Some(vec![]));
        assert_eq!(p("app/mod.rs"), Some(vec!["app".to_string()]));
        assert_eq!(
            p("app/main_resource.rs"),
            Some(vec!["app".to_string(), "main_resource".to_string()])
        );
        assert_eq!(p("app/lib.rs"), Some(vec!["app".to_string(), "lib".to_string()]));
        assert_eq!(p("bad-name.rs"), None);
    }
}
