//! Loading of a root service description and its include/import closure.
//!
//! Targets are discovered breadth-first. Each round of targets is read
//! concurrently; parsing and merging happen on the calling task, in
//! discovery order, so the merged result does not depend on I/O timing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::task::JoinSet;

use crate::error::{CompilerError, Result};
use crate::registry::{create_wsdl_registry, ElementRegistry, NodeKind};
use crate::wsdl::{build_definitions, Definitions};
use crate::xml::parse_document;
use crate::xsd::{Directive, DirectiveKind, Schema};

/// A directive waiting to be loaded, with the directory it resolves against.
#[derive(Debug, Clone)]
struct Pending {
    directive: Directive,
    origin_dir: PathBuf,
}

/// Parse one document into definitions.
///
/// # Errors
/// Returns `NotDefinitions` when the root is neither `definitions` nor
/// `schema`, and any parse or build error of the document itself.
pub fn parse_definitions(
    xml: &str,
    location: &str,
    registry: &ElementRegistry,
) -> Result<Definitions> {
    let doc = parse_document(xml, registry)?;
    match doc.root() {
        Some(root) if doc.kind(root) == NodeKind::Definitions => build_definitions(&doc),
        _ => Err(CompilerError::NotDefinitions(location.to_string())),
    }
}

/// Load `uri` (relative to `base_dir`) and every document it transitively
/// includes or imports, merged into one set of definitions.
///
/// Relative locations resolve against the directory of the document that
/// declares them. Each canonical path is loaded at most once, so include
/// cycles terminate. A namespace-less schema reached through an include is
/// rehomed into the namespace of the including schema before its own
/// directives are followed, so the namespace carries down include chains.
///
/// After merging, bindings and operations are post-processed and bindings
/// without a style default to `document`.
///
/// # Errors
/// Returns `IncludeLoad` naming the failing location when any include or
/// import target cannot be read or parsed. Nothing is returned on failure:
/// merging only starts once every target has loaded.
pub async fn load_document(uri: &str, base_dir: &Path) -> Result<Definitions> {
    let registry = create_wsdl_registry();
    let root_path = base_dir.join(uri);
    let xml = tokio::fs::read_to_string(&root_path).await?;
    let mut root = parse_definitions(&xml, uri, &registry)?;

    let mut visited = HashSet::new();
    visited.insert(tokio::fs::canonicalize(&root_path).await?);

    let root_dir = parent_dir(&root_path);
    let mut frontier = pending_from(&root, &root_dir);
    let mut loaded = Vec::new();

    while !frontier.is_empty() {
        let mut targets = Vec::new();
        for pending in frontier.drain(..) {
            let path = pending.origin_dir.join(&pending.directive.location);
            let canonical = tokio::fs::canonicalize(&path)
                .await
                .map_err(|e| include_error(&pending.directive, e.into()))?;
            if !visited.insert(canonical.clone()) {
                tracing::debug!(location = %pending.directive.location, "Already loaded");
                continue;
            }
            targets.push((pending, canonical));
        }

        let sources = read_all(&targets).await?;

        let mut next = Vec::new();
        for ((pending, path), source) in targets.into_iter().zip(sources) {
            let directive = pending.directive;
            let xml = source.map_err(|e| include_error(&directive, e))?;
            let mut defs = parse_definitions(&xml, &directive.location, &registry)
                .map_err(|e| include_error(&directive, e))?;

            if directive.kind == DirectiveKind::Include {
                if let Some(namespace) = &directive.namespace {
                    defs.rehome(namespace)
                        .map_err(|e| include_error(&directive, e))?;
                }
            }
            tracing::debug!(
                location = %directive.location,
                declarations = defs.schemas.values().map(Schema::declaration_count).sum::<usize>(),
                "Loaded include target"
            );

            next.extend(pending_from(&defs, &parent_dir(&path)));
            loaded.push(defs);
        }
        frontier = next;
    }

    for defs in loaded {
        root.merge(defs)?;
    }
    root.post_process()?;
    for binding in root.bindings.values_mut() {
        binding.style.get_or_insert_with(|| "document".to_string());
    }

    tracing::info!(
        document = uri,
        schemas = root.schemas.len(),
        bindings = root.bindings.len(),
        "Loaded service description"
    );
    Ok(root)
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn pending_from(defs: &Definitions, origin_dir: &Path) -> Vec<Pending> {
    defs.directives()
        .into_iter()
        .map(|directive| Pending {
            directive,
            origin_dir: origin_dir.to_path_buf(),
        })
        .collect()
}

fn include_error(directive: &Directive, source: CompilerError) -> CompilerError {
    CompilerError::IncludeLoad {
        location: directive.location.clone(),
        source: Box::new(source),
    }
}

/// Read every target concurrently; results come back in input order.
async fn read_all(targets: &[(Pending, PathBuf)]) -> Result<Vec<Result<String>>> {
    let mut set = JoinSet::new();
    for (index, (_, path)) in targets.iter().enumerate() {
        let path = path.clone();
        set.spawn(async move { (index, tokio::fs::read_to_string(path).await) });
    }

    let mut results = Vec::with_capacity(targets.len());
    while let Some(joined) = set.join_next().await {
        let (index, read) = joined.map_err(|e| CompilerError::Io(std::io::Error::other(e)))?;
        results.push((index, read.map_err(CompilerError::from)));
    }
    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, read)| read).collect())
}
