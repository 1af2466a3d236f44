//! Local renaming
//!
//! Assigns short names to local fields scope by scope, outermost first, so
//! an inner scope always knows the final names of the outer fields it can
//! see through its shims. Within a scope the most referenced field gets the
//! shortest name; ties keep declaration order.
//!
//! Also applies the manual rename pairs (to fields and, optionally, to
//! property names) and renames labels by their nesting depth.

use std::collections::{HashMap, HashSet};

use parser::lexer::is_reserved_word;
use parser::settings::LocalRenaming;
use parser::{Ast, CodeSettings, FieldId, FieldKind, NodeId, NodeKind, ScopeId, ScopeTree, TreeModifications};
use tracing::{debug, debug_span, trace};

/// Characters a generated name may start with, most compressible first.
const FIRST_CHARS: &[u8] = b"ntirufeoshclavypwbkdgmjzxqNTIRUFEOSHCLAVYPWBKDGMJZXQ_$";
/// Characters for the remaining positions.
const NEXT_CHARS: &[u8] = b"ntirufeoshclavypwbkdgmjzxqNTIRUFEOSHCLAVYPWBKDGMJZXQ_$0123456789";

/// The `index`-th generated identifier: `n`, `t`, `i`, ..., `$`, `nn`, `tn`, ...
///
/// # Examples
///
/// ```
/// use minifier::renamer::generated_name;
///
/// assert_eq!(generated_name(0), "n");
/// assert_eq!(generated_name(2), "i");
/// assert_eq!(generated_name(54), "nn");
/// ```
pub fn generated_name(mut index: usize) -> String {
    let mut name = String::new();
    name.push(FIRST_CHARS[index % FIRST_CHARS.len()] as char);
    index /= FIRST_CHARS.len();
    while index > 0 {
        index -= 1;
        name.push(NEXT_CHARS[index % NEXT_CHARS.len()] as char);
        index /= NEXT_CHARS.len();
    }
    name
}

/// Renames fields, properties and labels; returns how many names changed.
pub fn rename(ast: &mut Ast, scopes: &mut ScopeTree, settings: &CodeSettings, roots: &[NodeId]) -> usize {
    let _span = debug_span!("rename").entered();
    let mut renamed = apply_rename_pairs(scopes, settings);
    if settings.is_local_renaming_enabled() {
        renamed += crunch_fields(scopes, settings);
        for &root in roots {
            renamed += crunch_labels(ast, root, &mut Vec::new());
        }
    }
    if settings.manual_renames_properties
        && settings.is_modification_allowed(TreeModifications::PROPERTY_RENAMING)
    {
        for &root in roots {
            renamed += rename_properties(ast, settings, root);
        }
    }
    debug!(renamed, "renaming finished");
    renamed
}

fn apply_rename_pairs(scopes: &mut ScopeTree, settings: &CodeSettings) -> usize {
    let mut renamed = 0;
    for index in 0..scopes.field_count() {
        let id = FieldId(index as u32);
        let field = scopes.field(id);
        let eligible = field.is_declared()
            && !field.is_shim()
            && !field.is_exported
            && matches!(
                field.kind,
                FieldKind::Local | FieldKind::Argument | FieldKind::CatchError | FieldKind::Global
            );
        if !eligible {
            continue;
        }
        if let Some(target) = settings.rename_target(&field.name) {
            if field.crunched_name.as_deref() == Some(target) {
                continue;
            }
            trace!(from = %field.name, to = target, "manual rename");
            scopes.field_mut(id).crunched_name = Some(target.to_string());
            renamed += 1;
        }
    }
    renamed
}

fn is_candidate(scopes: &ScopeTree, id: FieldId, settings: &CodeSettings) -> bool {
    let field = scopes.field(id);
    matches!(
        field.kind,
        FieldKind::Local | FieldKind::Argument | FieldKind::CatchError
    ) && !field.is_shim()
        && !field.is_placeholder
        && field.can_crunch
        && !field.is_exported
        && !field.is_ambiguous
        && !(settings.preserve_function_names && field.is_function)
        && !settings.is_no_auto_rename(&field.name)
        && settings.rename_target(&field.name).is_none()
        && !(settings.local_renaming == LocalRenaming::KeepLocalizationVars && field.name.starts_with("L_"))
        && scopes.is_known_at_compile_time(field.scope)
}

/// Names no generated identifier may take anywhere.
fn globally_reserved(scopes: &ScopeTree, settings: &CodeSettings) -> HashSet<String> {
    let mut reserved: HashSet<String> = settings
        .rename_pairs()
        .map(|(_, to)| to.to_string())
        .collect();
    for index in 0..scopes.field_count() {
        let field = scopes.field(FieldId(index as u32));
        // Unresolved names inside `with` bind at runtime; nothing may shadow them.
        if field.kind == FieldKind::WithField && field.outer_field.is_none() {
            reserved.insert(field.name.clone());
        }
        if settings.is_no_auto_rename(&field.name) {
            reserved.insert(field.name.clone());
        }
    }
    reserved
}

fn crunch_fields(scopes: &mut ScopeTree, settings: &CodeSettings) -> usize {
    let reserved = globally_reserved(scopes, settings);
    let mut renamed = 0;
    for scope in scopes.scopes_top_down() {
        renamed += crunch_scope(scopes, settings, scope, &reserved);
    }
    renamed
}

fn crunch_scope(scopes: &mut ScopeTree, settings: &CodeSettings, scope: ScopeId, reserved: &HashSet<String>) -> usize {
    let mut candidates: Vec<FieldId> = scopes
        .fields_of(scope)
        .map(|(id, _)| id)
        .filter(|id| is_candidate(scopes, *id, settings))
        .collect();
    if candidates.is_empty() {
        return 0;
    }
    let previous: HashMap<FieldId, Option<String>> = candidates
        .iter()
        .map(|id| (*id, scopes.field_mut(*id).crunched_name.take()))
        .collect();

    let mut taken = reserved.clone();
    for (id, _) in scopes.fields_of(scope) {
        if !candidates.contains(&id) {
            taken.insert(scopes.output_name(id).to_string());
        }
    }

    candidates.sort_by(|a, b| {
        scopes
            .field(*b)
            .ref_count
            .cmp(&scopes.field(*a).ref_count)
            .then_with(|| a.cmp(b))
    });

    let pinned = pinned_below(scopes, settings, scope, &candidates);
    let mut renamed = 0;
    let none = HashSet::new();
    for id in &candidates {
        let blocked = pinned.get(id).unwrap_or(&none);
        let mut next = 0;
        let name = loop {
            let name = generated_name(next);
            next += 1;
            if !taken.contains(&name) && !blocked.contains(&name) && !is_reserved_word(&name) {
                break name;
            }
        };
        trace!(field = %scopes.field(*id).name, crunched = %name, "crunched field");
        taken.insert(name.clone());
        if previous.get(id).and_then(Option::as_deref) != Some(name.as_str()) {
            renamed += 1;
        }
        scopes.field_mut(*id).crunched_name = Some(name);
    }
    renamed
}

/// For each candidate of `scope`, the names of fields that keep their name in
/// a nested scope reaching the candidate through a shim. Giving the
/// candidate one of those names would let the nested binding capture it.
fn pinned_below(
    scopes: &ScopeTree,
    settings: &CodeSettings,
    scope: ScopeId,
    candidates: &[FieldId],
) -> HashMap<FieldId, HashSet<String>> {
    let mut pinned: HashMap<FieldId, HashSet<String>> = HashMap::new();
    let mut stack: Vec<ScopeId> = scopes.scope(scope).children.clone();
    while let Some(inner) = stack.pop() {
        stack.extend(scopes.scope(inner).children.iter().copied());
        let reaching: Vec<FieldId> = scopes
            .fields_of(inner)
            .filter(|(_, field)| field.outer_field.is_some())
            .map(|(id, _)| scopes.outermost(id))
            .filter(|root| candidates.contains(root))
            .collect();
        if reaching.is_empty() {
            continue;
        }
        let names: Vec<String> = scopes
            .fields_of(inner)
            .filter(|(id, field)| field.outer_field.is_none() && !is_candidate(scopes, *id, settings))
            .map(|(id, _)| scopes.output_name(id).to_string())
            .collect();
        for root in reaching {
            pinned.entry(root).or_default().extend(names.iter().cloned());
        }
    }
    pinned
}

/// Renames labels to the name of their nesting depth within the current
/// function; references from `break`/`continue` follow.
fn crunch_labels(ast: &mut Ast, id: NodeId, active: &mut Vec<(String, String)>) -> usize {
    let mut renamed = 0;
    match ast.kind(id).clone() {
        NodeKind::Labeled { label, body } => {
            let short = generated_name(active.len());
            if short != label {
                ast.set_kind(id, NodeKind::Labeled {
                    label: short.clone(),
                    body,
                });
                renamed += 1;
            }
            active.push((label, short));
            renamed += crunch_labels(ast, body, active);
            active.pop();
        }
        NodeKind::Break { label: Some(label) } | NodeKind::Continue { label: Some(label) } => {
            if let Some((_, short)) = active.iter().rev().find(|(old, _)| *old == label) {
                if *short != label {
                    let short = Some(short.clone());
                    match ast.kind_mut(id) {
                        NodeKind::Break { label } | NodeKind::Continue { label } => *label = short,
                        _ => {}
                    }
                    renamed += 1;
                }
            }
        }
        NodeKind::FunctionObject { .. } => {
            let mut fresh = Vec::new();
            for child in ast.children(id) {
                renamed += crunch_labels(ast, child, &mut fresh);
            }
        }
        _ => {
            for child in ast.children(id) {
                renamed += crunch_labels(ast, child, active);
            }
        }
    }
    renamed
}

/// Applies rename pairs to member names and literal keys.
fn rename_properties(ast: &mut Ast, settings: &CodeSettings, root: NodeId) -> usize {
    let mut renamed = 0;
    for id in ast.descendants(root) {
        let is_key = ast.parent(id).is_some_and(|p| match ast.kind(p) {
            NodeKind::ObjectProperty { key, .. } | NodeKind::ClassMember { key, .. } => *key == id,
            _ => false,
        });
        let target = match ast.kind(id) {
            NodeKind::Member { name, .. } => settings.rename_target(name),
            NodeKind::PropertyName { name } if is_key => settings.rename_target(name),
            _ => None,
        };
        let Some(target) = target.map(str::to_string) else {
            continue;
        };
        match ast.kind_mut(id) {
            NodeKind::Member { name, .. } | NodeKind::PropertyName { name } => *name = target,
            _ => continue,
        }
        renamed += 1;
    }
    renamed
}
