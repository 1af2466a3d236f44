//! Scope report data
//!
//! A read-only snapshot of the scope tree after analysis and renaming, for
//! hosts that render scope reports. Two renderings are provided: the
//! [`Display`](std::fmt::Display) text form and JSON through `serde_json`.

use std::cmp::Ordering;
use std::fmt;

use core_types::{SourceSpan, UndefinedReference};
use serde::Serialize;

use crate::ast::NodeId;
use crate::scope::{Field, FieldId, FieldKind, ScopeId, ScopeKind, ScopeTree};

/// Report grouping of a field. Fields are listed in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FieldCategory {
    /// Parameters and `arguments`
    Argument,
    /// Local variables and catch bindings
    Local,
    /// Function declarations
    Function,
    /// References to bindings of enclosing scopes
    Outer,
    /// Global and predefined names
    Global,
}

impl FieldCategory {
    fn of(field: &Field) -> Self {
        match field.kind {
            _ if field.is_shim() => FieldCategory::Outer,
            FieldKind::WithField => FieldCategory::Outer,
            FieldKind::Argument | FieldKind::Arguments => FieldCategory::Argument,
            FieldKind::Local | FieldKind::CatchError if field.is_function => FieldCategory::Function,
            FieldKind::Local | FieldKind::CatchError => FieldCategory::Local,
            FieldKind::Global if field.is_function => FieldCategory::Function,
            FieldKind::Global | FieldKind::Predefined | FieldKind::Super | FieldKind::Ghost => {
                FieldCategory::Global
            }
        }
    }
}

/// One field row of a scope.
#[derive(Debug, Clone, Serialize)]
pub struct FieldEntry {
    /// Field id within the scope tree
    pub id: FieldId,
    /// Source name
    pub name: String,
    /// Binding kind
    pub kind: FieldKind,
    /// Report grouping
    pub category: FieldCategory,
    /// Number of references
    pub ref_count: u32,
    /// Renamed output identifier
    pub crunched_name: Option<String>,
    /// Outer fields this one forwards to, nearest first
    pub outer_chain: Vec<FieldId>,
    /// First declaration site
    pub declared_at: Option<SourceSpan>,
    /// Exported from a module
    pub is_exported: bool,
    /// Declared with const
    pub is_literal: bool,
    /// Looked up inside a with statement
    pub is_with_shadowed: bool,
    /// Eligible for renaming
    pub can_crunch: bool,
}

/// One scope of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeEntry {
    /// Scope id within the scope tree
    pub id: ScopeId,
    /// Scope kind
    pub kind: ScopeKind,
    /// Enclosing scope
    pub parent: Option<ScopeId>,
    /// Node that introduces the scope
    pub owner: Option<NodeId>,
    /// Source span of the owner
    pub context: SourceSpan,
    /// Strict mode
    pub use_strict: bool,
    /// Statically analyzable
    pub known_at_compile_time: bool,
    /// Fields in report order
    pub fields: Vec<FieldEntry>,
}

/// Snapshot of a compilation's scopes and undefined references.
///
/// # Examples
///
/// ```
/// use parser::{parse, report::ScopeReport};
/// use parser::settings::CodeSettings;
///
/// let parsed = parse("function f(a) { return a + b; }", &CodeSettings::default());
/// let report = ScopeReport::new(&parsed.scopes);
/// assert_eq!(report.scopes.len(), 2);
/// assert_eq!(report.undefined[0].name, "b");
/// assert!(report.to_json().unwrap().contains("\"Function\""));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ScopeReport {
    /// Global scope first, then nested scopes by owner position
    pub scopes: Vec<ScopeEntry>,
    /// Undefined references by name, line and column
    pub undefined: Vec<UndefinedReference>,
}

impl ScopeReport {
    /// Builds the report from an analyzed scope tree.
    pub fn new(tree: &ScopeTree) -> Self {
        let global = tree.global();
        let mut ids = tree.scopes_top_down();
        ids.retain(|id| *id != global);
        ids.sort_by(|a, b| {
            let (sa, sb) = (tree.scope(*a).context, tree.scope(*b).context);
            (sa.file, sa.start.line, sa.start.column, a.0).cmp(&(sb.file, sb.start.line, sb.start.column, b.0))
        });
        let scopes = std::iter::once(global)
            .chain(ids)
            .map(|id| scope_entry(tree, id))
            .collect();

        let mut undefined = tree.undefined_references().to_vec();
        UndefinedReference::sort_for_report(&mut undefined);
        Self { scopes, undefined }
    }

    /// Structured rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn scope_entry(tree: &ScopeTree, id: ScopeId) -> ScopeEntry {
    let scope = tree.scope(id);
    let mut fields: Vec<FieldEntry> = tree
        .fields_of(id)
        .filter(|(_, f)| !f.is_placeholder && f.kind != FieldKind::Ghost)
        .filter(|(_, f)| !(f.kind == FieldKind::Arguments && f.ref_count == 0))
        .map(|(field_id, f)| field_entry(tree, field_id, f))
        .collect();
    fields.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| compare_names(&a.name, &b.name))
    });
    ScopeEntry {
        id,
        kind: scope.kind,
        parent: scope.parent,
        owner: scope.owner,
        context: scope.context,
        use_strict: scope.use_strict,
        known_at_compile_time: scope.known_at_compile_time,
        fields,
    }
}

fn field_entry(tree: &ScopeTree, id: FieldId, field: &Field) -> FieldEntry {
    let outer_chain = std::iter::successors(field.outer_field, |f| tree.field(*f).outer_field).collect();
    let root = tree.field(tree.outermost(id));
    FieldEntry {
        id,
        name: field.name.clone(),
        kind: field.kind,
        category: FieldCategory::of(field),
        ref_count: field.ref_count,
        crunched_name: root.crunched_name.clone(),
        outer_chain,
        declared_at: field.declarations.first().copied(),
        is_exported: field.is_exported,
        is_literal: field.is_literal,
        is_with_shadowed: field.kind == FieldKind::WithField,
        can_crunch: field.can_crunch,
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl fmt::Display for ScopeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scope in &self.scopes {
            let start = scope.context.start;
            write!(f, "{:?} scope", scope.kind)?;
            if scope.owner.is_some() {
                write!(f, " ({}:{})", start.line, start.column)?;
            }
            if scope.use_strict {
                write!(f, " [strict]")?;
            }
            if !scope.known_at_compile_time {
                write!(f, " [unknown]")?;
            }
            writeln!(f)?;
            for field in &scope.fields {
                write!(f, "    {:?} {}", field.category, field.name)?;
                if let Some(crunched) = &field.crunched_name {
                    write!(f, " -> {}", crunched)?;
                }
                write!(f, " (refs: {})", field.ref_count)?;
                if let Some(span) = field.declared_at {
                    write!(f, " @{}:{}", span.start.line, span.start.column)?;
                }
                writeln!(f)?;
            }
        }
        if !self.undefined.is_empty() {
            writeln!(f, "Undefined")?;
            for reference in &self.undefined {
                writeln!(
                    f,
                    "    {} ({:?}) @{}:{}",
                    reference.name, reference.reference_type, reference.span.start.line, reference.span.start.column
                )?;
            }
        }
        Ok(())
    }
}
