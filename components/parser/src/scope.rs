//! Scope and field model
//!
//! Scopes and fields live in two arenas inside [`ScopeTree`], addressed by
//! [`ScopeId`] and [`FieldId`]. The parser creates scopes and registers
//! declarations; the analyzer resolves references and creates inner-field
//! shims; transform passes and the emitter only read the tree, apart from
//! the renamer which fills in crunched names.
//!
//! A field that forwards to a binding in an enclosing scope (a shim) keeps
//! an `outer_field` link. Links always point outward, so chains are acyclic
//! and end at the declaring field.

use std::collections::{HashMap, HashSet};

use core_types::{ReferenceType, SourceSpan, UndefinedReference};
use serde::Serialize;

use crate::ast::NodeId;

/// Index of a scope in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

/// Index of a field in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FieldId(pub u32);

/// Kind of activation object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    /// Shared top-level scope of a compilation
    Global,
    /// Function body and parameters
    Function,
    /// Lexical block
    Block,
    /// Catch clause parameter
    Catch,
    /// with statement body
    With,
    /// ES module top level
    Module,
    /// Class body
    Class,
}

/// Kind of binding a field represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    /// Function parameter
    Argument,
    /// Implicit `arguments` object
    Arguments,
    /// Declared local (var, let, const, function, class, import)
    Local,
    /// Global binding, declared or not
    Global,
    /// Catch clause parameter
    CatchError,
    /// `$super`-style binding supplied by the host
    Super,
    /// Known browser or ECMAScript global
    Predefined,
    /// Name looked up inside a with statement
    WithField,
    /// Placeholder for a named function expression's name in the
    /// enclosing scope
    Ghost,
}

/// One binding (declared or referenced name) within a scope
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Bound name
    pub name: String,
    /// Binding kind
    pub kind: FieldKind,
    /// Owning scope
    pub scope: ScopeId,
    /// Number of syntactic references resolved to this field
    pub ref_count: u32,
    /// Declaration sites in source order
    pub declarations: Vec<SourceSpan>,
    /// Renamed output identifier
    pub crunched_name: Option<String>,
    /// Field in an enclosing scope this one forwards to
    pub outer_field: Option<FieldId>,
    /// Exported from a module
    pub is_exported: bool,
    /// Declared with const
    pub is_literal: bool,
    /// Created only to reserve a name
    pub is_placeholder: bool,
    /// Runtime resolution may differ from compile-time resolution
    pub is_ambiguous: bool,
    /// Whether the renamer may give the field a new name
    pub can_crunch: bool,
    /// Declared by a function declaration
    pub is_function: bool,
    /// Function or class node the field names
    pub value: Option<NodeId>,
}

impl Field {
    fn new(name: &str, kind: FieldKind, scope: ScopeId) -> Self {
        let can_crunch = matches!(
            kind,
            FieldKind::Argument | FieldKind::Local | FieldKind::CatchError
        );
        Self {
            name: name.to_string(),
            kind,
            scope,
            ref_count: 0,
            declarations: Vec::new(),
            crunched_name: None,
            outer_field: None,
            is_exported: false,
            is_literal: false,
            is_placeholder: false,
            is_ambiguous: false,
            can_crunch,
            is_function: false,
            value: None,
        }
    }

    /// Whether the field forwards to a field in an enclosing scope.
    pub fn is_shim(&self) -> bool {
        self.outer_field.is_some() && self.kind != FieldKind::WithField
    }

    /// Whether the field was declared in source (not created by a lookup).
    pub fn is_declared(&self) -> bool {
        !self.declarations.is_empty()
    }
}

/// Activation object: one lexical region's symbol table plus metadata
#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    /// Scope kind
    pub kind: ScopeKind,
    /// Enclosing scope
    pub parent: Option<ScopeId>,
    /// Nested scopes in creation order
    pub children: Vec<ScopeId>,
    /// Node that introduces the scope
    pub owner: Option<NodeId>,
    /// Source span of the owner, for report ordering
    pub context: SourceSpan,
    /// Strict mode code
    pub use_strict: bool,
    /// False when eval or with makes static analysis unsound
    pub known_at_compile_time: bool,
    /// Arrow function scope (no own `arguments` or `this`)
    pub is_arrow: bool,
    /// Holds only a function expression's own name
    pub is_name_scope: bool,
    /// Removed from the tree because it declared nothing
    pub detached: bool,
    /// Fields in creation order
    pub fields: Vec<FieldId>,
    #[serde(skip)]
    names: HashMap<String, FieldId>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            owner,
            context: SourceSpan::default(),
            use_strict: false,
            known_at_compile_time: true,
            is_arrow: false,
            is_name_scope: false,
            detached: false,
            fields: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Whether `var` declarations hoist to this scope.
    pub fn is_variable_scope(&self) -> bool {
        matches!(
            self.kind,
            ScopeKind::Global | ScopeKind::Function | ScopeKind::Module
        )
    }
}

/// Scope tree of one compilation, shared by all of its chunks.
///
/// # Examples
///
/// ```
/// use core_types::SourceSpan;
/// use parser::scope::{FieldKind, ScopeKind, ScopeTree};
///
/// let mut tree = ScopeTree::new();
/// let global = tree.global();
/// let func = tree.push_scope(ScopeKind::Function, global, None);
/// let x = tree.declare(global, "x", FieldKind::Global, SourceSpan::default());
///
/// let shim = tree.reference(func, x);
/// assert_eq!(tree.field(shim).outer_field, Some(x));
/// assert_eq!(tree.outermost(shim), x);
/// assert_eq!(tree.field(x).ref_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    fields: Vec<Field>,
    undefined: Vec<UndefinedReference>,
    reported_undefined: HashSet<String>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Creates a tree holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, None, None)],
            fields: Vec::new(),
            undefined: Vec::new(),
            reported_undefined: HashSet::new(),
        }
    }

    /// The global scope.
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Number of scopes ever created.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Number of fields ever created.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Scope by id.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Mutable scope by id.
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// Field by id.
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0 as usize]
    }

    /// Mutable field by id.
    pub fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id.0 as usize]
    }

    /// Creates a scope nested in `parent`.
    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId, owner: Option<NodeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let mut scope = Scope::new(kind, Some(parent), owner);
        scope.use_strict = self.scope(parent).use_strict;
        self.scopes.push(scope);
        self.scope_mut(parent).children.push(id);
        id
    }

    /// Removes an empty block scope from the tree, handing its nested scopes
    /// to its parent. Returns false when the scope declares anything.
    pub fn collapse_if_empty(&mut self, id: ScopeId) -> bool {
        let scope = self.scope(id);
        if !scope.fields.is_empty() || scope.kind != ScopeKind::Block || scope.is_name_scope {
            return false;
        }
        let Some(parent) = scope.parent else {
            return false;
        };
        let children = std::mem::take(&mut self.scope_mut(id).children);
        for child in &children {
            self.scope_mut(*child).parent = Some(parent);
        }
        let siblings = &mut self.scope_mut(parent).children;
        if let Some(pos) = siblings.iter().position(|s| *s == id) {
            siblings.splice(pos..=pos, children);
        }
        self.scope_mut(id).detached = true;
        true
    }

    /// Moves every scope created at index `since` or later whose parent is
    /// `from` under `to`. Used when a parenthesized expression turns out to
    /// be an arrow function's parameter list.
    pub fn adopt_scopes(&mut self, since: usize, from: ScopeId, to: ScopeId) {
        let moved: Vec<ScopeId> = self.scope(from)
            .children
            .iter()
            .copied()
            .filter(|s| s.0 as usize >= since && *s != to)
            .collect();
        if moved.is_empty() {
            return;
        }
        self.scope_mut(from).children.retain(|s| !moved.contains(s));
        for id in &moved {
            self.scope_mut(*id).parent = Some(to);
        }
        self.scope_mut(to).children.extend(moved);
    }

    /// Scopes from `id` outward to the global scope.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |s| self.scope(*s).parent)
    }

    /// Nearest scope `var` declarations hoist to.
    pub fn variable_scope(&self, id: ScopeId) -> ScopeId {
        self.ancestors(id)
            .find(|s| self.scope(*s).is_variable_scope())
            .unwrap_or_else(|| self.global())
    }

    /// Nearest non-arrow function scope, which owns `arguments`.
    pub fn arguments_scope(&self, id: ScopeId) -> Option<ScopeId> {
        self.ancestors(id).find(|s| {
            let scope = self.scope(*s);
            scope.kind == ScopeKind::Function && !scope.is_arrow
        })
    }

    /// Field named `name` owned by `scope` itself.
    pub fn find_local(&self, scope: ScopeId, name: &str) -> Option<FieldId> {
        self.scope(scope).names.get(name).copied()
    }

    /// Fields owned by a scope in creation order.
    pub fn fields_of(&self, scope: ScopeId) -> impl Iterator<Item = (FieldId, &Field)> + '_ {
        self.scope(scope)
            .fields
            .iter()
            .map(move |id| (*id, self.field(*id)))
    }

    fn insert_field(&mut self, scope: ScopeId, field: Field) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        let name = field.name.clone();
        self.fields.push(field);
        let s = self.scope_mut(scope);
        s.fields.push(id);
        s.names.insert(name, id);
        id
    }

    /// Creates a field without a declaration site.
    pub fn create_field(&mut self, scope: ScopeId, name: &str, kind: FieldKind) -> FieldId {
        self.insert_field(scope, Field::new(name, kind, scope))
    }

    /// Registers a declaration of `name` in `scope`.
    ///
    /// An existing field gains another declaration site; a ghost placeholder
    /// turns into the real binding. The global scope stores declared names
    /// as [`FieldKind::Global`].
    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: FieldKind, span: SourceSpan) -> FieldId {
        let kind = if scope == self.global() && kind == FieldKind::Local {
            FieldKind::Global
        } else {
            kind
        };
        let id = match self.find_local(scope, name) {
            Some(existing) => {
                let field = self.field_mut(existing);
                if field.kind == FieldKind::Ghost {
                    field.kind = kind;
                    field.is_ambiguous = true;
                    field.can_crunch = false;
                } else if field.kind == FieldKind::Local && kind == FieldKind::Argument {
                    field.kind = FieldKind::Argument;
                }
                existing
            }
            None => self.create_field(scope, name, kind),
        };
        self.field_mut(id).declarations.push(span);
        id
    }

    /// Resolves `name` starting at `scope`, returning the nearest field that
    /// owns it and the scope where it was found.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, FieldId)> {
        self.ancestors(scope)
            .find_map(|s| self.find_local(s, name).map(|f| (s, f)))
    }

    /// Records one reference from `scope` to `target`, which lives in
    /// `scope` or one of its ancestors.
    ///
    /// Shims are created in every scope between `scope` and the declaring
    /// scope, so later lookups of the same name stop at the first scope. The
    /// reference count of every field along the chain is incremented.
    /// Returns the field owned by `scope`.
    pub fn reference(&mut self, scope: ScopeId, target: FieldId) -> FieldId {
        let declaring = self.field(target).scope;
        let name = self.field(target).name.clone();
        let path: Vec<ScopeId> = self
            .ancestors(scope)
            .take_while(|s| *s != declaring)
            .collect();

        let mut outer = target;
        for s in path.into_iter().rev() {
            outer = match self.find_local(s, &name) {
                Some(existing) => existing,
                None => {
                    let kind = self.field(outer).kind;
                    let mut shim = Field::new(&name, kind, s);
                    shim.outer_field = Some(outer);
                    shim.can_crunch = false;
                    self.insert_field(s, shim)
                }
            };
        }

        let mut current = Some(outer);
        while let Some(id) = current {
            let field = self.field_mut(id);
            field.ref_count += 1;
            current = field.outer_field;
        }
        outer
    }

    /// Follows the outer-field chain to the declaring field.
    pub fn outermost(&self, mut id: FieldId) -> FieldId {
        while let Some(outer) = self.field(id).outer_field {
            id = outer;
        }
        id
    }

    /// Identifier the field is written as in the output.
    pub fn output_name(&self, id: FieldId) -> &str {
        let root = self.field(self.outermost(id));
        let own = self.field(id);
        if own.kind == FieldKind::WithField && own.outer_field.is_none() {
            return &own.name;
        }
        root.crunched_name.as_deref().unwrap_or(&root.name)
    }

    /// Whether every scope from `id` outward is statically analyzable.
    pub fn is_known_at_compile_time(&self, id: ScopeId) -> bool {
        self.scope(id).known_at_compile_time
    }

    /// Marks a scope as not analyzable at compile time.
    pub fn make_unknown(&mut self, id: ScopeId) {
        self.scope_mut(id).known_at_compile_time = false;
    }

    /// Names visible from `scope`: every field owned by it or an ancestor,
    /// nearest first.
    pub fn visible_fields(&self, scope: ScopeId) -> Vec<FieldId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for s in self.ancestors(scope) {
            for id in &self.scope(s).fields {
                if seen.insert(self.field(*id).name.clone()) {
                    out.push(*id);
                }
            }
        }
        out
    }

    /// Scopes reachable from the global scope, parents before children.
    pub fn scopes_top_down(&self) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.global()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.scope(id).children.iter().rev().copied());
        }
        out
    }

    // ------------------------------------------------------------------
    // Undefined-reference channel
    // ------------------------------------------------------------------

    /// Records a reference to an undeclared name. When `report` is set,
    /// returns true the first time the name is reported, which is when a
    /// diagnostic should be issued.
    pub fn record_undefined(
        &mut self,
        name: &str,
        span: SourceSpan,
        reference_type: ReferenceType,
        report: bool,
    ) -> bool {
        self.undefined.push(UndefinedReference {
            name: name.to_string(),
            span,
            reference_type,
        });
        report && self.reported_undefined.insert(name.to_string())
    }

    /// Every undefined reference recorded so far, in discovery order.
    pub fn undefined_references(&self) -> &[UndefinedReference] {
        &self.undefined
    }
}
