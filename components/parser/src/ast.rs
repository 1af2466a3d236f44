//! Abstract Syntax Tree node definitions
//!
//! Nodes live in a single arena ([`Ast`]) and refer to each other by
//! [`NodeId`]. Every node records its parent; the arena keeps that link in
//! step with the child slots whenever a node is allocated, replaced or moved
//! between statement lists, so a node is only ever owned by one container.
//!
//! Expressions appear directly in statement lists; there is no separate
//! expression-statement wrapper.

use core_types::{FileId, ReferenceType, SourceSpan};

use crate::scope::{FieldId, ScopeId};

/// Index of a node in its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Literal values held by [`NodeKind::Constant`]
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number literal
    Number(f64),
    /// String literal (cooked value)
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null literal
    Null,
    /// Replacement text that resolved to nothing; emits no text
    Empty,
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

impl DeclarationKind {
    /// Keyword that introduces the declaration.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

/// What syntactic form produced a function object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `function f() {}` statement
    Declaration,
    /// `function [f]() {}` in expression position
    Expression,
    /// `() => ...`
    Arrow,
    /// Method in a class body or object literal
    Method,
    /// `get x() {}`
    Getter,
    /// `set x(v) {}`
    Setter,
}

/// Kind of class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassMemberKind {
    /// Method, value is a function object
    Method,
    /// Getter accessor
    Getter,
    /// Setter accessor
    Setter,
    /// Field definition, value is the optional initializer
    Field,
}

/// Kind of object literal or pattern property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// `key: value`
    Init,
    /// `{ a }`
    Shorthand,
    /// `m() {}`
    Method,
    /// `get x() {}`
    Getter,
    /// `set x(v) {}`
    Setter,
}

/// Form of an import specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import x from "m"`
    Default,
    /// `import * as x from "m"`
    Namespace,
    /// `import { a as x } from "m"`
    Named,
}

/// Form of an export statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// `export var ...`, `export function ...`, `export class ...`
    Declaration,
    /// `export default ...`
    Default,
    /// `export { a, b as c } [from "m"]`
    Named,
    /// `export * [as ns] from "m"`
    All,
}

/// Binary operators, including assignment and comma
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Comma
    Comma,
    /// Assignment (=)
    Assign,
    /// Addition assignment (+=)
    AddAssign,
    /// Subtraction assignment (-=)
    SubAssign,
    /// Multiplication assignment (*=)
    MulAssign,
    /// Division assignment (/=)
    DivAssign,
    /// Modulo assignment (%=)
    ModAssign,
    /// Exponentiation assignment (**=)
    ExpAssign,
    /// Left shift assignment (<<=)
    LeftShiftAssign,
    /// Right shift assignment (>>=)
    RightShiftAssign,
    /// Unsigned right shift assignment (>>>=)
    UnsignedRightShiftAssign,
    /// Bitwise AND assignment (&=)
    BitAndAssign,
    /// Bitwise OR assignment (|=)
    BitOrAssign,
    /// Bitwise XOR assignment (^=)
    BitXorAssign,
    /// Logical AND assignment (&&=)
    AndAssign,
    /// Logical OR assignment (||=)
    OrAssign,
    /// Nullish coalescing assignment (??=)
    NullishAssign,
    /// Logical OR (||)
    Or,
    /// Logical AND (&&)
    And,
    /// Nullish coalescing (??)
    NullishCoalescing,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Bitwise AND (&)
    BitAnd,
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    NotEq,
    /// Strict equality (===)
    StrictEq,
    /// Strict inequality (!==)
    StrictNotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// instanceof
    InstanceOf,
    /// in
    In,
    /// Left shift (<<)
    LeftShift,
    /// Right shift (>>)
    RightShift,
    /// Unsigned right shift (>>>)
    UnsignedRightShift,
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,
    /// Exponentiation (**)
    Exp,
}

impl BinaryOp {
    /// Source spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Comma => ",",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::ExpAssign => "**=",
            BinaryOp::LeftShiftAssign => "<<=",
            BinaryOp::RightShiftAssign => ">>=",
            BinaryOp::UnsignedRightShiftAssign => ">>>=",
            BinaryOp::BitAndAssign => "&=",
            BinaryOp::BitOrAssign => "|=",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::AndAssign => "&&=",
            BinaryOp::OrAssign => "||=",
            BinaryOp::NullishAssign => "??=",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::NullishCoalescing => "??",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::In => "in",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
        }
    }

    /// Whether the operator assigns to its left operand.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::ExpAssign
                | BinaryOp::LeftShiftAssign
                | BinaryOp::RightShiftAssign
                | BinaryOp::UnsignedRightShiftAssign
                | BinaryOp::BitAndAssign
                | BinaryOp::BitOrAssign
                | BinaryOp::BitXorAssign
                | BinaryOp::AndAssign
                | BinaryOp::OrAssign
                | BinaryOp::NullishAssign
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation (-)
    Minus,
    /// Plus (+)
    Plus,
    /// Logical NOT (!)
    Not,
    /// Bitwise NOT (~)
    BitwiseNot,
    /// typeof
    Typeof,
    /// void
    Void,
    /// delete
    Delete,
}

impl UnaryOp {
    /// Source spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    /// Increment (++)
    Increment,
    /// Decrement (--)
    Decrement,
}

impl UpdateOp {
    /// Source spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// Every kind of syntax node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// One parsed chunk
    Program {
        /// Top-level statements
        statements: Vec<NodeId>,
        /// Global or module scope the chunk runs in
        scope: ScopeId,
    },
    /// Statement list, also the body of every function
    Block {
        /// Statements; a concise body holds a single expression
        statements: Vec<NodeId>,
        /// Lexical scope, when the block declares let/const/class names
        scope: Option<ScopeId>,
        /// Expression-bodied arrow function body
        concise: bool,
    },
    /// var / let / const statement
    Var {
        /// Declaration keyword
        kind: DeclarationKind,
        /// VariableDeclarator nodes
        declarators: Vec<NodeId>,
    },
    /// One `target = init` in a declaration
    VariableDeclarator {
        /// Binding identifier or pattern
        target: NodeId,
        /// Initializer
        init: Option<NodeId>,
    },
    /// Function declaration, expression, arrow, method or accessor
    FunctionObject {
        /// Syntactic form
        kind: FunctionKind,
        /// Name binding, if any
        binding: Option<NodeId>,
        /// Parameter patterns
        params: Vec<NodeId>,
        /// Body block
        body: NodeId,
        /// async function
        is_async: bool,
        /// generator function
        is_generator: bool,
        /// Function scope
        scope: ScopeId,
        /// Extra scope holding a function expression's own name
        name_scope: Option<ScopeId>,
    },
    /// Class declaration or expression
    Class {
        /// Class name binding
        binding: Option<NodeId>,
        /// extends clause
        heritage: Option<NodeId>,
        /// ClassMember nodes
        members: Vec<NodeId>,
        /// Class in expression position
        is_expression: bool,
        /// Class body scope
        scope: ScopeId,
    },
    /// Method, accessor or field of a class
    ClassMember {
        /// PropertyName, literal, or computed key expression
        key: NodeId,
        /// Function object or field initializer
        value: Option<NodeId>,
        /// Member kind
        kind: ClassMemberKind,
        /// static member
        is_static: bool,
        /// `[key]`
        computed: bool,
    },
    /// return statement
    Return {
        /// Returned value
        value: Option<NodeId>,
    },
    /// if statement
    If {
        /// Condition
        condition: NodeId,
        /// Consequent statement
        consequent: NodeId,
        /// Alternate statement
        alternate: Option<NodeId>,
    },
    /// while loop
    While {
        /// Condition
        condition: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// do-while loop
    DoWhile {
        /// Loop body
        body: NodeId,
        /// Condition
        condition: NodeId,
    },
    /// for(;;) loop
    For {
        /// Initializer (declaration or expression)
        init: Option<NodeId>,
        /// Condition
        condition: Option<NodeId>,
        /// Update expression
        update: Option<NodeId>,
        /// Loop body
        body: NodeId,
        /// Scope of let/const declared in the head
        scope: Option<ScopeId>,
    },
    /// for-in / for-of loop
    ForIn {
        /// Declaration or assignment target
        left: NodeId,
        /// Iterated object
        right: NodeId,
        /// Loop body
        body: NodeId,
        /// for-of instead of for-in
        is_of: bool,
        /// for await
        is_await: bool,
        /// Scope of let/const declared in the head
        scope: Option<ScopeId>,
    },
    /// break statement
    Break {
        /// Target label
        label: Option<String>,
    },
    /// continue statement
    Continue {
        /// Target label
        label: Option<String>,
    },
    /// throw statement
    Throw {
        /// Thrown value
        value: NodeId,
    },
    /// try statement
    Try {
        /// Protected block
        body: NodeId,
        /// Catch parameter pattern
        catch_binding: Option<NodeId>,
        /// Catch block
        catch_body: Option<NodeId>,
        /// Scope holding the catch parameter
        catch_scope: Option<ScopeId>,
        /// Finally block
        finally: Option<NodeId>,
    },
    /// switch statement
    Switch {
        /// Switched value
        discriminant: NodeId,
        /// SwitchCase nodes
        cases: Vec<NodeId>,
        /// Lexical scope of the case block
        scope: Option<ScopeId>,
    },
    /// case / default clause
    SwitchCase {
        /// Case value; None for default
        test: Option<NodeId>,
        /// Clause statements
        statements: Vec<NodeId>,
    },
    /// with statement
    With {
        /// Scope object expression
        object: NodeId,
        /// Body statement
        body: NodeId,
        /// With scope
        scope: ScopeId,
    },
    /// `label: statement`
    Labeled {
        /// Label name
        label: String,
        /// Labeled statement
        body: NodeId,
    },
    /// debugger statement
    Debugger,
    /// Empty statement
    Empty,
    /// Preserved `/*! ... */` comment
    ImportantComment {
        /// Full comment text
        text: String,
    },
    /// `/*@ ... @*/` conditional-compilation comment
    CcComment {
        /// Statements inside the comment
        statements: Vec<NodeId>,
    },
    /// `@cc_on`
    CcOn,
    /// `@set @name = value`
    CcSet {
        /// Variable name without `@`
        name: String,
        /// Assigned value
        value: NodeId,
    },
    /// `@if (condition)`
    CcIf {
        /// Condition
        condition: NodeId,
    },
    /// `@elif (condition)`
    CcElseIf {
        /// Condition
        condition: NodeId,
    },
    /// `@else`
    CcElse,
    /// `@end`
    CcEnd,
    /// `@name` compilation variable
    CcVariable {
        /// Variable name without `@`
        name: String,
    },
    /// import declaration
    Import {
        /// ImportSpecifier nodes
        specifiers: Vec<NodeId>,
        /// Module specifier
        source: String,
    },
    /// One imported binding
    ImportSpecifier {
        /// Specifier form
        kind: ImportKind,
        /// Imported export name for named imports
        imported: Option<String>,
        /// Local binding identifier
        local: NodeId,
    },
    /// export declaration
    Export {
        /// Export form
        kind: ExportKind,
        /// Exported declaration or default expression
        declaration: Option<NodeId>,
        /// ExportSpecifier nodes
        specifiers: Vec<NodeId>,
        /// Re-export module specifier
        source: Option<String>,
        /// `export * as name`
        namespace: Option<String>,
    },
    /// One exported name
    ExportSpecifier {
        /// Lookup of the local binding, or PropertyName when re-exporting
        local: NodeId,
        /// Exported name when different from the local name
        exported: Option<String>,
    },
    /// Identifier reference
    Lookup {
        /// Referenced name
        name: String,
        /// Field the reference resolves to
        field: Option<FieldId>,
        /// How the name is used
        ref_type: ReferenceType,
    },
    /// Number, string, boolean or null literal
    Constant(Literal),
    /// BigInt literal
    BigInt {
        /// Source digits without the `n` suffix
        digits: String,
    },
    /// Regular expression literal
    RegExp {
        /// Pattern source
        pattern: String,
        /// Flags
        flags: String,
    },
    /// Template literal
    Template {
        /// Tag function
        tag: Option<NodeId>,
        /// Raw text pieces, one more than the expressions
        quasis: Vec<String>,
        /// Substitutions
        expressions: Vec<NodeId>,
    },
    /// this
    This,
    /// super
    Super,
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: NodeId,
    },
    /// ++ / --
    Update {
        /// Operator
        op: UpdateOp,
        /// Prefix form
        prefix: bool,
        /// Operand
        operand: NodeId,
    },
    /// Binary, assignment or comma operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: NodeId,
        /// Right operand
        right: NodeId,
    },
    /// `a ? b : c`
    Conditional {
        /// Condition
        condition: NodeId,
        /// Value when true
        consequent: NodeId,
        /// Value when false
        alternate: NodeId,
    },
    /// Call or `new` expression
    Call {
        /// Callee
        callee: NodeId,
        /// Arguments
        arguments: Vec<NodeId>,
        /// new expression
        is_new: bool,
        /// `?.()`
        optional: bool,
    },
    /// `object.name`
    Member {
        /// Object
        object: NodeId,
        /// Property name
        name: String,
        /// `?.`
        optional: bool,
    },
    /// `object[index]`
    Index {
        /// Object
        object: NodeId,
        /// Property expression
        index: NodeId,
        /// `?.[`
        optional: bool,
    },
    /// Array literal; None elements are holes
    ArrayLiteral {
        /// Elements
        elements: Vec<Option<NodeId>>,
    },
    /// Object literal
    ObjectLiteral {
        /// ObjectProperty and Spread nodes
        properties: Vec<NodeId>,
        /// Keep keys quoted exactly as they are
        preserve_quotes: bool,
    },
    /// Property of an object literal or object pattern
    ObjectProperty {
        /// PropertyName, literal, or computed key expression
        key: NodeId,
        /// Value or pattern
        value: NodeId,
        /// Property form
        kind: PropertyKind,
        /// `[key]`
        computed: bool,
    },
    /// Identifier used as a property key
    PropertyName {
        /// Key text
        name: String,
    },
    /// `...argument`
    Spread {
        /// Spread operand
        argument: NodeId,
    },
    /// Parenthesized expression
    Grouping {
        /// Inner expression
        expression: NodeId,
    },
    /// yield expression
    Yield {
        /// Yielded value
        argument: Option<NodeId>,
        /// `yield*`
        delegate: bool,
    },
    /// await expression
    Await {
        /// Awaited value
        argument: NodeId,
    },
    /// new.target
    NewTarget,
    /// Unresolved `%name:fallback%` marker kept verbatim
    ReplacementToken {
        /// Token name
        name: String,
        /// Fallback name
        fallback: Option<String>,
    },
    /// Declared name in a binding position
    BindingIdentifier {
        /// Bound name
        name: String,
        /// Field the declaration registered
        field: Option<FieldId>,
    },
    /// `[a, , b] = ...` binding pattern
    ArrayPattern {
        /// Element patterns; None elements are holes
        elements: Vec<Option<NodeId>>,
    },
    /// `{ a, b: c } = ...` binding pattern
    ObjectPattern {
        /// ObjectProperty and RestElement nodes
        properties: Vec<NodeId>,
    },
    /// `target = default` in a pattern
    AssignmentPattern {
        /// Bound pattern
        target: NodeId,
        /// Default value
        default: NodeId,
    },
    /// `...target` in a pattern or parameter list
    RestElement {
        /// Bound pattern
        argument: NodeId,
    },
}

impl NodeKind {
    /// Child slots in source order. Holes in arrays are skipped.
    pub fn children(&self) -> Vec<NodeId> {
        fn opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
            if let Some(id) = id {
                out.push(*id);
            }
        }
        let mut out = Vec::new();
        match self {
            NodeKind::Program { statements, .. }
            | NodeKind::Block { statements, .. }
            | NodeKind::CcComment { statements } => out.extend(statements),
            NodeKind::Var { declarators, .. } => out.extend(declarators),
            NodeKind::VariableDeclarator { target, init } => {
                out.push(*target);
                opt(&mut out, init);
            }
            NodeKind::FunctionObject {
                binding,
                params,
                body,
                ..
            } => {
                opt(&mut out, binding);
                out.extend(params);
                out.push(*body);
            }
            NodeKind::Class {
                binding,
                heritage,
                members,
                ..
            } => {
                opt(&mut out, binding);
                opt(&mut out, heritage);
                out.extend(members);
            }
            NodeKind::ClassMember { key, value, .. } => {
                out.push(*key);
                opt(&mut out, value);
            }
            NodeKind::Return { value } => opt(&mut out, value),
            NodeKind::If {
                condition,
                consequent,
                alternate,
            } => {
                out.push(*condition);
                out.push(*consequent);
                opt(&mut out, alternate);
            }
            NodeKind::While { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            NodeKind::DoWhile { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                opt(&mut out, init);
                opt(&mut out, condition);
                opt(&mut out, update);
                out.push(*body);
            }
            NodeKind::ForIn {
                left, right, body, ..
            } => {
                out.push(*left);
                out.push(*right);
                out.push(*body);
            }
            NodeKind::Throw { value } => out.push(*value),
            NodeKind::Try {
                body,
                catch_binding,
                catch_body,
                finally,
                ..
            } => {
                out.push(*body);
                opt(&mut out, catch_binding);
                opt(&mut out, catch_body);
                opt(&mut out, finally);
            }
            NodeKind::Switch {
                discriminant,
                cases,
                ..
            } => {
                out.push(*discriminant);
                out.extend(cases);
            }
            NodeKind::SwitchCase { test, statements } => {
                opt(&mut out, test);
                out.extend(statements);
            }
            NodeKind::With { object, body, .. } => {
                out.push(*object);
                out.push(*body);
            }
            NodeKind::Labeled { body, .. } => out.push(*body),
            NodeKind::CcSet { value, .. } => out.push(*value),
            NodeKind::CcIf { condition } | NodeKind::CcElseIf { condition } => {
                out.push(*condition)
            }
            NodeKind::Import { specifiers, .. } => out.extend(specifiers),
            NodeKind::ImportSpecifier { local, .. } => out.push(*local),
            NodeKind::Export {
                declaration,
                specifiers,
                ..
            } => {
                opt(&mut out, declaration);
                out.extend(specifiers);
            }
            NodeKind::ExportSpecifier { local, .. } => out.push(*local),
            NodeKind::Template {
                tag, expressions, ..
            } => {
                opt(&mut out, tag);
                out.extend(expressions);
            }
            NodeKind::Unary { operand, .. } | NodeKind::Update { operand, .. } => {
                out.push(*operand)
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                out.push(*condition);
                out.push(*consequent);
                out.push(*alternate);
            }
            NodeKind::Call {
                callee, arguments, ..
            } => {
                out.push(*callee);
                out.extend(arguments);
            }
            NodeKind::Member { object, .. } => out.push(*object),
            NodeKind::Index { object, index, .. } => {
                out.push(*object);
                out.push(*index);
            }
            NodeKind::ArrayLiteral { elements } | NodeKind::ArrayPattern { elements } => {
                out.extend(elements.iter().flatten())
            }
            NodeKind::ObjectLiteral { properties, .. }
            | NodeKind::ObjectPattern { properties } => out.extend(properties),
            NodeKind::ObjectProperty { key, value, .. } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::Spread { argument }
            | NodeKind::Await { argument }
            | NodeKind::RestElement { argument } => out.push(*argument),
            NodeKind::Grouping { expression } => out.push(*expression),
            NodeKind::Yield { argument, .. } => opt(&mut out, argument),
            NodeKind::AssignmentPattern { target, default } => {
                out.push(*target);
                out.push(*default);
            }
            NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Debugger
            | NodeKind::Empty
            | NodeKind::ImportantComment { .. }
            | NodeKind::CcOn
            | NodeKind::CcElse
            | NodeKind::CcEnd
            | NodeKind::CcVariable { .. }
            | NodeKind::Lookup { .. }
            | NodeKind::Constant(_)
            | NodeKind::BigInt { .. }
            | NodeKind::RegExp { .. }
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::NewTarget
            | NodeKind::ReplacementToken { .. }
            | NodeKind::PropertyName { .. }
            | NodeKind::BindingIdentifier { .. } => {}
        }
        out
    }

    /// Mutable child slots, in the same order as [`NodeKind::children`].
    fn child_slots_mut(&mut self) -> Vec<&mut NodeId> {
        let mut out: Vec<&mut NodeId> = Vec::new();
        match self {
            NodeKind::Program { statements, .. }
            | NodeKind::Block { statements, .. }
            | NodeKind::CcComment { statements } => out.extend(statements.iter_mut()),
            NodeKind::Var { declarators, .. } => out.extend(declarators.iter_mut()),
            NodeKind::VariableDeclarator { target, init } => {
                out.push(target);
                out.extend(init.as_mut());
            }
            NodeKind::FunctionObject {
                binding,
                params,
                body,
                ..
            } => {
                out.extend(binding.as_mut());
                out.extend(params.iter_mut());
                out.push(body);
            }
            NodeKind::Class {
                binding,
                heritage,
                members,
                ..
            } => {
                out.extend(binding.as_mut());
                out.extend(heritage.as_mut());
                out.extend(members.iter_mut());
            }
            NodeKind::ClassMember { key, value, .. } => {
                out.push(key);
                out.extend(value.as_mut());
            }
            NodeKind::Return { value } => out.extend(value.as_mut()),
            NodeKind::If {
                condition,
                consequent,
                alternate,
            } => {
                out.push(condition);
                out.push(consequent);
                out.extend(alternate.as_mut());
            }
            NodeKind::While { condition, body } => {
                out.push(condition);
                out.push(body);
            }
            NodeKind::DoWhile { body, condition } => {
                out.push(body);
                out.push(condition);
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                out.extend(init.as_mut());
                out.extend(condition.as_mut());
                out.extend(update.as_mut());
                out.push(body);
            }
            NodeKind::ForIn {
                left, right, body, ..
            } => {
                out.push(left);
                out.push(right);
                out.push(body);
            }
            NodeKind::Throw { value } => out.push(value),
            NodeKind::Try {
                body,
                catch_binding,
                catch_body,
                finally,
                ..
            } => {
                out.push(body);
                out.extend(catch_binding.as_mut());
                out.extend(catch_body.as_mut());
                out.extend(finally.as_mut());
            }
            NodeKind::Switch {
                discriminant,
                cases,
                ..
            } => {
                out.push(discriminant);
                out.extend(cases.iter_mut());
            }
            NodeKind::SwitchCase { test, statements } => {
                out.extend(test.as_mut());
                out.extend(statements.iter_mut());
            }
            NodeKind::With { object, body, .. } => {
                out.push(object);
                out.push(body);
            }
            NodeKind::Labeled { body, .. } => out.push(body),
            NodeKind::CcSet { value, .. } => out.push(value),
            NodeKind::CcIf { condition } | NodeKind::CcElseIf { condition } => {
                out.push(condition)
            }
            NodeKind::Import { specifiers, .. } => out.extend(specifiers.iter_mut()),
            NodeKind::ImportSpecifier { local, .. } => out.push(local),
            NodeKind::Export {
                declaration,
                specifiers,
                ..
            } => {
                out.extend(declaration.as_mut());
                out.extend(specifiers.iter_mut());
            }
            NodeKind::ExportSpecifier { local, .. } => out.push(local),
            NodeKind::Template {
                tag, expressions, ..
            } => {
                out.extend(tag.as_mut());
                out.extend(expressions.iter_mut());
            }
            NodeKind::Unary { operand, .. } | NodeKind::Update { operand, .. } => {
                out.push(operand)
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                out.push(condition);
                out.push(consequent);
                out.push(alternate);
            }
            NodeKind::Call {
                callee, arguments, ..
            } => {
                out.push(callee);
                out.extend(arguments.iter_mut());
            }
            NodeKind::Member { object, .. } => out.push(object),
            NodeKind::Index { object, index, .. } => {
                out.push(object);
                out.push(index);
            }
            NodeKind::ArrayLiteral { elements } | NodeKind::ArrayPattern { elements } => {
                out.extend(elements.iter_mut().flatten())
            }
            NodeKind::ObjectLiteral { properties, .. }
            | NodeKind::ObjectPattern { properties } => out.extend(properties.iter_mut()),
            NodeKind::ObjectProperty { key, value, .. } => {
                out.push(key);
                out.push(value);
            }
            NodeKind::Spread { argument }
            | NodeKind::Await { argument }
            | NodeKind::RestElement { argument } => out.push(argument),
            NodeKind::Grouping { expression } => out.push(expression),
            NodeKind::Yield { argument, .. } => out.extend(argument.as_mut()),
            NodeKind::AssignmentPattern { target, default } => {
                out.push(target);
                out.push(default);
            }
            _ => {}
        }
        out
    }

    /// Whether the node is an expression (can stand as an operand).
    pub fn is_expression(&self) -> bool {
        match self {
            NodeKind::Lookup { .. }
            | NodeKind::Constant(_)
            | NodeKind::BigInt { .. }
            | NodeKind::RegExp { .. }
            | NodeKind::Template { .. }
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::Unary { .. }
            | NodeKind::Update { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::Call { .. }
            | NodeKind::Member { .. }
            | NodeKind::Index { .. }
            | NodeKind::ArrayLiteral { .. }
            | NodeKind::ObjectLiteral { .. }
            | NodeKind::Grouping { .. }
            | NodeKind::Yield { .. }
            | NodeKind::Await { .. }
            | NodeKind::NewTarget
            | NodeKind::ReplacementToken { .. }
            | NodeKind::CcVariable { .. } => true,
            NodeKind::FunctionObject { kind, .. } => {
                matches!(kind, FunctionKind::Expression | FunctionKind::Arrow)
            }
            NodeKind::Class { is_expression, .. } => *is_expression,
            _ => false,
        }
    }

    /// Whether the node introduces `var`-style hoisted names that must
    /// survive dead-code removal.
    pub fn is_hoisted_declaration(&self) -> bool {
        match self {
            NodeKind::Var { kind, .. } => *kind == DeclarationKind::Var,
            NodeKind::FunctionObject { kind, .. } => *kind == FunctionKind::Declaration,
            _ => false,
        }
    }

    /// Compares the non-child data of two nodes.
    fn same_shape(&self, other: &NodeKind) -> bool {
        use NodeKind as K;
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }
        match (self, other) {
            (K::Block { concise: a, .. }, K::Block { concise: b, .. }) => a == b,
            (K::Var { kind: a, .. }, K::Var { kind: b, .. }) => a == b,
            (
                K::FunctionObject {
                    kind: ka,
                    is_async: aa,
                    is_generator: ga,
                    params: pa,
                    ..
                },
                K::FunctionObject {
                    kind: kb,
                    is_async: ab,
                    is_generator: gb,
                    params: pb,
                    ..
                },
            ) => ka == kb && aa == ab && ga == gb && pa.len() == pb.len(),
            (
                K::ClassMember {
                    kind: ka,
                    is_static: sa,
                    computed: ca,
                    ..
                },
                K::ClassMember {
                    kind: kb,
                    is_static: sb,
                    computed: cb,
                    ..
                },
            ) => ka == kb && sa == sb && ca == cb,
            (K::ForIn { is_of: a, is_await: x, .. }, K::ForIn { is_of: b, is_await: y, .. }) => {
                a == b && x == y
            }
            (K::Break { label: a }, K::Break { label: b })
            | (K::Continue { label: a }, K::Continue { label: b }) => a == b,
            (K::Labeled { label: a, .. }, K::Labeled { label: b, .. }) => a == b,
            (K::ImportantComment { text: a }, K::ImportantComment { text: b }) => a == b,
            (K::CcSet { name: a, .. }, K::CcSet { name: b, .. })
            | (K::CcVariable { name: a }, K::CcVariable { name: b })
            | (K::Lookup { name: a, .. }, K::Lookup { name: b, .. })
            | (K::Member { name: a, .. }, K::Member { name: b, .. })
            | (K::PropertyName { name: a }, K::PropertyName { name: b })
            | (K::BindingIdentifier { name: a, .. }, K::BindingIdentifier { name: b, .. }) => {
                a == b
            }
            (K::Import { source: a, .. }, K::Import { source: b, .. }) => a == b,
            (
                K::ImportSpecifier {
                    kind: ka,
                    imported: ia,
                    ..
                },
                K::ImportSpecifier {
                    kind: kb,
                    imported: ib,
                    ..
                },
            ) => ka == kb && ia == ib,
            (
                K::Export {
                    kind: ka,
                    source: sa,
                    namespace: na,
                    ..
                },
                K::Export {
                    kind: kb,
                    source: sb,
                    namespace: nb,
                    ..
                },
            ) => ka == kb && sa == sb && na == nb,
            (K::ExportSpecifier { exported: a, .. }, K::ExportSpecifier { exported: b, .. }) => {
                a == b
            }
            (K::Constant(a), K::Constant(b)) => match (a, b) {
                (Literal::Number(x), Literal::Number(y)) => {
                    x == y || (x.is_nan() && y.is_nan())
                }
                _ => a == b,
            },
            (K::BigInt { digits: a }, K::BigInt { digits: b }) => a == b,
            (
                K::RegExp {
                    pattern: pa,
                    flags: fa,
                },
                K::RegExp {
                    pattern: pb,
                    flags: fb,
                },
            ) => pa == pb && fa == fb,
            (
                K::Template {
                    tag: ta, quasis: qa, ..
                },
                K::Template {
                    tag: tb, quasis: qb, ..
                },
            ) => ta.is_some() == tb.is_some() && qa == qb,
            (K::Unary { op: a, .. }, K::Unary { op: b, .. }) => a == b,
            (
                K::Update {
                    op: a, prefix: x, ..
                },
                K::Update {
                    op: b, prefix: y, ..
                },
            ) => a == b && x == y,
            (K::Binary { op: a, .. }, K::Binary { op: b, .. }) => a == b,
            (
                K::Call {
                    is_new: na,
                    optional: oa,
                    arguments: aa,
                    ..
                },
                K::Call {
                    is_new: nb,
                    optional: ob,
                    arguments: ab,
                    ..
                },
            ) => na == nb && oa == ob && aa.len() == ab.len(),
            (K::Index { optional: a, .. }, K::Index { optional: b, .. }) => a == b,
            (K::ArrayLiteral { elements: a }, K::ArrayLiteral { elements: b })
            | (K::ArrayPattern { elements: a }, K::ArrayPattern { elements: b }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_some() == y.is_some())
            }
            (
                K::ObjectProperty {
                    kind: ka,
                    computed: ca,
                    ..
                },
                K::ObjectProperty {
                    kind: kb,
                    computed: cb,
                    ..
                },
            ) => ka == kb && ca == cb,
            (K::Yield { delegate: a, .. }, K::Yield { delegate: b, .. }) => a == b,
            (
                K::ReplacementToken {
                    name: na,
                    fallback: fa,
                },
                K::ReplacementToken {
                    name: nb,
                    fallback: fb,
                },
            ) => na == nb && fa == fb,
            _ => true,
        }
    }
}

/// One node in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node payload
    pub kind: NodeKind,
    /// Source span
    pub context: SourceSpan,
    /// Containing node; None for roots and detached nodes
    pub parent: Option<NodeId>,
}

/// Arena that owns every node of a compilation.
///
/// # Examples
///
/// ```
/// use core_types::SourceSpan;
/// use parser::ast::{Ast, Literal, NodeKind};
///
/// let mut ast = Ast::new();
/// let one = ast.alloc(NodeKind::Constant(Literal::Number(1.0)), SourceSpan::default());
/// let ret = ast.alloc(NodeKind::Return { value: Some(one) }, SourceSpan::default());
/// assert_eq!(ast.parent(one), Some(ret));
/// assert_eq!(ast.children(ret), vec![one]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    files: Vec<String>,
}

impl Ast {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source file name and returns its id.
    pub fn add_file(&mut self, name: impl Into<String>) -> FileId {
        self.files.push(name.into());
        FileId(self.files.len() as u32 - 1)
    }

    /// Number of registered file names.
    pub fn file_count(&self) -> u32 {
        self.files.len() as u32
    }

    /// Name of a registered file.
    pub fn file_name(&self, file: FileId) -> Option<&str> {
        self.files.get(file.0 as usize).map(String::as_str)
    }

    /// Number of allocated nodes, live or detached.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node was ever allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a node and adopts its children.
    pub fn alloc(&mut self, kind: NodeKind, context: SourceSpan) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            context,
            parent: None,
        });
        id
    }

    /// Node by id.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Payload of a node.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Mutable payload of a node.
    ///
    /// Callers that change child slots through this must keep parent links
    /// consistent; prefer [`Ast::replace_child`] and the statement-list
    /// operations.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    /// Source span of a node.
    pub fn context(&self, id: NodeId) -> SourceSpan {
        self.nodes[id.index()].context
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Children of a node in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// Replaces the payload of a node in place, adopting the new children.
    ///
    /// Children of the old payload that are not children of the new one are
    /// detached.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        let new_children = kind.children();
        for old in self.kind(id).children() {
            if !new_children.contains(&old) {
                self.nodes[old.index()].parent = None;
            }
        }
        for child in new_children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes[id.index()].kind = kind;
    }

    /// Replaces `old` with `new` in `parent`'s child slots.
    ///
    /// `new` is adopted by `parent` and `old` is left detached. Replacing the
    /// single expression of a concise body with a non-expression makes the
    /// body a regular block. Returns false when `old` is not a child of
    /// `parent`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        let found = match self.nodes[parent.index()]
            .kind
            .child_slots_mut()
            .into_iter()
            .find(|slot| **slot == old)
        {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        };
        if !found {
            return false;
        }
        if let Some(previous) = self.nodes[new.index()].parent {
            if previous != parent {
                self.detach_from(previous, new);
            }
        }
        self.nodes[old.index()].parent = None;
        self.nodes[new.index()].parent = Some(parent);
        let new_is_expression = self.kind(new).is_expression();
        if let NodeKind::Block { concise, .. } = &mut self.nodes[parent.index()].kind {
            if *concise && !new_is_expression {
                *concise = false;
            }
        }
        true
    }

    /// Removes `child` from a statement list of `parent`, if it sits in one.
    fn detach_from(&mut self, parent: NodeId, child: NodeId) {
        if let Some(list) = self.statement_list_mut(parent) {
            list.retain(|id| *id != child);
        }
    }

    /// Replaces `old` in its own parent; see [`Ast::replace_child`].
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        match self.parent(old) {
            Some(parent) => self.replace_child(parent, old, new),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Statement lists
    // ------------------------------------------------------------------

    fn statement_list_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Program { statements, .. }
            | NodeKind::Block { statements, .. }
            | NodeKind::SwitchCase { statements, .. }
            | NodeKind::CcComment { statements } => Some(statements),
            _ => None,
        }
    }

    /// Statements of a program, block, switch case or conditional comment.
    pub fn statements(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Program { statements, .. }
            | NodeKind::Block { statements, .. }
            | NodeKind::SwitchCase { statements, .. }
            | NodeKind::CcComment { statements } => statements,
            _ => &[],
        }
    }

    /// Whether a block is an expression-bodied arrow body.
    pub fn is_concise(&self, block: NodeId) -> bool {
        matches!(self.kind(block), NodeKind::Block { concise: true, .. })
    }

    /// Turns a concise body into a regular block whose single statement
    /// returns the original expression.
    fn expand_concise(&mut self, block: NodeId) {
        let expression = match &self.nodes[block.index()].kind {
            NodeKind::Block {
                concise: true,
                statements,
                ..
            } => statements.first().copied(),
            _ => return,
        };
        if let Some(expression) = expression {
            let context = self.context(expression);
            let ret = self.alloc(
                NodeKind::Return {
                    value: Some(expression),
                },
                context,
            );
            if let NodeKind::Block { statements, .. } = &mut self.nodes[block.index()].kind {
                statements[0] = ret;
            }
            self.nodes[ret.index()].parent = Some(block);
        }
        self.clear_concise(block);
    }

    fn clear_concise(&mut self, block: NodeId) {
        if let NodeKind::Block { concise, .. } = &mut self.nodes[block.index()].kind {
            *concise = false;
        }
    }

    /// Appends a statement to a statement list.
    ///
    /// A concise arrow body becomes a block that returns its expression
    /// before the new statement is added.
    pub fn append(&mut self, list: NodeId, statement: NodeId) {
        let len = self.statements(list).len();
        self.insert(list, len, statement);
    }

    /// Inserts a statement at `index` of a statement list.
    pub fn insert(&mut self, list: NodeId, index: usize, statement: NodeId) {
        if self.is_concise(list) {
            self.expand_concise(list);
        }
        if let Some(previous) = self.parent(statement) {
            self.detach_from(previous, statement);
        }
        if let Some(statements) = self.statement_list_mut(list) {
            let index = index.min(statements.len());
            statements.insert(index, statement);
            self.nodes[statement.index()].parent = Some(list);
        }
    }

    /// Removes and returns the statement at `index`.
    pub fn remove_at(&mut self, list: NodeId, index: usize) -> Option<NodeId> {
        let removed = {
            let statements = self.statement_list_mut(list)?;
            if index >= statements.len() {
                return None;
            }
            statements.remove(index)
        };
        self.clear_concise(list);
        self.nodes[removed.index()].parent = None;
        Some(removed)
    }

    /// Removes `statement` from the list that holds it.
    pub fn remove_statement(&mut self, statement: NodeId) -> bool {
        let Some(list) = self.parent(statement) else {
            return false;
        };
        match self.statements(list).iter().position(|id| *id == statement) {
            Some(index) => self.remove_at(list, index).is_some(),
            None => false,
        }
    }

    /// Empties a statement list.
    pub fn clear(&mut self, list: NodeId) {
        let removed = match self.statement_list_mut(list) {
            Some(statements) => std::mem::take(statements),
            None => return,
        };
        for id in removed {
            self.nodes[id.index()].parent = None;
        }
        self.clear_concise(list);
    }

    /// Replaces the whole content of a statement list.
    pub fn set_statements(&mut self, list: NodeId, new_statements: Vec<NodeId>) {
        let old = match self.statement_list_mut(list) {
            Some(statements) => std::mem::take(statements),
            None => return,
        };
        for id in old {
            if !new_statements.contains(&id) {
                self.nodes[id.index()].parent = None;
            }
        }
        for id in &new_statements {
            self.nodes[id.index()].parent = Some(list);
        }
        let single_expression =
            new_statements.len() == 1 && self.kind(new_statements[0]).is_expression();
        if let Some(statements) = self.statement_list_mut(list) {
            *statements = new_statements;
        }
        if !single_expression {
            self.clear_concise(list);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All nodes reachable from `root`, in pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children = self.children(id);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |node| self.parent(*node))
    }

    /// Strips any number of parentheses.
    pub fn unwrap_grouping(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Grouping { expression } = self.kind(id) {
            id = *expression;
        }
        id
    }

    /// Dotted name of a `a.b.c` member chain rooted at a lookup.
    pub fn member_chain(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Lookup { name, .. } => Some(name.clone()),
            NodeKind::Member { object, name, .. } => {
                let mut chain = self.member_chain(*object)?;
                chain.push('.');
                chain.push_str(name);
                Some(chain)
            }
            _ => None,
        }
    }

    /// Structural equivalence: same shape and literal values, ignoring
    /// spans, scopes and resolved fields.
    pub fn is_equivalent(&self, a: NodeId, b: NodeId) -> bool {
        self.is_equivalent_across(a, self, b)
    }

    /// Structural equivalence of `a` in this arena and `b` in `other`.
    pub fn is_equivalent_across(&self, a: NodeId, other: &Ast, b: NodeId) -> bool {
        let (ka, kb) = (self.kind(a), other.kind(b));
        if !ka.same_shape(kb) {
            return false;
        }
        let (ca, cb) = (ka.children(), kb.children());
        ca.len() == cb.len()
            && ca
                .iter()
                .zip(&cb)
                .all(|(x, y)| self.is_equivalent_across(*x, other, *y))
    }

    /// Checks the tree invariant below `root`: every child's parent link
    /// points back at the node that holds it.
    pub fn check_parent_links(&self, root: NodeId) -> bool {
        self.descendants(root).into_iter().all(|id| {
            self.children(id)
                .into_iter()
                .all(|child| self.parent(child) == Some(id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> SourceSpan {
        SourceSpan::default()
    }

    fn lookup(ast: &mut Ast, name: &str) -> NodeId {
        ast.alloc(
            NodeKind::Lookup {
                name: name.to_string(),
                field: None,
                ref_type: ReferenceType::Variable,
            },
            span(),
        )
    }

    fn concise_body(ast: &mut Ast) -> (NodeId, NodeId) {
        let a = lookup(ast, "a");
        let b = lookup(ast, "b");
        let sum = ast.alloc(
            NodeKind::Binary {
                op: BinaryOp::Add,
                left: a,
                right: b,
            },
            span(),
        );
        let block = ast.alloc(
            NodeKind::Block {
                statements: vec![sum],
                scope: None,
                concise: true,
            },
            span(),
        );
        (block, sum)
    }

    #[test]
    fn test_alloc_sets_parents() {
        let mut ast = Ast::new();
        let (block, sum) = concise_body(&mut ast);
        assert_eq!(ast.parent(sum), Some(block));
        assert!(ast.check_parent_links(block));
    }

    #[test]
    fn test_append_to_concise_body_adds_return() {
        let mut ast = Ast::new();
        let (block, sum) = concise_body(&mut ast);
        let debugger = ast.alloc(NodeKind::Debugger, span());
        ast.append(block, debugger);

        assert!(!ast.is_concise(block));
        let statements = ast.statements(block).to_vec();
        assert_eq!(statements.len(), 2);
        assert_eq!(ast.kind(statements[0]), &NodeKind::Return { value: Some(sum) });
        assert_eq!(ast.parent(sum), Some(statements[0]));
        assert!(ast.check_parent_links(block));
    }

    #[test]
    fn test_replace_child_reparents() {
        let mut ast = Ast::new();
        let (block, sum) = concise_body(&mut ast);
        let c = lookup(&mut ast, "c");
        assert!(ast.replace_child(block, sum, c));
        assert_eq!(ast.parent(sum), None);
        assert_eq!(ast.parent(c), Some(block));
        assert!(ast.is_concise(block));

        let empty = ast.alloc(NodeKind::Empty, span());
        assert!(ast.replace_child(block, c, empty));
        assert!(!ast.is_concise(block));
        assert!(!ast.replace_child(block, c, empty));
    }

    #[test]
    fn test_clear_and_remove_drop_concise_flag() {
        let mut ast = Ast::new();
        let (block, sum) = concise_body(&mut ast);
        assert_eq!(ast.remove_at(block, 0), Some(sum));
        assert!(!ast.is_concise(block));
        assert_eq!(ast.parent(sum), None);

        let (block, _) = concise_body(&mut ast);
        ast.clear(block);
        assert!(ast.statements(block).is_empty());
        assert!(!ast.is_concise(block));
    }

    #[test]
    fn test_moving_statement_between_lists() {
        let mut ast = Ast::new();
        let stmt = ast.alloc(NodeKind::Debugger, span());
        let first = ast.alloc(
            NodeKind::Block {
                statements: vec![stmt],
                scope: None,
                concise: false,
            },
            span(),
        );
        let second = ast.alloc(
            NodeKind::Block {
                statements: vec![],
                scope: None,
                concise: false,
            },
            span(),
        );
        ast.append(second, stmt);
        assert!(ast.statements(first).is_empty());
        assert_eq!(ast.statements(second), &[stmt]);
        assert_eq!(ast.parent(stmt), Some(second));
    }

    #[test]
    fn test_is_equivalent() {
        let mut ast = Ast::new();
        let (x, _) = concise_body(&mut ast);
        let (y, _) = concise_body(&mut ast);
        assert!(ast.is_equivalent(x, y));
        let one = ast.alloc(NodeKind::Constant(Literal::Number(1.0)), span());
        let two = ast.alloc(NodeKind::Constant(Literal::Number(2.0)), span());
        assert!(!ast.is_equivalent(one, two));
        assert!(!ast.is_equivalent(x, one));
    }

    #[test]
    fn test_member_chain() {
        let mut ast = Ast::new();
        let msn = lookup(&mut ast, "Msn");
        let debug = ast.alloc(
            NodeKind::Member {
                object: msn,
                name: "Debug".to_string(),
                optional: false,
            },
            span(),
        );
        assert_eq!(ast.member_chain(debug).as_deref(), Some("Msn.Debug"));
    }
}
