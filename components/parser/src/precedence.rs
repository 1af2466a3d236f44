//! Operator precedence table
//!
//! The parser climbs binary operators by looking up each punctuator or
//! keyword here; the emitter uses the same levels to decide where
//! parentheses are required.

use crate::ast::{BinaryOp, NodeKind};
use crate::lexer::{Keyword, Punctuator, Token};

/// Precedence levels, lowest binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// `,`
    Comma,
    /// `=`, `+=`, ..., also arrow functions and yield
    Assignment,
    /// `?:`
    Conditional,
    /// `??`
    Coalesce,
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `&`
    BitwiseAnd,
    /// `==`, `!=`, `===`, `!==`
    Equality,
    /// `<`, `>`, `<=`, `>=`, `instanceof`, `in`
    Relational,
    /// `<<`, `>>`, `>>>`
    Shift,
    /// `+`, `-`
    Additive,
    /// `*`, `/`, `%`
    Multiplicative,
    /// `**`
    Exponent,
    /// Prefix operators
    Unary,
    /// Postfix `++` / `--`
    Postfix,
    /// `new` without arguments
    New,
    /// Calls, member access
    LeftHandSide,
    /// Literals, identifiers, parenthesized expressions
    Primary,
}

/// Associativity of a binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a - b - c` is `(a - b) - c`
    Left,
    /// `a ** b ** c` is `a ** (b ** c)`
    Right,
}

impl BinaryOp {
    /// Precedence level of the operator.
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::Comma => Precedence::Comma,
            op if op.is_assignment() => Precedence::Assignment,
            BinaryOp::NullishCoalescing => Precedence::Coalesce,
            BinaryOp::Or => Precedence::LogicalOr,
            BinaryOp::And => Precedence::LogicalAnd,
            BinaryOp::BitOr => Precedence::BitwiseOr,
            BinaryOp::BitXor => Precedence::BitwiseXor,
            BinaryOp::BitAnd => Precedence::BitwiseAnd,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => {
                Precedence::Equality
            }
            BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::InstanceOf
            | BinaryOp::In => Precedence::Relational,
            BinaryOp::LeftShift | BinaryOp::RightShift | BinaryOp::UnsignedRightShift => {
                Precedence::Shift
            }
            BinaryOp::Add | BinaryOp::Sub => Precedence::Additive,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Precedence::Multiplicative,
            BinaryOp::Exp => Precedence::Exponent,
            _ => Precedence::Assignment,
        }
    }

    /// Associativity of the operator.
    pub fn associativity(&self) -> Associativity {
        if self.is_assignment() || *self == BinaryOp::Exp {
            Associativity::Right
        } else {
            Associativity::Left
        }
    }

    /// Whether `(a op b) op c` equals `a op (b op c)` for every operand, so
    /// the emitter may drop parentheses around a right operand.
    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOp::Comma
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
        )
    }
}

/// Binary operator a token denotes, if any. Assignment operators are not
/// included; the parser handles them separately with right associativity.
pub fn binary_operator(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Keyword(Keyword::Instanceof) => BinaryOp::InstanceOf,
        Token::Keyword(Keyword::In) => BinaryOp::In,
        Token::Punctuator(p) => match p {
            Punctuator::NullishCoalesce => BinaryOp::NullishCoalescing,
            Punctuator::OrOr => BinaryOp::Or,
            Punctuator::AndAnd => BinaryOp::And,
            Punctuator::Or => BinaryOp::BitOr,
            Punctuator::Xor => BinaryOp::BitXor,
            Punctuator::And => BinaryOp::BitAnd,
            Punctuator::EqEq => BinaryOp::Eq,
            Punctuator::NotEq => BinaryOp::NotEq,
            Punctuator::EqEqEq => BinaryOp::StrictEq,
            Punctuator::NotEqEq => BinaryOp::StrictNotEq,
            Punctuator::Lt => BinaryOp::Lt,
            Punctuator::LtEq => BinaryOp::LtEq,
            Punctuator::Gt => BinaryOp::Gt,
            Punctuator::GtEq => BinaryOp::GtEq,
            Punctuator::LtLt => BinaryOp::LeftShift,
            Punctuator::GtGt => BinaryOp::RightShift,
            Punctuator::GtGtGt => BinaryOp::UnsignedRightShift,
            Punctuator::Plus => BinaryOp::Add,
            Punctuator::Minus => BinaryOp::Sub,
            Punctuator::Star => BinaryOp::Mul,
            Punctuator::Slash => BinaryOp::Div,
            Punctuator::Percent => BinaryOp::Mod,
            Punctuator::StarStar => BinaryOp::Exp,
            _ => return None,
        },
        _ => return None,
    };
    Some(op)
}

/// Assignment operator a token denotes, if any.
pub fn assignment_operator(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Punctuator(p) => match p {
            Punctuator::Assign => BinaryOp::Assign,
            Punctuator::PlusEq => BinaryOp::AddAssign,
            Punctuator::MinusEq => BinaryOp::SubAssign,
            Punctuator::StarEq => BinaryOp::MulAssign,
            Punctuator::SlashEq => BinaryOp::DivAssign,
            Punctuator::PercentEq => BinaryOp::ModAssign,
            Punctuator::StarStarEq => BinaryOp::ExpAssign,
            Punctuator::LtLtEq => BinaryOp::LeftShiftAssign,
            Punctuator::GtGtEq => BinaryOp::RightShiftAssign,
            Punctuator::GtGtGtEq => BinaryOp::UnsignedRightShiftAssign,
            Punctuator::AndEq => BinaryOp::BitAndAssign,
            Punctuator::OrEq => BinaryOp::BitOrAssign,
            Punctuator::XorEq => BinaryOp::BitXorAssign,
            Punctuator::AndAndEq => BinaryOp::AndAssign,
            Punctuator::OrOrEq => BinaryOp::OrAssign,
            Punctuator::NullishCoalesceEq => BinaryOp::NullishAssign,
            _ => return None,
        },
        _ => return None,
    };
    Some(op)
}

/// Precedence of an expression node as a whole, for parenthesization.
pub fn node_precedence(kind: &NodeKind) -> Precedence {
    match kind {
        NodeKind::Binary { op, .. } => op.precedence(),
        NodeKind::Conditional { .. } => Precedence::Conditional,
        NodeKind::Yield { .. } => Precedence::Assignment,
        NodeKind::FunctionObject { kind, .. }
            if *kind == crate::ast::FunctionKind::Arrow =>
        {
            Precedence::Assignment
        }
        NodeKind::Unary { .. } | NodeKind::Await { .. } => Precedence::Unary,
        NodeKind::Update { prefix: true, .. } => Precedence::Unary,
        NodeKind::Update { prefix: false, .. } => Precedence::Postfix,
        NodeKind::Call {
            is_new: true,
            arguments,
            ..
        } if arguments.is_empty() => Precedence::New,
        NodeKind::Call { .. }
        | NodeKind::Member { .. }
        | NodeKind::Index { .. }
        | NodeKind::Template { tag: Some(_), .. } => Precedence::LeftHandSide,
        NodeKind::Constant(crate::ast::Literal::Number(n)) if *n < 0.0 || n.is_infinite() => {
            Precedence::Unary
        }
        NodeKind::Grouping { .. } => Precedence::Primary,
        _ => Precedence::Primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Lt.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
        assert!(BinaryOp::Or.precedence() > BinaryOp::NullishCoalescing.precedence());
        assert!(BinaryOp::Assign.precedence() > BinaryOp::Comma.precedence());
    }

    #[test]
    fn test_associativity() {
        assert_eq!(BinaryOp::Exp.associativity(), Associativity::Right);
        assert_eq!(BinaryOp::AddAssign.associativity(), Associativity::Right);
        assert_eq!(BinaryOp::Sub.associativity(), Associativity::Left);
    }

    #[test]
    fn test_token_mapping() {
        assert_eq!(
            binary_operator(&Token::Keyword(Keyword::In)),
            Some(BinaryOp::In)
        );
        assert_eq!(
            binary_operator(&Token::Punctuator(Punctuator::StarStar)),
            Some(BinaryOp::Exp)
        );
        assert_eq!(binary_operator(&Token::Punctuator(Punctuator::Assign)), None);
        assert_eq!(
            assignment_operator(&Token::Punctuator(Punctuator::OrOrEq)),
            Some(BinaryOp::OrAssign)
        );
    }
}
