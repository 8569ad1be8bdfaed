use crate::ident::Ident;
use crate::loc::Loc;
use num_bigint::BigInt;

/// A binary arithmetic or comparison operator, as it appears in `Exp`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Plus,
    Minus,
    Mult,
    Div,
    Mod,
    Shiftlt,
    Shiftrt,
    Band,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    LAnd,
    LOr,
}

/// A unary operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnOp {
    Neg,
    LNot,
}

/// A front-end expression tree: variable, constant, or unary/binary op.
///
/// This is a minimal stand-in for the real SIL expression language (spec §1
/// treats the front-end as an external collaborator); it exists so transfer
/// functions in `bo_domain` and its tests have something concrete to
/// evaluate.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Exp {
    /// An SSA temporary.
    Var(Ident),
    /// A direct reference to a program variable's *location* (an lvalue),
    /// as opposed to its current value.
    Lvar(Loc),
    /// An integer constant.
    Const(BigInt),
    UnOp(UnOp, Box<Exp>),
    BinOp(BinOp, Box<Exp>, Box<Exp>),
}

impl Exp {
    pub fn const_int(n: i64) -> Self {
        Exp::Const(BigInt::from(n))
    }
}
