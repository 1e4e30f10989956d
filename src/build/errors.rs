use thiserror::Error;

use crate::ir::{CastOp, Type};

/// Rejections the emission engine reports for ill-typed requests. These are
/// recoverable: nothing has been appended when one comes back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("operand types differ: {lhs} vs {rhs}")]
    OperandMismatch { lhs: Type, rhs: Type },
    #[error("expected an integer type, found {found}")]
    ExpectedInteger { found: Type },
    #[error("expected a pointer, found {found}")]
    ExpectedPointer { found: Type },
    #[error("expected a bool, found {found}")]
    ExpectedBool { found: Type },
    #[error("invalid {op} from {from} to {to}")]
    InvalidCast { op: CastOp, from: Type, to: Type },
    #[error("type {ty} has no size")]
    UnsizedType { ty: Type },
    #[error("block is not attached to a function")]
    UnparentedBlock,
}
