//! Crisol is an IR construction kit: an arena-backed object model of
//! functions, blocks and straight-line instructions, an emission engine with
//! constant folding, and builders whose placement policy decides whether
//! output goes into a block, a caller-owned capture container, or a
//! throwaway scaffold block.

pub mod build;
pub mod ir;
pub mod namegen;

pub use build::capture::{CaptureInserter, ExprBuilder, SeqBuilder};
pub use build::scaffold::ScaffoldBuilder;
pub use build::{BlockInserter, BlockPositioned, BuildError, Builder, Inserter};
pub use ir::seq::{InstSeq, InstSink, ValueExpr};
pub use ir::{
    BinOp, BlockId, CastOp, ConstInt, Context, FuncId, IcmpPred, InstId, InstKind, Layout, Type,
    Value,
};
pub use namegen::Namer;
