//! Capture policy: instructions are appended to a caller-owned container
//! instead of any block, so whole expression trees can be built detached and
//! committed (or thrown away) later.

use tracing::trace;

use crate::ir::seq::{InstSeq, InstSink, ValueExpr};
use crate::ir::{Context, InstId};

use super::{Builder, Inserter};

/// Redirects every materialized instruction into `sink`, in emission order.
/// The instruction keeps its proposed name and stays unattached; folded
/// operations never reach the sink at all.
#[derive(Debug)]
pub struct CaptureInserter<'s, S: InstSink> {
    sink: &'s mut S,
}

impl<S: InstSink> Inserter for CaptureInserter<'_, S> {
    fn insert(&mut self, ctx: &mut Context, inst: InstId, proposed_name: &str) {
        ctx.name_inst(inst, proposed_name);
        self.sink.append_inst(inst);
    }
}

/// Builder capturing into an expression under construction.
pub type ExprBuilder<'ctx, 's> = Builder<'ctx, CaptureInserter<'s, ValueExpr>>;

/// Builder capturing into a bare instruction sequence.
pub type SeqBuilder<'ctx, 's> = Builder<'ctx, CaptureInserter<'s, InstSeq>>;

impl<'ctx, 's, S: InstSink> Builder<'ctx, CaptureInserter<'s, S>> {
    /// A builder whose output lands in `sink` instead of a block. The sink is
    /// borrowed for the builder's whole lifetime, so nothing else can append
    /// to it in between.
    pub fn capturing(ctx: &'ctx mut Context, sink: &'s mut S) -> Self {
        trace!("redirecting instruction output into a capture sink");
        Builder::from_parts(ctx, CaptureInserter { sink })
    }
}
