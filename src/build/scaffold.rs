//! Scaffold policy: stage instructions in a throwaway block hanging off a
//! placeholder function, then either harvest them for splicing elsewhere or
//! drop the whole batch.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::ir::{BlockId, Context, FuncId, InstId};
use crate::namegen::Namer;

use super::{BlockInserter, BlockPositioned, Builder, Inserter};

/// Block placement plus unique display names drawn from a shared [`Namer`],
/// so instructions staged here stay distinguishable after they are spliced
/// into their final home.
#[derive(Debug)]
pub struct ScaffoldInserter<'n> {
    inner: BlockInserter,
    namer: &'n mut Namer,
}

impl Inserter for ScaffoldInserter<'_> {
    fn insert(&mut self, ctx: &mut Context, inst: InstId, proposed_name: &str) {
        let name = self.namer.fresh(proposed_name);
        self.inner.insert(ctx, inst, &name);
    }
}

impl BlockPositioned for ScaffoldInserter<'_> {
    fn block(&self) -> BlockId {
        self.inner.block
    }
}

/// A builder over a scaffold block freshly appended to `func`. Everything
/// built lands in that block; [`harvest`](Self::harvest) hands the
/// instructions back in order, and dropping the builder without harvesting
/// discards them. Either way the scaffold block itself is gone afterwards and
/// `func` is back to its previous block count.
pub struct ScaffoldBuilder<'ctx, 'n> {
    builder: Builder<'ctx, ScaffoldInserter<'n>>,
    func: FuncId,
    scaffold: BlockId,
}

impl<'ctx, 'n> ScaffoldBuilder<'ctx, 'n> {
    pub fn new(ctx: &'ctx mut Context, func: FuncId, namer: &'n mut Namer) -> Self {
        let scaffold = ctx.append_block(func, "scaffold");
        debug!(
            "armed scaffold block {scaffold:?} on function {:?}",
            ctx.func(func).name()
        );
        let inserter = ScaffoldInserter {
            inner: BlockInserter { block: scaffold },
            namer,
        };
        Self {
            builder: Builder::from_parts(ctx, inserter),
            func,
            scaffold,
        }
    }

    pub fn placeholder_func(&self) -> FuncId {
        self.func
    }

    /// Takes every staged instruction out of the scaffold block, in emission
    /// order, leaving each one unattached and ready to be spliced into a real
    /// block. Consumes the builder; the scaffold block is detached and freed
    /// before this returns.
    pub fn harvest(mut self) -> Vec<InstId> {
        let scaffold = self.scaffold;
        let insts = self.builder.ctx_mut().take_block_insts(scaffold);
        debug!("harvested {} instructions from scaffold {scaffold:?}", insts.len());
        insts
    }
}

impl Drop for ScaffoldBuilder<'_, '_> {
    fn drop(&mut self) {
        let scaffold = self.scaffold;
        let ctx = self.builder.ctx_mut();
        let leftover = ctx.take_block_insts(scaffold);
        if !leftover.is_empty() {
            debug!(
                "discarding {} unharvested instructions from scaffold {scaffold:?}",
                leftover.len()
            );
            for inst in leftover {
                ctx.remove_inst(inst);
            }
        }
        ctx.remove_block(scaffold);
    }
}

impl<'ctx, 'n> Deref for ScaffoldBuilder<'ctx, 'n> {
    type Target = Builder<'ctx, ScaffoldInserter<'n>>;

    fn deref(&self) -> &Self::Target {
        &self.builder
    }
}

impl DerefMut for ScaffoldBuilder<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.builder
    }
}
