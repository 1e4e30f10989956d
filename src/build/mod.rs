//! The emission engine: a typed instruction builder whose placement behavior
//! is a compile-time policy. The default policy appends to a block; the
//! [`capture`] policies redirect output into caller-owned containers and the
//! [`scaffold`] builder stages output in a throwaway block.

pub mod capture;
pub mod errors;
mod fold;
pub mod scaffold;

use tracing::trace;

use crate::ir::{
    BinOp, BlockId, CastOp, ConstInt, Context, FuncId, IcmpPred, InstId, InstKind, Type, Value,
};

pub use errors::BuildError;

/// Placement policy: decides where a freshly built instruction goes and what
/// display name it gets. Policies never see folded operations, only
/// instructions that were actually materialized.
pub trait Inserter {
    fn insert(&mut self, ctx: &mut Context, inst: InstId, proposed_name: &str);
}

/// Default policy: name the instruction as proposed and append it to a fixed
/// block.
#[derive(Debug, Clone, Copy)]
pub struct BlockInserter {
    pub(crate) block: BlockId,
}

impl Inserter for BlockInserter {
    fn insert(&mut self, ctx: &mut Context, inst: InstId, proposed_name: &str) {
        ctx.name_inst(inst, proposed_name);
        ctx.push_inst(self.block, inst);
    }
}

/// Policies that place instructions into a real block. Operations that have
/// to reach the enclosing function, like reserving a stack slot, are only
/// available under such a policy.
pub trait BlockPositioned: Inserter {
    fn block(&self) -> BlockId;
}

impl BlockPositioned for BlockInserter {
    fn block(&self) -> BlockId {
        self.block
    }
}

/// Typed instruction builder over a [`Context`], generic over its placement
/// policy. Every operation type-checks its operands, folds constants when it
/// can, and otherwise materializes one instruction through the policy.
pub struct Builder<'ctx, I: Inserter> {
    ctx: &'ctx mut Context,
    inserter: I,
}

impl<'ctx> Builder<'ctx, BlockInserter> {
    /// A plain builder positioned on an existing block.
    pub fn on_block(ctx: &'ctx mut Context, block: BlockId) -> Self {
        Self::from_parts(ctx, BlockInserter { block })
    }
}

impl<'ctx, I: Inserter> Builder<'ctx, I> {
    pub(crate) fn from_parts(ctx: &'ctx mut Context, inserter: I) -> Self {
        Self { ctx, inserter }
    }

    pub fn ctx(&self) -> &Context {
        self.ctx
    }

    pub(crate) fn ctx_mut(&mut self) -> &mut Context {
        self.ctx
    }

    fn emit(&mut self, kind: InstKind, ty: Type, mnemonic: &str) -> Value {
        let inst = self.ctx.new_inst(kind, ty);
        self.inserter.insert(self.ctx, inst, mnemonic);
        trace!("materialized {mnemonic} as {inst:?}");
        Value::Inst { inst, ty }
    }

    pub fn iconst(&self, ty: Type, value: i64) -> Result<Value, BuildError> {
        if !ty.is_int() {
            return Err(BuildError::ExpectedInteger { found: ty });
        }
        Ok(Value::Const(ConstInt::new(ty, value)))
    }

    pub fn bconst(&self, value: bool) -> Value {
        Value::Const(ConstInt::bool_value(value))
    }

    pub fn binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        let ty = lhs.ty();
        if !ty.is_int() {
            return Err(BuildError::ExpectedInteger { found: ty });
        }
        if rhs.ty() != ty {
            return Err(BuildError::OperandMismatch { lhs: ty, rhs: rhs.ty() });
        }
        if let Some(folded) = fold::binary(op, lhs, rhs) {
            return Ok(folded);
        }
        Ok(self.emit(InstKind::Binary { op, lhs, rhs }, ty, op.mnemonic()))
    }

    pub fn iadd(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Add, lhs, rhs)
    }

    pub fn isub(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Sub, lhs, rhs)
    }

    pub fn imul(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Mul, lhs, rhs)
    }

    pub fn sdiv(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Sdiv, lhs, rhs)
    }

    pub fn udiv(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Udiv, lhs, rhs)
    }

    pub fn and(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::And, lhs, rhs)
    }

    pub fn or(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Or, lhs, rhs)
    }

    pub fn xor(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Xor, lhs, rhs)
    }

    pub fn shl(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Shl, lhs, rhs)
    }

    pub fn lshr(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Lshr, lhs, rhs)
    }

    pub fn ashr(&mut self, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.binary(BinOp::Ashr, lhs, rhs)
    }

    pub fn icmp(&mut self, pred: IcmpPred, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        let ty = lhs.ty();
        if !ty.is_int() {
            return Err(BuildError::ExpectedInteger { found: ty });
        }
        if rhs.ty() != ty {
            return Err(BuildError::OperandMismatch { lhs: ty, rhs: rhs.ty() });
        }
        if let Some(folded) = fold::icmp(pred, lhs, rhs) {
            return Ok(folded);
        }
        Ok(self.emit(InstKind::Icmp { pred, lhs, rhs }, Type::Bool, "icmp"))
    }

    pub fn cast(&mut self, op: CastOp, value: Value, to: Type) -> Result<Value, BuildError> {
        let from = value.ty();
        let widths = from.int_width().zip(to.int_width());
        let legal = match (op, widths) {
            (CastOp::Trunc, Some((f, t))) => t < f,
            (CastOp::Zext | CastOp::Sext, Some((f, t))) => t > f && to.is_int(),
            (_, None) => false,
        };
        if !legal {
            return Err(BuildError::InvalidCast { op, from, to });
        }
        if let Some(folded) = fold::cast(op, value, to) {
            return Ok(folded);
        }
        Ok(self.emit(InstKind::Cast { op, value }, to, op.mnemonic()))
    }

    pub fn trunc(&mut self, value: Value, to: Type) -> Result<Value, BuildError> {
        self.cast(CastOp::Trunc, value, to)
    }

    pub fn zext(&mut self, value: Value, to: Type) -> Result<Value, BuildError> {
        self.cast(CastOp::Zext, value, to)
    }

    pub fn sext(&mut self, value: Value, to: Type) -> Result<Value, BuildError> {
        self.cast(CastOp::Sext, value, to)
    }

    pub fn select(
        &mut self,
        cond: Value,
        if_true: Value,
        if_false: Value,
    ) -> Result<Value, BuildError> {
        if cond.ty() != Type::Bool {
            return Err(BuildError::ExpectedBool { found: cond.ty() });
        }
        if if_true.ty() != if_false.ty() {
            return Err(BuildError::OperandMismatch {
                lhs: if_true.ty(),
                rhs: if_false.ty(),
            });
        }
        if let Some(folded) = fold::select(cond, if_true, if_false) {
            return Ok(folded);
        }
        Ok(self.emit(
            InstKind::Select { cond, if_true, if_false },
            if_true.ty(),
            "select",
        ))
    }

    pub fn ptr_add(&mut self, base: Value, offset: Value) -> Result<Value, BuildError> {
        if base.ty() != Type::Ptr {
            return Err(BuildError::ExpectedPointer { found: base.ty() });
        }
        if !offset.ty().is_int() {
            return Err(BuildError::ExpectedInteger { found: offset.ty() });
        }
        if let Some(folded) = fold::ptr_add(base, offset) {
            return Ok(folded);
        }
        Ok(self.emit(InstKind::PtrAdd { base, offset }, Type::Ptr, "ptr_add"))
    }

    pub fn load(&mut self, ty: Type, addr: Value) -> Result<Value, BuildError> {
        if addr.ty() != Type::Ptr {
            return Err(BuildError::ExpectedPointer { found: addr.ty() });
        }
        if !ty.is_sized() {
            return Err(BuildError::UnsizedType { ty });
        }
        Ok(self.emit(InstKind::Load { addr }, ty, "load"))
    }

    pub fn store(&mut self, value: Value, addr: Value) -> Result<(), BuildError> {
        if addr.ty() != Type::Ptr {
            return Err(BuildError::ExpectedPointer { found: addr.ty() });
        }
        if !value.ty().is_sized() {
            return Err(BuildError::UnsizedType { ty: value.ty() });
        }
        self.emit(InstKind::Store { addr, value }, Type::Unit, "store");
        Ok(())
    }
}

impl<'ctx, I: BlockPositioned> Builder<'ctx, I> {
    pub fn block(&self) -> BlockId {
        self.inserter.block()
    }

    fn parent_func(&self) -> Result<FuncId, BuildError> {
        self.ctx
            .block(self.inserter.block())
            .parent()
            .ok_or(BuildError::UnparentedBlock)
    }

    /// Reserves a slot on the enclosing function's frame and produces its
    /// address. The address instruction takes its place in emission order
    /// like any other.
    pub fn stack_alloc(&mut self, ty: Type) -> Result<Value, BuildError> {
        if !ty.is_sized() {
            return Err(BuildError::UnsizedType { ty });
        }
        let func = self.parent_func()?;
        let slot = self.ctx.func_add_slot(func, ty);
        Ok(self.emit(InstKind::StackAddr { slot }, Type::Ptr, "stack_addr"))
    }

    /// Copies `count` elements of `elem_ty` from `src` to `dst` by expanding
    /// into per-element offset, load and store instructions.
    pub fn mem_copy(
        &mut self,
        dst: Value,
        src: Value,
        elem_ty: Type,
        count: u64,
    ) -> Result<(), BuildError> {
        if dst.ty() != Type::Ptr {
            return Err(BuildError::ExpectedPointer { found: dst.ty() });
        }
        if src.ty() != Type::Ptr {
            return Err(BuildError::ExpectedPointer { found: src.ty() });
        }
        if !elem_ty.is_sized() {
            return Err(BuildError::UnsizedType { ty: elem_ty });
        }
        self.parent_func()?;
        let size = elem_ty.size_bytes(self.ctx.layout());
        for i in 0..count {
            let offset = Value::Const(ConstInt::new(Type::I64, (i * size) as i64));
            let src_at = self.ptr_add(src, offset)?;
            let elem = self.load(elem_ty, src_at)?;
            let dst_at = self.ptr_add(dst, offset)?;
            self.store(elem, dst_at)?;
        }
        Ok(())
    }
}
