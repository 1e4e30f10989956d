//! Arena-backed IR object model: functions, blocks and straight-line
//! instructions, plus the bookkeeping the builders rely on (attach, detach,
//! drain, display).

use std::fmt::{self, Write};

use itertools::Itertools;
use tracing::trace;
use typed_generational_arena::{StandardArena, StandardIndex};

pub mod seq;

pub type InstId = StandardIndex<InstData>;
pub type BlockId = StandardIndex<BlockData>;
pub type FuncId = StandardIndex<FuncData>;

/// Target layout facts the emission engine needs at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub ptr_bytes: u64,
}

impl Default for Layout {
    fn default() -> Self {
        Self { ptr_bytes: 8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Unit,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Ptr,
}

impl Type {
    /// Width in bits for integer-like types, `None` for unit and pointers.
    pub fn int_width(&self) -> Option<u32> {
        match self {
            Type::Bool => Some(1),
            Type::I8 => Some(8),
            Type::I16 => Some(16),
            Type::I32 => Some(32),
            Type::I64 => Some(64),
            Type::Unit | Type::Ptr => None,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64)
    }

    pub fn is_int_like(&self) -> bool {
        self.is_int() || matches!(self, Type::Bool)
    }

    pub fn is_sized(&self) -> bool {
        !matches!(self, Type::Unit)
    }

    pub fn size_bytes(&self, layout: Layout) -> u64 {
        match self {
            Type::Unit => 0,
            Type::Bool | Type::I8 => 1,
            Type::I16 => 2,
            Type::I32 => 4,
            Type::I64 => 8,
            Type::Ptr => layout.ptr_bytes,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Bool => write!(f, "bool"),
            Type::I8 => write!(f, "i8"),
            Type::I16 => write!(f, "i16"),
            Type::I32 => write!(f, "i32"),
            Type::I64 => write!(f, "i64"),
            Type::Ptr => write!(f, "ptr"),
        }
    }
}

/// An integer (or bool) constant, stored in canonical form: sign-extended to
/// 64 bits for integers, 0 or 1 for bools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstInt {
    pub ty: Type,
    pub value: i64,
}

impl ConstInt {
    /// Truncates `value` to the width of `ty` and re-canonicalizes.
    pub fn new(ty: Type, value: i64) -> Self {
        let width = ty
            .int_width()
            .unwrap_or_else(|| panic!("constant of non-integer type {ty}"));
        let value = match ty {
            Type::Bool => value & 1,
            _ if width == 64 => value,
            _ => {
                let shift = 64 - width;
                (value << shift) >> shift
            }
        };
        Self { ty, value }
    }

    pub fn bool_value(value: bool) -> Self {
        Self { ty: Type::Bool, value: value as i64 }
    }

    /// The constant's bits zero-extended, for unsigned arithmetic.
    pub fn as_u64(&self) -> u64 {
        let width = self.ty.int_width().unwrap_or(64);
        if width == 64 {
            self.value as u64
        } else {
            (self.value as u64) & ((1u64 << width) - 1)
        }
    }
}

/// A value an instruction can consume: either a materialized constant or the
/// result of a previously built instruction. Constants never live in the
/// instruction arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Const(ConstInt),
    Inst { inst: InstId, ty: Type },
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Const(c) => c.ty,
            Value::Inst { ty, .. } => *ty,
        }
    }

    pub fn as_const(&self) -> Option<ConstInt> {
        match self {
            Value::Const(c) => Some(*c),
            Value::Inst { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Udiv,
    And,
    Or,
    Xor,
    Shl,
    Lshr,
    Ashr,
}

impl BinOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinOp::Add => "iadd",
            BinOp::Sub => "isub",
            BinOp::Mul => "imul",
            BinOp::Sdiv => "sdiv",
            BinOp::Udiv => "udiv",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::Lshr => "lshr",
            BinOp::Ashr => "ashr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpPred {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl IcmpPred {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IcmpPred::Eq => "eq",
            IcmpPred::Ne => "ne",
            IcmpPred::Slt => "slt",
            IcmpPred::Sle => "sle",
            IcmpPred::Sgt => "sgt",
            IcmpPred::Sge => "sge",
            IcmpPred::Ult => "ult",
            IcmpPred::Ule => "ule",
            IcmpPred::Ugt => "ugt",
            IcmpPred::Uge => "uge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    Trunc,
    Zext,
    Sext,
}

impl CastOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::Trunc => "trunc",
            CastOp::Zext => "zext",
            CastOp::Sext => "sext",
        }
    }
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstKind {
    Binary { op: BinOp, lhs: Value, rhs: Value },
    Icmp { pred: IcmpPred, lhs: Value, rhs: Value },
    Cast { op: CastOp, value: Value },
    Select { cond: Value, if_true: Value, if_false: Value },
    PtrAdd { base: Value, offset: Value },
    Load { addr: Value },
    Store { addr: Value, value: Value },
    StackAddr { slot: usize },
}

/// One straight-line instruction. `parent` is the block holding it, `None`
/// while it sits in a capture sink or after it has been drained out.
#[derive(Debug, Clone)]
pub struct InstData {
    pub(crate) kind: InstKind,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) parent: Option<BlockId>,
}

impl InstData {
    pub fn kind(&self) -> &InstKind {
        &self.kind
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }
}

/// A container of instructions in program order. Blocks here are plain
/// sequences: control flow is the caller's concern, not this crate's.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub(crate) name: String,
    pub(crate) parent: Option<FuncId>,
    pub(crate) insts: Vec<InstId>,
}

impl BlockData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<FuncId> {
        self.parent
    }

    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }
}

/// A function owns its blocks plus a frame of stack slots reserved by
/// `stack_alloc`; slot indices are positions in `slots`.
#[derive(Debug, Clone)]
pub struct FuncData {
    pub(crate) name: String,
    pub(crate) blocks: Vec<BlockId>,
    pub(crate) slots: Vec<Type>,
}

impl FuncData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn slots(&self) -> &[Type] {
        &self.slots
    }
}

/// Owner of every function, block and instruction. All ids handed out by one
/// context are only meaningful against that context; indexing with a stale or
/// foreign id panics.
#[derive(Debug, Clone)]
pub struct Context {
    insts: StandardArena<InstData>,
    blocks: StandardArena<BlockData>,
    funcs: StandardArena<FuncData>,
    layout: Layout,
}

impl Context {
    pub fn new() -> Self {
        Self::with_layout(Layout::default())
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self {
            insts: StandardArena::new(),
            blocks: StandardArena::new(),
            funcs: StandardArena::new(),
            layout,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn create_function(&mut self, name: &str) -> FuncId {
        let func = self.funcs.insert(FuncData {
            name: name.to_owned(),
            blocks: Vec::new(),
            slots: Vec::new(),
        });
        trace!("created function {name:?} with id {func:?}");
        func
    }

    pub fn func(&self, func: FuncId) -> &FuncData {
        &self.funcs[func]
    }

    pub fn append_block(&mut self, func: FuncId, name: &str) -> BlockId {
        let block = self.blocks.insert(BlockData {
            name: name.to_owned(),
            parent: Some(func),
            insts: Vec::new(),
        });
        self.funcs[func].blocks.push(block);
        block
    }

    pub fn block(&self, block: BlockId) -> &BlockData {
        &self.blocks[block]
    }

    /// Unlinks `block` from its function. Idempotent: detaching a block that
    /// has no parent does nothing.
    pub fn detach_block(&mut self, block: BlockId) {
        if let Some(func) = self.blocks[block].parent.take() {
            self.funcs[func].blocks.retain(|b| *b != block);
        }
    }

    /// Frees `block`. It must already be empty; a parented block is detached
    /// first.
    pub fn remove_block(&mut self, block: BlockId) {
        self.detach_block(block);
        let data = self
            .blocks
            .remove(block)
            .unwrap_or_else(|| panic!("removing block {block:?} which is not in the arena"));
        assert!(
            data.insts.is_empty(),
            "removing block {:?} which still holds {} instructions",
            data.name,
            data.insts.len()
        );
    }

    pub fn inst(&self, inst: InstId) -> &InstData {
        &self.insts[inst]
    }

    pub fn contains_inst(&self, inst: InstId) -> bool {
        self.insts.contains(inst)
    }

    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    pub(crate) fn new_inst(&mut self, kind: InstKind, ty: Type) -> InstId {
        self.insts.insert(InstData {
            kind,
            ty,
            name: String::new(),
            parent: None,
        })
    }

    pub(crate) fn name_inst(&mut self, inst: InstId, name: &str) {
        name.clone_into(&mut self.insts[inst].name);
    }

    /// Appends `inst` to `block`. The instruction must not already belong to
    /// a block; an instruction is in at most one place at a time.
    pub(crate) fn push_inst(&mut self, block: BlockId, inst: InstId) {
        let data = &mut self.insts[inst];
        assert!(
            data.parent.is_none(),
            "instruction {inst:?} is already attached to a block"
        );
        data.parent = Some(block);
        self.blocks[block].insts.push(inst);
    }

    /// Drains every instruction out of `block` in order, clearing each one's
    /// parent. The instructions stay alive in the arena.
    pub fn take_block_insts(&mut self, block: BlockId) -> Vec<InstId> {
        let insts = std::mem::take(&mut self.blocks[block].insts);
        for inst in &insts {
            self.insts[*inst].parent = None;
        }
        insts
    }

    /// Frees an instruction that is not attached to any block.
    pub fn remove_inst(&mut self, inst: InstId) {
        let data = self
            .insts
            .remove(inst)
            .unwrap_or_else(|| panic!("removing instruction {inst:?} which is not in the arena"));
        assert!(
            data.parent.is_none(),
            "removed instruction {:?} while still attached to a block",
            data.name
        );
    }

    pub(crate) fn func_add_slot(&mut self, func: FuncId, ty: Type) -> usize {
        let slots = &mut self.funcs[func].slots;
        slots.push(ty);
        slots.len() - 1
    }

    /// Commits captured instructions to a block, preserving their order.
    pub fn splice_into_block(&mut self, block: BlockId, insts: impl IntoIterator<Item = InstId>) {
        let mut count = 0usize;
        for inst in insts {
            self.push_inst(block, inst);
            count += 1;
        }
        trace!("spliced {count} instructions into block {block:?}");
    }

    pub fn display_func(&self, func: FuncId) -> Result<String, fmt::Error> {
        let data = &self.funcs[func];
        let mut out = String::new();
        writeln!(out, "fn @{} {{", data.name)?;
        if !data.slots.is_empty() {
            writeln!(out, "frame: [{}]", data.slots.iter().join(", "))?;
        }
        for block in &data.blocks {
            out.push_str(&self.display_block(*block)?);
        }
        writeln!(out, "}}")?;
        Ok(out)
    }

    pub fn display_block(&self, block: BlockId) -> Result<String, fmt::Error> {
        let data = &self.blocks[block];
        let mut out = String::new();
        writeln!(out, "{}:", data.name)?;
        if !data.insts.is_empty() {
            let body = data.insts.iter().map(|i| self.display_inst(*i)).join("\n  ");
            writeln!(out, "  {body}")?;
        }
        Ok(out)
    }

    pub fn display_inst(&self, inst: InstId) -> String {
        let data = &self.insts[inst];
        let mut out = String::new();
        if data.ty != Type::Unit {
            let name = if data.name.is_empty() { "_" } else { data.name.as_str() };
            out.push_str(&format!("%{name} = "));
        }
        let body = match &data.kind {
            InstKind::Binary { op, lhs, rhs } => format!(
                "{} {}, {}",
                op.mnemonic(),
                self.display_value(*lhs),
                self.display_value(*rhs)
            ),
            InstKind::Icmp { pred, lhs, rhs } => format!(
                "icmp {} {}, {}",
                pred.mnemonic(),
                self.display_value(*lhs),
                self.display_value(*rhs)
            ),
            InstKind::Cast { op, value } => {
                format!("{op} {} to {}", self.display_value(*value), data.ty)
            }
            InstKind::Select { cond, if_true, if_false } => format!(
                "select {}, {}, {}",
                self.display_value(*cond),
                self.display_value(*if_true),
                self.display_value(*if_false)
            ),
            InstKind::PtrAdd { base, offset } => format!(
                "ptr_add {}, {}",
                self.display_value(*base),
                self.display_value(*offset)
            ),
            InstKind::Load { addr } => {
                format!("load {}, {}", data.ty, self.display_value(*addr))
            }
            InstKind::Store { addr, value } => format!(
                "store {}, {}",
                self.display_value(*value),
                self.display_value(*addr)
            ),
            InstKind::StackAddr { slot } => format!("stack_addr frame[{slot}]"),
        };
        out.push_str(&body);
        out
    }

    pub fn display_value(&self, value: Value) -> String {
        match value {
            Value::Const(c) => match c.ty {
                Type::Bool => format!("bool {}", c.value == 1),
                _ => format!("{} {}", c.ty, c.value),
            },
            Value::Inst { inst, .. } => {
                let name = &self.insts[inst].name;
                if name.is_empty() {
                    "%_".to_owned()
                } else {
                    format!("%{name}")
                }
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
