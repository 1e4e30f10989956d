//! Detached instruction containers that capture builder output before it is
//! committed to a block.

use super::{InstId, Value};

/// Anything instructions can be redirected into.
pub trait InstSink {
    fn append_inst(&mut self, inst: InstId);
}

/// A bare ordered sequence of detached instructions.
#[derive(Debug, Clone, Default)]
pub struct InstSeq {
    insts: Vec<InstId>,
}

impl InstSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn into_insts(self) -> Vec<InstId> {
        self.insts
    }
}

impl InstSink for InstSeq {
    fn append_inst(&mut self, inst: InstId) {
        self.insts.push(inst);
    }
}

impl IntoIterator for InstSeq {
    type Item = InstId;
    type IntoIter = std::vec::IntoIter<InstId>;

    fn into_iter(self) -> Self::IntoIter {
        self.insts.into_iter()
    }
}

/// An expression under construction: the instructions computing it plus the
/// value the expression ultimately denotes. The value is set by whoever owns
/// the expression once building is done; a folded-away expression ends up
/// with a value and no instructions at all.
#[derive(Debug, Clone, Default)]
pub struct ValueExpr {
    value: Option<Value>,
    insts: InstSeq,
}

impl ValueExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    pub fn value(&self) -> Option<Value> {
        self.value
    }

    pub fn insts(&self) -> &[InstId] {
        self.insts.insts()
    }

    pub fn into_parts(self) -> (Option<Value>, Vec<InstId>) {
        (self.value, self.insts.into_insts())
    }
}

impl InstSink for ValueExpr {
    fn append_inst(&mut self, inst: InstId) {
        self.insts.append_inst(inst);
    }
}
