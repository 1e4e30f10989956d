use crisol::{BinOp, Builder, InstKind, InstSeq, Type, ValueExpr};

use crate::common::func_fixture;

mod common;

#[test]
fn expression_capture_preserves_emission_order() {
    let (mut ctx, _func, entry) = func_fixture();
    let addr = {
        let mut b = Builder::on_block(&mut ctx, entry);
        b.stack_alloc(Type::I32).unwrap()
    };

    let mut expr = ValueExpr::new();
    let sum;
    {
        let mut b = Builder::capturing(&mut ctx, &mut expr);
        let x = b.load(Type::I32, addr).unwrap();
        let y = b.load(Type::I32, addr).unwrap();
        sum = b.iadd(x, y).unwrap();
    }
    expr.set_value(sum);

    assert_eq!(expr.value(), Some(sum));
    let insts = expr.insts().to_vec();
    assert_eq!(insts.len(), 3);
    for inst in &insts {
        assert!(ctx.inst(*inst).parent().is_none());
    }
    assert!(matches!(ctx.inst(insts[0]).kind(), InstKind::Load { .. }));
    assert!(matches!(ctx.inst(insts[1]).kind(), InstKind::Load { .. }));
    assert!(matches!(
        ctx.inst(insts[2]).kind(),
        InstKind::Binary { op: BinOp::Add, .. }
    ));
    // Capture keeps the proposed names as-is.
    assert_eq!(ctx.inst(insts[2]).name(), "iadd");
}

#[test]
fn captured_expression_can_be_committed_to_a_block() {
    let (mut ctx, _func, entry) = func_fixture();
    let addr = {
        let mut b = Builder::on_block(&mut ctx, entry);
        b.stack_alloc(Type::I32).unwrap()
    };

    let mut expr = ValueExpr::new();
    let doubled;
    {
        let mut b = Builder::capturing(&mut ctx, &mut expr);
        let x = b.load(Type::I32, addr).unwrap();
        doubled = b.iadd(x, x).unwrap();
    }
    expr.set_value(doubled);

    let (value, insts) = expr.into_parts();
    assert_eq!(value, Some(doubled));
    ctx.splice_into_block(entry, insts.iter().copied());

    let block_insts = ctx.block(entry).insts();
    assert_eq!(block_insts.len(), 3);
    assert_eq!(&block_insts[1..], &insts[..]);
    for inst in insts {
        assert_eq!(ctx.inst(inst).parent(), Some(entry));
    }
}

#[test]
fn folded_expression_appends_nothing() {
    let (mut ctx, _func, _entry) = func_fixture();
    let count_before = ctx.inst_count();

    let mut expr = ValueExpr::new();
    let result;
    {
        let mut b = Builder::capturing(&mut ctx, &mut expr);
        let twenty = b.iconst(Type::I64, 20).unwrap();
        let thirty = b.iconst(Type::I64, 30).unwrap();
        result = b.imul(twenty, thirty).unwrap();
    }
    expr.set_value(result);

    assert_eq!(result.as_const().map(|c| c.value), Some(600));
    assert!(expr.insts().is_empty());
    assert_eq!(ctx.inst_count(), count_before);
}

#[test]
fn rejected_operation_leaves_the_sink_untouched() {
    let (mut ctx, _func, _entry) = func_fixture();

    let mut expr = ValueExpr::new();
    {
        let mut b = Builder::capturing(&mut ctx, &mut expr);
        let lhs = b.iconst(Type::I32, 1).unwrap();
        let rhs = b.iconst(Type::I64, 2).unwrap();
        b.iadd(lhs, rhs).unwrap_err();
    }

    assert!(expr.insts().is_empty());
    assert!(expr.value().is_none());
}

#[test]
fn bare_sequence_capture_collects_statements() {
    let (mut ctx, _func, entry) = func_fixture();
    let (dst, src) = {
        let mut b = Builder::on_block(&mut ctx, entry);
        (
            b.stack_alloc(Type::I64).unwrap(),
            b.stack_alloc(Type::I64).unwrap(),
        )
    };

    let mut seq = InstSeq::new();
    {
        let mut b = Builder::capturing(&mut ctx, &mut seq);
        let x = b.load(Type::I64, src).unwrap();
        b.store(x, dst).unwrap();
    }

    assert_eq!(seq.len(), 2);
    let insts = seq.into_insts();
    assert!(matches!(ctx.inst(insts[0]).kind(), InstKind::Load { .. }));
    assert!(matches!(ctx.inst(insts[1]).kind(), InstKind::Store { .. }));

    ctx.splice_into_block(entry, insts);
    assert_eq!(ctx.block(entry).insts().len(), 4);
}

#[test]
fn consecutive_captures_into_one_sink_accumulate() {
    let (mut ctx, _func, entry) = func_fixture();
    let addr = {
        let mut b = Builder::on_block(&mut ctx, entry);
        b.stack_alloc(Type::I32).unwrap()
    };

    let mut seq = InstSeq::new();
    {
        let mut b = Builder::capturing(&mut ctx, &mut seq);
        b.load(Type::I32, addr).unwrap();
    }
    {
        let mut b = Builder::capturing(&mut ctx, &mut seq);
        b.load(Type::I32, addr).unwrap();
    }

    assert_eq!(seq.len(), 2);
}
