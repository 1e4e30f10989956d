use crisol::{BlockId, Context, FuncId};

/// Prints events for a test run when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A context holding one function with one entry block, the usual fixture.
pub fn func_fixture() -> (Context, FuncId, BlockId) {
    init_tracing();
    let mut ctx = Context::new();
    let func = ctx.create_function("test");
    let entry = ctx.append_block(func, "entry");
    (ctx, func, entry)
}
