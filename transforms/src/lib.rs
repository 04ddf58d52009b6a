//! IR-to-IR cleanup passes run after the frontend's stack-to-SSA lowering: pruning unchecked
//! exception edges, promoting JVM-slot locals back to SSA values, and collapsing the trivial
//! control flow the lowering tends to leave behind.

pub mod exceptions;
pub mod mem2reg;
pub mod simplify;

use ir::{Context, FunctionId};

/// Runs every pass on one function, in the order each depends on the last: exception pruning first
/// (so promotion never has to reason about a handler edge that's about to disappear), then local
/// promotion, then CFG simplification.
pub fn run_all(ctx: &mut Context, function: FunctionId) {
	exceptions::prune_runtime_exception_handlers(ctx, function);
	mem2reg::promote_locals(ctx, function);
	simplify::simplify_cfg(ctx, function);
}
