//! Successor and predecessor queries over the control-flow graph implied by branch/switch/handler
//! operands — there is no separate "CFG" data structure, it's derived on demand from the value/use
//! graph.

use crate::context::Context;
use crate::instr::Opcode;
use crate::value::{BlockId, InstId, ValueId};

fn as_block(value: ValueId) -> BlockId {
	BlockId(value)
}

/// The explicit successors of a block's terminator, in terminator-defined order (for
/// `BranchConditional` that's `[true, false]`; for `Switch` that's `[default, case0, case1, ...]`).
/// Does **not** include exceptional successors — see [`handler_successors`].
pub fn successors(ctx: &Context, block: BlockId) -> Vec<BlockId> {
	let Some(term) = ctx.block_terminator(block) else { return Vec::new() };
	let operands = ctx.instruction_operands(term);
	match ctx.instruction_opcode(term) {
		Opcode::BranchUnconditional => vec![as_block(operands[0])],
		Opcode::BranchConditional => vec![as_block(operands[1]), as_block(operands[2])],
		Opcode::Switch { cases } => operands[1..1 + cases.len() + 1].iter().map(|&v| as_block(v)).collect(),
		Opcode::Return | Opcode::Throw => Vec::new(),
		_ => unreachable!("non-terminator at the end of a block"),
	}
}

/// The exceptional successors attached to a block's `handler_list`.
pub fn handler_successors(ctx: &Context, block: BlockId) -> Vec<BlockId> {
	ctx.block_handlers(block).iter().map(|&handler| as_block(ctx.instruction_operand(handler, 0))).collect()
}

/// Every successor of `block`: explicit terminator targets followed by exception handlers.
pub fn all_successors(ctx: &Context, block: BlockId) -> Vec<BlockId> {
	let mut out = successors(ctx, block);
	out.extend(handler_successors(ctx, block));
	out
}

/// Every block whose terminator or handler list names `block` as a target.
///
/// Derived straight from the use graph: any instruction using `block` as an operand belongs to
/// some block, and that owning block is a predecessor.
pub fn predecessors(ctx: &Context, block: BlockId) -> Vec<BlockId> {
	ctx.uses_of(ValueId::from(block))
		.filter_map(|owner| ctx.instruction_parent(InstId(owner)))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_function_has_no_successors_after_return() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		ctx.append_instruction(entry, Opcode::Return, void, &[]);

		assert!(successors(&ctx, entry).is_empty());
		assert!(predecessors(&ctx, entry).is_empty());
	}

	#[test]
	fn branch_is_a_successor_and_predecessor() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let a = ctx.append_block(f, "a");
		let b = ctx.append_block(f, "b");
		let label = ctx.label_type();
		ctx.append_instruction(a, Opcode::BranchUnconditional, label, &[ValueId::from(b)]);
		ctx.append_instruction(b, Opcode::Return, void, &[]);

		assert_eq!(successors(&ctx, a), vec![b]);
		assert_eq!(predecessors(&ctx, b), vec![a]);
	}
}
