//! Cleans up the control flow the stack-to-SSA lowering tends to leave behind: a leader block
//! created for a target nothing ultimately branches to, or a block whose only content is a single
//! unconditional branch forwarding to somewhere else.
//!
//! Grounded in the fixpoint shape of a classic CFG-simplify pass (dead-block removal plus jump
//! threading), but pared back to the two rules that are safe to apply to a graph that may already
//! carry `Phi`s: threading only fires into a target with no `Phi`, so a forwarding block's removal
//! never has to renumber another block's positional incoming-value list.

use log::trace;

use ir::instr::Opcode;
use ir::{BlockId, Context, FunctionId, ValueId};

pub fn simplify_cfg(ctx: &mut Context, function: FunctionId) {
	loop {
		let removed_dead = remove_dead_blocks(ctx, function);
		let threaded = thread_forwarding_blocks(ctx, function);
		if !removed_dead && !threaded {
			break;
		}
	}
}

/// Deletes every non-entry block nothing branches or handles into.
fn remove_dead_blocks(ctx: &mut Context, function: FunctionId) -> bool {
	let entry = ctx.entry_block(function);
	let mut changed = false;
	for block in ctx.function_blocks(function).to_vec() {
		if block == entry || ctx.has_uses(ValueId::from(block)) {
			continue;
		}
		trace!("{}: removing unreachable block {}", ctx.function_name(function), ctx.block_name(block));
		tear_down_block(ctx, function, block);
		changed = true;
	}
	changed
}

fn tear_down_block(ctx: &mut Context, function: FunctionId, block: BlockId) {
	for handler in ctx.block_handlers(block).to_vec().into_iter().rev() {
		ctx.remove_instruction(handler);
	}
	for inst in ctx.block_instructions(block).to_vec().into_iter().rev() {
		ctx.remove_instruction(inst);
	}
	ctx.remove_block(function, block);
}

/// RAUWs a block whose entire body is one `BranchUnconditional` (and no handlers of its own) with
/// its target, as long as the target has no `Phi` whose incoming order this would disturb.
fn thread_forwarding_blocks(ctx: &mut Context, function: FunctionId) -> bool {
	let entry = ctx.entry_block(function);
	let mut changed = false;
	for block in ctx.function_blocks(function).to_vec() {
		if block == entry {
			continue;
		}
		if !ctx.block_handlers(block).is_empty() {
			continue;
		}
		let instrs = ctx.block_instructions(block);
		if instrs.len() != 1 {
			continue;
		}
		let only = instrs[0];
		if !matches!(ctx.instruction_opcode(only), Opcode::BranchUnconditional) {
			continue;
		}
		let target = BlockId(ctx.instruction_operand(only, 0));
		if target == block || has_phi(ctx, target) {
			continue;
		}

		trace!("{}: threading forwarding block {} to {}", ctx.function_name(function), ctx.block_name(block), ctx.block_name(target));
		ctx.replace_all_uses_with(ValueId::from(block), ValueId::from(target));
		ctx.remove_instruction(only);
		ctx.remove_block(function, block);
		changed = true;
	}
	changed
}

fn has_phi(ctx: &Context, block: BlockId) -> bool {
	ctx.block_instructions(block).iter().any(|&i| matches!(ctx.instruction_opcode(i), Opcode::Phi))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unreachable_block_is_removed() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		let dead = ctx.append_block(f, "dead");
		ctx.append_instruction(entry, Opcode::Return, void, &[]);
		ctx.append_instruction(dead, Opcode::Return, void, &[]);

		simplify_cfg(&mut ctx, f);

		assert_eq!(ctx.function_blocks(f), &[entry]);
	}

	#[test]
	fn forwarding_block_is_threaded_away() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let label = ctx.label_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		let forward = ctx.append_block(f, "forward");
		let target = ctx.append_block(f, "target");

		ctx.append_instruction(entry, Opcode::BranchUnconditional, label, &[ValueId::from(forward)]);
		ctx.append_instruction(forward, Opcode::BranchUnconditional, label, &[ValueId::from(target)]);
		ctx.append_instruction(target, Opcode::Return, void, &[]);

		simplify_cfg(&mut ctx, f);

		assert!(!ctx.function_blocks(f).contains(&forward));
		let term = ctx.block_terminator(entry).unwrap();
		assert_eq!(ctx.instruction_operand(term, 0), ValueId::from(target));
	}

	#[test]
	fn forwarding_into_a_phi_target_is_left_alone() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let label = ctx.label_type();
		let int = ctx.int_type(ir::types::IntWidth::W32);
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		let forward = ctx.append_block(f, "forward");
		let target = ctx.append_block(f, "target");

		ctx.append_instruction(entry, Opcode::BranchUnconditional, label, &[ValueId::from(forward)]);
		ctx.append_instruction(forward, Opcode::BranchUnconditional, label, &[ValueId::from(target)]);
		let zero = ctx.constant_int(0, ir::types::IntWidth::W32);
		ctx.prepend_instruction(target, Opcode::Phi, int, &[zero]);
		ctx.append_instruction(target, Opcode::Return, void, &[]);

		simplify_cfg(&mut ctx, f);

		assert!(ctx.function_blocks(f).contains(&forward));
	}
}
