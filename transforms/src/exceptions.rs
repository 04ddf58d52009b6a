//! Drops `ExceptionHandler` edges whose catch type is exactly `java/lang/RuntimeException`.
//!
//! The frontend attaches one of these to every block that overlaps a JVM exception table entry,
//! which for a method whose `catch`es a broad unchecked type quickly gives nearly every block in
//! the method an edge to the handler — pessimizing dominance and reachability for no benefit, since
//! an unchecked exception can in principle be thrown between any two instructions anyway.

use log::trace;

use ir::instr::Opcode;
use ir::types::Type;
use ir::{Context, FunctionId, InstId};

const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";

pub fn prune_runtime_exception_handlers(ctx: &mut Context, function: FunctionId) {
	for block in ctx.function_blocks(function).to_vec() {
		for handler in ctx.block_handlers(block).to_vec() {
			if is_runtime_exception(ctx, handler) {
				trace!("{}: dropping a RuntimeException handler on {}", ctx.function_name(function), ctx.block_name(block));
				ctx.remove_instruction(handler);
			}
		}
	}
}

fn is_runtime_exception(ctx: &Context, handler: InstId) -> bool {
	let Opcode::ExceptionHandler(catch_ty) = ctx.instruction_opcode(handler) else {
		return false;
	};
	matches!(ctx.type_data(*catch_ty), Type::Reference(name) if name == RUNTIME_EXCEPTION)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn runtime_exception_handler_is_dropped() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		let handler = ctx.append_block(f, "handler");
		ctx.append_instruction(entry, Opcode::Return, void, &[]);
		ctx.append_instruction(handler, Opcode::Return, void, &[]);

		let runtime_exception = ctx.reference_type(RUNTIME_EXCEPTION);
		ctx.append_handler(entry, runtime_exception, handler);

		prune_runtime_exception_handlers(&mut ctx, f);

		assert!(ctx.block_handlers(entry).is_empty());
	}

	#[test]
	fn other_handlers_are_kept() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		let handler = ctx.append_block(f, "handler");
		ctx.append_instruction(entry, Opcode::Return, void, &[]);
		ctx.append_instruction(handler, Opcode::Return, void, &[]);

		let io_exception = ctx.reference_type("java/io/IOException");
		ctx.append_handler(entry, io_exception, handler);

		prune_runtime_exception_handlers(&mut ctx, f);

		assert_eq!(ctx.block_handlers(entry).len(), 1);
	}
}
