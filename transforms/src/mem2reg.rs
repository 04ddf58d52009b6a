//! Promotes locals written by `Store`/read by `Load` back to plain SSA values, the way the
//! frontend's per-JVM-slot [`ir::LocalId`]s would have been had the bytecode been stack-machine-free
//! to begin with.
//!
//! Three cases, cheapest first:
//! - a local with no uses at all is simply dropped;
//! - a local with exactly one `Store` that dominates every `Load` is a direct substitution, no phi
//!   needed;
//! - a local used only within a single block is resolved by a linear scan of that block;
//!
//! anything left over goes through the general construction: insert a `Phi` at every block in the
//! iterated dominance frontier of the local's stores, then rename every `Load`/`Store` by a
//! depth-first walk of the dominator tree, threading the reaching value through a stack that's
//! pushed on `Store`/`Phi` and popped on return from a child.

use std::collections::{HashMap, HashSet};

use log::trace;

use ir::dominance::Dominance;
use ir::instr::Opcode;
use ir::types::TypeId;
use ir::{BlockId, Context, FunctionId, InstId, LocalId, ValueId};

pub fn promote_locals(ctx: &mut Context, function: FunctionId) {
	let dom = Dominance::forward(ctx, function);
	for local in ctx.function_locals(function).to_vec() {
		promote_one(ctx, function, local, &dom);
	}
}

fn promote_one(ctx: &mut Context, function: FunctionId, local: LocalId, dom: &Dominance) {
	let uses = collect_uses(ctx, local);
	if uses.is_empty() {
		ctx.remove_local(function, local);
		return;
	}

	let stores: Vec<InstId> = uses.iter().copied().filter(|&i| is_opcode(ctx, i, OpKind::Store)).collect();
	let loads: Vec<InstId> = uses.iter().copied().filter(|&i| is_opcode(ctx, i, OpKind::Load)).collect();

	if stores.len() == 1 && promote_single_store(ctx, function, local, stores[0], &loads, dom) {
		return;
	}

	let blocks: HashSet<BlockId> = uses.iter().map(|&i| ctx.instruction_parent(i).expect("use outside any block")).collect();
	if blocks.len() == 1 {
		let block = *blocks.iter().next().expect("non-empty set");
		promote_single_block(ctx, function, local, block);
		return;
	}

	trace!("{}: {} needs a general phi-based promotion ({} stores, {} blocks)", ctx.function_name(function), ctx.local_name(local), stores.len(), blocks.len());
	promote_general(ctx, function, local, &stores, dom);
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum OpKind {
	Load,
	Store,
}

fn is_opcode(ctx: &Context, inst: InstId, kind: OpKind) -> bool {
	match (ctx.instruction_opcode(inst), kind) {
		(Opcode::Load, OpKind::Load) | (Opcode::Store, OpKind::Store) => true,
		_ => false,
	}
}

fn collect_uses(ctx: &Context, local: LocalId) -> Vec<InstId> {
	ctx.uses_of(ValueId::from(local)).map(InstId).collect()
}

/// A single `Store` that dominates every `Load` of the same local: substitute the stored value
/// directly, no phi needed. Returns `false` (doing nothing) if some load isn't dominated, leaving
/// the caller to fall through to the general construction.
fn promote_single_store(ctx: &mut Context, function: FunctionId, local: LocalId, store: InstId, loads: &[InstId], dom: &Dominance) -> bool {
	let store_block = ctx.instruction_parent(store).expect("store outside any block");
	let dominated = loads.iter().all(|&load| {
		let load_block = ctx.instruction_parent(load).expect("load outside any block");
		instruction_dominates(ctx, dom, store, store_block, load, load_block)
	});
	if !dominated {
		return false;
	}

	let value = ctx.instruction_operand(store, 1);
	for &load in loads {
		ctx.replace_all_uses_with(ValueId::from(load), value);
	}
	for &load in loads {
		ctx.remove_instruction(load);
	}
	ctx.remove_instruction(store);
	ctx.remove_local(function, local);
	true
}

fn instruction_dominates(ctx: &Context, dom: &Dominance, def: InstId, def_block: BlockId, use_: InstId, use_block: BlockId) -> bool {
	if def_block != use_block {
		return dom.dominates(def_block, use_block);
	}
	let instrs = ctx.block_instructions(def_block);
	let def_pos = instrs.iter().position(|&i| i == def).expect("def in its own block");
	let use_pos = instrs.iter().position(|&i| i == use_).expect("use in its own block");
	def_pos < use_pos
}

/// Every use sits in one block: a plain left-to-right scan tracking the latest stored value.
fn promote_single_block(ctx: &mut Context, function: FunctionId, local: LocalId, block: BlockId) {
	let ty = ctx.value_type(ValueId::from(local));
	let mut current: Option<ValueId> = None;
	let mut dead = Vec::new();

	for inst in ctx.block_instructions(block).to_vec() {
		if is_opcode(ctx, inst, OpKind::Load) && ctx.instruction_operand(inst, 0) == ValueId::from(local) {
			let value = current.unwrap_or_else(|| ctx.poison_value(ty));
			ctx.replace_all_uses_with(ValueId::from(inst), value);
			dead.push(inst);
		} else if is_opcode(ctx, inst, OpKind::Store) && ctx.instruction_operand(inst, 0) == ValueId::from(local) {
			current = Some(ctx.instruction_operand(inst, 1));
			dead.push(inst);
		}
	}

	for inst in dead {
		ctx.remove_instruction(inst);
	}
	ctx.remove_local(function, local);
}

/// Iterated dominance frontier of the stores, phi insertion, then a dominator-tree DFS rename.
fn promote_general(ctx: &mut Context, function: FunctionId, local: LocalId, stores: &[InstId], dom: &Dominance) {
	let ty = ctx.value_type(ValueId::from(local));

	let def_blocks: HashSet<BlockId> = stores.iter().map(|&i| ctx.instruction_parent(i).expect("store outside any block")).collect();
	let mut phi_blocks: HashSet<BlockId> = HashSet::new();
	let mut worklist: Vec<BlockId> = def_blocks.into_iter().collect();
	while let Some(b) = worklist.pop() {
		for d in dom.frontier(b) {
			if phi_blocks.insert(d) {
				worklist.push(d);
			}
		}
	}

	let mut phi_of: HashMap<BlockId, InstId> = HashMap::new();
	for &b in &phi_blocks {
		phi_of.insert(b, ctx.prepend_instruction(b, Opcode::Phi, ty, &[]));
	}

	let entry = ctx.entry_block(function);
	let reachable = reachable_blocks(ctx, entry);
	let children = dominator_children(dom, entry, &reachable);

	let mut incoming: HashMap<BlockId, HashMap<BlockId, ValueId>> = HashMap::new();
	let mut dead = Vec::new();
	let mut reaching = Vec::new();
	rename(ctx, local, ty, entry, &phi_of, &children, &mut incoming, &mut reaching, &mut dead);

	for (&block, &phi) in &phi_of {
		for pred in ir::cfg::predecessors(ctx, block) {
			let value = incoming.get(&block).and_then(|m| m.get(&pred)).copied().unwrap_or_else(|| ctx.poison_value(ty));
			ctx.push_instruction_operand(phi, value);
		}
	}

	for inst in dead {
		ctx.remove_instruction(inst);
	}
	if !ctx.has_uses(ValueId::from(local)) {
		ctx.remove_local(function, local);
	}
}

fn reachable_blocks(ctx: &Context, entry: BlockId) -> Vec<BlockId> {
	let mut seen = HashSet::new();
	let mut order = Vec::new();
	let mut stack = vec![entry];
	seen.insert(entry);
	while let Some(b) = stack.pop() {
		order.push(b);
		for s in ir::cfg::all_successors(ctx, b) {
			if seen.insert(s) {
				stack.push(s);
			}
		}
	}
	order
}

fn dominator_children(dom: &Dominance, entry: BlockId, reachable: &[BlockId]) -> HashMap<BlockId, Vec<BlockId>> {
	let mut children: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
	for &b in reachable {
		if b == entry {
			continue;
		}
		if let Some(idom) = dom.immediate_dominator(b) {
			children.entry(idom).or_default().push(b);
		}
	}
	children
}

#[allow(clippy::too_many_arguments)]
fn rename(
	ctx: &mut Context,
	local: LocalId,
	ty: TypeId,
	block: BlockId,
	phi_of: &HashMap<BlockId, InstId>,
	children: &HashMap<BlockId, Vec<BlockId>>,
	incoming: &mut HashMap<BlockId, HashMap<BlockId, ValueId>>,
	reaching: &mut Vec<ValueId>,
	dead: &mut Vec<InstId>,
) {
	let mut pushed = 0;
	if let Some(&phi) = phi_of.get(&block) {
		reaching.push(ValueId::from(phi));
		pushed += 1;
	}

	for inst in ctx.block_instructions(block).to_vec() {
		if is_opcode(ctx, inst, OpKind::Load) && ctx.instruction_operand(inst, 0) == ValueId::from(local) {
			let value = reaching.last().copied().unwrap_or_else(|| ctx.poison_value(ty));
			ctx.replace_all_uses_with(ValueId::from(inst), value);
			dead.push(inst);
		} else if is_opcode(ctx, inst, OpKind::Store) && ctx.instruction_operand(inst, 0) == ValueId::from(local) {
			reaching.push(ctx.instruction_operand(inst, 1));
			pushed += 1;
			dead.push(inst);
		}
	}

	let current = reaching.last().copied();
	for succ in ir::cfg::all_successors(ctx, block) {
		if phi_of.contains_key(&succ) {
			let value = current.unwrap_or_else(|| ctx.poison_value(ty));
			incoming.entry(succ).or_default().insert(block, value);
		}
	}

	if let Some(kids) = children.get(&block).cloned() {
		for child in kids {
			rename(ctx, local, ty, child, phi_of, children, incoming, reaching, dead);
		}
	}

	for _ in 0..pushed {
		reaching.pop();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ir::types::IntWidth;

	#[test]
	fn local_with_no_uses_is_dropped() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		ctx.append_instruction(entry, Opcode::Return, void, &[]);

		let int = ctx.int_type(IntWidth::W32);
		let local = ctx.append_local(f, int, "x");

		promote_locals(&mut ctx, f);
		assert!(!ctx.function_locals(f).contains(&local));
	}

	#[test]
	fn single_store_dominating_loads_is_substituted_directly() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let int = ctx.int_type(IntWidth::W32);
		let fn_ty = ctx.function_type(int, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);
		let entry = ctx.append_block(f, "entry");
		let local = ctx.append_local(f, int, "x");

		let forty_two = ctx.constant_int(42, IntWidth::W32);
		ctx.append_instruction(entry, Opcode::Store, void, &[ValueId::from(local), forty_two]);
		let load = ctx.append_instruction(entry, Opcode::Load, int, &[ValueId::from(local)]);
		ctx.append_instruction(entry, Opcode::Return, int, &[ValueId::from(load)]);

		promote_locals(&mut ctx, f);

		assert!(ctx.function_locals(f).is_empty());
		let term = ctx.block_terminator(entry).unwrap();
		assert_eq!(ctx.instruction_operand(term, 0), forty_two);
	}

	#[test]
	fn diamond_merge_gets_a_phi() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let label = ctx.label_type();
		let int = ctx.int_type(IntWidth::W32);
		let fn_ty = ctx.function_type(int, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);

		let entry = ctx.append_block(f, "entry");
		let a = ctx.append_block(f, "a");
		let b = ctx.append_block(f, "b");
		let join = ctx.append_block(f, "join");
		let local = ctx.append_local(f, int, "x");

		let cond = ctx.constant_int(1, IntWidth::W1);
		ctx.append_instruction(entry, Opcode::BranchConditional, label, &[cond, ValueId::from(a), ValueId::from(b)]);

		let one = ctx.constant_int(1, IntWidth::W32);
		ctx.append_instruction(a, Opcode::Store, void, &[ValueId::from(local), one]);
		ctx.append_instruction(a, Opcode::BranchUnconditional, label, &[ValueId::from(join)]);

		let two = ctx.constant_int(2, IntWidth::W32);
		ctx.append_instruction(b, Opcode::Store, void, &[ValueId::from(local), two]);
		ctx.append_instruction(b, Opcode::BranchUnconditional, label, &[ValueId::from(join)]);

		let load = ctx.append_instruction(join, Opcode::Load, int, &[ValueId::from(local)]);
		ctx.append_instruction(join, Opcode::Return, int, &[ValueId::from(load)]);

		promote_locals(&mut ctx, f);

		assert!(ctx.function_locals(f).is_empty());
		let phi = ctx.block_instructions(join)[0];
		assert!(matches!(ctx.instruction_opcode(phi), Opcode::Phi));
		let operands = ctx.instruction_operands(phi);
		assert_eq!(operands.len(), 2);
		assert!(operands.contains(&one));
		assert!(operands.contains(&two));
	}
}
