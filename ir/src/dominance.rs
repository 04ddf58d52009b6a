//! Dominator tree and dominance frontier computation, forward and reverse.
//!
//! The iterative Cooper-Harvey-Kennedy fixpoint itself is exactly what
//! [`petgraph::algo::dominators::simple_fast`] implements, so rather than hand-roll the
//! postorder/intersect walk this module builds a throwaway [`petgraph::graph::DiGraph`] view of
//! the function's CFG and asks petgraph for the immediate dominators; only the dominance-frontier
//! step (which petgraph doesn't provide) is computed here, from that idom table.

use std::collections::{HashMap, HashSet};
use petgraph::algo::dominators::{self, Dominators};
use petgraph::graph::{DiGraph, NodeIndex};
use crate::cfg;
use crate::context::Context;
use crate::value::{BlockId, FunctionId};

/// Forward or reverse (post-) dominance over one function's reachable blocks.
pub struct Dominance {
	node_of: HashMap<BlockId, NodeIndex>,
	block_of: Vec<Option<BlockId>>,
	dominators: Dominators<NodeIndex>,
	frontier: HashMap<BlockId, HashSet<BlockId>>,
}

impl Dominance {
	/// Dominance over the forward CFG, rooted at the function's entry block.
	pub fn forward(ctx: &Context, function: FunctionId) -> Dominance {
		let entry = ctx.entry_block(function);
		Dominance::build(entry, |b| cfg::all_successors(ctx, b), |b| cfg::predecessors(ctx, b))
	}

	/// Post-dominance: dominance over the CFG with every edge reversed, rooted at a synthetic
	/// exit node that every block with no successors flows into.
	pub fn reverse(ctx: &Context, function: FunctionId) -> Dominance {
		let entry = ctx.entry_block(function);

		// discover the forward-reachable set first, so the synthetic exit only gets edges from
		// blocks that are actually part of this function's live CFG.
		let mut reachable = Vec::new();
		let mut seen = HashSet::new();
		let mut stack = vec![entry];
		seen.insert(entry);
		while let Some(b) = stack.pop() {
			reachable.push(b);
			for s in cfg::all_successors(ctx, b) {
				if seen.insert(s) {
					stack.push(s);
				}
			}
		}
		let exits: Vec<BlockId> = reachable.iter().copied().filter(|&b| cfg::all_successors(ctx, b).is_empty()).collect();

		let mut graph = DiGraph::<Option<BlockId>, ()>::new();
		let mut node_of = HashMap::new();
		let exit_node = graph.add_node(None);
		for &b in &reachable {
			node_of.insert(b, graph.add_node(Some(b)));
		}
		for &b in &reachable {
			let from = node_of[&b];
			for p in cfg::predecessors(ctx, b) {
				if let Some(&to) = node_of.get(&p) {
					graph.add_edge(from, to, ());
				}
			}
		}
		for &b in &exits {
			graph.add_edge(exit_node, node_of[&b], ());
		}

		let dominators = dominators::simple_fast(&graph, exit_node);
		let block_of = (0..graph.node_count()).map(|i| graph[NodeIndex::new(i)]).collect();

		let mut dom = Dominance { node_of, block_of, dominators, frontier: HashMap::new() };
		dom.compute_frontiers_reverse(ctx, &reachable);
		dom
	}

	fn build(
		entry: BlockId,
		successors: impl Fn(BlockId) -> Vec<BlockId>,
		predecessors: impl Fn(BlockId) -> Vec<BlockId>,
	) -> Dominance {
		let mut graph = DiGraph::<Option<BlockId>, ()>::new();
		let mut node_of = HashMap::new();
		node_of.insert(entry, graph.add_node(Some(entry)));

		let mut stack = vec![entry];
		while let Some(b) = stack.pop() {
			for s in successors(b) {
				if !node_of.contains_key(&s) {
					node_of.insert(s, graph.add_node(Some(s)));
					stack.push(s);
				}
				graph.add_edge(node_of[&b], node_of[&s], ());
			}
		}

		let entry_node = node_of[&entry];
		let dominators = dominators::simple_fast(&graph, entry_node);
		let block_of = (0..graph.node_count()).map(|i| graph[NodeIndex::new(i)]).collect();

		let reachable: Vec<BlockId> = node_of.keys().copied().collect();
		let mut dom = Dominance { node_of, block_of, dominators, frontier: HashMap::new() };
		dom.compute_frontiers(&reachable, &predecessors);
		dom
	}

	pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
		let node = *self.node_of.get(&block)?;
		let idom_node = self.dominators.immediate_dominator(node)?;
		self.block_of[idom_node.index()]
	}

	pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
		let mut cur = b;
		loop {
			if cur == a {
				return true;
			}
			match self.immediate_dominator(cur) {
				Some(next) if next != cur => cur = next,
				_ => return false,
			}
		}
	}

	pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
		a != b && self.dominates(a, b)
	}

	pub fn frontier(&self, block: BlockId) -> Vec<BlockId> {
		self.frontier.get(&block).map(|set| set.iter().copied().collect()).unwrap_or_default()
	}

	fn compute_frontiers(&mut self, reachable: &[BlockId], predecessors: &impl Fn(BlockId) -> Vec<BlockId>) {
		for &b in reachable {
			let preds: Vec<BlockId> = predecessors(b).into_iter().filter(|p| self.node_of.contains_key(p)).collect();
			if preds.len() < 2 {
				continue;
			}
			let Some(idom_b) = self.immediate_dominator(b) else { continue };
			for p in preds {
				let mut runner = p;
				while runner != idom_b {
					self.frontier.entry(runner).or_default().insert(b);
					let Some(next) = self.immediate_dominator(runner) else { break };
					if next == runner {
						break;
					}
					runner = next;
				}
			}
		}
	}

	fn compute_frontiers_reverse(&mut self, ctx: &Context, reachable: &[BlockId]) {
		let preds_are_successors = |b: BlockId| cfg::all_successors(ctx, b);
		self.compute_frontiers(reachable, &preds_are_successors);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::instr::Opcode;
	use crate::value::ValueId;

	/// `entry -> {a, b} -> join`, join's frontier-insertion predecessor set has two members.
	#[test]
	fn diamond_join_is_in_both_branch_frontiers() {
		let mut ctx = Context::new();
		let void = ctx.void_type();
		let label = ctx.label_type();
		let fn_ty = ctx.function_type(void, vec![]);
		let f = ctx.create_function("t", fn_ty, true, &[]);

		let entry = ctx.append_block(f, "entry");
		let a = ctx.append_block(f, "a");
		let b = ctx.append_block(f, "b");
		let join = ctx.append_block(f, "join");

		let cond = ctx.constant_int(1, crate::types::IntWidth::W1);
		ctx.append_instruction(entry, Opcode::BranchConditional, label, &[cond, ValueId::from(a), ValueId::from(b)]);
		ctx.append_instruction(a, Opcode::BranchUnconditional, label, &[ValueId::from(join)]);
		ctx.append_instruction(b, Opcode::BranchUnconditional, label, &[ValueId::from(join)]);
		ctx.append_instruction(join, Opcode::Return, void, &[]);

		let dom = Dominance::forward(&ctx, f);
		assert_eq!(dom.immediate_dominator(join), Some(entry));
		assert!(dom.frontier(a).contains(&join));
		assert!(dom.frontier(b).contains(&join));
		assert!(dom.dominates(entry, join));
		assert!(!dom.strictly_dominates(join, join));
	}
}
