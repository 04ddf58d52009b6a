//! Stack-to-SSA lowering: turns one method's [`Code`] (a linear, typed-stack instruction list)
//! into an [`ir`] function body over basic blocks.
//!
//! Block leaders are discovered in one upfront pass (every branch/switch target, every exception
//! handler, and the instruction right after any terminator), so every later reference to a
//! branch target is a lookup into an already-registered block rather than a fresh discovery.
//! Within a block, the operand stack is tracked as a plain `Vec<ValueId>`; at a join point it is
//! spilled into per-slot [`LocalId`]s the first time that edge is crossed ([`Lowerer::materialize`]),
//! and every later edge into the same join stores into those same locals. `transforms::promote_locals`
//! is what turns those locals (and the real JVM local variable slots) back into `Phi`s.
//!
//! `duke`'s [`Label`] only exposes a `pub(crate)` numeric id, so this module never does arithmetic
//! on program counters: labels are used purely as the opaque, hashable/comparable tokens they
//! already are, and "the next instruction" is always "the next entry in the already pc-ordered
//! `instructions` vector", never `label.id + 1`.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{anyhow, bail, Result};
use log::{trace, warn};

use duke::tree::method::Method;
use duke::tree::method::code::{
	ArrayType as CodeArrayType, Code, Exception, Handle, Instruction, InstructionListEntry, Label, Loadable, LvIndex,
};
use duke::tree::method::MethodRef;
use ir::instr::{BinOp, CmpOp, InvokeKind, JavaCompareKind, Opcode};
use ir::types::{IntWidth, TypeId};
use ir::{BlockId, Context, FunctionId, LocalId, ValueId};

use crate::diagnostic::LoweringError;
use crate::types as ftypes;

/// Lowers `method`'s body (`code`, its `Code` attribute) into the blocks of the already-registered
/// `function`.
pub fn lower_method_body(ctx: &mut Context, function: FunctionId, method_name: &str, method: &Method, code: &Code) -> Result<()> {
	let mut lowerer = Lowerer::new(ctx, function, method_name, code)?;
	lowerer.seed_arguments(method)?;
	lowerer.run()?;
	lowerer.attach_handlers()?;
	Ok(())
}

struct BlockInfo {
	block: BlockId,
	/// `None` until the first edge into this block is crossed; `Some(locals)` pins the stack
	/// shape every later edge must agree with (see [`Lowerer::materialize`]).
	entry_stack: Option<Vec<LocalId>>,
	is_handler: bool,
	visited: bool,
}

struct Lowerer<'a> {
	ctx: &'a mut Context,
	function: FunctionId,
	method_name: String,
	entries: Vec<InstructionListEntry>,
	index_of: HashMap<Label, usize>,
	exception_table: Vec<Exception>,
	block_map: HashMap<Label, BlockInfo>,
	leaders: Vec<Label>,
	locals: HashMap<u16, LocalId>,
	queue: VecDeque<Label>,
}

impl<'a> Lowerer<'a> {
	fn new(ctx: &'a mut Context, function: FunctionId, method_name: &str, code: &Code) -> Result<Self> {
		let entries = code.instructions.clone();
		if entries.is_empty() {
			bail!("{method_name}: a method with a Code attribute has no instructions");
		}

		let mut index_of = HashMap::with_capacity(entries.len() + 1);
		for (i, entry) in entries.iter().enumerate() {
			let label = entry
				.label
				.ok_or_else(|| anyhow!("{method_name}: instruction at index {i} has no label"))?;
			index_of.insert(label, i);
		}
		if let Some(last) = code.last_label {
			index_of.entry(last).or_insert(entries.len());
		}

		let leader_set = discover_leaders(method_name, &entries)?;
		let handler_set: HashSet<Label> = code.exception_table.iter().map(|exc| exc.handler).collect();
		let mut all_leaders: HashSet<Label> = leader_set;
		all_leaders.extend(handler_set.iter().copied());

		let mut leaders: Vec<Label> = all_leaders.into_iter().collect();
		leaders.sort_by_key(|label| index_of[label]);

		let mut block_map = HashMap::with_capacity(leaders.len());
		for (n, &label) in leaders.iter().enumerate() {
			let is_handler = handler_set.contains(&label);
			let is_entry = index_of[&label] == 0;
			let name = if is_handler { format!("handler{n}") } else { format!("block{n}") };
			let block = ctx.append_block(function, &name);
			let entry_stack = if is_handler || is_entry { Some(Vec::new()) } else { None };
			block_map.insert(label, BlockInfo { block, entry_stack, is_handler, visited: false });
		}

		Ok(Lowerer {
			ctx,
			function,
			method_name: method_name.to_owned(),
			entries,
			index_of,
			exception_table: code.exception_table.clone(),
			block_map,
			leaders,
			locals: HashMap::new(),
			queue: VecDeque::new(),
		})
	}

	fn entry_label(&self) -> Label {
		self.leaders[0]
	}

	/// Stores each incoming argument into the JVM local slot it occupies on entry, per the
	/// standard slot assignment (`this` at slot 0 for instance methods, then one slot per
	/// parameter, two for a category-two parameter).
	fn seed_arguments(&mut self, _method: &Method) -> Result<()> {
		let entry_block = self.block_map[&self.entry_label()].block;
		let args = self.ctx.function_arguments(self.function).to_vec();
		let mut slot: u16 = 0;
		for arg in args {
			let arg_value = ValueId::from(arg);
			let ty = self.ctx.value_type(arg_value);
			let local = self.local_for(slot, ty);
			let void = self.ctx.void_type();
			self.ctx.append_instruction(entry_block, Opcode::Store, void, &[ValueId::from(local), arg_value]);
			slot += if ftypes::is_category_two(self.ctx, ty) { 2 } else { 1 };
		}
		Ok(())
	}

	fn local_for(&mut self, slot: u16, ty: TypeId) -> LocalId {
		if let Some(&local) = self.locals.get(&slot) {
			return local;
		}
		let local = self.ctx.append_local(self.function, ty, &format!("local{slot}"));
		self.locals.insert(slot, local);
		local
	}

	fn run(&mut self) -> Result<()> {
		self.queue.push_back(self.entry_label());
		for exc in self.exception_table.clone() {
			self.queue.push_back(exc.handler);
		}
		while let Some(label) = self.queue.pop_front() {
			if self.block_map[&label].visited {
				continue;
			}
			self.process_block(label)?;
		}
		self.remove_unreached_leaders();
		Ok(())
	}

	/// A leader registered only because it follows an unconditional terminator (§4.6 phase 1) may
	/// turn out to be genuinely dead code: nothing ever branches or falls into it, so it is never
	/// popped off `queue` and never gets a terminator of its own. Drop any such block here, before
	/// `lower_method_body` returns, so every block this lowerer hands back already satisfies P1/I4
	/// instead of relying on a later cleanup pass to notice the orphan.
	fn remove_unreached_leaders(&mut self) {
		for &label in &self.leaders {
			let info = &self.block_map[&label];
			if info.visited {
				continue;
			}
			trace!("{}: dropping unreached leader block at {:?}, no edge ever targets it", self.method_name, label);
			self.ctx.remove_block(self.function, info.block);
		}
	}

	fn process_block(&mut self, label: Label) -> Result<()> {
		let info = self.block_map.get_mut(&label).expect("leader pre-registered in new()");
		info.visited = true;
		let block = info.block;
		let is_handler = info.is_handler;
		let entry_locals = info.entry_stack.clone().unwrap_or_default();
		trace!("{}: lowering block at entry label, handler={is_handler}", self.method_name);

		let mut stack: Vec<ValueId> = Vec::new();
		if is_handler {
			let throwable = self.ctx.reference_type("java/lang/Throwable");
			let inst = self.ctx.append_instruction(block, Opcode::Catch(throwable), throwable, &[]);
			stack.push(ValueId::from(inst));
		} else {
			for &local in &entry_locals {
				let ty = self.ctx.value_type(ValueId::from(local));
				let inst = self.ctx.append_instruction(block, Opcode::Load, ty, &[ValueId::from(local)]);
				stack.push(ValueId::from(inst));
			}
		}

		let mut i = self.index_of[&label];
		loop {
			let entry = self.entries[i].clone();
			self.lower_instruction(block, &mut stack, &entry.instruction, i)?;

			if self.ctx.has_terminator(block) {
				break;
			}

			let next_index = i + 1;
			let next = self
				.entries
				.get(next_index)
				.ok_or_else(|| anyhow!("{}: fell off the end of the code without a terminator", self.method_name))?;
			let next_label = next.label.expect("every decoded instruction carries a label");
			if self.block_map.contains_key(&next_label) {
				let label_ty = self.ctx.label_type();
				let target = self.materialize(block, &stack, next_label, true)?;
				self.ctx.append_instruction(block, Opcode::BranchUnconditional, label_ty, &[ValueId::from(target)]);
				break;
			}
			i = next_index;
		}
		Ok(())
	}

	/// Returns the block registered for `label`. If `save_stack`, also records (on first crossing)
	/// or checks (on every later crossing) that `stack` is a valid shape to enter `label` with,
	/// spilling it into per-slot locals and emitting the `Store`s into `current_block`.
	fn materialize(&mut self, current_block: BlockId, stack: &[ValueId], label: Label, save_stack: bool) -> Result<BlockId> {
		let block = self
			.block_map
			.get(&label)
			.ok_or_else(|| anyhow!("{}: branch target is not a registered block leader", self.method_name))?
			.block;
		if !save_stack {
			return Ok(block);
		}

		let already_pinned = self.block_map[&label].entry_stack.is_some();
		if !already_pinned {
			let mut spill = Vec::with_capacity(stack.len());
			for &value in stack {
				let ty = self.ctx.value_type(value);
				let local = self.ctx.append_local(self.function, ty, "stackslot");
				let void = self.ctx.void_type();
				self.ctx.append_instruction(current_block, Opcode::Store, void, &[ValueId::from(local), value]);
				spill.push(local);
			}
			let info = self.block_map.get_mut(&label).expect("looked up above");
			info.entry_stack = Some(spill);
			if !info.visited {
				self.queue.push_back(label);
			}
			return Ok(block);
		}

		let entry_locals = self.block_map[&label].entry_stack.clone().expect("checked above");
		if stack.len() > entry_locals.len() {
			bail!(LoweringError::InconsistentStack { method: self.method_name.clone() });
		}
		// A shorter current stack is tolerated: it is taken to line up with the *top* of the
		// pinned shape, leaving the deeper (bottom) locals untouched (see SPEC_FULL §9).
		let diff = entry_locals.len() - stack.len();
		for (i, &value) in stack.iter().enumerate() {
			let local = entry_locals[diff + i];
			let void = self.ctx.void_type();
			self.ctx.append_instruction(current_block, Opcode::Store, void, &[ValueId::from(local), value]);
		}
		Ok(block)
	}

	fn next_label(&self, index: usize) -> Result<Label> {
		self.entries
			.get(index + 1)
			.and_then(|e| e.label)
			.ok_or_else(|| anyhow!("{}: conditional branch is the last instruction", self.method_name))
	}

	fn cat2(&self, value: ValueId) -> bool {
		ftypes::is_category_two(self.ctx, self.ctx.value_type(value))
	}

	fn lower_instruction(&mut self, block: BlockId, stack: &mut Vec<ValueId>, instr: &Instruction, index: usize) -> Result<()> {
		use Instruction as I;
		match instr {
			I::Nop => {}
			I::AConstNull => {
				let ty = self.ctx.any_type();
				stack.push(self.ctx.constant_null(ty));
			}
			I::IConstM1 => self.push_i32(stack, -1),
			I::IConst0 => self.push_i32(stack, 0),
			I::IConst1 => self.push_i32(stack, 1),
			I::IConst2 => self.push_i32(stack, 2),
			I::IConst3 => self.push_i32(stack, 3),
			I::IConst4 => self.push_i32(stack, 4),
			I::IConst5 => self.push_i32(stack, 5),
			I::LConst0 => stack.push(self.ctx.constant_int(0, IntWidth::W64)),
			I::LConst1 => stack.push(self.ctx.constant_int(1, IntWidth::W64)),
			I::FConst0 => stack.push(self.ctx.constant_float(0.0)),
			I::FConst1 => stack.push(self.ctx.constant_float(1.0)),
			I::FConst2 => stack.push(self.ctx.constant_float(2.0)),
			I::DConst0 => stack.push(self.ctx.constant_double(0.0)),
			I::DConst1 => stack.push(self.ctx.constant_double(1.0)),
			I::BiPush(v) => self.push_i32(stack, *v as i32),
			I::SiPush(v) => self.push_i32(stack, *v as i32),
			I::Ldc(loadable) => {
				let value = self.lower_loadable(loadable)?;
				stack.push(value);
			}

			I::ILoad(lv) => self.load_local(block, stack, lv, IntWidth::W32.into()),
			I::FLoad(lv) => self.load_local(block, stack, lv, LocalTy::Float),
			I::LLoad(lv) => self.load_local(block, stack, lv, IntWidth::W64.into()),
			I::DLoad(lv) => self.load_local(block, stack, lv, LocalTy::Double),
			I::ALoad(lv) => self.load_local(block, stack, lv, LocalTy::Any),
			I::IStore(lv) => self.store_local(block, stack, lv, IntWidth::W32.into())?,
			I::FStore(lv) => self.store_local(block, stack, lv, LocalTy::Float)?,
			I::LStore(lv) => self.store_local(block, stack, lv, IntWidth::W64.into())?,
			I::DStore(lv) => self.store_local(block, stack, lv, LocalTy::Double)?,
			I::AStore(lv) => self.store_local(block, stack, lv, LocalTy::Any)?,

			I::IALoad => self.load_array(block, stack, self.ctx.int_type(IntWidth::W32))?,
			I::LALoad => self.load_array(block, stack, self.ctx.int_type(IntWidth::W64))?,
			I::FALoad => self.load_array(block, stack, self.ctx.float_type())?,
			I::DALoad => self.load_array(block, stack, self.ctx.double_type())?,
			I::AALoad => self.load_array(block, stack, self.ctx.any_type())?,
			I::BALoad => self.load_array(block, stack, self.ctx.int_type(IntWidth::W8))?,
			I::CALoad => self.load_array(block, stack, self.ctx.int_type(IntWidth::W16))?,
			I::SALoad => self.load_array(block, stack, self.ctx.int_type(IntWidth::W16))?,
			I::IAStore | I::LAStore | I::FAStore | I::DAStore | I::AAStore | I::BAStore | I::CAStore | I::SAStore => {
				self.store_array(block, stack)?
			}

			I::Pop => {
				stack.pop().ok_or_else(|| self.underflow())?;
			}
			I::Pop2 => {
				let top = *stack.last().ok_or_else(|| self.underflow())?;
				stack.pop();
				if !self.cat2(top) {
					stack.pop().ok_or_else(|| self.underflow())?;
				}
			}
			I::Dup => {
				let v = *stack.last().ok_or_else(|| self.underflow())?;
				stack.push(v);
			}
			I::DupX1 => {
				let v1 = stack.pop().ok_or_else(|| self.underflow())?;
				let v2 = stack.pop().ok_or_else(|| self.underflow())?;
				stack.push(v1);
				stack.push(v2);
				stack.push(v1);
			}
			I::DupX2 => {
				let v1 = stack.pop().ok_or_else(|| self.underflow())?;
				if self.cat2(*stack.last().ok_or_else(|| self.underflow())?) {
					let v2 = stack.pop().ok_or_else(|| self.underflow())?;
					stack.push(v1);
					stack.push(v2);
					stack.push(v1);
				} else {
					let v2 = stack.pop().ok_or_else(|| self.underflow())?;
					let v3 = stack.pop().ok_or_else(|| self.underflow())?;
					stack.push(v1);
					stack.push(v3);
					stack.push(v2);
					stack.push(v1);
				}
			}
			I::Dup2 => {
				let v1 = *stack.last().ok_or_else(|| self.underflow())?;
				if self.cat2(v1) {
					stack.push(v1);
				} else {
					let v2 = stack[stack.len() - 2];
					stack.push(v2);
					stack.push(v1);
				}
			}
			I::Dup2X1 => {
				if self.cat2(*stack.last().ok_or_else(|| self.underflow())?) {
					let v1 = stack.pop().ok_or_else(|| self.underflow())?;
					let v2 = stack.pop().ok_or_else(|| self.underflow())?;
					stack.push(v1);
					stack.push(v2);
					stack.push(v1);
				} else {
					let v1 = stack.pop().ok_or_else(|| self.underflow())?;
					let v2 = stack.pop().ok_or_else(|| self.underflow())?;
					let v3 = stack.pop().ok_or_else(|| self.underflow())?;
					stack.push(v2);
					stack.push(v1);
					stack.push(v3);
					stack.push(v2);
					stack.push(v1);
				}
			}
			I::Dup2X2 => self.dup2_x2(stack)?,
			I::Swap => {
				let v1 = stack.pop().ok_or_else(|| self.underflow())?;
				let v2 = stack.pop().ok_or_else(|| self.underflow())?;
				stack.push(v1);
				stack.push(v2);
			}

			I::IAdd => self.binary(block, stack, BinOp::Add, IntWidth::W32.into())?,
			I::LAdd => self.binary(block, stack, BinOp::Add, IntWidth::W64.into())?,
			I::FAdd => self.binary(block, stack, BinOp::Add, LocalTy::Float)?,
			I::DAdd => self.binary(block, stack, BinOp::Add, LocalTy::Double)?,
			I::ISub => self.binary(block, stack, BinOp::Sub, IntWidth::W32.into())?,
			I::LSub => self.binary(block, stack, BinOp::Sub, IntWidth::W64.into())?,
			I::FSub => self.binary(block, stack, BinOp::Sub, LocalTy::Float)?,
			I::DSub => self.binary(block, stack, BinOp::Sub, LocalTy::Double)?,
			I::IMul => self.binary(block, stack, BinOp::Mul, IntWidth::W32.into())?,
			I::LMul => self.binary(block, stack, BinOp::Mul, IntWidth::W64.into())?,
			I::FMul => self.binary(block, stack, BinOp::Mul, LocalTy::Float)?,
			I::DMul => self.binary(block, stack, BinOp::Mul, LocalTy::Double)?,
			I::IDiv => self.binary(block, stack, BinOp::Div, IntWidth::W32.into())?,
			I::LDiv => self.binary(block, stack, BinOp::Div, IntWidth::W64.into())?,
			I::FDiv => self.binary(block, stack, BinOp::Div, LocalTy::Float)?,
			I::DDiv => self.binary(block, stack, BinOp::Div, LocalTy::Double)?,
			I::IRem => self.binary(block, stack, BinOp::Rem, IntWidth::W32.into())?,
			I::LRem => self.binary(block, stack, BinOp::Rem, IntWidth::W64.into())?,
			I::FRem => self.binary(block, stack, BinOp::Rem, LocalTy::Float)?,
			I::DRem => self.binary(block, stack, BinOp::Rem, LocalTy::Double)?,
			I::IShl => self.binary(block, stack, BinOp::Shl, IntWidth::W32.into())?,
			I::LShl => self.binary(block, stack, BinOp::Shl, IntWidth::W64.into())?,
			I::IShr => self.binary(block, stack, BinOp::Shr, IntWidth::W32.into())?,
			I::LShr => self.binary(block, stack, BinOp::Shr, IntWidth::W64.into())?,
			I::IUShr => self.binary(block, stack, BinOp::UShr, IntWidth::W32.into())?,
			I::LUShr => self.binary(block, stack, BinOp::UShr, IntWidth::W64.into())?,
			I::IAnd => self.binary(block, stack, BinOp::And, IntWidth::W32.into())?,
			I::LAnd => self.binary(block, stack, BinOp::And, IntWidth::W64.into())?,
			I::IOr => self.binary(block, stack, BinOp::Or, IntWidth::W32.into())?,
			I::LOr => self.binary(block, stack, BinOp::Or, IntWidth::W64.into())?,
			I::IXor => self.binary(block, stack, BinOp::Xor, IntWidth::W32.into())?,
			I::LXor => self.binary(block, stack, BinOp::Xor, IntWidth::W64.into())?,

			I::INeg => self.negate(block, stack, IntWidth::W32.into())?,
			I::LNeg => self.negate(block, stack, IntWidth::W64.into())?,
			I::FNeg => self.negate(block, stack, LocalTy::Float)?,
			I::DNeg => self.negate(block, stack, LocalTy::Double)?,

			I::IInc(lv, delta) => {
				let ty = self.ctx.int_type(IntWidth::W32);
				let local = self.local_for(lv.index, ty);
				let loaded = self.ctx.append_instruction(block, Opcode::Load, ty, &[ValueId::from(local)]);
				let delta_value = self.ctx.constant_int(*delta as i64, IntWidth::W32);
				let added = self
					.ctx
					.append_instruction(block, Opcode::Binary(BinOp::Add), ty, &[ValueId::from(loaded), delta_value]);
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::Store, void, &[ValueId::from(local), ValueId::from(added)]);
			}

			I::I2L => self.convert(block, stack, IntWidth::W64.into())?,
			I::I2F => self.convert(block, stack, LocalTy::Float)?,
			I::I2D => self.convert(block, stack, LocalTy::Double)?,
			I::L2I => self.convert(block, stack, IntWidth::W32.into())?,
			I::L2F => self.convert(block, stack, LocalTy::Float)?,
			I::L2D => self.convert(block, stack, LocalTy::Double)?,
			I::F2I => self.convert(block, stack, IntWidth::W32.into())?,
			I::F2L => self.convert(block, stack, IntWidth::W64.into())?,
			I::F2D => self.convert(block, stack, LocalTy::Double)?,
			I::D2I => self.convert(block, stack, IntWidth::W32.into())?,
			I::D2L => self.convert(block, stack, IntWidth::W64.into())?,
			I::D2F => self.convert(block, stack, LocalTy::Float)?,
			I::I2B => self.convert(block, stack, IntWidth::W8.into())?,
			I::I2C => self.convert(block, stack, IntWidth::W16.into())?,
			I::I2S => self.convert(block, stack, IntWidth::W16.into())?,

			I::LCmp => self.java_compare(block, stack, false)?,
			I::FCmpL | I::DCmpL => self.java_compare(block, stack, false)?,
			I::FCmpG | I::DCmpG => self.java_compare(block, stack, true)?,

			I::IfEq(target) => self.cond_branch_zero(block, stack, CmpOp::Eq, *target, index)?,
			I::IfNe(target) => self.cond_branch_zero(block, stack, CmpOp::Ne, *target, index)?,
			I::IfLt(target) => self.cond_branch_zero(block, stack, CmpOp::Lt, *target, index)?,
			I::IfGe(target) => self.cond_branch_zero(block, stack, CmpOp::Ge, *target, index)?,
			I::IfGt(target) => self.cond_branch_zero(block, stack, CmpOp::Gt, *target, index)?,
			I::IfLe(target) => self.cond_branch_zero(block, stack, CmpOp::Le, *target, index)?,
			I::IfICmpEq(target) => self.cond_branch_pair(block, stack, CmpOp::Eq, *target, index)?,
			I::IfICmpNe(target) => self.cond_branch_pair(block, stack, CmpOp::Ne, *target, index)?,
			I::IfICmpLt(target) => self.cond_branch_pair(block, stack, CmpOp::Lt, *target, index)?,
			I::IfICmpGe(target) => self.cond_branch_pair(block, stack, CmpOp::Ge, *target, index)?,
			I::IfICmpGt(target) => self.cond_branch_pair(block, stack, CmpOp::Gt, *target, index)?,
			I::IfICmpLe(target) => self.cond_branch_pair(block, stack, CmpOp::Le, *target, index)?,
			I::IfACmpEq(target) => self.cond_branch_pair(block, stack, CmpOp::Eq, *target, index)?,
			I::IfACmpNe(target) => self.cond_branch_pair(block, stack, CmpOp::Ne, *target, index)?,
			I::IfNull(target) => self.cond_branch_null(block, stack, CmpOp::Eq, *target, index)?,
			I::IfNonNull(target) => self.cond_branch_null(block, stack, CmpOp::Ne, *target, index)?,

			I::Goto(target) => {
				let label_ty = self.ctx.label_type();
				let to = self.materialize(block, stack, *target, true)?;
				self.ctx.append_instruction(block, Opcode::BranchUnconditional, label_ty, &[ValueId::from(to)]);
			}
			I::Jsr(target) => {
				warn!("{}: `jsr`/`ret` subroutines are not modeled, lowering as a plain branch", self.method_name);
				let label_ty = self.ctx.label_type();
				let to = self.materialize(block, stack, *target, true)?;
				self.ctx.append_instruction(block, Opcode::BranchUnconditional, label_ty, &[ValueId::from(to)]);
			}
			I::Ret(_) => {
				warn!("{}: `ret` has no statically known target, lowering as a dead end", self.method_name);
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::Return, void, &[]);
			}

			I::TableSwitch { default, low, high, table } => {
				let key = stack.pop().ok_or_else(|| self.underflow())?;
				let mut operands = vec![key];
				let default_block = self.materialize(block, stack, *default, true)?;
				operands.push(ValueId::from(default_block));
				for &target in table {
					let target_block = self.materialize(block, stack, target, true)?;
					operands.push(ValueId::from(target_block));
				}
				let cases: Vec<i32> = (*low..=*high).collect();
				let label_ty = self.ctx.label_type();
				self.ctx.append_instruction(block, Opcode::Switch { cases }, label_ty, &operands);
			}
			I::LookupSwitch { default, pairs } => {
				let key = stack.pop().ok_or_else(|| self.underflow())?;
				let mut operands = vec![key];
				let default_block = self.materialize(block, stack, *default, true)?;
				operands.push(ValueId::from(default_block));
				let mut cases = Vec::with_capacity(pairs.len());
				for &(case, target) in pairs {
					let target_block = self.materialize(block, stack, target, true)?;
					operands.push(ValueId::from(target_block));
					cases.push(case);
				}
				let label_ty = self.ctx.label_type();
				self.ctx.append_instruction(block, Opcode::Switch { cases }, label_ty, &operands);
			}

			I::IReturn | I::LReturn | I::FReturn | I::DReturn | I::AReturn => {
				let value = stack.pop().ok_or_else(|| self.underflow())?;
				let ty = self.ctx.value_type(value);
				self.ctx.append_instruction(block, Opcode::Return, ty, &[value]);
			}
			I::Return => {
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::Return, void, &[]);
			}

			I::GetStatic(field_ref) => {
				let ty = ftypes::parse_field_type(self.ctx, field_ref.desc.as_slice())?;
				let class_symbol = self.ctx.ensure_class(&field_ref.class.to_string());
				let field = self.ctx.ensure_field(class_symbol, &field_ref.name.to_string(), ty, true);
				let inst = self.ctx.append_instruction(block, Opcode::LoadStaticField(field), ty, &[]);
				stack.push(ValueId::from(inst));
			}
			I::PutStatic(field_ref) => {
				let ty = ftypes::parse_field_type(self.ctx, field_ref.desc.as_slice())?;
				let class_symbol = self.ctx.ensure_class(&field_ref.class.to_string());
				let field = self.ctx.ensure_field(class_symbol, &field_ref.name.to_string(), ty, true);
				let value = stack.pop().ok_or_else(|| self.underflow())?;
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::StoreStaticField(field), void, &[value]);
			}
			I::GetField(field_ref) => {
				let ty = ftypes::parse_field_type(self.ctx, field_ref.desc.as_slice())?;
				let class_symbol = self.ctx.ensure_class(&field_ref.class.to_string());
				let field = self.ctx.ensure_field(class_symbol, &field_ref.name.to_string(), ty, false);
				let object = stack.pop().ok_or_else(|| self.underflow())?;
				let inst = self.ctx.append_instruction(block, Opcode::LoadField(field), ty, &[object]);
				stack.push(ValueId::from(inst));
			}
			I::PutField(field_ref) => {
				let ty = ftypes::parse_field_type(self.ctx, field_ref.desc.as_slice())?;
				let class_symbol = self.ctx.ensure_class(&field_ref.class.to_string());
				let field = self.ctx.ensure_field(class_symbol, &field_ref.name.to_string(), ty, false);
				let value = stack.pop().ok_or_else(|| self.underflow())?;
				let object = stack.pop().ok_or_else(|| self.underflow())?;
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::StoreField(field), void, &[object, value]);
			}

			I::InvokeVirtual(method_ref) => self.lower_invoke(block, stack, method_ref, false, InvokeKind::Virtual)?,
			I::InvokeSpecial(method_ref, _) => self.lower_invoke(block, stack, method_ref, false, InvokeKind::Special)?,
			I::InvokeStatic(method_ref, _) => self.lower_invoke(block, stack, method_ref, true, InvokeKind::Static)?,
			I::InvokeInterface(method_ref) => self.lower_invoke(block, stack, method_ref, false, InvokeKind::Interface)?,
			I::InvokeDynamic(indy) => {
				warn!("{}: invokedynamic call sites are modeled as an opaque static call", self.method_name);
				let (params, ret) = ftypes::parse_method_type(self.ctx, indy.descriptor.as_slice())?;
				let dynamic_class = self.ctx.ensure_class("<dynamic>");
				let fn_type = self.ctx.function_type(ret, params.clone());
				let function = self.ctx.ensure_method(dynamic_class, &indy.name.to_string(), fn_type, true, &params);
				let mut args = Vec::with_capacity(params.len());
				for _ in 0..params.len() {
					args.push(stack.pop().ok_or_else(|| self.underflow())?);
				}
				args.reverse();
				let inst = self.ctx.append_instruction(block, Opcode::Call(function, InvokeKind::Static), ret, &args);
				let void = self.ctx.void_type();
				if ret != void {
					stack.push(ValueId::from(inst));
				}
			}

			I::New(class_name) => {
				let ty = self.ctx.reference_type(&class_name.to_string());
				let inst = self.ctx.append_instruction(block, Opcode::New(ty), ty, &[]);
				stack.push(ValueId::from(inst));
			}
			I::NewArray(element) => {
				let element_ty = self.lower_code_array_type(*element);
				let count = stack.pop().ok_or_else(|| self.underflow())?;
				let array_ty = self.ctx.array_type(element_ty);
				let inst = self.ctx.append_instruction(block, Opcode::NewArray(element_ty), array_ty, &[count]);
				stack.push(ValueId::from(inst));
			}
			I::ANewArray(class_name) => {
				let element_ty = self.ctx.reference_type(&class_name.to_string());
				let count = stack.pop().ok_or_else(|| self.underflow())?;
				let array_ty = self.ctx.array_type(element_ty);
				let inst = self.ctx.append_instruction(block, Opcode::NewArray(element_ty), array_ty, &[count]);
				stack.push(ValueId::from(inst));
			}
			I::MultiANewArray(class_name, dims) => {
				let mut element_ty = self.ctx.reference_type(&class_name.to_string());
				for _ in 0..*dims {
					element_ty = self.ctx.array_type(element_ty);
				}
				let mut counts = Vec::with_capacity(*dims as usize);
				for _ in 0..*dims {
					counts.push(stack.pop().ok_or_else(|| self.underflow())?);
				}
				counts.reverse();
				let inst = self.ctx.append_instruction(block, Opcode::NewArray(element_ty), element_ty, &counts);
				stack.push(ValueId::from(inst));
			}
			I::ArrayLength => {
				let array = stack.pop().ok_or_else(|| self.underflow())?;
				let int32 = self.ctx.int_type(IntWidth::W32);
				let inst = self.ctx.append_instruction(block, Opcode::ArrayLength, int32, &[array]);
				stack.push(ValueId::from(inst));
			}
			I::AThrow => {
				let value = stack.pop().ok_or_else(|| self.underflow())?;
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::Throw, void, &[value]);
			}
			I::CheckCast(class_name) => {
				let ty = self.ctx.reference_type(&class_name.to_string());
				let value = stack.pop().ok_or_else(|| self.underflow())?;
				let inst = self.ctx.append_instruction(block, Opcode::Cast(ty), ty, &[value]);
				stack.push(ValueId::from(inst));
			}
			I::InstanceOf(class_name) => {
				let ty = self.ctx.reference_type(&class_name.to_string());
				let value = stack.pop().ok_or_else(|| self.underflow())?;
				let bool_ty = self.ctx.int_type(IntWidth::W1);
				let inst = self.ctx.append_instruction(block, Opcode::InstanceOf(ty), bool_ty, &[value]);
				stack.push(ValueId::from(inst));
			}
			I::MonitorEnter => {
				let object = stack.pop().ok_or_else(|| self.underflow())?;
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::MonitorEnter, void, &[object]);
			}
			I::MonitorExit => {
				let object = stack.pop().ok_or_else(|| self.underflow())?;
				let void = self.ctx.void_type();
				self.ctx.append_instruction(block, Opcode::MonitorExit, void, &[object]);
			}
		}
		Ok(())
	}

	fn underflow(&self) -> anyhow::Error {
		anyhow!("{}: operand stack underflow", self.method_name)
	}

	fn push_i32(&mut self, stack: &mut Vec<ValueId>, v: i32) {
		stack.push(self.ctx.constant_int(v as i64, IntWidth::W32));
	}

	fn ty_of(&mut self, ty: LocalTy) -> TypeId {
		match ty {
			LocalTy::Int(width) => self.ctx.int_type(width),
			LocalTy::Float => self.ctx.float_type(),
			LocalTy::Double => self.ctx.double_type(),
			LocalTy::Any => self.ctx.any_type(),
		}
	}

	fn load_local(&mut self, block: BlockId, stack: &mut Vec<ValueId>, lv: &LvIndex, ty: LocalTy) {
		let ty = self.ty_of(ty);
		let local = self.local_for(lv.index, ty);
		let inst = self.ctx.append_instruction(block, Opcode::Load, ty, &[ValueId::from(local)]);
		stack.push(ValueId::from(inst));
	}

	fn store_local(&mut self, block: BlockId, stack: &mut Vec<ValueId>, lv: &LvIndex, ty: LocalTy) -> Result<()> {
		let ty = self.ty_of(ty);
		let local = self.local_for(lv.index, ty);
		let value = stack.pop().ok_or_else(|| self.underflow())?;
		let void = self.ctx.void_type();
		self.ctx.append_instruction(block, Opcode::Store, void, &[ValueId::from(local), value]);
		Ok(())
	}

	fn load_array(&mut self, block: BlockId, stack: &mut Vec<ValueId>, element_ty: TypeId) -> Result<()> {
		let index = stack.pop().ok_or_else(|| self.underflow())?;
		let array = stack.pop().ok_or_else(|| self.underflow())?;
		let inst = self.ctx.append_instruction(block, Opcode::LoadArray, element_ty, &[array, index]);
		stack.push(ValueId::from(inst));
		Ok(())
	}

	fn store_array(&mut self, block: BlockId, stack: &mut Vec<ValueId>) -> Result<()> {
		let value = stack.pop().ok_or_else(|| self.underflow())?;
		let index = stack.pop().ok_or_else(|| self.underflow())?;
		let array = stack.pop().ok_or_else(|| self.underflow())?;
		let void = self.ctx.void_type();
		self.ctx.append_instruction(block, Opcode::StoreArray, void, &[array, index, value]);
		Ok(())
	}

	fn dup2_x2(&mut self, stack: &mut Vec<ValueId>) -> Result<()> {
		let top_cat2 = self.cat2(*stack.last().ok_or_else(|| self.underflow())?);
		let group_size = if top_cat2 { 1 } else { 2 };
		if stack.len() < group_size {
			return Err(self.underflow());
		}
		let split_at = stack.len() - group_size;
		let group: Vec<ValueId> = stack.split_off(split_at);
		let under_cat2 = self.cat2(*stack.last().ok_or_else(|| self.underflow())?);
		let skip_size = if under_cat2 { 1 } else { 2 };
		if stack.len() < skip_size {
			return Err(self.underflow());
		}
		let insert_at = stack.len() - skip_size;
		for (offset, &value) in group.iter().enumerate() {
			stack.insert(insert_at + offset, value);
		}
		stack.extend_from_slice(&group);
		Ok(())
	}

	fn binary(&mut self, block: BlockId, stack: &mut Vec<ValueId>, op: BinOp, ty: LocalTy) -> Result<()> {
		let ty = self.ty_of(ty);
		let rhs = stack.pop().ok_or_else(|| self.underflow())?;
		let lhs = stack.pop().ok_or_else(|| self.underflow())?;
		let inst = self.ctx.append_instruction(block, Opcode::Binary(op), ty, &[lhs, rhs]);
		stack.push(ValueId::from(inst));
		Ok(())
	}

	fn negate(&mut self, block: BlockId, stack: &mut Vec<ValueId>, ty: LocalTy) -> Result<()> {
		let ty = self.ty_of(ty);
		let value = stack.pop().ok_or_else(|| self.underflow())?;
		let inst = self.ctx.append_instruction(block, Opcode::Negate, ty, &[value]);
		stack.push(ValueId::from(inst));
		Ok(())
	}

	fn convert(&mut self, block: BlockId, stack: &mut Vec<ValueId>, ty: LocalTy) -> Result<()> {
		let ty = self.ty_of(ty);
		let value = stack.pop().ok_or_else(|| self.underflow())?;
		let inst = self.ctx.append_instruction(block, Opcode::Cast(ty), ty, &[value]);
		stack.push(ValueId::from(inst));
		Ok(())
	}

	fn java_compare(&mut self, block: BlockId, stack: &mut Vec<ValueId>, greater_on_nan: bool) -> Result<()> {
		let rhs = stack.pop().ok_or_else(|| self.underflow())?;
		let lhs = stack.pop().ok_or_else(|| self.underflow())?;
		let int32 = self.ctx.int_type(IntWidth::W32);
		let inst = self
			.ctx
			.append_instruction(block, Opcode::JavaCompare(JavaCompareKind { greater_on_nan }), int32, &[lhs, rhs]);
		stack.push(ValueId::from(inst));
		Ok(())
	}

	fn cond_branch_zero(&mut self, block: BlockId, stack: &mut Vec<ValueId>, op: CmpOp, target: Label, index: usize) -> Result<()> {
		let value = stack.pop().ok_or_else(|| self.underflow())?;
		let zero = self.ctx.constant_int(0, IntWidth::W32);
		self.cond_branch(block, stack, op, value, zero, target, index)
	}

	fn cond_branch_pair(&mut self, block: BlockId, stack: &mut Vec<ValueId>, op: CmpOp, target: Label, index: usize) -> Result<()> {
		let rhs = stack.pop().ok_or_else(|| self.underflow())?;
		let lhs = stack.pop().ok_or_else(|| self.underflow())?;
		self.cond_branch(block, stack, op, lhs, rhs, target, index)
	}

	fn cond_branch_null(&mut self, block: BlockId, stack: &mut Vec<ValueId>, op: CmpOp, target: Label, index: usize) -> Result<()> {
		let value = stack.pop().ok_or_else(|| self.underflow())?;
		let any = self.ctx.any_type();
		let null = self.ctx.constant_null(any);
		self.cond_branch(block, stack, op, value, null, target, index)
	}

	fn cond_branch(
		&mut self,
		block: BlockId,
		stack: &mut Vec<ValueId>,
		op: CmpOp,
		lhs: ValueId,
		rhs: ValueId,
		target: Label,
		index: usize,
	) -> Result<()> {
		let bool_ty = self.ctx.int_type(IntWidth::W1);
		let cond = self.ctx.append_instruction(block, Opcode::Compare(op), bool_ty, &[lhs, rhs]);
		let fallthrough = self.next_label(index)?;
		let true_block = self.materialize(block, stack, target, true)?;
		let false_block = self.materialize(block, stack, fallthrough, true)?;
		let label_ty = self.ctx.label_type();
		self.ctx.append_instruction(
			block,
			Opcode::BranchConditional,
			label_ty,
			&[ValueId::from(cond), ValueId::from(true_block), ValueId::from(false_block)],
		);
		Ok(())
	}

	fn lower_code_array_type(&mut self, ty: CodeArrayType) -> TypeId {
		match ty {
			CodeArrayType::Boolean => self.ctx.int_type(IntWidth::W1),
			CodeArrayType::Char => self.ctx.int_type(IntWidth::W16),
			CodeArrayType::Float => self.ctx.float_type(),
			CodeArrayType::Double => self.ctx.double_type(),
			CodeArrayType::Byte => self.ctx.int_type(IntWidth::W8),
			CodeArrayType::Short => self.ctx.int_type(IntWidth::W16),
			CodeArrayType::Int => self.ctx.int_type(IntWidth::W32),
			CodeArrayType::Long => self.ctx.int_type(IntWidth::W64),
		}
	}

	fn lower_loadable(&mut self, loadable: &Loadable) -> Result<ValueId> {
		Ok(match loadable {
			Loadable::Integer(v) => self.ctx.constant_int(*v as i64, IntWidth::W32),
			Loadable::Float(v) => self.ctx.constant_float(*v),
			Loadable::Long(v) => self.ctx.constant_int(*v, IntWidth::W64),
			Loadable::Double(v) => self.ctx.constant_double(*v),
			Loadable::String(s) => self.ctx.constant_string(&s.to_string()),
			Loadable::Class(class_name) => {
				let ty = self.ctx.reference_type("java/lang/Class");
				let _ = class_name;
				self.ctx.poison_value(ty)
			}
			Loadable::MethodHandle(handle) => {
				warn!("{}: method handle constants are not modeled, using a poison value", self.method_name);
				let ty = self.handle_poison_type(handle);
				self.ctx.poison_value(ty)
			}
			Loadable::MethodType(_) => {
				warn!("{}: MethodType constants are not modeled, using a poison value", self.method_name);
				let ty = self.ctx.reference_type("java/lang/invoke/MethodType");
				self.ctx.poison_value(ty)
			}
			Loadable::Dynamic(constant_dynamic) => {
				warn!("{}: condy constants are not modeled, using a poison value", self.method_name);
				let ty = ftypes::parse_field_type(self.ctx, constant_dynamic.descriptor.as_slice())?;
				self.ctx.poison_value(ty)
			}
		})
	}

	fn handle_poison_type(&mut self, _handle: &Handle) -> TypeId {
		self.ctx.reference_type("java/lang/invoke/MethodHandle")
	}

	fn lower_invoke(
		&mut self,
		block: BlockId,
		stack: &mut Vec<ValueId>,
		method_ref: &MethodRef,
		is_static: bool,
		kind: InvokeKind,
	) -> Result<()> {
		let (params, ret) = ftypes::parse_method_type(self.ctx, method_ref.desc.as_slice())?;
		let class_name = method_ref.class.to_string();
		let class_symbol = self.ctx.ensure_class(&class_name);
		let fn_type = self.ctx.function_type(ret, params.clone());

		let mut full_params = params.clone();
		if !is_static {
			let this_ty = self.ctx.reference_type(&class_name);
			full_params.insert(0, this_ty);
		}
		let function = self.ctx.ensure_method(class_symbol, &method_ref.name.to_string(), fn_type, is_static, &full_params);

		let mut args = Vec::with_capacity(params.len());
		for _ in 0..params.len() {
			args.push(stack.pop().ok_or_else(|| self.underflow())?);
		}
		args.reverse();
		if !is_static {
			let receiver = stack.pop().ok_or_else(|| self.underflow())?;
			args.insert(0, receiver);
		}

		let inst = self.ctx.append_instruction(block, Opcode::Call(function, kind), ret, &args);
		let void = self.ctx.void_type();
		if ret != void {
			stack.push(ValueId::from(inst));
		}
		Ok(())
	}

	/// Attaches every exception table entry's handler as an extra successor of each
	/// already-built leader block whose instruction range overlaps `[start, end)`.
	fn attach_handlers(&mut self) -> Result<()> {
		for exc in self.exception_table.clone() {
			let start = self.index_of[&exc.start];
			let end = self.index_of[&exc.end];
			let catch_ty = match &exc.catch {
				Some(class_name) => self.ctx.reference_type(&class_name.to_string()),
				None => self.ctx.reference_type("java/lang/Throwable"),
			};
			let handler_block = self.block_map[&exc.handler].block;

			for window in 0..self.leaders.len() {
				let leader = self.leaders[window];
				let leader_index = self.index_of[&leader];
				let next_index = self.leaders.get(window + 1).map(|l| self.index_of[l]).unwrap_or(self.entries.len());
				let overlaps = leader_index < end && next_index > start;
				if overlaps && self.block_map[&leader].visited {
					let block = self.block_map[&leader].block;
					self.ctx.append_handler(block, catch_ty, handler_block);
				}
			}
		}
		Ok(())
	}
}

#[derive(Debug, Copy, Clone)]
enum LocalTy {
	Int(IntWidth),
	Float,
	Double,
	Any,
}

impl From<IntWidth> for LocalTy {
	fn from(width: IntWidth) -> Self {
		LocalTy::Int(width)
	}
}

/// Collects every instruction-level leader: the method entry, every branch/switch target, and
/// the instruction right after any terminator (including the conditional branches, whose
/// fallthrough edge is always lowered as an explicit synthesized branch, see [`Lowerer::process_block`]).
fn discover_leaders(method_name: &str, entries: &[InstructionListEntry]) -> Result<HashSet<Label>> {
	let mut leaders = HashSet::new();
	let first = entries.first().expect("checked non-empty by caller");
	leaders.insert(first.label.ok_or_else(|| anyhow!("{method_name}: instruction has no label"))?);

	for (i, entry) in entries.iter().enumerate() {
		let mut targets: Vec<Label> = Vec::new();
		let is_terminator = match &entry.instruction {
			Instruction::IfEq(l)
			| Instruction::IfNe(l)
			| Instruction::IfLt(l)
			| Instruction::IfGe(l)
			| Instruction::IfGt(l)
			| Instruction::IfLe(l)
			| Instruction::IfICmpEq(l)
			| Instruction::IfICmpNe(l)
			| Instruction::IfICmpLt(l)
			| Instruction::IfICmpGe(l)
			| Instruction::IfICmpGt(l)
			| Instruction::IfICmpLe(l)
			| Instruction::IfACmpEq(l)
			| Instruction::IfACmpNe(l)
			| Instruction::IfNull(l)
			| Instruction::IfNonNull(l) => {
				targets.push(*l);
				true
			}
			Instruction::Goto(l) | Instruction::Jsr(l) => {
				targets.push(*l);
				true
			}
			Instruction::Ret(_) => true,
			Instruction::TableSwitch { default, table, .. } => {
				targets.push(*default);
				targets.extend(table.iter().copied());
				true
			}
			Instruction::LookupSwitch { default, pairs } => {
				targets.push(*default);
				targets.extend(pairs.iter().map(|(_, l)| *l));
				true
			}
			Instruction::IReturn
			| Instruction::LReturn
			| Instruction::FReturn
			| Instruction::DReturn
			| Instruction::AReturn
			| Instruction::Return
			| Instruction::AThrow => true,
			_ => false,
		};

		leaders.extend(targets);
		if is_terminator {
			if let Some(next) = entries.get(i + 1) {
				leaders.insert(next.label.ok_or_else(|| anyhow!("{method_name}: instruction has no label"))?);
			}
		}
	}
	Ok(leaders)
}
