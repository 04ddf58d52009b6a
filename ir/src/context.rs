//! The arena that owns every interned type, every value and every use edge between them.
//!
//! Rather than chase cyclic `Rc`/`Weak` pairs for a graph that is cyclic by construction (blocks
//! reference instructions that reference blocks), every cross-reference in this crate is a plain
//! index into one of [`Context`]'s arenas. A [`Context`] has module lifetime: nothing it hands out
//! outlives it, and nothing inside it is shared across threads.

use indexmap::{IndexMap, IndexSet};
use crate::class::Class;
use crate::instr::Opcode;
use crate::types::{IntWidth, Symbol, Type, TypeData, TypeId};
use crate::value::{
	ArgumentData, ArgumentId, BlockData, BlockId, FieldData, FieldId, FunctionData, FunctionId,
	InstId, InstructionData, LocalData, LocalId, UseId, UseNode, ValueData, ValueId, ValueKind,
};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum ConstKey {
	Int(i64, TypeId),
	Float(u32),
	Double(u64),
	Str(Symbol),
	Null(TypeId),
	Poison(TypeId),
}

#[derive(Default)]
pub struct Context {
	types: IndexSet<TypeData>,
	symbols: IndexSet<String>,
	values: Vec<ValueData>,
	uses: Vec<UseNode>,
	constants: IndexMap<ConstKey, ValueId>,
	classes: IndexMap<Symbol, Class>,
}

impl Context {
	pub fn new() -> Context {
		Context::default()
	}

	// --- symbols -----------------------------------------------------------------------------

	pub fn symbol(&mut self, name: &str) -> Symbol {
		let (index, _) = self.symbols.insert_full(name.to_owned());
		Symbol(index as u32)
	}

	pub fn symbol_str(&self, symbol: Symbol) -> &str {
		self.symbols.get_index(symbol.0 as usize).expect("symbol from a different context")
	}

	// --- types ---------------------------------------------------------------------------------

	fn intern_type(&mut self, data: TypeData) -> TypeId {
		let (index, _) = self.types.insert_full(data);
		TypeId(index as u32)
	}

	pub fn any_type(&mut self) -> TypeId { self.intern_type(TypeData::Any) }
	pub fn label_type(&mut self) -> TypeId { self.intern_type(TypeData::Label) }
	pub fn void_type(&mut self) -> TypeId { self.intern_type(TypeData::Void) }
	pub fn float_type(&mut self) -> TypeId { self.intern_type(TypeData::Float) }
	pub fn double_type(&mut self) -> TypeId { self.intern_type(TypeData::Double) }

	pub fn int_type(&mut self, width: IntWidth) -> TypeId {
		self.intern_type(TypeData::Integer(width))
	}

	pub fn reference_type(&mut self, class_name: &str) -> TypeId {
		let symbol = self.symbol(class_name);
		self.intern_type(TypeData::Reference(symbol))
	}

	pub fn array_type(&mut self, element: TypeId) -> TypeId {
		self.intern_type(TypeData::Array(element))
	}

	pub fn function_type(&mut self, ret: TypeId, params: Vec<TypeId>) -> TypeId {
		self.intern_type(TypeData::Function(ret, params))
	}

	pub fn type_data(&self, id: TypeId) -> Type<'_> {
		match self.types.get_index(id.0 as usize).expect("type from a different context") {
			TypeData::Any => Type::Any,
			TypeData::Label => Type::Label,
			TypeData::Void => Type::Void,
			TypeData::Float => Type::Float,
			TypeData::Double => Type::Double,
			TypeData::Integer(w) => Type::Integer(*w),
			TypeData::Reference(s) => Type::Reference(self.symbol_str(*s)),
			TypeData::Array(e) => Type::Array(*e),
			TypeData::Function(r, p) => Type::Function(*r, p),
		}
	}

	// --- constants -----------------------------------------------------------------------------

	fn intern_constant(&mut self, key: ConstKey, kind: ValueKind, ty: TypeId) -> ValueId {
		if let Some(&id) = self.constants.get(&key) {
			return id;
		}
		let id = self.alloc_value(kind, ty);
		self.constants.insert(key, id);
		id
	}

	pub fn constant_int(&mut self, value: i64, width: IntWidth) -> ValueId {
		let ty = self.int_type(width);
		self.intern_constant(ConstKey::Int(value, ty), ValueKind::ConstantInt(value), ty)
	}

	pub fn constant_float(&mut self, value: f32) -> ValueId {
		let ty = self.float_type();
		self.intern_constant(ConstKey::Float(value.to_bits()), ValueKind::ConstantFloat(value), ty)
	}

	pub fn constant_double(&mut self, value: f64) -> ValueId {
		let ty = self.double_type();
		self.intern_constant(ConstKey::Double(value.to_bits()), ValueKind::ConstantDouble(value), ty)
	}

	pub fn constant_string(&mut self, value: &str) -> ValueId {
		let symbol = self.symbol(value);
		let ty = self.reference_type("java/lang/String");
		self.intern_constant(ConstKey::Str(symbol), ValueKind::ConstantString(value.to_owned()), ty)
	}

	pub fn constant_null(&mut self, ty: TypeId) -> ValueId {
		self.intern_constant(ConstKey::Null(ty), ValueKind::ConstantNull, ty)
	}

	pub fn poison_value(&mut self, ty: TypeId) -> ValueId {
		self.intern_constant(ConstKey::Poison(ty), ValueKind::Poison, ty)
	}

	// --- value / use graph -----------------------------------------------------------------------

	pub(crate) fn alloc_value(&mut self, kind: ValueKind, ty: TypeId) -> ValueId {
		let id = ValueId(self.values.len() as u32);
		self.values.push(ValueData { kind, ty, use_head: None });
		id
	}

	pub fn value_type(&self, id: ValueId) -> TypeId {
		self.values[id.0 as usize].ty
	}

	/// Iterates every use of `value`, in use-list order (insertion-LIFO, not a stable order).
	pub fn uses_of(&self, value: ValueId) -> impl Iterator<Item = ValueId> + '_ {
		let mut cur = self.values[value.0 as usize].use_head;
		std::iter::from_fn(move || {
			let use_id = cur?;
			let node = &self.uses[use_id.0 as usize];
			cur = node.next;
			Some(node.owner)
		})
	}

	pub fn has_uses(&self, value: ValueId) -> bool {
		self.values[value.0 as usize].use_head.is_some()
	}

	/// Allocates a new use edge owned by `owner`, initially pointing at `value` (or dangling if
	/// `None`).
	fn new_use(&mut self, owner: ValueId, value: Option<ValueId>) -> UseId {
		let id = UseId(self.uses.len() as u32);
		self.uses.push(UseNode { owner, value: None, prev: None, next: None });
		if let Some(value) = value {
			self.set_use_value(id, Some(value));
		}
		id
	}

	fn detach_use(&mut self, use_id: UseId) {
		let node = &self.uses[use_id.0 as usize];
		let (prev, next, value) = (node.prev, node.next, node.value);
		let Some(value) = value else { return };

		match prev {
			Some(prev) => self.uses[prev.0 as usize].next = next,
			None => self.values[value.0 as usize].use_head = next,
		}
		if let Some(next) = next {
			self.uses[next.0 as usize].prev = prev;
		}

		let node = &mut self.uses[use_id.0 as usize];
		node.prev = None;
		node.next = None;
		node.value = None;
	}

	/// Rewrites a single use edge to point at `new_value` (or detaches it entirely, for `None`).
	pub(crate) fn set_use_value(&mut self, use_id: UseId, new_value: Option<ValueId>) {
		if self.uses[use_id.0 as usize].value == new_value {
			return;
		}
		self.detach_use(use_id);
		let owner = self.uses[use_id.0 as usize].owner;
		if let Some(new_value) = new_value {
			let old_head = self.values[new_value.0 as usize].use_head;
			self.uses[use_id.0 as usize] = UseNode {
				owner,
				value: Some(new_value),
				prev: None,
				next: old_head,
			};
			if let Some(old_head) = old_head {
				self.uses[old_head.0 as usize].prev = Some(use_id);
			}
			self.values[new_value.0 as usize].use_head = Some(use_id);
		}
	}

	/// Rewrites every use of `old` to point at `new` instead. After this call `old` has no uses.
	/// A no-op when `old == new`.
	pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) {
		if old == new {
			return;
		}
		while let Some(use_id) = self.values[old.0 as usize].use_head {
			self.set_use_value(use_id, Some(new));
		}
	}

	// --- functions / arguments / locals ------------------------------------------------------

	pub fn create_function(&mut self, name: &str, fn_type: TypeId, is_static: bool, param_types: &[TypeId]) -> FunctionId {
		let id = FunctionId(self.alloc_value(
			ValueKind::Function(FunctionData {
				name: name.to_owned(),
				is_static,
				arguments: Vec::new(),
				locals: Vec::new(),
				blocks: Vec::new(),
			}),
			fn_type,
		));

		for (index, &ty) in param_types.iter().enumerate() {
			let arg_id = ArgumentId(self.alloc_value(ValueKind::Argument(ArgumentData { owner: id, index: index as u32 }), ty));
			self.function_mut(id).arguments.push(arg_id);
		}

		id
	}

	fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Function(data) => data,
			_ => unreachable!("FunctionId pointing at a non-function value"),
		}
	}

	pub fn function_name(&self, id: FunctionId) -> &str {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Function(data) => &data.name,
			_ => unreachable!(),
		}
	}

	pub fn function_arguments(&self, id: FunctionId) -> &[ArgumentId] {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Function(data) => &data.arguments,
			_ => unreachable!(),
		}
	}

	pub fn function_blocks(&self, id: FunctionId) -> &[BlockId] {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Function(data) => &data.blocks,
			_ => unreachable!(),
		}
	}

	pub fn function_locals(&self, id: FunctionId) -> &[LocalId] {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Function(data) => &data.locals,
			_ => unreachable!(),
		}
	}

	pub fn entry_block(&self, function: FunctionId) -> BlockId {
		*self.function_blocks(function).first().expect("function with no blocks")
	}

	pub fn append_block(&mut self, function: FunctionId, name: &str) -> BlockId {
		let label = self.label_type();
		let id = BlockId(self.alloc_value(
			ValueKind::Block(BlockData { owner: Some(function), name: name.to_owned(), instructions: Vec::new(), handlers: Vec::new() }),
			label,
		));
		self.function_mut(function).blocks.push(id);
		id
	}

	pub fn append_local(&mut self, function: FunctionId, ty: TypeId, name: &str) -> LocalId {
		let id = LocalId(self.alloc_value(ValueKind::Local(LocalData { owner: function, name: name.to_owned() }), ty));
		self.function_mut(function).locals.push(id);
		id
	}

	pub fn local_name(&self, id: LocalId) -> &str {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Local(data) => &data.name,
			_ => unreachable!(),
		}
	}

	pub fn remove_local(&mut self, function: FunctionId, local: LocalId) {
		assert!(!self.has_uses(ValueId::from(local)), "removing a local that still has uses");
		self.function_mut(function).locals.retain(|&l| l != local);
	}

	// --- blocks --------------------------------------------------------------------------------

	fn block_mut(&mut self, id: BlockId) -> &mut BlockData {
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Block(data) => data,
			_ => unreachable!("BlockId pointing at a non-block value"),
		}
	}

	pub fn block_name(&self, id: BlockId) -> &str {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Block(data) => &data.name,
			_ => unreachable!(),
		}
	}

	pub fn block_instructions(&self, id: BlockId) -> &[InstId] {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Block(data) => &data.instructions,
			_ => unreachable!(),
		}
	}

	pub fn block_handlers(&self, id: BlockId) -> &[InstId] {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Block(data) => &data.handlers,
			_ => unreachable!(),
		}
	}

	pub fn block_owner(&self, id: BlockId) -> Option<FunctionId> {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Block(data) => data.owner,
			_ => unreachable!(),
		}
	}

	pub fn block_terminator(&self, id: BlockId) -> Option<InstId> {
		self.block_instructions(id).last().copied()
	}

	pub fn has_terminator(&self, id: BlockId) -> bool {
		self.block_terminator(id).is_some_and(|inst| self.instruction_opcode(inst).is_terminator())
	}

	pub fn remove_block(&mut self, function: FunctionId, block: BlockId) {
		assert!(!self.has_uses(ValueId::from(block)), "removing a block that still has uses");
		self.function_mut(function).blocks.retain(|&b| b != block);
	}

	// --- instructions ----------------------------------------------------------------------------

	fn instruction_data(&self, id: InstId) -> &InstructionData {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data,
			_ => unreachable!("InstId pointing at a non-instruction value"),
		}
	}

	pub fn instruction_opcode(&self, id: InstId) -> &Opcode {
		&self.instruction_data(id).opcode
	}

	pub fn instruction_parent(&self, id: InstId) -> Option<BlockId> {
		self.instruction_data(id).parent
	}

	pub fn instruction_operands(&self, id: InstId) -> Vec<ValueId> {
		let data = self.instruction_data(id);
		data.operands.iter().map(|&u| self.uses[u.0 as usize].value.expect("dangling operand use")).collect()
	}

	pub fn instruction_operand(&self, id: InstId, slot: usize) -> ValueId {
		let data = self.instruction_data(id);
		let use_id = data.operands[slot];
		self.uses[use_id.0 as usize].value.expect("dangling operand use")
	}

	pub fn set_instruction_operand(&mut self, id: InstId, slot: usize, value: ValueId) {
		let use_id = self.instruction_data(id).operands[slot];
		self.set_use_value(use_id, Some(value));
	}

	fn build_instruction(&mut self, opcode: Opcode, ty: TypeId, operand_values: &[ValueId]) -> InstId {
		let id = InstId(self.alloc_value(ValueKind::Instruction(InstructionData { parent: None, opcode, operands: Vec::new() }), ty));
		let operands: Vec<UseId> = operand_values.iter().map(|&v| self.new_use(ValueId::from(id), Some(v))).collect();
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data.operands = operands,
			_ => unreachable!(),
		}
		id
	}

	/// Appends a new instruction to the end of `block`'s instruction list.
	pub fn append_instruction(&mut self, block: BlockId, opcode: Opcode, ty: TypeId, operand_values: &[ValueId]) -> InstId {
		let id = self.build_instruction(opcode, ty, operand_values);
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data.parent = Some(block),
			_ => unreachable!(),
		}
		self.block_mut(block).instructions.push(id);
		id
	}

	/// Inserts a new instruction at the front of `block`'s instruction list. Used by local
	/// promotion to insert phis ahead of any code that might observe them.
	pub fn prepend_instruction(&mut self, block: BlockId, opcode: Opcode, ty: TypeId, operand_values: &[ValueId]) -> InstId {
		let id = self.build_instruction(opcode, ty, operand_values);
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data.parent = Some(block),
			_ => unreachable!(),
		}
		self.block_mut(block).instructions.insert(0, id);
		id
	}

	/// Appends an exception handler pseudo-instruction to `block`'s handler list, adding an
	/// implicit extra successor.
	pub fn append_handler(&mut self, block: BlockId, catch_type: TypeId, target: BlockId) -> InstId {
		let id = self.build_instruction(Opcode::ExceptionHandler(catch_type), catch_type, &[ValueId::from(target)]);
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data.parent = Some(block),
			_ => unreachable!(),
		}
		self.block_mut(block).handlers.push(id);
		id
	}

	/// Appends a new, empty operand slot to an existing instruction (used to grow a `Phi` as
	/// predecessors are discovered).
	pub fn push_instruction_operand(&mut self, id: InstId, value: ValueId) {
		let use_id = self.new_use(ValueId::from(id), Some(value));
		match &mut self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data.operands.push(use_id),
			_ => unreachable!(),
		}
	}

	/// Removes an instruction from its parent block and detaches all of its operand uses.
	/// Requires that the instruction itself has no remaining uses (RAUW it away first).
	pub fn remove_instruction(&mut self, id: InstId) {
		assert!(!self.has_uses(ValueId::from(id)), "removing an instruction that still has uses");

		let operands = match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Instruction(data) => data.operands.clone(),
			_ => unreachable!(),
		};
		for use_id in operands {
			self.detach_use(use_id);
		}

		if let Some(parent) = self.instruction_parent(id) {
			let block = self.block_mut(parent);
			block.instructions.retain(|&i| i != id);
			block.handlers.retain(|&i| i != id);
		}
	}

	// --- classes / fields ----------------------------------------------------------------------

	pub fn ensure_class(&mut self, name: &str) -> Symbol {
		let symbol = self.symbol(name);
		self.classes.entry(symbol).or_insert_with(|| Class::new(symbol));
		symbol
	}

	pub fn class(&self, name: Symbol) -> Option<&Class> {
		self.classes.get(&name)
	}

	pub fn ensure_field(&mut self, class: Symbol, name: &str, ty: TypeId, is_static: bool) -> FieldId {
		if let Some(existing) = self.classes[&class].fields.get(name) {
			return *existing;
		}
		let id = FieldId(self.alloc_value(ValueKind::Field(FieldData { owner_class: class, name: name.to_owned(), is_static }), ty));
		self.classes.get_mut(&class).expect("ensure_class called first").fields.insert(name.to_owned(), id);
		id
	}

	pub fn ensure_method(&mut self, class: Symbol, name: &str, fn_type: TypeId, is_static: bool, param_types: &[TypeId]) -> FunctionId {
		let key = (name.to_owned(), fn_type);
		if let Some(existing) = self.classes[&class].methods.get(&key) {
			return *existing;
		}
		let qualified = format!("{}.{name}", self.symbol_str(class));
		let id = self.create_function(&qualified, fn_type, is_static, param_types);
		self.classes.get_mut(&class).expect("ensure_class called first").methods.insert(key, id);
		id
	}

	pub fn field_name(&self, id: FieldId) -> &str {
		match &self.values[ValueId::from(id).0 as usize].kind {
			ValueKind::Field(data) => &data.name,
			_ => unreachable!(),
		}
	}
}
