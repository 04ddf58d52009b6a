//! The instruction opcode set: every [`crate::Value`] of kind [`Instruction`](crate::ValueKind)
//! carries one of these, plus its operand array (threaded separately as [`crate::Use`]s so RAUW
//! works uniformly for every operand).

use crate::types::TypeId;
use crate::value::{FieldId, FunctionId};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BinOp {
	Add, Sub, Mul, Div, Rem, Shl, Shr, UShr, And, Or, Xor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CmpOp {
	Eq, Ne, Lt, Gt, Le, Ge,
}

/// `lcmp`/`fcmpl`/`fcmpg`/`dcmpl`/`dcmpg`: produces `-1`/`0`/`1`, with the NaN case decided by
/// `greater_on_nan`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct JavaCompareKind {
	pub greater_on_nan: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InvokeKind {
	Virtual,
	Special,
	Static,
	Interface,
}

/// An instruction's fixed-shape payload. The variable-length operand list (arguments, phi
/// incoming values, switch case targets, ...) lives alongside this in [`crate::value::InstructionData::operands`];
/// this enum only carries what can't be expressed as "one more operand".
#[derive(Debug, Clone)]
pub enum Opcode {
	Binary(BinOp),
	Negate,
	Compare(CmpOp),
	JavaCompare(JavaCompareKind),

	/// operands: `[pointer]`
	Load,
	/// operands: `[pointer, value]`
	Store,
	/// operands: `[array, index]`
	LoadArray,
	/// operands: `[array, index, value]`
	StoreArray,
	/// operands: `[object]`
	LoadField(FieldId),
	/// operands: `[object, value]`
	StoreField(FieldId),
	/// operands: `[]`. A static field has no receiver to load through.
	LoadStaticField(FieldId),
	/// operands: `[value]`
	StoreStaticField(FieldId),
	/// operands: `[array]`
	ArrayLength,

	/// operands: `[]`
	New(TypeId),
	/// operands: `[dim0, dim1, ...]`
	NewArray(TypeId),
	/// operands: `[value]`
	Cast(TypeId),
	/// operands: `[value]`
	InstanceOf(TypeId),
	/// operands: `[object]`
	MonitorEnter,
	/// operands: `[object]`
	MonitorExit,

	/// operands: `[target]`
	BranchUnconditional,
	/// operands: `[condition, true_target, false_target]`
	BranchConditional,
	/// operands: `[value, default_target, case_target*]`, one `case_target` per entry of
	/// `cases`, in the same order.
	Switch { cases: Vec<i32> },
	/// operands: `[value]` or `[]` for a `void` return.
	Return,
	/// operands: `[value]`
	Throw,

	/// operands: one per predecessor, same order as [`crate::cfg::predecessors`].
	Phi,
	/// operands: `[]`. Produces the in-flight exception's reference inside a handler block.
	Catch(TypeId),
	/// operands: `[target]`. Lives in a block's `handler_list`, not its instruction list.
	ExceptionHandler(TypeId),

	/// operands: `[receiver?, arg0, arg1, ...]` (no receiver for `Static`).
	Call(FunctionId, InvokeKind),
}

impl Opcode {
	pub fn is_terminator(&self) -> bool {
		matches!(self,
			Opcode::BranchUnconditional
			| Opcode::BranchConditional
			| Opcode::Switch { .. }
			| Opcode::Return
			| Opcode::Throw)
	}

	/// Number of *explicit* successors a terminator carries (handlers are additional, tracked on
	/// the block itself).
	pub fn successor_count(&self) -> usize {
		match self {
			Opcode::BranchUnconditional => 1,
			Opcode::BranchConditional => 2,
			Opcode::Switch { cases } => 1 + cases.len(),
			Opcode::Return | Opcode::Throw => 0,
			_ => 0,
		}
	}
}
