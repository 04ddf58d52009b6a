//! Hand-rolled error enum for the stack-to-SSA lowering boundary, composing under `anyhow::Error`
//! the same way the rest of the workspace does rather than pulling in a derive-macro error crate.

use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum LoweringError {
	BadMagic { found: u32 },
	UnknownConstantPoolEntry { tag: u8 },
	UnknownOpcode { opcode: u8 },
	UnhandledAttribute { name: String },
	InvalidArrayType { atype: u8 },
	Truncated,
	InconsistentStack { method: String },
	BadDescriptor { descriptor: String },
}

impl Display for LoweringError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			LoweringError::BadMagic { found } => write!(f, "bad magic: 0x{found:08x}"),
			LoweringError::UnknownConstantPoolEntry { tag } => write!(f, "unknown constant pool tag {tag}"),
			LoweringError::UnknownOpcode { opcode } => write!(f, "unknown opcode 0x{opcode:02x}"),
			LoweringError::UnhandledAttribute { name } => write!(f, "unhandled attribute {name:?}"),
			LoweringError::InvalidArrayType { atype } => write!(f, "invalid newarray atype {atype}"),
			LoweringError::Truncated => write!(f, "truncated class file"),
			LoweringError::InconsistentStack { method } => {
				write!(f, "inconsistent stack shape at a join in {method}")
			}
			LoweringError::BadDescriptor { descriptor } => write!(f, "bad descriptor {descriptor:?}"),
		}
	}
}

impl std::error::Error for LoweringError {}
