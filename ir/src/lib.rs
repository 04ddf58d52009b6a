//! The SSA intermediate representation: interned types, a value/use graph with RAUW semantics,
//! and the function/class/block/instruction entities built on top of it.
//!
//! Everything that would be a cyclic owned pointer in a naively-translated OO design (a block
//! owns instructions that reference blocks, a function owns locals that instructions load from)
//! is instead a plain arena index into [`Context`]: see that module's docs.

pub mod cfg;
pub mod class;
pub mod context;
pub mod dominance;
pub mod instr;
pub mod types;
pub mod value;

pub use context::Context;
pub use value::{ArgumentId, BlockId, FieldId, FunctionId, InstId, LocalId, ValueId};
