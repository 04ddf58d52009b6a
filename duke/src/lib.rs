//! Typed in-memory model of a [Java Class File](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html),
//! a reader that turns the on-disk byte stream into that tree, and the visitor protocol used to
//! walk it.
//!
//! [`read::read_class_file`] parses raw `.class` bytes into a [`tree::class::ClassFile`]. A
//! [`Code`][tree::method::code::Code] attribute holds a `Vec` of typed
//! [`Instruction`][tree::method::code::Instruction]s, not raw bytecode: all of the decoding from
//! opcodes and operands into that list happens during reading, not later.

pub mod tree;
pub mod visitor;
pub mod read;
mod jstring;
mod class_constants;

mod macros;

use std::fmt::Debug;
use anyhow::{bail, Result};

pub(crate) trait OptionExpansion<T> {
	fn insert_if_empty(&mut self, value: T) -> Result<()>;
}
impl<T> OptionExpansion<T> for Option<T> where T: Debug {
	fn insert_if_empty(&mut self, value: T) -> Result<()> {
		if let Some(old) = self {
			bail!("got {old:?} and {value:?}");
		} else {
			*self = Some(value);
			Ok(())
		}
	}
}
