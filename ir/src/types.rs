//! The type universe: every [`Type`] an IR value can carry, interned per [`crate::Context`].

use std::fmt;

/// A handle to an interned [`Type`]. Two handles compare equal iff the types they name are
/// structurally equal; [`crate::Context`] guarantees this by deduplicating on construction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeId(pub(crate) u32);

/// A handle to an interned name (class name, field name, method name, ...).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Symbol(pub(crate) u32);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) enum TypeData {
	Any,
	Label,
	Void,
	Float,
	Double,
	Integer(IntWidth),
	Reference(Symbol),
	Array(TypeId),
	Function(TypeId, Vec<TypeId>),
}

/// Bit width of an [`Type::Integer`], JVM-style: `boolean` is represented as width 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum IntWidth {
	W1,
	W8,
	W16,
	W32,
	W64,
}

impl fmt::Display for IntWidth {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bits = match self {
			IntWidth::W1 => 1,
			IntWidth::W8 => 8,
			IntWidth::W16 => 16,
			IntWidth::W32 => 32,
			IntWidth::W64 => 64,
		};
		write!(f, "i{bits}")
	}
}

/// A resolved view of [`TypeId`], returned by [`crate::Context::type_data`].
///
/// Unlike [`TypeData`] this borrows from the context rather than owning a `Vec`/`Symbol`, so it's
/// cheap to construct on every lookup.
#[derive(Debug, Clone)]
pub enum Type<'ctx> {
	Any,
	Label,
	Void,
	Float,
	Double,
	Integer(IntWidth),
	Reference(&'ctx str),
	Array(TypeId),
	Function(TypeId, &'ctx [TypeId]),
}

impl Type<'_> {
	pub fn is_category_two(&self) -> bool {
		matches!(self, Type::Integer(IntWidth::W64) | Type::Double)
	}
}
