//! A [`Class`] owns the fields and methods declared on one Java class, keyed the way the JVM
//! itself distinguishes them: fields by name alone, methods by `(name, descriptor)` so overloads
//! don't collide.

use indexmap::IndexMap;
use crate::types::{Symbol, TypeId};
use crate::value::{FieldId, FunctionId};

#[derive(Debug)]
pub struct Class {
	pub name: Symbol,
	pub(crate) fields: IndexMap<String, FieldId>,
	pub(crate) methods: IndexMap<(String, TypeId), FunctionId>,
}

impl Class {
	pub(crate) fn new(name: Symbol) -> Class {
		Class { name, fields: IndexMap::new(), methods: IndexMap::new() }
	}

	pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
		self.fields.values().copied()
	}

	pub fn methods(&self) -> impl Iterator<Item = FunctionId> + '_ {
		self.methods.values().copied()
	}
}
