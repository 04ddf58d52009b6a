//! The constant pool: raw tagged entries as they appear on disk, plus a resolver that turns pool
//! indices into duke's typed tree values on demand.
//!
//! Long and Double entries are stored as [`CpEntry::Long`]/[`CpEntry::Double`] at their own index
//! and leave the following index as [`CpEntry::Unusable`], per JVMS 4.4.5: "In retrospect, making
//! 8-byte constants take two constant pool entries was a poor choice."

use anyhow::{anyhow, bail, Context, Result};
use java_string::JavaString;
use crate::jstring::from_vec_to_string;
use crate::tree::class::{ClassName, ObjClassName};
use crate::tree::field::{FieldDescriptor, FieldName, FieldRef};
use crate::tree::method::{MethodDescriptor, MethodName, MethodRef, MethodRefObj};
use crate::tree::method::code::{ConstantDynamic, Handle};
use crate::read::cursor::Cursor;

mod tags {
	pub(super) const UTF8: u8 = 1;
	pub(super) const INTEGER: u8 = 3;
	pub(super) const FLOAT: u8 = 4;
	pub(super) const LONG: u8 = 5;
	pub(super) const DOUBLE: u8 = 6;
	pub(super) const CLASS: u8 = 7;
	pub(super) const STRING: u8 = 8;
	pub(super) const FIELDREF: u8 = 9;
	pub(super) const METHODREF: u8 = 10;
	pub(super) const INTERFACE_METHODREF: u8 = 11;
	pub(super) const NAME_AND_TYPE: u8 = 12;
	pub(super) const METHOD_HANDLE: u8 = 15;
	pub(super) const METHOD_TYPE: u8 = 16;
	pub(super) const DYNAMIC: u8 = 17;
	pub(super) const INVOKE_DYNAMIC: u8 = 18;
	pub(super) const MODULE: u8 = 19;
	pub(super) const PACKAGE: u8 = 20;
}

#[derive(Debug, Clone)]
pub(crate) enum CpEntry {
	Utf8(Vec<u8>),
	Integer(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	Class { name_index: u16 },
	String { string_index: u16 },
	FieldRef { class_index: u16, name_and_type_index: u16 },
	MethodRef { class_index: u16, name_and_type_index: u16 },
	InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
	NameAndType { name_index: u16, descriptor_index: u16 },
	MethodHandle { reference_kind: u8, reference_index: u16 },
	MethodType { descriptor_index: u16 },
	Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	Module { name_index: u16 },
	Package { name_index: u16 },
	/// The second slot of a [`CpEntry::Long`]/[`CpEntry::Double`] entry.
	Unusable,
}

impl CpEntry {
	fn read(cursor: &mut Cursor) -> Result<CpEntry> {
		let tag = cursor.u8()?;
		Ok(match tag {
			tags::UTF8 => {
				let length = cursor.u16()? as usize;
				CpEntry::Utf8(cursor.bytes(length)?.to_vec())
			}
			tags::INTEGER => CpEntry::Integer(cursor.i32()?),
			tags::FLOAT => CpEntry::Float(cursor.f32()?),
			tags::LONG => CpEntry::Long(cursor.i64()?),
			tags::DOUBLE => CpEntry::Double(cursor.f64()?),
			tags::CLASS => CpEntry::Class { name_index: cursor.u16()? },
			tags::STRING => CpEntry::String { string_index: cursor.u16()? },
			tags::FIELDREF => CpEntry::FieldRef { class_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			tags::METHODREF => CpEntry::MethodRef { class_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			tags::INTERFACE_METHODREF => CpEntry::InterfaceMethodRef { class_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			tags::NAME_AND_TYPE => CpEntry::NameAndType { name_index: cursor.u16()?, descriptor_index: cursor.u16()? },
			tags::METHOD_HANDLE => CpEntry::MethodHandle { reference_kind: cursor.u8()?, reference_index: cursor.u16()? },
			tags::METHOD_TYPE => CpEntry::MethodType { descriptor_index: cursor.u16()? },
			tags::DYNAMIC => CpEntry::Dynamic { bootstrap_method_attr_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			tags::INVOKE_DYNAMIC => CpEntry::InvokeDynamic { bootstrap_method_attr_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			tags::MODULE => CpEntry::Module { name_index: cursor.u16()? },
			tags::PACKAGE => CpEntry::Package { name_index: cursor.u16()? },
			other => bail!("unknown constant pool tag {other}"),
		})
	}
}

/// A one-argument `BootstrapMethods` entry reference, resolved lazily by [`ConstantPool::bootstrap_method`].
///
/// Populated from the class's `BootstrapMethods` attribute during the prescan in
/// [`super::ClassReader`], before the real pass that needs to resolve `Dynamic`/`InvokeDynamic`
/// constant pool entries runs.
#[derive(Debug, Clone)]
pub(crate) struct RawBootstrapMethod {
	pub(crate) bootstrap_method_ref: u16,
	pub(crate) arguments: Vec<u16>,
}

pub(crate) struct ConstantPool {
	/// Index 0 is unused, matching the on-disk numbering (valid indices start at 1).
	entries: Vec<CpEntry>,
	pub(crate) bootstrap_methods: Vec<RawBootstrapMethod>,
}

impl ConstantPool {
	pub(crate) fn read(cursor: &mut Cursor) -> Result<ConstantPool> {
		let count = cursor.u16()?;
		let mut entries = Vec::with_capacity(count as usize);
		entries.push(CpEntry::Unusable);
		let mut index = 1u16;
		while index < count {
			let entry = CpEntry::read(cursor)?;
			let takes_two_slots = matches!(entry, CpEntry::Long(_) | CpEntry::Double(_));
			entries.push(entry);
			index += 1;
			if takes_two_slots {
				entries.push(CpEntry::Unusable);
				index += 1;
			}
		}
		Ok(ConstantPool { entries, bootstrap_methods: Vec::new() })
	}

	fn get(&self, index: u16) -> Result<&CpEntry> {
		self.entries.get(index as usize).ok_or_else(|| anyhow!("constant pool index {index} out of bounds"))
	}

	pub(crate) fn utf8_bytes(&self, index: u16) -> Result<&[u8]> {
		match self.get(index)? {
			CpEntry::Utf8(bytes) => Ok(bytes),
			other => bail!("constant pool index {index} is {other:?}, expected Utf8"),
		}
	}

	pub(crate) fn utf8_string(&self, index: u16) -> Result<JavaString> {
		from_vec_to_string(self.utf8_bytes(index)?.to_vec())
			.with_context(|| anyhow!("decoding constant pool entry {index}"))
	}

	pub(crate) fn class_name(&self, index: u16) -> Result<ClassName> {
		match self.get(index)? {
			CpEntry::Class { name_index } => {
				let name = self.utf8_string(*name_index)?;
				ClassName::try_from(name)
			}
			other => bail!("constant pool index {index} is {other:?}, expected Class"),
		}
	}

	pub(crate) fn obj_class_name(&self, index: u16) -> Result<ObjClassName> {
		match self.get(index)? {
			CpEntry::Class { name_index } => {
				let name = self.utf8_string(*name_index)?;
				ObjClassName::try_from(name)
			}
			other => bail!("constant pool index {index} is {other:?}, expected Class"),
		}
	}

	fn name_and_type(&self, index: u16) -> Result<(u16, u16)> {
		match self.get(index)? {
			CpEntry::NameAndType { name_index, descriptor_index } => Ok((*name_index, *descriptor_index)),
			other => bail!("constant pool index {index} is {other:?}, expected NameAndType"),
		}
	}

	pub(crate) fn field_ref(&self, index: u16) -> Result<FieldRef> {
		let CpEntry::FieldRef { class_index, name_and_type_index } = self.get(index)?.clone() else {
			bail!("constant pool index {index} is not a Fieldref");
		};
		let (name_index, descriptor_index) = self.name_and_type(name_and_type_index)?;
		Ok(FieldRef {
			class: self.obj_class_name(class_index)?,
			name: FieldName::try_from(self.utf8_string(name_index)?)?,
			desc: FieldDescriptor::try_from(self.utf8_string(descriptor_index)?)?,
		})
	}

	/// Resolves either a `Methodref` or an `InterfaceMethodref` entry, returning whether it was the
	/// latter so callers can fill in [`crate::tree::method::code::Instruction::InvokeSpecial`]'s and
	/// [`crate::tree::method::code::Instruction::InvokeStatic`]'s trailing `bool`.
	pub(crate) fn method_ref(&self, index: u16) -> Result<(MethodRef, bool)> {
		let (class_index, name_and_type_index, on_interface) = match self.get(index)?.clone() {
			CpEntry::MethodRef { class_index, name_and_type_index } => (class_index, name_and_type_index, false),
			CpEntry::InterfaceMethodRef { class_index, name_and_type_index } => (class_index, name_and_type_index, true),
			other => bail!("constant pool index {index} is {other:?}, expected Methodref or InterfaceMethodref"),
		};
		let (name_index, descriptor_index) = self.name_and_type(name_and_type_index)?;
		let method_ref = MethodRef {
			class: self.class_name(class_index)?,
			name: MethodName::try_from(self.utf8_string(name_index)?)?,
			desc: MethodDescriptor::try_from(self.utf8_string(descriptor_index)?)?,
		};
		Ok((method_ref, on_interface))
	}

	pub(crate) fn method_ref_obj(&self, index: u16) -> Result<MethodRefObj> {
		let CpEntry::MethodRef { class_index, name_and_type_index } = self.get(index)?.clone() else {
			bail!("constant pool index {index} is not a Methodref");
		};
		let (name_index, descriptor_index) = self.name_and_type(name_and_type_index)?;
		Ok(MethodRefObj {
			class: self.obj_class_name(class_index)?,
			name: MethodName::try_from(self.utf8_string(name_index)?)?,
			desc: MethodDescriptor::try_from(self.utf8_string(descriptor_index)?)?,
		})
	}

	pub(crate) fn integer(&self, index: u16) -> Result<i32> {
		match self.get(index)? {
			CpEntry::Integer(value) => Ok(*value),
			other => bail!("constant pool index {index} is {other:?}, expected Integer"),
		}
	}

	pub(crate) fn float(&self, index: u16) -> Result<f32> {
		match self.get(index)? {
			CpEntry::Float(value) => Ok(*value),
			other => bail!("constant pool index {index} is {other:?}, expected Float"),
		}
	}

	pub(crate) fn long(&self, index: u16) -> Result<i64> {
		match self.get(index)? {
			CpEntry::Long(value) => Ok(*value),
			other => bail!("constant pool index {index} is {other:?}, expected Long"),
		}
	}

	pub(crate) fn double(&self, index: u16) -> Result<f64> {
		match self.get(index)? {
			CpEntry::Double(value) => Ok(*value),
			other => bail!("constant pool index {index} is {other:?}, expected Double"),
		}
	}

	pub(crate) fn string(&self, index: u16) -> Result<JavaString> {
		match self.get(index)? {
			CpEntry::String { string_index } => self.utf8_string(*string_index),
			other => bail!("constant pool index {index} is {other:?}, expected String"),
		}
	}

	pub(crate) fn method_type(&self, index: u16) -> Result<MethodDescriptor> {
		match self.get(index)? {
			CpEntry::MethodType { descriptor_index } => MethodDescriptor::try_from(self.utf8_string(*descriptor_index)?),
			other => bail!("constant pool index {index} is {other:?}, expected MethodType"),
		}
	}

	pub(crate) fn module(&self, index: u16) -> Result<crate::tree::module::ModuleName> {
		match self.get(index)? {
			CpEntry::Module { name_index } => crate::tree::module::ModuleName::try_from(self.utf8_string(*name_index)?),
			other => bail!("constant pool index {index} is {other:?}, expected Module"),
		}
	}

	pub(crate) fn package(&self, index: u16) -> Result<crate::tree::module::PackageName> {
		match self.get(index)? {
			CpEntry::Package { name_index } => crate::tree::module::PackageName::try_from(self.utf8_string(*name_index)?),
			other => bail!("constant pool index {index} is {other:?}, expected Package"),
		}
	}

	pub(crate) fn method_handle(&self, index: u16) -> Result<Handle> {
		let CpEntry::MethodHandle { reference_kind, reference_index } = self.get(index)?.clone() else {
			bail!("constant pool index {index} is not a MethodHandle");
		};
		Ok(match reference_kind {
			1 => Handle::GetField(self.field_ref(reference_index)?),
			2 => Handle::GetStatic(self.field_ref(reference_index)?),
			3 => Handle::PutField(self.field_ref(reference_index)?),
			4 => Handle::PutStatic(self.field_ref(reference_index)?),
			5 => Handle::InvokeVirtual(self.method_ref(reference_index)?.0),
			6 => {
				let (method_ref, on_interface) = self.method_ref(reference_index)?;
				Handle::InvokeStatic(method_ref, on_interface)
			}
			7 => {
				let (method_ref, on_interface) = self.method_ref(reference_index)?;
				Handle::InvokeSpecial(method_ref, on_interface)
			}
			8 => Handle::NewInvokeSpecial(self.method_ref(reference_index)?.0),
			9 => Handle::InvokeInterface(self.method_ref(reference_index)?.0),
			other => bail!("unknown method handle reference_kind {other}"),
		})
	}

	/// Resolves any loadable constant pool entry usable by `ldc`/`ldc_w`/`ldc2_w`, a bootstrap
	/// argument, or itself nested inside a `Dynamic` entry's argument list.
	pub(crate) fn loadable(&self, index: u16) -> Result<crate::tree::method::code::Loadable> {
		use crate::tree::method::code::Loadable;
		Ok(match self.get(index)?.clone() {
			CpEntry::Integer(value) => Loadable::Integer(value),
			CpEntry::Float(value) => Loadable::Float(value),
			CpEntry::Long(value) => Loadable::Long(value),
			CpEntry::Double(value) => Loadable::Double(value),
			CpEntry::Class { .. } => Loadable::Class(self.class_name(index)?),
			CpEntry::String { .. } => Loadable::String(self.string(index)?),
			CpEntry::MethodHandle { .. } => Loadable::MethodHandle(self.method_handle(index)?),
			CpEntry::MethodType { .. } => Loadable::MethodType(self.method_type(index)?),
			CpEntry::Dynamic { .. } => Loadable::Dynamic(self.constant_dynamic(index)?),
			other => bail!("constant pool index {index} is {other:?}, not loadable"),
		})
	}

	/// Resolves a `CONSTANT_Dynamic_info` entry into a [`ConstantDynamic`], using the
	/// already-prescanned `BootstrapMethods` table.
	pub(crate) fn constant_dynamic(&self, index: u16) -> Result<ConstantDynamic> {
		let CpEntry::Dynamic { bootstrap_method_attr_index, name_and_type_index } = self.get(index)?.clone() else {
			bail!("constant pool index {index} is not a Dynamic");
		};
		let (name_index, descriptor_index) = self.name_and_type(name_and_type_index)?;
		let bootstrap = self.bootstrap_methods.get(bootstrap_method_attr_index as usize)
			.ok_or_else(|| anyhow!("bootstrap method index {bootstrap_method_attr_index} out of bounds"))?
			.clone();
		let handle = self.method_handle(bootstrap.bootstrap_method_ref)?;
		let arguments = bootstrap.arguments.iter().map(|&arg| self.loadable(arg)).collect::<Result<Vec<_>>>()?;
		Ok(ConstantDynamic {
			name: FieldName::try_from(self.utf8_string(name_index)?)?,
			descriptor: FieldDescriptor::try_from(self.utf8_string(descriptor_index)?)?,
			handle,
			arguments,
		})
	}

	/// Resolves a `ConstantValue` attribute's index, whose entry tag alone determines the variant.
	pub(crate) fn constant_value(&self, index: u16) -> Result<crate::tree::field::ConstantValue> {
		use crate::tree::field::ConstantValue;
		Ok(match self.get(index)?.clone() {
			CpEntry::Integer(value) => ConstantValue::Integer(value),
			CpEntry::Float(value) => ConstantValue::Float(value),
			CpEntry::Long(value) => ConstantValue::Long(value),
			CpEntry::Double(value) => ConstantValue::Double(value),
			CpEntry::String { string_index } => ConstantValue::String(self.utf8_string(string_index)?),
			other => bail!("constant pool index {index} is {other:?}, expected a constant value"),
		})
	}

	/// Resolves a `NameAndType` entry directly into a [`crate::tree::method::MethodNameAndDesc`],
	/// used by `EnclosingMethod`.
	pub(crate) fn method_name_and_desc(&self, name_and_type_index: u16) -> Result<crate::tree::method::MethodNameAndDesc> {
		let (name_index, descriptor_index) = self.name_and_type(name_and_type_index)?;
		Ok(crate::tree::method::MethodNameAndDesc {
			name: MethodName::try_from(self.utf8_string(name_index)?)?,
			desc: MethodDescriptor::try_from(self.utf8_string(descriptor_index)?)?,
		})
	}

	pub(crate) fn invoke_dynamic(&self, index: u16) -> Result<crate::tree::method::code::InvokeDynamic> {
		let CpEntry::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } = self.get(index)?.clone() else {
			bail!("constant pool index {index} is not an InvokeDynamic");
		};
		let (name_index, descriptor_index) = self.name_and_type(name_and_type_index)?;
		let bootstrap = self.bootstrap_methods.get(bootstrap_method_attr_index as usize)
			.ok_or_else(|| anyhow!("bootstrap method index {bootstrap_method_attr_index} out of bounds"))?
			.clone();
		let handle = self.method_handle(bootstrap.bootstrap_method_ref)?;
		let arguments = bootstrap.arguments.iter().map(|&arg| self.loadable(arg)).collect::<Result<Vec<_>>>()?;
		Ok(crate::tree::method::code::InvokeDynamic {
			name: MethodName::try_from(self.utf8_string(name_index)?)?,
			descriptor: MethodDescriptor::try_from(self.utf8_string(descriptor_index)?)?,
			handle,
			arguments,
		})
	}
}
