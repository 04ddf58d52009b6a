//! Parses the raw bytes of a `.class` file into a [`ClassFile`].
//!
//! The constant pool can reference a `Dynamic`/`InvokeDynamic` entry's bootstrap method before the
//! class's own `BootstrapMethods` attribute (always the last class-level attribute in practice, but
//! JVMS doesn't actually require any attribute ordering) has been read. So parsing happens in two
//! passes: a cheap prescan that walks fields and methods generically (without interpreting any of
//! their attributes) just to reach the class attributes and pull out `BootstrapMethods`, followed by
//! the real parse, seeked back to the start of the fields, with the bootstrap table already in hand.

mod cursor;
mod pool;
mod code;
mod attribute;

use anyhow::{ensure, Result};
use crate::read::cursor::Cursor;
use crate::read::pool::{ConstantPool, RawBootstrapMethod};
use crate::tree::class::{ClassAccess, ClassFile};
use crate::tree::field::{Field, FieldAccess, FieldDescriptor, FieldName};
use crate::tree::method::{Method, MethodAccess, MethodDescriptor, MethodName};
use crate::tree::version::Version;

const MAGIC: u32 = 0xCAFEBABE;

/// Parses an entire `.class` file from its on-disk bytes.
pub fn read_class_file(bytes: &[u8]) -> Result<ClassFile> {
	let mut cursor = Cursor::new(bytes);

	let magic = cursor.u32()?;
	ensure!(magic == MAGIC, "not a class file: magic is 0x{magic:08x}, expected 0x{MAGIC:08x}");
	let minor = cursor.u16()?;
	let major = cursor.u16()?;
	let version = Version::new(major, minor);

	let mut pool = ConstantPool::read(&mut cursor)?;

	let access = ClassAccess::from(cursor.u16()?);
	let this_class = pool.class_name(cursor.u16()?)?;
	let super_class_index = cursor.u16()?;
	let super_class = if super_class_index == 0 { None } else { Some(pool.class_name(super_class_index)?) };

	let interfaces_count = cursor.u16()?;
	let mut interfaces = Vec::with_capacity(interfaces_count as usize);
	for _ in 0..interfaces_count {
		interfaces.push(pool.class_name(cursor.u16()?)?);
	}

	let fields_start = cursor.position();
	pool.bootstrap_methods = prescan_bootstrap_methods(&mut cursor, &pool)?;
	cursor.seek(fields_start);

	let mut class = ClassFile::new(version, access, this_class, super_class, interfaces);

	let fields_count = cursor.u16()?;
	for _ in 0..fields_count {
		let field_access = FieldAccess::from(cursor.u16()?);
		let name = FieldName::try_from(pool.utf8_string(cursor.u16()?)?)?;
		let descriptor = FieldDescriptor::try_from(pool.utf8_string(cursor.u16()?)?)?;
		let mut field = Field::new(field_access, name, descriptor);
		let attribute_count = cursor.u16()?;
		for _ in 0..attribute_count {
			attribute::read_field_attribute(&mut cursor, &pool, &mut field)?;
		}
		class.fields.push(field);
	}

	let methods_count = cursor.u16()?;
	for _ in 0..methods_count {
		let method_access = MethodAccess::from(cursor.u16()?);
		let name = MethodName::try_from(pool.utf8_string(cursor.u16()?)?)?;
		let descriptor = MethodDescriptor::try_from(pool.utf8_string(cursor.u16()?)?)?;
		let mut method = Method::new(method_access, name, descriptor);
		let attribute_count = cursor.u16()?;
		for _ in 0..attribute_count {
			attribute::read_method_attribute(&mut cursor, &pool, &mut method)?;
		}
		class.methods.push(method);
	}

	let attribute_count = cursor.u16()?;
	for _ in 0..attribute_count {
		attribute::read_class_attribute(&mut cursor, &pool, &mut class)?;
	}

	Ok(class)
}

/// Generically skips over the fields and methods (without resolving any of their attributes, which
/// may themselves reference bootstrap methods not yet known) to reach the class-level attributes,
/// and extracts `BootstrapMethods` from among them if present. `cursor` must be positioned right
/// before `fields_count`.
fn prescan_bootstrap_methods(cursor: &mut Cursor, pool: &ConstantPool) -> Result<Vec<RawBootstrapMethod>> {
	skip_members(cursor)?; // fields
	skip_members(cursor)?; // methods

	let mut bootstrap_methods = Vec::new();
	let attribute_count = cursor.u16()?;
	for _ in 0..attribute_count {
		let name_index = cursor.u16()?;
		let length = cursor.u32()?;
		let is_bootstrap_methods = pool.utf8_bytes(name_index)? == b"BootstrapMethods";
		let body = cursor.bytes(length as usize)?;
		if is_bootstrap_methods {
			bootstrap_methods = read_bootstrap_methods(body)?;
		}
	}
	Ok(bootstrap_methods)
}

fn skip_members(cursor: &mut Cursor) -> Result<()> {
	let count = cursor.u16()?;
	for _ in 0..count {
		// access_flags, name_index, descriptor_index
		cursor.bytes(6)?;
		let attribute_count = cursor.u16()?;
		for _ in 0..attribute_count {
			// attribute_name_index
			cursor.bytes(2)?;
			let length = cursor.u32()?;
			cursor.bytes(length as usize)?;
		}
	}
	Ok(())
}

fn read_bootstrap_methods(body: &[u8]) -> Result<Vec<RawBootstrapMethod>> {
	let mut cursor = Cursor::new(body);
	let count = cursor.u16()?;
	let mut methods = Vec::with_capacity(count as usize);
	for _ in 0..count {
		let bootstrap_method_ref = cursor.u16()?;
		let argument_count = cursor.u16()?;
		let mut arguments = Vec::with_capacity(argument_count as usize);
		for _ in 0..argument_count {
			arguments.push(cursor.u16()?);
		}
		methods.push(RawBootstrapMethod { bootstrap_method_ref, arguments });
	}
	Ok(methods)
}
