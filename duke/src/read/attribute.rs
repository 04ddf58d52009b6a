//! Per-owner attribute dispatch: reads one `attribute_info` at a time and either merges it into
//! the typed field it corresponds to, or (for attributes this module doesn't model deeply, namely
//! `StackMapTable`, the `*TypeAnnotations` pair, and `RuntimeVisible/InvisibleParameterAnnotations`)
//! stashes its raw bytes as an [`Attribute`] for the owner to carry around unparsed.

use anyhow::Result;
use java_string::JavaString;
use crate::read::cursor::Cursor;
use crate::read::pool::ConstantPool;
use crate::tree::annotation::{Annotation, ElementValue, ElementValuePair, Object};
use crate::tree::attribute::Attribute;
use crate::tree::class::{ClassFile, ClassSignature, EnclosingMethod, InnerClass, InnerClassFlags};
use crate::tree::descriptor::ReturnDescriptor;
use crate::tree::field::{Field, FieldSignature};
use crate::tree::method::{Method, MethodParameter, MethodSignature, ParameterFlags, ParameterName};
use crate::tree::method::code::{Code, Label, LabelRange, LocalVariableName, Lv, LvIndex};
use crate::tree::module::{Module, ModuleExports, ModuleExportsFlags, ModuleFlags, ModuleOpens, ModuleOpensFlags, ModuleProvides, ModuleRequires, ModuleRequiresFlags};
use crate::tree::record::RecordComponent;

/// Lossily widens a [`JavaString`] into a plain [`String`], for the handful of tree spots (enum
/// constant names, annotation element names) that use `String` instead of a modified-UTF8 newtype.
/// Unpaired surrogates (legal in a `JavaString`, not in a `String`) become `U+FFFD`.
fn java_string_lossy(s: JavaString) -> String {
	String::from_utf8_lossy(&crate::jstring::from_string_to_vec(&s)).into_owned()
}

fn read_header<'a>(cursor: &mut Cursor<'a>, pool: &ConstantPool) -> Result<(Vec<u8>, &'a [u8])> {
	let name_index = cursor.u16()?;
	let length = cursor.u32()?;
	let name = pool.utf8_bytes(name_index)?.to_vec();
	let body = cursor.bytes(length as usize)?;
	Ok((name, body))
}

fn raw_attribute(_pool: &ConstantPool, name: &[u8], body: &[u8]) -> Result<Attribute> {
	Ok(Attribute { name: crate::jstring::from_vec_to_string(name.to_vec())?, bytes: body.to_vec() })
}

pub(crate) fn read_class_attribute(cursor: &mut Cursor, pool: &ConstantPool, class: &mut ClassFile) -> Result<()> {
	let (name, body) = read_header(cursor, pool)?;
	let mut sub = Cursor::new(body);
	match name.as_slice() {
		b"InnerClasses" => {
			let count = sub.u16()?;
			let mut inner_classes = Vec::with_capacity(count as usize);
			for _ in 0..count {
				let inner_class_info_index = sub.u16()?;
				let outer_class_info_index = sub.u16()?;
				let inner_name_index = sub.u16()?;
				let flags = sub.u16()?;
				inner_classes.push(InnerClass {
					inner_class: pool.class_name(inner_class_info_index)?,
					outer_class: if outer_class_info_index == 0 { None } else { Some(pool.class_name(outer_class_info_index)?) },
					inner_name: if inner_name_index == 0 { None } else { Some(pool.utf8_string(inner_name_index)?) },
					flags: InnerClassFlags::from(flags),
				});
			}
			class.inner_classes = Some(inner_classes);
		}
		b"EnclosingMethod" => {
			let class_index = sub.u16()?;
			let method_index = sub.u16()?;
			class.enclosing_method = Some(EnclosingMethod {
				class: pool.class_name(class_index)?,
				method: if method_index == 0 { None } else { Some(pool.method_name_and_desc(method_index)?) },
			});
		}
		b"Synthetic" => class.has_synthetic_attribute = true,
		b"Deprecated" => class.has_deprecated_attribute = true,
		b"Signature" => {
			let index = sub.u16()?;
			class.signature = Some(ClassSignature::try_from(pool.utf8_string(index)?)?);
		}
		b"SourceFile" => {
			let index = sub.u16()?;
			class.source_file = Some(pool.utf8_string(index)?);
		}
		b"SourceDebugExtension" => {
			class.source_debug_extension = Some(crate::jstring::from_vec_to_string(body.to_vec())?);
		}
		b"RuntimeVisibleAnnotations" => class.runtime_visible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeInvisibleAnnotations" => class.runtime_invisible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeVisibleTypeAnnotations" | b"RuntimeInvisibleTypeAnnotations" => {
			class.attributes.push(raw_attribute(pool, &name, body)?);
		}
		b"Module" => class.module = Some(read_module(&mut sub, pool)?),
		b"ModulePackages" => {
			let count = sub.u16()?;
			let mut packages = Vec::with_capacity(count as usize);
			for _ in 0..count {
				packages.push(pool.package(sub.u16()?)?);
			}
			class.module_packages = Some(packages);
		}
		b"ModuleMainClass" => class.module_main_class = Some(pool.class_name(sub.u16()?)?),
		b"NestHost" => class.nest_host_class = Some(pool.class_name(sub.u16()?)?),
		b"NestMembers" => {
			let count = sub.u16()?;
			let mut members = Vec::with_capacity(count as usize);
			for _ in 0..count {
				members.push(pool.class_name(sub.u16()?)?);
			}
			class.nest_members = Some(members);
		}
		b"PermittedSubclasses" => {
			let count = sub.u16()?;
			let mut permitted = Vec::with_capacity(count as usize);
			for _ in 0..count {
				permitted.push(pool.class_name(sub.u16()?)?);
			}
			class.permitted_subclasses = Some(permitted);
		}
		b"Record" => {
			let count = sub.u16()?;
			for _ in 0..count {
				let name_index = sub.u16()?;
				let descriptor_index = sub.u16()?;
				let mut rc = RecordComponent::new(
					crate::tree::record::RecordName::try_from(pool.utf8_string(name_index)?)?,
					crate::tree::field::FieldDescriptor::try_from(pool.utf8_string(descriptor_index)?)?,
				);
				let rc_attribute_count = sub.u16()?;
				for _ in 0..rc_attribute_count {
					read_record_component_attribute(&mut sub, pool, &mut rc)?;
				}
				class.record_components.push(rc);
			}
		}
		b"BootstrapMethods" => {
			// already consumed into the constant pool's bootstrap method table during the prescan.
		}
		_ => class.attributes.push(raw_attribute(pool, &name, body)?),
	}
	Ok(())
}

pub(crate) fn read_field_attribute(cursor: &mut Cursor, pool: &ConstantPool, field: &mut Field) -> Result<()> {
	let (name, body) = read_header(cursor, pool)?;
	let mut sub = Cursor::new(body);
	match name.as_slice() {
		b"ConstantValue" => field.constant_value = Some(pool.constant_value(sub.u16()?)?),
		b"Synthetic" => field.has_synthetic_attribute = true,
		b"Deprecated" => field.has_deprecated_attribute = true,
		b"Signature" => field.signature = Some(FieldSignature::try_from(pool.utf8_string(sub.u16()?)?)?),
		b"RuntimeVisibleAnnotations" => field.runtime_visible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeInvisibleAnnotations" => field.runtime_invisible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeVisibleTypeAnnotations" | b"RuntimeInvisibleTypeAnnotations" => {
			field.attributes.push(raw_attribute(pool, &name, body)?);
		}
		_ => field.attributes.push(raw_attribute(pool, &name, body)?),
	}
	Ok(())
}

pub(crate) fn read_method_attribute(cursor: &mut Cursor, pool: &ConstantPool, method: &mut Method) -> Result<()> {
	let (name, body) = read_header(cursor, pool)?;
	let mut sub = Cursor::new(body);
	match name.as_slice() {
		b"Code" => method.code = Some(super::code::read_code_attribute(&mut sub, pool)?),
		b"Exceptions" => {
			let count = sub.u16()?;
			let mut exceptions = Vec::with_capacity(count as usize);
			for _ in 0..count {
				exceptions.push(pool.class_name(sub.u16()?)?);
			}
			method.exceptions = Some(exceptions);
		}
		b"Synthetic" => method.has_synthetic_attribute = true,
		b"Deprecated" => method.has_deprecated_attribute = true,
		b"Signature" => method.signature = Some(MethodSignature::try_from(pool.utf8_string(sub.u16()?)?)?),
		b"RuntimeVisibleAnnotations" => method.runtime_visible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeInvisibleAnnotations" => method.runtime_invisible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeVisibleTypeAnnotations" | b"RuntimeInvisibleTypeAnnotations"
		| b"RuntimeVisibleParameterAnnotations" | b"RuntimeInvisibleParameterAnnotations" => {
			method.attributes.push(raw_attribute(pool, &name, body)?);
		}
		b"AnnotationDefault" => method.annotation_default = Some(read_element_value(&mut sub, pool)?),
		b"MethodParameters" => {
			let count = sub.u8()?;
			let mut parameters = Vec::with_capacity(count as usize);
			for _ in 0..count {
				let name_index = sub.u16()?;
				let flags = sub.u16()?;
				parameters.push(MethodParameter {
					name: if name_index == 0 { None } else { Some(ParameterName::try_from(pool.utf8_string(name_index)?)?) },
					flags: ParameterFlags::from(flags),
				});
			}
			method.method_parameters = Some(parameters);
		}
		_ => method.attributes.push(raw_attribute(pool, &name, body)?),
	}
	Ok(())
}

fn read_record_component_attribute(cursor: &mut Cursor, pool: &ConstantPool, rc: &mut RecordComponent) -> Result<()> {
	let (name, body) = read_header(cursor, pool)?;
	let mut sub = Cursor::new(body);
	match name.as_slice() {
		b"Signature" => rc.signature = Some(FieldSignature::try_from(pool.utf8_string(sub.u16()?)?)?),
		b"RuntimeVisibleAnnotations" => rc.runtime_visible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeInvisibleAnnotations" => rc.runtime_invisible_annotations = read_annotations(&mut sub, pool)?,
		b"RuntimeVisibleTypeAnnotations" | b"RuntimeInvisibleTypeAnnotations" => {
			rc.attributes.push(raw_attribute(pool, &name, body)?);
		}
		_ => rc.attributes.push(raw_attribute(pool, &name, body)?),
	}
	Ok(())
}

pub(crate) fn read_code_sub_attribute(cursor: &mut Cursor, pool: &ConstantPool, code: &mut Code) -> Result<()> {
	let (name, body) = read_header(cursor, pool)?;
	let mut sub = Cursor::new(body);
	match name.as_slice() {
		b"LineNumberTable" => {
			let count = sub.u16()?;
			let mut line_numbers = code.line_numbers.take().unwrap_or_default();
			for _ in 0..count {
				let start_pc = sub.u16()?;
				let line_number = sub.u16()?;
				line_numbers.push((Label { id: start_pc }, line_number));
			}
			code.line_numbers = Some(line_numbers);
		}
		b"LocalVariableTable" => {
			let count = sub.u16()?;
			let mut local_variables = code.local_variables.take().unwrap_or_default();
			for _ in 0..count {
				let start_pc = sub.u16()?;
				let length = sub.u16()?;
				let name_index = sub.u16()?;
				let descriptor_index = sub.u16()?;
				let index = sub.u16()?;
				local_variables.push(Lv {
					range: LabelRange { start: Label { id: start_pc }, end: Label { id: start_pc + length } },
					name: LocalVariableName::try_from(pool.utf8_string(name_index)?)?,
					descriptor: Some(crate::tree::field::FieldDescriptor::try_from(pool.utf8_string(descriptor_index)?)?),
					signature: None,
					index: LvIndex { index },
				});
			}
			code.local_variables = Some(local_variables);
		}
		b"LocalVariableTypeTable" => {
			let count = sub.u16()?;
			let mut local_variables = code.local_variables.take().unwrap_or_default();
			for _ in 0..count {
				let start_pc = sub.u16()?;
				let length = sub.u16()?;
				let name_index = sub.u16()?;
				let signature_index = sub.u16()?;
				let index = sub.u16()?;
				let signature = FieldSignature::try_from(pool.utf8_string(signature_index)?)?;
				let existing = local_variables.iter_mut().find(|lv| {
					lv.range.start.id == start_pc && lv.index.index == index
				});
				if let Some(lv) = existing {
					lv.signature = Some(signature);
				} else {
					local_variables.push(Lv {
						range: LabelRange { start: Label { id: start_pc }, end: Label { id: start_pc + length } },
						name: LocalVariableName::try_from(pool.utf8_string(name_index)?)?,
						descriptor: None,
						signature: Some(signature),
						index: LvIndex { index },
					});
				}
			}
			code.local_variables = Some(local_variables);
		}
		b"StackMapTable" => code.attributes.push(raw_attribute(pool, &name, body)?),
		b"RuntimeVisibleTypeAnnotations" | b"RuntimeInvisibleTypeAnnotations" => {
			code.attributes.push(raw_attribute(pool, &name, body)?);
		}
		_ => code.attributes.push(raw_attribute(pool, &name, body)?),
	}
	Ok(())
}

fn read_module(sub: &mut Cursor, pool: &ConstantPool) -> Result<Module> {
	let module_name_index = sub.u16()?;
	let module_flags = sub.u16()?;
	let module_version_index = sub.u16()?;

	let requires_count = sub.u16()?;
	let mut requires = Vec::with_capacity(requires_count as usize);
	for _ in 0..requires_count {
		let index = sub.u16()?;
		let flags = sub.u16()?;
		let version_index = sub.u16()?;
		requires.push(ModuleRequires {
			name: pool.module(index)?,
			flags: ModuleRequiresFlags::from(flags),
			version: if version_index == 0 { None } else { Some(pool.utf8_string(version_index)?) },
		});
	}

	let exports_count = sub.u16()?;
	let mut exports = Vec::with_capacity(exports_count as usize);
	for _ in 0..exports_count {
		let index = sub.u16()?;
		let flags = sub.u16()?;
		let exports_to_count = sub.u16()?;
		let mut exports_to = Vec::with_capacity(exports_to_count as usize);
		for _ in 0..exports_to_count {
			exports_to.push(pool.module(sub.u16()?)?);
		}
		exports.push(ModuleExports { name: pool.package(index)?, flags: ModuleExportsFlags::from(flags), exports_to });
	}

	let opens_count = sub.u16()?;
	let mut opens = Vec::with_capacity(opens_count as usize);
	for _ in 0..opens_count {
		let index = sub.u16()?;
		let flags = sub.u16()?;
		let opens_to_count = sub.u16()?;
		let mut opens_to = Vec::with_capacity(opens_to_count as usize);
		for _ in 0..opens_to_count {
			opens_to.push(pool.module(sub.u16()?)?);
		}
		opens.push(ModuleOpens { name: pool.package(index)?, flags: ModuleOpensFlags::from(flags), opens_to });
	}

	let uses_count = sub.u16()?;
	let mut uses = Vec::with_capacity(uses_count as usize);
	for _ in 0..uses_count {
		uses.push(pool.class_name(sub.u16()?)?);
	}

	let provides_count = sub.u16()?;
	let mut provides = Vec::with_capacity(provides_count as usize);
	for _ in 0..provides_count {
		let index = sub.u16()?;
		let provides_with_count = sub.u16()?;
		let mut provides_with = Vec::with_capacity(provides_with_count as usize);
		for _ in 0..provides_with_count {
			provides_with.push(pool.class_name(sub.u16()?)?);
		}
		provides.push(ModuleProvides { name: pool.class_name(index)?, provides_with });
	}

	Ok(Module {
		name: pool.module(module_name_index)?,
		flags: ModuleFlags::from(module_flags),
		version: if module_version_index == 0 { None } else { Some(pool.utf8_string(module_version_index)?) },
		requires,
		exports,
		opens,
		uses,
		provides,
	})
}

fn read_annotations(sub: &mut Cursor, pool: &ConstantPool) -> Result<Vec<Annotation>> {
	let count = sub.u16()?;
	let mut annotations = Vec::with_capacity(count as usize);
	for _ in 0..count {
		annotations.push(read_annotation(sub, pool)?);
	}
	Ok(annotations)
}

fn read_annotation(sub: &mut Cursor, pool: &ConstantPool) -> Result<Annotation> {
	let type_index = sub.u16()?;
	let mut annotation = Annotation::new(crate::tree::field::FieldDescriptor::try_from(pool.utf8_string(type_index)?)?);
	let count = sub.u16()?;
	for _ in 0..count {
		let name_index = sub.u16()?;
		let value = read_element_value(sub, pool)?;
		annotation.element_value_pairs.push(ElementValuePair { name: java_string_lossy(pool.utf8_string(name_index)?), value });
	}
	Ok(annotation)
}

fn read_element_value(sub: &mut Cursor, pool: &ConstantPool) -> Result<ElementValue> {
	let tag = sub.u8()?;
	Ok(match tag {
		b'B' => ElementValue::Object(Object::Byte(pool.integer(sub.u16()?)? as i8)),
		b'C' => ElementValue::Object(Object::Char(pool.integer(sub.u16()?)? as u16)),
		b'D' => ElementValue::Object(Object::Double(pool.double(sub.u16()?)?)),
		b'F' => ElementValue::Object(Object::Float(pool.float(sub.u16()?)?)),
		b'I' => ElementValue::Object(Object::Integer(pool.integer(sub.u16()?)?)),
		b'J' => ElementValue::Object(Object::Long(pool.long(sub.u16()?)?)),
		b'S' => ElementValue::Object(Object::Short(pool.integer(sub.u16()?)? as i16)),
		b'Z' => ElementValue::Object(Object::Boolean(pool.integer(sub.u16()?)? != 0)),
		b's' => ElementValue::Object(Object::String(java_string_lossy(pool.utf8_string(sub.u16()?)?))),
		b'e' => {
			let type_name_index = sub.u16()?;
			let const_name_index = sub.u16()?;
			ElementValue::Enum {
				type_name: crate::tree::field::FieldDescriptor::try_from(pool.utf8_string(type_name_index)?)?,
				const_name: java_string_lossy(pool.utf8_string(const_name_index)?),
			}
		}
		b'c' => ElementValue::Class(ReturnDescriptor::try_from(pool.utf8_string(sub.u16()?)?)?),
		b'@' => ElementValue::AnnotationInterface(read_annotation(sub, pool)?),
		b'[' => {
			let count = sub.u16()?;
			let mut values = Vec::with_capacity(count as usize);
			for _ in 0..count {
				values.push(read_element_value(sub, pool)?);
			}
			ElementValue::ArrayType(values)
		}
		other => anyhow::bail!("unknown element value tag {:?}", other as char),
	})
}
