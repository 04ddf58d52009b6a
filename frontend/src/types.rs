//! Maps `duke`'s parsed descriptor [`Type`]s onto `ir`'s interned [`TypeId`] universe.
//!
//! `duke` already parses descriptor grammar (`B|C|D|F|I|J|S|Z|[T|L<name>;`) into
//! [`duke::tree::descriptor::Type`]; this module only has to translate that into the other crate's
//! type representation, it never re-parses a descriptor string itself.

use duke::tree::descriptor::{ArrayType as DukeArrayType, Type as DukeType};
use duke::tree::field::FieldDescriptorSlice;
use duke::tree::method::MethodDescriptorSlice;
use ir::Context;
use ir::types::{IntWidth, TypeId};

pub fn lower_field_type(ctx: &mut Context, ty: &DukeType) -> TypeId {
	match ty {
		DukeType::B => ctx.int_type(IntWidth::W8),
		DukeType::C => ctx.int_type(IntWidth::W16),
		DukeType::D => ctx.double_type(),
		DukeType::F => ctx.float_type(),
		DukeType::I => ctx.int_type(IntWidth::W32),
		DukeType::J => ctx.int_type(IntWidth::W64),
		DukeType::S => ctx.int_type(IntWidth::W16),
		DukeType::Z => ctx.int_type(IntWidth::W1),
		DukeType::Object(class_name) => ctx.reference_type(&class_name.to_string()),
		DukeType::Array(dim, element) => {
			let mut ty = lower_array_element(ctx, element);
			for _ in 0..*dim {
				ty = ctx.array_type(ty);
			}
			ty
		}
	}
}

fn lower_array_element(ctx: &mut Context, ty: &DukeArrayType) -> TypeId {
	match ty {
		DukeArrayType::B => ctx.int_type(IntWidth::W8),
		DukeArrayType::C => ctx.int_type(IntWidth::W16),
		DukeArrayType::D => ctx.double_type(),
		DukeArrayType::F => ctx.float_type(),
		DukeArrayType::I => ctx.int_type(IntWidth::W32),
		DukeArrayType::J => ctx.int_type(IntWidth::W64),
		DukeArrayType::S => ctx.int_type(IntWidth::W16),
		DukeArrayType::Z => ctx.int_type(IntWidth::W1),
		DukeArrayType::Object(class_name) => ctx.reference_type(&class_name.to_string()),
	}
}

/// Maps a `void` return (`None`) onto [`Context::void_type`].
pub fn lower_return_type(ctx: &mut Context, ty: &Option<DukeType>) -> TypeId {
	match ty {
		Some(ty) => lower_field_type(ctx, ty),
		None => ctx.void_type(),
	}
}

pub fn parse_field_type(ctx: &mut Context, descriptor: &FieldDescriptorSlice) -> anyhow::Result<TypeId> {
	let parsed = descriptor.parse()?;
	Ok(lower_field_type(ctx, &parsed.0))
}

/// Parses a method descriptor into `(param_types, return_type)`.
pub fn parse_method_type(ctx: &mut Context, descriptor: &MethodDescriptorSlice) -> anyhow::Result<(Vec<TypeId>, TypeId)> {
	let parsed = descriptor.parse()?;
	let params = parsed.parameter_descriptors.iter().map(|t| lower_field_type(ctx, t)).collect();
	let ret = lower_return_type(ctx, &parsed.return_descriptor);
	Ok((params, ret))
}

pub fn is_category_two(ctx: &Context, ty: TypeId) -> bool {
	ctx.type_data(ty).is_category_two()
}

#[cfg(test)]
mod tests {
	use duke::tree::field::FieldDescriptor;
	use duke::tree::method::MethodDescriptor;
	use ir::Context;

	use super::*;

	#[test]
	fn primitive_field_descriptors_map_to_the_matching_width() {
		let mut ctx = Context::new();

		let int = parse_field_type(&mut ctx, &FieldDescriptor::from("I")).unwrap();
		assert_eq!(int, ctx.int_type(IntWidth::W32));

		let byte = parse_field_type(&mut ctx, &FieldDescriptor::from("B")).unwrap();
		assert_eq!(byte, ctx.int_type(IntWidth::W8));

		let boolean = parse_field_type(&mut ctx, &FieldDescriptor::from("Z")).unwrap();
		assert_eq!(boolean, ctx.int_type(IntWidth::W1));

		let double = parse_field_type(&mut ctx, &FieldDescriptor::from("D")).unwrap();
		assert_eq!(double, ctx.double_type());
	}

	#[test]
	fn object_descriptor_becomes_a_reference_type() {
		let mut ctx = Context::new();

		let ty = parse_field_type(&mut ctx, &FieldDescriptor::from("Ljava/lang/String;")).unwrap();
		assert_eq!(ty, ctx.reference_type("java/lang/String"));
	}

	#[test]
	fn array_descriptor_nests_one_array_type_per_dimension() {
		let mut ctx = Context::new();

		let ty = parse_field_type(&mut ctx, &FieldDescriptor::from("[[I")).unwrap();
		let inner = ctx.int_type(IntWidth::W32);
		let once = ctx.array_type(inner);
		let twice = ctx.array_type(once);
		assert_eq!(ty, twice);
	}

	#[test]
	fn method_descriptor_splits_into_params_and_return() {
		let mut ctx = Context::new();

		let (params, ret) = parse_method_type(&mut ctx, &MethodDescriptor::from("(IDLjava/lang/String;)Z")).unwrap();

		assert_eq!(params, vec![ctx.int_type(IntWidth::W32), ctx.double_type(), ctx.reference_type("java/lang/String")]);
		assert_eq!(ret, ctx.int_type(IntWidth::W1));
	}

	#[test]
	fn void_method_descriptor_returns_the_void_type() {
		let mut ctx = Context::new();

		let (params, ret) = parse_method_type(&mut ctx, &MethodDescriptor::from("()V")).unwrap();

		assert!(params.is_empty());
		assert_eq!(ret, ctx.void_type());
	}

	#[test]
	fn wide_primitives_are_category_two() {
		let mut ctx = Context::new();

		let long = ctx.int_type(IntWidth::W64);
		let double = ctx.double_type();
		let int = ctx.int_type(IntWidth::W32);

		assert!(is_category_two(&ctx, long));
		assert!(is_category_two(&ctx, double));
		assert!(!is_category_two(&ctx, int));
	}
}
