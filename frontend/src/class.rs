//! Registers a `duke` classfile's fields and methods into an [`ir::Context`], lowering each
//! method body by delegating to [`crate::method::lower_method`].

use anyhow::{Context as _, Result};
use duke::tree::class::ClassFile;
use ir::Context;
use ir::types::Symbol;
use log::{debug, warn};

use crate::types;

/// Lowers one classfile into `ctx`, registering its fields and methods (and the IR bodies of any
/// methods that have a `Code` attribute) under a [`Symbol`] for its class name.
pub fn lower_class(ctx: &mut Context, class: &ClassFile) -> Result<Symbol> {
	let class_name = class.name.to_string();
	debug!("lowering class {class_name}");
	let class_symbol = ctx.ensure_class(&class_name);

	for field in &class.fields {
		let ty = types::parse_field_type(ctx, field.descriptor.as_slice())
			.with_context(|| format!("field {}.{}", class_name, field.name))?;
		ctx.ensure_field(class_symbol, &field.name.to_string(), ty, field.access.is_static);
	}

	for method in &class.methods {
		let method_name = method.name.to_string();
		let function = match lower_method_signature(ctx, class_symbol, &class_name, method) {
			Ok(function) => function,
			Err(err) => {
				warn!("failed to lower signature of {class_name}.{method_name}: {err:#}");
				continue;
			}
		};

		if let Some(code) = &method.code {
			match crate::method::lower_method_body(ctx, function, &method_name, method, code) {
				Ok(()) => transforms::run_all(ctx, function),
				Err(err) => warn!("failed to lower body of {class_name}.{method_name}: {err:#}"),
			}
		}
	}

	Ok(class_symbol)
}

fn lower_method_signature(
	ctx: &mut Context,
	class_symbol: Symbol,
	class_name: &str,
	method: &duke::tree::method::Method,
) -> Result<ir::FunctionId> {
	let (mut params, ret) = types::parse_method_type(ctx, method.descriptor.as_slice())
		.with_context(|| format!("method {}.{}{}", class_name, method.name, method.descriptor))?;
	let fn_type = ctx.function_type(ret, params.clone());

	if !method.access.is_static {
		let this_type = ctx.reference_type(class_name);
		params.insert(0, this_type);
	}

	Ok(ctx.ensure_method(class_symbol, &method.name.to_string(), fn_type, method.access.is_static, &params))
}
