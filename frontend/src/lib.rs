//! Turns a jar's `.class` entries into one [`ir::Context`]: parses each entry with `duke`, then
//! lowers it with [`class::lower_class`], which also runs every `transforms` pass over each method
//! body it produces, so what callers get back is SSA IR rather than the raw, `Local`-laden output
//! of the stack-to-SSA lowering.
//!
//! A single [`Context`](ir::Context) is shared across every class in the jar, so a call from one
//! class's method body into another class (or into a method that hasn't been lowered yet) resolves
//! through [`ir::Context::ensure_class`]/[`ir::Context::ensure_method`] rather than needing a
//! separate linking pass.

mod class;
mod diagnostic;
mod method;
mod types;

use anyhow::{Context as _, Result};
use archive::Jar;
use ir::Context;
use log::warn;

pub use diagnostic::LoweringError;

/// Lowers every `.class` entry of `jar` into a fresh [`Context`].
///
/// A class that fails to parse or lower is skipped with a logged warning rather than aborting the
/// whole jar, matching `duke`'s own "best effort" reading posture.
pub fn lower_jar(jar: &mut impl Jar) -> Result<Context> {
	let mut ctx = Context::new();
	for (name, bytes) in jar.read_classes().context("reading jar entries")? {
		if let Err(err) = lower_class_bytes(&mut ctx, &bytes) {
			warn!("failed to lower {name}: {err:#}");
		}
	}
	Ok(ctx)
}

fn lower_class_bytes(ctx: &mut Context, bytes: &[u8]) -> Result<()> {
	let class_file = duke::read::read_class_file(bytes)?;
	class::lower_class(ctx, &class_file)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use zip::write::SimpleFileOptions;

	fn jar_of(entries: &[(&str, &[u8])]) -> archive::MemJar {
		let mut buf = Vec::new();
		{
			let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
			let options = SimpleFileOptions::default();
			for &(name, bytes) in entries {
				writer.start_file(name, options).unwrap();
				writer.write_all(bytes).unwrap();
			}
			writer.finish().unwrap();
		}
		archive::MemJar::new(buf)
	}

	#[test]
	fn unparseable_class_is_skipped_not_fatal() -> Result<()> {
		let mut jar = jar_of(&[("A.class", b"not a class file")]);
		let mut ctx = lower_jar(&mut jar)?;
		let symbol = ctx.symbol("A");
		assert!(ctx.class(symbol).is_none());
		Ok(())
	}

	#[test]
	fn non_class_entries_are_ignored() -> Result<()> {
		let mut jar = jar_of(&[("README.txt", b"not even attempted")]);
		lower_jar(&mut jar)?;
		Ok(())
	}
}
