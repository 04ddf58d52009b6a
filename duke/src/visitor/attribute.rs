use anyhow::Result;
use crate::tree::attribute::Attribute;

/// Implemented by consumers that want to inspect attributes this crate doesn't know the shape of.
///
/// Since we don't carry a constant-pool-aware byte reader, an unknown attribute is handed over as
/// its raw `(name, bytes)` pair; resolving any constant pool indices inside `bytes` is the
/// implementor's problem.
pub trait UnknownAttributeVisitor: Sized {
	fn from_attribute(attribute: Attribute) -> Result<Option<Self>>;
}
