//! Convenience wrapper over [`ClassVisitor`][crate::visitor::class::ClassVisitor] for consumers
//! that only care about fields and methods and want to ignore every other attribute.

pub mod class;
