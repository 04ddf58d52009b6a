
/// Assuming a `struct Foo(Cow<'static, str>);`, creates implementations for
/// - `From<String> for Foo`, `From<&str> for Foo`, and
/// - `From<Foo> for String`, `From<&'a Foo> for &'a str`, and
/// - `.as_mut_string(&mut self) -> &mut String`, `.as_str(&self) -> &str` and
/// - `AsRef<str> for Foo`.
macro_rules! from_impl_for_string_and_str {
	($name:ident) => {
		impl From<String> for $name {
			fn from(value: String) -> Self {
				$name(value.into())
			}
		}

		impl From<&'static str> for $name {
			fn from(value: &'static str) -> Self {
				$name(value.into())
			}
		}

		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0.into_owned()
			}
		}

		impl<'a> From<&'a $name> for &'a str {
			fn from(value: &'a $name) -> Self {
				&value.0
			}
		}

		impl $name {
			pub fn as_mut_string(&mut self) -> &mut String {
				self.0.to_mut()
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.as_str()
			}
		}
	}
}

/// Assuming a `struct Foo(Cow<'static, str>);`, creates implementations for
/// - `PartialEq<&str> for Foo`, `PartialEq<str> for Foo`, and
/// - `PartialEq<Foo> for &str`, `PartialEq<Foo> for str`.
macro_rules! partial_eq_impl_for_str {
	($name:ident) => {
		impl PartialEq<&str> for $name {
			fn eq(&self, other: &&str) -> bool {
				self.0 == *other
			}
		}

		impl PartialEq<str> for $name {
			fn eq(&self, other: &str) -> bool {
				self.0 == other
			}
		}

		impl PartialEq<$name> for &str {
			fn eq(&self, other: &$name) -> bool {
				*self == other.0
			}
		}

		impl PartialEq<$name> for str {
			fn eq(&self, other: &$name) -> bool {
				self == other.0
			}
		}
	}
}

/// Declares a pair of owned/borrowed newtypes over [`JavaString`][java_string::JavaString]/[`JavaStr`][java_string::JavaStr],
/// mirroring how `String`/`str` relate to each other, plus a `check_valid`-backed `is_valid` predicate.
///
/// Three shapes are accepted:
/// - `Owned(JavaString); Slice(JavaStr); is_valid(s) = <expr returning anyhow::Result<()>>;` generates
///   `check_valid` from the given expression.
/// - `Owned(JavaString); Slice(JavaStr);` (no `is_valid` clause) assumes a hand-written
///   `impl Owned { fn check_valid(inner: &JavaStr) -> anyhow::Result<()> { .. } }` follows the macro call.
/// - `Owned, Slice` (bare identifiers) is shorthand for the above with no validation at all.
macro_rules! make_string_str_like {
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident($owned_inner:ty);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident($slice_inner:ty);
		is_valid($pat:ident) = $valid:expr;
	) => {
		$(#[$owned_meta])*
		#[derive(Debug, Clone, Eq, PartialEq, Hash)]
		$owned_vis struct $owned($owned_inner);

		$(#[$slice_meta])*
		#[derive(Debug, Eq, PartialEq, Hash)]
		#[repr(transparent)]
		$slice_vis struct $slice($slice_inner);

		impl $owned {
			fn check_valid($pat: &$slice_inner) -> anyhow::Result<()> {
				$valid
			}
		}

		crate::macros::make_string_str_like_impls!($owned, $owned_inner, $slice, $slice_inner);
	};
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident($owned_inner:ty);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident($slice_inner:ty);
	) => {
		$(#[$owned_meta])*
		#[derive(Debug, Clone, Eq, PartialEq, Hash)]
		$owned_vis struct $owned($owned_inner);

		$(#[$slice_meta])*
		#[derive(Debug, Eq, PartialEq, Hash)]
		#[repr(transparent)]
		$slice_vis struct $slice($slice_inner);

		crate::macros::make_string_str_like_impls!($owned, $owned_inner, $slice, $slice_inner);
	};
	($owned:ident, $slice:ident) => {
		#[derive(Debug, Clone, Eq, PartialEq, Hash)]
		pub struct $owned(java_string::JavaString);

		#[derive(Debug, Eq, PartialEq, Hash)]
		#[repr(transparent)]
		pub struct $slice(java_string::JavaStr);

		impl $owned {
			fn check_valid(_inner: &java_string::JavaStr) -> anyhow::Result<()> {
				Ok(())
			}
		}

		crate::macros::make_string_str_like_impls!($owned, java_string::JavaString, $slice, java_string::JavaStr);
	};
}

/// Shared body of [`make_string_str_like`], factored out so all three invocation shapes produce the
/// same conversions, deref chain and equality impls.
macro_rules! make_string_str_like_impls {
	($owned:ident, $owned_inner:ty, $slice:ident, $slice_inner:ty) => {
		impl $owned {
			/// Constructs this type without checking [`Self::is_valid`].
			///
			/// # Safety
			/// The caller must ensure `inner` would pass [`Self::is_valid`].
			pub unsafe fn from_inner_unchecked(inner: $owned_inner) -> Self {
				$owned(inner)
			}

			pub fn is_valid(inner: &$slice_inner) -> bool {
				Self::check_valid(inner).is_ok()
			}

			pub fn as_slice(&self) -> &$slice {
				// SAFETY: `$slice` is `#[repr(transparent)]` over `$slice_inner`.
				unsafe { &*(std::ops::Deref::deref(&self.0) as *const $slice_inner as *const $slice) }
			}

			pub fn as_inner(&self) -> &$slice_inner {
				std::ops::Deref::deref(&self.0)
			}

			pub fn into_inner(self) -> $owned_inner {
				self.0
			}
		}

		impl $slice {
			/// Constructs this type without checking [`$owned::is_valid`].
			///
			/// # Safety
			/// The caller must ensure `inner` would pass [`$owned::is_valid`].
			pub const unsafe fn from_inner_unchecked(inner: &$slice_inner) -> &Self {
				// SAFETY: `$slice` is `#[repr(transparent)]` over `$slice_inner`.
				unsafe { &*(inner as *const $slice_inner as *const $slice) }
			}

			pub fn as_inner(&self) -> &$slice_inner {
				&self.0
			}

			pub fn as_str(&self) -> &$slice_inner {
				&self.0
			}
		}

		impl TryFrom<$owned_inner> for $owned {
			type Error = anyhow::Error;

			fn try_from(inner: $owned_inner) -> anyhow::Result<Self> {
				$owned::check_valid(std::ops::Deref::deref(&inner))?;
				Ok($owned(inner))
			}
		}

		impl From<&str> for $owned {
			fn from(value: &str) -> Self {
				let inner: $owned_inner = java_string::JavaStr::from_str(value).to_owned();
				// the call sites of `From<&str>` only ever pass in compile-time literals that are
				// known-valid, same as upstream `ClassName::from("java/lang/Thread")`.
				$owned(inner)
			}
		}

		impl std::ops::Deref for $owned {
			type Target = $slice;

			fn deref(&self) -> &$slice {
				self.as_slice()
			}
		}

		impl std::borrow::Borrow<$slice> for $owned {
			fn borrow(&self) -> &$slice {
				self.as_slice()
			}
		}

		impl ToOwned for $slice {
			type Owned = $owned;

			fn to_owned(&self) -> $owned {
				$owned(self.0.to_owned())
			}
		}

		impl PartialEq<str> for $owned {
			fn eq(&self, other: &str) -> bool {
				self.as_inner() == other
			}
		}
		impl PartialEq<str> for $slice {
			fn eq(&self, other: &str) -> bool {
				&self.0 == other
			}
		}
	};
}

/// Generates `Display` for a [`make_string_str_like`] owned/slice pair, delegating to the inner
/// modified-UTF8 string.
macro_rules! make_display {
	($owned:ident, $slice:ident) => {
		impl std::fmt::Display for $owned {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Display::fmt(self.as_slice(), f)
			}
		}
		impl std::fmt::Display for $slice {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}", self.as_inner())
			}
		}
	};
}

pub(crate) use from_impl_for_string_and_str;
pub(crate) use partial_eq_impl_for_str;
pub(crate) use make_string_str_like;
pub(crate) use make_string_str_like_impls;
pub(crate) use make_display;