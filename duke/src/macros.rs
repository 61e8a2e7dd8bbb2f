
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

pub(crate) use from_impl_for_string_and_str;
pub(crate) use partial_eq_impl_for_str;

/// Declares an owned/slice pair of newtypes over [`JavaString`]/[`JavaStr`], in the style of
/// `String`/`str` or `PathBuf`/`Path`.
///
/// The slice type is `#[repr(transparent)]`, so a validated `&JavaStr` can be reinterpreted as
/// `&Slice` without copying, which is what makes `from_inner_unchecked` a `const fn` usable for
/// associated constants such as `ClassName::JAVA_LANG_OBJECT`.
///
/// Validation is supplied either inline via `is_valid(name) = expr;` (where `expr: Result<()>` and
/// `name: &JavaStr`), or omitted here and provided afterwards as a manually written
/// `impl Owned { fn check_valid(inner: &JavaStr) -> Result<()> { ... } }`.
macro_rules! make_string_str_like {
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident(JavaString);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident(JavaStr);
	) => {
		$crate::macros::make_string_str_like_inner!(
			$(#[$owned_meta])* $owned_vis $owned(JavaString);
			$(#[$slice_meta])* $slice_vis $slice(JavaStr);
		);
	};
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident(JavaString);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident(JavaStr);
		is_valid($check_arg:ident) = $check_body:expr;
	) => {
		$crate::macros::make_string_str_like_inner!(
			$(#[$owned_meta])* $owned_vis $owned(JavaString);
			$(#[$slice_meta])* $slice_vis $slice(JavaStr);
		);

		impl $owned {
			fn check_valid($check_arg: &java_string::JavaStr) -> anyhow::Result<()> {
				$check_body
			}
		}
	};
}

macro_rules! make_string_str_like_inner {
	(
		$(#[$owned_meta:meta])*
		$owned_vis:vis $owned:ident(JavaString);
		$(#[$slice_meta:meta])*
		$slice_vis:vis $slice:ident(JavaStr);
	) => {
		$(#[$owned_meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		$owned_vis struct $owned(java_string::JavaString);

		$(#[$slice_meta])*
		#[repr(transparent)]
		#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
		$slice_vis struct $slice(java_string::JavaStr);

		impl $owned {
			pub fn new(inner: java_string::JavaString) -> anyhow::Result<Self> {
				Self::check_valid(&inner)?;
				Ok($owned(inner))
			}

			/// # Safety
			/// `inner` must satisfy this type's validity invariant.
			pub unsafe fn from_inner_unchecked(inner: java_string::JavaString) -> Self {
				$owned(inner)
			}

			pub fn as_inner(&self) -> &java_string::JavaStr {
				&self.0
			}

			pub fn into_inner(self) -> java_string::JavaString {
				self.0
			}

			pub fn as_slice(&self) -> &$slice {
				// SAFETY: `self.0` was validated by `Self::new`/`from_inner_unchecked`'s caller,
				// and `$slice` is `#[repr(transparent)]` over `JavaStr`.
				unsafe { $slice::from_inner_unchecked(&self.0) }
			}
		}

		impl $slice {
			/// # Safety
			/// `inner` must satisfy this type's validity invariant.
			pub const unsafe fn from_inner_unchecked(inner: &java_string::JavaStr) -> &$slice {
				// SAFETY: `$slice` is `#[repr(transparent)]` over `JavaStr`; the caller upholds
				// the validity invariant.
				unsafe { &*(inner as *const java_string::JavaStr as *const $slice) }
			}

			pub fn as_inner(&self) -> &java_string::JavaStr {
				&self.0
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
				// SAFETY: `self` already satisfies the validity invariant.
				$owned(self.0.to_owned())
			}
		}

		impl std::fmt::Debug for $owned {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Debug::fmt(&self.0, f)
			}
		}
		impl std::fmt::Debug for $slice {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Debug::fmt(&self.0, f)
			}
		}

		impl From<&str> for $owned {
			fn from(value: &str) -> Self {
				#[allow(clippy::expect_used)]
				$owned::new(java_string::JavaString::from(value))
					.expect(concat!("invalid ", stringify!($owned), " literal"))
			}
		}

		impl PartialEq<$slice> for $owned {
			fn eq(&self, other: &$slice) -> bool {
				self.as_inner() == other.as_inner()
			}
		}
		impl PartialEq<&$slice> for $owned {
			fn eq(&self, other: &&$slice) -> bool {
				self.as_inner() == other.as_inner()
			}
		}
		impl PartialEq<$owned> for $slice {
			fn eq(&self, other: &$owned) -> bool {
				self.as_inner() == other.as_inner()
			}
		}

		impl PartialEq<&str> for $slice {
			fn eq(&self, other: &&str) -> bool {
				self.0 == *other
			}
		}
	};
}

pub(crate) use make_string_str_like;
pub(crate) use make_string_str_like_inner;

/// Generates `Display` impls for a [`make_string_str_like!`] owned/slice pair that simply forward
/// to the wrapped [`JavaString`]/[`JavaStr`]'s own formatting.
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

pub(crate) use make_display;