use crate::tree::class::ClassName;

/// The symbolic type of a stack slot or local variable (§3). `BOOLEAN`/`BYTE`/`CHAR`/`SHORT` are
/// never represented separately -- they collapse to [`ValueType::Int`] per JVM verification rules,
/// the same way the verifier itself treats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
	/// The second half of a wide ([`ValueType::Long`]/[`ValueType::Double`]) value, or an LVT
	/// slot never written to.
	Top,
	Int,
	Long,
	Float,
	Double,
	Null,
	/// `this` inside a constructor, before the superclass constructor has run.
	UninitializedThis,
	Object,
	/// The result of a `new` instruction, before its constructor has run.
	Uninitialized,
}

impl ValueType {
	/// `LONG`/`DOUBLE` occupy two adjacent slots; everything else occupies one.
	pub fn is_wide(self) -> bool {
		matches!(self, ValueType::Long | ValueType::Double)
	}
}

/// A symbolic value: a [`ValueType`] plus, for the variants that carry one, a descriptor.
///
/// - For [`ValueType::Object`]/[`ValueType::Uninitialized`], `descriptor` is the internal class (or
///   array) name.
/// - For [`ValueType::UninitializedThis`], `descriptor` is the owning class's name.
/// - Otherwise `descriptor` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
	pub ty: ValueType,
	pub descriptor: Option<ClassName>,
}

impl Value {
	pub const TOP: Value = Value { ty: ValueType::Top, descriptor: None };
	pub const INT: Value = Value { ty: ValueType::Int, descriptor: None };
	pub const LONG: Value = Value { ty: ValueType::Long, descriptor: None };
	pub const FLOAT: Value = Value { ty: ValueType::Float, descriptor: None };
	pub const DOUBLE: Value = Value { ty: ValueType::Double, descriptor: None };
	pub const NULL: Value = Value { ty: ValueType::Null, descriptor: None };

	pub fn object(descriptor: ClassName) -> Value {
		Value { ty: ValueType::Object, descriptor: Some(descriptor) }
	}

	pub fn uninitialized(descriptor: ClassName) -> Value {
		Value { ty: ValueType::Uninitialized, descriptor: Some(descriptor) }
	}

	pub fn uninitialized_this(owner: ClassName) -> Value {
		Value { ty: ValueType::UninitializedThis, descriptor: Some(owner) }
	}

	pub fn is_wide(&self) -> bool {
		self.ty.is_wide()
	}
}
