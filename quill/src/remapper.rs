//! A minimal `Remapper` trait and two implementations (§1: "remapper stubs").
//!
//! This crate does not read or write any mapping file format -- the original spec never mentions
//! one, and the analyzer has no need of one. What's kept is the smallest shape a caller building
//! on `duke` would still want: a way to ask "what name does this class/field/method have under
//! the target mapping?" and get back an answer, whether that answer is "the same name" or one
//! looked up in an in-memory table.

use anyhow::Result;
use indexmap::IndexMap;
use duke::tree::class::{ClassName, ObjClassName};
use duke::tree::descriptor::{ArrayType, ParsedFieldDescriptor, ParsedMethodDescriptor, Type};
use duke::tree::field::{FieldDescriptor, FieldName, FieldNameAndDesc, FieldRef};
use duke::tree::method::{MethodDescriptor, MethodName, MethodNameAndDesc, MethodRef};

/// Remaps class, field and method names.
///
/// Descriptors are remapped by parsing them into [`duke::tree::descriptor::Type`] and substituting
/// every embedded class name, leaving primitives and array dimensions untouched -- the same
/// parse/rebuild round trip [`duke::analysis::analyzer`] itself uses when it needs to build a new
/// descriptor (e.g. for `ANEWARRAY`'s result type).
pub trait Remapper {
	fn map_class(&self, class: &ClassName) -> Result<ClassName>;

	fn map_field(&self, owner: &ObjClassName, name: &FieldName, desc: &FieldDescriptor) -> Result<FieldNameAndDesc> {
		let _ = owner;
		Ok(FieldNameAndDesc { name: name.clone(), desc: self.map_field_desc(desc)? })
	}

	fn map_method(&self, owner: &ClassName, name: &MethodName, desc: &MethodDescriptor) -> Result<MethodNameAndDesc> {
		let _ = owner;
		Ok(MethodNameAndDesc { name: name.clone(), desc: self.map_method_desc(desc)? })
	}

	fn map_field_ref(&self, field_ref: &FieldRef) -> Result<FieldRef> {
		let mapped = self.map_field(&field_ref.class, &field_ref.name, &field_ref.desc)?;
		let mapped_owner = self.map_class(&field_ref.class.clone().into())?;
		Ok(FieldRef { class: ObjClassName::new(mapped_owner.into_inner())?, name: mapped.name, desc: mapped.desc })
	}

	fn map_method_ref(&self, method_ref: &MethodRef) -> Result<MethodRef> {
		let mapped = self.map_method(&method_ref.class, &method_ref.name, &method_ref.desc)?;
		Ok(MethodRef { class: self.map_class(&method_ref.class)?, name: mapped.name, desc: mapped.desc })
	}

	fn map_field_desc(&self, desc: &FieldDescriptor) -> Result<FieldDescriptor> {
		let ParsedFieldDescriptor(ty) = desc.as_slice().parse()?;
		Ok(ParsedFieldDescriptor(self.map_type(ty)?).write())
	}

	fn map_method_desc(&self, desc: &MethodDescriptor) -> Result<MethodDescriptor> {
		let parsed = desc.as_slice().parse()?;
		let parameter_descriptors = parsed.parameter_descriptors.into_iter()
			.map(|ty| self.map_type(ty))
			.collect::<Result<Vec<_>>>()?;
		let return_descriptor = parsed.return_descriptor.map(|ty| self.map_type(ty)).transpose()?;
		Ok(ParsedMethodDescriptor { parameter_descriptors, return_descriptor }.write())
	}

	/// Substitutes the embedded class name of a parsed descriptor type, if any.
	fn map_type(&self, ty: Type) -> Result<Type> {
		Ok(match ty {
			Type::Object(class) => Type::Object(self.map_class(&class)?),
			Type::Array(dimensions, array_type) => Type::Array(dimensions, self.map_array_type(array_type)?),
			other => other,
		})
	}

	fn map_array_type(&self, array_type: ArrayType) -> Result<ArrayType> {
		Ok(match array_type {
			ArrayType::Object(class) => ArrayType::Object(self.map_class(&class)?),
			other => other,
		})
	}
}

/// A [`Remapper`] that never changes anything. Useful as a no-op default, or for code that wants
/// to run the remapping machinery over a method without actually renaming anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRemapper;

impl Remapper for IdentityRemapper {
	fn map_class(&self, class: &ClassName) -> Result<ClassName> {
		Ok(class.clone())
	}
}

/// A [`Remapper`] backed by a flat class-name-to-class-name table, falling back to the identity
/// for any class it doesn't mention -- field and method names are passed through unchanged (this
/// stub does no inheritance-aware member renaming; a full remapper would need a
/// [`duke::pool::ClassPool`] to walk supertypes for that).
#[derive(Debug, Default, Clone)]
pub struct SimpleRemapper {
	classes: IndexMap<ClassName, ClassName>,
}

impl SimpleRemapper {
	pub fn new(classes: IndexMap<ClassName, ClassName>) -> SimpleRemapper {
		SimpleRemapper { classes }
	}
}

impl Remapper for SimpleRemapper {
	fn map_class(&self, class: &ClassName) -> Result<ClassName> {
		Ok(self.classes.get(class).cloned().unwrap_or_else(|| class.clone()))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use duke::tree::class::ClassName;
	use duke::tree::field::FieldDescriptor;
	use duke::tree::method::MethodDescriptor;
	use indexmap::IndexMap;
	use super::{IdentityRemapper, Remapper, SimpleRemapper};

	#[test]
	fn identity_remapper_changes_nothing() {
		let remapper = IdentityRemapper;
		let class = ClassName::from("a/b/C");
		assert_eq!(remapper.map_class(&class).unwrap(), class);
	}

	#[test]
	fn simple_remapper_substitutes_known_classes_in_field_descriptors() {
		let mut classes = IndexMap::new();
		classes.insert(ClassName::from("a/Old"), ClassName::from("b/New"));
		let remapper = SimpleRemapper::new(classes);

		let desc = FieldDescriptor::from("La/Old;");
		assert_eq!(remapper.map_field_desc(&desc).unwrap(), FieldDescriptor::from("Lb/New;"));

		let untouched = FieldDescriptor::from("[I");
		assert_eq!(remapper.map_field_desc(&untouched).unwrap(), untouched);

		let array_of_old = FieldDescriptor::from("[La/Old;");
		assert_eq!(remapper.map_field_desc(&array_of_old).unwrap(), FieldDescriptor::from("[Lb/New;"));
	}

	#[test]
	fn simple_remapper_substitutes_known_classes_in_method_descriptors() {
		let mut classes = IndexMap::new();
		classes.insert(ClassName::from("a/Old"), ClassName::from("b/New"));
		let remapper = SimpleRemapper::new(classes);

		let desc = MethodDescriptor::from("(La/Old;I)La/Old;");
		assert_eq!(remapper.map_method_desc(&desc).unwrap(), MethodDescriptor::from("(Lb/New;I)Lb/New;"));

		let void_desc = MethodDescriptor::from("()V");
		assert_eq!(remapper.map_method_desc(&void_desc).unwrap(), void_desc);
	}

	#[test]
	fn simple_remapper_falls_back_to_identity_for_unknown_classes() {
		let remapper = SimpleRemapper::new(IndexMap::new());
		let class = ClassName::from("unknown/Class");
		assert_eq!(remapper.map_class(&class).unwrap(), class);
	}
}
