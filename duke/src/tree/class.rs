use std::fmt::{Debug, Display, Formatter};
use anyhow::bail;
use java_string::{JavaStr, JavaString};
use crate::macros::make_string_str_like;
use crate::tree::attribute::Attribute;
use crate::tree::field::Field;
use crate::tree::method::{Method, MethodNameAndDesc};
use crate::tree::version::Version;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
	pub version: Version,
	pub access: ClassAccess,
	pub name: ClassName,
	pub super_class: Option<ClassName>,
	pub interfaces: Vec<ClassName>,

	pub fields: Vec<Field>,
	pub methods: Vec<Method>,

	pub has_deprecated_attribute: bool,
	pub has_synthetic_attribute: bool,

	pub inner_classes: Option<Vec<InnerClass>>,
	pub enclosing_method: Option<EnclosingMethod>,
	pub signature: Option<ClassSignature>,

	pub source_file: Option<JavaString>,
	pub source_debug_extension: Option<JavaString>,

	pub nest_host_class: Option<ClassName>,
	pub nest_members: Option<Vec<ClassName>>,
	pub permitted_subclasses: Option<Vec<ClassName>>,

	pub attributes: Vec<Attribute>,
}

impl ClassFile {
	pub fn new(version: Version, access: ClassAccess, name: ClassName, super_class: Option<ClassName>, interfaces: Vec<ClassName>) -> ClassFile {
		ClassFile {
			version,
			access,
			name,
			super_class,
			interfaces,

			fields: Vec::new(),
			methods: Vec::new(),

			has_deprecated_attribute: false,
			has_synthetic_attribute: false,

			inner_classes: None,
			enclosing_method: None,
			signature: None,

			source_file: None,
			source_debug_extension: None,

			nest_host_class: None,
			nest_members: None,
			permitted_subclasses: None,

			attributes: Vec::new(),
		}
	}

	/// Looks up a method by name and descriptor.
	pub fn get_method(&self, name_and_desc: &MethodNameAndDesc) -> Option<&Method> {
		self.methods.iter()
			.find(|method| method.name == name_and_desc.name && method.descriptor == name_and_desc.desc)
	}
}

/// Represents the access flags a class can have.
///
/// Take a look at the [Java Virtual Machine Specification](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.1-200-E.1), for
/// the meanings of these fields, and what combinations are legal and which not.
#[derive(Copy, Clone, Default, PartialEq)]
pub struct ClassAccess {
	pub is_public: bool,
	pub is_final: bool,
	pub is_super: bool,
	pub is_interface: bool,
	pub is_abstract: bool,
	pub is_synthetic: bool,
	pub is_annotation: bool,
	pub is_enum: bool,
	pub is_module: bool,
}

impl Debug for ClassAccess {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("ClassAccess { ")?;
		if self.is_public     { f.write_str("public ")?; }
		if self.is_final      { f.write_str("final ")?; }
		if self.is_super      { f.write_str("super ")?; }
		if self.is_interface  { f.write_str("interface ")?; }
		if self.is_abstract   { f.write_str("abstract ")?; }
		if self.is_synthetic  { f.write_str("synthetic ")?; }
		if self.is_annotation { f.write_str("annotation ")?; }
		if self.is_enum       { f.write_str("enum ")?; }
		if self.is_module     { f.write_str("module ")?; }
		f.write_str("}")
	}
}

/// Interprets an `u16` as the `access_flags` item of the `ClassFile` structure of the Java Virtual Machine Specification.
impl From<u16> for ClassAccess {
	fn from(value: u16) -> Self {
		ClassAccess {
			is_public:     value & 0x0001 != 0,
			is_final:      value & 0x0010 != 0,
			is_super:      value & 0x0020 != 0,
			is_interface:  value & 0x0200 != 0,
			is_abstract:   value & 0x0400 != 0,
			is_synthetic:  value & 0x1000 != 0,
			is_annotation: value & 0x2000 != 0,
			is_enum:       value & 0x4000 != 0,
			is_module:     value & 0x8000 != 0,
		}
	}
}

/// Creates an `u16` according to the `access_flags` item of the `ClassFile` structure of the Java Virtual Machine Specification.
impl From<ClassAccess> for u16 {
	fn from(value: ClassAccess) -> Self {
		(if value.is_public     { 0x0001 } else { 0 }) |
		(if value.is_final      { 0x0010 } else { 0 }) |
		(if value.is_super      { 0x0020 } else { 0 }) |
		(if value.is_interface  { 0x0200 } else { 0 }) |
		(if value.is_abstract   { 0x0400 } else { 0 }) |
		(if value.is_synthetic  { 0x1000 } else { 0 }) |
		(if value.is_annotation { 0x2000 } else { 0 }) |
		(if value.is_enum       { 0x4000 } else { 0 }) |
		(if value.is_module     { 0x8000 } else { 0 })
	}
}

make_string_str_like!(
	/// Represents a class name. The class name uses [internal binary names](https://docs.oracle.com/javase/specs/jvms/se22/html/jvms-4.html#jvms-4.2.1),
	/// i.e. with complete path written out and using slashes. May also be an array descriptor,
	/// such as `[[[D` or `[Ljava/lang/String;`.
	///
	/// # Examples
	/// The java class `java.lang.Thread` would get:
	/// ```
	/// use duke::tree::class::ClassName;
	/// let java_lang_thread = ClassName::from("java/lang/Thread");
	/// ```
	/// Note that there's an associated constant holding the name of the `java.lang.Object` class:
	/// ```
	/// use duke::tree::class::ClassName;
	/// let java_lang_object = ClassName::JAVA_LANG_OBJECT.clone();
	/// assert_eq!(java_lang_object, ClassName::from("java/lang/Object"));
	/// ```
	pub ClassName(JavaString);
	/// A [`ClassName`] slice.
	pub ClassNameSlice(JavaStr);
	is_valid(s) = if crate::tree::names::is_valid_class_name(s) {
		Ok(())
	} else {
		bail!("invalid class name: must be either array field descriptor; or must consist out of `/` separated non-empty parts, and not contain any of `.`, `;`, `[`")
	};
);

impl ClassName {
	/// A constant holding the class name of `Object`.
	pub const JAVA_LANG_OBJECT: &'static ClassNameSlice = unsafe { ClassNameSlice::from_inner_unchecked(JavaStr::from_str("java/lang/Object")) };

	pub fn get_simple_name(&self) -> &JavaStr {
		let s = self.as_inner();
		s.rsplit_once('/')
			.map_or(s, |(_, simple)| simple)
	}

	/// Whether this class name denotes an array type (starts with `[`).
	pub fn is_array(&self) -> bool {
		self.as_inner().chars().next().is_some_and(|c| c == '[')
	}
}

impl Display for ClassName {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self.as_slice(), f)
	}
}
impl Display for ClassNameSlice {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_inner())
	}
}

make_string_str_like!(
	/// A [`ClassName`] that's known to not be an array type.
	pub ObjClassName(JavaString);
	/// An [`ObjClassName`] slice.
	pub ObjClassNameSlice(JavaStr);
	is_valid(s) = if crate::tree::names::is_valid_class_name(s) && !s.chars().next().is_some_and(|c| c == '[') {
		Ok(())
	} else {
		bail!("invalid object class name: must not start with `[`, and must consist out of `/` separated non-empty parts, and not contain any of `.`, `;`, `[`")
	};
);

impl Display for ObjClassName {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self.as_slice(), f)
	}
}
impl Display for ObjClassNameSlice {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_inner())
	}
}

impl From<ObjClassName> for ClassName {
	fn from(value: ObjClassName) -> Self {
		// SAFETY: every valid object class name is also a valid class name.
		unsafe { ClassName::from_inner_unchecked(value.into_inner()) }
	}
}

make_string_str_like!(
	/// A [`ClassName`] that's known to be an array type.
	pub ArrClassName(JavaString);
	/// An [`ArrClassName`] slice.
	pub ArrClassNameSlice(JavaStr);
	is_valid(s) = if s.chars().next().is_some_and(|c| c == '[') {
		Ok(())
	} else {
		bail!("invalid array class name: must start with `[`")
	};
);

impl Display for ArrClassName {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self.as_slice(), f)
	}
}
impl Display for ArrClassNameSlice {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_inner())
	}
}

impl From<ArrClassName> for ClassName {
	fn from(value: ArrClassName) -> Self {
		// SAFETY: every valid array class name is also a valid class name.
		unsafe { ClassName::from_inner_unchecked(value.into_inner()) }
	}
}

make_string_str_like!(
	/// Represents a class signature, from a generic such as `Foo<T extends Bar>`.
	pub ClassSignature(JavaString);
	pub ClassSignatureSlice(JavaStr);
	is_valid(__) = Ok(()); // TODO: signature format is even more complicated
);

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClass {
	pub inner_class: ClassName,
	pub outer_class: Option<ClassName>,
	pub inner_name: Option<JavaString>,
	pub flags: InnerClassFlags,
}

#[derive(Copy, Clone, PartialEq)]
pub struct InnerClassFlags {
	pub is_public: bool,
	pub is_private: bool,
	pub is_protected: bool,
	pub is_static: bool,
	pub is_final: bool,
	pub is_interface: bool,
	pub is_abstract: bool,
	pub is_synthetic: bool,
	pub is_annotation: bool,
	pub is_enum: bool,
}

impl Debug for InnerClassFlags {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("InnerClassFlags { ")?;
		if self.is_public     { f.write_str("public ")?; }
		if self.is_private    { f.write_str("private ")?; }
		if self.is_protected  { f.write_str("protected ")?; }
		if self.is_static     { f.write_str("static ")?; }
		if self.is_final      { f.write_str("final ")?; }
		if self.is_interface  { f.write_str("interface ")?; }
		if self.is_abstract   { f.write_str("abstract ")?; }
		if self.is_synthetic  { f.write_str("synthetic ")?; }
		if self.is_annotation { f.write_str("annotation ")?; }
		if self.is_enum       { f.write_str("enum ")?; }
		f.write_str("}")
	}
}

impl From<u16> for InnerClassFlags {
	fn from(value: u16) -> Self {
		InnerClassFlags {
			is_public:     value & 0x0001 != 0,
			is_private:    value & 0x0002 != 0,
			is_protected:  value & 0x0004 != 0,
			is_static:     value & 0x0008 != 0,
			is_final:      value & 0x0010 != 0,
			is_interface:  value & 0x0200 != 0,
			is_abstract:   value & 0x0400 != 0,
			is_synthetic:  value & 0x1000 != 0,
			is_annotation: value & 0x2000 != 0,
			is_enum:       value & 0x4000 != 0,
		}
	}
}

impl From<InnerClassFlags> for u16 {
	fn from(value: InnerClassFlags) -> Self {
		(if value.is_public     { 0x0001 } else { 0 }) |
		(if value.is_private    { 0x0002 } else { 0 }) |
		(if value.is_protected  { 0x0004 } else { 0 }) |
		(if value.is_static     { 0x0008 } else { 0 }) |
		(if value.is_final      { 0x0010 } else { 0 }) |
		(if value.is_interface  { 0x0200 } else { 0 }) |
		(if value.is_abstract   { 0x0400 } else { 0 }) |
		(if value.is_synthetic  { 0x1000 } else { 0 }) |
		(if value.is_annotation { 0x2000 } else { 0 }) |
		(if value.is_enum       { 0x4000 } else { 0 })
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnclosingMethod {
	pub class: ClassName,
	pub method: Option<MethodNameAndDesc>,
}
