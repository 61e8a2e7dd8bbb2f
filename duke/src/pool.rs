//! A [`ClassPool`] collects parsed classes under their names, and resolves the parent/interface
//! links between them into `children`/`implementers` back-references.
//!
//! This is the "reference resolver" and "class/method/field model" component of the analyzer:
//! `Class`/`Method`/`Field` themselves are [`crate::tree`]'s plain value types (so they still
//! round-trip through the binary reader on their own), and this module is what ties many of them
//! together and resolves the named [`ClassRef`][crate::tree::class::ClassName]/
//! [`FieldRef`][crate::tree::field::FieldRef]/[`MethodRef`][crate::tree::method::MethodRef]
//! handles against that collection.

use std::fmt::{Display, Formatter};
use std::ops::Deref;
use indexmap::IndexMap;
use crate::tree::class::{ClassFile, ClassName, ClassNameSlice};
use crate::tree::field::{Field, FieldRef};
use crate::tree::method::{Method, MethodRef};

/// A class, as stored in a [`ClassPool`].
///
/// Derefs to the underlying [`ClassFile`] for convenient field access; carries the back-references
/// ([`Self::children`], [`Self::implementers`]) that [`ClassPool::init`] computes and that aren't
/// part of the on-disk class file format.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
	pub file: ClassFile,
	/// Names of classes in the same pool whose `super_class` is this class. Populated by
	/// [`ClassPool::init`]; empty (not "unknown") before that call.
	pub children: Vec<ClassName>,
	/// Names of classes in the same pool that list this class among their `interfaces`.
	pub implementers: Vec<ClassName>,
}

impl Deref for Class {
	type Target = ClassFile;

	fn deref(&self) -> &ClassFile {
		&self.file
	}
}

/// Failures from the pool-level operations (§7: these "fail fast", unlike a single method's
/// analysis failing only that method).
#[derive(Debug)]
pub enum PoolError {
	/// Adding a class whose name is already present in the pool.
	DuplicateClass(ClassName),
	/// Removing (or otherwise addressing) a class not present in the pool.
	UnknownClass(ClassName),
}

impl Display for PoolError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			PoolError::DuplicateClass(name) => write!(f, "class {name} is already present in this pool"),
			PoolError::UnknownClass(name) => write!(f, "no class {name} in this pool"),
		}
	}
}

impl std::error::Error for PoolError {}

/// A mapping from fully-qualified internal class name to [`Class`].
///
/// Insertion order is preserved (for deterministic output when classes are later re-serialized by
/// a collaborator), but lookups are by name, not position.
///
/// Mutable until [`Self::init`] is called; after that, [`Self::add`]/[`Self::remove`] still work,
/// but leave the subtype graph stale until `init` runs again. `init` itself is idempotent and may
/// be called as many times as needed (e.g. once per batch of additions).
#[derive(Debug, Default)]
pub struct ClassPool {
	classes: IndexMap<ClassName, Class>,
}

impl ClassPool {
	pub fn new() -> ClassPool {
		ClassPool { classes: IndexMap::new() }
	}

	/// Parses `bytes` with [`crate::class_io::reader::read_class`] and adds the result.
	///
	/// Parse failures are structural ([`anyhow::Error`], per §7 "structural failures... abort...
	/// only"); a name collision with an already-present class is the pool-level
	/// [`PoolError::DuplicateClass`].
	pub fn add(&mut self, bytes: &[u8]) -> anyhow::Result<&Class> {
		let file = crate::class_io::reader::read_class(bytes)?;
		Ok(self.add_class(file)?)
	}

	/// Adds an already-parsed class. See [`Self::add`] for the byte-parsing entry point.
	pub fn add_class(&mut self, file: ClassFile) -> Result<&Class, PoolError> {
		if self.classes.contains_key(&file.name) {
			return Err(PoolError::DuplicateClass(file.name));
		}
		let name = file.name.clone();
		log::debug!("adding class {name} to pool");
		self.classes.insert(name.clone(), Class { file, children: Vec::new(), implementers: Vec::new() });
		#[allow(clippy::expect_used)] // just inserted under the same key
		Ok(self.classes.get(&name).expect("just inserted"))
	}

	pub fn remove(&mut self, name: &ClassNameSlice) -> Result<Class, PoolError> {
		self.classes.shift_remove(name)
			.ok_or_else(|| PoolError::UnknownClass(name.to_owned()))
	}

	pub fn get(&self, name: &ClassNameSlice) -> Option<&Class> {
		self.classes.get(name)
	}

	pub fn classes(&self) -> impl Iterator<Item = &Class> {
		self.classes.values()
	}

	/// Resolves every class's `super_class`/`interfaces` against this pool and (re)populates
	/// `children`/`implementers` accordingly. Unresolvable references (classes outside this pool,
	/// e.g. JDK classes) are simply not reflected in any `children`/`implementers` list; callers
	/// must not assume resolution succeeds (§4.1).
	pub fn init(&mut self) {
		for class in self.classes.values_mut() {
			class.children.clear();
			class.implementers.clear();
		}

		let edges: Vec<(ClassName, ClassName)> = self.classes.values()
			.flat_map(|class| {
				let name = class.name.clone();
				let super_class = class.super_class.iter().cloned();
				let interfaces = class.interfaces.iter().cloned();
				super_class.chain(interfaces).map(move |parent| (parent, name.clone()))
			})
			.collect();

		for (parent, child) in edges {
			let Some(parent_class) = self.classes.get_mut(&parent) else { continue };
			let is_interface = parent_class.access.is_interface;
			if is_interface {
				parent_class.implementers.push(child);
			} else {
				parent_class.children.push(child);
			}
			log::trace!("resolved subtype edge {parent} -> last pushed child/implementer");
		}
	}

	/// Resolves a [`FieldRef`] to the class and field it refers to. Returns `None` if the owner
	/// isn't in this pool, or has no field by that name and descriptor (e.g. it's inherited, or
	/// the ref targets an external runtime class).
	pub fn resolve_field<'a>(&'a self, r: &FieldRef) -> Option<(&'a Class, &'a Field)> {
		let owner: ClassName = r.class.clone().into();
		let class = self.classes.get(owner.as_slice())?;
		let field = class.fields.iter().find(|f| f.name == r.name && f.descriptor == r.desc)?;
		Some((class, field))
	}

	/// Resolves a [`MethodRef`] to the class and method it refers to, walking up `super_class`
	/// when the owner itself doesn't declare the method (inherited methods resolve to the
	/// declaring class, as the JVM's resolution algorithm does).
	pub fn resolve_method<'a>(&'a self, r: &MethodRef) -> Option<(&'a Class, &'a Method)> {
		let mut current = self.classes.get(&r.class)?;
		loop {
			if let Some(method) = current.methods.iter().find(|m| m.name == r.name && m.descriptor == r.desc) {
				return Some((current, method));
			}
			current = self.classes.get(current.super_class.as_ref()?)?;
		}
	}

	/// The nearest common ancestor of `a` and `b` by walking `super_class` chains.
	///
	/// Falls back to `java/lang/Object` whenever either class (or one of its ancestors) isn't
	/// resolvable in this pool, matching the rest of the resolver's "unresolved is not an error"
	/// policy (§4.1) -- a class writer needing a `StackMapTable` common-supertype can't do better
	/// than that without loading the JDK itself, which is explicitly out of scope (§1).
	pub fn common_supertype(&self, a: &ClassNameSlice, b: &ClassNameSlice) -> ClassName {
		if a == b {
			return a.to_owned();
		}

		let ancestors_of = |start: &ClassNameSlice| -> Vec<ClassName> {
			let mut chain = vec![start.to_owned()];
			let mut current = start.to_owned();
			while let Some(class) = self.classes.get(current.as_slice()) {
				match &class.super_class {
					Some(parent) => {
						chain.push(parent.clone());
						current = parent.clone();
					}
					None => break,
				}
			}
			chain
		};

		let a_chain = ancestors_of(a);
		let b_chain = ancestors_of(b);

		for candidate in &a_chain {
			if b_chain.contains(candidate) {
				return candidate.clone();
			}
		}

		ClassName::JAVA_LANG_OBJECT.to_owned()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use crate::tree::class::{ClassAccess, ClassFile, ClassName};
	use crate::tree::version::Version;
	use super::ClassPool;

	fn empty_class(name: &str, super_class: Option<&str>, interfaces: &[&str]) -> ClassFile {
		ClassFile::new(
			Version::V17,
			ClassAccess::default(),
			ClassName::from(name),
			super_class.map(ClassName::from),
			interfaces.iter().map(|i| ClassName::from(*i)).collect(),
		)
	}

	#[test]
	fn duplicate_class_is_rejected() {
		let mut pool = ClassPool::new();
		pool.add_class(empty_class("A", Some("java/lang/Object"), &[])).unwrap();
		assert!(pool.add_class(empty_class("A", Some("java/lang/Object"), &[])).is_err());
	}

	#[test]
	fn unknown_class_remove_is_rejected() {
		let mut pool = ClassPool::new();
		assert!(pool.remove(ClassName::from("Nope").as_slice()).is_err());
	}

	#[test]
	fn init_builds_children_and_implementers() {
		let mut pool = ClassPool::new();
		pool.add_class(empty_class("java/lang/Object", None, &[])).unwrap();
		pool.add_class(empty_class("Base", Some("java/lang/Object"), &["Marker"])).unwrap();
		pool.add_class(empty_class("Marker", Some("java/lang/Object"), &[])).unwrap();
		pool.add_class(empty_class("Derived", Some("Base"), &[])).unwrap();
		pool.init();

		let base = pool.get(ClassName::from("Base").as_slice()).unwrap();
		assert_eq!(base.children, vec![ClassName::from("Derived")]);

		let marker = pool.get(ClassName::from("Marker").as_slice()).unwrap();
		assert_eq!(marker.implementers, vec![ClassName::from("Base")]);
	}

	#[test]
	fn common_supertype_finds_shared_ancestor() {
		let mut pool = ClassPool::new();
		pool.add_class(empty_class("java/lang/Object", None, &[])).unwrap();
		pool.add_class(empty_class("Base", Some("java/lang/Object"), &[])).unwrap();
		pool.add_class(empty_class("Left", Some("Base"), &[])).unwrap();
		pool.add_class(empty_class("Right", Some("Base"), &[])).unwrap();
		pool.init();

		let result = pool.common_supertype(ClassName::from("Left").as_slice(), ClassName::from("Right").as_slice());
		assert_eq!(result, ClassName::from("Base"));
	}

	#[test]
	fn common_supertype_falls_back_to_object_when_unrelated() {
		let mut pool = ClassPool::new();
		pool.add_class(empty_class("A", Some("java/lang/Object"), &[])).unwrap();
		pool.add_class(empty_class("B", Some("java/lang/Object"), &[])).unwrap();
		pool.init();

		let result = pool.common_supertype(ClassName::from("A").as_slice(), ClassName::from("B").as_slice());
		assert_eq!(result, ClassName::JAVA_LANG_OBJECT.to_owned());
	}
}
