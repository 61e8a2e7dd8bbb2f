use std::fmt::{Debug, Formatter};
use anyhow::Result;
use duke::tree::class::ClassFile;
use crate::storage::BasicFileAttributes;

pub trait JarEntry {
	fn name(&self) -> &str;

	fn attrs(&self) -> BasicFileAttributes;

	/// Classifies this entry: a directory, a `.class` entry decoded through
	/// [`duke::class_io::reader::read_class`], or anything else kept as raw bytes.
	fn to_jar_entry_enum(self) -> Result<JarEntryEnum>;
}

/// The data of an entry of a jar.
///
/// The [`Debug`] implementation doesn't try to print the contents.
pub enum JarEntryEnum {
	Dir,
	Class(ClassFile),
	Other(Vec<u8>),
}

/// [`Debug`] only prints the variant, not the contents.
impl Debug for JarEntryEnum {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		use JarEntryEnum::*;
		match self {
			Dir => write!(f, "Dir"),
			Class(class) => write!(f, "Class({})", class.name),
			Other(data) => write!(f, "Other({} bytes)", data.len()),
		}
	}
}
