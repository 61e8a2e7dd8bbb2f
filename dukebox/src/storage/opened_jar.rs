use anyhow::Result;
use duke::pool::ClassPool;
use crate::storage::{JarEntry, JarEntryEnum};

/// Represents an opened jar.
///
/// An opened jar can be read.
///
/// Each opened jar has an [`EntryKey`][OpenedJar::EntryKey] type (most implementations use `usize`)
/// that's used for uniquely identifying each entry. You can retrieve an iterator over these entry
/// keys with [`entry_keys`][OpenedJar::entry_keys], and use the entry key to get a [`JarEntry`] with
/// the [`by_entry_key`][OpenedJar::by_entry_key] method.
///
/// With the [`names`][OpenedJar::names] and [`by_name`][OpenedJar::by_name] methods, an opened jar
/// supports lookup by file name. Note that [`names`][OpenedJar::names] also returns the corresponding
/// [`EntryKey`][OpenedJar::EntryKey]s, which avoids slow string lookup.
pub trait OpenedJar {
	type EntryKey: Copy;

	type Entry<'a>: JarEntry where Self: 'a;

	fn entry_keys(&self) -> impl Iterator<Item=Self::EntryKey> + 'static;

	fn by_entry_key(&mut self, key: Self::EntryKey) -> Result<Self::Entry<'_>>;

	fn names(&self) -> impl Iterator<Item=(Self::EntryKey, &'_ str)>;

	fn by_name(&mut self, name: &str) -> Result<Option<Self::Entry<'_>>>;

	/// Decodes every `.class` entry and adds it to `pool`, leaving any other entry untouched.
	fn load_classes_into(&mut self, pool: &mut ClassPool) -> Result<()> {
		for key in self.entry_keys() {
			let entry = self.by_entry_key(key)?;
			if let JarEntryEnum::Class(class) = entry.to_jar_entry_enum()? {
				pool.add_class(class)?;
			}
		}
		Ok(())
	}
}
