use anyhow::Result;
use crate::storage::OpenedJar;

/// Represents a `.jar` in some form.
///
/// This can be in memory, like [`MemJar`][crate::storage::MemJar], or from a file, like
/// [`FileJar`][crate::storage::FileJar].
///
/// You can [`open`][Jar::open] a jar to get to its content. See [`OpenedJar`] for more.
pub trait Jar {
	type Opened<'a>: OpenedJar where Self: 'a;

	/// Opens the jar for reading.
	fn open(&self) -> Result<Self::Opened<'_>>;
}
