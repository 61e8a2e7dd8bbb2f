use std::fmt::{Debug, Formatter};
use std::io::Cursor;
use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;
use crate::storage::Jar;

/// An in-memory jar, optionally carrying an arbitrary name for diagnostics.
#[derive(Clone)]
pub struct MemJar {
	pub name: Option<String>,
	/// The data for the jar. This is read as a zip archive.
	pub data: Vec<u8>,
}

impl MemJar {
	pub fn new(name: String, data: Vec<u8>) -> MemJar {
		MemJar { name: Some(name), data }
	}

	pub fn new_unnamed(data: Vec<u8>) -> MemJar {
		MemJar { name: None, data }
	}
}

/// [`Debug`] only prints the name (if any) and size, not the actual data.
impl Debug for MemJar {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let mut d = f.debug_struct("MemJar");
		if let Some(name) = &self.name {
			d.field("name", name);
		}
		d.field("size", &self.data.len()).finish_non_exhaustive()
	}
}

impl Jar for MemJar {
	type Opened<'a> = ZipArchive<Cursor<&'a Vec<u8>>> where Self: 'a;

	fn open(&self) -> Result<Self::Opened<'_>> {
		ZipArchive::new(Cursor::new(&self.data))
			.with_context(|| anyhow!("failed to read zip archive from {self:?}"))
	}
}
