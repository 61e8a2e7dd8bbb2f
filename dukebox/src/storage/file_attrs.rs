use zip::DateTime;

/// The file times attribute of a jar entry.
///
/// Use the [`Default`] implementation for having [`None`] everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFileAttributes {
	pub last_modified: Option<DateTime>,
	pub mtime: Option<u32>,
	pub atime: Option<u32>,
	pub ctime: Option<u32>,
}
