//! The jar-reading external collaborator (§6): opens a zip/jar, yields its raw entries, and
//! decodes `.class` entries through [`duke::class_io::reader::read_class`] into
//! [`duke::tree::class::ClassFile`].
//!
//! Writing class files back out is a non-goal of `duke` (§1), so this crate only round-trips the
//! non-`.class` entries of a jar byte-for-byte and never attempts to re-encode a `ClassFile`.

pub mod storage;

use anyhow::Result;
use duke::pool::ClassPool;
use storage::{Jar, OpenedJar};

/// Opens `jar` and decodes every `.class` entry into `pool`, logging progress the way
/// [`ClassPool::add_class`] already does.
///
/// This is the main entry point a caller (such as `duke-cli`) uses to go from "a jar on disk" to
/// "a pool ready for [`duke::analysis::analyzer::MethodAnalyzer::analyze`]".
pub fn load_classes_into(jar: &impl Jar, pool: &mut ClassPool) -> Result<()> {
	let mut opened = jar.open()?;
	opened.load_classes_into(pool)
}
