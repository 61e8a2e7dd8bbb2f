//! `duke` is a library for working with the bytecode of a single class file: an in-memory,
//! navigable representation of a method's instructions (see [`tree`]), a binary reader that
//! parses that representation out of `.class` bytes (see [`class_io`]), a pool tying multiple
//! parsed classes together with resolved super/sub-type links (see [`pool`]), and an abstract
//! interpreter that walks a method's instructions to produce a typed data-flow graph (see
//! [`analysis`]).
//!
//! Loading classes out of jars and writing classes back to bytes are explicitly out of scope
//! here; see the `dukebox` crate for the former. There is currently no writer, as producing class
//! file bytes is not a goal of this crate.

mod class_constants;
mod macros;

pub mod analysis;
pub mod class_io;
pub mod jstring;
pub mod pool;
pub mod tree;
