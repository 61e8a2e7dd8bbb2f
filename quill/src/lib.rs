//! Remapping: the external collaborator §1 calls "remapper stubs".
//!
//! The analyzer itself never remaps anything -- it only reads the names already present in a
//! method's constant references (§4.1: "analyzer behavior must not depend on resolution
//! succeeding"). This crate exists so a caller that *does* want to remap a [`duke::tree::class::ClassName`]
//! or a method/field reference before or after analysis has a small, shared place to do it,
//! without pulling in a mapping-file format the original spec never asks for.

pub mod remapper;
