use std::fmt::{Display, Formatter};
use crate::tree::method::code::Label;
use crate::tree::method::{MethodDescriptor, MethodName};

/// The tagged failures the method analyzer can produce (§7). Unlike the `anyhow::Error` used
/// throughout the rest of this crate for "this byte stream is malformed" style failures, these are
/// a closed set the caller is expected to match on: a single method failing to analyze is not
/// necessarily fatal to whatever is calling [`crate::analysis::analyzer::MethodAnalyzer`].
#[derive(Debug)]
pub enum AnalyzerError {
	/// An instruction refers to a [`Label`] that isn't in the same method's code, or a wide-slot
	/// invariant was broken by the input (an odd number of `LONG`/`DOUBLE` halves, say).
	MalformedCode(String),
	/// `JSR`/`RET` was encountered; these are refused outright (§1).
	UnsupportedOpcode(&'static str),
	/// A byte in the instruction stream didn't decode to any instruction understood by
	/// [`crate::class_io::reader`]. In practice [`crate::class_io::reader::read_class`] already
	/// rejects these earlier, so this should be unreachable by the time a [`crate::tree::method::code::Code`]
	/// reaches the analyzer; it's kept so the analyzer's own error type stays total over the
	/// kinds §7 names.
	UnknownOpcode(u8),
	/// A pop (or a snapshot of a slot) was attempted against an empty stack.
	StackUnderflow,
	/// A `popWide`-style operation found that the top two slots were not a matching wide pair.
	WideMismatch,
	/// Control reached past the last instruction without hitting a terminator
	/// (`{i,l,f,d,a}return`, plain `return`, or `athrow`).
	FallOffEnd,
	/// The host's traversal budget was exhausted analyzing this method.
	AnalysisFailed { method: MethodName, descriptor: MethodDescriptor, max_stack: u16 },
}

impl Display for AnalyzerError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			AnalyzerError::MalformedCode(msg) => write!(f, "malformed code: {msg}"),
			AnalyzerError::UnsupportedOpcode(name) => write!(f, "unsupported opcode {name}"),
			AnalyzerError::UnknownOpcode(op) => write!(f, "unknown opcode 0x{op:02x}"),
			AnalyzerError::StackUnderflow => write!(f, "stack underflow"),
			AnalyzerError::WideMismatch => write!(f, "wide slot mismatch"),
			AnalyzerError::FallOffEnd => write!(f, "control fell off the end of the method"),
			AnalyzerError::AnalysisFailed { method, descriptor, max_stack } =>
				write!(f, "analysis of {method}{descriptor} failed (declared max_stack = {max_stack})"),
		}
	}
}

impl std::error::Error for AnalyzerError {}

/// Helper used by a few call sites to turn a missing label lookup into a [`AnalyzerError::MalformedCode`].
pub(crate) fn label_not_found(label: Label) -> AnalyzerError {
	AnalyzerError::MalformedCode(format!("label {label:?} is not in this method's code"))
}
