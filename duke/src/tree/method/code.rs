use anyhow::{bail, Result};
use java_string::{JavaStr, JavaString};
use crate::class_constants::atype;
use crate::macros::{make_display, make_string_str_like};
use crate::tree::attribute::Attribute;
use crate::tree::class::ClassName;
use crate::tree::field::{FieldDescriptor, FieldName, FieldRef, FieldSignature};
use crate::tree::method::{MethodDescriptor, MethodName, MethodRef};

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionListEntry {
	pub label: Option<Label>,
	pub frame: Option<StackMapData>,
	pub instruction: Instruction,
}

/// Represents the code of a method.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Code {
	pub max_stack: Option<u16>,
	pub max_locals: Option<u16>,

	pub instructions: Vec<InstructionListEntry>,
	pub exception_table: Vec<Exception>,
	pub last_label: Option<Label>,

	pub line_numbers: Option<Vec<(Label, u16)>>,
	pub local_variables: Option<Vec<Lv>>,

	pub attributes: Vec<Attribute>,
}

impl Code {
	/// The number of instruction slots (arguments plus, for non-static methods, an implicit `this`)
	/// the method's parameters occupy in the local variable table, not accounting for `max_locals`.
	pub fn entry_point_label(&self) -> Option<Label> {
		self.instructions.first().and_then(|entry| entry.label)
	}
}

/// A frame of verification type info attached to an instruction, as used by the `StackMapTable`
/// attribute (JVMS 4.7.4) to describe the expected operand stack and local variable contents at
/// that instruction without having to run a full type-inference pass during verification.
#[derive(Debug, Clone, PartialEq)]
pub struct StackMapData {
	pub locals: Vec<VerificationType>,
	pub stack: Vec<VerificationType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationType {
	Top,
	Integer,
	Float,
	Double,
	Long,
	Null,
	UninitializedThis,
	Object(ClassName),
	/// Refers to the `new` instruction (by its [`Label`]) that produced the uninitialized value.
	Uninitialized(Label),
}

make_string_str_like!(
	pub LocalVariableName(JavaString);
	pub LocalVariableNameSlice(JavaStr);
);
make_display!(LocalVariableName, LocalVariableNameSlice);

impl LocalVariableName {
	fn check_valid(inner: &JavaStr) -> Result<()> {
		if crate::tree::names::is_valid_unqualified_name(inner) {
			Ok(())
		} else {
			bail!("invalid local variable name: must be non-empty and not contain any of `.`, `;`, `[` and `/`")
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
	pub start: Label,
	pub end: Label,
	pub handler: Label,
	pub catch: Option<ClassName>,
}

/// Represents an index of a local variable.
///
/// If the local variable is of type `double` or `long`, it also occupies
/// the [`LvIndex`] with `index = index + 1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LvIndex {
	pub index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lv {
	pub range: LabelRange,
	pub name: LocalVariableName,
	pub descriptor: Option<FieldDescriptor>,
	pub signature: Option<FieldSignature>,
	pub index: LvIndex,
}

/// Represents a bytecode offset of an opcode using a method-local id.
///
/// Since the `code` array must have a size that fits in an `u16`, and each bytecode offset can at maximum be an instruction,
/// a label id also fits in an `u16`.
///
/// For example, take this piece of bytecode:
/// ```txt,ignore
/// 0x19 0x03 0xb1
/// ```
/// Javap would output this as (`0x19` is `aload`, and `0xb0` is `return`):
/// ```txt,ignore
/// 0: aload 3
/// 2: return
/// ```
/// Here only `0` and `2` are valid bytecode offsets, `1` would be the offset of the operand of the `aload` instruction.
/// Therefore, there can only be labels for these two offsets.
///
/// Note that the length of the bytecode is also a "valid" bytecode offset (as it's used in various places).
/// See also [`CodeVisitor::visit_last_label`].
///
/// The id stored in the `id` field does **not** correspond to the bytecode offset in any direct way. When reading or writing,
/// that id is used to uniquely identify a bytecode offset.
///
/// Also note that the implementation of [`Eq`] doesn't consider that the structure is important and not the actual value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
	pub(crate) id: u16,
}

/// Represents a range of bytecode offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRange {
	/// The start label, inclusive.
	pub(crate) start: Label,
	/// The end label, exclusive.
	pub(crate) end: Label,
}

/// Represents an instruction of the JVM.
///
/// Each instruction can either:
/// - hold no additional data, like [`Instruction::Nop`],
/// - hold some immediate value, like [`Instruction::BiPush`],
/// - hold a [local variable index][LvIndex], like [`Instruction::ILoad`] (note that this also represents the `iload_0` instruction for example),
/// - hold a [`Label`] for jumps, like [`Instruction::IfEq`],
/// - or hold other data the instruction needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
	Nop,
	AConstNull,
	IConstM1, IConst0, IConst1, IConst2, IConst3, IConst4, IConst5,
	LConst0, LConst1,
	FConst0, FConst1, FConst2,
	DConst0, DConst1,
	BiPush(i8),
	SiPush(i16),
	Ldc(Loadable),
	ILoad(LvIndex), LLoad(LvIndex), FLoad(LvIndex), DLoad(LvIndex), ALoad(LvIndex),
	IALoad, LALoad, FALoad, DALoad, AALoad, BALoad, CALoad, SALoad,
	IStore(LvIndex), LStore(LvIndex), FStore(LvIndex), DStore(LvIndex), AStore(LvIndex),
	IAStore, LAStore, FAStore, DAStore, AAStore, BAStore, CAStore, SAStore,
	Pop, Pop2,
	Dup, DupX1, DupX2,
	Dup2, Dup2X1, Dup2X2,
	Swap,
	IAdd, LAdd, FAdd, DAdd,
	ISub, LSub, FSub, DSub,
	IMul, LMul, FMul, DMul,
	IDiv, LDiv, FDiv, DDiv,
	IRem, LRem, FRem, DRem,
	INeg, LNeg, FNeg, DNeg,
	IShl, LShl,
	IShr, LShr,
	IUShr, LUShr,
	IAnd, LAnd,
	IOr, LOr,
	IXor, LXor,
	IInc(LvIndex, i16),
	I2L, I2F, I2D,
	L2I, L2F, L2D,
	F2I, F2L, F2D,
	D2I, D2L, D2F,
	I2B, I2C, I2S,
	LCmp,
	FCmpL, FCmpG,
	DCmpL, DCmpG,
	IfEq(Label), IfNe(Label), IfLt(Label), IfGe(Label), IfGt(Label), IfLe(Label),
	IfICmpEq(Label), IfICmpNe(Label), IfICmpLt(Label), IfICmpGe(Label), IfICmpGt(Label), IfICmpLe(Label),
	IfACmpEq(Label), IfACmpNe(Label),
	Goto(Label),
	Jsr(Label),
	Ret(LvIndex),
	//TODO: consider putting a Box<...> here [TableSwitch, and LookupSwitch] to make the enum smaller
	TableSwitch {
		default: Label,
		low: i32,
		high: i32,
		table: Vec<Label>,
	},
	LookupSwitch {
		default: Label,
		/// Note that these must be ordered.
		pairs: Vec<(i32, Label)>
	},
	IReturn, LReturn, FReturn, DReturn, AReturn,
	Return,
	GetStatic(FieldRef),
	PutStatic(FieldRef),
	GetField(FieldRef),
	PutField(FieldRef),
	InvokeVirtual(MethodRef),
	/// The bool is `true` iff it's on an interface, so if it referenced an `InterfaceMethodRef` constant pool entry.
	InvokeSpecial(MethodRef, bool),
	/// The bool is `true` iff it's on an interface, so if it referenced an `InterfaceMethodRef` constant pool entry.
	InvokeStatic(MethodRef, bool),
	/// `invokeinterface` also uses an `InterfaceMethodRef` constant pool entry.
	// TODO: better docs here in general
	InvokeInterface(MethodRef),
	InvokeDynamic(InvokeDynamic),
	New(ClassName),
	NewArray(ArrayType),
	ANewArray(ClassName),
	ArrayLength,
	AThrow,
	CheckCast(ClassName),
	InstanceOf(ClassName),
	MonitorEnter, MonitorExit,
	MultiANewArray(ClassName, u8),
	IfNull(Label), IfNonNull(Label),
}

impl Instruction {
	/// The JVMS mnemonic for this instruction's opcode, e.g. `"iconst_0"` or `"invokevirtual"`.
	pub fn mnemonic(&self) -> &'static str {
		match self {
			Instruction::Nop => "nop",
			Instruction::AConstNull => "aconst_null",
			Instruction::IConstM1 => "iconst_m1",
			Instruction::IConst0 => "iconst_0", Instruction::IConst1 => "iconst_1",
			Instruction::IConst2 => "iconst_2", Instruction::IConst3 => "iconst_3",
			Instruction::IConst4 => "iconst_4", Instruction::IConst5 => "iconst_5",
			Instruction::LConst0 => "lconst_0", Instruction::LConst1 => "lconst_1",
			Instruction::FConst0 => "fconst_0", Instruction::FConst1 => "fconst_1", Instruction::FConst2 => "fconst_2",
			Instruction::DConst0 => "dconst_0", Instruction::DConst1 => "dconst_1",
			Instruction::BiPush(_) => "bipush",
			Instruction::SiPush(_) => "sipush",
			Instruction::Ldc(_) => "ldc",
			Instruction::ILoad(_) => "iload", Instruction::LLoad(_) => "lload",
			Instruction::FLoad(_) => "fload", Instruction::DLoad(_) => "dload", Instruction::ALoad(_) => "aload",
			Instruction::IALoad => "iaload", Instruction::LALoad => "laload",
			Instruction::FALoad => "faload", Instruction::DALoad => "daload", Instruction::AALoad => "aaload",
			Instruction::BALoad => "baload", Instruction::CALoad => "caload", Instruction::SALoad => "saload",
			Instruction::IStore(_) => "istore", Instruction::LStore(_) => "lstore",
			Instruction::FStore(_) => "fstore", Instruction::DStore(_) => "dstore", Instruction::AStore(_) => "astore",
			Instruction::IAStore => "iastore", Instruction::LAStore => "lastore",
			Instruction::FAStore => "fastore", Instruction::DAStore => "dastore", Instruction::AAStore => "aastore",
			Instruction::BAStore => "bastore", Instruction::CAStore => "castore", Instruction::SAStore => "sastore",
			Instruction::Pop => "pop", Instruction::Pop2 => "pop2",
			Instruction::Dup => "dup", Instruction::DupX1 => "dup_x1", Instruction::DupX2 => "dup_x2",
			Instruction::Dup2 => "dup2", Instruction::Dup2X1 => "dup2_x1", Instruction::Dup2X2 => "dup2_x2",
			Instruction::Swap => "swap",
			Instruction::IAdd => "iadd", Instruction::LAdd => "ladd", Instruction::FAdd => "fadd", Instruction::DAdd => "dadd",
			Instruction::ISub => "isub", Instruction::LSub => "lsub", Instruction::FSub => "fsub", Instruction::DSub => "dsub",
			Instruction::IMul => "imul", Instruction::LMul => "lmul", Instruction::FMul => "fmul", Instruction::DMul => "dmul",
			Instruction::IDiv => "idiv", Instruction::LDiv => "ldiv", Instruction::FDiv => "fdiv", Instruction::DDiv => "ddiv",
			Instruction::IRem => "irem", Instruction::LRem => "lrem", Instruction::FRem => "frem", Instruction::DRem => "drem",
			Instruction::INeg => "ineg", Instruction::LNeg => "lneg", Instruction::FNeg => "fneg", Instruction::DNeg => "dneg",
			Instruction::IShl => "ishl", Instruction::LShl => "lshl",
			Instruction::IShr => "ishr", Instruction::LShr => "lshr",
			Instruction::IUShr => "iushr", Instruction::LUShr => "lushr",
			Instruction::IAnd => "iand", Instruction::LAnd => "land",
			Instruction::IOr => "ior", Instruction::LOr => "lor",
			Instruction::IXor => "ixor", Instruction::LXor => "lxor",
			Instruction::IInc(_, _) => "iinc",
			Instruction::I2L => "i2l", Instruction::I2F => "i2f", Instruction::I2D => "i2d",
			Instruction::L2I => "l2i", Instruction::L2F => "l2f", Instruction::L2D => "l2d",
			Instruction::F2I => "f2i", Instruction::F2L => "f2l", Instruction::F2D => "f2d",
			Instruction::D2I => "d2i", Instruction::D2L => "d2l", Instruction::D2F => "d2f",
			Instruction::I2B => "i2b", Instruction::I2C => "i2c", Instruction::I2S => "i2s",
			Instruction::LCmp => "lcmp",
			Instruction::FCmpL => "fcmpl", Instruction::FCmpG => "fcmpg",
			Instruction::DCmpL => "dcmpl", Instruction::DCmpG => "dcmpg",
			Instruction::IfEq(_) => "ifeq", Instruction::IfNe(_) => "ifne",
			Instruction::IfLt(_) => "iflt", Instruction::IfGe(_) => "ifge",
			Instruction::IfGt(_) => "ifgt", Instruction::IfLe(_) => "ifle",
			Instruction::IfICmpEq(_) => "if_icmpeq", Instruction::IfICmpNe(_) => "if_icmpne",
			Instruction::IfICmpLt(_) => "if_icmplt", Instruction::IfICmpGe(_) => "if_icmpge",
			Instruction::IfICmpGt(_) => "if_icmpgt", Instruction::IfICmpLe(_) => "if_icmple",
			Instruction::IfACmpEq(_) => "if_acmpeq", Instruction::IfACmpNe(_) => "if_acmpne",
			Instruction::Goto(_) => "goto",
			Instruction::Jsr(_) => "jsr",
			Instruction::Ret(_) => "ret",
			Instruction::TableSwitch { .. } => "tableswitch",
			Instruction::LookupSwitch { .. } => "lookupswitch",
			Instruction::IReturn => "ireturn", Instruction::LReturn => "lreturn",
			Instruction::FReturn => "freturn", Instruction::DReturn => "dreturn", Instruction::AReturn => "areturn",
			Instruction::Return => "return",
			Instruction::GetStatic(_) => "getstatic", Instruction::PutStatic(_) => "putstatic",
			Instruction::GetField(_) => "getfield", Instruction::PutField(_) => "putfield",
			Instruction::InvokeVirtual(_) => "invokevirtual",
			Instruction::InvokeSpecial(_, _) => "invokespecial",
			Instruction::InvokeStatic(_, _) => "invokestatic",
			Instruction::InvokeInterface(_) => "invokeinterface",
			Instruction::InvokeDynamic(_) => "invokedynamic",
			Instruction::New(_) => "new",
			Instruction::NewArray(_) => "newarray",
			Instruction::ANewArray(_) => "anewarray",
			Instruction::ArrayLength => "arraylength",
			Instruction::AThrow => "athrow",
			Instruction::CheckCast(_) => "checkcast",
			Instruction::InstanceOf(_) => "instanceof",
			Instruction::MonitorEnter => "monitorenter", Instruction::MonitorExit => "monitorexit",
			Instruction::MultiANewArray(_, _) => "multianewarray",
			Instruction::IfNull(_) => "ifnull", Instruction::IfNonNull(_) => "ifnonnull",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Loadable {
	Integer(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	Class(ClassName),
	String(JavaString),
	MethodHandle(Handle),
	MethodType(MethodDescriptor),
	Dynamic(ConstantDynamic),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Handle {
	GetField(FieldRef),
	GetStatic(FieldRef),
	PutField(FieldRef),
	PutStatic(FieldRef),
	// TODO: document what is what (which here is interface_method_ref and which is just method_ref)
	InvokeVirtual(MethodRef),
	InvokeStatic(MethodRef, bool),
	InvokeSpecial(MethodRef, bool),
	NewInvokeSpecial(MethodRef),
	InvokeInterface(MethodRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDynamic {
	pub name: FieldName,
	pub descriptor: FieldDescriptor,
	pub handle: Handle,
	pub arguments: Vec<Loadable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeDynamic {
	pub name: MethodName,
	pub descriptor: MethodDescriptor,
	pub handle: Handle,
	pub arguments: Vec<Loadable>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ArrayType {
	Boolean,
	Char,
	Float,
	Double,
	Byte,
	Short,
	Int,
	Long,
}

impl ArrayType {
	pub(crate) fn from_atype(atype: u8) -> Result<ArrayType> {
		match atype {
			atype::T_BOOLEAN => Ok(ArrayType::Boolean),
			atype::T_CHAR    => Ok(ArrayType::Char),
			atype::T_FLOAT   => Ok(ArrayType::Float),
			atype::T_DOUBLE  => Ok(ArrayType::Double),
			atype::T_BYTE    => Ok(ArrayType::Byte),
			atype::T_SHORT   => Ok(ArrayType::Short),
			atype::T_INT     => Ok(ArrayType::Int),
			atype::T_LONG    => Ok(ArrayType::Long),
			_ => bail!("unknown array type {atype:x}"),
		}
	}

	pub(crate) fn to_atype(self) -> u8 {
		match self {
			ArrayType::Boolean => atype::T_BOOLEAN,
			ArrayType::Char    => atype::T_CHAR,
			ArrayType::Float   => atype::T_FLOAT,
			ArrayType::Double  => atype::T_DOUBLE,
			ArrayType::Byte    => atype::T_BYTE,
			ArrayType::Short   => atype::T_SHORT,
			ArrayType::Int     => atype::T_INT,
			ArrayType::Long    => atype::T_LONG,
		}
	}
}
