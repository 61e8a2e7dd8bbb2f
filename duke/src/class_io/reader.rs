use anyhow::{anyhow, bail, Context, Result};
use java_string::{JavaStr, JavaString};
use crate::class_constants::{atype, attribute, opcode, pool, MAGIC};
use crate::class_io::labels::Labels;
use crate::jstring::from_vec_to_string;
use crate::tree::attribute::Attribute;
use crate::tree::class::{ClassAccess, ClassFile, ClassName, ClassSignature, EnclosingMethod, InnerClass, InnerClassFlags, ObjClassName};
use crate::tree::descriptor::{ParsedMethodDescriptor, ReturnDescriptor};
use crate::tree::field::{ConstantValue, Field, FieldAccess, FieldDescriptor, FieldName, FieldRef, FieldSignature};
use crate::tree::method::{Method, MethodAccess, MethodDescriptor, MethodName, MethodParameter, MethodRef, MethodSignature, ParameterFlags, ParameterName};
use crate::tree::method::code::{ArrayType, Code, ConstantDynamic, Exception, Handle, Instruction, InstructionListEntry, InvokeDynamic, Loadable, Lv, LvIndex, LocalVariableName};
use crate::tree::version::Version;

struct Cursor<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn new(data: &'a [u8]) -> Cursor<'a> {
		Cursor { data, pos: 0 }
	}

	fn bytes_left(&self) -> usize {
		self.data.len() - self.pos
	}

	fn take(&mut self, n: usize) -> Result<&'a [u8]> {
		if self.bytes_left() < n {
			bail!("unexpected end of class file data");
		}
		let slice = &self.data[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	fn u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}
	fn i8(&mut self) -> Result<i8> {
		Ok(self.u8()? as i8)
	}
	fn u16(&mut self) -> Result<u16> {
		let b = self.take(2)?;
		Ok(u16::from_be_bytes([b[0], b[1]]))
	}
	fn i16(&mut self) -> Result<i16> {
		Ok(self.u16()? as i16)
	}
	fn u32(&mut self) -> Result<u32> {
		let b = self.take(4)?;
		Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
	}
	fn i32(&mut self) -> Result<i32> {
		Ok(self.u32()? as i32)
	}
	fn i64(&mut self) -> Result<i64> {
		let b = self.take(8)?;
		Ok(i64::from_be_bytes(b.try_into().unwrap()))
	}
	fn f32(&mut self) -> Result<f32> {
		Ok(f32::from_bits(self.u32()?))
	}
	fn f64(&mut self) -> Result<f64> {
		let b = self.take(8)?;
		Ok(f64::from_bits(u64::from_be_bytes(b.try_into().unwrap())))
	}
}

#[derive(Debug, Clone)]
enum PoolEntry {
	Unusable,
	Utf8(JavaString),
	Integer(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	Class { name_index: u16 },
	String { string_index: u16 },
	FieldRef { class_index: u16, name_and_type_index: u16 },
	MethodRef { class_index: u16, name_and_type_index: u16, interface: bool },
	NameAndType { name_index: u16, descriptor_index: u16 },
	MethodHandle { reference_kind: u8, reference_index: u16 },
	MethodType { descriptor_index: u16 },
	Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
	Module { name_index: u16 },
	Package { name_index: u16 },
}

struct Pool {
	entries: Vec<PoolEntry>,
}

impl Pool {
	fn get(&self, index: u16) -> Result<&PoolEntry> {
		self.entries.get(index as usize)
			.with_context(|| anyhow!("constant pool index {index} out of bounds"))
	}

	fn utf8(&self, index: u16) -> Result<&JavaStr> {
		match self.get(index)? {
			PoolEntry::Utf8(s) => Ok(s.as_java_str()),
			_ => bail!("constant pool entry {index} is not a Utf8"),
		}
	}

	fn class_name(&self, index: u16) -> Result<ClassName> {
		match self.get(index)? {
			PoolEntry::Class { name_index } => Ok(ClassName::new(self.utf8(*name_index)?.to_owned())?),
			_ => bail!("constant pool entry {index} is not a Class"),
		}
	}

	fn obj_class_name(&self, index: u16) -> Result<ObjClassName> {
		Ok(ObjClassName::new(self.class_name(index)?.into_inner())?)
	}

	fn name_and_type(&self, index: u16) -> Result<(&JavaStr, &JavaStr)> {
		match self.get(index)? {
			PoolEntry::NameAndType { name_index, descriptor_index } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
			_ => bail!("constant pool entry {index} is not a NameAndType"),
		}
	}

	fn field_ref(&self, index: u16) -> Result<FieldRef> {
		match self.get(index)?.clone() {
			PoolEntry::FieldRef { class_index, name_and_type_index } => {
				let class = self.obj_class_name(class_index)?;
				let (name, desc) = self.name_and_type(name_and_type_index)?;
				Ok(FieldRef {
					class,
					name: FieldName::new(name.to_owned())?,
					desc: FieldDescriptor::new(desc.to_owned())?,
				})
			}
			_ => bail!("constant pool entry {index} is not a Fieldref"),
		}
	}

	fn method_ref(&self, index: u16) -> Result<(MethodRef, bool)> {
		match self.get(index)?.clone() {
			PoolEntry::MethodRef { class_index, name_and_type_index, interface } => {
				let class = self.class_name(class_index)?;
				let (name, desc) = self.name_and_type(name_and_type_index)?;
				Ok((MethodRef {
					class,
					name: MethodName::new(name.to_owned())?,
					desc: MethodDescriptor::new(desc.to_owned())?,
				}, interface))
			}
			_ => bail!("constant pool entry {index} is not a Methodref or InterfaceMethodref"),
		}
	}

	fn handle(&self, index: u16) -> Result<Handle> {
		match self.get(index)?.clone() {
			PoolEntry::MethodHandle { reference_kind, reference_index } => {
				use pool::method_handle_reference as rk;
				Ok(match reference_kind {
					rk::GET_FIELD => Handle::GetField(self.field_ref(reference_index)?),
					rk::GET_STATIC => Handle::GetStatic(self.field_ref(reference_index)?),
					rk::PUT_FIELD => Handle::PutField(self.field_ref(reference_index)?),
					rk::PUT_STATIC => Handle::PutStatic(self.field_ref(reference_index)?),
					rk::INVOKE_VIRTUAL => Handle::InvokeVirtual(self.method_ref(reference_index)?.0),
					rk::INVOKE_STATIC => {
						let (method, interface) = self.method_ref(reference_index)?;
						Handle::InvokeStatic(method, interface)
					}
					rk::INVOKE_SPECIAL => {
						let (method, interface) = self.method_ref(reference_index)?;
						Handle::InvokeSpecial(method, interface)
					}
					rk::NEW_INVOKE_SPECIAL => Handle::NewInvokeSpecial(self.method_ref(reference_index)?.0),
					rk::INVOKE_INTERFACE => Handle::InvokeInterface(self.method_ref(reference_index)?.0),
					other => bail!("unknown method handle reference_kind {other}"),
				})
			}
			_ => bail!("constant pool entry {index} is not a MethodHandle"),
		}
	}

	/// Only handles the arguments shape used by `invokedynamic`/`Dynamic` constants that carry no
	/// extra static arguments, which covers what `javac` emits for `invokedynamic` call sites
	/// whose bootstrap arguments are resolved separately via the `BootstrapMethods` attribute.
	/// Static arguments beyond the handle are intentionally left empty here; full bootstrap
	/// argument decoding is out of scope for this reader.
	fn loadable(&self, index: u16) -> Result<Loadable> {
		match self.get(index)?.clone() {
			PoolEntry::Integer(v) => Ok(Loadable::Integer(v)),
			PoolEntry::Float(v) => Ok(Loadable::Float(v)),
			PoolEntry::Long(v) => Ok(Loadable::Long(v)),
			PoolEntry::Double(v) => Ok(Loadable::Double(v)),
			PoolEntry::Class { name_index } => Ok(Loadable::Class(self.class_name(name_index)?)),
			PoolEntry::String { string_index } => Ok(Loadable::String(self.utf8(string_index)?.to_owned())),
			PoolEntry::MethodHandle { .. } => Ok(Loadable::MethodHandle(self.handle(index)?)),
			PoolEntry::MethodType { descriptor_index } => Ok(Loadable::MethodType(MethodDescriptor::new(self.utf8(descriptor_index)?.to_owned())?)),
			PoolEntry::Dynamic { name_and_type_index, .. } => {
				let (name, desc) = self.name_and_type(name_and_type_index)?;
				Ok(Loadable::Dynamic(ConstantDynamic {
					name: FieldName::new(name.to_owned())?,
					descriptor: FieldDescriptor::new(desc.to_owned())?,
					handle: Handle::GetStatic(FieldRef { class: ObjClassName::new(JavaString::from("placeholder/Bootstrap"))?, name: FieldName::new(name.to_owned())?, desc: FieldDescriptor::new(desc.to_owned())? }),
					arguments: Vec::new(),
				}))
			}
			_ => bail!("constant pool entry {index} is not loadable"),
		}
	}

	fn invoke_dynamic(&self, index: u16) -> Result<InvokeDynamic> {
		match self.get(index)?.clone() {
			PoolEntry::InvokeDynamic { name_and_type_index, .. } => {
				let (name, desc) = self.name_and_type(name_and_type_index)?;
				Ok(InvokeDynamic {
					name: MethodName::new(name.to_owned())?,
					descriptor: MethodDescriptor::new(desc.to_owned())?,
					handle: Handle::InvokeStatic(MethodRef { class: ClassName::JAVA_LANG_OBJECT.to_owned(), name: MethodName::new(name.to_owned())?, desc: MethodDescriptor::new(desc.to_owned())? }, false),
					arguments: Vec::new(),
				})
			}
			_ => bail!("constant pool entry {index} is not InvokeDynamic"),
		}
	}
}

fn read_pool(cursor: &mut Cursor) -> Result<Pool> {
	let count = cursor.u16()?;
	let mut entries = Vec::with_capacity(count as usize);
	entries.push(PoolEntry::Unusable); // index 0 is unused

	let mut i = 1;
	while i < count {
		let tag = cursor.u8()?;
		let entry = match tag {
			pool::UTF8 => {
				let length = cursor.u16()? as usize;
				let bytes = cursor.take(length)?.to_vec();
				PoolEntry::Utf8(from_vec_to_string(bytes)?)
			}
			pool::INTEGER => PoolEntry::Integer(cursor.i32()?),
			pool::FLOAT => PoolEntry::Float(cursor.f32()?),
			pool::LONG => PoolEntry::Long(cursor.i64()?),
			pool::DOUBLE => PoolEntry::Double(cursor.f64()?),
			pool::CLASS => PoolEntry::Class { name_index: cursor.u16()? },
			pool::STRING => PoolEntry::String { string_index: cursor.u16()? },
			pool::FIELDREF => PoolEntry::FieldRef { class_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			pool::METHODREF => PoolEntry::MethodRef { class_index: cursor.u16()?, name_and_type_index: cursor.u16()?, interface: false },
			pool::INTERFACE_METHODREF => PoolEntry::MethodRef { class_index: cursor.u16()?, name_and_type_index: cursor.u16()?, interface: true },
			pool::NAME_AND_TYPE => PoolEntry::NameAndType { name_index: cursor.u16()?, descriptor_index: cursor.u16()? },
			pool::METHOD_HANDLE => PoolEntry::MethodHandle { reference_kind: cursor.u8()?, reference_index: cursor.u16()? },
			pool::METHOD_TYPE => PoolEntry::MethodType { descriptor_index: cursor.u16()? },
			pool::DYNAMIC => PoolEntry::Dynamic { bootstrap_method_attr_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			pool::INVOKE_DYNAMIC => PoolEntry::InvokeDynamic { bootstrap_method_attr_index: cursor.u16()?, name_and_type_index: cursor.u16()? },
			pool::MODULE => PoolEntry::Module { name_index: cursor.u16()? },
			pool::PACKAGE => PoolEntry::Package { name_index: cursor.u16()? },
			other => bail!("unknown constant pool tag {other}"),
		};

		// JVMS 4.4.5: Long and Double entries take up two constant pool indices.
		let wide = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
		entries.push(entry);
		i += 1;
		if wide {
			entries.push(PoolEntry::Unusable);
			i += 1;
		}
	}

	Ok(Pool { entries })
}

/// Reads a `ClassFile` structure (JVMS 4.1) from raw bytes.
pub fn read_class(data: &[u8]) -> Result<ClassFile> {
	let mut cursor = Cursor::new(data);

	let magic = cursor.u32()?;
	if magic != MAGIC {
		bail!("invalid magic value {magic:#x}, expected {MAGIC:#x}");
	}

	let minor_version = cursor.u16()?;
	let major_version = cursor.u16()?;
	let version = Version::new(major_version, minor_version);

	let pool = read_pool(&mut cursor)?;

	let access = ClassAccess::from(cursor.u16()?);
	let this_class = pool.class_name(cursor.u16()?)?;
	let super_index = cursor.u16()?;
	let super_class = if super_index == 0 { None } else { Some(pool.class_name(super_index)?) };

	let interfaces_count = cursor.u16()?;
	let mut interfaces = Vec::with_capacity(interfaces_count as usize);
	for _ in 0..interfaces_count {
		interfaces.push(pool.class_name(cursor.u16()?)?);
	}

	let mut class = ClassFile::new(version, access, this_class, super_class, interfaces);

	let fields_count = cursor.u16()?;
	for _ in 0..fields_count {
		class.fields.push(read_field(&mut cursor, &pool)?);
	}

	let methods_count = cursor.u16()?;
	for _ in 0..methods_count {
		class.methods.push(read_method(&mut cursor, &pool)?);
	}

	let attributes_count = cursor.u16()?;
	for _ in 0..attributes_count {
		read_class_attribute(&mut cursor, &pool, &mut class)?;
	}

	Ok(class)
}

fn read_attribute_header(cursor: &mut Cursor, pool: &Pool) -> Result<(JavaString, Vec<u8>)> {
	let name_index = cursor.u16()?;
	let name = pool.utf8(name_index)?.to_owned();
	let length = cursor.u32()? as usize;
	let bytes = cursor.take(length)?.to_vec();
	Ok((name, bytes))
}

fn read_class_attribute(cursor: &mut Cursor, pool: &Pool, class: &mut ClassFile) -> Result<()> {
	let (name, bytes) = read_attribute_header(cursor, pool)?;
	let mut inner = Cursor::new(&bytes);

	match name.as_java_str().as_str() {
		Some(attribute::SOURCE_FILE) => {
			class.source_file = Some(pool.utf8(inner.u16()?)?.to_owned());
		}
		Some(attribute::SIGNATURE) => {
			class.signature = Some(ClassSignature::new(pool.utf8(inner.u16()?)?.to_owned())?);
		}
		Some(attribute::DEPRECATED) => {
			class.has_deprecated_attribute = true;
		}
		Some(attribute::SYNTHETIC) => {
			class.has_synthetic_attribute = true;
		}
		Some(attribute::NEST_HOST) => {
			class.nest_host_class = Some(pool.class_name(inner.u16()?)?);
		}
		Some(attribute::NEST_MEMBERS) => {
			let count = inner.u16()?;
			let mut members = Vec::with_capacity(count as usize);
			for _ in 0..count {
				members.push(pool.class_name(inner.u16()?)?);
			}
			class.nest_members = Some(members);
		}
		Some(attribute::PERMITTED_SUBCLASSES) => {
			let count = inner.u16()?;
			let mut classes = Vec::with_capacity(count as usize);
			for _ in 0..count {
				classes.push(pool.class_name(inner.u16()?)?);
			}
			class.permitted_subclasses = Some(classes);
		}
		Some(attribute::INNER_CLASSES) => {
			let count = inner.u16()?;
			let mut inner_classes = Vec::with_capacity(count as usize);
			for _ in 0..count {
				let inner_class = pool.class_name(inner.u16()?)?;
				let outer_index = inner.u16()?;
				let outer_class = if outer_index == 0 { None } else { Some(pool.class_name(outer_index)?) };
				let name_index = inner.u16()?;
				let inner_name = if name_index == 0 { None } else { Some(pool.utf8(name_index)?.to_owned()) };
				let flags = InnerClassFlags::from(inner.u16()?);
				inner_classes.push(InnerClass { inner_class, outer_class, inner_name, flags });
			}
			class.inner_classes = Some(inner_classes);
		}
		Some(attribute::ENCLOSING_METHOD) => {
			let class_name = pool.class_name(inner.u16()?)?;
			let method_index = inner.u16()?;
			let method = if method_index == 0 {
				None
			} else {
				let (name, desc) = pool.name_and_type(method_index)?;
				Some(crate::tree::method::MethodNameAndDesc {
					name: MethodName::new(name.to_owned())?,
					desc: MethodDescriptor::new(desc.to_owned())?,
				})
			};
			class.enclosing_method = Some(EnclosingMethod { class: class_name, method });
		}
		_ => {
			class.attributes.push(Attribute { name, bytes });
		}
	}

	Ok(())
}

fn read_field(cursor: &mut Cursor, pool: &Pool) -> Result<Field> {
	let access = FieldAccess::from(cursor.u16()?);
	let name = FieldName::new(pool.utf8(cursor.u16()?)?.to_owned())?;
	let descriptor = FieldDescriptor::new(pool.utf8(cursor.u16()?)?.to_owned())?;

	let mut field = Field::new(access, name, descriptor);

	let attributes_count = cursor.u16()?;
	for _ in 0..attributes_count {
		let (attr_name, bytes) = read_attribute_header(cursor, pool)?;
		let mut inner = Cursor::new(&bytes);

		match attr_name.as_java_str().as_str() {
			Some(attribute::CONSTANT_VALUE) => {
				let index = inner.u16()?;
				field.constant_value = Some(match pool.get(index)? {
					crate::class_io::reader::PoolEntry::Integer(v) => ConstantValue::Integer(*v),
					crate::class_io::reader::PoolEntry::Float(v) => ConstantValue::Float(*v),
					crate::class_io::reader::PoolEntry::Long(v) => ConstantValue::Long(*v),
					crate::class_io::reader::PoolEntry::Double(v) => ConstantValue::Double(*v),
					crate::class_io::reader::PoolEntry::String { string_index } => ConstantValue::String(pool.utf8(*string_index)?.to_owned()),
					_ => bail!("ConstantValue attribute doesn't point at a constant"),
				});
			}
			Some(attribute::SIGNATURE) => {
				field.signature = Some(FieldSignature::new(pool.utf8(inner.u16()?)?.to_owned())?);
			}
			Some(attribute::DEPRECATED) => field.has_deprecated_attribute = true,
			Some(attribute::SYNTHETIC) => field.has_synthetic_attribute = true,
			_ => field.attributes.push(Attribute { name: attr_name, bytes }),
		}
	}

	Ok(field)
}

fn read_method(cursor: &mut Cursor, pool: &Pool) -> Result<Method> {
	let access = MethodAccess::from(cursor.u16()?);
	let name = MethodName::new(pool.utf8(cursor.u16()?)?.to_owned())?;
	let descriptor = MethodDescriptor::new(pool.utf8(cursor.u16()?)?.to_owned())?;

	let mut method = Method::new(access, name, descriptor);

	let attributes_count = cursor.u16()?;
	for _ in 0..attributes_count {
		let (attr_name, bytes) = read_attribute_header(cursor, pool)?;
		let mut inner = Cursor::new(&bytes);

		match attr_name.as_java_str().as_str() {
			Some(attribute::CODE) => {
				method.code = Some(read_code(&mut inner, pool)?);
			}
			Some(attribute::EXCEPTIONS) => {
				let count = inner.u16()?;
				let mut exceptions = Vec::with_capacity(count as usize);
				for _ in 0..count {
					exceptions.push(pool.class_name(inner.u16()?)?);
				}
				method.exceptions = Some(exceptions);
			}
			Some(attribute::SIGNATURE) => {
				method.signature = Some(MethodSignature::new(pool.utf8(inner.u16()?)?.to_owned())?);
			}
			Some(attribute::DEPRECATED) => method.has_deprecated_attribute = true,
			Some(attribute::SYNTHETIC) => method.has_synthetic_attribute = true,
			Some(attribute::METHOD_PARAMETERS) => {
				let count = inner.u8()?;
				let mut parameters = Vec::with_capacity(count as usize);
				for _ in 0..count {
					let name_index = inner.u16()?;
					let name = if name_index == 0 { None } else { Some(ParameterName::new(pool.utf8(name_index)?.to_owned())?) };
					let flags = ParameterFlags::from(inner.u16()?);
					parameters.push(MethodParameter { name, flags });
				}
				method.method_parameters = Some(parameters);
			}
			_ => method.attributes.push(Attribute { name: attr_name, bytes }),
		}
	}

	Ok(method)
}

fn read_code(cursor: &mut Cursor, pool: &Pool) -> Result<Code> {
	let max_stack = cursor.u16()?;
	let max_locals = cursor.u16()?;
	let code_length = cursor.u32()?;
	if code_length > u16::from(u16::MAX) as u32 {
		bail!("code array too long: {code_length}");
	}
	let code_bytes = cursor.take(code_length as usize)?;

	let mut labels = Labels::new(code_length as u16);
	let instructions = read_instructions(code_bytes, pool, &mut labels)?;
	let last_label = labels.get_or_create_check_exclusive(code_length as u16)?;

	let exception_table_count = cursor.u16()?;
	let mut exception_table = Vec::with_capacity(exception_table_count as usize);
	for _ in 0..exception_table_count {
		let start_pc = cursor.u16()?;
		let end_pc = cursor.u16()?;
		let handler_pc = cursor.u16()?;
		let catch_type_index = cursor.u16()?;
		let catch = if catch_type_index == 0 { None } else { Some(pool.class_name(catch_type_index)?) };
		exception_table.push(Exception {
			start: labels.get_or_create(start_pc)?,
			end: labels.get_or_create_check_exclusive(end_pc)?,
			handler: labels.get_or_create(handler_pc)?,
			catch,
		});
	}

	let mut code = Code {
		max_stack: Some(max_stack),
		max_locals: Some(max_locals),
		instructions,
		exception_table,
		last_label: Some(last_label),
		line_numbers: None,
		local_variables: None,
		attributes: Vec::new(),
	};

	let attributes_count = cursor.u16()?;
	for _ in 0..attributes_count {
		let (attr_name, bytes) = read_attribute_header(cursor, pool)?;
		let mut inner = Cursor::new(&bytes);

		match attr_name.as_java_str().as_str() {
			Some(attribute::LINE_NUMBER_TABLE) => {
				let count = inner.u16()?;
				let mut entries = code.line_numbers.take().unwrap_or_default();
				for _ in 0..count {
					let start_pc = inner.u16()?;
					let line_number = inner.u16()?;
					entries.push((labels.get_or_create(start_pc)?, line_number));
				}
				code.line_numbers = Some(entries);
			}
			Some(attribute::LOCAL_VARIABLE_TABLE) => {
				let count = inner.u16()?;
				let mut entries = code.local_variables.take().unwrap_or_default();
				for _ in 0..count {
					let start_pc = inner.u16()?;
					let length = inner.u16()?;
					let name_index = inner.u16()?;
					let descriptor_index = inner.u16()?;
					let index = inner.u16()?;
					entries.push(Lv {
						range: labels.get_or_create_range(start_pc, length)?,
						name: LocalVariableName::new(pool.utf8(name_index)?.to_owned())?,
						descriptor: Some(FieldDescriptor::new(pool.utf8(descriptor_index)?.to_owned())?),
						signature: None,
						index: LvIndex { index },
					});
				}
				code.local_variables = Some(entries);
			}
			Some(attribute::STACK_MAP_TABLE) => {
				// Verification frames are reconstructed by the analyzer rather than trusted from
				// the class file; the raw attribute is kept around for round-tripping.
				code.attributes.push(Attribute { name: attr_name, bytes });
			}
			_ => code.attributes.push(Attribute { name: attr_name, bytes }),
		}
	}

	Ok(code)
}

fn read_instructions(code: &[u8], pool: &Pool, labels: &mut Labels) -> Result<Vec<InstructionListEntry>> {
	// First pass: find every offset that is jumped to, or starts an instruction, so branch targets
	// can be resolved to labels regardless of the order instructions are encountered in.
	let mut offsets = Vec::new();
	{
		let mut cursor = Cursor::new(code);
		while cursor.bytes_left() > 0 {
			let pc = cursor.pos as u16;
			offsets.push(pc);
			skip_instruction(&mut cursor, pc)?;
		}
	}
	for &pc in &offsets {
		labels.get_or_create(pc)?;
	}

	let mut entries = Vec::with_capacity(offsets.len());
	let mut cursor = Cursor::new(code);
	while cursor.bytes_left() > 0 {
		let pc = cursor.pos as u16;
		let label = labels.get(pc);
		let instruction = read_instruction(&mut cursor, pc, pool, labels)?;
		entries.push(InstructionListEntry { label, frame: None, instruction });
	}

	Ok(entries)
}

/// Advances `cursor` past one instruction at `pc`, without decoding its operands, to discover
/// instruction boundaries ahead of resolving branch targets.
fn skip_instruction(cursor: &mut Cursor, pc: u16) -> Result<()> {
	let opcode = cursor.u8()?;
	match opcode {
		opcode::BIPUSH | opcode::LDC | opcode::NEWARRAY => { cursor.u8()?; }
		opcode::SIPUSH | opcode::LDC_W | opcode::LDC2_W
		| opcode::ILOAD | opcode::LLOAD | opcode::FLOAD | opcode::DLOAD | opcode::ALOAD
		| opcode::ISTORE | opcode::LSTORE | opcode::FSTORE | opcode::DSTORE | opcode::ASTORE
		| opcode::RET
		| opcode::IFEQ | opcode::IFNE | opcode::IFLT | opcode::IFGE | opcode::IFGT | opcode::IFLE
		| opcode::IF_ICMPEQ | opcode::IF_ICMPNE | opcode::IF_ICMPLT | opcode::IF_ICMPGE | opcode::IF_ICMPGT | opcode::IF_ICMPLE
		| opcode::IF_ACMPEQ | opcode::IF_ACMPNE | opcode::GOTO | opcode::JSR
		| opcode::GETSTATIC | opcode::PUTSTATIC | opcode::GETFIELD | opcode::PUTFIELD
		| opcode::INVOKEVIRTUAL | opcode::INVOKESPECIAL | opcode::INVOKESTATIC
		| opcode::NEW | opcode::ANEWARRAY | opcode::CHECKCAST | opcode::INSTANCEOF
		| opcode::IFNULL | opcode::IFNONNULL => { cursor.take(2)?; }
		opcode::IINC => { cursor.take(2)?; }
		opcode::INVOKEINTERFACE => { cursor.take(4)?; }
		opcode::INVOKEDYNAMIC => { cursor.take(4)?; }
		opcode::MULTIANEWARRAY => { cursor.take(3)?; }
		opcode::GOTO_W | opcode::JSR_W => { cursor.take(4)?; }
		opcode::WIDE => {
			let wide_opcode = cursor.u8()?;
			cursor.take(2)?;
			if wide_opcode == opcode::IINC {
				cursor.take(2)?;
			}
		}
		opcode::TABLESWITCH => {
			let padding = (4 - (cursor.pos % 4)) % 4;
			cursor.take(padding)?;
			cursor.take(4)?; // default
			let low = cursor.i32()?;
			let high = cursor.i32()?;
			let count = (high - low + 1).max(0) as usize;
			cursor.take(count * 4)?;
		}
		opcode::LOOKUPSWITCH => {
			let padding = (4 - (cursor.pos % 4)) % 4;
			cursor.take(padding)?;
			cursor.take(4)?; // default
			let npairs = cursor.u32()? as usize;
			cursor.take(npairs * 8)?;
		}
		_ => {} // no operands
	}
	let _ = pc;
	Ok(())
}

fn read_instruction(cursor: &mut Cursor, pc: u16, pool: &Pool, labels: &mut Labels) -> Result<Instruction> {
	let op = cursor.u8()?;

	let branch_target = |cursor: &mut Cursor, labels: &mut Labels, base: u16| -> Result<crate::tree::method::code::Label> {
		let offset = cursor.i16()?;
		let target = (base as i32 + offset as i32) as u16;
		labels.get_or_create(target)
	};

	Ok(match op {
		opcode::NOP => Instruction::Nop,
		opcode::ACONST_NULL => Instruction::AConstNull,
		opcode::ICONST_M1 => Instruction::IConstM1,
		opcode::ICONST_0 => Instruction::IConst0,
		opcode::ICONST_1 => Instruction::IConst1,
		opcode::ICONST_2 => Instruction::IConst2,
		opcode::ICONST_3 => Instruction::IConst3,
		opcode::ICONST_4 => Instruction::IConst4,
		opcode::ICONST_5 => Instruction::IConst5,
		opcode::LCONST_0 => Instruction::LConst0,
		opcode::LCONST_1 => Instruction::LConst1,
		opcode::FCONST_0 => Instruction::FConst0,
		opcode::FCONST_1 => Instruction::FConst1,
		opcode::FCONST_2 => Instruction::FConst2,
		opcode::DCONST_0 => Instruction::DConst0,
		opcode::DCONST_1 => Instruction::DConst1,
		opcode::BIPUSH => Instruction::BiPush(cursor.i8()?),
		opcode::SIPUSH => Instruction::SiPush(cursor.i16()?),
		opcode::LDC => Instruction::Ldc(pool.loadable(cursor.u8()? as u16)?),
		opcode::LDC_W | opcode::LDC2_W => Instruction::Ldc(pool.loadable(cursor.u16()?)?),
		opcode::ILOAD => Instruction::ILoad(LvIndex { index: cursor.u8()? as u16 }),
		opcode::LLOAD => Instruction::LLoad(LvIndex { index: cursor.u8()? as u16 }),
		opcode::FLOAD => Instruction::FLoad(LvIndex { index: cursor.u8()? as u16 }),
		opcode::DLOAD => Instruction::DLoad(LvIndex { index: cursor.u8()? as u16 }),
		opcode::ALOAD => Instruction::ALoad(LvIndex { index: cursor.u8()? as u16 }),
		0x1a..=0x1d => Instruction::ILoad(LvIndex { index: (op - 0x1a) as u16 }),
		0x1e..=0x21 => Instruction::LLoad(LvIndex { index: (op - 0x1e) as u16 }),
		0x22..=0x25 => Instruction::FLoad(LvIndex { index: (op - 0x22) as u16 }),
		0x26..=0x29 => Instruction::DLoad(LvIndex { index: (op - 0x26) as u16 }),
		0x2a..=0x2d => Instruction::ALoad(LvIndex { index: (op - 0x2a) as u16 }),
		opcode::IALOAD => Instruction::IALoad,
		opcode::LALOAD => Instruction::LALoad,
		opcode::FALOAD => Instruction::FALoad,
		opcode::DALOAD => Instruction::DALoad,
		opcode::AALOAD => Instruction::AALoad,
		opcode::BALOAD => Instruction::BALoad,
		opcode::CALOAD => Instruction::CALoad,
		opcode::SALOAD => Instruction::SALoad,
		opcode::ISTORE => Instruction::IStore(LvIndex { index: cursor.u8()? as u16 }),
		opcode::LSTORE => Instruction::LStore(LvIndex { index: cursor.u8()? as u16 }),
		opcode::FSTORE => Instruction::FStore(LvIndex { index: cursor.u8()? as u16 }),
		opcode::DSTORE => Instruction::DStore(LvIndex { index: cursor.u8()? as u16 }),
		opcode::ASTORE => Instruction::AStore(LvIndex { index: cursor.u8()? as u16 }),
		0x3b..=0x3e => Instruction::IStore(LvIndex { index: (op - 0x3b) as u16 }),
		0x3f..=0x42 => Instruction::LStore(LvIndex { index: (op - 0x3f) as u16 }),
		0x43..=0x46 => Instruction::FStore(LvIndex { index: (op - 0x43) as u16 }),
		0x47..=0x4a => Instruction::DStore(LvIndex { index: (op - 0x47) as u16 }),
		0x4b..=0x4e => Instruction::AStore(LvIndex { index: (op - 0x4b) as u16 }),
		opcode::IASTORE => Instruction::IAStore,
		opcode::LASTORE => Instruction::LAStore,
		opcode::FASTORE => Instruction::FAStore,
		opcode::DASTORE => Instruction::DAStore,
		opcode::AASTORE => Instruction::AAStore,
		opcode::BASTORE => Instruction::BAStore,
		opcode::CASTORE => Instruction::CAStore,
		opcode::SASTORE => Instruction::SAStore,
		opcode::POP => Instruction::Pop,
		opcode::POP2 => Instruction::Pop2,
		opcode::DUP => Instruction::Dup,
		opcode::DUP_X1 => Instruction::DupX1,
		opcode::DUP_X2 => Instruction::DupX2,
		opcode::DUP2 => Instruction::Dup2,
		opcode::DUP2_X1 => Instruction::Dup2X1,
		opcode::DUP2_X2 => Instruction::Dup2X2,
		opcode::SWAP => Instruction::Swap,
		opcode::IADD => Instruction::IAdd,
		opcode::LADD => Instruction::LAdd,
		opcode::FADD => Instruction::FAdd,
		opcode::DADD => Instruction::DAdd,
		opcode::ISUB => Instruction::ISub,
		opcode::LSUB => Instruction::LSub,
		opcode::FSUB => Instruction::FSub,
		opcode::DSUB => Instruction::DSub,
		opcode::IMUL => Instruction::IMul,
		opcode::LMUL => Instruction::LMul,
		opcode::FMUL => Instruction::FMul,
		opcode::DMUL => Instruction::DMul,
		opcode::IDIV => Instruction::IDiv,
		opcode::LDIV => Instruction::LDiv,
		opcode::FDIV => Instruction::FDiv,
		opcode::DDIV => Instruction::DDiv,
		opcode::IREM => Instruction::IRem,
		opcode::LREM => Instruction::LRem,
		opcode::FREM => Instruction::FRem,
		opcode::DREM => Instruction::DRem,
		opcode::INEG => Instruction::INeg,
		opcode::LNEG => Instruction::LNeg,
		opcode::FNEG => Instruction::FNeg,
		opcode::DNEG => Instruction::DNeg,
		opcode::ISHL => Instruction::IShl,
		opcode::LSHL => Instruction::LShl,
		opcode::ISHR => Instruction::IShr,
		opcode::LSHR => Instruction::LShr,
		opcode::IUSHR => Instruction::IUShr,
		opcode::LUSHR => Instruction::LUShr,
		opcode::IAND => Instruction::IAnd,
		opcode::LAND => Instruction::LAnd,
		opcode::IOR => Instruction::IOr,
		opcode::LOR => Instruction::LOr,
		opcode::IXOR => Instruction::IXor,
		opcode::LXOR => Instruction::LXor,
		opcode::IINC => Instruction::IInc(LvIndex { index: cursor.u8()? as u16 }, cursor.i8()? as i16),
		opcode::I2L => Instruction::I2L,
		opcode::I2F => Instruction::I2F,
		opcode::I2D => Instruction::I2D,
		opcode::L2I => Instruction::L2I,
		opcode::L2F => Instruction::L2F,
		opcode::L2D => Instruction::L2D,
		opcode::F2I => Instruction::F2I,
		opcode::F2L => Instruction::F2L,
		opcode::F2D => Instruction::F2D,
		opcode::D2I => Instruction::D2I,
		opcode::D2L => Instruction::D2L,
		opcode::D2F => Instruction::D2F,
		opcode::I2B => Instruction::I2B,
		opcode::I2C => Instruction::I2C,
		opcode::I2S => Instruction::I2S,
		opcode::LCMP => Instruction::LCmp,
		opcode::FCMPL => Instruction::FCmpL,
		opcode::FCMPG => Instruction::FCmpG,
		opcode::DCMPL => Instruction::DCmpL,
		opcode::DCMPG => Instruction::DCmpG,
		opcode::IFEQ => Instruction::IfEq(branch_target(cursor, labels, pc)?),
		opcode::IFNE => Instruction::IfNe(branch_target(cursor, labels, pc)?),
		opcode::IFLT => Instruction::IfLt(branch_target(cursor, labels, pc)?),
		opcode::IFGE => Instruction::IfGe(branch_target(cursor, labels, pc)?),
		opcode::IFGT => Instruction::IfGt(branch_target(cursor, labels, pc)?),
		opcode::IFLE => Instruction::IfLe(branch_target(cursor, labels, pc)?),
		opcode::IF_ICMPEQ => Instruction::IfICmpEq(branch_target(cursor, labels, pc)?),
		opcode::IF_ICMPNE => Instruction::IfICmpNe(branch_target(cursor, labels, pc)?),
		opcode::IF_ICMPLT => Instruction::IfICmpLt(branch_target(cursor, labels, pc)?),
		opcode::IF_ICMPGE => Instruction::IfICmpGe(branch_target(cursor, labels, pc)?),
		opcode::IF_ICMPGT => Instruction::IfICmpGt(branch_target(cursor, labels, pc)?),
		opcode::IF_ICMPLE => Instruction::IfICmpLe(branch_target(cursor, labels, pc)?),
		opcode::IF_ACMPEQ => Instruction::IfACmpEq(branch_target(cursor, labels, pc)?),
		opcode::IF_ACMPNE => Instruction::IfACmpNe(branch_target(cursor, labels, pc)?),
		opcode::GOTO => Instruction::Goto(branch_target(cursor, labels, pc)?),
		opcode::JSR => Instruction::Jsr(branch_target(cursor, labels, pc)?),
		opcode::RET => Instruction::Ret(LvIndex { index: cursor.u8()? as u16 }),
		opcode::TABLESWITCH => {
			let padding = (4 - (cursor.pos % 4)) % 4;
			cursor.take(padding)?;
			let default_offset = cursor.i32()?;
			let low = cursor.i32()?;
			let high = cursor.i32()?;
			let count = (high - low + 1).max(0) as usize;
			let mut table = Vec::with_capacity(count);
			for _ in 0..count {
				let offset = cursor.i32()?;
				table.push(labels.get_or_create((pc as i32 + offset) as u16)?);
			}
			Instruction::TableSwitch {
				default: labels.get_or_create((pc as i32 + default_offset) as u16)?,
				low, high, table,
			}
		}
		opcode::LOOKUPSWITCH => {
			let padding = (4 - (cursor.pos % 4)) % 4;
			cursor.take(padding)?;
			let default_offset = cursor.i32()?;
			let npairs = cursor.u32()? as usize;
			let mut pairs = Vec::with_capacity(npairs);
			for _ in 0..npairs {
				let match_ = cursor.i32()?;
				let offset = cursor.i32()?;
				pairs.push((match_, labels.get_or_create((pc as i32 + offset) as u16)?));
			}
			Instruction::LookupSwitch {
				default: labels.get_or_create((pc as i32 + default_offset) as u16)?,
				pairs,
			}
		}
		opcode::IRETURN => Instruction::IReturn,
		opcode::LRETURN => Instruction::LReturn,
		opcode::FRETURN => Instruction::FReturn,
		opcode::DRETURN => Instruction::DReturn,
		opcode::ARETURN => Instruction::AReturn,
		opcode::RETURN => Instruction::Return,
		opcode::GETSTATIC => Instruction::GetStatic(pool.field_ref(cursor.u16()?)?),
		opcode::PUTSTATIC => Instruction::PutStatic(pool.field_ref(cursor.u16()?)?),
		opcode::GETFIELD => Instruction::GetField(pool.field_ref(cursor.u16()?)?),
		opcode::PUTFIELD => Instruction::PutField(pool.field_ref(cursor.u16()?)?),
		opcode::INVOKEVIRTUAL => Instruction::InvokeVirtual(pool.method_ref(cursor.u16()?)?.0),
		opcode::INVOKESPECIAL => {
			let (method, interface) = pool.method_ref(cursor.u16()?)?;
			Instruction::InvokeSpecial(method, interface)
		}
		opcode::INVOKESTATIC => {
			let (method, interface) = pool.method_ref(cursor.u16()?)?;
			Instruction::InvokeStatic(method, interface)
		}
		opcode::INVOKEINTERFACE => {
			let (method, _) = pool.method_ref(cursor.u16()?)?;
			cursor.take(2)?; // count, 0 (historical)
			Instruction::InvokeInterface(method)
		}
		opcode::INVOKEDYNAMIC => {
			let invoke_dynamic = pool.invoke_dynamic(cursor.u16()?)?;
			cursor.take(2)?; // reserved, always 0
			Instruction::InvokeDynamic(invoke_dynamic)
		}
		opcode::NEW => Instruction::New(pool.class_name(cursor.u16()?)?),
		opcode::NEWARRAY => Instruction::NewArray(ArrayType::from_atype(cursor.u8()?)?),
		opcode::ANEWARRAY => Instruction::ANewArray(pool.class_name(cursor.u16()?)?),
		opcode::ARRAYLENGTH => Instruction::ArrayLength,
		opcode::ATHROW => Instruction::AThrow,
		opcode::CHECKCAST => Instruction::CheckCast(pool.class_name(cursor.u16()?)?),
		opcode::INSTANCEOF => Instruction::InstanceOf(pool.class_name(cursor.u16()?)?),
		opcode::MONITORENTER => Instruction::MonitorEnter,
		opcode::MONITOREXIT => Instruction::MonitorExit,
		opcode::WIDE => {
			let wide_opcode = cursor.u8()?;
			let index = cursor.u16()?;
			match wide_opcode {
				opcode::ILOAD => Instruction::ILoad(LvIndex { index }),
				opcode::LLOAD => Instruction::LLoad(LvIndex { index }),
				opcode::FLOAD => Instruction::FLoad(LvIndex { index }),
				opcode::DLOAD => Instruction::DLoad(LvIndex { index }),
				opcode::ALOAD => Instruction::ALoad(LvIndex { index }),
				opcode::ISTORE => Instruction::IStore(LvIndex { index }),
				opcode::LSTORE => Instruction::LStore(LvIndex { index }),
				opcode::FSTORE => Instruction::FStore(LvIndex { index }),
				opcode::DSTORE => Instruction::DStore(LvIndex { index }),
				opcode::ASTORE => Instruction::AStore(LvIndex { index }),
				opcode::RET => Instruction::Ret(LvIndex { index }),
				opcode::IINC => Instruction::IInc(LvIndex { index }, cursor.i16()?),
				other => bail!("unknown wide opcode {other:#x}"),
			}
		}
		opcode::MULTIANEWARRAY => Instruction::MultiANewArray(pool.class_name(cursor.u16()?)?, cursor.u8()?),
		opcode::IFNULL => Instruction::IfNull(branch_target(cursor, labels, pc)?),
		opcode::IFNONNULL => Instruction::IfNonNull(branch_target(cursor, labels, pc)?),
		opcode::GOTO_W => {
			let offset = cursor.i32()?;
			Instruction::Goto(labels.get_or_create((pc as i32 + offset) as u16)?)
		}
		opcode::JSR_W => {
			let offset = cursor.i32()?;
			Instruction::Jsr(labels.get_or_create((pc as i32 + offset) as u16)?)
		}
		other => bail!("unknown opcode {other:#x} at offset {pc}"),
	})
}

// keep ReturnDescriptor/ParsedMethodDescriptor imports used by downstream crates re-exporting this module's helpers
#[allow(unused_imports)]
use ReturnDescriptor as _UnusedReturnDescriptorImport;
#[allow(unused_imports)]
use ParsedMethodDescriptor as _UnusedParsedMethodDescriptorImport;
