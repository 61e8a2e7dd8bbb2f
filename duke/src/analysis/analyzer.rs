//! The method analyzer (§4.5): an abstract interpreter that walks every reachable instruction of
//! a method's code along every control-flow edge, maintaining a symbolic [`Stack`]/[`Locals`] pair
//! and emitting one [`Frame`] per reach of an instruction, threaded into a producer/consumer graph.

use std::collections::{HashMap, HashSet};
use java_string::JavaString;
use petgraph::graph::DiGraph;
use crate::analysis::error::{label_not_found, AnalyzerError};
use crate::analysis::frame::{Frame, FrameId, FrameKind};
use crate::analysis::state::{Locals, Slot, Stack};
use crate::analysis::value::Value;
use crate::tree::class::ClassName;
use crate::tree::descriptor::{ArrayType as DescArrayType, ParsedFieldDescriptor, Type};
use crate::tree::method::code::{ArrayType as CodeArrayType, Code, Instruction, Label, Loadable};
use crate::tree::method::Method;

/// The result of analyzing one method (§3): a multimap from instruction index to the (possibly
/// several) frames produced by every distinct reach of that instruction, plus the observed maxima.
#[derive(Debug)]
pub struct AnalyzerResult {
	graph: DiGraph<Frame, ()>,
	by_instruction: Vec<Vec<FrameId>>,
	pub max_stack: u16,
	pub max_locals: u16,
}

impl AnalyzerResult {
	fn empty() -> AnalyzerResult {
		AnalyzerResult { graph: DiGraph::new(), by_instruction: Vec::new(), max_stack: 0, max_locals: 0 }
	}

	pub fn frame(&self, id: FrameId) -> &Frame {
		&self.graph[id]
	}

	/// The ids of every frame produced by a reach of `instruction`, in exploration order (§4.5.4).
	pub fn frames_at(&self, instruction: usize) -> &[FrameId] {
		self.by_instruction.get(instruction).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn writes(&self, id: FrameId) -> &[FrameId] {
		&self.graph[id].writes
	}

	pub fn reads(&self, id: FrameId) -> &[FrameId] {
		&self.graph[id].reads
	}

	/// Whether `id`'s value is derivable purely from compile-time constants (§4.3, §9).
	///
	/// Computed on demand rather than cached at construction time, since a frame's `writes` may
	/// not be fully linked yet when it is first created. A frame reached again while it's still
	/// being evaluated -- a back-edge through a loop -- is conservatively treated as non-constant,
	/// since the loop's incoming value at that point cannot be known to be constant without
	/// already knowing the answer.
	pub fn is_constant(&self, id: FrameId) -> bool {
		let mut in_progress = HashSet::new();
		self.is_constant_inner(id, &mut in_progress)
	}

	fn is_constant_inner(&self, id: FrameId, in_progress: &mut HashSet<FrameId>) -> bool {
		let frame = &self.graph[id];
		if frame.kind.is_constant_source() {
			return true;
		}
		if !frame.kind.is_pure_transformer() {
			return false;
		}
		if !in_progress.insert(id) {
			return false;
		}
		let result = frame.writes.iter().all(|&w| self.is_constant_inner(w, in_progress));
		in_progress.remove(&id);
		result
	}

	/// Renders every frame, grouped by instruction, as plain text: one line per reach with its
	/// stack/locals snapshot and whether it's constant. Meant for `duke-cli`, not for machine
	/// consumption.
	pub fn dump(&self) -> String {
		use std::fmt::Write;
		let mut out = String::new();
		for (instruction, frames) in self.by_instruction.iter().enumerate() {
			for &id in frames {
				let frame = &self.graph[id];
				let _ = writeln!(
					out,
					"#{instruction:<4} {:<14?} stack={:?} locals={:?}{}",
					frame.kind,
					frame.stack,
					frame.locals,
					if self.is_constant(id) { " [constant]" } else { "" },
				);
			}
		}
		out
	}
}

/// Stateless entry point: `MethodAnalyzer::analyze(owner, method)`.
pub struct MethodAnalyzer;

impl MethodAnalyzer {
	pub fn analyze(owner: &ClassName, method: &Method) -> Result<AnalyzerResult, AnalyzerError> {
		if method.access.is_abstract || method.access.is_native {
			return Ok(AnalyzerResult::empty());
		}

		let Some(code) = &method.code else {
			return Ok(AnalyzerResult::empty());
		};
		if code.instructions.is_empty() {
			return Ok(AnalyzerResult::empty());
		}

		for entry in &code.instructions {
			match entry.instruction {
				Instruction::Jsr(_) => return Err(AnalyzerError::UnsupportedOpcode("JSR")),
				Instruction::Ret(_) => return Err(AnalyzerError::UnsupportedOpcode("RET")),
				_ => {}
			}
		}

		let index_of = build_label_index(code);

		let mut locals = Locals::new();
		if !method.access.is_static {
			locals.append(Slot::this(owner.clone()));
		}
		let descriptor = method.descriptor.as_slice().parse()
			.map_err(|e| AnalyzerError::MalformedCode(format!("invalid method descriptor: {e}")))?;
		for parameter in &descriptor.parameter_descriptors {
			let value = value_of_type(parameter);
			if value.is_wide() {
				locals.append_wide(Slot::new(value, None));
			} else {
				locals.append(Slot::new(value, None));
			}
		}

		let handlers = build_handlers(code, &index_of)?;

		let mut ctx = Context {
			code,
			index_of,
			handlers,
			visited: HashSet::new(),
			worklist: Vec::new(),
			graph: DiGraph::new(),
			by_instruction: vec![Vec::new(); code.instructions.len()],
			max_stack: 0,
			max_locals: locals.len() as u16,
		};

		ctx.worklist.push((0usize, Stack::new(), locals));
		while let Some((start, stack, locals)) = ctx.worklist.pop() {
			ctx.execute(start, stack, locals)?;
		}

		Ok(AnalyzerResult {
			graph: ctx.graph,
			by_instruction: ctx.by_instruction,
			max_stack: ctx.max_stack,
			max_locals: ctx.max_locals,
		})
	}
}

/// Maps every instruction's own [`Label`] to its index, plus the method's `last_label` (the
/// exclusive "one past the end" position used by exception/LVT ranges) to `instructions.len()`.
fn build_label_index(code: &Code) -> HashMap<Label, usize> {
	let mut index_of = HashMap::with_capacity(code.instructions.len() + 1);
	for (i, entry) in code.instructions.iter().enumerate() {
		if let Some(label) = entry.label {
			index_of.insert(label, i);
		}
	}
	if let Some(last) = code.last_label {
		index_of.entry(last).or_insert(code.instructions.len());
	}
	index_of
}

/// For each instruction, the (source-order) indices into `code.exception_table` of the blocks
/// covering it (§4.5.1).
fn build_handlers(code: &Code, index_of: &HashMap<Label, usize>) -> Result<Vec<Vec<usize>>, AnalyzerError> {
	let mut handlers = vec![Vec::new(); code.instructions.len()];
	for (ex_index, exception) in code.exception_table.iter().enumerate() {
		let start = *index_of.get(&exception.start).ok_or_else(|| label_not_found(exception.start))?;
		let end = *index_of.get(&exception.end).ok_or_else(|| label_not_found(exception.end))?;
		for instruction in start..end {
			handlers[instruction].push(ex_index);
		}
	}
	Ok(handlers)
}

fn value_of_type(ty: &Type) -> Value {
	match ty {
		Type::B | Type::C | Type::S | Type::Z | Type::I => Value::INT,
		Type::J => Value::LONG,
		Type::F => Value::FLOAT,
		Type::D => Value::DOUBLE,
		Type::Object(class) => Value::object(class.clone()),
		Type::Array(dim, inner) => Value::object(array_type_class_name(*dim, inner)),
	}
}

fn array_type_class_name(dim: u8, inner: &DescArrayType) -> ClassName {
	let descriptor = ParsedFieldDescriptor(Type::Array(dim, inner.clone())).write();
	// SAFETY: a field descriptor for an array type is itself a valid internal array class name.
	unsafe { ClassName::from_inner_unchecked(descriptor.into_inner()) }
}

/// The class name of a one-dimensional array whose element type is `element` (already a complete
/// internal name, possibly itself an array name for `ANEWARRAY` on an array component type).
fn array_of(element: &ClassName) -> ClassName {
	let inner = element.as_inner();
	let mut s = JavaString::from("[");
	if inner.starts_with('[') {
		s.push_java_str(inner);
	} else {
		s.push('L');
		s.push_java_str(inner);
		s.push(';');
	}
	// SAFETY: built from a valid class name by prepending a valid array-descriptor prefix.
	unsafe { ClassName::from_inner_unchecked(s) }
}

fn array_type_of_code_array_type(ty: CodeArrayType) -> DescArrayType {
	match ty {
		CodeArrayType::Boolean => DescArrayType::Z,
		CodeArrayType::Char => DescArrayType::C,
		CodeArrayType::Float => DescArrayType::F,
		CodeArrayType::Double => DescArrayType::D,
		CodeArrayType::Byte => DescArrayType::B,
		CodeArrayType::Short => DescArrayType::S,
		CodeArrayType::Int => DescArrayType::I,
		CodeArrayType::Long => DescArrayType::J,
	}
}

fn value_of_loadable(loadable: &Loadable) -> Result<Value, AnalyzerError> {
	Ok(match loadable {
		Loadable::Integer(_) => Value::INT,
		Loadable::Float(_) => Value::FLOAT,
		Loadable::Long(_) => Value::LONG,
		Loadable::Double(_) => Value::DOUBLE,
		Loadable::Class(_) => Value::object(ClassName::from("java/lang/Class")),
		Loadable::String(_) => Value::object(ClassName::from("java/lang/String")),
		Loadable::MethodHandle(_) => Value::object(ClassName::from("java/lang/invoke/MethodHandle")),
		Loadable::MethodType(_) => Value::object(ClassName::from("java/lang/invoke/MethodType")),
		Loadable::Dynamic(constant_dynamic) => {
			let parsed = constant_dynamic.descriptor.as_slice().parse()
				.map_err(|e| AnalyzerError::MalformedCode(format!("invalid constant dynamic descriptor: {e}")))?;
			value_of_type(&parsed.0)
		}
	})
}

/// What to do with the instruction pointer after processing one instruction (§4.5.2).
enum Step {
	/// Fall through to the next instruction, in the same `execute` call.
	Continue,
	/// A `{i,l,f,d,a}return`, plain `return`, or `athrow`: this path is done.
	Terminate,
	/// Branch to one or more successors; each new edge is pushed onto the worklist.
	Branch(Vec<usize>),
}

struct Context<'c> {
	code: &'c Code,
	index_of: HashMap<Label, usize>,
	handlers: Vec<Vec<usize>>,
	visited: HashSet<(usize, usize)>,
	worklist: Vec<(usize, Stack, Locals)>,
	graph: DiGraph<Frame, ()>,
	by_instruction: Vec<Vec<FrameId>>,
	max_stack: u16,
	max_locals: u16,
}

impl Context<'_> {
	fn resolve(&self, label: Label) -> Result<usize, AnalyzerError> {
		self.index_of.get(&label).copied().ok_or_else(|| label_not_found(label))
	}

	fn push_frame(&mut self, kind: FrameKind, instruction: usize, stack: &Stack, locals: &Locals) -> FrameId {
		let frame = Frame::new(kind, instruction, stack.snapshot(), locals.snapshot());
		let id = self.graph.add_node(frame);
		self.by_instruction[instruction].push(id);
		self.max_stack = self.max_stack.max(stack.len() as u16);
		self.max_locals = self.max_locals.max(locals.len() as u16);
		id
	}

	fn link(&mut self, consumer: FrameId, producer: FrameId) {
		self.graph[consumer].writes.push(producer);
		self.graph[producer].reads.push(consumer);
		self.graph.add_edge(producer, consumer, ());
	}

	fn link_all(&mut self, consumer: FrameId, producers: &[Option<FrameId>]) {
		for producer in producers.iter().flatten() {
			self.link(consumer, *producer);
		}
	}

	/// Walks straight-line code starting at `start`, recursing (via the worklist) at every branch
	/// and exception-handler edge (§4.5.2).
	fn execute(&mut self, start: usize, mut stack: Stack, mut locals: Locals) -> Result<(), AnalyzerError> {
		log::trace!("exploring from instruction {start} with stack depth {} and {} locals", stack.len(), locals.len());
		let mut idx = start;
		loop {
			let covering = self.handlers[idx].clone();
			for ex_index in covering {
				let exception = &self.code.exception_table[ex_index];
				let handler = self.resolve(exception.handler)?;
				if self.visited.insert((idx, handler)) {
					let catch = exception.catch.clone().unwrap_or_else(|| ClassName::from("java/lang/Throwable"));
					let mut handler_stack = Stack::new();
					handler_stack.push(Slot::new(Value::object(catch), None));
					self.worklist.push((handler, handler_stack, locals.clone()));
				}
			}

			let instruction = &self.code.instructions[idx].instruction;
			match self.step(idx, instruction, &mut stack, &mut locals)? {
				Step::Terminate => return Ok(()),
				Step::Continue => {
					idx += 1;
					if idx >= self.code.instructions.len() {
						return Err(AnalyzerError::FallOffEnd);
					}
				}
				Step::Branch(targets) => {
					for target in targets {
						if self.visited.insert((idx, target)) {
							self.worklist.push((target, stack.clone(), locals.clone()));
						}
					}
					return Ok(());
				}
			}
		}
	}

	fn step(&mut self, idx: usize, instruction: &Instruction, stack: &mut Stack, locals: &mut Locals) -> Result<Step, AnalyzerError> {
		use Instruction as I;

		match instruction {
			I::Nop => {
				self.push_frame(FrameKind::Argument, idx, stack, locals);
				Ok(Step::Continue)
			}

			I::AConstNull => self.push_constant(idx, stack, locals, Value::NULL),
			I::IConstM1 | I::IConst0 | I::IConst1 | I::IConst2 | I::IConst3 | I::IConst4 | I::IConst5 | I::BiPush(_) | I::SiPush(_) =>
				self.push_constant(idx, stack, locals, Value::INT),
			I::LConst0 | I::LConst1 => self.push_constant_wide(idx, stack, locals, Value::LONG),
			I::FConst0 | I::FConst1 | I::FConst2 => self.push_constant(idx, stack, locals, Value::FLOAT),
			I::DConst0 | I::DConst1 => self.push_constant_wide(idx, stack, locals, Value::DOUBLE),
			I::Ldc(loadable) => {
				let value = value_of_loadable(loadable)?;
				if value.is_wide() {
					self.push_constant_wide(idx, stack, locals, value)
				} else {
					self.push_constant(idx, stack, locals, value)
				}
			}

			I::ILoad(lv) | I::FLoad(lv) | I::ALoad(lv) => self.load(idx, stack, locals, lv.index as usize, false),
			I::LLoad(lv) | I::DLoad(lv) => self.load(idx, stack, locals, lv.index as usize, true),

			I::IStore(lv) | I::FStore(lv) | I::AStore(lv) => self.store(idx, stack, locals, lv.index as usize, false),
			I::LStore(lv) | I::DStore(lv) => self.store(idx, stack, locals, lv.index as usize, true),

			I::IALoad => self.array_load(idx, stack, locals, Value::INT, false),
			I::FALoad => self.array_load(idx, stack, locals, Value::FLOAT, false),
			I::BALoad | I::CALoad | I::SALoad => self.array_load(idx, stack, locals, Value::INT, false),
			I::LALoad => self.array_load(idx, stack, locals, Value::LONG, true),
			I::DALoad => self.array_load(idx, stack, locals, Value::DOUBLE, true),
			I::AALoad => {
				let array = stack.peek().map(|s| s.value.clone());
				let element = array.and_then(|v| v.descriptor).map(|d| element_type_of(&d))
					.unwrap_or_else(|| ClassName::JAVA_LANG_OBJECT.to_owned());
				self.array_load(idx, stack, locals, Value::object(element), false)
			}

			I::IAStore | I::FAStore | I::BAStore | I::CAStore | I::SAStore => self.array_store(idx, stack, locals, false),
			I::LAStore | I::DAStore => self.array_store(idx, stack, locals, true),
			I::AAStore => self.array_store(idx, stack, locals, false),

			I::Pop => {
				if stack.top_is_wide() {
					return Err(AnalyzerError::WideMismatch);
				}
				stack.pop()?;
				self.push_frame(FrameKind::Pop, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::Pop2 => {
				if stack.top_is_wide() {
					stack.pop_wide()?;
				} else {
					stack.pop()?;
					stack.pop()?;
				}
				self.push_frame(FrameKind::Pop, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::Dup => {
				if stack.top_is_wide() {
					return Err(AnalyzerError::WideMismatch);
				}
				let top = stack.peek_at(0).clone();
				stack.push(top);
				self.push_frame(FrameKind::Dup, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::DupX1 => {
				if stack.top_is_wide() {
					return Err(AnalyzerError::WideMismatch);
				}
				let v1 = stack.pop()?;
				let v2 = stack.pop()?;
				stack.push(v1.clone());
				stack.push(v2);
				stack.push(v1);
				self.push_frame(FrameKind::Dup, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::DupX2 => {
				if stack.top_is_wide() {
					return Err(AnalyzerError::WideMismatch);
				}
				let v1 = stack.pop()?;
				if stack.top_is_wide() {
					let v2 = stack.pop_wide()?;
					stack.push(v1.clone());
					stack.push_wide(v2);
					stack.push(v1);
				} else {
					let v2 = stack.pop()?;
					let v3 = stack.pop()?;
					stack.push(v1.clone());
					stack.push(v3);
					stack.push(v2);
					stack.push(v1);
				}
				self.push_frame(FrameKind::Dup, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::Dup2 => {
				if stack.top_is_wide() {
					let v = stack.pop_wide()?;
					stack.push_wide(v.clone());
					stack.push_wide(v);
				} else {
					let v1 = stack.pop()?;
					let v2 = stack.pop()?;
					stack.push(v2.clone());
					stack.push(v1.clone());
					stack.push(v2);
					stack.push(v1);
				}
				self.push_frame(FrameKind::Dup, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::Dup2X1 => {
				if stack.top_is_wide() {
					let v1 = stack.pop_wide()?;
					let v2 = stack.pop()?;
					stack.push_wide(v1.clone());
					stack.push(v2);
					stack.push_wide(v1);
				} else {
					let v1 = stack.pop()?;
					let v2 = stack.pop()?;
					let v3 = stack.pop()?;
					stack.push(v2.clone());
					stack.push(v1.clone());
					stack.push(v3);
					stack.push(v2);
					stack.push(v1);
				}
				self.push_frame(FrameKind::Dup, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::Dup2X2 => {
				if stack.top_is_wide() {
					let v1 = stack.pop_wide()?;
					if stack.top_is_wide() {
						let v2 = stack.pop_wide()?;
						stack.push_wide(v1.clone());
						stack.push_wide(v2);
						stack.push_wide(v1);
					} else {
						let v2 = stack.pop()?;
						let v3 = stack.pop()?;
						stack.push_wide(v1.clone());
						stack.push(v3);
						stack.push(v2);
						stack.push_wide(v1);
					}
				} else {
					let v1 = stack.pop()?;
					let v2 = stack.pop()?;
					if stack.top_is_wide() {
						let v3 = stack.pop_wide()?;
						stack.push(v2.clone());
						stack.push(v1.clone());
						stack.push_wide(v3);
						stack.push(v2);
						stack.push(v1);
					} else {
						let v3 = stack.pop()?;
						let v4 = stack.pop()?;
						stack.push(v2.clone());
						stack.push(v1.clone());
						stack.push(v4);
						stack.push(v3);
						stack.push(v2);
						stack.push(v1);
					}
				}
				self.push_frame(FrameKind::Dup, idx, stack, locals);
				Ok(Step::Continue)
			}
			I::Swap => {
				if stack.top_is_wide() || stack.is_wide_at(1) {
					return Err(AnalyzerError::WideMismatch);
				}
				let v1 = stack.pop()?;
				let v2 = stack.pop()?;
				stack.push(v1);
				stack.push(v2);
				self.push_frame(FrameKind::Swap, idx, stack, locals);
				Ok(Step::Continue)
			}

			I::IAdd | I::ISub | I::IMul | I::IDiv | I::IRem | I::IAnd | I::IOr | I::IXor =>
				self.binary(idx, stack, locals, false, false, Value::INT),
			I::IShl | I::IShr | I::IUShr => self.shift(idx, stack, locals, false),
			I::LShl | I::LShr | I::LUShr => self.shift(idx, stack, locals, true),
			I::LAdd | I::LSub | I::LMul | I::LDiv | I::LRem | I::LAnd | I::LOr | I::LXor =>
				self.binary(idx, stack, locals, true, true, Value::LONG),
			I::FAdd | I::FSub | I::FMul | I::FDiv | I::FRem => self.binary(idx, stack, locals, false, false, Value::FLOAT),
			I::DAdd | I::DSub | I::DMul | I::DDiv | I::DRem => self.binary(idx, stack, locals, true, true, Value::DOUBLE),

			I::INeg => self.unary(idx, stack, locals, false, Value::INT),
			I::LNeg => self.unary(idx, stack, locals, true, Value::LONG),
			I::FNeg => self.unary(idx, stack, locals, false, Value::FLOAT),
			I::DNeg => self.unary(idx, stack, locals, true, Value::DOUBLE),

			I::IInc(lv, _) => {
				let index = lv.index as usize;
				locals.ensure(index);
				let old_producer = locals.get(index).producer;
				let frame_id = self.push_frame(FrameKind::Local, idx, stack, locals);
				self.link_all(frame_id, &[old_producer]);
				locals.set_producer(index, frame_id);
				Ok(Step::Continue)
			}

			I::I2L => self.cast(idx, stack, locals, false, Value::LONG),
			I::I2F => self.cast(idx, stack, locals, false, Value::FLOAT),
			I::I2D => self.cast(idx, stack, locals, false, Value::DOUBLE),
			I::L2I => self.cast(idx, stack, locals, true, Value::INT),
			I::L2F => self.cast(idx, stack, locals, true, Value::FLOAT),
			I::L2D => self.cast(idx, stack, locals, true, Value::DOUBLE),
			I::F2I => self.cast(idx, stack, locals, false, Value::INT),
			I::F2L => self.cast(idx, stack, locals, false, Value::LONG),
			I::F2D => self.cast(idx, stack, locals, false, Value::DOUBLE),
			I::D2I => self.cast(idx, stack, locals, true, Value::INT),
			I::D2L => self.cast(idx, stack, locals, true, Value::LONG),
			I::D2F => self.cast(idx, stack, locals, true, Value::FLOAT),
			I::I2B | I::I2C | I::I2S => self.cast(idx, stack, locals, false, Value::INT),

			I::LCmp => self.compare(idx, stack, locals, true),
			I::FCmpL | I::FCmpG => self.compare(idx, stack, locals, false),
			I::DCmpL | I::DCmpG => self.compare(idx, stack, locals, true),

			I::IfEq(label) | I::IfNe(label) | I::IfLt(label) | I::IfGe(label) | I::IfGt(label) | I::IfLe(label) |
			I::IfNull(label) | I::IfNonNull(label) => {
				let cond = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Jump, idx, stack, locals);
				self.link_all(frame_id, &[cond.producer]);
				let target = self.resolve(*label)?;
				Ok(Step::Branch(vec![target, idx + 1]))
			}
			I::IfICmpEq(label) | I::IfICmpNe(label) | I::IfICmpLt(label) | I::IfICmpGe(label) | I::IfICmpGt(label) | I::IfICmpLe(label) |
			I::IfACmpEq(label) | I::IfACmpNe(label) => {
				let b = stack.pop()?;
				let a = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Jump, idx, stack, locals);
				self.link_all(frame_id, &[a.producer, b.producer]);
				let target = self.resolve(*label)?;
				Ok(Step::Branch(vec![target, idx + 1]))
			}
			I::Goto(label) => {
				self.push_frame(FrameKind::Jump, idx, stack, locals);
				let target = self.resolve(*label)?;
				Ok(Step::Branch(vec![target]))
			}
			I::Jsr(_) => Err(AnalyzerError::UnsupportedOpcode("JSR")),
			I::Ret(_) => Err(AnalyzerError::UnsupportedOpcode("RET")),

			I::TableSwitch { default, table, .. } => {
				let key = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Switch, idx, stack, locals);
				self.link_all(frame_id, &[key.producer]);
				let mut targets = Vec::with_capacity(table.len() + 1);
				for label in table {
					targets.push(self.resolve(*label)?);
				}
				targets.push(self.resolve(*default)?);
				Ok(Step::Branch(targets))
			}
			I::LookupSwitch { default, pairs } => {
				let key = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Switch, idx, stack, locals);
				self.link_all(frame_id, &[key.producer]);
				let mut targets = Vec::with_capacity(pairs.len() + 1);
				for (_, label) in pairs {
					targets.push(self.resolve(*label)?);
				}
				targets.push(self.resolve(*default)?);
				Ok(Step::Branch(targets))
			}

			I::IReturn | I::FReturn | I::AReturn => {
				let value = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Return, idx, stack, locals);
				self.link_all(frame_id, &[value.producer]);
				Ok(Step::Terminate)
			}
			I::LReturn | I::DReturn => {
				let value = stack.pop_wide()?;
				let frame_id = self.push_frame(FrameKind::Return, idx, stack, locals);
				self.link_all(frame_id, &[value.producer]);
				Ok(Step::Terminate)
			}
			I::Return => {
				self.push_frame(FrameKind::Return, idx, stack, locals);
				Ok(Step::Terminate)
			}

			I::GetStatic(r) => {
				let parsed = r.desc.as_slice().parse()
					.map_err(|e| AnalyzerError::MalformedCode(format!("invalid field descriptor: {e}")))?;
				let value = value_of_type(&parsed.0);
				let wide = value.is_wide();
				if wide {
					stack.push_wide(Slot::new(value, None));
				} else {
					stack.push(Slot::new(value, None));
				}
				let frame_id = self.push_frame(FrameKind::Field, idx, stack, locals);
				if wide {
					stack.set_producer_of_wide_top(frame_id);
				} else {
					stack.set_producer_of_top(frame_id);
				}
				Ok(Step::Continue)
			}
			I::PutStatic(_) => {
				let wide = stack.top_is_wide();
				let value = if wide { stack.pop_wide()? } else { stack.pop()? };
				let frame_id = self.push_frame(FrameKind::Field, idx, stack, locals);
				self.link_all(frame_id, &[value.producer]);
				Ok(Step::Continue)
			}
			I::GetField(r) => {
				let object = stack.pop()?;
				let parsed = r.desc.as_slice().parse()
					.map_err(|e| AnalyzerError::MalformedCode(format!("invalid field descriptor: {e}")))?;
				let value = value_of_type(&parsed.0);
				let frame_id = if value.is_wide() {
					stack.push_wide(Slot::new(value, None));
					let id = self.push_frame(FrameKind::Field, idx, stack, locals);
					stack.set_producer_of_wide_top(id);
					id
				} else {
					stack.push(Slot::new(value, None));
					let id = self.push_frame(FrameKind::Field, idx, stack, locals);
					stack.set_producer_of_top(id);
					id
				};
				self.link_all(frame_id, &[object.producer]);
				Ok(Step::Continue)
			}
			I::PutField(_) => {
				let wide = stack.top_is_wide();
				let value = if wide { stack.pop_wide()? } else { stack.pop()? };
				let object = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Field, idx, stack, locals);
				self.link_all(frame_id, &[value.producer, object.producer]);
				Ok(Step::Continue)
			}

			I::InvokeVirtual(r) | I::InvokeInterface(r) => self.invoke(idx, stack, locals, &r.desc, true, false),
			I::InvokeSpecial(r, _) => self.invoke(idx, stack, locals, &r.desc, true, true),
			I::InvokeStatic(r, _) => self.invoke(idx, stack, locals, &r.desc, false, false),
			I::InvokeDynamic(indy) => self.invoke(idx, stack, locals, &indy.descriptor, false, false),

			I::New(class) => {
				let class = class.clone();
				stack.push(Slot::new(Value::uninitialized(class), None));
				let frame_id = self.push_frame(FrameKind::New, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				Ok(Step::Continue)
			}
			I::NewArray(array_type) => {
				let length = stack.pop()?;
				let element = array_type_class_name(1, &array_type_of_code_array_type(*array_type));
				stack.push(Slot::new(Value::object(element), None));
				let frame_id = self.push_frame(FrameKind::NewArray, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				self.link_all(frame_id, &[length.producer]);
				Ok(Step::Continue)
			}
			I::ANewArray(class) => {
				let length = stack.pop()?;
				let array = array_of(class);
				stack.push(Slot::new(Value::object(array), None));
				let frame_id = self.push_frame(FrameKind::NewArray, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				self.link_all(frame_id, &[length.producer]);
				Ok(Step::Continue)
			}
			I::ArrayLength => {
				let array = stack.pop()?;
				stack.push(Slot::new(Value::INT, None));
				let frame_id = self.push_frame(FrameKind::ArrayLength, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				self.link_all(frame_id, &[array.producer]);
				Ok(Step::Continue)
			}
			I::AThrow => {
				let thrown = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Throw, idx, stack, locals);
				self.link_all(frame_id, &[thrown.producer]);
				Ok(Step::Terminate)
			}
			I::CheckCast(class) => {
				let top = stack.pop()?;
				let value = if top.value.ty == crate::analysis::value::ValueType::Null {
					Value::NULL
				} else {
					Value::object(class.clone())
				};
				let old_producer = top.producer;
				stack.push(Slot::new(value, None));
				let frame_id = self.push_frame(FrameKind::CheckCast, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				self.link_all(frame_id, &[old_producer]);
				Ok(Step::Continue)
			}
			I::InstanceOf(_) => {
				let object = stack.pop()?;
				stack.push(Slot::new(Value::INT, None));
				let frame_id = self.push_frame(FrameKind::InstanceOf, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				self.link_all(frame_id, &[object.producer]);
				Ok(Step::Continue)
			}
			I::MonitorEnter | I::MonitorExit => {
				let object = stack.pop()?;
				let frame_id = self.push_frame(FrameKind::Monitor, idx, stack, locals);
				self.link_all(frame_id, &[object.producer]);
				Ok(Step::Continue)
			}
			I::MultiANewArray(class, dims) => {
				let mut producers = Vec::with_capacity(*dims as usize);
				for _ in 0..*dims {
					producers.push(stack.pop()?.producer);
				}
				producers.reverse();
				stack.push(Slot::new(Value::object(class.clone()), None));
				let frame_id = self.push_frame(FrameKind::MultiANewArray, idx, stack, locals);
				stack.set_producer_of_top(frame_id);
				self.link_all(frame_id, &producers);
				Ok(Step::Continue)
			}
		}
	}

	fn push_constant(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, value: Value) -> Result<Step, AnalyzerError> {
		stack.push(Slot::new(value, None));
		let frame_id = self.push_frame(FrameKind::Ldc, idx, stack, locals);
		stack.set_producer_of_top(frame_id);
		Ok(Step::Continue)
	}

	fn push_constant_wide(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, value: Value) -> Result<Step, AnalyzerError> {
		stack.push_wide(Slot::new(value, None));
		let frame_id = self.push_frame(FrameKind::Ldc, idx, stack, locals);
		stack.set_producer_of_wide_top(frame_id);
		Ok(Step::Continue)
	}

	fn load(&mut self, idx: usize, stack: &mut Stack, locals: &mut Locals, index: usize, wide: bool) -> Result<Step, AnalyzerError> {
		locals.ensure(if wide { index + 1 } else { index });
		let mut slot = locals.get(index).clone();
		let old_producer = slot.producer;
		slot.producer = None;
		// preserves `is_this`/`is_initialized` from the local, so an `ALOAD 0; INVOKESPECIAL <init>`
		// pattern still sees the receiver as `this` (§4.5.3).
		if wide {
			stack.push_wide(slot);
		} else {
			stack.push(slot);
		}
		let frame_id = self.push_frame(FrameKind::Local, idx, stack, locals);
		if wide {
			stack.set_producer_of_wide_top(frame_id);
		} else {
			stack.set_producer_of_top(frame_id);
		}
		self.link_all(frame_id, &[old_producer]);
		Ok(Step::Continue)
	}

	fn store(&mut self, idx: usize, stack: &mut Stack, locals: &mut Locals, index: usize, wide: bool) -> Result<Step, AnalyzerError> {
		let value = if wide { stack.pop_wide()? } else { stack.pop()? };
		let old_producer = value.producer;
		if wide {
			locals.set_wide(index, Slot::new(value.value, None));
		} else {
			locals.set(index, Slot::new(value.value, None));
		}
		let frame_id = self.push_frame(FrameKind::Local, idx, stack, locals);
		if wide {
			locals.set_producer_wide(index, frame_id);
		} else {
			locals.set_producer(index, frame_id);
		}
		self.link_all(frame_id, &[old_producer]);
		Ok(Step::Continue)
	}

	fn array_load(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, element: Value, wide: bool) -> Result<Step, AnalyzerError> {
		let index = stack.pop()?;
		let array = stack.pop()?;
		if wide {
			stack.push_wide(Slot::new(element, None));
		} else {
			stack.push(Slot::new(element, None));
		}
		let frame_id = self.push_frame(FrameKind::ArrayLoad, idx, stack, locals);
		if wide {
			stack.set_producer_of_wide_top(frame_id);
		} else {
			stack.set_producer_of_top(frame_id);
		}
		self.link_all(frame_id, &[array.producer, index.producer]);
		Ok(Step::Continue)
	}

	fn array_store(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, wide: bool) -> Result<Step, AnalyzerError> {
		let value = if wide { stack.pop_wide()? } else { stack.pop()? };
		let index = stack.pop()?;
		let array = stack.pop()?;
		let frame_id = self.push_frame(FrameKind::ArrayStore, idx, stack, locals);
		self.link_all(frame_id, &[array.producer, index.producer, value.producer]);
		Ok(Step::Continue)
	}

	fn binary(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, wide_a: bool, wide_b: bool, result: Value) -> Result<Step, AnalyzerError> {
		let b = if wide_b { stack.pop_wide()? } else { stack.pop()? };
		let a = if wide_a { stack.pop_wide()? } else { stack.pop()? };
		if result.is_wide() {
			stack.push_wide(Slot::new(result, None));
		} else {
			stack.push(Slot::new(result, None));
		}
		let frame_id = self.push_frame(FrameKind::Math, idx, stack, locals);
		if stack.top_is_wide() {
			stack.set_producer_of_wide_top(frame_id);
		} else {
			stack.set_producer_of_top(frame_id);
		}
		self.link_all(frame_id, &[a.producer, b.producer]);
		Ok(Step::Continue)
	}

	fn shift(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, wide: bool) -> Result<Step, AnalyzerError> {
		let amount = stack.pop()?;
		let value = if wide { stack.pop_wide()? } else { stack.pop()? };
		if wide {
			stack.push_wide(Slot::new(value.value.clone(), None));
		} else {
			stack.push(Slot::new(value.value.clone(), None));
		}
		let frame_id = self.push_frame(FrameKind::Math, idx, stack, locals);
		if wide {
			stack.set_producer_of_wide_top(frame_id);
		} else {
			stack.set_producer_of_top(frame_id);
		}
		self.link_all(frame_id, &[value.producer, amount.producer]);
		Ok(Step::Continue)
	}

	fn unary(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, wide: bool, result: Value) -> Result<Step, AnalyzerError> {
		let value = if wide { stack.pop_wide()? } else { stack.pop()? };
		if result.is_wide() {
			stack.push_wide(Slot::new(result, None));
		} else {
			stack.push(Slot::new(result, None));
		}
		let frame_id = self.push_frame(FrameKind::Math, idx, stack, locals);
		if stack.top_is_wide() {
			stack.set_producer_of_wide_top(frame_id);
		} else {
			stack.set_producer_of_top(frame_id);
		}
		self.link_all(frame_id, &[value.producer]);
		Ok(Step::Continue)
	}

	fn cast(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, wide_in: bool, result: Value) -> Result<Step, AnalyzerError> {
		let value = if wide_in { stack.pop_wide()? } else { stack.pop()? };
		if result.is_wide() {
			stack.push_wide(Slot::new(result, None));
		} else {
			stack.push(Slot::new(result, None));
		}
		let frame_id = self.push_frame(FrameKind::Math, idx, stack, locals);
		if stack.top_is_wide() {
			stack.set_producer_of_wide_top(frame_id);
		} else {
			stack.set_producer_of_top(frame_id);
		}
		self.link_all(frame_id, &[value.producer]);
		Ok(Step::Continue)
	}

	fn compare(&mut self, idx: usize, stack: &mut Stack, locals: &Locals, wide: bool) -> Result<Step, AnalyzerError> {
		let b = if wide { stack.pop_wide()? } else { stack.pop()? };
		let a = if wide { stack.pop_wide()? } else { stack.pop()? };
		stack.push(Slot::new(Value::INT, None));
		let frame_id = self.push_frame(FrameKind::Math, idx, stack, locals);
		stack.set_producer_of_top(frame_id);
		self.link_all(frame_id, &[a.producer, b.producer]);
		Ok(Step::Continue)
	}

	fn invoke(&mut self, idx: usize, stack: &mut Stack, locals: &mut Locals, descriptor: &crate::tree::method::MethodDescriptor, has_receiver: bool, is_special: bool) -> Result<Step, AnalyzerError> {
		let parsed = descriptor.as_slice().parse()
			.map_err(|e| AnalyzerError::MalformedCode(format!("invalid method descriptor: {e}")))?;

		let mut arguments = Vec::with_capacity(parsed.parameter_descriptors.len());
		for parameter in parsed.parameter_descriptors.iter().rev() {
			let value = value_of_type(parameter);
			let popped = if value.is_wide() { stack.pop_wide()? } else { stack.pop()? };
			arguments.push(popped.producer);
		}
		arguments.reverse();

		let receiver = if has_receiver {
			let receiver = stack.pop()?;
			if is_special && receiver.is_this {
				locals.mark_this_initialized();
			}
			Some(receiver)
		} else {
			None
		};

		if let Some(return_type) = &parsed.return_descriptor {
			let value = value_of_type(return_type);
			if value.is_wide() {
				stack.push_wide(Slot::new(value, None));
			} else {
				stack.push(Slot::new(value, None));
			}
		}

		let frame_id = self.push_frame(FrameKind::Method, idx, stack, locals);
		if parsed.return_descriptor.is_some() {
			if stack.top_is_wide() {
				stack.set_producer_of_wide_top(frame_id);
			} else {
				stack.set_producer_of_top(frame_id);
			}
		}
		if let Some(receiver) = &receiver {
			self.link_all(frame_id, &[receiver.producer]);
		}
		self.link_all(frame_id, &arguments);

		Ok(Step::Continue)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use crate::analysis::frame::FrameKind;
	use crate::analysis::value::Value;
	use crate::tree::class::ClassName;
	use crate::tree::method::{Method, MethodAccess, MethodDescriptor, MethodName};
	use crate::tree::method::code::{Code, Exception, Instruction, InstructionListEntry, Label, LvIndex};
	use super::{AnalyzerError, MethodAnalyzer};

	const STATIC: u16 = 0x0008;

	fn entry(label: Option<Label>, instruction: Instruction) -> InstructionListEntry {
		InstructionListEntry { label, frame: None, instruction }
	}

	fn owner() -> ClassName {
		ClassName::from("test/Owner")
	}

	fn method(access: u16, name: &str, descriptor: &str, code: Code) -> Method {
		let mut method = Method::new(MethodAccess::from(access), MethodName::from(name), MethodDescriptor::from(descriptor));
		method.code = Some(code);
		method
	}

	/// `static int add(int, int) { return a + b; }` (§8, scenario 1).
	#[test]
	fn static_int_add_produces_expected_frames_and_is_not_constant() {
		let code = Code {
			instructions: vec![
				entry(None, Instruction::ILoad(LvIndex { index: 0 })),
				entry(None, Instruction::ILoad(LvIndex { index: 1 })),
				entry(None, Instruction::IAdd),
				entry(None, Instruction::IReturn),
			],
			..Code::default()
		};
		let method = method(STATIC, "add", "(II)I", code);

		let result = MethodAnalyzer::analyze(&owner(), &method).unwrap();

		assert_eq!(result.max_stack, 2);
		assert_eq!(result.max_locals, 2);

		let iload0 = result.frames_at(0);
		assert_eq!(iload0.len(), 1);
		assert_eq!(result.frame(iload0[0]).stack, vec![Value::INT]);

		let iload1 = result.frames_at(1);
		assert_eq!(iload1.len(), 1);
		assert_eq!(result.frame(iload1[0]).stack, vec![Value::INT, Value::INT]);

		let iadd = result.frames_at(2);
		assert_eq!(iadd.len(), 1);
		assert_eq!(result.frame(iadd[0]).kind, FrameKind::Math);
		assert_eq!(result.frame(iadd[0]).stack, vec![Value::INT]);
		assert_eq!(result.writes(iadd[0]), &[iload0[0], iload1[0]]);
		assert!(!result.is_constant(iadd[0]));

		let ireturn = result.frames_at(3);
		assert_eq!(ireturn.len(), 1);
		assert_eq!(result.writes(ireturn[0]), &[iadd[0]]);
	}

	/// `static long id(long x) { return x; }` (§8, scenario 2): wide slots round-trip through the
	/// stack as a value plus its `TOP` companion.
	#[test]
	fn static_long_identity_round_trips_wide_slots() {
		let code = Code {
			instructions: vec![
				entry(None, Instruction::LLoad(LvIndex { index: 0 })),
				entry(None, Instruction::LReturn),
			],
			..Code::default()
		};
		let method = method(STATIC, "id", "(J)J", code);

		let result = MethodAnalyzer::analyze(&owner(), &method).unwrap();

		assert_eq!(result.max_stack, 2);
		assert_eq!(result.max_locals, 2);

		let lload = result.frames_at(0);
		assert_eq!(result.frame(lload[0]).stack, vec![Value::LONG, Value::TOP]);

		let lreturn = result.frames_at(1);
		assert_eq!(lreturn.len(), 1);
		assert_eq!(result.writes(lreturn[0]), &[lload[0]]);
	}

	/// `GOTO L; L: RETURN` (§8, scenario 3): a single execute path, no fallthrough from `GOTO`.
	#[test]
	fn goto_has_no_fallthrough_successor() {
		let l = Label { id: 0 };
		let code = Code {
			instructions: vec![
				entry(None, Instruction::Goto(l)),
				entry(Some(l), Instruction::Return),
			],
			..Code::default()
		};
		let method = method(STATIC, "m", "()V", code);

		let result = MethodAnalyzer::analyze(&owner(), &method).unwrap();

		assert_eq!(result.frames_at(0).len(), 1);
		assert_eq!(result.frames_at(1).len(), 1);
	}

	/// `IFEQ L1; ICONST_0; GOTO L2; L1: ICONST_1; L2: IRETURN` (§8, scenario 4): the instruction at
	/// `L2` is reached twice, once per branch, and both reaches are recorded as distinct frames.
	#[test]
	fn diamond_branch_visits_join_point_twice() {
		let l1 = Label { id: 0 };
		let l2 = Label { id: 1 };
		let code = Code {
			instructions: vec![
				entry(None, Instruction::ILoad(LvIndex { index: 0 })),
				entry(None, Instruction::IfEq(l1)),
				entry(None, Instruction::IConst0),
				entry(None, Instruction::Goto(l2)),
				entry(Some(l1), Instruction::IConst1),
				entry(Some(l2), Instruction::IReturn),
			],
			..Code::default()
		};
		let method = method(STATIC, "m", "(I)I", code);

		let result = MethodAnalyzer::analyze(&owner(), &method).unwrap();

		let ireturn = result.frames_at(5);
		assert_eq!(ireturn.len(), 2);
		for &id in ireturn {
			assert_eq!(result.frame(id).stack, vec![Value::INT]);
		}
	}

	/// A `try`/`catch(Throwable)` block (§8, scenario 5): the handler-dispatch step recurses with a
	/// fresh stack holding a single slot typed as the caught class.
	#[test]
	fn exception_handler_dispatch_seeds_a_fresh_stack_with_the_caught_type() {
		let try_start = Label { id: 0 };
		let try_end = Label { id: 1 };
		let handler = Label { id: 2 };
		let throwable = ClassName::from("java/lang/Throwable");

		let code = Code {
			instructions: vec![
				entry(Some(try_start), Instruction::ALoad(LvIndex { index: 1 })),
				entry(None, Instruction::AStore(LvIndex { index: 1 })),
				entry(Some(try_end), Instruction::AConstNull),
				entry(None, Instruction::AReturn),
				entry(Some(handler), Instruction::AStore(LvIndex { index: 2 })),
				entry(None, Instruction::ALoad(LvIndex { index: 2 })),
				entry(None, Instruction::AReturn),
			],
			exception_table: vec![
				Exception { start: try_start, end: try_end, handler, catch: Some(throwable.clone()) },
			],
			..Code::default()
		};
		// instance method `Object m(Object o)`: locals 0 = this, 1 = o.
		let method = method(0, "m", "(Ljava/lang/Object;)Ljava/lang/Object;", code);

		let result = MethodAnalyzer::analyze(&owner(), &method).unwrap();

		let astore_handler = result.frames_at(4);
		// reached once from each of the two protected instructions (0 and 1).
		assert_eq!(astore_handler.len(), 2);
		for &id in astore_handler {
			// the handler's incoming stack, before the ASTORE pops it, held one Throwable slot.
			assert_eq!(result.frame(id).stack, Vec::<Value>::new());
		}
	}

	/// `JSR L1` (§8, scenario 6): refused outright, no partial frames persisted.
	#[test]
	fn jsr_is_refused() {
		let l = Label { id: 0 };
		let code = Code {
			instructions: vec![
				entry(None, Instruction::Jsr(l)),
				entry(Some(l), Instruction::Pop),
				entry(None, Instruction::Return),
			],
			..Code::default()
		};
		let method = method(STATIC, "m", "()V", code);

		let result = MethodAnalyzer::analyze(&owner(), &method);
		assert!(matches!(result, Err(AnalyzerError::UnsupportedOpcode("JSR"))));
	}

	/// Abstract and native methods have no code to walk; analysis returns an empty result (§4.5.1).
	#[test]
	fn abstract_method_analyzes_to_an_empty_result() {
		let mut method = Method::new(MethodAccess::from(0x0400 /* abstract */), MethodName::from("m"), MethodDescriptor::from("()V"));
		method.code = None;

		let result = MethodAnalyzer::analyze(&owner(), &method).unwrap();

		assert_eq!(result.max_stack, 0);
		assert_eq!(result.max_locals, 0);
		assert!(result.frames_at(0).is_empty());
	}
}

/// The element type of an array whose own class name is `array_descriptor` -- used to give
/// `AALOAD` a more precise result type than a bare `java/lang/Object` where possible (§4.5.3 only
/// requires `Object`; this crate's non-goal of verifier-level type merging doesn't forbid being
/// more precise when the information is already at hand).
fn element_type_of(array_descriptor: &ClassName) -> ClassName {
	// SAFETY: an array class name is itself always a valid field descriptor string.
	let as_field_descriptor = unsafe {
		crate::tree::field::FieldDescriptor::from_inner_unchecked(array_descriptor.as_inner().to_owned())
	};
	match as_field_descriptor.as_slice().parse() {
		Ok(ParsedFieldDescriptor(Type::Array(dim, inner))) if dim > 1 => array_type_class_name(dim - 1, &inner),
		Ok(ParsedFieldDescriptor(Type::Array(_, DescArrayType::Object(class)))) => class,
		_ => ClassName::JAVA_LANG_OBJECT.to_owned(),
	}
}
