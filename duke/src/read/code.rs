//! Decodes a method's raw `code` array into duke's typed [`Instruction`] list.
//!
//! Every branch target, exception range bound, and line/local-variable-range bound becomes a
//! [`Label`] built directly from its bytecode offset (`Label { id: offset as u16 }`): JVMS 4.7.3
//! caps `code_length` at `u16::MAX`, so every valid offset already fits, and [`Label::id`] is only
//! `pub(crate)`-visible, which this module gets for free by living inside the `duke` crate.

use anyhow::{bail, Result};
use crate::read::cursor::Cursor;
use crate::read::pool::ConstantPool;
use crate::tree::method::code::{ArrayType, Code, Exception, Instruction, InstructionListEntry, Label, LvIndex};

mod opcode {
	pub(super) const NOP: u8 = 0x00;
	pub(super) const ACONST_NULL: u8 = 0x01;
	pub(super) const ICONST_M1: u8 = 0x02;
	pub(super) const ICONST_0: u8 = 0x03;
	pub(super) const ICONST_5: u8 = 0x08;
	pub(super) const LCONST_0: u8 = 0x09;
	pub(super) const LCONST_1: u8 = 0x0a;
	pub(super) const FCONST_0: u8 = 0x0b;
	pub(super) const FCONST_2: u8 = 0x0d;
	pub(super) const DCONST_0: u8 = 0x0e;
	pub(super) const DCONST_1: u8 = 0x0f;
	pub(super) const BIPUSH: u8 = 0x10;
	pub(super) const SIPUSH: u8 = 0x11;
	pub(super) const LDC: u8 = 0x12;
	pub(super) const LDC_W: u8 = 0x13;
	pub(super) const LDC2_W: u8 = 0x14;
	pub(super) const ILOAD: u8 = 0x15;
	pub(super) const LLOAD: u8 = 0x16;
	pub(super) const FLOAD: u8 = 0x17;
	pub(super) const DLOAD: u8 = 0x18;
	pub(super) const ALOAD: u8 = 0x19;
	pub(super) const ILOAD_0: u8 = 0x1a;
	pub(super) const LLOAD_0: u8 = 0x1e;
	pub(super) const FLOAD_0: u8 = 0x22;
	pub(super) const DLOAD_0: u8 = 0x26;
	pub(super) const ALOAD_0: u8 = 0x2a;
	pub(super) const IALOAD: u8 = 0x2e;
	pub(super) const SALOAD: u8 = 0x35;
	pub(super) const ISTORE: u8 = 0x36;
	pub(super) const LSTORE: u8 = 0x37;
	pub(super) const FSTORE: u8 = 0x38;
	pub(super) const DSTORE: u8 = 0x39;
	pub(super) const ASTORE: u8 = 0x3a;
	pub(super) const ISTORE_0: u8 = 0x3b;
	pub(super) const LSTORE_0: u8 = 0x3f;
	pub(super) const FSTORE_0: u8 = 0x43;
	pub(super) const DSTORE_0: u8 = 0x47;
	pub(super) const ASTORE_0: u8 = 0x4b;
	pub(super) const IASTORE: u8 = 0x4f;
	pub(super) const SASTORE: u8 = 0x56;
	pub(super) const POP: u8 = 0x57;
	pub(super) const POP2: u8 = 0x58;
	pub(super) const DUP: u8 = 0x59;
	pub(super) const DUP_X1: u8 = 0x5a;
	pub(super) const DUP_X2: u8 = 0x5b;
	pub(super) const DUP2: u8 = 0x5c;
	pub(super) const DUP2_X1: u8 = 0x5d;
	pub(super) const DUP2_X2: u8 = 0x5e;
	pub(super) const SWAP: u8 = 0x5f;
	pub(super) const IADD: u8 = 0x60;
	pub(super) const LXOR: u8 = 0x83;
	pub(super) const IINC: u8 = 0x84;
	pub(super) const I2L: u8 = 0x85;
	pub(super) const I2S: u8 = 0x93;
	pub(super) const LCMP: u8 = 0x94;
	pub(super) const FCMPL: u8 = 0x95;
	pub(super) const DCMPG: u8 = 0x98;
	pub(super) const IFEQ: u8 = 0x99;
	pub(super) const IFLE: u8 = 0x9e;
	pub(super) const IF_ICMPEQ: u8 = 0x9f;
	pub(super) const IF_ICMPLE: u8 = 0xa4;
	pub(super) const IF_ACMPEQ: u8 = 0xa5;
	pub(super) const IF_ACMPNE: u8 = 0xa6;
	pub(super) const GOTO: u8 = 0xa7;
	pub(super) const JSR: u8 = 0xa8;
	pub(super) const RET: u8 = 0xa9;
	pub(super) const TABLESWITCH: u8 = 0xaa;
	pub(super) const LOOKUPSWITCH: u8 = 0xab;
	pub(super) const IRETURN: u8 = 0xac;
	pub(super) const RETURN: u8 = 0xb1;
	pub(super) const GETSTATIC: u8 = 0xb2;
	pub(super) const PUTSTATIC: u8 = 0xb3;
	pub(super) const GETFIELD: u8 = 0xb4;
	pub(super) const PUTFIELD: u8 = 0xb5;
	pub(super) const INVOKEVIRTUAL: u8 = 0xb6;
	pub(super) const INVOKESPECIAL: u8 = 0xb7;
	pub(super) const INVOKESTATIC: u8 = 0xb8;
	pub(super) const INVOKEINTERFACE: u8 = 0xb9;
	pub(super) const INVOKEDYNAMIC: u8 = 0xba;
	pub(super) const NEW: u8 = 0xbb;
	pub(super) const NEWARRAY: u8 = 0xbc;
	pub(super) const ANEWARRAY: u8 = 0xbd;
	pub(super) const ARRAYLENGTH: u8 = 0xbe;
	pub(super) const ATHROW: u8 = 0xbf;
	pub(super) const CHECKCAST: u8 = 0xc0;
	pub(super) const INSTANCEOF: u8 = 0xc1;
	pub(super) const MONITORENTER: u8 = 0xc2;
	pub(super) const MONITOREXIT: u8 = 0xc3;
	pub(super) const WIDE: u8 = 0xc4;
	pub(super) const MULTIANEWARRAY: u8 = 0xc5;
	pub(super) const IFNULL: u8 = 0xc6;
	pub(super) const IFNONNULL: u8 = 0xc7;
	pub(super) const GOTO_W: u8 = 0xc8;
	pub(super) const JSR_W: u8 = 0xc9;
}

/// Reads a method's entire `Code` attribute body (everything after `attribute_length`).
pub(crate) fn read_code_attribute(cursor: &mut Cursor, pool: &ConstantPool) -> Result<Code> {
	let max_stack = cursor.u16()?;
	let max_locals = cursor.u16()?;
	let code_length = cursor.u32()?;
	let code_bytes = cursor.bytes(code_length as usize)?;
	let instructions = decode_instructions(code_bytes, pool)?;

	let exception_table_length = cursor.u16()?;
	let mut exception_table = Vec::with_capacity(exception_table_length as usize);
	for _ in 0..exception_table_length {
		let start = cursor.u16()?;
		let end = cursor.u16()?;
		let handler = cursor.u16()?;
		let catch_type = cursor.u16()?;
		exception_table.push(Exception {
			start: Label { id: start },
			end: Label { id: end },
			handler: Label { id: handler },
			catch: if catch_type == 0 { None } else { Some(pool.class_name(catch_type)?) },
		});
	}

	let mut code = Code {
		max_stack: Some(max_stack),
		max_locals: Some(max_locals),
		instructions,
		exception_table,
		last_label: Some(Label { id: code_length as u16 }),
		..Code::default()
	};

	let attribute_count = cursor.u16()?;
	for _ in 0..attribute_count {
		super::attribute::read_code_sub_attribute(cursor, pool, &mut code)?;
	}

	Ok(code)
}

fn decode_instructions(code: &[u8], pool: &ConstantPool) -> Result<Vec<InstructionListEntry>> {
	let mut cursor = Cursor::new(code);
	let mut entries = Vec::new();

	while cursor.remaining() > 0 {
		let pc = cursor.position();
		let op = cursor.u8()?;
		let label = Some(Label { id: pc as u16 });

		let target = |offset: i32| -> Label {
			Label { id: (pc as i64 + offset as i64) as u16 }
		};

		let instruction = match op {
			opcode::NOP => Instruction::Nop,
			opcode::ACONST_NULL => Instruction::AConstNull,
			opcode::ICONST_M1..=opcode::ICONST_5 => const_int(op - opcode::ICONST_M1),
			opcode::LCONST_0 => Instruction::LConst0,
			opcode::LCONST_1 => Instruction::LConst1,
			opcode::FCONST_0..=opcode::FCONST_2 => const_float(op - opcode::FCONST_0),
			opcode::DCONST_0 => Instruction::DConst0,
			opcode::DCONST_1 => Instruction::DConst1,
			opcode::BIPUSH => Instruction::BiPush(cursor.i8()?),
			opcode::SIPUSH => Instruction::SiPush(cursor.i16()?),
			opcode::LDC => {
				let index = cursor.u8()? as u16;
				Instruction::Ldc(pool.loadable(index)?)
			}
			opcode::LDC_W | opcode::LDC2_W => Instruction::Ldc(pool.loadable(cursor.u16()?)?),
			opcode::ILOAD..=opcode::ALOAD => load_store(op - opcode::ILOAD, cursor.u8()? as u16, false),
			opcode::ILOAD_0..=0x2d /* aload_3 */ => {
				let group = (op - opcode::ILOAD_0) / 4;
				let local = (op - opcode::ILOAD_0) % 4;
				load_store(group, local as u16, false)
			}
			opcode::IALOAD..=opcode::SALOAD => array_load(op - opcode::IALOAD),
			opcode::ISTORE..=opcode::ASTORE => load_store(op - opcode::ISTORE, cursor.u8()? as u16, true),
			opcode::ISTORE_0..=0x4e /* astore_3 */ => {
				let group = (op - opcode::ISTORE_0) / 4;
				let local = (op - opcode::ISTORE_0) % 4;
				load_store(group, local as u16, true)
			}
			opcode::IASTORE..=opcode::SASTORE => array_store(op - opcode::IASTORE),
			opcode::POP => Instruction::Pop,
			opcode::POP2 => Instruction::Pop2,
			opcode::DUP => Instruction::Dup,
			opcode::DUP_X1 => Instruction::DupX1,
			opcode::DUP_X2 => Instruction::DupX2,
			opcode::DUP2 => Instruction::Dup2,
			opcode::DUP2_X1 => Instruction::Dup2X1,
			opcode::DUP2_X2 => Instruction::Dup2X2,
			opcode::SWAP => Instruction::Swap,
			opcode::IADD..=opcode::LXOR => binary_op(op - opcode::IADD)?,
			opcode::IINC => {
				let index = cursor.u8()? as u16;
				let konst = cursor.i8()? as i16;
				Instruction::IInc(LvIndex { index }, konst)
			}
			opcode::I2L..=opcode::I2S => conversion(op - opcode::I2L),
			opcode::LCMP => Instruction::LCmp,
			opcode::FCMPL => Instruction::FCmpL,
			0x96 => Instruction::FCmpG,
			0x97 => Instruction::DCmpL,
			opcode::DCMPG => Instruction::DCmpG,
			opcode::IFEQ..=opcode::IFLE => {
				let offset = cursor.i16()? as i32;
				if_zero(op - opcode::IFEQ, target(offset))
			}
			opcode::IF_ICMPEQ..=opcode::IF_ICMPLE => {
				let offset = cursor.i16()? as i32;
				if_icmp(op - opcode::IF_ICMPEQ, target(offset))
			}
			opcode::IF_ACMPEQ => { let o = cursor.i16()? as i32; Instruction::IfACmpEq(target(o)) }
			opcode::IF_ACMPNE => { let o = cursor.i16()? as i32; Instruction::IfACmpNe(target(o)) }
			opcode::GOTO => { let o = cursor.i16()? as i32; Instruction::Goto(target(o)) }
			opcode::JSR => { let o = cursor.i16()? as i32; Instruction::Jsr(target(o)) }
			opcode::RET => Instruction::Ret(LvIndex { index: cursor.u8()? as u16 }),
			opcode::TABLESWITCH => read_tableswitch(&mut cursor, pc)?,
			opcode::LOOKUPSWITCH => read_lookupswitch(&mut cursor, pc)?,
			opcode::IRETURN..=0xb0 /* areturn */ => returning(op - opcode::IRETURN),
			opcode::RETURN => Instruction::Return,
			opcode::GETSTATIC => Instruction::GetStatic(pool.field_ref(cursor.u16()?)?),
			opcode::PUTSTATIC => Instruction::PutStatic(pool.field_ref(cursor.u16()?)?),
			opcode::GETFIELD => Instruction::GetField(pool.field_ref(cursor.u16()?)?),
			opcode::PUTFIELD => Instruction::PutField(pool.field_ref(cursor.u16()?)?),
			opcode::INVOKEVIRTUAL => Instruction::InvokeVirtual(pool.method_ref(cursor.u16()?)?.0),
			opcode::INVOKESPECIAL => {
				let (method_ref, on_interface) = pool.method_ref(cursor.u16()?)?;
				Instruction::InvokeSpecial(method_ref, on_interface)
			}
			opcode::INVOKESTATIC => {
				let (method_ref, on_interface) = pool.method_ref(cursor.u16()?)?;
				Instruction::InvokeStatic(method_ref, on_interface)
			}
			opcode::INVOKEINTERFACE => {
				let index = cursor.u16()?;
				let _count = cursor.u8()?;
				let zero = cursor.u8()?;
				if zero != 0 {
					bail!("invokeinterface at {pc}: reserved byte must be 0, was {zero}");
				}
				Instruction::InvokeInterface(pool.method_ref(index)?.0)
			}
			opcode::INVOKEDYNAMIC => {
				let index = cursor.u16()?;
				let zero = cursor.u16()?;
				if zero != 0 {
					bail!("invokedynamic at {pc}: reserved bytes must be 0, were {zero}");
				}
				Instruction::InvokeDynamic(pool.invoke_dynamic(index)?)
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
			opcode::WIDE => read_wide(&mut cursor)?,
			opcode::MULTIANEWARRAY => {
				let class = pool.class_name(cursor.u16()?)?;
				let dimensions = cursor.u8()?;
				Instruction::MultiANewArray(class, dimensions)
			}
			opcode::IFNULL => { let o = cursor.i16()? as i32; Instruction::IfNull(target(o)) }
			opcode::IFNONNULL => { let o = cursor.i16()? as i32; Instruction::IfNonNull(target(o)) }
			opcode::GOTO_W => { let o = cursor.i32()?; Instruction::Goto(target(o)) }
			opcode::JSR_W => { let o = cursor.i32()?; Instruction::Jsr(target(o)) }
			other => bail!("unknown or reserved opcode 0x{other:02x} at offset {pc}"),
		};

		entries.push(InstructionListEntry { label, frame: None, instruction });
	}

	Ok(entries)
}

fn const_int(n: u8) -> Instruction {
	match n {
		0 => Instruction::IConstM1,
		1 => Instruction::IConst0,
		2 => Instruction::IConst1,
		3 => Instruction::IConst2,
		4 => Instruction::IConst3,
		5 => Instruction::IConst4,
		_ => Instruction::IConst5,
	}
}

fn const_float(n: u8) -> Instruction {
	match n {
		0 => Instruction::FConst0,
		1 => Instruction::FConst1,
		_ => Instruction::FConst2,
	}
}

fn load_store(group: u8, index: u16, is_store: bool) -> Instruction {
	let lv = LvIndex { index };
	match (group, is_store) {
		(0, false) => Instruction::ILoad(lv),
		(1, false) => Instruction::LLoad(lv),
		(2, false) => Instruction::FLoad(lv),
		(3, false) => Instruction::DLoad(lv),
		(4, false) => Instruction::ALoad(lv),
		(0, true) => Instruction::IStore(lv),
		(1, true) => Instruction::LStore(lv),
		(2, true) => Instruction::FStore(lv),
		(3, true) => Instruction::DStore(lv),
		_ => Instruction::AStore(lv),
	}
}

fn array_load(n: u8) -> Instruction {
	match n {
		0 => Instruction::IALoad,
		1 => Instruction::LALoad,
		2 => Instruction::FALoad,
		3 => Instruction::DALoad,
		4 => Instruction::AALoad,
		5 => Instruction::BALoad,
		6 => Instruction::CALoad,
		_ => Instruction::SALoad,
	}
}

fn array_store(n: u8) -> Instruction {
	match n {
		0 => Instruction::IAStore,
		1 => Instruction::LAStore,
		2 => Instruction::FAStore,
		3 => Instruction::DAStore,
		4 => Instruction::AAStore,
		5 => Instruction::BAStore,
		6 => Instruction::CAStore,
		_ => Instruction::SAStore,
	}
}

/// `iadd` (0x60) through `lxor` (0x83): 9 groups of 4 (int/long/float/double), except `ishl`
/// onward which only have int/long forms.
fn binary_op(n: u8) -> Result<Instruction> {
	Ok(match n {
		0 => Instruction::IAdd, 1 => Instruction::LAdd, 2 => Instruction::FAdd, 3 => Instruction::DAdd,
		4 => Instruction::ISub, 5 => Instruction::LSub, 6 => Instruction::FSub, 7 => Instruction::DSub,
		8 => Instruction::IMul, 9 => Instruction::LMul, 10 => Instruction::FMul, 11 => Instruction::DMul,
		12 => Instruction::IDiv, 13 => Instruction::LDiv, 14 => Instruction::FDiv, 15 => Instruction::DDiv,
		16 => Instruction::IRem, 17 => Instruction::LRem, 18 => Instruction::FRem, 19 => Instruction::DRem,
		20 => Instruction::INeg, 21 => Instruction::LNeg, 22 => Instruction::FNeg, 23 => Instruction::DNeg,
		24 => Instruction::IShl, 25 => Instruction::LShl,
		26 => Instruction::IShr, 27 => Instruction::LShr,
		28 => Instruction::IUShr, 29 => Instruction::LUShr,
		30 => Instruction::IAnd, 31 => Instruction::LAnd,
		32 => Instruction::IOr, 33 => Instruction::LOr,
		34 => Instruction::IXor, 35 => Instruction::LXor,
		other => bail!("unreachable binary op index {other}"),
	})
}

fn conversion(n: u8) -> Instruction {
	match n {
		0 => Instruction::I2L, 1 => Instruction::I2F, 2 => Instruction::I2D,
		3 => Instruction::L2I, 4 => Instruction::L2F, 5 => Instruction::L2D,
		6 => Instruction::F2I, 7 => Instruction::F2L, 8 => Instruction::F2D,
		9 => Instruction::D2I, 10 => Instruction::D2L, 11 => Instruction::D2F,
		12 => Instruction::I2B, 13 => Instruction::I2C, _ => Instruction::I2S,
	}
}

fn if_zero(n: u8, label: Label) -> Instruction {
	match n {
		0 => Instruction::IfEq(label), 1 => Instruction::IfNe(label), 2 => Instruction::IfLt(label),
		3 => Instruction::IfGe(label), 4 => Instruction::IfGt(label), _ => Instruction::IfLe(label),
	}
}

fn if_icmp(n: u8, label: Label) -> Instruction {
	match n {
		0 => Instruction::IfICmpEq(label), 1 => Instruction::IfICmpNe(label), 2 => Instruction::IfICmpLt(label),
		3 => Instruction::IfICmpGe(label), 4 => Instruction::IfICmpGt(label), _ => Instruction::IfICmpLe(label),
	}
}

fn returning(n: u8) -> Instruction {
	match n {
		0 => Instruction::IReturn, 1 => Instruction::LReturn, 2 => Instruction::FReturn,
		3 => Instruction::DReturn, _ => Instruction::AReturn,
	}
}

/// `tableswitch`/`lookupswitch` pad with zero bytes up to the next 4-byte boundary measured from
/// the start of the `code` array, i.e. from the opcode's own offset.
fn switch_padding(cursor: &mut Cursor, pc: usize) -> Result<()> {
	let padding = (4 - (pc + 1) % 4) % 4;
	cursor.bytes(padding)?;
	Ok(())
}

fn read_tableswitch(cursor: &mut Cursor, pc: usize) -> Result<Instruction> {
	switch_padding(cursor, pc)?;
	let default = cursor.i32()?;
	let low = cursor.i32()?;
	let high = cursor.i32()?;
	if high < low {
		bail!("tableswitch at {pc}: high ({high}) < low ({low})");
	}
	let mut table = Vec::with_capacity((high - low + 1) as usize);
	for _ in low..=high {
		let offset = cursor.i32()?;
		table.push(Label { id: (pc as i64 + offset as i64) as u16 });
	}
	Ok(Instruction::TableSwitch { default: Label { id: (pc as i64 + default as i64) as u16 }, low, high, table })
}

fn read_lookupswitch(cursor: &mut Cursor, pc: usize) -> Result<Instruction> {
	switch_padding(cursor, pc)?;
	let default = cursor.i32()?;
	let npairs = cursor.i32()?;
	if npairs < 0 {
		bail!("lookupswitch at {pc}: negative npairs {npairs}");
	}
	let mut pairs = Vec::with_capacity(npairs as usize);
	for _ in 0..npairs {
		let key = cursor.i32()?;
		let offset = cursor.i32()?;
		pairs.push((key, Label { id: (pc as i64 + offset as i64) as u16 }));
	}
	Ok(Instruction::LookupSwitch { default: Label { id: (pc as i64 + default as i64) as u16 }, pairs })
}

fn read_wide(cursor: &mut Cursor) -> Result<Instruction> {
	let op = cursor.u8()?;
	if op == opcode::IINC {
		let index = cursor.u16()?;
		let konst = cursor.i16()?;
		return Ok(Instruction::IInc(LvIndex { index }, konst));
	}
	let index = cursor.u16()?;
	let lv = LvIndex { index };
	Ok(match op {
		opcode::ILOAD => Instruction::ILoad(lv),
		opcode::LLOAD => Instruction::LLoad(lv),
		opcode::FLOAD => Instruction::FLoad(lv),
		opcode::DLOAD => Instruction::DLoad(lv),
		opcode::ALOAD => Instruction::ALoad(lv),
		opcode::ISTORE => Instruction::IStore(lv),
		opcode::LSTORE => Instruction::LStore(lv),
		opcode::FSTORE => Instruction::FStore(lv),
		opcode::DSTORE => Instruction::DStore(lv),
		opcode::ASTORE => Instruction::AStore(lv),
		opcode::RET => Instruction::Ret(lv),
		other => bail!("opcode 0x{other:02x} cannot follow wide"),
	})
}
