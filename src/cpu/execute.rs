/*!
Instruction semantics for the documented 6502 set.

`execute` runs one decoded opcode against the CPU and bus and returns the
total cycles consumed, including the page-cross penalty flagged by the
decode table and the taken/page-cross penalties of branches.

Decimal mode is not wired to the ALU: the D flag can be set and cleared
but additions and subtractions are always binary, matching the 2A03.
*/

use crate::bus::Bus;
use crate::cpu::addressing::resolve;
use crate::cpu::opcodes::{AddrMode, Op, Opcode};
use crate::cpu::{BREAK, CARRY, Cpu, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, UNUSED, ZERO};

/// Execute one decoded instruction. PC points at the first operand byte.
pub(crate) fn execute(cpu: &mut Cpu, bus: &mut Bus, entry: Opcode) -> u32 {
    let (operand, crossed) = resolve(cpu, bus, entry.mode);
    // The table pairs every operation with a compatible mode, so an
    // address is present wherever one is consumed.
    let addr = operand.unwrap_or(0);

    let mut cycles = entry.cycles;
    if entry.page_penalty && crossed {
        cycles += 1;
    }

    match entry.op {
        // Loads and stores
        Op::Lda => {
            cpu.a = bus.read(addr);
            cpu.update_zn(cpu.a);
        }
        Op::Ldx => {
            cpu.x = bus.read(addr);
            cpu.update_zn(cpu.x);
        }
        Op::Ldy => {
            cpu.y = bus.read(addr);
            cpu.update_zn(cpu.y);
        }
        Op::Sta => bus.write(addr, cpu.a),
        Op::Stx => bus.write(addr, cpu.x),
        Op::Sty => bus.write(addr, cpu.y),

        // Arithmetic
        Op::Adc => adc(cpu, bus.read(addr)),
        Op::Sbc => adc(cpu, bus.read(addr) ^ 0xFF),
        Op::Cmp => compare(cpu, cpu.a, bus.read(addr)),
        Op::Cpx => compare(cpu, cpu.x, bus.read(addr)),
        Op::Cpy => compare(cpu, cpu.y, bus.read(addr)),

        // Bitwise
        Op::And => {
            cpu.a &= bus.read(addr);
            cpu.update_zn(cpu.a);
        }
        Op::Ora => {
            cpu.a |= bus.read(addr);
            cpu.update_zn(cpu.a);
        }
        Op::Eor => {
            cpu.a ^= bus.read(addr);
            cpu.update_zn(cpu.a);
        }
        Op::Bit => {
            let v = bus.read(addr);
            cpu.assign_flag(ZERO, cpu.a & v == 0);
            cpu.assign_flag(NEGATIVE, v & 0x80 != 0);
            cpu.assign_flag(OVERFLOW, v & 0x40 != 0);
        }

        // Shifts and rotates
        Op::Asl => rmw(cpu, bus, entry.mode, addr, |cpu, v| {
            cpu.assign_flag(CARRY, v & 0x80 != 0);
            v << 1
        }),
        Op::Lsr => rmw(cpu, bus, entry.mode, addr, |cpu, v| {
            cpu.assign_flag(CARRY, v & 0x01 != 0);
            v >> 1
        }),
        Op::Rol => rmw(cpu, bus, entry.mode, addr, |cpu, v| {
            let carry_in = cpu.flag(CARRY) as u8;
            cpu.assign_flag(CARRY, v & 0x80 != 0);
            (v << 1) | carry_in
        }),
        Op::Ror => rmw(cpu, bus, entry.mode, addr, |cpu, v| {
            let carry_in = (cpu.flag(CARRY) as u8) << 7;
            cpu.assign_flag(CARRY, v & 0x01 != 0);
            (v >> 1) | carry_in
        }),

        // Increment / decrement
        Op::Inc => rmw(cpu, bus, entry.mode, addr, |_, v| v.wrapping_add(1)),
        Op::Dec => rmw(cpu, bus, entry.mode, addr, |_, v| v.wrapping_sub(1)),
        Op::Inx => {
            cpu.x = cpu.x.wrapping_add(1);
            cpu.update_zn(cpu.x);
        }
        Op::Iny => {
            cpu.y = cpu.y.wrapping_add(1);
            cpu.update_zn(cpu.y);
        }
        Op::Dex => {
            cpu.x = cpu.x.wrapping_sub(1);
            cpu.update_zn(cpu.x);
        }
        Op::Dey => {
            cpu.y = cpu.y.wrapping_sub(1);
            cpu.update_zn(cpu.y);
        }

        // Control flow
        Op::Jmp => cpu.pc = addr,
        Op::Jsr => {
            let ret = cpu.pc.wrapping_sub(1);
            cpu.push_word(bus, ret);
            cpu.pc = addr;
        }
        Op::Rts => {
            cpu.pc = cpu.pop_word(bus).wrapping_add(1);
        }
        Op::Rti => {
            let status = cpu.pop(bus);
            cpu.status = (status & !BREAK) | UNUSED;
            cpu.pc = cpu.pop_word(bus);
        }
        Op::Brk => {
            // Pushes the address of the byte after the padding byte.
            let ret = cpu.pc.wrapping_add(1);
            cpu.push_word(bus, ret);
            cpu.push(bus, cpu.status | BREAK | UNUSED);
            cpu.set_flag(IRQ_DISABLE);
            cpu.pc = bus.read_word(0xFFFE);
        }

        // Branches
        Op::Bcc => branch(cpu, !cpu.flag(CARRY), addr, crossed, &mut cycles),
        Op::Bcs => branch(cpu, cpu.flag(CARRY), addr, crossed, &mut cycles),
        Op::Bne => branch(cpu, !cpu.flag(ZERO), addr, crossed, &mut cycles),
        Op::Beq => branch(cpu, cpu.flag(ZERO), addr, crossed, &mut cycles),
        Op::Bpl => branch(cpu, !cpu.flag(NEGATIVE), addr, crossed, &mut cycles),
        Op::Bmi => branch(cpu, cpu.flag(NEGATIVE), addr, crossed, &mut cycles),
        Op::Bvc => branch(cpu, !cpu.flag(OVERFLOW), addr, crossed, &mut cycles),
        Op::Bvs => branch(cpu, cpu.flag(OVERFLOW), addr, crossed, &mut cycles),

        // Register transfers
        Op::Tax => {
            cpu.x = cpu.a;
            cpu.update_zn(cpu.x);
        }
        Op::Tay => {
            cpu.y = cpu.a;
            cpu.update_zn(cpu.y);
        }
        Op::Tsx => {
            cpu.x = cpu.sp;
            cpu.update_zn(cpu.x);
        }
        Op::Txa => {
            cpu.a = cpu.x;
            cpu.update_zn(cpu.a);
        }
        Op::Txs => cpu.sp = cpu.x,
        Op::Tya => {
            cpu.a = cpu.y;
            cpu.update_zn(cpu.a);
        }

        // Stack
        Op::Pha => cpu.push(bus, cpu.a),
        Op::Php => cpu.push(bus, cpu.status | BREAK | UNUSED),
        Op::Pla => {
            cpu.a = cpu.pop(bus);
            cpu.update_zn(cpu.a);
        }
        Op::Plp => {
            let status = cpu.pop(bus);
            cpu.status = (status & !BREAK) | UNUSED;
        }

        // Flag manipulation
        Op::Clc => cpu.clear_flag(CARRY),
        Op::Sec => cpu.set_flag(CARRY),
        Op::Cli => cpu.clear_flag(IRQ_DISABLE),
        Op::Sei => cpu.set_flag(IRQ_DISABLE),
        Op::Clv => cpu.clear_flag(OVERFLOW),
        Op::Cld => cpu.clear_flag(DECIMAL),
        Op::Sed => cpu.set_flag(DECIMAL),

        Op::Nop => {}
    }

    cycles
}

/// Binary add with carry; SBC routes through here with the operand inverted.
fn adc(cpu: &mut Cpu, v: u8) {
    let a = cpu.a;
    let sum = a as u16 + v as u16 + cpu.flag(CARRY) as u16;
    let result = sum as u8;
    cpu.assign_flag(CARRY, sum > 0xFF);
    // Overflow when both operands share a sign the result does not.
    cpu.assign_flag(OVERFLOW, (a ^ result) & (v ^ result) & 0x80 != 0);
    cpu.a = result;
    cpu.update_zn(result);
}

fn compare(cpu: &mut Cpu, reg: u8, v: u8) {
    cpu.assign_flag(CARRY, reg >= v);
    cpu.update_zn(reg.wrapping_sub(v));
}

/// Apply a read-modify-write operation to the accumulator or to memory.
fn rmw(cpu: &mut Cpu, bus: &mut Bus, mode: AddrMode, addr: u16, f: impl Fn(&mut Cpu, u8) -> u8) {
    let result = if mode == AddrMode::Accumulator {
        let a = cpu.a;
        let r = f(cpu, a);
        cpu.a = r;
        r
    } else {
        let v = bus.read(addr);
        let r = f(cpu, v);
        bus.write(addr, r);
        r
    };
    cpu.update_zn(result);
}

/// Shared branch path: +1 cycle when taken, +1 more when the target lies
/// on a different page than the next instruction.
fn branch(cpu: &mut Cpu, condition: bool, target: u16, crossed: bool, cycles: &mut u32) {
    if condition {
        *cycles += 1;
        if crossed {
            *cycles += 1;
        }
        cpu.pc = target;
    }
}
