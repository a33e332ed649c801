/*!
Effective-address resolution for every 6502 addressing mode.

Helpers fetch operand bytes (advancing PC), apply indexing with the
documented wrap rules, and report whether an indexed access crossed a
page boundary so the step loop can charge the extra cycle.

Quirks honored here:
- Zero-page indexing wraps within page zero ($FF + 1 -> $00).
- The pointer for `(zp,X)` and `(zp),Y` is read with zero-page wrap on
  its high byte.
- `JMP (addr)` reads the high byte of the target from the start of the
  same page when the pointer sits at $xxFF.
*/

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::cpu::opcodes::AddrMode;

/// Fetch the byte at PC and advance PC by one.
#[inline]
pub(crate) fn fetch_byte(cpu: &mut Cpu, bus: &mut Bus) -> u8 {
    let b = bus.read(cpu.pc);
    cpu.pc = cpu.pc.wrapping_add(1);
    b
}

/// Fetch a little-endian word at PC and advance PC by two.
#[inline]
pub(crate) fn fetch_word(cpu: &mut Cpu, bus: &mut Bus) -> u16 {
    let lo = fetch_byte(cpu, bus) as u16;
    let hi = fetch_byte(cpu, bus) as u16;
    (hi << 8) | lo
}

/// Read a little-endian word from the zero page, wrapping the high-byte
/// address within page zero.
#[inline]
fn read_word_zp(bus: &mut Bus, zp_addr: u8) -> u16 {
    let lo = bus.read(zp_addr as u16) as u16;
    let hi = bus.read(zp_addr.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

#[inline]
fn crossed(base: u16, effective: u16) -> bool {
    (base & 0xFF00) != (effective & 0xFF00)
}

/// Resolved operand location: `None` for implied/accumulator forms,
/// otherwise the effective address plus the page-crossing flag.
pub(crate) fn resolve(cpu: &mut Cpu, bus: &mut Bus, mode: AddrMode) -> (Option<u16>, bool) {
    match mode {
        AddrMode::Implied | AddrMode::Accumulator => (None, false),
        AddrMode::Immediate => {
            let addr = cpu.pc;
            cpu.pc = cpu.pc.wrapping_add(1);
            (Some(addr), false)
        }
        AddrMode::ZeroPage => {
            let addr = fetch_byte(cpu, bus) as u16;
            (Some(addr), false)
        }
        AddrMode::ZeroPageX => {
            let addr = fetch_byte(cpu, bus).wrapping_add(cpu.x) as u16;
            (Some(addr), false)
        }
        AddrMode::ZeroPageY => {
            let addr = fetch_byte(cpu, bus).wrapping_add(cpu.y) as u16;
            (Some(addr), false)
        }
        AddrMode::Absolute => {
            let addr = fetch_word(cpu, bus);
            (Some(addr), false)
        }
        AddrMode::AbsoluteX => {
            let base = fetch_word(cpu, bus);
            let addr = base.wrapping_add(cpu.x as u16);
            (Some(addr), crossed(base, addr))
        }
        AddrMode::AbsoluteY => {
            let base = fetch_word(cpu, bus);
            let addr = base.wrapping_add(cpu.y as u16);
            (Some(addr), crossed(base, addr))
        }
        AddrMode::Indirect => {
            // JMP (addr): high byte read wraps within the pointer's page.
            let ptr = fetch_word(cpu, bus);
            let lo = bus.read(ptr) as u16;
            let hi_addr = (ptr & 0xFF00) | ((ptr as u8).wrapping_add(1) as u16);
            let hi = bus.read(hi_addr) as u16;
            (Some((hi << 8) | lo), false)
        }
        AddrMode::IndirectX => {
            let zp = fetch_byte(cpu, bus).wrapping_add(cpu.x);
            (Some(read_word_zp(bus, zp)), false)
        }
        AddrMode::IndirectY => {
            let zp = fetch_byte(cpu, bus);
            let base = read_word_zp(bus, zp);
            let addr = base.wrapping_add(cpu.y as u16);
            (Some(addr), crossed(base, addr))
        }
        AddrMode::Relative => {
            let offset = fetch_byte(cpu, bus) as i8;
            let target = cpu.pc.wrapping_add(offset as i16 as u16);
            (Some(target), crossed(cpu.pc, target))
        }
    }
}
