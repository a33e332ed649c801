/*!
Cycle-stepped 6502 CPU interpreter.

`Cpu` owns the architectural registers and the step loop; decode metadata
lives in `opcodes`, operand resolution in `addressing`, and instruction
semantics in `execute`.

Step ordering, checked once per instruction boundary:
1. A pending OAM DMA stall is consumed in full (no opcode fetch).
2. A pending NMI is serviced through $FFFA.
3. An asserted IRQ line is serviced through $FFFE when the I flag allows.
4. Otherwise one opcode is fetched, decoded and executed.

Interrupt entry pushes PC and status (B clear), sets I, and costs a fixed
7 cycles. An opcode byte with no table entry halts the CPU and surfaces
as `CpuError::IllegalOpcode`; the CPU stays halted until `reset`.

6502 status register layout:
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C
*/

pub mod addressing;
pub mod execute;
pub mod opcodes;

use crate::bus::Bus;
use crate::cpu::opcodes::OPCODE_TABLE;

/// Processor status flag masks.
pub const CARRY: u8 = 0b0000_0001;
pub const ZERO: u8 = 0b0000_0010;
pub const IRQ_DISABLE: u8 = 0b0000_0100;
pub const DECIMAL: u8 = 0b0000_1000; // Ignored by the 2A03 ALU, still a real bit.
pub const BREAK: u8 = 0b0001_0000; // Exists only on pushed copies of the register.
pub const UNUSED: u8 = 0b0010_0000; // Always set when read.
pub const OVERFLOW: u8 = 0b0100_0000;
pub const NEGATIVE: u8 = 0b1000_0000;

const STACK_BASE: u16 = 0x0100;

/// Errors the step loop can surface to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    /// The fetched opcode byte has no entry in the documented set.
    /// `pc` is the address the byte was fetched from.
    IllegalOpcode { opcode: u8, pc: u16 },
}

impl std::fmt::Display for CpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CpuError::IllegalOpcode { opcode, pc } => {
                write!(f, "illegal opcode {opcode:#04x} at {pc:#06x}")
            }
        }
    }
}

impl std::error::Error for CpuError {}

/// Architectural register file plus execution control state.
#[derive(Debug, Clone, Copy)]
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    /// Set after an illegal opcode; cleared by `reset`.
    pub halted: bool,
    /// Total cycles executed since power-up or the last reset.
    pub cycles: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0x0000,
            status: IRQ_DISABLE | UNUSED,
            halted: false,
            cycles: 0,
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Power-up/reset: registers to their documented defaults and PC from
    /// the reset vector at $FFFC. Nothing is pushed to the stack.
    pub fn reset(&mut self, bus: &mut Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = IRQ_DISABLE | UNUSED;
        self.halted = false;
        self.cycles = 0;
        self.pc = bus.read_word(0xFFFC);
    }

    /// Execute one instruction (or service one interrupt / DMA stall) and
    /// return the cycles consumed.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32, CpuError> {
        if self.halted {
            return Err(CpuError::IllegalOpcode {
                opcode: bus.peek(self.pc),
                pc: self.pc,
            });
        }

        // 1. OAM DMA stall: the CPU is off the bus for the whole transfer.
        let stall = bus.take_dma_stall();
        if stall > 0 {
            self.cycles += stall as u64;
            return Ok(stall);
        }

        // 2. NMI
        if bus.take_nmi_pending() {
            self.service_interrupt(bus, 0xFFFA);
            self.cycles += 7;
            return Ok(7);
        }

        // 3. IRQ, when unmasked
        if bus.irq_line() && !self.flag(IRQ_DISABLE) {
            self.service_interrupt(bus, 0xFFFE);
            self.cycles += 7;
            return Ok(7);
        }

        // 4. Fetch / decode / execute
        let opcode_pc = self.pc;
        let opcode = addressing::fetch_byte(self, bus);
        let entry = match OPCODE_TABLE[opcode as usize] {
            Some(entry) => entry,
            None => {
                log::warn!("illegal opcode {opcode:#04x} at {opcode_pc:#06x}; halting");
                self.halted = true;
                self.pc = opcode_pc;
                return Err(CpuError::IllegalOpcode {
                    opcode,
                    pc: opcode_pc,
                });
            }
        };
        let cycles = execute::execute(self, bus, entry);
        self.cycles += cycles as u64;
        Ok(cycles)
    }

    /// Hardware interrupt entry: push PC and status with B clear, set I,
    /// load PC from the vector. Fixed 7-cycle cost is charged by `step`.
    fn service_interrupt(&mut self, bus: &mut Bus, vector: u16) {
        let pc = self.pc;
        self.push_word(bus, pc);
        self.push(bus, (self.status | UNUSED) & !BREAK);
        self.set_flag(IRQ_DISABLE);
        self.pc = bus.read_word(vector);
    }

    // ----- flags -----

    #[inline]
    pub fn flag(&self, mask: u8) -> bool {
        self.status & mask != 0
    }

    #[inline]
    pub fn set_flag(&mut self, mask: u8) {
        self.status |= mask;
    }

    #[inline]
    pub fn clear_flag(&mut self, mask: u8) {
        self.status &= !mask;
    }

    #[inline]
    pub fn assign_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    /// Set Z and N from a result byte.
    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.assign_flag(ZERO, value == 0);
        self.assign_flag(NEGATIVE, value & 0x80 != 0);
    }

    // ----- stack, fixed to page $0100; sp wraps freely -----

    #[inline]
    pub fn push(&mut self, bus: &mut Bus, value: u8) {
        bus.write(STACK_BASE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub fn pop(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16)
    }

    #[inline]
    pub fn push_word(&mut self, bus: &mut Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    #[inline]
    pub fn pop_word(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::test_utils::build_nrom_with_prg;

    fn setup(prg: &[u8]) -> (Cpu, Bus) {
        let rom = build_nrom_with_prg(prg, 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).expect("parse");
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn reset_loads_vector_and_defaults() {
        let (cpu, _bus) = setup(&[0xEA]);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.status, IRQ_DISABLE | UNUSED);
        assert_eq!(cpu.cycles, 0);
    }

    #[test]
    fn lda_imm_flags() {
        // LDA #$00; LDA #$7F; LDA #$80; LDA #$FF
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xA9, 0x7F, 0xA9, 0x80, 0xA9, 0xFF]);

        cpu.step(&mut bus).unwrap();
        assert!(cpu.flag(ZERO));
        assert!(!cpu.flag(NEGATIVE));

        cpu.step(&mut bus).unwrap();
        assert!(!cpu.flag(ZERO));
        assert!(!cpu.flag(NEGATIVE));

        cpu.step(&mut bus).unwrap();
        assert!(!cpu.flag(ZERO));
        assert!(cpu.flag(NEGATIVE));

        cpu.step(&mut bus).unwrap();
        assert!(cpu.flag(NEGATIVE));
        assert_eq!(cpu.a, 0xFF);
    }

    #[test]
    fn adc_carry_and_overflow() {
        // LDA #$7F; ADC #$01 -> 0x80, V set, C clear
        let (mut cpu, mut bus) = setup(&[0xA9, 0x7F, 0x69, 0x01, 0xA9, 0xFF, 0x69, 0x01]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.flag(OVERFLOW));
        assert!(!cpu.flag(CARRY));
        assert!(cpu.flag(NEGATIVE));

        // LDA #$FF; ADC #$01 -> 0x00, C set, V clear
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.flag(CARRY));
        assert!(!cpu.flag(OVERFLOW));
        assert!(cpu.flag(ZERO));
    }

    #[test]
    fn sbc_borrow_semantics() {
        // SEC; LDA #$10; SBC #$01 -> 0x0F with carry still set
        let (mut cpu, mut bus) = setup(&[0x38, 0xA9, 0x10, 0xE9, 0x01]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x0F);
        assert!(cpu.flag(CARRY));
    }

    #[test]
    fn cycle_accounting_with_page_cross() {
        // LDX #$01; LDA $00FF,X crosses into $0100; LDA $0000,X stays put.
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0xBD, 0xFF, 0x00, 0xBD, 0x00, 0x00]);
        assert_eq!(cpu.step(&mut bus).unwrap(), 2);
        // $00FF + 1 = $0100: page crossed
        assert_eq!(cpu.step(&mut bus).unwrap(), 5);
        // $0000 + 1 = $0001: same page
        assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    }

    #[test]
    fn branch_cycle_penalties() {
        // SEC; BCS +0 (taken, same page) -> 3 cycles
        let (mut cpu, mut bus) = setup(&[0x38, 0xB0, 0x00, 0xEA]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 3);

        // CLC; BCS not taken -> 2 cycles
        let (mut cpu, mut bus) = setup(&[0x18, 0xB0, 0x10, 0xEA]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 2);
    }

    #[test]
    fn stack_wraps_through_page_one() {
        // 256 pushes starting at sp=0xFD wrap the pointer completely.
        let (mut cpu, mut bus) = setup(&[0xEA]);
        let start_sp = cpu.sp;
        for i in 0..=255u16 {
            cpu.push(&mut bus, i as u8);
        }
        assert_eq!(cpu.sp, start_sp); // wrapped full circle
        for i in (0..=255u16).rev() {
            assert_eq!(cpu.pop(&mut bus), i as u8);
        }
        assert_eq!(cpu.sp, start_sp);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR $8005; NOP padding; target: RTS
        let prg = [0x20, 0x05, 0x80, 0xEA, 0xEA, 0x60];
        let (mut cpu, mut bus) = setup(&prg);
        cpu.step(&mut bus).unwrap(); // JSR
        assert_eq!(cpu.pc, 0x8005);
        cpu.step(&mut bus).unwrap(); // RTS
        assert_eq!(cpu.pc, 0x8003);
    }

    #[test]
    fn brk_vectors_through_fffe() {
        let rom = crate::test_utils::build_nrom_with_prg(
            &[0x00, 0xEA],
            1,
            1,
            Some((0x8000, 0x8000, 0x9000)),
        );
        let cart = Cartridge::from_ines_bytes(&rom).expect("parse");
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        let cycles = cpu.step(&mut bus).unwrap();
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.flag(IRQ_DISABLE));
        // Pushed status has B set
        let pushed_status = bus.read(0x0100 | cpu.sp.wrapping_add(1) as u16);
        assert!(pushed_status & BREAK != 0);
    }

    #[test]
    fn illegal_opcode_halts_until_reset() {
        let (mut cpu, mut bus) = setup(&[0x02, 0xEA]);
        let err = cpu.step(&mut bus).unwrap_err();
        assert_eq!(
            err,
            CpuError::IllegalOpcode {
                opcode: 0x02,
                pc: 0x8000
            }
        );
        assert!(cpu.halted);
        // Still halted on the next step
        assert!(cpu.step(&mut bus).is_err());

        cpu.reset(&mut bus);
        assert!(!cpu.halted);
    }

    #[test]
    fn nmi_preempts_execution() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0xEA]);
        bus.set_nmi_pending();
        let cycles = cpu.step(&mut bus).unwrap();
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x8000); // NMI vector also points at 0x8000
        assert!(cpu.flag(IRQ_DISABLE));
    }

    #[test]
    fn irq_respects_mask() {
        let (mut cpu, mut bus) = setup(&[0x58, 0xEA, 0xEA]);
        bus.set_irq_line(true);
        // I is set after reset: the IRQ must wait.
        let cycles = cpu.step(&mut bus).unwrap(); // CLI
        assert_eq!(cycles, 2);
        // Now unmasked: serviced before the next opcode.
        let cycles = cpu.step(&mut bus).unwrap();
        assert_eq!(cycles, 7);
    }

    #[test]
    fn store_load_round_trip_via_memory() {
        // LDA #$05; STA $10; LDA #$00; LDA $10
        let (mut cpu, mut bus) = setup(&[0xA9, 0x05, 0x85, 0x10, 0xA9, 0x00, 0xA5, 0x10]);
        for _ in 0..4 {
            cpu.step(&mut bus).unwrap();
        }
        assert_eq!(cpu.a, 0x05);
        assert_eq!(bus.read(0x0010), 0x05);
    }

    #[test]
    fn rmw_on_memory_and_accumulator() {
        // LDA #$81; ASL A -> 0x02, carry set
        let (mut cpu, mut bus) = setup(&[0xA9, 0x81, 0x0A, 0xE6, 0x40]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.flag(CARRY));

        // INC $40
        bus.write(0x0040, 0xFF);
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.read(0x0040), 0x00);
        assert!(cpu.flag(ZERO));
    }
}
