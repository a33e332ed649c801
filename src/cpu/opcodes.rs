/*!
Decode table for the 151 official 6502 opcodes.

Decode is data-driven: a 256-entry table maps each opcode byte to its
operation, addressing mode, base cycle count and whether the instruction
pays the one-cycle penalty when an indexed effective address crosses a
page boundary. Unassigned entries are `None`; fetching one surfaces as an
illegal-opcode error in the step loop.

Branch instructions carry their base cost of 2 here; the taken-branch and
page-cross penalties are applied by the branch execution path.
*/

/// The documented 6502 operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
}

/// Addressing modes, including the `(zp,X)` / `(zp),Y` indexed-indirect
/// pair and the indirect mode used only by `JMP`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

/// One decoded opcode: operation, operand form and cycle metadata.
#[derive(Copy, Clone, Debug)]
pub struct Opcode {
    pub op: Op,
    pub mode: AddrMode,
    pub cycles: u32,
    /// +1 cycle when the indexed effective address crosses a page.
    pub page_penalty: bool,
}

const fn e(op: Op, mode: AddrMode, cycles: u32) -> Option<Opcode> {
    Some(Opcode {
        op,
        mode,
        cycles,
        page_penalty: false,
    })
}

/// Entry whose cycle count grows by one on a page crossing.
const fn p(op: Op, mode: AddrMode, cycles: u32) -> Option<Opcode> {
    Some(Opcode {
        op,
        mode,
        cycles,
        page_penalty: true,
    })
}

/// Opcode byte -> decoded entry. Built once at compile time.
pub static OPCODE_TABLE: [Option<Opcode>; 256] = {
    use AddrMode::*;
    use Op::*;

    let mut t: [Option<Opcode>; 256] = [None; 256];

    // Load / store
    t[0xA9] = e(Lda, Immediate, 2);
    t[0xA5] = e(Lda, ZeroPage, 3);
    t[0xB5] = e(Lda, ZeroPageX, 4);
    t[0xAD] = e(Lda, Absolute, 4);
    t[0xBD] = p(Lda, AbsoluteX, 4);
    t[0xB9] = p(Lda, AbsoluteY, 4);
    t[0xA1] = e(Lda, IndirectX, 6);
    t[0xB1] = p(Lda, IndirectY, 5);
    t[0xA2] = e(Ldx, Immediate, 2);
    t[0xA6] = e(Ldx, ZeroPage, 3);
    t[0xB6] = e(Ldx, ZeroPageY, 4);
    t[0xAE] = e(Ldx, Absolute, 4);
    t[0xBE] = p(Ldx, AbsoluteY, 4);
    t[0xA0] = e(Ldy, Immediate, 2);
    t[0xA4] = e(Ldy, ZeroPage, 3);
    t[0xB4] = e(Ldy, ZeroPageX, 4);
    t[0xAC] = e(Ldy, Absolute, 4);
    t[0xBC] = p(Ldy, AbsoluteX, 4);
    t[0x85] = e(Sta, ZeroPage, 3);
    t[0x95] = e(Sta, ZeroPageX, 4);
    t[0x8D] = e(Sta, Absolute, 4);
    t[0x9D] = e(Sta, AbsoluteX, 5);
    t[0x99] = e(Sta, AbsoluteY, 5);
    t[0x81] = e(Sta, IndirectX, 6);
    t[0x91] = e(Sta, IndirectY, 6);
    t[0x86] = e(Stx, ZeroPage, 3);
    t[0x96] = e(Stx, ZeroPageY, 4);
    t[0x8E] = e(Stx, Absolute, 4);
    t[0x84] = e(Sty, ZeroPage, 3);
    t[0x94] = e(Sty, ZeroPageX, 4);
    t[0x8C] = e(Sty, Absolute, 4);

    // Arithmetic
    t[0x69] = e(Adc, Immediate, 2);
    t[0x65] = e(Adc, ZeroPage, 3);
    t[0x75] = e(Adc, ZeroPageX, 4);
    t[0x6D] = e(Adc, Absolute, 4);
    t[0x7D] = p(Adc, AbsoluteX, 4);
    t[0x79] = p(Adc, AbsoluteY, 4);
    t[0x61] = e(Adc, IndirectX, 6);
    t[0x71] = p(Adc, IndirectY, 5);
    t[0xE9] = e(Sbc, Immediate, 2);
    t[0xE5] = e(Sbc, ZeroPage, 3);
    t[0xF5] = e(Sbc, ZeroPageX, 4);
    t[0xED] = e(Sbc, Absolute, 4);
    t[0xFD] = p(Sbc, AbsoluteX, 4);
    t[0xF9] = p(Sbc, AbsoluteY, 4);
    t[0xE1] = e(Sbc, IndirectX, 6);
    t[0xF1] = p(Sbc, IndirectY, 5);

    // Compare
    t[0xC9] = e(Cmp, Immediate, 2);
    t[0xC5] = e(Cmp, ZeroPage, 3);
    t[0xD5] = e(Cmp, ZeroPageX, 4);
    t[0xCD] = e(Cmp, Absolute, 4);
    t[0xDD] = p(Cmp, AbsoluteX, 4);
    t[0xD9] = p(Cmp, AbsoluteY, 4);
    t[0xC1] = e(Cmp, IndirectX, 6);
    t[0xD1] = p(Cmp, IndirectY, 5);
    t[0xE0] = e(Cpx, Immediate, 2);
    t[0xE4] = e(Cpx, ZeroPage, 3);
    t[0xEC] = e(Cpx, Absolute, 4);
    t[0xC0] = e(Cpy, Immediate, 2);
    t[0xC4] = e(Cpy, ZeroPage, 3);
    t[0xCC] = e(Cpy, Absolute, 4);

    // Bitwise
    t[0x29] = e(And, Immediate, 2);
    t[0x25] = e(And, ZeroPage, 3);
    t[0x35] = e(And, ZeroPageX, 4);
    t[0x2D] = e(And, Absolute, 4);
    t[0x3D] = p(And, AbsoluteX, 4);
    t[0x39] = p(And, AbsoluteY, 4);
    t[0x21] = e(And, IndirectX, 6);
    t[0x31] = p(And, IndirectY, 5);
    t[0x09] = e(Ora, Immediate, 2);
    t[0x05] = e(Ora, ZeroPage, 3);
    t[0x15] = e(Ora, ZeroPageX, 4);
    t[0x0D] = e(Ora, Absolute, 4);
    t[0x1D] = p(Ora, AbsoluteX, 4);
    t[0x19] = p(Ora, AbsoluteY, 4);
    t[0x01] = e(Ora, IndirectX, 6);
    t[0x11] = p(Ora, IndirectY, 5);
    t[0x49] = e(Eor, Immediate, 2);
    t[0x45] = e(Eor, ZeroPage, 3);
    t[0x55] = e(Eor, ZeroPageX, 4);
    t[0x4D] = e(Eor, Absolute, 4);
    t[0x5D] = p(Eor, AbsoluteX, 4);
    t[0x59] = p(Eor, AbsoluteY, 4);
    t[0x41] = e(Eor, IndirectX, 6);
    t[0x51] = p(Eor, IndirectY, 5);
    t[0x24] = e(Bit, ZeroPage, 3);
    t[0x2C] = e(Bit, Absolute, 4);

    // Shifts and rotates
    t[0x0A] = e(Asl, Accumulator, 2);
    t[0x06] = e(Asl, ZeroPage, 5);
    t[0x16] = e(Asl, ZeroPageX, 6);
    t[0x0E] = e(Asl, Absolute, 6);
    t[0x1E] = e(Asl, AbsoluteX, 7);
    t[0x4A] = e(Lsr, Accumulator, 2);
    t[0x46] = e(Lsr, ZeroPage, 5);
    t[0x56] = e(Lsr, ZeroPageX, 6);
    t[0x4E] = e(Lsr, Absolute, 6);
    t[0x5E] = e(Lsr, AbsoluteX, 7);
    t[0x2A] = e(Rol, Accumulator, 2);
    t[0x26] = e(Rol, ZeroPage, 5);
    t[0x36] = e(Rol, ZeroPageX, 6);
    t[0x2E] = e(Rol, Absolute, 6);
    t[0x3E] = e(Rol, AbsoluteX, 7);
    t[0x6A] = e(Ror, Accumulator, 2);
    t[0x66] = e(Ror, ZeroPage, 5);
    t[0x76] = e(Ror, ZeroPageX, 6);
    t[0x6E] = e(Ror, Absolute, 6);
    t[0x7E] = e(Ror, AbsoluteX, 7);

    // Increment / decrement
    t[0xE6] = e(Inc, ZeroPage, 5);
    t[0xF6] = e(Inc, ZeroPageX, 6);
    t[0xEE] = e(Inc, Absolute, 6);
    t[0xFE] = e(Inc, AbsoluteX, 7);
    t[0xC6] = e(Dec, ZeroPage, 5);
    t[0xD6] = e(Dec, ZeroPageX, 6);
    t[0xCE] = e(Dec, Absolute, 6);
    t[0xDE] = e(Dec, AbsoluteX, 7);
    t[0xE8] = e(Inx, Implied, 2);
    t[0xC8] = e(Iny, Implied, 2);
    t[0xCA] = e(Dex, Implied, 2);
    t[0x88] = e(Dey, Implied, 2);

    // Control flow
    t[0x4C] = e(Jmp, Absolute, 3);
    t[0x6C] = e(Jmp, Indirect, 5);
    t[0x20] = e(Jsr, Absolute, 6);
    t[0x60] = e(Rts, Implied, 6);
    t[0x40] = e(Rti, Implied, 6);
    t[0x00] = e(Brk, Implied, 7);

    // Branches (base 2; +1 taken, +1 page cross on the taken path)
    t[0x90] = e(Bcc, Relative, 2);
    t[0xB0] = e(Bcs, Relative, 2);
    t[0xF0] = e(Beq, Relative, 2);
    t[0xD0] = e(Bne, Relative, 2);
    t[0x30] = e(Bmi, Relative, 2);
    t[0x10] = e(Bpl, Relative, 2);
    t[0x50] = e(Bvc, Relative, 2);
    t[0x70] = e(Bvs, Relative, 2);

    // Register transfers
    t[0xAA] = e(Tax, Implied, 2);
    t[0xA8] = e(Tay, Implied, 2);
    t[0xBA] = e(Tsx, Implied, 2);
    t[0x8A] = e(Txa, Implied, 2);
    t[0x9A] = e(Txs, Implied, 2);
    t[0x98] = e(Tya, Implied, 2);

    // Stack
    t[0x48] = e(Pha, Implied, 3);
    t[0x08] = e(Php, Implied, 3);
    t[0x68] = e(Pla, Implied, 4);
    t[0x28] = e(Plp, Implied, 4);

    // Flags
    t[0x18] = e(Clc, Implied, 2);
    t[0x38] = e(Sec, Implied, 2);
    t[0x58] = e(Cli, Implied, 2);
    t[0x78] = e(Sei, Implied, 2);
    t[0xB8] = e(Clv, Implied, 2);
    t[0xD8] = e(Cld, Implied, 2);
    t[0xF8] = e(Sed, Implied, 2);

    t[0xEA] = e(Nop, Implied, 2);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_official_set_exactly() {
        let count = OPCODE_TABLE.iter().filter(|e| e.is_some()).count();
        assert_eq!(count, 151);
    }

    #[test]
    fn spot_check_entries() {
        let lda_imm = OPCODE_TABLE[0xA9].unwrap();
        assert_eq!(lda_imm.op, Op::Lda);
        assert_eq!(lda_imm.mode, AddrMode::Immediate);
        assert_eq!(lda_imm.cycles, 2);
        assert!(!lda_imm.page_penalty);

        let lda_absx = OPCODE_TABLE[0xBD].unwrap();
        assert!(lda_absx.page_penalty);

        // Stores never take the page penalty
        let sta_absx = OPCODE_TABLE[0x9D].unwrap();
        assert_eq!(sta_absx.cycles, 5);
        assert!(!sta_absx.page_penalty);

        let jmp_ind = OPCODE_TABLE[0x6C].unwrap();
        assert_eq!(jmp_ind.mode, AddrMode::Indirect);
        assert_eq!(jmp_ind.cycles, 5);
    }

    #[test]
    fn undocumented_bytes_are_unassigned() {
        for byte in [0x02u8, 0x3A, 0x80, 0xFF, 0x1A, 0x04] {
            assert!(OPCODE_TABLE[byte as usize].is_none(), "{byte:#04x}");
        }
    }
}
