//! Shared test helpers for building minimal iNES (v1) images.
//!
//! Header fields used here:
//! - bytes[0..4] = b"NES\x1A"
//! - byte 4 = PRG ROM size in 16 KiB units
//! - byte 5 = CHR ROM size in 8 KiB units (0 => loader allocates CHR RAM)
//! - byte 6 = flags 6 (mirroring, battery, trainer, mapper low nibble)
//! - byte 7 = flags 7 (NES 2.0 indicator, mapper high nibble)
//! - byte 8 = PRG RAM size in 8 KiB units (0 => 8 KiB by convention)
//!
//! Vectors for a single 16 KiB PRG bank live at PRG offsets
//! 0x3FFA..=0x3FFF (NMI, RESET, IRQ, little-endian).

#![allow(dead_code)]

/// Build a minimal iNES (v1) image. PRG bytes are filled with 0xAA and
/// CHR with 0xCC so mapping tests can recognize them.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes =
        Vec::with_capacity(16 + trainer.map_or(0, |_| 512) + prg_16k * 16384 + chr_8k * 8192);

    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(prg_16k as u8);
    bytes.push(chr_8k as u8);
    bytes.push(flags6);
    bytes.push(flags7);
    bytes.push(prg_ram_8k);
    bytes.extend_from_slice(&[0u8; 7]);

    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }
    bytes.extend(std::iter::repeat_n(0xAA, prg_16k * 16384));
    bytes.extend(std::iter::repeat_n(0xCC, chr_8k * 8192));
    bytes
}

/// Build an NROM-128 image whose single PRG bank starts with `prg` and
/// whose vectors are `(reset, nmi, irq)`, defaulting to 0x8000 each.
pub fn build_nrom_with_prg(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    vectors: Option<(u16, u16, u16)>,
) -> Vec<u8> {
    assert!(prg.len() <= 16384, "program must fit one 16 KiB PRG bank");

    let mut rom = build_ines(1, chr_8k, 0, 0, prg_ram_8k, None);
    let prg_start = 16;
    rom[prg_start..prg_start + prg.len()].copy_from_slice(prg);

    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    let base = prg_start + 0x3FFA;
    rom[base..base + 2].copy_from_slice(&nmi.to_le_bytes());
    rom[base + 2..base + 4].copy_from_slice(&reset.to_le_bytes());
    rom[base + 4..base + 6].copy_from_slice(&irq.to_le_bytes());
    rom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fields_land_in_place() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(rom[4], 2);
        assert_eq!(rom[5], 1);
        assert_eq!(rom[6], 0x01);
        assert_eq!(rom[8], 1);
        assert_eq!(rom.len(), 16 + 2 * 16384 + 8192);
    }

    #[test]
    fn vectors_written_little_endian() {
        let rom = build_nrom_with_prg(&[0xEA], 0, 1, Some((0x8123, 0x8456, 0x8ABC)));
        let base = 16 + 0x3FFA;
        assert_eq!(rom[base], 0x56); // NMI lo
        assert_eq!(rom[base + 1], 0x84);
        assert_eq!(rom[base + 2], 0x23); // RESET lo
        assert_eq!(rom[base + 3], 0x81);
        assert_eq!(rom[base + 4], 0xBC); // IRQ lo
        assert_eq!(rom[base + 5], 0x8A);
    }
}
