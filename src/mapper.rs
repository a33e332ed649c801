/*!
Mapper trait and the NROM (mapper 0) implementation.

Purpose:
- Decouple CPU/PPU address mapping from `Cartridge` so additional mappers
  can be added behind the same interface.
- The Bus forwards CPU $6000..=$FFFF here; the PPU forwards pattern-table
  accesses ($0000..=$1FFF) here.

Semantics:
- All read/write methods take full, unmasked CPU or PPU addresses.
- `irq_pending()` is an extension hook for mappers with an IRQ output;
  NROM never asserts it.
*/

/// Common interface all cartridge mappers implement.
pub trait Mapper {
    /// Mapper numeric identifier (0 for NROM).
    fn mapper_id(&self) -> u16;

    /// CPU-visible read at $6000..=$FFFF.
    fn cpu_read(&mut self, addr: u16) -> u8;

    /// CPU-visible write at $6000..=$FFFF.
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// Pattern-table read at $0000..=$1FFF.
    fn chr_read(&self, addr: u16) -> u8;

    /// Pattern-table write at $0000..=$1FFF (CHR RAM only).
    fn chr_write(&mut self, addr: u16, value: u8);

    /// Reset mapper state (bank registers, IRQ state). NROM has none.
    fn reset(&mut self) {}

    /// Whether the mapper is asserting its IRQ output line.
    fn irq_pending(&self) -> bool {
        false
    }
}

/// NROM (mapper 0).
///
/// - PRG ROM: 16 KiB (NROM-128) mirrored across $8000..=$FFFF, or 32 KiB
///   (NROM-256) mapped directly. Writes to PRG ROM are ignored.
/// - PRG RAM: optional window at $6000..=$7FFF, wrapping within its size.
/// - CHR: 8 KiB of ROM, or RAM when the header declared zero CHR units.
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
}

impl Nrom {
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_is_ram: bool, prg_ram_size: usize) -> Self {
        Self {
            prg_rom,
            prg_ram: vec![0; prg_ram_size],
            chr,
            chr_is_ram,
        }
    }

    #[inline]
    fn prg_rom_read(&self, addr: u16) -> u8 {
        if self.prg_rom.is_empty() {
            return 0xFF;
        }
        let rel = addr.wrapping_sub(0x8000) as usize;
        // 16 KiB mirrors across both halves of the window; 32 KiB is direct.
        if self.prg_rom.len() == 16 * 1024 {
            self.prg_rom[rel & 0x3FFF]
        } else {
            self.prg_rom[rel % self.prg_rom.len()]
        }
    }
}

impl Mapper for Nrom {
    #[inline]
    fn mapper_id(&self) -> u16 {
        0
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram.is_empty() {
                    0
                } else {
                    let rel = (addr - 0x6000) as usize;
                    self.prg_ram[rel % self.prg_ram.len()]
                }
            }
            0x8000..=0xFFFF => self.prg_rom_read(addr),
            // The bus does not forward other ranges.
            _ => 0xFF,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            if !self.prg_ram.is_empty() {
                let rel = (addr - 0x6000) as usize;
                let idx = rel % self.prg_ram.len();
                self.prg_ram[idx] = value;
            }
        }
        // NROM has no registers; PRG ROM writes are ignored.
    }

    fn chr_read(&self, addr: u16) -> u8 {
        if self.chr.is_empty() {
            return 0;
        }
        self.chr[(addr as usize) & 0x1FFF]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram && !self.chr.is_empty() {
            let idx = (addr as usize) & 0x1FFF;
            self.chr[idx] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mapper, Nrom};

    #[test]
    fn nrom_32k_prg_basic() {
        let prg = vec![0xAA; 32 * 1024];
        let chr = vec![0xCC; 8 * 1024];
        let mut nrom = Nrom::new(prg, chr, false, 8 * 1024);

        assert_eq!(nrom.cpu_read(0x8000), 0xAA);
        assert_eq!(nrom.cpu_read(0xFFFF), 0xAA);

        nrom.cpu_write(0x6000, 0x42);
        assert_eq!(nrom.cpu_read(0x6000), 0x42);

        // CHR ROM: reads work, writes are dropped
        assert_eq!(nrom.chr_read(0x0000), 0xCC);
        nrom.chr_write(0x0000, 0x11);
        assert_eq!(nrom.chr_read(0x0000), 0xCC);
    }

    #[test]
    fn nrom_16k_prg_mirroring() {
        let mut prg = vec![0x00; 16 * 1024];
        prg[0] = 0x12;
        prg[0x3FFF] = 0x34;
        let chr = vec![0; 8 * 1024];
        let mut nrom = Nrom::new(prg, chr, true, 0);

        assert_eq!(nrom.cpu_read(0x8000), 0x12);
        assert_eq!(nrom.cpu_read(0xBFFF), 0x34);
        // Upper window mirrors the single bank
        assert_eq!(nrom.cpu_read(0xC000), 0x12);
        assert_eq!(nrom.cpu_read(0xFFFF), 0x34);
    }

    #[test]
    fn prg_rom_writes_ignored() {
        let prg = vec![0xAA; 32 * 1024];
        let mut nrom = Nrom::new(prg, vec![0; 8 * 1024], true, 0);
        nrom.cpu_write(0x8000, 0x00);
        assert_eq!(nrom.cpu_read(0x8000), 0xAA);
    }

    #[test]
    fn chr_ram_is_writable() {
        let prg = vec![0xAA; 32 * 1024];
        let chr = vec![0x00; 8 * 1024];
        let mut nrom = Nrom::new(prg, chr, true, 0);

        assert_eq!(nrom.chr_read(0x0001), 0x00);
        nrom.chr_write(0x0001, 0x77);
        assert_eq!(nrom.chr_read(0x0001), 0x77);
    }

    #[test]
    fn missing_prg_ram_reads_zero() {
        let mut nrom = Nrom::new(vec![0xAA; 16 * 1024], vec![0; 8 * 1024], true, 0);
        nrom.cpu_write(0x6000, 0x42);
        assert_eq!(nrom.cpu_read(0x6000), 0);
    }
}
