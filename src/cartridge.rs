/*!
Cartridge: iNES (v1) loader and mapper selection.

Features:
- Parse an iNES (v1) header from bytes or a file path
- Extract PRG ROM, CHR (ROM, or allocate 8 KiB CHR RAM when the header
  declares zero CHR units), and the PRG RAM size
- Determine mirroring, battery flag and mapper ID, then construct the
  concrete mapper and delegate all CPU/PPU mapping through it

Notes:
- NES 2.0 images are detected (flags7 bits 2-3 == 0b10) and rejected.
- PRG RAM allocation policy: header byte 8 is the size in 8 KiB units;
  0 means 8 KiB by long-standing convention.
- A 512-byte trainer, when flagged, is skipped; its contents are not kept.
*/

use std::fs;
use std::path::Path;

use crate::mapper::{Mapper, Nrom};

/// Nametable arrangement requested by the cartridge header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Errors produced while loading an iNES image. A failed load leaves no
/// trace: the caller's console state is untouched.
#[derive(Debug)]
pub enum LoadError {
    /// Fewer than 16 bytes; no header to parse.
    TooShort,
    /// Header does not begin with "NES\x1A".
    BadMagic,
    /// The image declares the NES 2.0 extension, which is not supported.
    Nes2Unsupported,
    /// The payload ends before the section named here.
    Truncated(&'static str),
    /// The header names a mapper this crate does not implement.
    UnsupportedMapper(u16),
    /// Reading the file from disk failed.
    Io(std::io::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::TooShort => write!(f, "data too small for an iNES header"),
            LoadError::BadMagic => write!(f, "invalid iNES magic (expected NES<1A>)"),
            LoadError::Nes2Unsupported => write!(f, "NES 2.0 images are not supported"),
            LoadError::Truncated(section) => write!(f, "data too small for {section}"),
            LoadError::UnsupportedMapper(id) => write!(f, "unsupported mapper id: {id}"),
            LoadError::Io(e) => write!(f, "failed to read iNES file: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

pub struct Cartridge {
    mapper: Box<dyn Mapper>,

    // Header metadata
    mapper_id: u16,
    mirroring: Mirroring,
    battery: bool,

    // Size metadata for convenience accessors
    prg_rom_len: usize,
    chr_len: usize,
    prg_ram_len: usize,
    chr_is_ram: bool,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_id", &self.mapper_id)
            .field("mirroring", &self.mirroring)
            .field("battery", &self.battery)
            .field("prg_rom_len", &self.prg_rom_len)
            .field("chr_len", &self.chr_len)
            .field("prg_ram_len", &self.prg_ram_len)
            .field("chr_is_ram", &self.chr_is_ram)
            .finish()
    }
}

impl Cartridge {
    /// Parse raw iNES bytes and construct the mapper the header names.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < 16 {
            return Err(LoadError::TooShort);
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(LoadError::BadMagic);
        }

        let prg_rom_16k_units = data[4] as usize;
        let chr_rom_8k_units = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];
        let prg_ram_8k_units = data[8] as usize;

        // NES 2.0 if flags7 bits 2-3 == 0b10.
        if (flags7 & 0x0C) == 0x08 {
            return Err(LoadError::Nes2Unsupported);
        }

        let mapper_id = ((flags7 & 0xF0) as u16) | ((flags6 >> 4) as u16);

        let four_screen = (flags6 & 0b0000_1000) != 0;
        let vertical = (flags6 & 0b0000_0001) != 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if vertical {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let battery = (flags6 & 0b0000_0010) != 0;
        let has_trainer = (flags6 & 0b0000_0100) != 0;

        let mut offset = 16usize;
        if has_trainer {
            if data.len() < offset + 512 {
                return Err(LoadError::Truncated("iNES trainer"));
            }
            offset += 512;
        }

        let prg_rom_len = prg_rom_16k_units * 16 * 1024;
        let (chr_len, chr_is_ram) = if chr_rom_8k_units == 0 {
            (8 * 1024, true)
        } else {
            (chr_rom_8k_units * 8 * 1024, false)
        };

        if data.len() < offset + prg_rom_len {
            return Err(LoadError::Truncated("PRG ROM"));
        }
        let prg_rom = data[offset..offset + prg_rom_len].to_vec();
        offset += prg_rom_len;

        let chr = if chr_is_ram {
            vec![0; chr_len]
        } else {
            if data.len() < offset + chr_len {
                return Err(LoadError::Truncated("CHR ROM"));
            }
            data[offset..offset + chr_len].to_vec()
        };

        let prg_ram_len = if prg_ram_8k_units == 0 {
            8 * 1024
        } else {
            prg_ram_8k_units * 8 * 1024
        };

        let mapper: Box<dyn Mapper> = match mapper_id {
            0 => Box::new(Nrom::new(prg_rom, chr, chr_is_ram, prg_ram_len)),
            _ => return Err(LoadError::UnsupportedMapper(mapper_id)),
        };

        log::info!(
            "Loaded iNES image: mapper {}, PRG {} KiB, CHR {} KiB{}, {:?} mirroring",
            mapper_id,
            prg_rom_len / 1024,
            chr_len / 1024,
            if chr_is_ram { " (RAM)" } else { "" },
            mirroring,
        );

        Ok(Self {
            mapper,
            mapper_id,
            mirroring,
            battery,
            prg_rom_len,
            chr_len,
            prg_ram_len,
            chr_is_ram,
        })
    }

    /// Load a cartridge from an iNES file (.nes).
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let bytes = fs::read(path)?;
        Self::from_ines_bytes(&bytes)
    }

    // -------------- CPU side ($6000..=$FFFF) --------------

    /// Read a byte from mapper-controlled CPU space.
    #[inline]
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        self.mapper.cpu_read(addr)
    }

    /// Write a byte to mapper-controlled CPU space (PRG RAM or mapper
    /// registers; plain PRG ROM writes are ignored by NROM).
    #[inline]
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.mapper.cpu_write(addr, value);
    }

    // -------------- PPU side ($0000..=$1FFF) --------------

    /// Read a pattern-table byte through the mapper.
    #[inline]
    pub fn chr_read(&self, addr: u16) -> u8 {
        self.mapper.chr_read(addr)
    }

    /// Write a pattern-table byte through the mapper (effective only for
    /// CHR RAM cartridges).
    #[inline]
    pub fn chr_write(&mut self, addr: u16, value: u8) {
        self.mapper.chr_write(addr, value);
    }

    /// Whether the mapper is asserting its IRQ output (always false for NROM).
    #[inline]
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    // -------------- Accessors --------------

    pub fn mapper_id(&self) -> u16 {
        self.mapper_id
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn battery_backed(&self) -> bool {
        self.battery
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_rom_len
    }

    pub fn chr_len(&self) -> usize {
        self.chr_len
    }

    pub fn prg_ram_len(&self) -> usize {
        self.prg_ram_len
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }
}
