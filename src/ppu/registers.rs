/*!
CPU-visible register file ($2000-$2007, pre-mirroring).

The bus masks the address down to the register index before calling in.
Reads and writes with architectural side effects live here: the $2002
read clears vblank and the shared write toggle, $2005/$2006 are the
two-write latches into `t`/`v`, and $2007 drives the buffered VRAM port.
*/

use crate::cartridge::Cartridge;
use crate::ppu::{CTRL_NMI_ENABLE, CTRL_VRAM_STEP_32, Ppu, STATUS_VBLANK};

impl Ppu {
    /// Read one of the eight registers. `reg` is the address masked to 0-7.
    pub fn read_register(&mut self, reg: u16, cart: &mut Cartridge) -> u8 {
        match reg {
            // PPUSTATUS: top three bits live, the rest echoes the data buffer.
            2 => {
                let value = (self.status & 0xE0) | (self.data_buffer & 0x1F);
                self.status &= !STATUS_VBLANK;
                self.w = false;
                value
            }
            // OAMDATA: no address increment on reads.
            4 => self.oam[self.oam_addr as usize],
            // PPUDATA: buffered below the palette, immediate within it.
            7 => {
                let addr = self.v & 0x3FFF;
                let value = if addr < 0x3F00 {
                    let buffered = self.data_buffer;
                    self.data_buffer = self.vram_read(cart, addr);
                    buffered
                } else {
                    // Palette reads bypass the buffer; the buffer still
                    // picks up the nametable byte underneath.
                    let value = self.vram_read(cart, addr);
                    self.data_buffer = self.vram_read(cart, addr & 0x2FFF);
                    value
                };
                self.v = self.v.wrapping_add(self.vram_step()) & 0x3FFF;
                value
            }
            // Write-only registers read back as the data buffer residue.
            _ => self.data_buffer,
        }
    }

    /// Register read without side effects, for the inspector.
    pub fn peek_register(&self, reg: u16) -> u8 {
        match reg {
            2 => (self.status & 0xE0) | (self.data_buffer & 0x1F),
            4 => self.oam[self.oam_addr as usize],
            _ => self.data_buffer,
        }
    }

    /// Write one of the eight registers. `reg` is the address masked to 0-7.
    pub fn write_register(&mut self, reg: u16, value: u8, cart: &mut Cartridge) {
        match reg {
            // PPUCTRL: also holds the nametable select bits of `t`.
            0 => {
                let was_enabled = self.ctrl & CTRL_NMI_ENABLE != 0;
                self.ctrl = value;
                self.t = (self.t & !0x0C00) | (((value as u16) & 0x03) << 10);
                // Enabling NMI mid-vblank raises it immediately.
                if !was_enabled
                    && value & CTRL_NMI_ENABLE != 0
                    && self.status & STATUS_VBLANK != 0
                {
                    self.request_nmi();
                }
            }
            1 => self.mask = value,
            3 => self.oam_addr = value,
            4 => {
                self.oam[self.oam_addr as usize] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            // PPUSCROLL: X then Y through the shared toggle.
            5 => {
                if !self.w {
                    self.t = (self.t & !0x001F) | ((value as u16) >> 3);
                    self.fine_x = value & 0x07;
                    self.w = true;
                } else {
                    self.t = (self.t & !0x73E0)
                        | (((value as u16) & 0x07) << 12)
                        | (((value as u16) >> 3) << 5);
                    self.w = false;
                }
            }
            // PPUADDR: high byte then low byte; the second write loads `v`.
            6 => {
                if !self.w {
                    self.t = (self.t & 0x00FF) | (((value as u16) & 0x3F) << 8);
                    self.w = true;
                } else {
                    self.t = (self.t & 0xFF00) | value as u16;
                    self.v = self.t;
                    self.w = false;
                }
            }
            7 => {
                let addr = self.v & 0x3FFF;
                self.vram_write(cart, addr, value);
                self.v = self.v.wrapping_add(self.vram_step()) & 0x3FFF;
            }
            _ => {}
        }
    }

    #[inline]
    fn vram_step(&self) -> u16 {
        if self.ctrl & CTRL_VRAM_STEP_32 != 0 {
            32
        } else {
            1
        }
    }
}
