/*!
Background fetch pipeline and loopy scroll arithmetic.

During the fetch regions (dots 1-256 and 321-336 of the pre-render and
visible lines) the pipeline performs the four-step tile fetch on an
8-dot cadence: nametable byte, attribute byte, pattern low plane,
pattern high plane. Completed tiles land in 16-bit shift registers, so
the two tiles for the start of a line are prefetched on dots 321-336 of
the line before.

Scroll bookkeeping on the same cadence: coarse X steps at each tile
boundary, the Y component steps at dot 256, and the horizontal bits of
`v` come back from `t` at dot 257.
*/

use crate::cartridge::Cartridge;
use crate::ppu::{CTRL_BG_TABLE, Ppu};

impl Ppu {
    /// One dot of background work. Call only while rendering is enabled,
    /// on the pre-render or a visible line.
    pub(crate) fn background_dot(&mut self, cart: &mut Cartridge) {
        let dot = self.dot;
        let fetching = (1..=256).contains(&dot) || (321..=336).contains(&dot);

        if fetching {
            self.shift_background();
            match (dot - 1) % 8 {
                0 => {
                    let addr = 0x2000 | (self.v & 0x0FFF);
                    self.nt_latch = self.vram_read(cart, addr);
                }
                2 => {
                    // Attribute byte for the tile's 32x32 quadrant group.
                    let v = self.v;
                    let addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
                    let mut at = self.vram_read(cart, addr);
                    if v & 0x40 != 0 {
                        at >>= 4; // bottom half of the group
                    }
                    if v & 0x02 != 0 {
                        at >>= 2; // right half of the group
                    }
                    self.at_latch = at & 0x03;
                }
                4 => {
                    let addr = self.pattern_addr(0);
                    self.pt_lo_latch = self.vram_read(cart, addr);
                }
                6 => {
                    let addr = self.pattern_addr(8);
                    self.pt_hi_latch = self.vram_read(cart, addr);
                }
                7 => {
                    self.reload_shifters();
                    self.increment_x();
                    if dot == 256 {
                        self.increment_y();
                    }
                }
                _ => {}
            }
        }

        if dot == 257 {
            self.copy_x();
        }
    }

    #[inline]
    fn pattern_addr(&self, plane: u16) -> u16 {
        let table = ((self.ctrl & CTRL_BG_TABLE) as u16) << 8;
        let fine_y = (self.v >> 12) & 0x07;
        table | ((self.nt_latch as u16) << 4) | plane | fine_y
    }

    /// Sample the pixel selected by fine X from the shift registers.
    /// Returns (2-bit pattern, 2-bit attribute).
    #[inline]
    pub(crate) fn background_pixel(&self) -> (u8, u8) {
        let bit = 15 - self.fine_x as u16;
        let pat = (((self.bg_pat_hi >> bit) & 1) << 1) | ((self.bg_pat_lo >> bit) & 1);
        let attr = (((self.bg_attr_hi >> bit) & 1) << 1) | ((self.bg_attr_lo >> bit) & 1);
        (pat as u8, attr as u8)
    }

    #[inline]
    fn shift_background(&mut self) {
        self.bg_pat_lo <<= 1;
        self.bg_pat_hi <<= 1;
        self.bg_attr_lo <<= 1;
        self.bg_attr_hi <<= 1;
    }

    /// Move the latched tile into the low half of the shift registers.
    #[inline]
    fn reload_shifters(&mut self) {
        self.bg_pat_lo = (self.bg_pat_lo & 0xFF00) | self.pt_lo_latch as u16;
        self.bg_pat_hi = (self.bg_pat_hi & 0xFF00) | self.pt_hi_latch as u16;
        let lo = if self.at_latch & 1 != 0 { 0xFF } else { 0x00 };
        let hi = if self.at_latch & 2 != 0 { 0xFF } else { 0x00 };
        self.bg_attr_lo = (self.bg_attr_lo & 0xFF00) | lo;
        self.bg_attr_hi = (self.bg_attr_hi & 0xFF00) | hi;
    }

    /// Coarse X step with horizontal nametable wrap.
    pub(crate) fn increment_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Fine/coarse Y step with vertical nametable wrap. Coarse Y 29 is
    /// the last visible row; 30 and 31 pass through the attribute area
    /// without flipping the table.
    pub(crate) fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
        } else {
            self.v &= !0x7000;
            let mut coarse_y = (self.v >> 5) & 0x1F;
            if coarse_y == 29 {
                coarse_y = 0;
                self.v ^= 0x0800;
            } else if coarse_y == 31 {
                coarse_y = 0;
            } else {
                coarse_y += 1;
            }
            self.v = (self.v & !0x03E0) | (coarse_y << 5);
        }
    }

    /// Restore the horizontal bits of `v` from `t` (coarse X, NT select X).
    pub(crate) fn copy_x(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    /// Restore the vertical bits of `v` from `t` (fine Y, coarse Y, NT select Y).
    pub(crate) fn copy_y(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }
}
