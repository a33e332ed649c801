/*!
Sprite evaluation and per-pixel sprite selection.

Evaluation runs once per line at dot 257 and selects the sprites for the
following line: the 64 OAM entries are scanned in order, the first eight
in range are latched (pattern rows fetched, flips applied), and the
overflow status bit is raised when a ninth qualifies. An OAM Y byte
stores the line above the sprite's first visible line, so comparing the
evaluating line against Y yields the hardware's one-line offset.

At pixel time the first latched sprite with an opaque pixel at the
current X wins; its priority bit then decides whether it covers the
background. Sprite 0 is tracked through evaluation so the sprite-0 hit
flag can be raised in the mux.
*/

use crate::cartridge::Cartridge;
use crate::ppu::{CTRL_SPRITE_8X16, CTRL_SPRITE_TABLE, Ppu, STATUS_OVERFLOW, SpriteSlot};

/// Opaque sprite pixel chosen for the current dot.
pub(crate) struct SpritePixel {
    /// 2-bit pattern value (never 0).
    pub(crate) pattern: u8,
    /// Raw OAM attribute byte; low bits select the palette.
    pub(crate) attr: u8,
    /// Priority bit: true means the background covers the sprite.
    pub(crate) behind: bool,
    pub(crate) is_sprite0: bool,
}

impl Ppu {
    /// Scan OAM for sprites visible on the next line and latch up to
    /// eight of them. Call at dot 257 with rendering enabled.
    pub(crate) fn evaluate_sprites(&mut self, cart: &Cartridge) {
        let height: i16 = if self.ctrl & CTRL_SPRITE_8X16 != 0 {
            16
        } else {
            8
        };
        self.sprite_count = 0;

        for i in 0..64 {
            let y = self.oam[i * 4] as i16;
            let row = self.scanline() - y;
            if row < 0 || row >= height {
                continue;
            }
            if self.sprite_count == 8 {
                self.status |= STATUS_OVERFLOW;
                break;
            }

            let tile = self.oam[i * 4 + 1];
            let attr = self.oam[i * 4 + 2];
            let x = self.oam[i * 4 + 3];

            let mut row = row as u16;
            if attr & 0x80 != 0 {
                row = (height as u16 - 1) - row; // vertical flip
            }

            let addr = if height == 16 {
                let table = ((tile & 1) as u16) << 12;
                let mut index = (tile & 0xFE) as u16;
                if row >= 8 {
                    index += 1;
                    row -= 8;
                }
                table | (index << 4) | row
            } else {
                let table = ((self.ctrl & CTRL_SPRITE_TABLE) as u16) << 9;
                table | ((tile as u16) << 4) | row
            };

            self.sprites[self.sprite_count] = SpriteSlot {
                x,
                attr,
                pat_lo: cart.chr_read(addr),
                pat_hi: cart.chr_read(addr + 8),
                is_sprite0: i == 0,
            };
            self.sprite_count += 1;
        }
    }

    /// First opaque sprite pixel at screen column `x`, in OAM order.
    pub(crate) fn sprite_pixel(&self, x: usize) -> Option<SpritePixel> {
        for slot in &self.sprites[..self.sprite_count] {
            let offset = x.wrapping_sub(slot.x as usize);
            if offset >= 8 {
                continue;
            }
            let bit = if slot.attr & 0x40 != 0 {
                offset // horizontal flip
            } else {
                7 - offset
            };
            let pattern =
                (((slot.pat_hi >> bit) & 1) << 1) | ((slot.pat_lo >> bit) & 1);
            if pattern == 0 {
                continue;
            }
            return Some(SpritePixel {
                pattern,
                attr: slot.attr,
                behind: slot.attr & 0x20 != 0,
                is_sprite0: slot.is_sprite0,
            });
        }
        None
    }
}
