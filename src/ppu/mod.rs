/*!
Dot-stepped PPU.

`step_dot` advances the chip by exactly one dot. A frame is 341 dots by
262 scanlines: the pre-render line (-1), visible lines 0-239, the idle
post-render line 240, and vblank lines 241-260. Pixels are produced on
dots 1-256 of the visible lines only.

Timing landmarks:
- (241, 1): vblank flag set, NMI requested when enabled, and the finished
  back buffer swapped to the front (frame completion).
- (-1, 1): vblank, sprite-0 hit and sprite overflow cleared.
- dot 256: vertical position in `v` increments.
- dot 257: horizontal bits of `v` recopied from `t`; sprite evaluation
  for the next line runs here.
- pre-render dots 280-304: vertical bits of `v` recopied from `t`.

The PPU owns its address space end to end: OAM, palette RAM with the
$3F10/$3F14/$3F18/$3F1C mirrors, and 4 KiB of nametable RAM (mirrored
down to 2 KiB for horizontal/vertical arrangements, flat under
four-screen). Pattern-table traffic goes to the cartridge.

The output is a double-buffered 256x240 plane of 6-bit palette indices.
The front buffer is stable between frame completions; the host maps the
indices through an RGB table of its choosing (see `crate::palette`).
*/

mod background;
mod registers;
mod sprites;

use crate::cartridge::{Cartridge, Mirroring};

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

// PPUCTRL bits
pub(crate) const CTRL_VRAM_STEP_32: u8 = 0x04;
pub(crate) const CTRL_SPRITE_TABLE: u8 = 0x08;
pub(crate) const CTRL_BG_TABLE: u8 = 0x10;
pub(crate) const CTRL_SPRITE_8X16: u8 = 0x20;
pub(crate) const CTRL_NMI_ENABLE: u8 = 0x80;

// PPUMASK bits
pub(crate) const MASK_BG_LEFT: u8 = 0x02;
pub(crate) const MASK_SPRITES_LEFT: u8 = 0x04;
pub(crate) const MASK_BG: u8 = 0x08;
pub(crate) const MASK_SPRITES: u8 = 0x10;

// PPUSTATUS bits
pub(crate) const STATUS_OVERFLOW: u8 = 0x20;
pub(crate) const STATUS_SPRITE0: u8 = 0x40;
pub(crate) const STATUS_VBLANK: u8 = 0x80;

#[derive(Copy, Clone, Default)]
pub(crate) struct SpriteSlot {
    pub(crate) x: u8,
    pub(crate) attr: u8,
    pub(crate) pat_lo: u8,
    pub(crate) pat_hi: u8,
    pub(crate) is_sprite0: bool,
}

pub struct Ppu {
    // Register latches
    pub(crate) ctrl: u8,
    pub(crate) mask: u8,
    pub(crate) status: u8,
    pub(crate) oam_addr: u8,

    // Memories owned by the PPU
    pub(crate) oam: [u8; 256],
    pub(crate) palette: [u8; 32],
    pub(crate) nt_ram: [u8; 0x1000],

    // Internal scroll/address registers (loopy v/t, fine X, write toggle)
    pub(crate) v: u16,
    pub(crate) t: u16,
    pub(crate) fine_x: u8,
    pub(crate) w: bool,
    pub(crate) data_buffer: u8,

    // Background fetch pipeline
    pub(crate) nt_latch: u8,
    pub(crate) at_latch: u8,
    pub(crate) pt_lo_latch: u8,
    pub(crate) pt_hi_latch: u8,
    pub(crate) bg_pat_lo: u16,
    pub(crate) bg_pat_hi: u16,
    pub(crate) bg_attr_lo: u16,
    pub(crate) bg_attr_hi: u16,

    // Sprite slots for the line being drawn
    pub(crate) sprites: [SpriteSlot; 8],
    pub(crate) sprite_count: usize,

    // Timing
    dot: u16,
    scanline: i16,
    frame_count: u64,
    nmi_pending: bool,

    // Double-buffered output of 6-bit palette indices
    front: Vec<u8>,
    back: Vec<u8>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            oam: [0; 256],
            palette: [0; 32],
            nt_ram: [0; 0x1000],
            v: 0,
            t: 0,
            fine_x: 0,
            w: false,
            data_buffer: 0,
            nt_latch: 0,
            at_latch: 0,
            pt_lo_latch: 0,
            pt_hi_latch: 0,
            bg_pat_lo: 0,
            bg_pat_hi: 0,
            bg_attr_lo: 0,
            bg_attr_hi: 0,
            sprites: [SpriteSlot::default(); 8],
            sprite_count: 0,
            dot: 0,
            scanline: -1,
            frame_count: 0,
            nmi_pending: false,
            front: vec![0; WIDTH * HEIGHT],
            back: vec![0; WIDTH * HEIGHT],
        }
    }

    /// Power-up/reset without touching cartridge contents.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one dot. Returns true when this dot completed a frame
    /// (vblank start, after the buffer swap).
    pub fn step_dot(&mut self, cart: &mut Cartridge) -> bool {
        let mut frame_done = false;
        let rendering = self.rendering_enabled();

        match self.scanline {
            -1 => {
                if self.dot == 1 {
                    self.status &= !(STATUS_VBLANK | STATUS_SPRITE0 | STATUS_OVERFLOW);
                }
                if rendering {
                    self.background_dot(cart);
                    if self.dot == 257 {
                        self.evaluate_sprites(cart);
                    }
                    if (280..=304).contains(&self.dot) {
                        self.copy_y();
                    }
                }
            }
            0..=239 => {
                if (1..=256).contains(&self.dot) {
                    self.render_pixel();
                }
                if rendering {
                    self.background_dot(cart);
                    if self.dot == 257 {
                        self.evaluate_sprites(cart);
                    }
                }
            }
            241 => {
                if self.dot == 1 {
                    self.status |= STATUS_VBLANK;
                    if self.ctrl & CTRL_NMI_ENABLE != 0 {
                        self.nmi_pending = true;
                    }
                    std::mem::swap(&mut self.front, &mut self.back);
                    frame_done = true;
                }
            }
            _ => {}
        }

        self.dot += 1;
        if self.dot > 340 {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > 260 {
                self.scanline = -1;
                self.frame_count += 1;
            }
        }
        frame_done
    }

    /// Compose one pixel of the current dot into the back buffer.
    fn render_pixel(&mut self) {
        let x = (self.dot - 1) as usize;
        let y = self.scanline as usize;

        let show_bg = self.mask & MASK_BG != 0 && (x >= 8 || self.mask & MASK_BG_LEFT != 0);
        let show_sp =
            self.mask & MASK_SPRITES != 0 && (x >= 8 || self.mask & MASK_SPRITES_LEFT != 0);

        let (bg_pat, bg_attr) = if show_bg {
            self.background_pixel()
        } else {
            (0, 0)
        };
        let sprite = if show_sp { self.sprite_pixel(x) } else { None };

        let palette_addr = match (bg_pat, sprite) {
            (0, None) => 0x3F00,
            (0, Some(sp)) => 0x3F10 | ((sp.attr as u16 & 0x03) << 2) | sp.pattern as u16,
            (_, None) => 0x3F00 | ((bg_attr as u16) << 2) | bg_pat as u16,
            (_, Some(sp)) => {
                if sp.is_sprite0 && x != 255 {
                    self.status |= STATUS_SPRITE0;
                }
                if sp.behind {
                    0x3F00 | ((bg_attr as u16) << 2) | bg_pat as u16
                } else {
                    0x3F10 | ((sp.attr as u16 & 0x03) << 2) | sp.pattern as u16
                }
            }
        };

        self.back[y * WIDTH + x] = self.palette_read(palette_addr) & 0x3F;
    }

    #[inline]
    pub(crate) fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BG | MASK_SPRITES) != 0
    }

    // ----- VRAM address space -----

    pub(crate) fn vram_read(&self, cart: &Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.chr_read(addr),
            0x2000..=0x3EFF => self.nt_ram[Self::nt_index(addr, cart.mirroring())],
            _ => self.palette_read(addr),
        }
    }

    pub(crate) fn vram_write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.chr_write(addr, value),
            0x2000..=0x3EFF => {
                self.nt_ram[Self::nt_index(addr, cart.mirroring())] = value;
            }
            _ => {
                self.palette[Self::palette_index(addr)] = value;
            }
        }
    }

    /// Fold a $2000-$3EFF address into physical nametable RAM according
    /// to the cartridge's arrangement.
    #[inline]
    pub(crate) fn nt_index(addr: u16, mirroring: Mirroring) -> usize {
        let a = (addr as usize) & 0x0FFF;
        match mirroring {
            // Tables 0/1 share the first kilobyte pair, 2/3 the second.
            Mirroring::Horizontal => ((a >> 1) & 0x400) | (a & 0x3FF),
            Mirroring::Vertical => a & 0x7FF,
            Mirroring::FourScreen => a,
        }
    }

    /// Palette RAM index with the $3F10/$14/$18/$1C backdrop mirrors.
    #[inline]
    pub(crate) fn palette_index(addr: u16) -> usize {
        let idx = (addr as usize) & 0x1F;
        if idx >= 0x10 && idx % 4 == 0 {
            idx - 0x10
        } else {
            idx
        }
    }

    #[inline]
    pub(crate) fn palette_read(&self, addr: u16) -> u8 {
        self.palette[Self::palette_index(addr)]
    }

    // ----- host-facing accessors -----

    /// The most recently completed frame: 256x240 6-bit palette indices.
    pub fn frame(&self) -> &[u8] {
        &self.front
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn ctrl(&self) -> u8 {
        self.ctrl
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    /// Whether an NMI request is latched; clears the request.
    pub(crate) fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    pub(crate) fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Byte written by OAM DMA; auto-increments OAMADDR.
    pub(crate) fn oam_dma_write(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::test_utils::build_ines;

    fn cart_with_mirroring(flags6: u8) -> Cartridge {
        let rom = build_ines(1, 0, flags6, 0, 1, None);
        Cartridge::from_ines_bytes(&rom).expect("parse")
    }

    fn step_to(ppu: &mut Ppu, cart: &mut Cartridge, scanline: i16, dot: u16) {
        while !(ppu.scanline() == scanline && ppu.dot() == dot) {
            ppu.step_dot(cart);
        }
    }

    #[test]
    fn vblank_sets_at_241_1_and_clears_at_prerender() {
        let mut cart = cart_with_mirroring(0);
        let mut ppu = Ppu::new();

        step_to(&mut ppu, &mut cart, 241, 1);
        assert_eq!(ppu.status() & STATUS_VBLANK, 0);
        let frame_done = ppu.step_dot(&mut cart);
        assert!(frame_done);
        assert_ne!(ppu.status() & STATUS_VBLANK, 0);

        step_to(&mut ppu, &mut cart, -1, 1);
        ppu.step_dot(&mut cart);
        assert_eq!(ppu.status() & STATUS_VBLANK, 0);
    }

    #[test]
    fn nmi_latched_only_when_enabled() {
        let mut cart = cart_with_mirroring(0);
        let mut ppu = Ppu::new();

        step_to(&mut ppu, &mut cart, 241, 1);
        ppu.step_dot(&mut cart);
        assert!(!ppu.take_nmi());

        ppu.ctrl |= CTRL_NMI_ENABLE;
        step_to(&mut ppu, &mut cart, 241, 1);
        ppu.step_dot(&mut cart);
        assert!(ppu.take_nmi());
        assert!(!ppu.take_nmi());
    }

    #[test]
    fn frame_completes_once_per_262_scanlines() {
        let mut cart = cart_with_mirroring(0);
        let mut ppu = Ppu::new();

        let mut completions = 0;
        for _ in 0..(341 * 262 * 2) {
            if ppu.step_dot(&mut cart) {
                completions += 1;
            }
        }
        assert_eq!(completions, 2);
        assert_eq!(ppu.frame_count(), 2);
    }

    #[test]
    fn nametable_mirroring_folds() {
        use crate::cartridge::Mirroring::*;
        // Horizontal: $2000 and $2400 alias; $2800 and $2C00 alias.
        assert_eq!(
            Ppu::nt_index(0x2000, Horizontal),
            Ppu::nt_index(0x2400, Horizontal)
        );
        assert_eq!(
            Ppu::nt_index(0x2800, Horizontal),
            Ppu::nt_index(0x2C00, Horizontal)
        );
        assert_ne!(
            Ppu::nt_index(0x2000, Horizontal),
            Ppu::nt_index(0x2800, Horizontal)
        );

        // Vertical: $2000/$2800 alias; $2400/$2C00 alias.
        assert_eq!(
            Ppu::nt_index(0x2000, Vertical),
            Ppu::nt_index(0x2800, Vertical)
        );
        assert_eq!(
            Ppu::nt_index(0x2400, Vertical),
            Ppu::nt_index(0x2C00, Vertical)
        );
        assert_ne!(
            Ppu::nt_index(0x2000, Vertical),
            Ppu::nt_index(0x2400, Vertical)
        );

        // Four-screen: all four distinct.
        let mut seen: Vec<usize> = [0x2000u16, 0x2400, 0x2800, 0x2C00]
            .iter()
            .map(|&a| Ppu::nt_index(a, FourScreen))
            .collect();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn palette_backdrop_mirrors() {
        assert_eq!(Ppu::palette_index(0x3F10), Ppu::palette_index(0x3F00));
        assert_eq!(Ppu::palette_index(0x3F14), Ppu::palette_index(0x3F04));
        assert_eq!(Ppu::palette_index(0x3F18), Ppu::palette_index(0x3F08));
        assert_eq!(Ppu::palette_index(0x3F1C), Ppu::palette_index(0x3F0C));
        // Non-backdrop sprite entries stay distinct
        assert_ne!(Ppu::palette_index(0x3F11), Ppu::palette_index(0x3F01));
        // And the whole region mirrors every 32 bytes
        assert_eq!(Ppu::palette_index(0x3F20), Ppu::palette_index(0x3F00));
    }

    #[test]
    fn disabled_rendering_emits_backdrop() {
        let mut cart = cart_with_mirroring(0);
        let mut ppu = Ppu::new();
        ppu.palette[0] = 0x21;

        // Run a full frame with rendering off.
        while !ppu.step_dot(&mut cart) {}
        assert!(ppu.frame().iter().all(|&c| c == 0x21));
    }
}
