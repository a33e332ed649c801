/*!
CPU memory bus: the single dispatch point for the 64 KiB address space.

Map:
- $0000-$1FFF: 2 KiB internal RAM, mirrored every $0800
- $2000-$3FFF: PPU registers, mirrored every 8 bytes
- $4000-$4013, $4015: APU registers (reserved; reads 0, writes dropped)
- $4014: OAM DMA trigger
- $4016-$4017: controller ports
- $4018-$5FFF: open (reads 0, writes dropped)
- $6000-$FFFF: cartridge space, delegated to the mapper

Every address resolves to exactly one handler; mirrored and open regions
are defined behavior, never errors.

The bus also carries the interrupt plumbing between chips: `tick` runs
the PPU three dots per CPU cycle, then latches the PPU's NMI request and
the mapper's IRQ line for the CPU to pick up at its next instruction
boundary. An OAM DMA write performs the 256-byte copy immediately and
records the 513/514-cycle stall the CPU consumes before its next fetch.
*/

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::ppu::Ppu;

const RAM_SIZE: usize = 0x0800;

pub struct Bus {
    ram: [u8; RAM_SIZE],
    cart: Option<Cartridge>,
    pub ppu: Ppu,
    pad1: Controller,
    pad2: Controller,

    nmi_pending: bool,
    irq_line: bool,
    dma_stall: u32,
    /// CPU cycles ticked since power-up; parity decides the DMA stall length.
    cycles: u64,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; RAM_SIZE],
            cart: None,
            ppu: Ppu::new(),
            pad1: Controller::new(),
            pad2: Controller::new(),
            nmi_pending: false,
            irq_line: false,
            dma_stall: 0,
            cycles: 0,
        }
    }

    pub fn attach_cartridge(&mut self, cart: Cartridge) {
        self.cart = Some(cart);
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cart.as_ref()
    }

    /// Reset bus-side state without discarding the cartridge.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.nmi_pending = false;
        self.irq_line = false;
        self.dma_stall = 0;
        self.cycles = 0;
    }

    // ----- CPU-visible address space -----

    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr as usize) & 0x07FF],
            0x2000..=0x3FFF => match self.cart.as_mut() {
                Some(cart) => self.ppu.read_register(addr & 0x0007, cart),
                None => 0,
            },
            0x4016 => self.pad1.read(),
            0x4017 => self.pad2.read(),
            // APU-reserved, DMA trigger and open expansion space all read 0.
            0x4000..=0x5FFF => 0,
            0x6000..=0xFFFF => match self.cart.as_mut() {
                Some(cart) => cart.cpu_read(addr),
                None => 0,
            },
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr as usize) & 0x07FF] = value,
            0x2000..=0x3FFF => {
                if let Some(cart) = self.cart.as_mut() {
                    self.ppu.write_register(addr & 0x0007, value, cart);
                }
            }
            0x4014 => self.oam_dma(value),
            0x4016 => {
                // One strobe line feeds both pads.
                self.pad1.write_strobe(value);
                self.pad2.write_strobe(value);
            }
            0x4000..=0x5FFF => {}
            0x6000..=0xFFFF => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.cpu_write(addr, value);
                }
            }
        }
    }

    /// Side-effect-free read for the inspector: $2002 keeps its flags and
    /// the controller shift position stays put.
    pub fn peek(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr as usize) & 0x07FF],
            0x2000..=0x3FFF => self.ppu.peek_register(addr & 0x0007),
            0x4016 => self.pad1.peek(),
            0x4017 => self.pad2.peek(),
            0x4000..=0x5FFF => 0,
            0x6000..=0xFFFF => match self.cart.as_mut() {
                Some(cart) => cart.cpu_read(addr),
                None => 0,
            },
        }
    }

    /// Little-endian word read, used for vectors.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    // ----- OAM DMA -----

    /// $4014 write: copy 256 bytes from CPU page $XX00 into OAM starting
    /// at OAMADDR, then stall the CPU for 513 cycles (514 when triggered
    /// on an odd cycle).
    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        for i in 0..256u16 {
            let byte = self.read(base + i);
            self.ppu.oam_dma_write(byte);
        }
        self.dma_stall += 513 + (self.cycles & 1) as u32;
    }

    /// Pending DMA stall cycles, cleared on read.
    pub fn take_dma_stall(&mut self) -> u32 {
        std::mem::take(&mut self.dma_stall)
    }

    // ----- inter-chip stepping -----

    /// Advance the PPU three dots per elapsed CPU cycle, then latch the
    /// interrupt lines. Returns true when a frame completed.
    pub fn tick(&mut self, cpu_cycles: u32) -> bool {
        self.cycles += cpu_cycles as u64;
        let mut frame_done = false;
        if let Some(cart) = self.cart.as_mut() {
            for _ in 0..cpu_cycles * 3 {
                if self.ppu.step_dot(cart) {
                    frame_done = true;
                }
            }
            if cart.irq_pending() {
                self.irq_line = true;
            }
        }
        if self.ppu.take_nmi() {
            self.nmi_pending = true;
        }
        frame_done
    }

    // ----- interrupt lines -----

    pub fn take_nmi_pending(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    pub fn set_nmi_pending(&mut self) {
        self.nmi_pending = true;
    }

    pub fn irq_line(&self) -> bool {
        self.irq_line
    }

    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    // ----- controllers -----

    pub fn pad1_mut(&mut self) -> &mut Controller {
        &mut self.pad1
    }

    pub fn pad2_mut(&mut self) -> &mut Controller {
        &mut self.pad2
    }
}
