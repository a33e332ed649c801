/*!
Console facade: owns the CPU and bus and drives them in lockstep.

`run_frame` is the host's main entry point. It steps the CPU one
instruction at a time and advances the PPU three dots per CPU cycle
until the PPU reports frame completion, then hands back the freshly
swapped front buffer. The cadence never varies, so identical inputs
produce identical frames.

Between frames the host may inspect and patch bus addresses through
`peek`/`poke` and read the register state of both chips.
*/

use crate::bus::Bus;
use crate::cartridge::{Cartridge, LoadError};
use crate::controller::Controller;
use crate::cpu::{Cpu, CpuError};
use crate::ppu::Ppu;
use std::path::Path;

pub struct Nes {
    cpu: Cpu,
    bus: Bus,
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
        }
    }

    /// Parse an iNES image, attach it, and power up both chips. On error
    /// the console keeps whatever state it had before the call.
    pub fn insert_cartridge(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        let cart = Cartridge::from_ines_bytes(bytes)?;
        self.bus.attach_cartridge(cart);
        self.reset();
        Ok(())
    }

    /// Convenience loader for a .nes file on disk.
    pub fn insert_cartridge_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let cart = Cartridge::from_ines_file(path)?;
        self.bus.attach_cartridge(cart);
        self.reset();
        Ok(())
    }

    /// Power-up both chips without reloading the cartridge.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
    }

    /// Run until the PPU completes the frame in progress and return the
    /// finished 256x240 plane of 6-bit palette indices.
    pub fn run_frame(&mut self) -> Result<&[u8], CpuError> {
        loop {
            let cycles = self.cpu.step(&mut self.bus)?;
            if self.bus.tick(cycles) {
                return Ok(self.bus.ppu.frame());
            }
        }
    }

    /// The most recently completed frame, stable until the next
    /// `run_frame` returns.
    pub fn frame(&self) -> &[u8] {
        self.bus.ppu.frame()
    }

    // ----- inspector contract: call between frames -----

    pub fn peek(&mut self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    pub fn poke(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }

    // ----- register views and input -----

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.bus.ppu
    }

    pub fn pad1(&mut self) -> &mut Controller {
        self.bus.pad1_mut()
    }

    pub fn pad2(&mut self) -> &mut Controller {
        self.bus.pad2_mut()
    }

    /// Replace pad 1's button state with a mask in `Button` bit order.
    pub fn set_buttons(&mut self, mask: u8) {
        self.bus.pad1_mut().set_buttons(mask);
    }
}
