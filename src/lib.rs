#![doc = r#"
famicore: a cycle-stepped NES hardware simulation core.

The crate models the console's digital interior and nothing else: a
6502 CPU interpreter stepped per instruction with exact cycle counts, a
PPU stepped per dot, the shared memory bus with its mirrors and DMA, and
the NROM cartridge mapper. Output is a double-buffered 256x240 plane of
palette indices; presentation, audio and input devices live with the
host.

Modules:
- bus: CPU address-space dispatch, OAM DMA, interrupt latching, stepping
- cartridge: iNES v1 loader; constructs the mapper the header names
- controller: strobe/serial pad protocol on $4016/$4017
- cpu: 6502 interpreter (decode table + addressing + semantics)
- mapper: Mapper trait and the NROM implementation
- palette: host-side RGB table for the 64 hardware colors
- ppu: dot-stepped pixel pipeline, registers, sprites, VRAM
- system: `Nes`, the facade that runs whole frames

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod mapper;
pub mod palette;
pub mod ppu;
pub mod system;

pub use bus::Bus;
pub use cartridge::{Cartridge, LoadError, Mirroring};
pub use controller::Button;
pub use cpu::{Cpu, CpuError};
pub use ppu::Ppu;
pub use system::Nes;

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
