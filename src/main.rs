//! Headless runner: load an iNES ROM, simulate frames, report state.

use clap::Parser;
use famicore::{Nes, controller::Button};
use std::path::PathBuf;
use std::process::ExitCode;

/// Headless NES core runner
#[derive(Parser, Debug)]
#[command(name = "famicore")]
#[command(about = "Run an iNES ROM on the simulation core", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Number of frames to simulate
    #[arg(short, long, default_value = "60")]
    frames: u64,

    /// Buttons held on pad 1 for the whole run, e.g. "a,start,right"
    #[arg(short, long)]
    buttons: Option<String>,

    /// Dump CPU and PPU register state after the run
    #[arg(short, long)]
    dump: bool,

    /// Write the final frame as a PNG
    #[cfg(feature = "screenshot")]
    #[arg(short, long)]
    screenshot: Option<PathBuf>,
}

fn parse_buttons(list: &str) -> Result<u8, String> {
    let mut mask = 0u8;
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let button = match name.to_ascii_lowercase().as_str() {
            "a" => Button::A,
            "b" => Button::B,
            "select" => Button::Select,
            "start" => Button::Start,
            "up" => Button::Up,
            "down" => Button::Down,
            "left" => Button::Left,
            "right" => Button::Right,
            other => return Err(format!("unknown button: {other}")),
        };
        mask |= button.mask();
    }
    Ok(mask)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut nes = Nes::new();
    nes.insert_cartridge_file(&args.rom)?;

    if let Some(list) = &args.buttons {
        nes.set_buttons(parse_buttons(list)?);
    }

    for _ in 0..args.frames {
        nes.run_frame()?;
    }

    if args.dump {
        let cpu = nes.cpu();
        println!(
            "CPU  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PC:{:04X} cycles:{}",
            cpu.a, cpu.x, cpu.y, cpu.status, cpu.sp, cpu.pc, cpu.cycles
        );
        let ppu = nes.ppu();
        println!(
            "PPU  ctrl:{:02X} mask:{:02X} status:{:02X} scanline:{} dot:{} frame:{}",
            ppu.ctrl(),
            ppu.mask(),
            ppu.status(),
            ppu.scanline(),
            ppu.dot(),
            ppu.frame_count()
        );
    }

    #[cfg(feature = "screenshot")]
    if let Some(path) = &args.screenshot {
        save_png(path, nes.frame())?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(feature = "screenshot")]
fn save_png(path: &PathBuf, frame: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    use famicore::palette::frame_to_rgb;
    use famicore::ppu::{HEIGHT, WIDTH};

    let rgb = frame_to_rgb(frame);
    let img = image::RgbImage::from_raw(WIDTH as u32, HEIGHT as u32, rgb)
        .ok_or("frame buffer has unexpected size")?;
    img.save(path)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
