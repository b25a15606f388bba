//! Command-line runner: load an iNES image, run it headless for a number of
//! frames (optionally saving the last one as PNG), or open a window.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use cyclenes::console::{Console, ConsoleConfig};
use cyclenes::controller::Port;
use cyclenes::cpu::TraceRecord;
use cyclenes::cpu::disasm::disassemble;
use tracing::{Level, info};

#[cfg(feature = "display")]
mod display;

#[derive(Parser, Debug)]
#[command(name = "cyclenes")]
#[command(about = "Cycle-stepped NES emulator core", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Frames to run in headless mode
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Save the last frame as PNG (needs the `screenshot` feature)
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Plug a light gun into port 2 instead of a second pad
    #[arg(long)]
    zapper: bool,

    /// Print one line per executed instruction
    #[arg(long)]
    trace_cpu: bool,

    /// Open a window instead of running headless (needs the `display` feature)
    #[arg(short, long)]
    window: bool,
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    let mut config = ConsoleConfig::default();
    if args.zapper {
        config.input[1] = Port::zapper();
    }

    let bytes = match std::fs::read(&args.rom) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read ROM file {}: {e}", args.rom.display());
            process::exit(1);
        }
    };
    let mut console = match Console::from_ines_bytes(&bytes, config) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("Failed to load ROM: {e}");
            process::exit(1);
        }
    };

    if args.trace_cpu {
        install_trace(&mut console);
    }

    if args.window {
        run_window(console);
        return;
    }

    for _ in 0..args.frames {
        console.step_frame();
    }
    let state = console.cpu().state();
    info!(
        frames = console.frame_count(),
        cpu_cycles = console.cpu_cycles(),
        pc = format_args!("{:#06X}", state.pc),
        "headless run finished"
    );

    if let Some(path) = &args.screenshot {
        if let Err(e) = save_screenshot(console.frame(), path) {
            eprintln!("Failed to save screenshot {}: {e}", path.display());
            process::exit(1);
        }
    }
}

/// One nestest-style line per instruction.
fn install_trace(console: &mut Console) {
    console.cpu_mut().set_trace_hook(Box::new(|r: &TraceRecord| {
        println!(
            "{:04X}  {:02X}  {:<14} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            r.pc,
            r.opcode,
            disassemble(r.opcode, &r.operands, r.pc),
            r.a,
            r.x,
            r.y,
            r.p,
            r.s,
            r.cycles
        );
    }));
}

#[cfg(feature = "display")]
fn run_window(console: Console) {
    if let Err(e) = display::run(console) {
        eprintln!("Display error: {e}");
        process::exit(1);
    }
}

#[cfg(not(feature = "display"))]
fn run_window(_console: Console) {
    eprintln!("Window mode needs the `display` feature");
    process::exit(1);
}

#[cfg(feature = "screenshot")]
fn save_screenshot(frame: &[u32], path: &std::path::Path) -> Result<(), image::ImageError> {
    use cyclenes::ppu::{NES_HEIGHT, NES_WIDTH};

    let rgba: Vec<u8> = frame
        .iter()
        .flat_map(|&argb| {
            let [_, r, g, b] = argb.to_be_bytes();
            [r, g, b, 0xFF]
        })
        .collect();
    image::save_buffer(
        path,
        &rgba,
        NES_WIDTH as u32,
        NES_HEIGHT as u32,
        image::ColorType::Rgba8,
    )
}

#[cfg(not(feature = "screenshot"))]
fn save_screenshot(_frame: &[u32], _path: &std::path::Path) -> Result<(), String> {
    Err("built without the `screenshot` feature".to_string())
}
