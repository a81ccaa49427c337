//! Moving Tux
//!
//! Host runner for the wandering-logo controller. Drives the movement
//! worker against the software random source and an in-memory
//! framebuffer, so the motion can be inspected without a board.
//!
//! # Usage
//!
//! ```bash
//! # List supported board profiles
//! moving-tux profiles list
//!
//! # Wander for 200 ticks on the STM32F429 discovery geometry
//! moving-tux run --profile stm32f429-disco --enable --ticks 200
//!
//! # Touch at (120, 160) for the first 10 ticks, then save the last frame
//! moving-tux run --enable --touch 120,160 --touch-ticks 10 --snapshot frame.ppm
//!
//! # Print a config file for a profile
//! moving-tux generate-config --profile rpi4-spi
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use moving_tux::control::KICKSTART_ATTR;
use moving_tux::display::{Framebuffer, FramebufferRenderer, Logo};
use moving_tux::hal::{NoButton, XorShiftSource};
use moving_tux::profiles::{get_profile, profile_names, BoardProfile};
use moving_tux::{
    BoundedRandomPicker, ControlSurface, EngineContext, MovementEngine, Scheduler, TuxConfig,
};

/// Moving Tux
///
/// Wandering logo controller for embedded LCD boards
#[derive(Parser)]
#[command(name = "moving-tux")]
#[command(version = "0.1.0")]
#[command(about = "Wandering logo controller with hardware RNG, touch follow and button toggle")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the movement worker against a simulated display
    Run {
        /// Board profile supplying the display geometry
        #[arg(short, long)]
        profile: Option<String>,

        /// TOML configuration file (overrides --profile)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of ticks to run
        #[arg(short, long, default_value_t = 50)]
        ticks: u64,

        /// Write 1 to the kickstart attribute before starting
        #[arg(short, long)]
        enable: bool,

        /// Seed for the software random source
        #[arg(long, default_value_t = 0x5eed)]
        seed: u32,

        /// Report every N-th random sample as not ready
        #[arg(long, default_value_t = 0)]
        starve: u32,

        /// Touch point held from the first tick, as X,Y
        #[arg(long, value_parser = parse_point)]
        touch: Option<(i32, i32)>,

        /// Ticks to hold the touch before releasing it
        #[arg(long, default_value_t = 10)]
        touch_ticks: u64,

        /// Save the final frame as a PPM image
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Board profile operations
    #[command(subcommand)]
    Profiles(ProfileCommands),

    /// Print a TOML configuration
    GenerateConfig {
        /// Board profile
        #[arg(short, long, default_value = "sim")]
        profile: String,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List all supported board profiles
    List,

    /// Show detailed information about a board profile
    Show {
        /// Board profile name (e.g., stm32f429-disco, rpi4-spi, sim)
        profile: String,
    },
}

fn parse_point(s: &str) -> std::result::Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    Ok((x, y))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Run {
            profile,
            config,
            ticks,
            enable,
            seed,
            starve,
            touch,
            touch_ticks,
            snapshot,
        } => {
            let config = resolve_config(profile.as_deref(), config.as_ref())?;
            handle_run(
                &config,
                RunOptions {
                    ticks,
                    enable,
                    seed,
                    starve,
                    touch,
                    touch_ticks,
                    snapshot,
                },
            )
        }
        Commands::Profiles(cmd) => handle_profiles(cmd),
        Commands::GenerateConfig { profile, output } => handle_generate(&profile, output),
    }
}

fn resolve_config(profile: Option<&str>, path: Option<&PathBuf>) -> Result<TuxConfig> {
    if let Some(path) = path {
        return TuxConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }
    match profile {
        Some(name) => TuxConfig::default()
            .with_profile(name)
            .with_context(|| format!("Use '{}' to see available profiles", "moving-tux profiles list")),
        None => Ok(TuxConfig::default()),
    }
}

struct RunOptions {
    ticks: u64,
    enable: bool,
    seed: u32,
    starve: u32,
    touch: Option<(i32, i32)>,
    touch_ticks: u64,
    snapshot: Option<PathBuf>,
}

fn handle_run(config: &TuxConfig, opts: RunOptions) -> Result<()> {
    let source = XorShiftSource::new(opts.seed).starve_every(opts.starve);
    let picker = BoundedRandomPicker::with_limits(source, config.engine.rng_retries, config.engine.max_step);
    let renderer = FramebufferRenderer::new(
        Framebuffer::new(config.display.width, config.display.height),
        Logo::tux(config.marker.width, config.marker.height),
    );
    let engine = MovementEngine::new(picker, renderer);

    let ctx = Arc::new(EngineContext::new());
    if opts.enable {
        ControlSurface::new(&ctx)
            .store("1\n")
            .context("Failed to write kickstart attribute")?;
    }
    if let Some((x, y)) = opts.touch {
        ctx.notify_touch(x, y, true);
    }

    println!(
        "{} Display {}x{}, logo {}x{}, tick {} ms",
        "[*]".cyan().bold(),
        config.display.width,
        config.display.height,
        config.marker.width,
        config.marker.height,
        config.engine.tick_interval_ms
    );

    let scheduler = Scheduler::spawn(engine, NoButton, Arc::clone(&ctx), &config.engine)?;
    let poll = config.engine.tick_interval() / 2;
    let mut touch_held = opts.touch.is_some();

    while scheduler.ticks() < opts.ticks && !scheduler.is_finished() {
        if touch_held && scheduler.ticks() >= opts.touch_ticks {
            ctx.notify_touch(0, 0, false);
            touch_held = false;
        }
        thread::sleep(poll.max(Duration::from_millis(1)));
    }

    let ticks = scheduler.ticks();
    let engine = scheduler.stop().context("Movement worker failed")?;
    let renderer = engine.renderer();

    println!("{} Ran {} ticks", "[OK]".green().bold(), ticks);
    println!("  Final position: {}", engine.position().to_string().white().bold());
    println!("  Steps: ({}, {})", engine.steps().dx, engine.steps().dy);
    println!("  Paints: {}", renderer.paint_count());
    if let Some(bounds) = engine.bounds() {
        println!("  Bounds: ({}, {})", bounds.x, bounds.y);
    }
    print!("  {}: {}", KICKSTART_ATTR, ControlSurface::new(&ctx).show());

    if let Some(path) = opts.snapshot {
        let fb = renderer
            .framebuffer()
            .context("No framebuffer to snapshot")?;
        fb.write_ppm(&path)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        println!("{} Snapshot saved to {}", "[OK]".green().bold(), path.display());
    }

    Ok(())
}

fn handle_profiles(cmd: ProfileCommands) -> Result<()> {
    match cmd {
        ProfileCommands::List => {
            println!("{}", "=".repeat(60));
            println!("{}", "Supported Board Profiles".cyan().bold());
            println!("{}", "=".repeat(60));

            for name in profile_names() {
                if let Some(profile) = get_profile(name) {
                    println!("\n  {}: {}", name.white().bold(), profile.description);
                    println!("    Display: {}x{}", profile.display_width, profile.display_height);
                    println!("    Logo: {}x{}", profile.logo_width, profile.logo_height);
                }
            }

            println!("\n{}", "=".repeat(60));
            println!(
                "Use {} to see detailed profile information",
                "moving-tux profiles show <profile>".cyan()
            );
        }

        ProfileCommands::Show { profile } => {
            let profile = get_profile(&profile).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown board profile: {}. Use 'moving-tux profiles list' to see available profiles.",
                    profile
                )
            })?;

            print_board_profile(profile);
        }
    }

    Ok(())
}

fn print_board_profile(profile: &BoardProfile) {
    let hex = |addr: Option<usize>| match addr {
        Some(a) => format!("{a:#010x}"),
        None => "-".dimmed().to_string(),
    };

    println!("{}", "=".repeat(70));
    println!("{}", format!("Board Profile: {}", profile.name).cyan().bold());
    println!("{}", "=".repeat(70));

    println!("\n{}", "Basic Information:".white().bold());
    println!("  ID: {}", profile.id);
    println!("  Description: {}", profile.description);

    println!("\n{}", "Geometry:".white().bold());
    println!("  Display: {}x{}", profile.display_width, profile.display_height);
    println!("  Logo: {}x{}", profile.logo_width, profile.logo_height);
    println!(
        "  Bounds: ({}, {})",
        profile.display_width.saturating_sub(profile.logo_width),
        profile.display_height.saturating_sub(profile.logo_height)
    );

    println!("\n{}", "Peripherals:".white().bold());
    match profile.button_pin {
        Some(pin) => println!("  User button: GPIO {} (P{}{})", pin, (b'A' + (pin / 16) as u8) as char, pin % 16),
        None => println!("  User button: {}", "none".dimmed()),
    }
    println!("  RNG: {}", hex(profile.rng_base));
    println!("  RCC: {}", hex(profile.rcc_base));
    println!("  GPIO: {}", hex(profile.gpio_base));

    println!("\n{}", "=".repeat(70));
}

fn handle_generate(profile: &str, output: Option<PathBuf>) -> Result<()> {
    let config = TuxConfig::default()
        .with_profile(profile)
        .with_context(|| format!("Unknown board profile: {profile}"))?;
    let content = config.to_toml()?;

    match output {
        Some(path) => {
            std::fs::write(&path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Config written to {}", "[OK]".green().bold(), path.display());
        }
        None => print!("{content}"),
    }

    Ok(())
}
