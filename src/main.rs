//! Pilltui: virus-clearing capsule puzzle game in the terminal.

mod app;
mod block;
mod collision;
mod game;
mod gravity;
mod grid;
mod input;
mod matcher;
mod pill;
mod theme;
mod ui;
mod viruses;

use anyhow::{Context, Result, ensure};
use app::App;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Largest board side; keeps the drawn bottle within terminal coordinates.
pub const MAX_BOARD_SIDE: usize = 255;

/// Rules that shape a game: board size, virus counts, drop speed and seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub initial_viruses: u32,
    pub max_viruses: u32,
    pub drop_interval: Duration,
    /// Fixed RNG seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 16,
            initial_viruses: 4,
            max_viruses: 84,
            drop_interval: Duration::from_millis(1000),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.width >= 2, "board must be at least 2 columns wide (got {})", self.width);
        ensure!(self.height >= 6, "board must be at least 6 rows tall (got {})", self.height);
        ensure!(
            self.width <= MAX_BOARD_SIDE && self.height <= MAX_BOARD_SIDE,
            "board is at most {MAX_BOARD_SIDE}x{MAX_BOARD_SIDE} (got {}x{})",
            self.width,
            self.height
        );
        ensure!(self.initial_viruses > 0, "at least one virus is required");
        ensure!(
            self.max_viruses >= self.initial_viruses,
            "max viruses ({}) is below the initial count ({})",
            self.max_viruses,
            self.initial_viruses
        );
        ensure!(!self.drop_interval.is_zero(), "drop interval must be positive");
        Ok(())
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            width: args.width,
            height: args.height,
            initial_viruses: args.viruses,
            max_viruses: args.max_viruses,
            drop_interval: Duration::from_millis(args.drop_interval_ms),
            seed: args.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from(&args);
    config.validate()?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).with_context(|| {
        let path = args.theme.as_ref().map(|p| p.display().to_string());
        format!("loading theme {}", path.unwrap_or_default())
    })?;
    let mut app = App::new(&args, &config, theme);
    app.run()?;
    Ok(())
}

/// Capsule puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "pilltui",
    version,
    about = "Virus-clearing capsule puzzle in the terminal. Line up four of a colour to clear them.",
    long_about = "Pilltui is a terminal puzzle game in the style of Dr. Mario.\n\n\
        Two-coloured capsules fall into a bottle full of viruses. Line up four or more \
        blocks of one colour, across or down, to clear them. Clear every virus to reach \
        the next level; a capsule that cannot enter the bottle ends the game.\n\n\
        CONTROLS:\n  Left/Right h/l  Move     Up k x     Rotate      Down j   Soft drop\n  \
        Space           Hard drop  Enter r    Start       P        Pause    Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\").
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Board width in columns.
    #[arg(long, default_value = "8", value_name = "COLS")]
    pub width: usize,

    /// Board height in rows.
    #[arg(long, default_value = "16", value_name = "ROWS")]
    pub height: usize,

    /// Viruses on level 1; each level adds four more.
    #[arg(long, default_value = "4", value_name = "N")]
    pub viruses: u32,

    /// Upper bound on viruses per level.
    #[arg(long, default_value = "84", value_name = "N")]
    pub max_viruses: u32,

    /// Time between automatic drops.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub drop_interval_ms: u64,

    /// Seed for virus layout and capsule colours (random if not set).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the clear animation.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
