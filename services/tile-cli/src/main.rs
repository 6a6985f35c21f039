//! raster-tiles
//!
//! Inspects STAC items, lists colormaps, exports colormap swatches and
//! renders single tiles from raster fixtures to PNG.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use raster_common::TileWindow;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "raster-tiles")]
#[command(about = "Raster tile rendering tools for STAC items")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", env = "RASTER_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the ordered raster assets and the default band selection
    Assets {
        /// STAC item JSON file
        #[arg(long)]
        item: PathBuf,

        /// Also list thumbnail and overview images
        #[arg(long)]
        include_thumbnails: bool,
    },

    /// List the built-in colormaps
    Colormaps,

    /// Write a colormap as a horizontal PNG strip
    Swatch {
        /// Colormap name (suffix `_r` to reverse)
        #[arg(long)]
        colormap: String,

        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value = "256")]
        width: usize,

        #[arg(long, default_value = "16")]
        height: usize,
    },

    /// Render one tile from raster fixtures to PNG
    Render {
        /// Raster fixture JSON, one per selected band in selection order
        #[arg(long, required = true, num_args = 1..)]
        raster: Vec<PathBuf>,

        /// Layer configuration (YAML or JSON)
        #[arg(long)]
        config: PathBuf,

        /// STAC item supplying band metadata (nodata, scale, offset)
        #[arg(long)]
        item: Option<PathBuf>,

        /// Resolution level (0 = full resolution)
        #[arg(long, default_value = "0")]
        level: usize,

        /// Pixel window as x,y,width,height
        #[arg(long, value_parser = parse_window)]
        window: TileWindow,

        #[arg(long)]
        out: PathBuf,
    },
}

fn parse_window(s: &str) -> Result<TileWindow, String> {
    TileWindow::parse(s).ok_or_else(|| format!("expected x,y,width,height, got '{}'", s))
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(true);

    match args.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    match args.command {
        Command::Assets {
            item,
            include_thumbnails,
        } => {
            let report = commands::assets(&item, include_thumbnails)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Colormaps => {
            for name in commands::colormaps() {
                println!("{}", name);
            }
        }
        Command::Swatch {
            colormap,
            out,
            width,
            height,
        } => {
            commands::swatch(&colormap, &out, width, height)?;
            info!(colormap = %colormap, out = %out.display(), "Wrote swatch");
        }
        Command::Render {
            raster,
            config,
            item,
            level,
            window,
            out,
        } => {
            let request = commands::RenderRequest {
                rasters: raster,
                config,
                item,
                level,
                window,
            };
            let result = commands::render(&request, &out).await?;
            info!(
                out = %out.display(),
                width = result.tile.width,
                height = result.tile.height,
                bounds = ?result.bounds,
                "Wrote tile"
            );
        }
    }

    Ok(())
}
