use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use flowlog::Report;
use std::path::PathBuf;

mod render;
use render::{RenderConfig, DEFAULT_WINDOW_END};

#[derive(Debug, Parser)]
#[command(name = "flow-graph")]
#[command(about = "Summarize and chart per-flow metrics from a simulation log")]
struct Cli {
    #[arg(short = 'f', long, default_value = "log.out", help = "Input log file")]
    filename: PathBuf,

    #[arg(short, long, default_value = "fig.png", help = "Output PNG file")]
    output: PathBuf,

    #[arg(long, help = "Show a legend of flow ids on every panel")]
    legend: bool,

    #[arg(long, default_value_t = DEFAULT_WINDOW_END, help = "End of the time axis in seconds")]
    end: f64,

    /// Verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            output: self.output.clone(),
            show_legend: self.legend,
            window_end: self.end,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let flow_log = flowlog::parse_file(&cli.filename)
        .with_context(|| format!("Failed to parse log file: {}", cli.filename.display()))?;

    print!("{}", Report::from_log(&flow_log));

    let config = cli.render_config();
    render::render(&flow_log, &config)
        .with_context(|| format!("Failed to render chart: {}", config.output.display()))?;

    Ok(())
}
