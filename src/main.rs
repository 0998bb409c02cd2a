use std::fs;
use std::path::PathBuf;

use clap::Parser;
use mdelements::Config;

#[derive(Parser)]
#[command(name = "mdelements")]
#[command(about = "Parse Markdown files into structured JSON elements")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory relative image paths are resolved against
    /// (defaults to the input file's directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit the table of contents instead of the elements
    #[arg(long)]
    toc: bool,

    /// Shallowest heading level kept in the table of contents
    #[arg(long)]
    min_level: Option<u8>,

    /// Deepest heading level kept in the table of contents
    #[arg(long)]
    max_level: Option<u8>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::compiled_default(),
    };
    if let Some(min) = cli.min_level {
        config.toc.min_level = min;
    }
    if let Some(max) = cli.max_level {
        config.toc.max_level = max;
    }

    // Read input file
    let markdown = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let base_dir = cli
        .base_dir
        .clone()
        .or_else(|| cli.input.parent().map(PathBuf::from));
    let elements = mdelements::parse_with_config(&markdown, base_dir.as_deref(), &config.parser);

    let json = if cli.toc {
        let entries = mdelements::extract_table_of_contents(&elements);
        let entries = mdelements::filter_toc_by_level(
            &entries,
            config.toc.min_level,
            config.toc.max_level,
        );
        to_json(&entries, cli.compact)
    } else {
        to_json(&elements, cli.compact)
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(output) => {
            if let Err(e) = fs::write(output, json + "\n") {
                eprintln!("Error writing {}: {}", output.display(), e);
                std::process::exit(1);
            }
            eprintln!("Created {}", output.display());
        }
        None => println!("{}", json),
    }
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}
