use clap::Parser;
use std::{error::Error, fs, io::Read};

use processing::executable_utils::{initialize_tracing, load_config};
use rto::{load_predictor, predict_json};

/// Screen order records from a JSON file (or stdin) and print the predictions.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "target/debug/config/total_config.yaml")]
    config: String,

    /// JSON file holding one record or an array of records; `-` reads stdin
    #[arg(short, long, default_value = "-")]
    record: String,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    initialize_tracing(&config.backend.log_level);

    let input = if args.record == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&args.record)?
    };

    let predictor = load_predictor(&config)?;

    let output = predict_json(&predictor, &input)?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);

    Ok(())
}
