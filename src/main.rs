use clap::Parser;
use heat_ingest::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result.map(Some),
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => Ok(None),
                Err(e) => Err(heat_ingest::Error::io("Failed to install CTRL+C signal handler", e)),
            },
        }
    });

    match result {
        Ok(Some(_stats)) => process::exit(0),
        Ok(None) => {
            eprintln!("\nReceived CTRL+C, stopping");
            process::exit(130);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("heat-ingest - Urban Heat Sensor Trace Ingestion");
    println!("===============================================");
    println!();
    println!("Validate, visualize and submit CSV exports from handheld");
    println!("temperature loggers carried on walks, rides and commutes.");
    println!();
    println!("USAGE:");
    println!("    heat-ingest <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    validate    Report missing fields, duration and a preview per file");
    println!("    visualize   Drawable points, temperature stats and colored segments");
    println!("    submit      Validate a trace and store it with contributor details");
    println!("    annotate    Attach hot, cool and extra notes to a submission");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    heat-ingest validate 'traces/*.csv'");
    println!("    heat-ingest visualize walk.csv --scale fine --format json");
    println!("    heat-ingest submit walk.csv --name Ada --email ada@example.org \\");
    println!("                       --area Midtown --transport Walking");
    println!("    heat-ingest annotate --submission-id 1 --hot 33.77,-84.39,sunny \\");
    println!("                         --cool 33.78,-84.40,shady --narrative 'Walked to work'");
    println!();
    println!("For detailed help on any command, use:");
    println!("    heat-ingest <COMMAND> --help");
}
