use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crossword_csp::{find_fill, render_grid, CrosswordError, FillFailure, FillOptions, GridConfig, WordList};

/// Fill a crossword structure with words from a word list.
#[derive(Parser, Debug)]
#[command(name = "crossword")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Structure file: one line per row, `_` for open cells, anything else for blocks
    structure: PathBuf,

    /// Word list file, one word per line
    words: PathBuf,

    /// Also write the filled grid to this file
    output: Option<PathBuf>,

    /// Give up after visiting this many search states
    #[arg(long)]
    step_limit: Option<u64>,

    /// Log solver progress at debug level
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    crossword_csp::log::init_logger(cli.debug);

    if let Err(e) = try_main(&cli) {
        eprintln!("Error: {e}");
        if let Some(help) = e.help() {
            eprintln!("Help: {help}");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main(cli: &Cli) -> Result<(), CrosswordError> {
    let config = GridConfig::from_structure(&fs::read_to_string(&cli.structure)?)?;
    let word_list = WordList::load_from_path(&cli.words)?;

    log::info!("Loaded {} slots and {} words", config.slot_count(), word_list.len());

    match find_fill(&config, &word_list, FillOptions { step_limit: cli.step_limit }) {
        Ok(result) => {
            let display_grid = render_grid(&config, &word_list, &result.assignment);
            println!("{display_grid}");

            log::info!(
                "{} states, {} backtracks, {} revisions in {:?}",
                result.statistics.states,
                result.statistics.backtracks,
                result.statistics.revisions,
                result.statistics.duration
            );

            if let Some(output) = &cli.output {
                fs::write(output, display_grid + "\n")?;
                log::info!("Wrote {}", output.display());
            }
        }
        Err(FillFailure::Unsolvable) => println!("No solution."),
        Err(failure @ FillFailure::ExhaustedStepLimit) => println!("No solution found: {failure}."),
    }

    Ok(())
}
