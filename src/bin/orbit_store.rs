use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use orbit_store::prelude::*;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and manage an orbit-store container")]
struct Args {
    /// Container file
    #[arg(long, short, default_value = "ascot.h5")]
    file: PathBuf,
    /// Log debug events
    #[arg(long, short)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the groups of a category, oldest first
    List { category: Category },
    /// Make the group matching a tag the active one
    Activate { category: Category, tag: String },
    /// Print the identifier a tag resolves to
    Resolve { category: Category, tag: String },
    /// Print a quantity along the orbits of a run
    Get {
        run: String,
        quantity: String,
        /// Only these markers
        #[arg(long, num_args = 1..)]
        ids: Vec<i64>,
        /// Only markers that ended with this condition
        #[arg(long)]
        endcond: Option<String>,
        /// Convert to eV, deg, amu and e instead of SI
        #[arg(long)]
        display_units: bool,
    },
}

fn execute(args: Args) -> Result<(), Error> {
    let store = Store::open(&args.file)?;
    match args.command {
        Command::List { category } => {
            for summary in store.list_groups(category)? {
                let meta = summary.meta;
                println!(
                    "{} {} {:<12} {} {}",
                    if summary.active { "*" } else { " " },
                    meta.qid,
                    meta.type_name,
                    meta.date.to_rfc3339(),
                    meta.description,
                );
            }
        }
        Command::Activate { category, tag } => {
            let qid = store.resolve(category, &tag)?;
            store.activate(category, &qid)?;
            println!("{}", qid);
        }
        Command::Resolve { category, tag } => {
            println!("{}", store.resolve(category, &tag)?);
        }
        Command::Get { run, quantity, ids, endcond, display_units } => {
            let mut selection = Selection::new();
            if !ids.is_empty() {
                selection = selection.ids(ids);
            }
            if let Some(endcond) = endcond {
                selection = selection.endcond(&endcond);
            }
            if display_units {
                selection = selection.display_units();
            }
            let values = Orbits::open(&store, &run)?.get(&quantity, &selection)?;
            for value in values.iter() {
                println!("{:e}", value);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
