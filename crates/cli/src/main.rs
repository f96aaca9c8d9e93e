mod printer;

use std::process;

use clap::Parser;
use tracing::{debug, info, warn};

use predicate_cli::Args;
use predicate_core::oracle::{NullOracle, Oracle, Outcome};
use predicate_core::reconstruct;
use predicate_core::symbolic::SymbolicContext;
use predicate_core::Encoder;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    process::exit(run(&args));
}

fn run(args: &Args) -> i32 {
    let store = match predicate_parser::parse_history_file(&args.log) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };
    info!(
        transactions = store.transaction_count(),
        sessions = store.session_count(),
        "parsed log"
    );

    let config = args.config();
    let encoder = Encoder::new(config.clone());
    let bag = encoder.build_constraints(&store);
    debug!(assertions = bag.len(), "built constraint bag");
    if args.debug {
        println!("{}", bag.render());
    }

    let mut oracle = NullOracle;
    let outcome = oracle.check(&bag.into_formula(), config.oracle_timeout);
    info!(verdict = outcome.label(), "oracle returned");
    println!("{}", outcome.label());

    match outcome {
        Outcome::Sat(model) => {
            let ctx = SymbolicContext::new(config.strategy.boundary());
            let predicted = reconstruct::reconstruct(&model, &store, ctx);

            let history = printer::format_predicted_history(&store, &predicted);
            let rewrites = printer::format_rewrites(&store, &predicted);
            let mut output = history;
            if !rewrites.is_empty() {
                output.push_str("---\n");
                output.push_str(&rewrites);
            }

            if args.visualize {
                output.push_str("---\n");
                output.push_str(&printer::dot_graph(&store, &model));
            }

            write_output(args, &output);
            0
        }
        Outcome::Unsat => 0,
        Outcome::Unknown => {
            warn!("oracle returned unknown; no predicted history to reconstruct");
            0
        }
    }
}

fn write_output(args: &Args, content: &str) {
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, content) {
                eprintln!("failed to write {}: {e}", path.display());
                process::exit(1);
            }
        }
        None => print!("{content}"),
    }
}
