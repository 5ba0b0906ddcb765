use clap::Args;
use mindful_core::QuoteProvider;

use crate::output::{print_json, CliResult};

#[derive(Args)]
pub struct QuoteArgs {
    /// List every quote instead of picking one
    #[arg(long)]
    all: bool,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: QuoteArgs) -> CliResult {
    let provider = QuoteProvider;
    if args.all {
        if args.json {
            return print_json(&provider.all());
        }
        for quote in provider.all() {
            println!("{quote}\n");
        }
        return Ok(());
    }

    let quote = provider.random(&mut rand::thread_rng());
    if args.json {
        print_json(quote)
    } else {
        println!("{quote}");
        Ok(())
    }
}
