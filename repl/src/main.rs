mod error;
mod repl;

use crate::error::ReplError;
use crate::repl::Repl;
use anyhow::Context;
use std::env;
use std::fs;
use std::io;
use tracing_subscriber::EnvFilter;

const STACK_SIZE: usize = 16 * 1024 * 1024;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    // Deep recursion in user programs maps onto the host stack.
    let handle = std::thread::Builder::new()
        .name("rubric".into())
        .stack_size(STACK_SIZE)
        .spawn(move || match args.as_slice() {
            [_] => Repl::new().run(),
            [_, filename] => run_file(filename),
            _ => {
                println!("Usage: rubric [filename]");
                println!("       rubric           # Run in REPL mode");
                Ok(())
            }
        })
        .context("failed to spawn interpreter thread")?;

    match handle.join() {
        Ok(result) => result,
        Err(_) => anyhow::bail!("interpreter thread panicked"),
    }
}

fn run_file(filename: &str) -> anyhow::Result<()> {
    let source = fs::read_to_string(filename)
        .with_context(|| format!("Error reading file: {filename}"))?;
    tracing::info!(file = filename, bytes = source.len(), "running file");

    match rubric_core::run_source(&source, io::stdout().lock()) {
        Ok(_) => Ok(()),
        Err(err) => {
            let err = ReplError::from_rubric(&source, err);
            eprintln!("{err}");
            anyhow::bail!("{filename}: execution failed")
        }
    }
}
