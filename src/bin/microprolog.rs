//! Interactive read-eval-print loop
//!
//! Each input line is parsed and evaluated on its own; an error is printed
//! and the session continues with the knowledge base built so far. `halt.`
//! or end of input quits.
//!
//! Set `MICROPROLOG_MAX_DEPTH` to change how many nested rule expansions a
//! query may make (default 4096) and
//! `RUST_LOG` to control logging.

use anyhow::{Context, Result};
use bstr::ByteSlice;
use log::info;
use microprolog::{Interpreter, SolverConfig};
use std::env;
use std::io::{self, BufRead, Write};

const PROMPT: &str = "> ";
const DEFAULT_MAX_DEPTH: usize = 4096;

fn solver_config() -> Result<SolverConfig> {
    let limit = match env::var("MICROPROLOG_MAX_DEPTH") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid MICROPROLOG_MAX_DEPTH `{raw}`"))?,
        Err(env::VarError::NotPresent) => DEFAULT_MAX_DEPTH,
        Err(err) => return Err(err).context("failed to read MICROPROLOG_MAX_DEPTH"),
    };
    Ok(SolverConfig::default().with_max_depth(limit))
}

fn main() -> Result<()> {
    env_logger::init();

    let config = solver_config()?;
    info!("starting session with max depth {:?}", config.max_depth);
    let mut interpreter = Interpreter::with_config(config);

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    let mut line = Vec::new();

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .context("failed to read from stdin")?;
        if read == 0 {
            break;
        }

        let source = line.trim().to_str_lossy();
        if source.is_empty() {
            continue;
        }
        if source == "halt." {
            break;
        }

        match interpreter.evaluate_source(&source) {
            Ok(Some(outcome)) => writeln!(output, "{outcome}")?,
            Ok(None) => writeln!(output, "ok")?,
            Err(err) => writeln!(output, "error: {err}")?,
        }
    }

    info!(
        "session ended with {} stored clauses",
        interpreter.knowledge_base().len()
    );
    Ok(())
}
