use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::advisory::ask_expert;
use crate::cli::AdviseArgs;

pub fn run(args: AdviseArgs) -> Result<()> {
    info!(persona = args.persona.as_str(), model = %args.model, "consulting expert");
    let answer = ask_expert(
        args.api_key.as_deref(),
        args.persona,
        &args.question,
        &args.model,
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "{}", answer.trim_end())?;
    output.flush()?;
    Ok(())
}
