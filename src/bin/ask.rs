//! One-shot command line client for the research pipeline
//!
//! Usage: `ask [--context NAME] <question...>`

use research_pipeline::config::Config;
use research_pipeline::pipeline::{ContextHandle, PipelineRequest};
use research_pipeline::state::AppState;
use std::env;

const USAGE: &str = "Usage: ask [--context NAME] <question...>";

/// What the command line asked for
#[derive(Debug)]
enum Command {
    Help,
    Ask(PipelineRequest),
}

/// Parse arguments (without the program name)
///
/// Words that are not flags are joined into the question; blank questions
/// are left for the pipeline to reject.
fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut context = None;
    let mut words = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--context" | "-c" => {
                let name = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--context needs a value\n{}", USAGE))?;
                context = Some(ContextHandle::new(name));
            }
            "--help" | "-h" => return Ok(Command::Help),
            _ => words.push(arg),
        }
    }

    let request = PipelineRequest::new(words.join(" "));
    Ok(Command::Ask(match context {
        Some(context) => request.with_context(context),
        None => request,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let request = match parse_args(env::args().skip(1))? {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Ask(request) => request,
    };

    let config = Config::from_env();
    let state = AppState::from_config(&config).await?;

    let result = state
        .orchestrator
        .run(request)
        .await
        .map_err(|e| anyhow::anyhow!("{}\n{}", e, USAGE))?;

    println!("Route:  {}", result.route);
    println!("Status: {:?}", result.stage_status());
    println!("Time:   {} ms", result.elapsed_ms);
    println!();
    println!("{}", result.summary);

    Ok(())
}
