//! algebox CLI - Run interpreter code through the sandbox from the shell
//!
//! Operator tool: exercises the same executor the HTTP daemon uses, without
//! the HTTP layer in the way.

use algebox_core::{DeliveryMode, LimitProfile, SandboxConfig, executor, probe};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "algebox")]
#[command(author, version, about = "Sandboxed execution for the algebra interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute interpreter code under resource limits
    Run {
        /// Code to execute (or - for stdin)
        code: String,

        /// Interpreter binary (resolved via PATH if bare)
        #[arg(short, long, default_value = "M2")]
        interpreter: PathBuf,

        /// Limit profile: conservative or relaxed
        #[arg(short, long, default_value = "conservative", value_parser = parse_profile)]
        profile: LimitProfile,

        /// Deliver the code as a script file instead of via stdin
        #[arg(long)]
        script_file: bool,

        /// Wall-clock timeout override in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Check interpreter availability and version
    Probe {
        /// Interpreter binary (resolved via PATH if bare)
        #[arg(short, long, default_value = "M2")]
        interpreter: PathBuf,
    },
}

fn parse_profile(s: &str) -> Result<LimitProfile, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("algebox=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            code,
            interpreter,
            profile,
            script_file,
            timeout,
        } => {
            let code = if code == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                code
            };

            let mut builder = SandboxConfig::builder()
                .interpreter_path(interpreter)
                .profile(profile);
            if script_file {
                builder = builder.delivery(DeliveryMode::ScriptFile);
            }
            if let Some(secs) = timeout {
                builder = builder.wall_clock_timeout(std::time::Duration::from_secs(secs));
            }
            let config = builder.build();

            let result = executor::execute(&code, &config).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }

        Commands::Probe { interpreter } => {
            let status = probe::probe(&interpreter).await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.available {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
