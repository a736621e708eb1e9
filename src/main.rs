use std::fs;

use anyhow::{Context, Result};
use clap::Parser;

use oj_harness::config::{CliArgs, Config};
use oj_harness::orchestrator::Orchestrator;
use oj_harness::sandbox::create_sandbox_client;
use oj_harness::web_server::build_server;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();

    let Config {
        server: server_config,
        sandbox: sandbox_config,
        languages,
        problems,
    } = cli.to_config().context("Failed to load configuration")?;

    log::info!(
        "Loaded {} problems and {} languages",
        problems.len(),
        languages.len()
    );

    let client = create_sandbox_client(&sandbox_config)?;
    let orchestrator = Orchestrator::new(problems, languages, client);

    if let Some(problem_id) = &cli.problem {
        return run_once(&cli, problem_id, &orchestrator).await;
    }

    let server = build_server(server_config, orchestrator).context("Failed to build server")?;
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
    }

    server_handle.stop(true).await;

    log::info!("Shutdown complete");
    Ok(())
}

/// Judges a single file and prints the result, or the generated program with `--emit-harness`
async fn run_once(cli: &CliArgs, problem_id: &str, orchestrator: &Orchestrator) -> Result<()> {
    let (Some(language), Some(source_path)) = (cli.language, &cli.source) else {
        anyhow::bail!("--problem needs both --language and --source");
    };
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read {}", source_path.display()))?;

    if cli.emit_harness {
        let generated = orchestrator.generate(&source, problem_id, language)?;
        print!("{}", generated.content);
        return Ok(());
    }

    let result = orchestrator.submit(&source, problem_id, language).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
