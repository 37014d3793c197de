//! IKMS v0.3 - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use ikms::{
    app::AppContext,
    cli::{Args, Commands, Settings, Verbosity},
    doctor::Doctor,
    telemetry::TelemetryDisplay,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

/// Initialize logging; RUST_LOG wins over the verbosity flags
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

async fn run_ask(
    ctx: &AppContext,
    verbosity: Verbosity,
    question: &str,
    show_context: bool,
    show_plan: bool,
    json: bool,
) -> Result<()> {
    let pipeline = ctx.pipeline();

    let pb = if verbosity.show_progress() && !json {
        Some(spinner("Planning, retrieving, summarizing, verifying...")?)
    } else {
        None
    };

    let result = pipeline.run(question).await;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let state = result.context("Question answering failed")?;
    let response = state.to_response()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if show_plan {
        println!("{}", "Plan".cyan().bold());
        println!("{}\n", state.plan().unwrap_or(""));
        println!("{}", "Sub-questions".cyan().bold());
        for q in state.sub_questions().unwrap_or(&[]) {
            println!("  • {}", q);
        }
        println!();
    }

    if show_context {
        println!("{}", "Context".cyan().bold());
        println!("{}\n", response.context);
    }

    if !verbosity.show_progress() {
        println!("{}", response.answer);
    } else {
        println!("{}", "Answer".green().bold());
        println!("{}", response.answer);
    }

    TelemetryDisplay::new(ctx.telemetry().clone(), verbosity).display_summary();
    Ok(())
}

async fn run_serve(ctx: &AppContext, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = ctx.settings().clone();
    settings.override_server(host, port);

    ikms::server::serve(ctx.pipeline(), &settings.server_addr())
        .await
        .context("HTTP server failed")
}

async fn run_doctor(ctx: &AppContext) -> Result<()> {
    let chat = ctx.chat_client();
    let retriever = ctx.retriever();
    let doctor = Doctor::new(&chat, &retriever);

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(settings: &Settings, args: &Args) -> Result<()> {
    println!("\n{}\n", "IKMS Configuration".bold());

    match (&args.config, Settings::default_path()) {
        (Some(path), _) => println!("# Source: {}", path.display()),
        (None, Some(path)) if path.exists() => println!("# Source: {}", path.display()),
        _ => println!("# Source: built-in defaults"),
    }
    println!("# Verbosity: {}\n", args.verbosity().as_str());

    let mut shown = settings.clone();
    if shown.qdrant.api_key.is_some() {
        shown.qdrant.api_key = Some("********".to_string());
    }
    println!("{}", shown.to_toml_string()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();
    init_logging(verbosity);

    let settings = Settings::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Commands::Config = &args.command {
        return show_config(&settings, &args);
    }

    let ctx = AppContext::new(settings).context("Failed to initialize backends")?;

    match &args.command {
        Commands::Ask {
            question,
            show_context,
            show_plan,
            json,
        } => run_ask(&ctx, verbosity, question, *show_context, *show_plan, *json).await,
        Commands::Serve { host, port } => run_serve(&ctx, host.clone(), *port).await,
        Commands::Doctor => run_doctor(&ctx).await,
        Commands::Config => Ok(()),
    }
}
