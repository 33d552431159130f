use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mylist_exporter::app::AppContext;
use mylist_exporter::cli::commands::{self, EditOp, ExportRequest};
use mylist_exporter::cli::{Cli, Commands};
use mylist_exporter::config::Config;
use mylist_exporter::export::RenderSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let progress = commands::progress_printer(cli.quiet);

    match cli.command {
        Commands::Export {
            user,
            name,
            formats,
            covers,
            out,
            open,
        } => {
            let open_after = open || config.output.open_after_export;
            let out_dir = out.unwrap_or_else(|| config.output.dir.clone());
            let ctx = AppContext::new(config)?;
            let request = ExportRequest {
                user_id: user,
                display_name: name,
                formats: formats.selected(),
                covers,
                out_dir,
            };
            let written = commands::export(&ctx, &request, &progress).await?;
            print_written(&written);
            if open_after {
                open_first(&written)?;
            }
        }
        Commands::Render {
            input,
            formats,
            out,
        } => {
            let out_dir = out.unwrap_or_else(|| config.output.dir.clone());
            let settings = render_settings(&config)?;
            let written = commands::render(
                &input,
                &formats.selected(),
                &out_dir,
                &settings,
                &progress,
            )?;
            print_written(&written);
        }
        Commands::Edit { file, action } => {
            let settings = render_settings(&config)?;
            let message = commands::edit(&file, EditOp::from(action), &settings)?;
            println!("{}", message);
        }
    }

    Ok(())
}

fn render_settings(config: &Config) -> anyhow::Result<RenderSettings> {
    RenderSettings::from_config(config)
        .with_context(|| format!("Invalid origin or PDF font (origin {})", config.source.origin))
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

fn open_first(paths: &[PathBuf]) -> anyhow::Result<()> {
    if let Some(first) = paths.first() {
        open::that(first).with_context(|| format!("Failed to open {}", first.display()))?;
    }
    Ok(())
}
