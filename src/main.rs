use clap::Parser;
use form_filler::cli::commands::{cmd_chat, cmd_fill, cmd_snapshot, cmd_upload};
use form_filler::cli::config::{Cli, Commands, load_config};
use form_filler::cli::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = load_config(cli.config.as_deref());

    // Resolve service URL: CLI > config > default
    if let Some(url) = cli.service_url {
        config.service.base_url = url;
    }

    match cli.command {
        Commands::Snapshot { page } => {
            cmd_snapshot(&page)?;
        }
        Commands::Fill {
            page,
            comment,
            output,
            reply_timeout_secs,
        } => {
            let report = cmd_fill(
                &page,
                &comment,
                output.as_deref(),
                reply_timeout_secs,
                &config,
                cli.verbose,
            )
            .await?;
            if !report.success {
                std::process::exit(1);
            }
        }
        Commands::Chat { message } => {
            cmd_chat(&message, &config).await?;
        }
        Commands::Upload { files, comment } => {
            cmd_upload(&files, &comment, &config).await?;
        }
    }

    Ok(())
}
