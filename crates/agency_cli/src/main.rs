use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agency_cli::app::{App, Notice, ViewOps};
use agency_cli::render::{render_notice, CLEAR_SCREEN};
use agency_desk::{
    gateways_for, init_logging, Agency, ConversationEngine, DeskConfig, FileTokenStore,
    GatewayKind, MemoryTokenStore, Session, TokenStore,
};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "agency-desk")]
#[command(about = "Chat with the Legal and Design agencies from the terminal", long_about = None)]
struct Cli {
    /// Auth service base URL
    #[arg(long)]
    auth_url: Option<String>,

    /// Pipeline service base URL
    #[arg(long)]
    pipeline_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_sec: Option<u64>,

    /// Agency selected at startup
    #[arg(long)]
    agency: Option<Agency>,

    /// Directory holding the persisted access token
    #[arg(long)]
    token_dir: Option<PathBuf>,

    /// Backend: http or mock
    #[arg(long)]
    gateway: Option<String>,

    /// Keep the access token in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Log filter, e.g. `agency_desk=debug`
    #[arg(long)]
    log: Option<String>,
}

struct StdoutView;

impl ViewOps for StdoutView {
    fn show(&mut self, notice: Notice) {
        println!("{}", render_notice(&notice));
    }

    fn clear_screen(&mut self) {
        print!("{CLEAR_SCREEN}");
        let _ = std::io::stdout().flush();
    }

    fn request_stop(&mut self) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let config = apply_overrides(DeskConfig::from_env(&cwd)?, &cli)?;
    init_logging(cli.log.as_deref().unwrap_or(&config.log_filter));
    info!(gateway = %config.gateway, "starting agency desk");

    let gateways = gateways_for(&config)?;
    let store: Arc<dyn TokenStore> = if cli.ephemeral {
        Arc::new(MemoryTokenStore::new())
    } else {
        Arc::new(FileTokenStore::new(&config.token_dir))
    };

    let mut session = Session::new(gateways.auth.clone(), store);
    session.restore().await;

    let engine = match cli.agency {
        Some(agency) => ConversationEngine::with_agency(gateways.pipeline.clone(), agency),
        None => ConversationEngine::new(gateways.pipeline.clone()),
    };
    let mut app = App::new(session, Arc::new(engine), gateways.pipeline);
    let mut view = StdoutView;
    app.on_start(&mut view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !app.should_exit {
        print!("{}", app.prompt_label());
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        app.on_line(&line, &mut view).await;
    }

    Ok(())
}

fn apply_overrides(mut config: DeskConfig, cli: &Cli) -> Result<DeskConfig> {
    if let Some(url) = &cli.auth_url {
        config = config.with_auth_url(url.clone());
    }
    if let Some(url) = &cli.pipeline_url {
        config = config.with_pipeline_url(url.clone());
    }
    if let Some(seconds) = cli.timeout_sec {
        config = config.with_request_timeout(Duration::from_secs(seconds));
    }
    if let Some(dir) = &cli.token_dir {
        config = config.with_token_dir(dir.clone());
    }
    if let Some(gateway) = &cli.gateway {
        config = config.with_gateway(gateway.parse::<GatewayKind>()?);
    }
    Ok(config)
}
