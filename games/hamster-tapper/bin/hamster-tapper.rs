use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_logic::{setup_logger, ProxyManager, RetryConfig, Worker, WorkerRunner};
use dotenv::dotenv;
use hamster_tapper::proxy_check::{probe_proxy, PROBE_URL};
use hamster_tapper::{AccountStore, HttpGameApi, Tapper, TapperConfig};
use std::env;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    #[arg(short, long, default_value = "config/accounts.toml")]
    accounts: String,

    #[arg(long, default_value = "config/proxies.txt")]
    proxies: String,

    /// Connect directly, ignoring every configured proxy
    #[arg(long, default_value = "false")]
    no_proxy: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run all accounts until Ctrl+C
    Run,
    /// Print the configured accounts
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Keep guard alive for file logging
    let _log_guard = setup_logger("hamster-tapper");

    let config = TapperConfig::from_path(&args.config).context("Failed to load config")?;
    let mut store = AccountStore::from_path(&args.accounts).context("Failed to load accounts")?;

    if args.no_proxy {
        store.clear_proxies();
    } else if config.use_proxy_from_file {
        let pool = ProxyManager::load_proxies_from(&args.proxies)?;
        store.assign_proxies(&pool);
    }

    match args.command.unwrap_or(Commands::Run) {
        Commands::List => {
            println!("Configured accounts:");
            for (i, account) in store.iter().enumerate() {
                let proxy = account
                    .proxy
                    .as_ref()
                    .map(|p| p.redacted())
                    .unwrap_or_else(|| "direct".to_string());
                println!("  {}: {} ({})", i + 1, account.name, proxy);
            }
            Ok(())
        }
        Commands::Run => run(config, store).await,
    }
}

async fn run(config: TapperConfig, store: AccountStore) -> Result<()> {
    if store.is_empty() {
        warn!(target: "task_result", "No accounts configured, nothing to do");
        return Ok(());
    }

    let probe_url = env::var("PROXY_PROBE_URL").unwrap_or_else(|_| PROBE_URL.to_string());
    let probe_retry = RetryConfig::new(2, 1000);
    let config = Arc::new(config);
    let mut workers: Vec<Box<dyn Worker>> = Vec::with_capacity(store.len());

    for account in store.into_accounts() {
        if let Some(proxy) = &account.proxy {
            if let Err(e) = probe_proxy(proxy, &probe_url, probe_retry).await {
                error!(target: "task_result", "{} | Skipping account: {:#}", account.name, e);
                continue;
            }
            info!("{} | Proxy {} reachable", account.name, proxy.redacted());
        }

        let api = HttpGameApi::new(
            account.name.clone(),
            &config,
            account.init_data.clone(),
            account.proxy.clone(),
        );
        workers.push(Box::new(Tapper::new(
            account.name.clone(),
            config.clone(),
            api,
        )));
    }

    if workers.is_empty() {
        warn!(target: "task_result", "Every account was skipped");
        return Ok(());
    }

    WorkerRunner::run_workers(workers).await?;
    Ok(())
}
