use alloy_primitives::Address;
use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use deployments::DeploymentRecord;
use std::{
    str::FromStr,
    time::Duration,
};
use typing_stats::{
    logging,
    sentences,
    settings::{
        self,
        Settings,
    },
    terminal_modal::TerminalModal,
};
use typing_stats_connector::{
    ChainId,
    ConnectionManager,
    ScoreRecord,
    config::parse_contract_address,
};

#[derive(Parser, Debug)]
#[command(
    name = "typing-stats",
    about = "Read and submit typing-test scores on the TypingStats leaderboard",
    version
)]
struct Cli {
    /// Address of the deployed TypingStats contract (defaults to the recorded deployment)
    #[arg(long, global = true, env = "TYPING_STATS_CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// WalletConnect project id, needed for the Sepolia RPC endpoint
    #[arg(
        long,
        global = true,
        env = "TYPING_STATS_PROJECT_ID",
        default_value = settings::DEFAULT_PROJECT_ID
    )]
    project_id: String,

    /// Chain the leaderboard lives on, hex or decimal
    #[arg(long, global = true, env = "TYPING_STATS_CHAIN_ID", default_value = "11155111")]
    chain_id: String,

    /// RPC URL advertised for a local chain
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Wallet endpoints as name=url, comma separated or repeated
    #[arg(
        long = "wallet-url",
        global = true,
        env = "TYPING_STATS_WALLET_URL",
        value_delimiter = ','
    )]
    wallet_urls: Vec<String>,

    /// Wallet to use without prompting
    #[arg(long, global = true)]
    wallet: Option<String>,

    /// Receipt polling interval in milliseconds
    #[arg(long, global = true, default_value_t = 500)]
    poll_interval_ms: u64,

    /// Directory holding deployment records
    #[arg(long, global = true, default_value = deployments::DEPLOYMENTS_ROOT)]
    deployments_dir: String,

    /// Directory for log files
    #[arg(long, global = true, default_value = "~/.typing-stats/logs")]
    log_dir: String,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the leaderboard
    Scores {
        #[arg(long)]
        json: bool,
    },
    /// Show the scores of one player
    PlayerScores {
        player: String,
        #[arg(long)]
        json: bool,
    },
    /// Submit a score and wait for it to be confirmed
    Submit {
        #[arg(long)]
        wpm: u64,
        #[arg(long)]
        accuracy: u64,
        #[arg(long, default_value = "quote")]
        category: String,
    },
    /// Connect a wallet and make sure it is on the required chain
    Network,
    /// Print practice sentences
    Sentence {
        #[arg(long, default_value_t = 1)]
        count: usize,
        #[arg(long)]
        category: Option<String>,
    },
    /// Manage recorded contract deployments
    Deployment {
        #[command(subcommand)]
        action: DeploymentAction,
    },
}

#[derive(Subcommand, Debug)]
enum DeploymentAction {
    /// Record the address of a deployed contract for the selected chain
    Record {
        address: String,
        #[arg(long)]
        deployer: Option<String>,
        #[arg(long)]
        block: Option<u64>,
    },
    /// Show the recorded deployment for the selected chain
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _log_guard = logging::init(&settings::expand_path(&cli.log_dir), cli.verbose)?;
    tracing::info!("starting typing-stats");

    let chain_id = settings::parse_chain_id(&cli.chain_id)?;
    match &cli.command {
        Command::Sentence { count, category } => {
            print_sentences(*count, category.as_deref());
            Ok(())
        }
        Command::Deployment { action } => run_deployment(&cli, chain_id, action),
        command => run_leaderboard(&cli, chain_id, command).await,
    }
}

fn print_sentences(count: usize, category: Option<&str>) {
    let sentences = match category {
        Some(category) => (0..count).map(|_| sentences::for_category(category)).collect(),
        None => sentences::generate(count),
    };
    for sentence in sentences {
        println!("{sentence}");
    }
}

fn run_deployment(cli: &Cli, chain_id: ChainId, action: &DeploymentAction) -> Result<()> {
    let root = settings::expand_path(&cli.deployments_dir);
    let env = settings::deployment_env(chain_id);
    let store = settings::deployment_store(&root, chain_id)?;
    match action {
        DeploymentAction::Record {
            address,
            deployer,
            block,
        } => {
            let address = parse_contract_address(address)?;
            let network = settings::network_for(chain_id, cli.rpc_url.as_deref());
            let mut record = DeploymentRecord::new(
                address.to_checksum(None),
                chain_id.get(),
                network.rpc_url(&cli.project_id),
            );
            record.deployer = deployer.clone();
            record.deployment_block = *block;
            store.save(&record).map_err(|e| eyre!(e))?;
            println!("Recorded {env} deployment at {}", store.path().display());
        }
        DeploymentAction::Show => match store.load().map_err(|e| eyre!(e))? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("No {env} deployment recorded"),
        },
    }
    Ok(())
}

fn resolve_settings(cli: &Cli, chain_id: ChainId) -> Result<Settings> {
    let contract_address = settings::resolve_contract_address(
        cli.contract_address.as_deref(),
        &settings::expand_path(&cli.deployments_dir),
        chain_id,
    )?;
    Ok(Settings {
        contract_address,
        project_id: cli.project_id.clone(),
        network: settings::network_for(chain_id, cli.rpc_url.as_deref()),
        wallets: settings::parse_wallets(&cli.wallet_urls)?,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    })
}

async fn run_leaderboard(cli: &Cli, chain_id: ChainId, command: &Command) -> Result<()> {
    let settings = resolve_settings(cli, chain_id)?;
    let modal = TerminalModal::new(cli.wallet.clone(), settings.poll_interval);
    let manager = ConnectionManager::new(settings.connector_config()?, modal);
    manager
        .initialize()
        .await
        .wrap_err("Failed to initialize the wallet modal")?;

    let outcome = match command {
        Command::Scores { json } => {
            let scores = manager.get_high_scores().await;
            print_scores(&scores, *json)
        }
        Command::PlayerScores { player, json } => {
            let player = Address::from_str(player.trim())
                .map_err(|e| eyre!("Invalid player address '{player}': {e}"))?;
            let scores = manager.get_player_scores(player).await;
            print_scores(&scores, *json)
        }
        Command::Submit {
            wpm,
            accuracy,
            category,
        } => {
            if manager.save_score(*wpm, *accuracy, category.as_str()).await {
                println!("Score saved: {wpm} wpm, {accuracy}% accuracy ({category})");
                Ok(())
            } else {
                Err(eyre!("Score was not saved, see the log for details"))
            }
        }
        Command::Network => {
            manager.connect().await?;
            let status = manager.assure_network().await?;
            println!("Wallet is on {} ({status:?})", settings.network.name);
            Ok(())
        }
        Command::Sentence { .. } | Command::Deployment { .. } => Ok(()),
    };
    manager.close();
    outcome
}

fn print_scores(scores: &[ScoreRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(scores)?);
        return Ok(());
    }
    if scores.is_empty() {
        println!("No scores");
        return Ok(());
    }
    for (rank, score) in scores.iter().enumerate() {
        println!(
            "{:>3}. {:>4} wpm {:>3}%  {:<12} {}  {}",
            rank + 1,
            score.wpm,
            score.accuracy,
            score.category,
            score.player,
            score.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn resolve_settings__only_contract_given__builds_connector_config() {
        // given
        let cli = Cli::try_parse_from([
            "typing-stats",
            "--contract-address",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "--chain-id",
            "31337",
            "scores",
        ])
        .unwrap();
        let chain_id = settings::parse_chain_id(&cli.chain_id).unwrap();

        // when
        let config = resolve_settings(&cli, chain_id)
            .and_then(|settings| settings.connector_config());

        // then
        let config = config.unwrap();
        assert!(!config.modal.project_id().is_empty());
        assert_eq!(chain_id, config.target().chain_id);
    }
}
