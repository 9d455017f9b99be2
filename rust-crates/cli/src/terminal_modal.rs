use std::{
    sync::{
        Arc,
        Mutex,
        PoisonError,
    },
    time::Duration,
};
use tokio::io::{
    AsyncBufReadExt,
    AsyncWriteExt,
    BufReader,
};
use tracing::{
    debug,
    info,
};
use typing_stats_connector::{
    Error,
    JsonRpcBridge,
    ModalConfig,
    Result,
    WalletDescriptor,
    WalletModal,
};

/// Wallet picker for the terminal. Opening it lists the configured wallets on stdout and
/// reads the choice from stdin, unless a wallet was picked up front with `--wallet`.
pub struct TerminalModal {
    preselected: Option<String>,
    poll_interval: Duration,
    bridge: Mutex<Option<Arc<JsonRpcBridge>>>,
}

impl TerminalModal {
    pub fn new(preselected: Option<String>, poll_interval: Duration) -> Self {
        Self {
            preselected,
            poll_interval,
            bridge: Mutex::new(None),
        }
    }

    fn current(&self) -> Option<Arc<JsonRpcBridge>> {
        self.bridge
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, wallet: &WalletDescriptor) -> Result<()> {
        if self
            .current()
            .is_some_and(|bridge| bridge.endpoint() == wallet.endpoint)
        {
            debug!(wallet = %wallet.name, "keeping the existing wallet bridge");
            return Ok(());
        }
        let bridge = JsonRpcBridge::spawn(wallet.endpoint.clone(), self.poll_interval)?;
        *self.bridge.lock().unwrap_or_else(PoisonError::into_inner) = Some(bridge);
        info!(wallet = %wallet.name, endpoint = %wallet.endpoint, "wallet bridge ready");
        Ok(())
    }

    async fn prompt(config: &ModalConfig) -> Result<Option<WalletDescriptor>> {
        let mut menu = String::from("Select a wallet:\n");
        for (index, wallet) in config.wallets().iter().enumerate() {
            menu.push_str(&format!(
                "  {}) {} ({})\n",
                index + 1,
                wallet.name,
                wallet.endpoint
            ));
        }
        menu.push_str("Number or name, empty to cancel: ");

        let mut stdout = tokio::io::stdout();
        stdout.write_all(menu.as_bytes()).await.map_err(prompt_error)?;
        stdout.flush().await.map_err(prompt_error)?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(prompt_error)?;
        Ok(choose_wallet(config.wallets(), &line).cloned())
    }
}

fn prompt_error(error: std::io::Error) -> Error {
    Error::Transport(format!("wallet prompt failed: {error}"))
}

/// Resolves a typed choice to a wallet: a 1-based position or a wallet name. Blank input
/// or `q` dismisses the picker.
pub fn choose_wallet<'a>(
    wallets: &'a [WalletDescriptor],
    input: &str,
) -> Option<&'a WalletDescriptor> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("q") {
        return None;
    }
    if let Ok(position) = input.parse::<usize>() {
        return position.checked_sub(1).and_then(|index| wallets.get(index));
    }
    wallets
        .iter()
        .find(|wallet| wallet.name.eq_ignore_ascii_case(input))
}

impl WalletModal for TerminalModal {
    type Bridge = JsonRpcBridge;

    async fn configure(&self, config: &ModalConfig) -> Result<()> {
        for wallet in config.wallets() {
            reqwest::Url::parse(&wallet.endpoint).map_err(|e| {
                Error::Initialization(format!(
                    "wallet '{}' has an invalid endpoint '{}': {e}",
                    wallet.name, wallet.endpoint
                ))
            })?;
        }
        if let Some(name) = &self.preselected
            && config.find_wallet(name).is_none()
        {
            return Err(Error::Initialization(format!(
                "wallet '{name}' is not configured"
            )));
        }
        debug!(wallets = config.wallets().len(), "terminal wallet modal configured");
        Ok(())
    }

    async fn open(&self, config: &ModalConfig) -> Result<()> {
        let chosen = match &self.preselected {
            Some(name) => config.find_wallet(name).cloned(),
            None => Self::prompt(config).await?,
        };
        match chosen {
            Some(wallet) => self.install(&wallet),
            None => {
                info!("wallet selection dismissed");
                Ok(())
            }
        }
    }

    fn bridge(&self) -> Option<Arc<JsonRpcBridge>> {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use typing_stats_connector::NetworkIdentity;

    fn wallets() -> Vec<WalletDescriptor> {
        vec![
            WalletDescriptor::new("frame", "http://127.0.0.1:1248"),
            WalletDescriptor::new("anvil", "http://127.0.0.1:8545"),
        ]
    }

    #[test]
    fn choose_wallet__position_or_name__picks_wallet() {
        let wallets = wallets();

        assert_eq!(Some("frame"), choose_wallet(&wallets, "1\n").map(|w| w.name.as_str()));
        assert_eq!(Some("anvil"), choose_wallet(&wallets, " Anvil ").map(|w| w.name.as_str()));
    }

    #[test]
    fn choose_wallet__blank_or_out_of_range__dismisses() {
        let wallets = wallets();

        assert!(choose_wallet(&wallets, "\n").is_none());
        assert!(choose_wallet(&wallets, "q").is_none());
        assert!(choose_wallet(&wallets, "0").is_none());
        assert!(choose_wallet(&wallets, "3").is_none());
        assert!(choose_wallet(&wallets, "metamask").is_none());
    }

    #[test]
    fn prompt_error__closed_stdin__is_transport_failure() {
        let error = prompt_error(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));

        assert!(matches!(error, Error::Transport(_)));
    }

    #[tokio::test]
    async fn open__preselected_wallet__installs_bridge_once() {
        // given
        let config = ModalConfig::new("project", NetworkIdentity::SEPOLIA, wallets()).unwrap();
        let modal = TerminalModal::new(Some("anvil".to_string()), Duration::from_millis(50));
        modal.configure(&config).await.unwrap();

        // when
        modal.open(&config).await.unwrap();
        let first = modal.bridge().unwrap();
        modal.open(&config).await.unwrap();
        let second = modal.bridge().unwrap();

        // then
        assert_eq!("http://127.0.0.1:8545", first.endpoint());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn configure__unknown_preselected_wallet__fails() {
        let config = ModalConfig::new("project", NetworkIdentity::SEPOLIA, wallets()).unwrap();
        let modal = TerminalModal::new(Some("metamask".to_string()), Duration::from_millis(50));

        let result = modal.configure(&config).await;

        assert!(matches!(result, Err(Error::Initialization(_))));
    }

    #[tokio::test]
    async fn configure__malformed_endpoint__fails() {
        let config = ModalConfig::new(
            "project",
            NetworkIdentity::SEPOLIA,
            vec![WalletDescriptor::new("broken", "not a url")],
        )
        .unwrap();
        let modal = TerminalModal::new(None, Duration::from_millis(50));

        let result = modal.configure(&config).await;

        assert!(matches!(result, Err(Error::Initialization(_))));
    }
}
