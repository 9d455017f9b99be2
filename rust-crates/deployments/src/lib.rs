use anyhow::{
    Context,
    Result,
    anyhow,
};
use chrono::Utc;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const LOCAL_CHAIN_ID: u64 = 31_337;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Sepolia,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Sepolia => "sepolia",
            DeploymentEnv::Local => "local",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Sepolia => "Sepolia",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub network_url: String,
    #[serde(default)]
    pub deployer: Option<String>,
    #[serde(default)]
    pub deployment_block: Option<u64>,
}

impl DeploymentRecord {
    pub fn new(
        contract_address: impl Into<String>,
        chain_id: u64,
        network_url: impl Into<String>,
    ) -> Self {
        Self {
            deployed_at: Utc::now().to_rfc3339(),
            contract_address: contract_address.into(),
            chain_id,
            network_url: network_url.into(),
            deployer: None,
            deployment_block: None,
        }
    }

    pub fn is_on_chain(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        Self::with_root(DEPLOYMENTS_ROOT, env)
    }

    pub fn with_root(root: impl AsRef<Path>, env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(root.as_ref(), env)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        read_record(&self.path)
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        write_record(&self.path, record)
    }
}

pub fn ensure_structure(root: impl AsRef<Path>) -> Result<()> {
    for env in [DeploymentEnv::Sepolia, DeploymentEnv::Local] {
        let _ = ensure_store(root.as_ref(), env)?;
    }
    Ok(())
}

fn ensure_store(root: &Path, env: DeploymentEnv) -> Result<PathBuf> {
    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).with_context(|| {
            format!(
                "Failed to create deployments directory for {} at {}",
                env,
                env_dir.display()
            )
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        fs::write(&file_path, b"").with_context(|| {
            format!(
                "Failed to create deployment record file for {} at {:?}",
                env, file_path
            )
        })?;
    }

    Ok(file_path)
}

fn read_record(path: impl AsRef<Path>) -> Result<Option<DeploymentRecord>> {
    let data = fs::read(path.as_ref()).context("Failed to read deployment records")?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<DeploymentRecord>(&data)
        .map(Some)
        .map_err(|e| anyhow!("Failed to parse deployment record JSON: {e}"))
}

fn write_record(path: impl AsRef<Path>, record: &DeploymentRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)
        .context("Failed to serialize deployment record")?;
    fs::write(path.as_ref(), json).context("Failed to write deployment record")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn load__fresh_store__returns_none() {
        // given
        let root = tempfile::tempdir().unwrap();
        let store = DeploymentStore::with_root(root.path(), DeploymentEnv::Sepolia).unwrap();

        // when
        let record = store.load().unwrap();

        // then
        assert!(record.is_none());
        assert!(store.path().ends_with("sepolia/deployments.json"));
    }

    #[test]
    fn save__then_load__returns_saved_record() {
        // given
        let root = tempfile::tempdir().unwrap();
        let store = DeploymentStore::with_root(root.path(), DeploymentEnv::Local).unwrap();
        let mut record = DeploymentRecord::new(
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            LOCAL_CHAIN_ID,
            "http://127.0.0.1:8545",
        );
        record.deployment_block = Some(1);

        // when
        store.save(&record).unwrap();
        let loaded = store.load().unwrap();

        // then
        assert_eq!(Some(record), loaded);
    }

    #[test]
    fn load__garbage_file__errors() {
        // given
        let root = tempfile::tempdir().unwrap();
        let store = DeploymentStore::with_root(root.path(), DeploymentEnv::Sepolia).unwrap();
        fs::write(store.path(), b"not json").unwrap();

        // when
        let result = store.load();

        // then
        assert!(result.is_err());
    }

    #[test]
    fn ensure_structure__creates_every_environment() {
        let root = tempfile::tempdir().unwrap();

        ensure_structure(root.path()).unwrap();

        assert!(root.path().join("sepolia/deployments.json").exists());
        assert!(root.path().join("local/deployments.json").exists());
    }
}
