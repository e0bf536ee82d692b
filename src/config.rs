//! Daemon configuration: defaults mirror the original admin tool's `args.rs`, but the shape
//! here is a `serde`-deserializable struct loaded from YAML, since it's owned for the whole
//! run rather than parsed once per subcommand invocation.

use std::path::PathBuf;

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentLevel;

fn default_rpc_host() -> String {
    "localhost".to_owned()
}

fn default_tx_host() -> String {
    "localhost".to_owned()
}

fn default_publish_interval_ms() -> u64 {
    293
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    #[serde(default = "default_tx_host")]
    pub tx_host: String,

    /// `0` disables the local JSON-RPC/WebSocket listener.
    #[serde(default)]
    pub listen_port: u16,

    #[serde(default = "default_commitment")]
    pub commitment: CommitmentLevel,

    #[serde(default)]
    pub do_capture: bool,

    #[serde(default)]
    pub capture_file: Option<PathBuf>,

    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,

    #[serde(default = "default_do_tx")]
    pub do_tx: bool,

    /// Out of scope: the HTTP static-file surface. Accepted and validated, never served from.
    #[serde(default)]
    pub content_dir: Option<PathBuf>,

    pub key_store_dir: PathBuf,

    pub program_key: solana_sdk::pubkey::Pubkey,

    pub mapping_key: Option<solana_sdk::pubkey::Pubkey>,

    /// If the configured mapping account doesn't exist yet on startup, drive `init_mapping` to
    /// create it rather than waiting on a subscription that will never fire. Requires
    /// `mapping_key_pair.json` in the key store.
    #[serde(default)]
    pub init_mapping_if_missing: bool,
}

fn default_commitment() -> CommitmentLevel {
    CommitmentLevel::Confirmed
}

fn default_do_tx() -> bool {
    true
}

impl Config {
    pub fn from_yaml_str(input: &str) -> Result<Self, crate::error::CoreError> {
        serde_yaml::from_str(input)
            .map_err(|err| crate::error::CoreError::config(format!("invalid config: {err}")))
    }

    pub fn rpc_http_url(&self) -> String {
        format!("http://{}:8899", self.rpc_host)
    }

    pub fn rpc_ws_url(&self) -> String {
        format!("ws://{}:8900", self.rpc_host)
    }

    /// The host the publish transport sends transactions to, separate from `rpc_host`'s read
    /// path — typically a node closer to the current leader.
    pub fn tx_http_url(&self) -> String {
        format!("http://{}:8899", self.tx_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults_for_missing_fields() {
        let yaml = format!(
            "key_store_dir: /keys\nprogram_key: {}\n",
            solana_sdk::pubkey::Pubkey::new_unique()
        );
        let config = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.rpc_host, "localhost");
        assert_eq!(config.publish_interval_ms, 293);
        assert!(config.do_tx);
        assert_eq!(config.listen_port, 0);
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(Config::from_yaml_str("not: [valid").is_err());
    }
}
