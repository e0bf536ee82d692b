//! Loads the subset of the key store layout the daemon itself needs at startup. The full
//! per-account-keyed directory scan (`<base58 pubkey>.json` for every price account) is the
//! admin tool's job and stays out of scope here; this only loads the daemon's own three files.

use std::path::Path;

use anyhow::{Context as _, Result};
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};

use crate::keypair_ext::read_keypair_file;

pub struct Keystore {
    pub publish_key: Keypair,
    pub mapping_key: Option<Keypair>,
    pub program_key: Pubkey,
}

impl Keystore {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let publish_key = read_keypair_file(dir.join("publish_key_pair.json"))
            .context("loading publish_key_pair.json")?;

        let mapping_key_path = dir.join("mapping_key_pair.json");
        let mapping_key = mapping_key_path
            .exists()
            .then(|| read_keypair_file(&mapping_key_path))
            .transpose()
            .context("loading mapping_key_pair.json")?;

        let program_key = read_pubkey_file(dir.join("program_key.json"))
            .context("loading program_key.json")?;

        Ok(Self {
            publish_key,
            mapping_key,
            program_key,
        })
    }

    pub fn publish_pubkey(&self) -> Pubkey {
        self.publish_key.pubkey()
    }
}

/// `program_key.json` names an on-chain program, not a signing key: a plain 32-byte JSON array,
/// same raw-byte-array convention as the key-pair files but half the length.
fn read_pubkey_file(path: impl AsRef<Path>) -> Result<Pubkey> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.to_string_lossy()))?;
    let bytes: Vec<u8> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {} as a JSON byte array", path.to_string_lossy()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("expected 32 bytes, got {}", bytes.len()))?;
    Ok(Pubkey::new_from_array(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_program_key_file_of_the_wrong_length() {
        let dir = tempfile_dir();
        std::fs::write(dir.join("program_key.json"), "[1,2,3]").unwrap();
        assert!(read_pubkey_file(dir.join("program_key.json")).is_err());
    }

    #[test]
    fn reads_a_well_formed_program_key_file() {
        let dir = tempfile_dir();
        let pubkey = Pubkey::new_unique();
        std::fs::write(
            dir.join("program_key.json"),
            serde_json::to_string(&pubkey.to_bytes().to_vec()).unwrap(),
        )
        .unwrap();

        let read = read_pubkey_file(dir.join("program_key.json")).unwrap();
        assert_eq!(read, pubkey);
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pyth-publisher-daemon-keystore-test-{:?}",
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
