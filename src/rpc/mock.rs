//! In-memory [`HttpTransport`] used by the rest of the crate's test suites, so they don't need a
//! live cluster.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use solana_sdk::{account::Account, hash::Hash, signature::Signature, transaction::Transaction};

use crate::error::CoreError;

use super::http::HttpTransport;

#[derive(Default)]
pub struct MockHttpTransport {
    blockhashes: Mutex<VecDeque<Hash>>,
    accounts: Mutex<std::collections::HashMap<Pubkey, Account>>,
    sent_transactions: Mutex<Vec<Transaction>>,
    fail_send: Mutex<bool>,
}

impl MockHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_blockhash(&self, hash: Hash) {
        self.blockhashes.lock().unwrap().push_back(hash);
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn set_fail_send(&self, fail: bool) {
        *self.fail_send.lock().unwrap() = fail;
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.sent_transactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        _data_len: usize,
    ) -> Result<u64, CoreError> {
        Ok(0)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, CoreError> {
        let mut blockhashes = self.blockhashes.lock().unwrap();
        Ok(blockhashes.pop_front().unwrap_or_default())
    }

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<Account>, CoreError> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, CoreError> {
        if *self.fail_send.lock().unwrap() {
            return Err(CoreError::on_chain_reject("mock send failure"));
        }
        let signature = transaction
            .signatures
            .first()
            .copied()
            .unwrap_or_default();
        self.sent_transactions
            .lock()
            .unwrap()
            .push(transaction.clone());
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_transactions() {
        let mock = MockHttpTransport::new();
        mock.push_blockhash(Hash::new_unique());
        let hash = mock.get_latest_blockhash().await.unwrap();
        assert_ne!(hash, Hash::default());

        let transaction = Transaction::default();
        mock.send_transaction(&transaction).await.unwrap();
        assert_eq!(mock.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn send_can_be_made_to_fail() {
        let mock = MockHttpTransport::new();
        mock.set_fail_send(true);
        let result = mock.send_transaction(&Transaction::default()).await;
        assert!(result.is_err());
    }
}
