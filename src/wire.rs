//! Binary transaction builder and Ed25519 signing path.
//!
//! `solana_sdk::transaction::Transaction`'s own message layout already *is* the
//! shortvec-length-prefixed, signature-slots-reserved-ahead-of-signing wire format this
//! component needs to produce; this module adds explicit error returns and a size-bound check
//! on top of it rather than re-deriving the serializer.

use solana_program::instruction::Instruction;
use solana_sdk::{
    hash::Hash,
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

use crate::error::CoreError;

/// Builds and signs a transaction from a fixed instruction set, a payer, and a recent blockhash.
///
/// Returns `CoreError` instead of panicking when the produced message would not fit in a
/// network packet or when a required signer is missing.
pub fn build_and_sign(
    instructions: &[Instruction],
    payer: &Pubkey,
    signers: &[&Keypair],
    recent_blockhash: Hash,
) -> Result<Transaction, CoreError> {
    let message = solana_sdk::message::Message::new(instructions, Some(payer));

    let mut transaction = Transaction::new_unsigned(message);
    transaction
        .try_sign(&signers.to_vec(), recent_blockhash)
        .map_err(|err| CoreError::protocol(format!("sign_failed: {err}")))?;

    let wire_size = bincode::serde::encode_to_vec(&transaction, bincode::config::legacy())
        .map_err(|err| CoreError::protocol(format!("encode_too_large: {err}")))?
        .len();
    if wire_size > PACKET_DATA_SIZE {
        return Err(CoreError::protocol(format!(
            "encode_too_large: {wire_size} bytes exceeds packet limit {PACKET_DATA_SIZE}"
        )));
    }

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::instruction::AccountMeta;

    fn noop_instruction(program_id: Pubkey, account: Pubkey) -> Instruction {
        Instruction {
            program_id,
            accounts: vec![AccountMeta::new(account, true)],
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn builds_a_signed_transaction_with_one_signature() {
        let payer = Keypair::new();
        let instruction = noop_instruction(Pubkey::new_unique(), payer.pubkey());

        let transaction = build_and_sign(
            &[instruction],
            &payer.pubkey(),
            &[&payer],
            Hash::new_unique(),
        )
        .unwrap();

        assert_eq!(transaction.signatures.len(), 1);
        assert!(transaction.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn fails_when_a_required_signer_is_missing() {
        let payer = Keypair::new();
        let other_signer_pubkey = Pubkey::new_unique();
        let instruction = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![
                AccountMeta::new(payer.pubkey(), true),
                AccountMeta::new(other_signer_pubkey, true),
            ],
            data: vec![],
        };

        let result = build_and_sign(
            &[instruction],
            &payer.pubkey(),
            &[&payer],
            Hash::new_unique(),
        );

        assert!(matches!(result, Err(CoreError::Protocol(_))));
    }
}
