//! Verifies an EIP-1186 style proof
//!
//! An eth_getProof response holds an account proof against the state root and
//! storage proofs against the storage hash of that account.
use std::io::Read;

use ethers::{
    types::{Bytes, EIP1186ProofResponse, StorageProof, H256, U256, U64},
    utils::keccak256,
};
use log::debug;
use rlp_derive::{RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    hash::{Digest, EMPTY_TRIE_ROOT, KECCAK_EMPTY},
    proof::{verify_proof as verify_trie_proof, FailureKind, ProofFailure, Verified},
    utils::hex_encode,
};

/// The value stored in the state trie for an address.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, RlpEncodable, RlpDecodable)]
pub struct Account {
    pub nonce: U64,
    pub balance: U256,
    pub storage_hash: H256,
    pub code_hash: H256,
}

impl Account {
    /// The empty account as it is encoded when stored in the state trie.
    pub fn empty() -> Self {
        Account {
            storage_hash: H256(EMPTY_TRIE_ROOT),
            code_hash: H256(KECCAK_EMPTY),
            ..Default::default()
        }
    }
    /// An account with no nonce, balance, storage or code. Usually absent from the
    /// state trie, but an empty account may also be stored there.
    ///
    /// Nodes report the hashes of an absent account as either zero or the
    /// hash of empty data.
    pub fn is_empty(&self) -> bool {
        let storage_empty = self.storage_hash.is_zero() || self.storage_hash.0 == EMPTY_TRIE_ROOT;
        let code_empty = self.code_hash.is_zero() || self.code_hash.0 == KECCAK_EMPTY;
        self.nonce.is_zero() && self.balance.is_zero() && storage_empty && code_empty
    }
}

impl From<&EIP1186ProofResponse> for Account {
    fn from(proof: &EIP1186ProofResponse) -> Self {
        Account {
            nonce: proof.nonce,
            balance: proof.balance,
            storage_hash: proof.storage_hash,
            code_hash: proof.code_hash,
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyProofError {
    #[error("Proof not valid for account {account}, AccountError {source} ")]
    AccountError {
        source: AccountError,
        account: String,
    },
    #[error(
        "Proof not valid for account {account} storage key {storage_key}, StorageError {source}"
    )]
    StorageError {
        source: StorageError,
        account: String,
        storage_key: String,
    },
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("ProofFailure {0}")]
    ProofFailure(#[from] ProofFailure),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("ProofFailure {0}")]
    ProofFailure(#[from] ProofFailure),
    #[error("Account has no storage but the value claimed is {0}")]
    ValueInEmptyStorage(U256),
}

/// Outcome of verifying every component of an eth_getProof response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccount {
    pub account: Verified,
    /// One entry per storage proof, in response order.
    pub storage: Vec<Verified>,
}

/// Verifies a single account proof with respect to a state root. The
/// proof is of the form returned by eth_getProof.
///
/// Each storage proof is checked against the storage hash in the response, which is
/// itself proven by the account proof. An absent or empty account has no storage, so
/// its storage values must all be zero and the storage proofs are not walked.
pub fn verify_proof(
    block_state_root: &Digest,
    proof: &EIP1186ProofResponse,
) -> Result<VerifiedAccount, VerifyProofError> {
    let account = verify_account(block_state_root, proof).map_err(|source| {
        VerifyProofError::AccountError {
            source,
            account: hex_encode(proof.address),
        }
    })?;
    let no_storage = account == Verified::Exclusion || Account::from(proof).is_empty();

    let mut storage = Vec::with_capacity(proof.storage_proof.len());
    for storage_proof in &proof.storage_proof {
        let verified = match no_storage {
            true => verify_empty_storage(storage_proof),
            false => verify_storage_proof(&proof.storage_hash.0, storage_proof),
        }
        .map_err(|source| VerifyProofError::StorageError {
            source,
            account: hex_encode(proof.address),
            storage_key: hex_encode(storage_proof.key),
        })?;
        storage.push(verified);
    }
    Ok(VerifiedAccount { account, storage })
}

/// Verifies the account component of an eth_getProof response.
///
/// The trie key is keccak(address) and the claimed value is rlp(account). An empty
/// account is either absent or stored as rlp of the empty account, and both are
/// accepted.
pub fn verify_account(
    block_state_root: &Digest,
    proof: &EIP1186ProofResponse,
) -> Result<Verified, AccountError> {
    let claimed_account = Account::from(proof);
    let key = keccak256(proof.address);
    let verified = match claimed_account.is_empty() {
        false => {
            let claimed_value = rlp::encode(&claimed_account);
            verify_trie_proof(
                block_state_root,
                &key,
                Some(&claimed_value[..]),
                &proof.account_proof,
            )?
        }
        true => match verify_trie_proof(block_state_root, &key, None, &proof.account_proof) {
            Ok(verified) => verified,
            // A value is present at the key, which must then be the empty account.
            Err(failure) if failure.kind() == FailureKind::ValueMismatch => {
                let stored_value = rlp::encode(&Account::empty());
                verify_trie_proof(
                    block_state_root,
                    &key,
                    Some(&stored_value[..]),
                    &proof.account_proof,
                )?
            }
            Err(failure) => return Err(failure.into()),
        },
    };
    debug!(
        "Account {} proof verified ({:?})",
        hex_encode(proof.address),
        verified
    );
    Ok(verified)
}

/// Verifies a single storage proof with respect to a known storage hash.
///
/// The trie key is keccak(slot) and the claimed value is rlp(value). Storage
/// that is zero is not stored, so a zero value is claimed to be absent.
pub fn verify_storage_slot(
    storage_hash: &Digest,
    slot: H256,
    value: U256,
    proof: &[Bytes],
) -> Result<Verified, StorageError> {
    let claimed_value = match value.is_zero() {
        true => None,
        false => Some(rlp::encode(&value).to_vec()),
    };
    let verified = verify_trie_proof(
        storage_hash,
        &keccak256(slot),
        claimed_value.as_deref(),
        proof,
    )?;
    debug!("Storage slot {} proof verified ({:?})", hex_encode(slot), verified);
    Ok(verified)
}

/// Storage of an account that has none. Every slot is absent, which only a zero
/// value may claim.
fn verify_empty_storage(storage_proof: &StorageProof) -> Result<Verified, StorageError> {
    match storage_proof.value.is_zero() {
        true => Ok(Verified::Exclusion),
        false => Err(StorageError::ValueInEmptyStorage(storage_proof.value)),
    }
}

fn verify_storage_proof(
    storage_hash: &Digest,
    storage_proof: &StorageProof,
) -> Result<Verified, StorageError> {
    verify_storage_slot(
        storage_hash,
        storage_proof.key,
        storage_proof.value,
        &storage_proof.proof,
    )
}

/// An eth_getProof response together with the state root it is trusted against.
///
/// ```json
/// { "stateRoot": "0x...", "proof": { "address": "0x...", "accountProof": [...], ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProofBundle {
    #[serde(rename = "stateRoot")]
    pub state_root: H256,
    pub proof: EIP1186ProofResponse,
}

impl ProofBundle {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
    pub fn verify(&self) -> Result<VerifiedAccount, VerifyProofError> {
        verify_proof(&self.state_root.0, &self.proof)
    }
}
