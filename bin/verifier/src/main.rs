use std::{fs::File, io::BufReader, path::Path};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use mpt_verify::{
    eip1186::ProofBundle,
    hash::{Keccak, NodeHasher},
    proof::{DisplayProof, SingleProofPath},
    utils::{hex_decode, hex_decode_32},
};

use crate::cli::{AppArgs, Command, KeyKind};

mod cli;

/// Verifies a Merkle Patricia Trie proof.
///
/// Either a single key/value against a root, or a whole eth_getProof response
/// (account and storage) against a state root.
fn main() -> Result<()> {
    env_logger::init();

    let args = AppArgs::parse();

    match args.command {
        Command::Single {
            root,
            key,
            key_kind,
            value,
            proof,
        } => verify_single(&root, &key, key_kind, value.as_deref(), &proof),
        Command::Eip1186 { file } => verify_bundle(&file),
    }
}

fn verify_single(
    root: &str,
    key: &str,
    key_kind: KeyKind,
    value: Option<&str>,
    proof: &[String],
) -> Result<()> {
    let root = hex_decode_32(root).context("Root must be 32 bytes of hex")?;
    let key = hex_decode(key).context("Key must be hex")?;
    let path = match key_kind {
        KeyKind::Raw => key,
        KeyKind::Hashed => Keccak.hash(&key).to_vec(),
    };
    let claimed_value = value
        .map(hex_decode)
        .transpose()
        .context("Value must be hex")?;
    let proof = proof
        .iter()
        .map(hex_decode)
        .collect::<Result<Vec<Vec<u8>>, _>>()
        .context("Proof nodes must be hex")?;

    let single = SingleProofPath {
        proof,
        root,
        path,
        claimed_value,
    };
    match single.verify() {
        Ok(verified) => {
            info!("Proof verified for {} nodes", single.proof.len());
            println!("Valid proof ({verified:?})");
            Ok(())
        }
        Err(failure) => {
            error!(
                "Proof failed ({:?}): {}",
                failure.kind(),
                DisplayProof::init(&single.proof)
            );
            bail!("Invalid proof: {failure}")
        }
    }
}

fn verify_bundle(file: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Could not open {}", file.display()))?,
    );
    let bundle = ProofBundle::from_reader(reader).context("Could not parse proof bundle")?;

    match bundle.verify() {
        Ok(verified) => {
            info!(
                "Account {:?} with {} storage proofs verified",
                bundle.proof.address,
                verified.storage.len()
            );
            println!(
                "Valid proof (account {:?}, storage {:?})",
                verified.account, verified.storage
            );
            Ok(())
        }
        Err(e) => {
            error!("Proof bundle failed: {e}");
            bail!("Invalid proof: {e}")
        }
    }
}
