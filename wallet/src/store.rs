//! Framed persistence: one length-prefixed bincode record per file.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ingot_ledger::Transaction;

use crate::{Wallet, WalletError};

#[derive(Serialize, Deserialize)]
struct WalletRecord {
    secret: [u8; 32],
}

/// Write the root wallet's key material.
pub fn save_wallet(path: &Path, wallet: &Wallet) -> Result<(), WalletError> {
    write_record(
        path,
        &WalletRecord {
            secret: wallet.secret_bytes(),
        },
    )
}

/// Read a wallet back from its key material.
pub fn load_wallet(path: &Path) -> Result<Wallet, WalletError> {
    let record: WalletRecord = read_record(path)?;
    Ok(Wallet::from_secret_bytes(&record.secret)?)
}

/// Write the network's root transaction.
pub fn save_transaction(path: &Path, transaction: &Transaction) -> Result<(), WalletError> {
    write_record(path, transaction)
}

/// Read the network's root transaction.
pub fn load_transaction(path: &Path) -> Result<Transaction, WalletError> {
    read_record(path)
}

fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<(), WalletError> {
    let payload = bincode::serialize(value)?;
    let mut file = File::create(path)?;
    file.write_all(&(payload.len() as u32).to_be_bytes())?;
    file.write_all(&payload)?;
    Ok(())
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, WalletError> {
    let mut file = File::open(path)?;
    let mut len_buf = [0u8; 4];
    file.read_exact(&mut len_buf)?;
    let mut body = vec![0u8; u32::from_be_bytes(len_buf) as usize];
    file.read_exact(&mut body)?;
    Ok(bincode::deserialize(&body)?)
}
