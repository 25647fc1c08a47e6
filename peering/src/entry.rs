//! The append-only bootstrap address book.
//!
//! Each address is one framed bincode record: a 4-byte big-endian length
//! followed by the encoded string, appended as peers are recorded.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use rand::seq::SliceRandom;

use crate::PeeringError;

/// Record one bootstrap address.
pub fn append_entry_addr(path: &Path, addr: &str) -> Result<(), PeeringError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    let payload = bincode::serialize(&addr.to_string())?;
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read every recorded bootstrap address in order.
pub fn read_entry_addrs(path: &Path) -> Result<Vec<String>, PeeringError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut addrs = Vec::new();
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let mut body = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        reader.read_exact(&mut body)?;
        addrs.push(bincode::deserialize(&body)?);
    }
    Ok(addrs)
}

/// Pick a uniformly random recorded address.
pub fn random_entry_addr(path: &Path) -> Result<String, PeeringError> {
    let addrs = read_entry_addrs(path)?;
    addrs
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or(PeeringError::NoEntryAddrs)
}
