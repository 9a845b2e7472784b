//! Persistent storage of per-transcript position indexes.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crc::{Crc, CRC_32_ISO_HDLC};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::strip_version;
use super::TripletPositionIndex;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Key-value store of position indexes, keyed by version-less transcript id.
///
/// Readers may share a store; building (and thus `put`) for the same
/// transcript must not happen concurrently.
pub trait IndexStore {
    fn get(&self, transcript: &str) -> Result<Option<TripletPositionIndex>>;

    fn put(&mut self, transcript: &str, index: &TripletPositionIndex) -> Result<()>;
}

/// Serialize a value and prefix it with the CRC-32 of the payload.
pub fn encode_framed<T: Serialize>(x: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(x)?;
    let mut bytes = Vec::with_capacity(payload.len() + 4);
    bytes.extend_from_slice(&CRC32.checksum(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Verify and deserialize a value written by [`encode_framed`].
/// `name` identifies the object in the error message.
pub fn decode_framed<T: DeserializeOwned>(bytes: &[u8], name: &str) -> Result<T> {
    if bytes.len() < 4 {
        return Err(Error::CorruptIndex(name.to_owned()));
    }
    let (head, payload) = bytes.split_at(4);
    let expected = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
    verify(expected, payload, name)?;
    Ok(bincode::deserialize(payload)?)
}

fn verify(expected: u32, payload: &[u8], name: &str) -> Result<()> {
    if CRC32.checksum(payload) == expected {
        Ok(())
    } else {
        Err(Error::CorruptIndex(name.to_owned()))
    }
}

/// One file per transcript, `<dir>/<transcript>.idx`.
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open a store directory, creating it if necessary.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<DirStore> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(DirStore { dir: dir.as_ref().to_owned() })
    }

    fn path(&self, transcript: &str) -> PathBuf {
        self.dir.join(format!("{}.idx", strip_version(transcript)))
    }
}

impl IndexStore for DirStore {
    fn get(&self, transcript: &str) -> Result<Option<TripletPositionIndex>> {
        let path = self.path(transcript);
        let mut f = match fs::File::open(&path) {
            Ok(f) => f,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        f.read_to_end(&mut bytes)?;
        decode_framed(&bytes, transcript).map(Some)
    }

    fn put(&mut self, transcript: &str, index: &TripletPositionIndex) -> Result<()> {
        let path = self.path(transcript);
        debug!("writing position index {:?}", path);
        let bytes = encode_framed(index)?;
        // write to a sibling file first so a reader never sees a partial index
        let tmp = path.with_extension("idx.tmp");
        fs::File::create(&tmp)?.write_all(&bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// All indexes of a database folder in a single SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SqliteStore> {
        SqliteStore::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<SqliteStore> {
        SqliteStore::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<SqliteStore> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS position_index (
                transcript TEXT PRIMARY KEY,
                checksum   INTEGER NOT NULL,
                payload    BLOB NOT NULL
            )",
        )?;
        Ok(SqliteStore { conn })
    }
}

impl IndexStore for SqliteStore {
    fn get(&self, transcript: &str) -> Result<Option<TripletPositionIndex>> {
        let row: Option<(i64, Vec<u8>)> = self.conn
            .query_row(
                "SELECT checksum, payload FROM position_index WHERE transcript = ?1",
                params![strip_version(transcript)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((checksum, payload)) => {
                verify(checksum as u32, &payload, transcript)?;
                Ok(Some(bincode::deserialize(&payload)?))
            },
            None => Ok(None),
        }
    }

    fn put(&mut self, transcript: &str, index: &TripletPositionIndex) -> Result<()> {
        let payload = bincode::serialize(index)?;
        let checksum = CRC32.checksum(&payload) as i64;
        self.conn.execute(
            "INSERT OR REPLACE INTO position_index (transcript, checksum, payload) VALUES (?1, ?2, ?3)",
            params![strip_version(transcript), checksum, payload],
        )?;
        Ok(())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: HashMap<String, TripletPositionIndex>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl IndexStore for MemoryStore {
    fn get(&self, transcript: &str) -> Result<Option<TripletPositionIndex>> {
        Ok(self.inner.get(strip_version(transcript)).cloned())
    }

    fn put(&mut self, transcript: &str, index: &TripletPositionIndex) -> Result<()> {
        self.inner.insert(strip_version(transcript).to_owned(), index.clone());
        Ok(())
    }
}

/// Read-through cache so that each index is loaded at most once per run.
pub struct IndexCache<'a, S: IndexStore + ?Sized> {
    store: &'a S,
    cache: HashMap<String, TripletPositionIndex>,
}

impl<'a, S: IndexStore + ?Sized> IndexCache<'a, S> {
    pub fn new(store: &'a S) -> IndexCache<'a, S> {
        IndexCache { store, cache: HashMap::new() }
    }

    pub fn get(&mut self, transcript: &str) -> Result<&TripletPositionIndex> {
        if !self.cache.contains_key(transcript) {
            let index = self.store.get(transcript)?
                .ok_or_else(|| Error::MissingIndex(transcript.to_owned()))?;
            self.cache.insert(transcript.to_owned(), index);
        }
        Ok(&self.cache[transcript])
    }
}
