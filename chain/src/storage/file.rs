//! Directory-backed block store.
//!
//! Every sealed block is written to its own file named
//! `{index}_{previous_hash}_{hash}` whose content is the block's text
//! wire serialization. A directory is loadable only when exactly one
//! file name starts with `0_`, i.e. it holds a single genesis block.
//!
//! Roots of pruned branches are appended, one hash per line, to the
//! [`PRUNED_ROOTS_FILE`] in the same directory.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::consensus::store::BlockStore;
use crate::storage::StorageError;
use crate::types::{Block, BlockHash, ParseError, WireFormat};

/// Name of the pruned-roots log inside the block directory.
pub const PRUNED_ROOTS_FILE: &str = "pruned_roots";

/// Configuration for [`FileBlockStore`].
#[derive(Clone, Debug)]
pub struct FileStoreConfig {
    /// Directory holding one file per block.
    pub dir: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/blocks"),
        }
    }
}

/// One-file-per-block implementation of [`BlockStore`].
pub struct FileBlockStore {
    dir: PathBuf,
    wire: WireFormat,
}

impl FileBlockStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(cfg: &FileStoreConfig, wire: WireFormat) -> Result<Self, StorageError> {
        fs::create_dir_all(&cfg.dir)?;
        Ok(Self {
            dir: cfg.dir.clone(),
            wire,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(block: &Block) -> Option<String> {
        let hash = block.hash?;
        Some(format!(
            "{}_{}_{}",
            block.header.index, block.header.previous_hash, hash
        ))
    }

    /// Index encoded in a block file name, if the name is well formed.
    fn index_of(name: &str) -> Option<u64> {
        let mut parts = name.splitn(3, '_');
        let index = parts.next()?.parse().ok()?;
        parts.next()?;
        parts.next()?;
        Some(index)
    }

    fn block_files(&self) -> Result<Vec<(u64, PathBuf)>, StorageError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name == PRUNED_ROOTS_FILE {
                continue;
            }
            let Some(index) = name.to_str().and_then(Self::index_of) else {
                tracing::warn!(file = ?name, "skipping unrecognised file in block directory");
                continue;
            };
            files.push((index, entry.path()));
        }
        files.sort();
        Ok(files)
    }
}

impl BlockStore for FileBlockStore {
    fn put_block(&mut self, block: &Block) -> Result<(), StorageError> {
        let name = Self::file_name(block).ok_or(StorageError::Unsealed(block.header.index))?;
        let path = self.dir.join(&name);
        fs::write(&path, block.serialize(&self.wire))?;
        tracing::debug!(file = %name, "persisted block");
        Ok(())
    }

    fn load_blocks(&self) -> Result<Option<Vec<Block>>, StorageError> {
        let files = self.block_files()?;
        let genesis_files = files.iter().filter(|(index, _)| *index == 0).count();
        if genesis_files != 1 {
            tracing::info!(
                dir = %self.dir.display(),
                genesis_files,
                "block directory does not hold a single genesis; not loading"
            );
            return Ok(None);
        }

        let mut blocks = Vec::with_capacity(files.len());
        for (_, path) in files {
            let data = fs::read_to_string(&path)?;
            let block = Block::deserialize(&data, &self.wire).map_err(|source| {
                StorageError::Corrupted {
                    file: path.display().to_string(),
                    source,
                }
            })?;
            tracing::debug!(file = %path.display(), "loaded block from disk");
            blocks.push(block);
        }
        Ok(Some(blocks))
    }

    fn put_pruned_root(&mut self, root: &BlockHash) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(PRUNED_ROOTS_FILE))?;
        writeln!(file, "{root}")?;
        tracing::debug!(%root, "recorded pruned branch");
        Ok(())
    }

    fn load_pruned_roots(&self) -> Result<Vec<BlockHash>, StorageError> {
        let path = self.dir.join(PRUNED_ROOTS_FILE);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        data.lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.parse().map_err(|source: ParseError| StorageError::Corrupted {
                    file: path.display().to_string(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use tempfile::TempDir;

    fn dummy_store(tmp: &TempDir) -> FileBlockStore {
        let cfg = FileStoreConfig {
            dir: tmp.path().join("blocks"),
        };
        FileBlockStore::open(&cfg, WireFormat::default()).expect("open store")
    }

    fn dummy_blocks() -> Vec<Block> {
        let fmt = WireFormat::default();
        let kp = Keypair::from_seed(&[2; 32]);
        let genesis = Block::genesis(&kp, "0.0.1", 1_700_000_000, &fmt);
        let mut next = Block::successor_of(&genesis, "0.0.1", kp.public_key().clone(), 1_700_000_005)
            .expect("sealed parent");
        next.sign(&kp, &fmt).expect("sign");
        next.update_hash(&fmt).expect("seal");
        vec![genesis, next]
    }

    #[test]
    fn file_store_roundtrip_in_index_order() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = dummy_store(&tmp);
        let blocks = dummy_blocks();
        store.put_block(&blocks[1]).expect("put child");
        store.put_block(&blocks[0]).expect("put genesis");

        let loaded = store.load_blocks().expect("load").expect("loadable");
        assert_eq!(loaded, blocks);
        assert_eq!(loaded[1].transactions, blocks[1].transactions);
    }

    #[test]
    fn files_are_named_after_index_parent_and_hash() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = dummy_store(&tmp);
        let blocks = dummy_blocks();
        store.put_block(&blocks[1]).expect("put");

        let expected = format!(
            "1_{}_{}",
            blocks[0].hash.expect("sealed"),
            blocks[1].hash.expect("sealed")
        );
        assert!(store.dir().join(expected).is_file());
    }

    #[test]
    fn directory_without_unique_genesis_is_not_loaded() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = dummy_store(&tmp);
        assert!(store.load_blocks().expect("load").is_none());

        let blocks = dummy_blocks();
        store.put_block(&blocks[0]).expect("put genesis");
        let other = Block::genesis(&Keypair::from_seed(&[3; 32]), "0.0.1", 1, &WireFormat::default());
        store.put_block(&other).expect("put second genesis");
        assert!(store.load_blocks().expect("load").is_none());
    }

    #[test]
    fn corrupted_block_file_is_an_error() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = dummy_store(&tmp);
        store.put_block(&dummy_blocks()[0]).expect("put genesis");
        fs::write(store.dir().join("1_aa_bb"), "garbage").expect("write junk");

        let err = store.load_blocks().unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { .. }));
    }

    #[test]
    fn pruned_roots_are_appended_and_skipped_when_loading_blocks() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = dummy_store(&tmp);
        assert!(store.load_pruned_roots().expect("no log yet").is_empty());

        let blocks = dummy_blocks();
        for block in &blocks {
            store.put_block(block).expect("put");
        }
        let root = blocks[1].hash.expect("sealed");
        store.put_pruned_root(&root).expect("record root");
        store.put_pruned_root(&root).expect("record root again");

        assert_eq!(store.load_pruned_roots().expect("load roots"), vec![root, root]);
        assert_eq!(store.load_blocks().expect("load").expect("loadable"), blocks);
    }
}
