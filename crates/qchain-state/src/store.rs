use std::path::Path;

use primitive_types::U256;
use qchain_core::block::Block;
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::receipt::Receipt;
use qchain_core::types::{Address, Hash};

const META_GENESIS: &str = "genesis";
const META_CURRENT_HEAD: &str = "current-head";

/// Persistent key-value state, backed by sled. Named trees mirror the key
/// namespaces of the persistence layout:
///
///   balance        — addr bytes        → 32-byte big-endian u256
///   nonce          — addr bytes        → 8-byte big-endian u64
///   code           — addr bytes        → raw code bytes
///   codehash       — addr bytes        → 32-byte hash
///   storage        — addr bytes ∥ key  → 32-byte value
///   block          — hash bytes        → bincode(Block)
///   height         — be_u64 bytes      → 32-byte block hash
///   receipts       — block hash bytes  → bincode(Vec<Receipt>)
///   receipt_index  — tx hash bytes     → 32-byte block hash (auxiliary)
///   meta           — utf8 key          → raw bytes (genesis / current-head)
///
/// Cheap to clone: `sled::Db` and `sled::Tree` are themselves reference-counted
/// handles onto the same open database, so cloning shares one handle rather
/// than reopening the on-disk path (which sled locks exclusively per process).
#[derive(Clone)]
pub struct StateStore {
    db: sled::Db,
    balance: sled::Tree,
    nonce: sled::Tree,
    code: sled::Tree,
    codehash: sled::Tree,
    storage: sled::Tree,
    block: sled::Tree,
    height: sled::Tree,
    receipts: sled::Tree,
    receipt_index: sled::Tree,
    meta: sled::Tree,
}

fn storage_error(e: impl std::fmt::Display) -> ChainError {
    ChainError::StorageCorruption(e.to_string())
}

fn ser_error(e: impl std::fmt::Display) -> ChainError {
    ChainError::Serialization(e.to_string())
}

impl StateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> ChainResult<Self> {
        let db = sled::open(path).map_err(storage_error)?;
        let open = |name: &str| -> ChainResult<sled::Tree> { db.open_tree(name).map_err(storage_error) };
        Ok(Self {
            balance: open("balance")?,
            nonce: open("nonce")?,
            code: open("code")?,
            codehash: open("codehash")?,
            storage: open("storage")?,
            block: open("block")?,
            height: open("height")?,
            receipts: open("receipts")?,
            receipt_index: open("receipt_index")?,
            meta: open("meta")?,
            db,
        })
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    pub fn get_balance(&self, addr: &Address) -> ChainResult<U256> {
        match self.balance.get(addr.as_bytes()).map_err(storage_error)? {
            Some(bytes) => Ok(U256::from_big_endian(&bytes)),
            None => Ok(U256::zero()),
        }
    }

    pub fn set_balance(&self, addr: &Address, value: U256) -> ChainResult<()> {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.balance.insert(addr.as_bytes(), &buf).map_err(storage_error)?;
        Ok(())
    }

    pub fn get_nonce(&self, addr: &Address) -> ChainResult<u64> {
        match self.nonce.get(addr.as_bytes()).map_err(storage_error)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_nonce(&self, addr: &Address, value: u64) -> ChainResult<()> {
        self.nonce
            .insert(addr.as_bytes(), &value.to_be_bytes())
            .map_err(storage_error)?;
        Ok(())
    }

    pub fn get_code(&self, addr: &Address) -> ChainResult<Vec<u8>> {
        match self.code.get(addr.as_bytes()).map_err(storage_error)? {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Install contract code. Errors if code is already set — contract
    /// code is immutable after creation.
    pub fn set_code(&self, addr: &Address, code: Vec<u8>) -> ChainResult<()> {
        if self.code.contains_key(addr.as_bytes()).map_err(storage_error)? {
            return Err(ChainError::CodeAlreadyWritten(addr.to_hex()));
        }
        let hash = Hash::keccak256(&code);
        self.code.insert(addr.as_bytes(), code).map_err(storage_error)?;
        self.codehash
            .insert(addr.as_bytes(), hash.as_bytes())
            .map_err(storage_error)?;
        Ok(())
    }

    pub fn get_code_hash(&self, addr: &Address) -> ChainResult<Hash> {
        match self.codehash.get(addr.as_bytes()).map_err(storage_error)? {
            Some(bytes) => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(Hash::from_bytes(arr))
            }
            None => Ok(Hash::ZERO),
        }
    }

    fn storage_key(addr: &Address, key: &Hash) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20 + 32);
        buf.extend_from_slice(addr.as_bytes());
        buf.extend_from_slice(key.as_bytes());
        buf
    }

    pub fn get_storage(&self, addr: &Address, key: &Hash) -> ChainResult<Hash> {
        match self
            .storage
            .get(Self::storage_key(addr, key))
            .map_err(storage_error)?
        {
            Some(bytes) => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(Hash::from_bytes(arr))
            }
            None => Ok(Hash::ZERO),
        }
    }

    pub fn set_storage(&self, addr: &Address, key: &Hash, value: Hash) -> ChainResult<()> {
        self.storage
            .insert(Self::storage_key(addr, key), value.as_bytes())
            .map_err(storage_error)?;
        Ok(())
    }

    pub fn account_exists(&self, addr: &Address) -> ChainResult<bool> {
        Ok(self.nonce.contains_key(addr.as_bytes()).map_err(storage_error)?
            || self.balance.contains_key(addr.as_bytes()).map_err(storage_error)?
            || self.code.contains_key(addr.as_bytes()).map_err(storage_error)?)
    }

    pub fn is_empty(&self, addr: &Address) -> ChainResult<bool> {
        Ok(self.get_balance(addr)?.is_zero()
            && self.get_nonce(addr)? == 0
            && self.get_code(addr)?.is_empty())
    }

    // ── Blocks / receipts / head ─────────────────────────────────────────────

    pub fn put_block(&self, block: &Block) -> ChainResult<()> {
        let hash = block.hash();
        let bytes = bincode::serialize(block).map_err(ser_error)?;
        self.block.insert(hash.as_bytes(), bytes).map_err(storage_error)?;
        self.height
            .insert(block.header.number.to_be_bytes(), hash.as_bytes())
            .map_err(storage_error)?;
        Ok(())
    }

    pub fn get_block_by_hash(&self, hash: &Hash) -> ChainResult<Option<Block>> {
        match self.block.get(hash.as_bytes()).map_err(storage_error)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_error)?)),
            None => Ok(None),
        }
    }

    pub fn get_block_by_number(&self, number: u64) -> ChainResult<Option<Block>> {
        match self.height.get(number.to_be_bytes()).map_err(storage_error)? {
            Some(hash_bytes) => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&hash_bytes);
                self.get_block_by_hash(&Hash::from_bytes(arr))
            }
            None => Ok(None),
        }
    }

    pub fn put_receipts(&self, block_hash: &Hash, receipts: &[Receipt]) -> ChainResult<()> {
        let bytes = bincode::serialize(receipts).map_err(ser_error)?;
        self.receipts
            .insert(block_hash.as_bytes(), bytes)
            .map_err(storage_error)?;
        for receipt in receipts {
            self.receipt_index
                .insert(receipt.tx_hash.as_bytes(), block_hash.as_bytes())
                .map_err(storage_error)?;
        }
        Ok(())
    }

    pub fn get_receipts(&self, block_hash: &Hash) -> ChainResult<Vec<Receipt>> {
        match self.receipts.get(block_hash.as_bytes()).map_err(storage_error)? {
            Some(bytes) => bincode::deserialize(&bytes).map_err(ser_error),
            None => Ok(Vec::new()),
        }
    }

    pub fn get_receipt_by_tx_hash(&self, tx_hash: &Hash) -> ChainResult<Option<Receipt>> {
        let block_hash = match self.receipt_index.get(tx_hash.as_bytes()).map_err(storage_error)? {
            Some(bytes) => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Hash::from_bytes(arr)
            }
            None => return Ok(None),
        };
        let receipts = self.get_receipts(&block_hash)?;
        Ok(receipts.into_iter().find(|r| r.tx_hash == *tx_hash))
    }

    pub fn get_genesis_hash(&self) -> ChainResult<Option<Hash>> {
        self.get_meta_hash(META_GENESIS)
    }

    pub fn set_genesis_hash(&self, hash: Hash) -> ChainResult<()> {
        self.put_meta(META_GENESIS, hash.as_bytes())
    }

    pub fn get_current_head(&self) -> ChainResult<Option<Hash>> {
        self.get_meta_hash(META_CURRENT_HEAD)
    }

    pub fn set_current_head(&self, hash: Hash) -> ChainResult<()> {
        self.put_meta(META_CURRENT_HEAD, hash.as_bytes())
    }

    fn get_meta_hash(&self, key: &str) -> ChainResult<Option<Hash>> {
        match self.get_meta(key)? {
            Some(bytes) => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(Some(Hash::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_meta(&self, key: &str, value: &[u8]) -> ChainResult<()> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_error)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> ChainResult<Option<Vec<u8>>> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_error)
    }

    pub fn flush(&self) -> ChainResult<()> {
        self.db.flush().map_err(storage_error)?;
        Ok(())
    }
}
