use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use vibetrie::crypto::hash::sha256;
use vibetrie::storage::{KVStore, KVStoreError, MemoryStore, RocksDBStore};
use vibetrie::trie::{MerklePatriciaTrie, Node, TrieError, MAX_INLINE_VALUE_LEN};

fn memory_trie() -> (MerklePatriciaTrie, Arc<MemoryStore>, Arc<MemoryStore>) {
    let nodes = Arc::new(MemoryStore::new());
    let values = Arc::new(MemoryStore::new());
    let trie = MerklePatriciaTrie::new(nodes.clone(), values.clone());
    (trie, nodes, values)
}

/// Store whose writes start failing once armed and a write budget is spent
struct FailingStore {
    inner: MemoryStore,
    armed: AtomicBool,
    writes_left: AtomicUsize,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
            writes_left: AtomicUsize::new(0),
        }
    }

    fn fail_after(&self, writes: usize) {
        self.writes_left.store(writes, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl KVStore for FailingStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        if self.armed.load(Ordering::SeqCst) {
            let allowed = self.writes_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(KVStoreError::RocksDBError("disk full".to_string()));
            }
        }
        self.inner.put(key, value)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError> {
        self.inner.delete(key)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.inner.exists(key)
    }

    fn flush(&self) -> Result<(), KVStoreError> {
        self.inner.flush()
    }
}

fn random_entries(rng: &mut StdRng, count: usize) -> HashMap<Vec<u8>, Vec<u8>> {
    let mut entries = HashMap::new();
    while entries.len() < count {
        let key_len = rng.gen_range(1..6);
        let key: Vec<u8> = (0..key_len).map(|_| rng.gen()).collect();
        let value_len = rng.gen_range(1..80);
        let value: Vec<u8> = (0..value_len).map(|_| rng.gen()).collect();
        entries.insert(key, value);
    }
    entries
}

#[test]
fn test_rocksdb_round_trip() {
    let temp_dir = tempdir().unwrap();
    let nodes = Arc::new(RocksDBStore::new(&temp_dir.path().join("nodes")).unwrap());
    let values = Arc::new(RocksDBStore::new(&temp_dir.path().join("values")).unwrap());
    let mut trie = MerklePatriciaTrie::new(nodes, values);

    let mut rng = StdRng::seed_from_u64(7);
    let entries = random_entries(&mut rng, 300);

    for (key, value) in &entries {
        trie.put(key, value).unwrap();
    }

    for (key, value) in &entries {
        assert_eq!(trie.get(key).unwrap().as_ref(), Some(value), "key {}", hex::encode(key));
    }
    trie.validate().unwrap();
}

#[test]
fn test_reopen_from_root() {
    let temp_dir = tempdir().unwrap();
    let node_path = temp_dir.path().join("nodes");
    let value_path = temp_dir.path().join("values");

    let root = {
        let nodes = Arc::new(RocksDBStore::new(&node_path).unwrap());
        let values = Arc::new(RocksDBStore::new(&value_path).unwrap());
        let mut trie = MerklePatriciaTrie::new(nodes, values);
        trie.put(b"alpha", b"1").unwrap();
        trie.put(b"beta", &[2u8; 64]).unwrap();
        trie.flush().unwrap();
        trie.root_hash().unwrap()
    };

    let nodes = Arc::new(RocksDBStore::new(&node_path).unwrap());
    let values = Arc::new(RocksDBStore::new(&value_path).unwrap());
    let trie = MerklePatriciaTrie::open(nodes.clone(), values.clone(), root).unwrap();

    assert_eq!(trie.root_hash(), Some(root));
    assert_eq!(trie.get(b"alpha").unwrap(), Some(b"1".to_vec()));
    assert_eq!(trie.get(b"beta").unwrap(), Some(vec![2u8; 64]));

    let missing = MerklePatriciaTrie::open(nodes, values, [0u8; 32]);
    assert!(matches!(missing, Err(TrieError::MissingNode(_))));
}

#[test]
fn test_put_is_idempotent() {
    let mut trie = MerklePatriciaTrie::in_memory();
    trie.put(b"key", b"value").unwrap();
    trie.put(b"other", &[9u8; 100]).unwrap();
    let root = trie.root_hash();

    trie.put(b"key", b"value").unwrap();
    assert_eq!(trie.root_hash(), root);

    trie.put(b"other", &[9u8; 100]).unwrap();
    assert_eq!(trie.root_hash(), root);
}

#[test]
fn test_inline_and_indirect_boundary() {
    let (mut trie, _nodes, values) = memory_trie();

    let inline = vec![0x11u8; MAX_INLINE_VALUE_LEN];
    trie.put(b"inline", &inline).unwrap();
    assert!(values.is_empty());
    assert_eq!(trie.lookup(b"inline").unwrap().stored, Some(inline.clone()));

    let indirect = vec![0x22u8; MAX_INLINE_VALUE_LEN + 1];
    trie.put(b"indirect", &indirect).unwrap();
    let reference = sha256(&indirect);
    assert_eq!(values.len(), 1);
    assert_eq!(values.get(&reference).unwrap(), Some(indirect.clone()));

    let lookup = trie.lookup(b"indirect").unwrap();
    assert_eq!(lookup.stored, Some(reference.to_vec()));
    assert_eq!(lookup.value, Some(indirect));
    assert_eq!(trie.get(b"inline").unwrap(), Some(inline));
}

#[test]
fn test_missing_indirect_value_falls_back_to_reference() {
    let (mut trie, _nodes, values) = memory_trie();

    let long = vec![0x33u8; 50];
    trie.put(b"long", &long).unwrap();

    let reference = sha256(&long);
    values.delete(&reference).unwrap();

    assert_eq!(trie.get(b"long").unwrap(), Some(reference.to_vec()));
}

#[test]
fn test_update_in_place() {
    let mut trie = MerklePatriciaTrie::in_memory();
    trie.put(b"k", b"v1").unwrap();
    trie.put(b"k2", b"other").unwrap();
    let before = trie.root_hash();

    trie.put(b"k", b"v2").unwrap();
    assert_ne!(trie.root_hash(), before);
    assert_eq!(trie.get(b"k").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(trie.get(b"k2").unwrap(), Some(b"other".to_vec()));

    // Short to long and back
    trie.put(b"k", &[5u8; 40]).unwrap();
    assert_eq!(trie.get(b"k").unwrap(), Some(vec![5u8; 40]));
    trie.put(b"k", b"v3").unwrap();
    assert_eq!(trie.get(b"k").unwrap(), Some(b"v3".to_vec()));
    assert_eq!(trie.get(b"k2").unwrap(), Some(b"other".to_vec()));
}

#[test]
fn test_divergence_split() {
    let mut trie = MerklePatriciaTrie::in_memory();
    // Nibbles a b 0 1 and a b 0 2 share a prefix of three
    trie.put(&[0xab, 0x01], b"first").unwrap();
    trie.put(&[0xab, 0x02], b"second").unwrap();

    let lookup = trie.lookup(&[0xab, 0x01]).unwrap();
    let entries = lookup.path.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].node.path(), Some(&[0xa, 0xb, 0x0][..]));

    let branch = &entries[1];
    assert_eq!(branch.pos, 3);
    let slots: Vec<_> = branch.node.child_refs().into_iter().map(|(nibble, _)| nibble).collect();
    assert_eq!(slots, vec![Some(1), Some(2)]);

    assert_eq!(trie.get(&[0xab, 0x01]).unwrap(), Some(b"first".to_vec()));
    assert_eq!(trie.get(&[0xab, 0x02]).unwrap(), Some(b"second".to_vec()));
}

#[test]
fn test_divergence_at_first_nibble() {
    let mut trie = MerklePatriciaTrie::in_memory();
    trie.put(&[0x10], b"a").unwrap();
    trie.put(&[0x20], b"b").unwrap();

    match trie.root_node().unwrap().unwrap() {
        Node::Branch(branch) => {
            assert!(branch.child(1).is_some());
            assert!(branch.child(2).is_some());
            assert_eq!(branch.value(), None);
        },
        other => panic!("expected branch root, got {:?}", other),
    }
}

#[test]
fn test_rejects_empty_key_or_value() {
    let mut trie = MerklePatriciaTrie::in_memory();
    assert!(matches!(trie.put(b"k", b""), Err(TrieError::InvalidUserData)));
    assert!(matches!(trie.put(b"", b"v"), Err(TrieError::InvalidUserData)));
    assert_eq!(trie.root_hash(), None);

    trie.put(b"k", b"v").unwrap();
    let root = trie.root_hash();
    assert!(matches!(trie.put(b"k", b""), Err(TrieError::InvalidUserData)));
    assert!(matches!(trie.put(b"", b"v"), Err(TrieError::InvalidUserData)));
    assert_eq!(trie.root_hash(), root);
}

#[test]
fn test_absent_keys() {
    let mut trie = MerklePatriciaTrie::in_memory();
    assert_eq!(trie.get(b"nothing").unwrap(), None);
    assert_eq!(trie.get(b"").unwrap(), None);

    trie.put(b"apple", b"1").unwrap();
    trie.put(b"application", b"2").unwrap();
    trie.put(b"banana", b"3").unwrap();

    assert_eq!(trie.get(b"app").unwrap(), None);
    assert_eq!(trie.get(b"apples").unwrap(), None);
    assert_eq!(trie.get(b"cherry").unwrap(), None);
    assert_eq!(trie.get(b"apple").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_root_independent_of_insertion_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let entries: Vec<_> = random_entries(&mut rng, 120).into_iter().collect();

    let mut first = MerklePatriciaTrie::in_memory();
    for (key, value) in &entries {
        first.put(key, value).unwrap();
    }

    let mut shuffled = entries.clone();
    shuffled.shuffle(&mut rng);
    let mut second = MerklePatriciaTrie::in_memory();
    for (key, value) in &shuffled {
        second.put(key, value).unwrap();
    }

    assert_eq!(first.root_hash(), second.root_hash());
}

#[test]
fn test_failed_node_read_leaves_root_intact() {
    let (mut trie, nodes, _values) = memory_trie();
    trie.put(&[0x12], b"a").unwrap();
    trie.put(&[0x13], b"b").unwrap();
    let root = trie.root_hash();

    // Drop the branch below the root extension
    let branch = match trie.root_node().unwrap().unwrap() {
        Node::Extension(ext) => *ext.child().unwrap(),
        other => panic!("expected extension root, got {:?}", other),
    };
    nodes.delete(&branch).unwrap();

    assert!(matches!(trie.get(&[0x12]), Err(TrieError::MissingNode(_))));
    assert!(matches!(trie.put(&[0x14], b"c"), Err(TrieError::MissingNode(_))));
    assert_eq!(trie.root_hash(), root);
    assert!(trie.validate().is_err());
}

#[test]
fn test_dump_lists_every_node() {
    let mut trie = MerklePatriciaTrie::in_memory();
    assert_eq!(trie.dump().unwrap(), "<empty>\n");

    trie.put(&[0xab, 0x01], b"x").unwrap();
    trie.put(&[0xab, 0x02], b"y").unwrap();

    let dump = trie.dump().unwrap();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("extension "));
    assert!(lines[0].ends_with("path=ab0"));
    assert!(lines[1].trim_start().starts_with("branch "));
    assert!(lines[2].trim_start().starts_with("[1] leaf "));
    assert!(lines[3].ends_with(&format!("value={}", hex::encode(b"y"))));
}

#[test]
fn test_failed_node_write_leaves_root_intact() {
    let nodes = Arc::new(FailingStore::new());
    let mut trie = MerklePatriciaTrie::new(nodes.clone(), Arc::new(MemoryStore::new()));
    trie.put(&[0x12], b"a").unwrap();
    trie.put(&[0x13], b"b").unwrap();
    let root = trie.root_hash();
    let stored = nodes.inner.len();

    // The new leaf is written, then the rewritten branch fails
    nodes.fail_after(1);
    let result = trie.put(&[0x14], b"c");
    assert!(matches!(result, Err(TrieError::Store(KVStoreError::RocksDBError(_)))));
    assert_eq!(nodes.inner.len(), stored + 1);

    assert_eq!(trie.root_hash(), root);
    assert_eq!(trie.get(&[0x12]).unwrap(), Some(b"a".to_vec()));
    assert_eq!(trie.get(&[0x13]).unwrap(), Some(b"b".to_vec()));
    assert_eq!(trie.get(&[0x14]).unwrap(), None);
    trie.validate().unwrap();
}

#[test]
fn test_failed_value_write_is_reported() {
    let values = Arc::new(FailingStore::new());
    let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryStore::new()), values.clone());
    trie.put(b"short", b"v").unwrap();
    let root = trie.root_hash();

    values.fail_after(0);
    let result = trie.put(b"long", &[7u8; 64]);
    assert!(matches!(result, Err(TrieError::Store(_))));
    assert_eq!(trie.root_hash(), root);
    assert_eq!(trie.get(b"long").unwrap(), None);
}
