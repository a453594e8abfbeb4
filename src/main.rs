use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use structopt::StructOpt;

use vibetrie::config::Config;
use vibetrie::crypto::hash::hash_from_slice;
use vibetrie::storage::{KVStore, RocksDBStore};
use vibetrie::{init_logger_with_level, MerklePatriciaTrie};

/// Node-store key holding the root hash between runs. Node keys are always
/// 32-byte hashes, so it cannot collide with a node.
const ROOT_KEY: &[u8] = b"meta:root";

#[derive(Debug, StructOpt)]
#[structopt(name = "vibetrie", about = "Authenticated key-value store on a Merkle Patricia Trie")]
struct Opt {
    /// Config file
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Read keys and values as hex and print values as hex
    #[structopt(long)]
    hex: bool,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Insert or update a value
    Put { key: String, value: String },

    /// Look up a value
    Get { key: String },

    /// Print the current root hash
    Root,

    /// Check the structure of the whole trie
    Validate,

    /// Print every node of the trie
    Dump,

    /// Write a default configuration file
    InitConfig {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
}

fn main() {
    let opt = Opt::from_args();

    let config = match &opt.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: failed to load {:?}: {}", path, e);
                std::process::exit(1);
            },
        },
        None => Config::default(),
    };

    init_logger_with_level(&config.log_level);

    if let Err(e) = run(opt, config) {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt, config: Config) -> Result<(), Box<dyn Error>> {
    if let Command::InitConfig { path } = &opt.cmd {
        Config::generate_default(path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let storage = &config.storage;
    let nodes = Arc::new(open_store(&storage.node_db_path, &config)?);
    let values = Arc::new(open_store(&storage.value_db_path, &config)?);

    let mut trie = match nodes.get(ROOT_KEY)? {
        Some(bytes) => {
            let root = hash_from_slice(&bytes).ok_or("corrupt root record in node store")?;
            MerklePatriciaTrie::open(nodes.clone(), values.clone(), root)?
        },
        None => MerklePatriciaTrie::new(nodes.clone(), values.clone()),
    };

    match opt.cmd {
        Command::Put { key, value } => {
            trie.put(&decode_arg(&key, opt.hex)?, &decode_arg(&value, opt.hex)?)?;
            if let Some(root) = trie.root_hash() {
                nodes.put(ROOT_KEY, &root)?;
                println!("{}", hex::encode(root));
            }
            trie.flush()?;
        },
        Command::Get { key } => match trie.get(&decode_arg(&key, opt.hex)?)? {
            Some(value) if opt.hex => println!("{}", hex::encode(value)),
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(not found)"),
        },
        Command::Root => match trie.root_hash() {
            Some(root) => println!("{}", hex::encode(root)),
            None => println!("(empty)"),
        },
        Command::Validate => {
            trie.validate()?;
            println!("ok");
        },
        Command::Dump => print!("{}", trie.dump()?),
        Command::InitConfig { .. } => {},
    }

    Ok(())
}

fn open_store(path: &str, config: &Config) -> Result<RocksDBStore, Box<dyn Error>> {
    let path = Path::new(path);
    info!("Opening store at {:?}", path);
    Ok(RocksDBStore::with_config(path, &config.storage)?)
}

fn decode_arg(arg: &str, is_hex: bool) -> Result<Vec<u8>, Box<dyn Error>> {
    if is_hex {
        Ok(hex::decode(arg)?)
    } else {
        Ok(arg.as_bytes().to_vec())
    }
}
