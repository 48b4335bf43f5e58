//! vaultcrypt CLI — operator tooling for provisioning a keyring
//!
//! Usage:
//!   vaultcrypt setup --root <dir> [--master-key-backend env|file] [--force]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use vaultcrypt::CryptoFacade;
use vaultcrypt_keyring::{
    BlobStore, Connection, EnvFileSource, FileBlobStore, FileSource, Keyring, MasterKeyBundle,
    MasterKeySource,
};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "setup" => cmd_setup(&args[2..]),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" => {
            println!("vaultcrypt {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        cmd => {
            eprintln!("error: unknown command '{}'", cmd);
            print_usage();
            Err("unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"vaultcrypt CLI — keyring provisioning

USAGE:
    vaultcrypt <COMMAND> [OPTIONS]

COMMANDS:
    setup       Provision the five connections and a fresh, sealed keyring

EXAMPLES:
    vaultcrypt setup --root ./data --master-key-backend file

OPTIONS:
    -h, --help       Print help
    -V, --version    Print version
"#
    );
}

fn cmd_setup(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut root = PathBuf::from(".vaultcrypt");
    let mut backend = "file".to_string();
    let mut force = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => {
                i += 1;
                root = PathBuf::from(args.get(i).ok_or("missing --root value")?);
            }
            "--master-key-backend" => {
                i += 1;
                backend = args.get(i).ok_or("missing --master-key-backend value")?.clone();
            }
            "--force" => force = true,
            other => return Err(format!("unknown option: {}", other).into()),
        }
        i += 1;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_setup(root, backend, force))
}

async fn run_setup(root: PathBuf, backend: String, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FileBlobStore::new(&root));
    for conn in [
        Connection::Keyring,
        Connection::Checksum,
        Connection::Environment,
        Connection::MasterKeys,
        Connection::Vault,
    ] {
        store.mkdir(conn)?;
    }

    let master_key_source: Box<dyn MasterKeySource> = match backend.as_str() {
        "env" => Box::new(EnvFileSource::new(root.join(Connection::Environment.as_str()).join(".env"))),
        "file" => Box::new(FileSource::new(root.join(Connection::MasterKeys.as_str()))),
        other => return Err(format!("unknown --master-key-backend: {other}").into()),
    };

    let facade = CryptoFacade::new();

    if !force && master_key_source.is_initialized().await? {
        return Err("master keys already provisioned at this root; pass --force to overwrite".into());
    }

    if force {
        let _ = store.delete(Connection::Keyring, "keyring.json");
        let _ = store.delete(Connection::Checksum, "keyring.sidecar");
    }

    let bundle = MasterKeyBundle::generate(&facade)?;
    master_key_source.store(&facade, &bundle).await?;

    let keyring = Keyring::create(facade, store, bundle).await?;
    eprintln!(
        "provisioned empty keyring at {} ({} entries)",
        root.display(),
        keyring.entry_count().await
    );
    Ok(())
}
