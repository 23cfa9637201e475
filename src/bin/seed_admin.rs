//! Admin account bootstrap utility.
//!
//! Creates (or refuses to overwrite) the named admin account in the
//! identity database, hashing the password with Argon2id before it is
//! stored.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin seed_admin -- --db <path> --username <name>
//! ```
//!
//! The password is read from the file named by
//! `RAPIDCARE_ADMIN_PASSWORD_FILE`, or, in debug builds only, from the
//! `RAPIDCARE_ADMIN_PASSWORD` environment variable. It is never
//! printed and never stored in plaintext.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zeroize::Zeroizing;

use rapidcare_identity::adapters::sanitize::SanitizingMakeWriter;
use rapidcare_identity::adapters::sqlite::SqliteIdentityStore;
use rapidcare_identity::domain::{credential, AdminAccount};
use rapidcare_identity::ports::IdentityStore;

const USAGE: &str =
    "Usage: seed_admin --db <path> --username <name>  (RAPIDCARE_DB may supply the path)";

fn read_password() -> Result<Zeroizing<String>> {
    if let Ok(path) = std::env::var("RAPIDCARE_ADMIN_PASSWORD_FILE") {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read password file {path:?}"))?;
        return Ok(Zeroizing::new(contents.trim_end().to_string()));
    }
    // Env-var passwords leak via /proc; debug builds only.
    if cfg!(debug_assertions) {
        if let Ok(password) = std::env::var("RAPIDCARE_ADMIN_PASSWORD") {
            return Ok(Zeroizing::new(password));
        }
    }
    bail!("No password supplied. Set RAPIDCARE_ADMIN_PASSWORD_FILE.")
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(std::io::stdout)),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut db_path: Option<std::path::PathBuf> = None;
    let mut username: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let p = args.next().unwrap_or_default();
                if p.is_empty() {
                    eprintln!("{USAGE}");
                    std::process::exit(2);
                }
                db_path = Some(std::path::PathBuf::from(p));
            }
            "--username" => {
                let u = args.next().unwrap_or_default();
                if u.is_empty() {
                    eprintln!("{USAGE}");
                    std::process::exit(2);
                }
                username = Some(u);
            }
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nCreates the admin account in the identity database. The password is read from the file named by RAPIDCARE_ADMIN_PASSWORD_FILE (or RAPIDCARE_ADMIN_PASSWORD in debug builds) and stored as an Argon2id hash."
                );
                return Ok(());
            }
            _ => {
                eprintln!("Unknown arg: {arg}\n{USAGE}");
                std::process::exit(2);
            }
        }
    }

    let db_path = db_path.or_else(|| std::env::var("RAPIDCARE_DB").ok().map(Into::into));
    let (Some(db_path), Some(username)) = (db_path, username) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let password = read_password()?;
    if password.len() < 8 {
        bail!("Password must be at least 8 characters.");
    }

    let store = SqliteIdentityStore::open(&db_path)
        .with_context(|| format!("Failed to open database {db_path:?}"))?;

    if store.find_admin(&username)?.is_some() {
        bail!("Admin {username:?} already exists; refusing to overwrite.");
    }

    let password_hash = credential::hash_password(&password).context("Failed to hash password")?;

    store.insert_admin(&AdminAccount {
        username: username.clone(),
        password_hash,
        created_at: Utc::now(),
    })?;

    tracing::info!("Created admin account in {db_path:?}");
    Ok(())
}
