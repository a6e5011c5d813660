//! Shared embedded PostgreSQL helpers for integration tests.
//!
//! - One cluster per test process, shared through the library's singleton.
//! - A template database per migrations hash, so each test clones a migrated
//!   schema instead of replaying migrations.
//! - Seeding goes through the Diesel adapters so rows satisfy the same
//!   validation as production writes.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use chrono::Utc;
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;
use vetconsult::domain::ports::{AccountRepository, NewAccount};
use vetconsult::domain::{Account, AccountId, MobileNumber, PersonName};
use vetconsult::outbound::persistence::{DbPool, DieselAccountRepository, PoolConfig};

/// Embedded migrations from the backend/migrations directory.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "vetconsult_template";
const PROVISION_RETRIES: usize = 5;
const PROVISION_RETRY_DELAY: Duration = Duration::from_millis(500);

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Keep `PG_PASSWORD` stable so a reused data directory still accepts logins.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster singleton spawns threads.
        unsafe {
            std::env::set_var("PG_PASSWORD", "vetconsult_embedded_test");
        }
    }
}

/// Shared cluster for this test binary, retried on transient failures.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    ensure_stable_password();
    let mut last_error = String::new();
    for attempt in 1..=PROVISION_RETRIES {
        match shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) => last_error = format!("attempt {attempt}/{PROVISION_RETRIES}: {err:?}"),
        }
        std::thread::sleep(PROVISION_RETRY_DELAY);
    }
    Err(last_error)
}

/// Runs all pending Diesel migrations against the given database.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err}"))?;
    Ok(())
}

/// Creates or reuses a template database with the latest migrations applied.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        migrate_schema(&cluster.connection().database_url(&template_name))?;
    }
    Ok(template_name)
}

/// Provisions a temporary database cloned from the migration template.
pub fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::new();
    for attempt in 1..=PROVISION_RETRIES {
        let outcome = ensure_template_database(cluster).and_then(|template| {
            let name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(name.as_str(), template.as_str())
                .map_err(|err| format!("clone template: {err:?}"))
        });
        match outcome {
            Ok(database) => return Ok(database),
            Err(err) => last_error = format!("attempt {attempt}/{PROVISION_RETRIES}: {err}"),
        }
        std::thread::sleep(PROVISION_RETRY_DELAY);
    }
    Err(last_error)
}

/// A migrated temporary database with a pool and a runtime to drive it.
pub struct TestDatabase {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

/// Provision a fresh database and connect a small pool to it.
pub fn test_database() -> Result<TestDatabase, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let config = PoolConfig::new(database.url())
        .with_max_size(8)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(TestDatabase {
        runtime,
        pool,
        _database: database,
    })
}

/// Insert an account with the given mobile number and return its id.
pub fn seed_account(db: &TestDatabase, first: &str, mobile: &str) -> Result<AccountId, String> {
    let id = AccountId::random();
    let account = Account::new(
        id,
        PersonName::new(first, "Tester").map_err(|err| err.to_string())?,
        MobileNumber::new(mobile).map_err(|err| err.to_string())?,
        Utc::now(),
    );
    let repo = DieselAccountRepository::new(db.pool.clone());
    db.runtime
        .block_on(repo.create(&NewAccount {
            account,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
            first_pet: None,
        }))
        .map_err(|err| err.to_string())?;
    Ok(id)
}
