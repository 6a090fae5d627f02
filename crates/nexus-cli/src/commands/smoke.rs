//! `nexus-smoke`: write one probe document and check it reads back.

use crate::errors::SmokeError;
use clap::Args;
use nexus_config::Config;
use nexus_logger as logger;
use nexus_memory::{
    ConsistencyProber, HealthRecord, InMemoryStore, ProbeDocument, StoreSettings, VectorStore,
};
use nexus_python::{ChromaStore, Interpreter};
use std::io::{self, Write};
use tracing::debug;

pub const VECTOR_DB_ENV: &str = "NEXUS_VECTOR_DB";
pub const COLLECTION_ENV: &str = "NEXUS_COLLECTION";
pub const TENANT_ENV: &str = "NEXUS_TENANT";
pub const DATABASE_ENV: &str = "NEXUS_DATABASE";

/// Exit status when the check could not run at all
pub const EXIT_SETUP_FAILURE: i32 = 1;

#[derive(Args, Debug, Clone, Default)]
pub struct SmokeArgs {
    /// Probe a process-local store instead of opening the Chroma path
    #[arg(long)]
    pub in_memory: bool,
}

/// Store path and collection read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTarget {
    pub vector_db: String,
    pub collection: String,
    pub tenant: Option<String>,
    pub database: Option<String>,
}

impl SmokeTarget {
    pub fn from_env() -> Result<Self, SmokeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SmokeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        match (read(VECTOR_DB_ENV), read(COLLECTION_ENV)) {
            (Some(vector_db), Some(collection)) => Ok(Self {
                vector_db,
                collection,
                tenant: read(TENANT_ENV),
                database: read(DATABASE_ENV),
            }),
            _ => Err(SmokeError::MissingEnv),
        }
    }

    pub fn settings(&self, config: &Config) -> StoreSettings {
        StoreSettings::new(&self.vector_db)
            .with_tenant(self.tenant.clone().unwrap_or_else(|| config.get_tenant()))
            .with_database(
                self.database
                    .clone()
                    .unwrap_or_else(|| config.get_database()),
            )
    }
}

/// Probe `collection` in `store` and describe the result.
pub fn probe_store<S: VectorStore>(
    store: &S,
    target: &SmokeTarget,
) -> Result<HealthRecord, SmokeError> {
    let collection = store.get_or_create_collection(&target.collection)?;
    let probe = ProbeDocument::generate();
    debug!(doc_id = %probe.doc_id, collection = %target.collection, "probing");
    let result = ConsistencyProber::new(&collection).probe(&probe)?;
    Ok(HealthRecord::new(
        result,
        target.vector_db.clone(),
        target.collection.clone(),
    ))
}

fn run(args: &SmokeArgs, target: &SmokeTarget) -> Result<HealthRecord, SmokeError> {
    if args.in_memory {
        logger::debug("Probing an in-memory store");
        return probe_store(&InMemoryStore::new(), target);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::warn(&format!("Ignoring unreadable config: {}", e));
            Config::default()
        }
    };
    let interpreter = Interpreter::get(&config)?;
    let store = ChromaStore::connect(interpreter, &target.settings(&config))?;
    probe_store(&store, target)
}

/// Write the health record as one JSON line and return its exit code.
pub fn report<W: Write>(record: &HealthRecord, out: &mut W) -> Result<i32, SmokeError> {
    let line = serde_json::to_string(record)?;
    writeln!(out, "{}", line)?;
    Ok(record.exit_code())
}

/// Run the smoke test; returns the process exit code.
pub fn handle_smoke(args: &SmokeArgs) -> i32 {
    let target = match SmokeTarget::from_env() {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_SETUP_FAILURE;
        }
    };

    logger::spinner_start(&format!(
        "Probing {} in {}",
        target.collection, target.vector_db
    ));
    let record = run(args, &target);
    logger::spinner_stop();

    let result = record.and_then(|record| {
        if record.ok {
            logger::success(&format!("Probe {} is visible", record.doc_id));
        } else {
            logger::warn(&format!("Probe {} was not read back", record.doc_id));
        }
        report(&record, &mut io::stdout().lock())
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            logger::error(&e.to_string());
            EXIT_SETUP_FAILURE
        }
    }
}
