//! Store-to-store migration.
//!
//! Copies every record from the configured store into another provider
//! configured in the same file, e.g. moving a knowledge base from the
//! hosted index to a self-hosted collection. Both sides speak the same
//! record shape, so the copy is a dump followed by batched upserts.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store;

/// Records per upsert request on the target side.
const MIGRATE_BATCH: usize = 100;

pub async fn run_migrate(config: &Config, target: &str) -> Result<()> {
    if target == config.store.provider {
        return Err(Error::config(format!(
            "migration target '{}' matches the configured store; nothing to do",
            target
        )));
    }

    let source = store::create_store(config)?;
    let dest = store::create_store_named(config, target)?;

    println!("migrate {} -> {}", source.name(), dest.name());

    let records = source.dump().await?;
    if records.is_empty() {
        println!("  source store is empty; nothing to migrate");
        return Ok(());
    }

    let dims = records[0].values.len();
    if dims == 0 {
        return Err(Error::service(
            source.name(),
            "exported records carry no vector values",
        ));
    }
    dest.init(dims).await?;

    let total = records.len();
    let mut migrated = 0usize;
    for batch in records.chunks(MIGRATE_BATCH) {
        dest.upsert(batch).await?;
        migrated += batch.len();
        eprintln!("migrate  copied {} / {} vectors", migrated, total);
    }

    println!("  vectors copied: {}", migrated);
    println!("ok");

    Ok(())
}
