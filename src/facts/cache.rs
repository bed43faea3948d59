//! Cache management for gathered VPC facts.
//!
//! Lets repeated runs (and offline runs) reuse one snapshot instead of calling
//! the AWS CLI again.

use super::aws::AwsCli;
use super::cli::CommandRunner;
use super::FactsSnapshot;
use crate::config::CACHE_FILE_PREFIX;
use crate::error::FactsError;
use std::path::Path;

/// Dated cache file name for today, e.g. `vpc_facts_cache_2026-10-17.json`.
pub fn default_cache_file() -> String {
    format!(
        "{CACHE_FILE_PREFIX}_{}.json",
        chrono::Utc::now().format("%Y-%m-%d")
    )
}

/// Read a snapshot from `cache_file`; `Ok(None)` when the file does not exist.
pub fn read_facts_cache(cache_file: &str) -> Result<Option<FactsSnapshot>, FactsError> {
    if !Path::new(cache_file).exists() {
        log::warn!("Cache file not found: {cache_file}");
        return Ok(None);
    }
    log::info!("Reading from cache file: {cache_file}");
    let json = std::fs::read_to_string(cache_file)?;
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    let snapshot = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        FactsError::Parse {
            what: cache_file.to_string(),
            path: e.path().to_string(),
            reason: e.inner().to_string(),
        }
    })?;
    Ok(Some(snapshot))
}

pub fn write_facts_cache(cache_file: &str, snapshot: &FactsSnapshot) -> Result<(), FactsError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    log::warn!("Writing data to cache file: {cache_file}");
    std::fs::write(cache_file, json)?;
    Ok(())
}

/// Load facts from `cache_file` when possible, else gather them with `aws`.
///
/// With `need_zones` the zones are fetched when the snapshot has none; `vpc_id`
/// is fetched when it is not in the snapshot. Anything newly gathered is
/// written back to the cache.
pub async fn load_facts<R: CommandRunner + 'static>(
    cache_file: Option<&str>,
    aws: &AwsCli<R>,
    vpc_id: Option<&str>,
    need_zones: bool,
) -> Result<FactsSnapshot, FactsError> {
    let mut snapshot = match cache_file {
        Some(file) => read_facts_cache(file)?.unwrap_or_default(),
        None => FactsSnapshot::default(),
    };
    let mut changed = false;

    if need_zones && snapshot.zones.is_empty() {
        snapshot.zones = aws.list_availability_zones().await?;
        log::info!("Got {} availability zones", snapshot.zones.len());
        changed = true;
    }
    if let Some(vpc_id) = vpc_id.filter(|id| !id.is_empty()) {
        if !snapshot.has_vpc(vpc_id) {
            let facts = aws.gather_vpc_facts(vpc_id).await?;
            log::info!("Gathered {facts}");
            snapshot.upsert_vpc(facts);
            changed = true;
        }
    }

    if let (Some(file), true) = (cache_file, changed) {
        write_facts_cache(file, &snapshot)?;
    }
    Ok(snapshot)
}
