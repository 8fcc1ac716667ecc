//! rep-runner: headless reputation runner for the marketplace profile store.
//!
//! Usage:
//!   rep-runner --db profiles.db --import profiles.json
//!   rep-runner --db profiles.db --rate seller-1 5 --txn seller-1 ok --show seller-1
//!   rep-runner --db profiles.db --config data/reputation.json --all

use anyhow::{bail, Result};
use marketplace_core::{Profile, ProfileStore, ReputationConfig, ReputationService};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config = match flag_value(&args, "--config") {
        Some(path) => ReputationConfig::load(path)?,
        None => ReputationConfig::default(),
    };

    let store = ProfileStore::open(db)?;
    store.migrate()?;
    let service = ReputationService::new(store, config);

    if let Some(path) = flag_value(&args, "--import") {
        let imported = import_profiles(&service, path)?;
        log::info!("imported {imported} profiles from {path}");
    }

    for (user_id, stars) in flag_pairs(&args, "--rate")? {
        let stars: u8 = stars
            .parse()
            .map_err(|e| anyhow::anyhow!("--rate {user_id}: bad star count '{stars}': {e}"))?;
        service.store.record_rating(user_id, stars)?;
    }

    for (user_id, outcome) in flag_pairs(&args, "--txn")? {
        let successful = match outcome {
            "ok" => true,
            "failed" => false,
            other => bail!("--txn {user_id}: expected 'ok' or 'failed', got '{other}'"),
        };
        service.store.record_transaction(user_id, successful)?;
    }

    if let Some(user_id) = flag_value(&args, "--show") {
        let summary = service.summary(user_id)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if args.iter().any(|a| a == "--all") {
        let summaries = service.all_summaries()?;
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_summary(&service, db)?;
    }

    Ok(())
}

fn import_profiles(service: &ReputationService, path: &str) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let profiles: Vec<Profile> = serde_json::from_str(&content)?;
    for profile in &profiles {
        service.store.insert_profile(profile)?;
    }
    Ok(profiles.len())
}

fn print_summary(service: &ReputationService, db: &str) -> Result<()> {
    let count = service.store.profile_count()?;
    let tiers = service.tier_distribution()?;

    println!("=== PROFILE STORE ===");
    println!("  db:        {db}");
    println!("  profiles:  {count}");
    for (tier, n) in &tiers {
        println!("  {:<10} {n}", format!("{tier}:"));
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Every `flag a b` occurrence, in order. A flag missing either value is
/// an error rather than being skipped.
fn flag_pairs<'a>(args: &'a [String], flag: &str) -> Result<Vec<(&'a str, &'a str)>> {
    let mut pairs = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if arg != flag {
            continue;
        }
        match (args.get(i + 1), args.get(i + 2)) {
            (Some(a), Some(b)) if !a.starts_with("--") && !b.starts_with("--") => {
                pairs.push((a.as_str(), b.as_str()));
            }
            _ => bail!("{flag} expects two values: {flag} <user-id> <value>"),
        }
    }
    Ok(pairs)
}
