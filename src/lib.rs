pub mod compat;
pub mod config;
mod error;

use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use compat::{ConflictResolver, ConflictResult, RuleStore, Selection};
use config::EngineConfig;

pub use error::PromptFrameError;

/// What the binary prints: the sampled selection and its resolution.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub selection: &'a Selection,
    pub conflicts: &'a ConflictResult,
}

/// Build the rule store a config asks for.
pub fn build_store(config: &EngineConfig) -> Result<RuleStore> {
    let rules = match &config.rules_path {
        Some(path) if !path.exists() => {
            return Err(PromptFrameError::Config(format!(
                "rules_path {:?} does not exist",
                path
            ))
            .into());
        }
        Some(path) => compat::load_rules(path)?,
        None => compat::default_rules(),
    };
    Ok(RuleStore::new(rules)?)
}

/// Sample a selection from the config's starting point and resolve it.
pub fn sample_and_resolve(
    resolver: &ConflictResolver,
    config: &EngineConfig,
) -> (Selection, Arc<ConflictResult>) {
    let store = resolver.store();
    let selection = match config.seed {
        Some(seed) => compat::sample_consistent_assignment(
            store,
            &config.selection,
            &config.locked,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => compat::randomize_all(store, &config.selection, &config.locked),
    };
    let result = resolver.resolve(&selection);
    (selection, result)
}

pub fn run() -> Result<()> {
    let config = EngineConfig::load()?;

    let fallback_filter = config.log_filter.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = build_store(&config)?;
    let resolver = ConflictResolver::new(Arc::new(store));
    let (selection, result) = sample_and_resolve(&resolver, &config);

    info!(
        "Sampled selection with {} active conflicts and {} stacking warnings",
        result.active_conflicts.len(),
        result.stacking_warnings.len()
    );

    let report = Report {
        selection: &selection,
        conflicts: &result,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compat::Dimension;

    #[test]
    fn test_build_store_from_defaults() {
        let store = build_store(&EngineConfig::default()).unwrap();
        assert!(store.contains(Dimension::Camera, "Polaroid SX-70"));
    }

    #[test]
    fn test_build_store_missing_rules_path() {
        let config = EngineConfig {
            rules_path: Some("/nonexistent/compat_rules.toml".into()),
            ..EngineConfig::default()
        };
        let err = build_store(&config).unwrap_err();
        assert!(err.to_string().contains("Config error"), "{}", err);
    }

    #[test]
    fn test_seeded_run_is_reproducible() {
        let config = EngineConfig {
            seed: Some(42),
            locked: [Dimension::Director].into_iter().collect(),
            selection: {
                let mut selection = Selection::default();
                selection.set(Dimension::Director, Some("Agnès Varda".to_string()));
                selection
            },
            ..EngineConfig::default()
        };
        let resolver = ConflictResolver::new(Arc::new(build_store(&config).unwrap()));

        let (first, first_result) = sample_and_resolve(&resolver, &config);
        let (second, _) = sample_and_resolve(&resolver, &config);
        assert_eq!(first, second);
        assert_eq!(first.get(Dimension::Director), Some("Agnès Varda"));
        assert!(!first_result.has_conflicts());

        let report = Report {
            selection: &first,
            conflicts: &first_result,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"selection\""));
        assert!(json.contains("\"active_conflicts\""));
    }
}
