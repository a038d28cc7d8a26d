//! TOML rule loading for the compatibility engine.
//!
//! Provides two loading methods:
//! - `default_rules()` - Loads embedded rules compiled into the binary
//! - `load_rules(path)` - Loads custom rules from a file path

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::types::RulesConfig;

/// Default rules embedded in the binary at compile time.
/// These are loaded from `config/compat_rules.toml`.
const DEFAULT_RULES: &str = include_str!("../../config/compat_rules.toml");

/// Load rules from a TOML file at the given path.
///
/// # Returns
/// * `Ok(RulesConfig)` - Parsed rules configuration
/// * `Err` - If file cannot be read or TOML is invalid
pub fn load_rules(path: &Path) -> Result<RulesConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file {:?}", path))?;
    let config = parse_rules(&content)
        .with_context(|| format!("Failed to parse rules file {:?}", path))?;
    info!(
        "Loaded {} cameras, {} atmospheres, {} directors from {:?}",
        config.cameras.len(),
        config.atmospheres.len(),
        config.directors.len(),
        path
    );
    Ok(config)
}

/// Parse rules from a TOML string.
pub fn parse_rules(content: &str) -> Result<RulesConfig> {
    let config: RulesConfig = toml::from_str(content)?;
    Ok(config)
}

/// Get the default rules embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_rules() -> RulesConfig {
    toml::from_str(DEFAULT_RULES).expect("embedded compat_rules.toml must be valid TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_rules_loads() {
        let rules = default_rules();
        assert!(!rules.cameras.is_empty(), "Should have cameras");
        assert!(!rules.atmospheres.is_empty(), "Should have atmospheres");
        assert!(!rules.directors.is_empty(), "Should have directors");
        assert!(!rules.locations.is_empty(), "Should have locations");
    }

    #[test]
    fn test_every_camera_category_has_rules_table() {
        let rules = default_rules();
        for camera in &rules.cameras {
            let category = camera.category.as_deref().expect("camera has a category");
            assert!(
                rules.camera_categories.contains_key(category),
                "Category '{}' of {} has no rules table",
                category,
                camera.name
            );
        }
    }

    #[test]
    fn test_defaults_exist_in_domains() {
        let rules = default_rules();
        assert!(rules
            .depth_of_field
            .iter()
            .any(|d| d.name == rules.defaults.depth_of_field));
        assert!(rules
            .domains
            .aspect_ratios
            .contains(&rules.defaults.aspect_ratio));
    }

    #[test]
    fn test_compact_premium_fixes_sonnar_lens() {
        let rules = default_rules();
        let category = &rules.camera_categories["compact-premium"];
        assert_eq!(category.fixed_lens.as_deref(), Some("35mm Sonnar equivalent"));
        assert!(category.zoom_options.is_none());
    }

    #[test]
    fn test_instant_blocks_cyberpunk() {
        let rules = default_rules();
        let instant = &rules.camera_categories["instant"];
        assert!(instant.blocked_atmospheres.contains(&"cyberpunk".to_string()));
    }

    #[test]
    fn test_lighting_setting_defaults_to_any() {
        let rules = default_rules();
        let diffused = rules
            .lighting
            .iter()
            .find(|l| l.name == "soft diffused")
            .unwrap();
        assert_eq!(diffused.setting, crate::compat::Setting::Any);
    }

    #[test]
    fn test_stacking_policy_defaults_when_omitted() {
        let toml = r#"
            [defaults]
            depth_of_field = "normal"
            aspect_ratio = "1:1"

            [[cameras]]
            name = "Test Cam"

            [[depth_of_field]]
            name = "normal"
        "#;
        let rules = parse_rules(toml).unwrap();
        assert_eq!(rules.stacking.overload_min_dimensions, 2);
        assert_eq!(rules.stacking.neutral_preset_threshold, 5);
        assert!(rules.atmospheres.is_empty());
        assert!(rules.cameras[0].category.is_none());
    }

    #[test]
    fn test_load_rules_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [defaults]
            depth_of_field = "normal"
            aspect_ratio = "16:9"

            [domains]
            aspect_ratios = ["16:9"]

            [[cameras]]
            name = "Leica M6"
            category = "classic-film"

            [[depth_of_field]]
            name = "normal"
            "#
        )
        .unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.cameras.len(), 1);
        assert_eq!(rules.cameras[0].name, "Leica M6");
    }

    #[test]
    fn test_load_rules_missing_file() {
        let result = load_rules(Path::new("/nonexistent/compat_rules.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rules_rejects_invalid_toml() {
        assert!(parse_rules("[[cameras]\nname = ").is_err());
    }
}
