//! Style-stacking analysis.
//!
//! Director, atmosphere, preset and lighting each assert abstract style
//! categories. When two or more of them push the same category the prompt
//! says the same thing twice, so the resolver surfaces a warning. Nothing
//! here blocks a value.

use std::collections::BTreeMap;

use super::store::RuleStore;
use super::types::{Dimension, StackingSeverity, StackingWarning, StyleStackingAnalysis};

/// Tally style categories across the four style-bearing selections.
pub fn analyze_style_stacking(
    store: &RuleStore,
    director: Option<&str>,
    atmosphere: Option<&str>,
    preset: Option<&str>,
    lighting: Option<&str>,
) -> StyleStackingAnalysis {
    let inputs = [
        (Dimension::Director, director),
        (Dimension::Atmosphere, atmosphere),
        (Dimension::VisualPreset, preset),
        (Dimension::Lighting, lighting),
    ];

    let mut tally: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut total_assertions = 0;

    for (dimension, value) in inputs {
        let Some(value) = value else { continue };
        let Some(weights) = store.styles(dimension, value) else {
            continue;
        };
        for (category, weight) in weights {
            if *weight == 0 {
                continue;
            }
            tally.entry(category.as_str()).or_default().push(value);
            total_assertions += 1;
        }
    }

    let min_dimensions = store.policy().overload_min_dimensions.max(2);
    let contributions: BTreeMap<String, Vec<String>> = tally
        .into_iter()
        .filter(|(_, values)| values.len() >= min_dimensions)
        .map(|(category, values)| {
            (
                category.to_string(),
                values.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();
    let overloaded_categories: Vec<String> = contributions.keys().cloned().collect();

    let warning_message = if overloaded_categories.is_empty() {
        None
    } else {
        Some(format!(
            "Style overload: {} asserted by several selections at once",
            overloaded_categories.join(", ")
        ))
    };

    StyleStackingAnalysis {
        overloaded_categories,
        total_assertions,
        warning_message,
        contributions,
    }
}

/// One warning per overloaded category. Three or more contributors make it
/// strong.
pub fn style_warnings(analysis: &StyleStackingAnalysis) -> Vec<StackingWarning> {
    analysis
        .contributions
        .iter()
        .map(|(category, contributors)| {
            let severity = if contributors.len() >= 3 {
                StackingSeverity::Strong
            } else {
                StackingSeverity::Moderate
            };
            StackingWarning {
                category: category.clone(),
                message: format!(
                    "{} selections all push {}: {}",
                    contributors.len(),
                    category,
                    contributors.join(", ")
                ),
                contributors: contributors.clone(),
                severity,
            }
        })
        .collect()
}

/// Flag an atmosphere and a depth of field asserting the same optical
/// effect (typically blur).
pub fn analyze_optical_stacking(
    store: &RuleStore,
    atmosphere: Option<&str>,
    depth_of_field: Option<&str>,
) -> Vec<StackingWarning> {
    let (Some(atmosphere), Some(depth_of_field)) = (atmosphere, depth_of_field) else {
        return Vec::new();
    };
    let (Some(atmosphere_styles), Some(depth_styles)) = (
        store.styles(Dimension::Atmosphere, atmosphere),
        store.styles(Dimension::DepthOfField, depth_of_field),
    ) else {
        return Vec::new();
    };

    let strong_weight = store.policy().strong_optical_weight;
    let mut warnings = Vec::new();

    for (category, depth_weight) in depth_styles {
        let atmosphere_weight = atmosphere_styles.get(category).copied().unwrap_or(0);
        if atmosphere_weight == 0 || *depth_weight == 0 {
            continue;
        }
        let combined = atmosphere_weight.saturating_add(*depth_weight);
        let (severity, message) = if combined >= strong_weight {
            (
                StackingSeverity::Strong,
                format!(
                    "Heavy {} stacking: {} depth of field on top of a {} atmosphere will smear the whole frame",
                    category, depth_of_field, atmosphere
                ),
            )
        } else {
            (
                StackingSeverity::Moderate,
                format!(
                    "The {} atmosphere and {} depth of field both add {}",
                    atmosphere, depth_of_field, category
                ),
            )
        };
        warnings.push(StackingWarning {
            category: category.clone(),
            message,
            contributors: vec![atmosphere.to_string(), depth_of_field.to_string()],
            severity,
        });
    }

    warnings
}

/// Number of style tags two values share.
pub fn shared_style_tags(
    store: &RuleStore,
    first: (Dimension, &str),
    second: (Dimension, &str),
) -> usize {
    match (store.styles(first.0, first.1), store.styles(second.0, second.1)) {
        (Some(a), Some(b)) => a
            .iter()
            .filter(|(category, weight)| **weight > 0 && b.get(*category).is_some_and(|w| *w > 0))
            .count(),
        _ => 0,
    }
}
