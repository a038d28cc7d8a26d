//! "Randomize all": greedy consistent sampling.
//!
//! Dimensions are filled one at a time in `SAMPLING_ORDER`. Each pick is
//! drawn from the values that neither are blocked by what is already placed
//! nor would themselves block something already placed. There is no
//! backtracking: when a step has no admissible value it falls back to the
//! whole domain and the resulting conflict surfaces in the next resolution.

use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::engine::resolve_conflicts;
use super::selection::Selection;
use super::stacking::{analyze_optical_stacking, analyze_style_stacking, shared_style_tags};
use super::store::RuleStore;
use super::types::{Dimension, LensOverride, SubjectProfile};

/// Fill order. Earlier dimensions constrain later ones.
pub const SAMPLING_ORDER: [Dimension; 14] = [
    Dimension::Subject,
    Dimension::Location,
    Dimension::Director,
    Dimension::Camera,
    Dimension::Atmosphere,
    Dimension::Lighting,
    Dimension::ShotType,
    Dimension::Lens,
    Dimension::VisualPreset,
    Dimension::DepthOfField,
    Dimension::ColorPalette,
    Dimension::AspectRatio,
    Dimension::Gaze,
    Dimension::Pose,
];

const POV_SHOT: &str = "POV";

/// Produce a complete selection consistent with the rules.
///
/// Locked dimensions keep their value from `current`, custom text
/// included. Every other dimension is re-drawn and loses any custom
/// override. Always terminates with every dimension considered.
///
/// # Arguments
/// * `store` - Rule store to sample against
/// * `current` - Selection the locked values are taken from
/// * `locked` - Dimensions to keep as they are in `current`
/// * `rng` - Random source; seed it for reproducible results
///
/// # Returns
/// A new `Selection`. Lens is left empty under a fixed-lens or zoom camera,
/// and gaze / pose are left empty for subjects that aren't human-like.
pub fn sample_consistent_assignment<R: Rng + ?Sized>(
    store: &RuleStore,
    current: &Selection,
    locked: &BTreeSet<Dimension>,
    rng: &mut R,
) -> Selection {
    let mut partial = Selection::default();
    for dimension in locked {
        partial.copy_from(current, *dimension);
    }

    let mut profile = unknown_subject();

    for dimension in SAMPLING_ORDER {
        if !locked.contains(&dimension) {
            let pick = pick_value(store, &partial, dimension, &profile, rng);
            debug!("Sampled {} = {:?}", dimension, pick);
            partial.set(dimension, pick);
        }

        if dimension == Dimension::Subject {
            profile = partial
                .get(Dimension::Subject)
                .map(|subject| store.subject_profile(subject))
                .unwrap_or_else(unknown_subject);
        }
    }

    partial
}

/// Same as `sample_consistent_assignment` with the thread-local RNG.
pub fn randomize_all(store: &RuleStore, current: &Selection, locked: &BTreeSet<Dimension>) -> Selection {
    sample_consistent_assignment(store, current, locked, &mut rand::rng())
}

fn unknown_subject() -> SubjectProfile {
    SubjectProfile {
        human_like: false,
        third_person: true,
        settings: Vec::new(),
    }
}

fn pick_value<R: Rng + ?Sized>(
    store: &RuleStore,
    partial: &Selection,
    dimension: Dimension,
    profile: &SubjectProfile,
    rng: &mut R,
) -> Option<String> {
    match dimension {
        Dimension::Lens => {
            let camera = partial.engine_value(Dimension::Camera);
            if camera.is_some_and(|c| store.lens_override(c) != LensOverride::Free) {
                return None;
            }
        }
        Dimension::Gaze | Dimension::Pose if !profile.human_like => return None,
        _ => {}
    }

    let domain = store.domain(dimension);
    let resolved = resolve_conflicts(store, partial);

    let mut candidates: Vec<&str> = domain
        .iter()
        .map(String::as_str)
        .filter(|value| !resolved.is_blocked(dimension, value))
        .filter(|value| !would_block_placed(store, partial, dimension, value))
        .filter(|value| step_allows(store, dimension, value, profile))
        .collect();

    if candidates.is_empty() {
        warn!(
            "No consistent {} left, sampling from the full domain",
            dimension
        );
        candidates = domain.iter().map(String::as_str).collect();
    }

    let preferred = preferred(store, partial, dimension, &candidates);
    let pool = if preferred.is_empty() {
        &candidates
    } else {
        &preferred
    };

    pool.choose(rng).map(|value| value.to_string())
}

/// Whether a candidate's own rules would block a value already placed.
fn would_block_placed(
    store: &RuleStore,
    partial: &Selection,
    dimension: Dimension,
    candidate: &str,
) -> bool {
    let reverse_hit = store.lookup(dimension, candidate).iter().any(|edge| {
        partial
            .engine_value(edge.target)
            .is_some_and(|placed| store.match_edge(edge, placed).is_some())
    });
    if reverse_hit {
        return true;
    }

    match dimension {
        Dimension::Location => {
            let era_clash = partial
                .engine_value(Dimension::Atmosphere)
                .is_some_and(|atmosphere| store.era_blocks(candidate, atmosphere));
            let setting_clash = partial
                .engine_value(Dimension::Lighting)
                .is_some_and(|lighting| store.setting_blocks(candidate, lighting));
            era_clash || setting_clash
        }
        Dimension::Camera => {
            let lens_ignored = partial.is_set(Dimension::Lens)
                && store.lens_override(candidate) != LensOverride::Free;
            let ratio_excluded = match (
                partial.engine_value(Dimension::AspectRatio),
                store.allowed_aspect_ratios(candidate),
            ) {
                (Some(ratio), Some(allowed)) => !allowed.iter().any(|r| r == ratio),
                _ => false,
            };
            lens_ignored || ratio_excluded
        }
        _ => false,
    }
}

/// Hard per-step filters that depend on the subject.
fn step_allows(store: &RuleStore, dimension: Dimension, value: &str, profile: &SubjectProfile) -> bool {
    match dimension {
        Dimension::Location => store
            .location(value)
            .map_or(true, |location| profile.fits(location.setting)),
        Dimension::ShotType => !(profile.third_person && value == POV_SHOT),
        _ => true,
    }
}

/// Soft preferences. An empty result means no preference applies.
fn preferred<'a>(
    store: &RuleStore,
    partial: &Selection,
    dimension: Dimension,
    candidates: &[&'a str],
) -> Vec<&'a str> {
    let policy = store.policy();
    match dimension {
        Dimension::Atmosphere => {
            let Some(director) = partial.engine_value(Dimension::Director) else {
                return Vec::new();
            };
            candidates
                .iter()
                .copied()
                .filter(|atmosphere| {
                    shared_style_tags(
                        store,
                        (Dimension::Director, director),
                        (Dimension::Atmosphere, *atmosphere),
                    ) < policy.atmosphere_overlap_limit
                })
                .collect()
        }
        Dimension::VisualPreset => {
            let analysis = analyze_style_stacking(
                store,
                partial.engine_value(Dimension::Director),
                partial.engine_value(Dimension::Atmosphere),
                None,
                partial.engine_value(Dimension::Lighting),
            );
            if analysis.total_assertions < policy.neutral_preset_threshold {
                return Vec::new();
            }
            let neutral = store.neutral_presets();
            candidates
                .iter()
                .copied()
                .filter(|preset| neutral.contains(preset))
                .collect()
        }
        Dimension::DepthOfField => {
            let atmosphere = partial.engine_value(Dimension::Atmosphere);
            candidates
                .iter()
                .copied()
                .filter(|depth| analyze_optical_stacking(store, atmosphere, Some(*depth)).is_empty())
                .collect()
        }
        _ => Vec::new(),
    }
}
