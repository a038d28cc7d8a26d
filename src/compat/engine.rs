//! Conflict resolution for a live selection.
//!
//! `resolve_conflicts` is a pure function of the selection and the rule
//! store. Rule families are layered in a fixed order and every block is an
//! insert-if-absent write, so the earliest family to block a value owns its
//! reason.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::selection::Selection;
use super::stacking::{analyze_optical_stacking, analyze_style_stacking, style_warnings};
use super::store::RuleStore;
use super::types::*;

/// Compute blocks, reasons, active conflicts and stacking warnings for a
/// selection.
///
/// Custom free text and unknown values neither trigger nor receive blocks.
/// The selection is never modified.
///
/// # Arguments
/// * `store` - Compiled rule store
/// * `selection` - Current selection, possibly inconsistent
///
/// # Returns
/// `ConflictResult` with per-dimension blocks (one reason each, dimensions
/// without blocks omitted), active conflicts, stacking warnings and the
/// camera's lens and aspect-ratio constraints
pub fn resolve_conflicts(store: &RuleStore, selection: &Selection) -> ConflictResult {
    let mut result = ConflictResult::default();

    let known = move |dimension: Dimension| {
        selection
            .engine_value(dimension)
            .filter(|value| store.contains(dimension, value))
    };
    let camera = known(Dimension::Camera);
    let location = known(Dimension::Location);
    let director = known(Dimension::Director);
    let atmosphere = known(Dimension::Atmosphere);
    let preset = known(Dimension::VisualPreset);
    let lighting = known(Dimension::Lighting);
    let shot_type = known(Dimension::ShotType);

    // Category seeds
    if let Some(camera) = camera {
        apply_edges(store, &mut result, Dimension::Camera, camera, EdgeKind::CameraCategory);
    }
    if let Some(location) = location {
        apply_edges(store, &mut result, Dimension::Location, location, EdgeKind::LocationCategory);
    }

    if let Some(director) = director {
        apply_edges(store, &mut result, Dimension::Director, director, EdgeKind::Director);
    }

    // Reverse rules onto cameras, then atmosphere forward rules
    if let Some(atmosphere) = atmosphere {
        apply_edges(store, &mut result, Dimension::Atmosphere, atmosphere, EdgeKind::Reverse);
    }
    if let Some(preset) = preset {
        apply_edges(store, &mut result, Dimension::VisualPreset, preset, EdgeKind::Reverse);
    }
    if let Some(atmosphere) = atmosphere {
        apply_edges(store, &mut result, Dimension::Atmosphere, atmosphere, EdgeKind::Atmosphere);
    }

    if let Some(preset) = preset {
        apply_edges(
            store,
            &mut result,
            Dimension::VisualPreset,
            preset,
            EdgeKind::PresetExclusion,
        );
    }

    if let Some(camera) = camera {
        match store.lens_override(camera) {
            LensOverride::Fixed(lens) => result.fixed_lens = Some(lens),
            LensOverride::Zoom(options) => result.zoom_options = Some(options),
            LensOverride::Free => {}
        }
        block_aspect_ratios(store, &mut result, camera);
    }

    if let Some(location) = location {
        block_for_location(store, &mut result, location);
    }

    if let Some(shot_type) = shot_type {
        apply_edges(store, &mut result, Dimension::ShotType, shot_type, EdgeKind::ShotGrammar);
    }

    result.blocks.retain(|_, blocks| !blocks.blocked.is_empty());

    result.active_conflicts = active_conflicts(store, selection, &result, camera);

    let analysis = analyze_style_stacking(store, director, atmosphere, preset, lighting);
    result.stacking_warnings = style_warnings(&analysis);
    result.stacking_warnings.extend(analyze_optical_stacking(
        store,
        atmosphere,
        known(Dimension::DepthOfField),
    ));
    result.style_overload = analysis;

    result
}

/// Layer every edge of one rule family leaving `value`.
fn apply_edges(
    store: &RuleStore,
    result: &mut ConflictResult,
    source: Dimension,
    value: &str,
    kind: EdgeKind,
) {
    for edge in store.lookup(source, value).iter().filter(|e| e.kind == kind) {
        apply_edge(store, result, edge);
    }
}

/// Block every value of the edge's target dimension it matches. Category
/// edges expand by scanning the target's domain.
fn apply_edge(store: &RuleStore, result: &mut ConflictResult, edge: &ConstraintEdge) {
    let blocks = result.blocks.entry(edge.target).or_default();
    for candidate in store.domain(edge.target) {
        let Some(matched) = store.match_edge(edge, candidate) else {
            continue;
        };
        blocks.block(
            candidate,
            BlockReason {
                source: edge.source_value.clone(),
                reason: edge.render_reason(matched.category()),
                severity: edge.severity,
            },
        );
    }
}

fn block_aspect_ratios(store: &RuleStore, result: &mut ConflictResult, camera: &str) {
    let Some(allowed) = store.allowed_aspect_ratios(camera) else {
        return;
    };
    let blocks = result.blocks.entry(Dimension::AspectRatio).or_default();
    for ratio in store.domain(Dimension::AspectRatio) {
        if allowed.contains(ratio) {
            continue;
        }
        blocks.block(
            ratio,
            BlockReason {
                source: camera.to_string(),
                reason: format!("{} only shoots {}", camera, allowed.join(", ")),
                severity: BlockSeverity::Hard,
            },
        );
    }
    result.allowed_aspect_ratios = Some(allowed.to_vec());
}

/// Era clashes for atmospheres and indoor/outdoor clashes for lighting.
fn block_for_location(store: &RuleStore, result: &mut ConflictResult, location: &str) {
    let atmospheres = result.blocks.entry(Dimension::Atmosphere).or_default();
    for atmosphere in store.domain(Dimension::Atmosphere) {
        if store.era_blocks(location, atmosphere) {
            let era = store
                .category_of(Dimension::Atmosphere, atmosphere)
                .unwrap_or("another");
            atmospheres.block(
                atmosphere,
                BlockReason {
                    source: location.to_string(),
                    reason: format!("{} era styling is anachronistic at {}", era, location),
                    severity: BlockSeverity::Hard,
                },
            );
        }
    }

    let setting = store
        .location(location)
        .map(|l| l.setting.label())
        .unwrap_or("any");
    let lighting = result.blocks.entry(Dimension::Lighting).or_default();
    for light in store.domain(Dimension::Lighting) {
        if store.setting_blocks(location, light) {
            lighting.block(
                light,
                BlockReason {
                    source: location.to_string(),
                    reason: format!("{} is {}; this light needs the opposite", location, setting),
                    severity: BlockSeverity::Hard,
                },
            );
        }
    }
}

fn active_conflicts(
    store: &RuleStore,
    selection: &Selection,
    result: &ConflictResult,
    camera: Option<&str>,
) -> Vec<ActiveConflict> {
    let mut conflicts = Vec::new();

    for dimension in Dimension::CONSTRAINED {
        let Some(value) = selection.engine_value(dimension) else {
            continue;
        };
        if dimension == Dimension::DepthOfField && store.is_neutral_depth_of_field(value) {
            continue;
        }
        let Some(reason) = result.reason(dimension, value) else {
            continue;
        };
        conflicts.push(ActiveConflict {
            dimension,
            value: value.to_string(),
            source: reason.source.clone(),
            message: format!("{} ({}): {}", value, dimension, reason.reason),
        });
    }

    if let (Some(camera), Some(lens)) = (camera, selection.effective(Dimension::Lens)) {
        let message = match (&result.fixed_lens, &result.zoom_options) {
            (Some(fixed), _) => Some(format!(
                "{} has a fixed {}; the {} lens will be ignored",
                camera, fixed, lens
            )),
            (None, Some(_)) => Some(format!(
                "{} has a built-in zoom; the {} lens will be ignored",
                camera, lens
            )),
            (None, None) => None,
        };
        if let Some(message) = message {
            conflicts.push(ActiveConflict {
                dimension: Dimension::Lens,
                value: lens.to_string(),
                source: camera.to_string(),
                message,
            });
        }
    }

    conflicts
}

/// Memoizing front-end over `resolve_conflicts`.
///
/// Holds the shared store and the last (selection, result) pair only, so
/// resolving the same selection twice in a row is free.
pub struct ConflictResolver {
    store: Arc<RuleStore>,
    last: Mutex<Option<(Selection, Arc<ConflictResult>)>>,
}

impl ConflictResolver {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self {
            store,
            last: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Resolve a selection, reusing the previous result when the selection
    /// is unchanged. The memo lock is not held while resolving.
    pub fn resolve(&self, selection: &Selection) -> Arc<ConflictResult> {
        if let Some(result) = self.cached(selection) {
            debug!("Conflict result served from memo");
            return result;
        }

        let result = Arc::new(resolve_conflicts(&self.store, selection));
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((selection.clone(), Arc::clone(&result)));
        result
    }

    fn cached(&self, selection: &Selection) -> Option<Arc<ConflictResult>> {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match last.as_ref() {
            Some((cached, result)) if cached == selection => Some(Arc::clone(result)),
            _ => None,
        }
    }
}
