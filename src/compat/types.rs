//! Type definitions for the compatibility constraint engine.
//!
//! Rule tables deserialize from TOML; resolver output serializes to JSON
//! for the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// DIMENSIONS
// =============================================================================

/// One categorical axis of a shot configuration.
///
/// The first ten variants are constrained by the rule store. `Subject`,
/// `ColorPalette`, `Gaze` and `Pose` are presentational: the sampler fills
/// them but they never trigger or receive blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Camera,
    Lens,
    ShotType,
    DepthOfField,
    AspectRatio,
    Atmosphere,
    VisualPreset,
    Lighting,
    Director,
    Location,
    Subject,
    ColorPalette,
    Gaze,
    Pose,
}

impl Dimension {
    pub const ALL: [Dimension; 14] = [
        Dimension::Camera,
        Dimension::Lens,
        Dimension::ShotType,
        Dimension::DepthOfField,
        Dimension::AspectRatio,
        Dimension::Atmosphere,
        Dimension::VisualPreset,
        Dimension::Lighting,
        Dimension::Director,
        Dimension::Location,
        Dimension::Subject,
        Dimension::ColorPalette,
        Dimension::Gaze,
        Dimension::Pose,
    ];

    /// Dimensions the resolver reports blocks and conflicts for.
    pub const CONSTRAINED: [Dimension; 10] = [
        Dimension::Camera,
        Dimension::Lens,
        Dimension::ShotType,
        Dimension::DepthOfField,
        Dimension::AspectRatio,
        Dimension::Atmosphere,
        Dimension::VisualPreset,
        Dimension::Lighting,
        Dimension::Director,
        Dimension::Location,
    ];

    /// Human-readable name used in conflict messages.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Camera => "camera",
            Dimension::Lens => "lens",
            Dimension::ShotType => "shot type",
            Dimension::DepthOfField => "depth of field",
            Dimension::AspectRatio => "aspect ratio",
            Dimension::Atmosphere => "atmosphere",
            Dimension::VisualPreset => "visual preset",
            Dimension::Lighting => "lighting",
            Dimension::Director => "director",
            Dimension::Location => "location",
            Dimension::Subject => "subject",
            Dimension::ColorPalette => "color palette",
            Dimension::Gaze => "gaze",
            Dimension::Pose => "pose",
        }
    }

    /// Whether the dimension has a custom free-text escape value.
    pub fn accepts_custom(self) -> bool {
        matches!(self, Dimension::Camera | Dimension::Lens | Dimension::ShotType)
    }

    pub fn is_constrained(self) -> bool {
        Self::CONSTRAINED.contains(&self)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// CONFIGURATION TYPES (loaded from TOML)
// =============================================================================

/// Abstract style categories a value asserts, with strength.
pub type StyleWeights = BTreeMap<String, u8>;

/// Indoor/outdoor requirement of a location, lighting style or subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setting {
    Indoor,
    Outdoor,
    #[default]
    Any,
}

impl Setting {
    /// `Any` is compatible with everything; otherwise settings must match.
    pub fn compatible_with(self, other: Setting) -> bool {
        self == Setting::Any || other == Setting::Any || self == other
    }

    pub fn label(self) -> &'static str {
        match self {
            Setting::Indoor => "indoor",
            Setting::Outdoor => "outdoor",
            Setting::Any => "any",
        }
    }
}

/// Root configuration loaded from compat_rules.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    pub defaults: Defaults,
    #[serde(default)]
    pub stacking: StackingPolicy,
    #[serde(default)]
    pub domains: PresentationDomains,
    #[serde(default)]
    pub subject_inference: SubjectInference,
    /// Category-level camera rules keyed by category name
    #[serde(default)]
    pub camera_categories: BTreeMap<String, CameraCategoryRules>,
    pub cameras: Vec<CameraSpec>,
    #[serde(default)]
    pub lenses: Vec<LensSpec>,
    #[serde(default)]
    pub shot_types: Vec<ShotTypeSpec>,
    pub depth_of_field: Vec<DepthOfFieldSpec>,
    #[serde(default)]
    pub atmospheres: Vec<AtmosphereSpec>,
    #[serde(default)]
    pub visual_presets: Vec<VisualPresetSpec>,
    #[serde(default)]
    pub lighting: Vec<LightingSpec>,
    #[serde(default)]
    pub directors: Vec<DirectorSpec>,
    #[serde(default)]
    pub location_categories: BTreeMap<String, LocationCategoryRules>,
    #[serde(default)]
    pub locations: Vec<LocationSpec>,
    /// Location era -> atmosphere eras that cannot appear there
    #[serde(default)]
    pub era_conflicts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub subjects: Vec<SubjectSpec>,
}

/// Values a fresh selection starts from.
#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    /// Neutral depth of field; never reported as an active conflict
    pub depth_of_field: String,
    pub aspect_ratio: String,
}

/// Thresholds for stacking analysis and sampler heuristics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StackingPolicy {
    /// A style category is overloaded once this many dimensions assert it
    pub overload_min_dimensions: usize,
    /// Running assertion count at which the sampler prefers neutral presets
    pub neutral_preset_threshold: usize,
    /// Combined atmosphere + depth-of-field weight that counts as strong
    pub strong_optical_weight: u8,
    /// Shared style tags with the director before an atmosphere is de-prioritised
    pub atmosphere_overlap_limit: usize,
}

impl Default for StackingPolicy {
    fn default() -> Self {
        Self {
            overload_min_dimensions: 2,
            neutral_preset_threshold: 5,
            strong_optical_weight: 3,
            atmosphere_overlap_limit: 2,
        }
    }
}

/// Flat domains with no rules attached.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresentationDomains {
    pub aspect_ratios: Vec<String>,
    pub color_palettes: Vec<String>,
    pub gazes: Vec<String>,
    pub poses: Vec<String>,
}

/// Keyword lists for classifying free-text subjects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubjectInference {
    pub human_keywords: Vec<String>,
    pub first_person_markers: Vec<String>,
}

/// Rules shared by every camera in a category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CameraCategoryRules {
    pub blocked_atmospheres: Vec<String>,
    pub blocked_presets: Vec<String>,
    pub blocked_depth_of_field: Vec<String>,
    pub fixed_lens: Option<String>,
    pub zoom_options: Option<Vec<String>>,
    pub aspect_ratios: Option<Vec<String>>,
}

/// A camera body. Per-camera lens and aspect settings beat the category's.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraSpec {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fixed_lens: Option<String>,
    #[serde(default)]
    pub zoom_options: Option<Vec<String>>,
    #[serde(default)]
    pub aspect_ratios: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LensSpec {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Shot framing with its camera-grammar rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ShotTypeSpec {
    pub name: String,
    #[serde(default)]
    pub blocked_lens_categories: Vec<String>,
    #[serde(default)]
    pub blocked_depth_of_field: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthOfFieldSpec {
    pub name: String,
    #[serde(default)]
    pub styles: StyleWeights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtmosphereSpec {
    pub name: String,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub styles: StyleWeights,
    /// Reverse rule: camera categories this atmosphere rules out
    #[serde(default)]
    pub blocked_camera_categories: Vec<String>,
    /// Cameras excused from `blocked_camera_categories`
    #[serde(default)]
    pub exempt_cameras: Vec<String>,
    /// Lighting styles that would restate this atmosphere
    #[serde(default)]
    pub redundant_lighting: Vec<String>,
    #[serde(default)]
    pub blocked_shot_types: Vec<String>,
    #[serde(default)]
    pub blocked_depth_of_field: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualPresetSpec {
    pub name: String,
    /// Neutral presets are preferred once a selection is already style-heavy
    #[serde(default)]
    pub neutral: bool,
    #[serde(default)]
    pub styles: StyleWeights,
    /// Presets that cannot be combined with this one
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub blocked_camera_categories: Vec<String>,
    #[serde(default)]
    pub exempt_cameras: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightingSpec {
    pub name: String,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub setting: Setting,
    #[serde(default)]
    pub styles: StyleWeights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectorSpec {
    pub name: String,
    #[serde(default)]
    pub styles: StyleWeights,
    #[serde(default)]
    pub blocked_atmospheres: Vec<String>,
    #[serde(default)]
    pub blocked_presets: Vec<String>,
    #[serde(default)]
    pub blocked_cameras: Vec<String>,
    #[serde(default)]
    pub blocked_lenses: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationCategoryRules {
    pub blocked_atmospheres: Vec<String>,
    pub blocked_lighting: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub setting: Setting,
    /// None means timeless: no era conflicts
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub scale: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectSpec {
    pub name: String,
    #[serde(default)]
    pub human_like: bool,
    #[serde(default = "default_true")]
    pub third_person: bool,
    /// Location settings this subject fits; empty means anywhere
    #[serde(default)]
    pub settings: Vec<Setting>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// COMPILED RULE TYPES
// =============================================================================

/// Whether a block should disable the option or only annotate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSeverity {
    Hard,
    Soft,
}

/// Rule family an edge was compiled from. The resolver layers families in
/// a fixed order, which decides whose reason is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    CameraCategory,
    LocationCategory,
    Director,
    /// Atmosphere or preset rules pointing back at camera categories
    Reverse,
    Atmosphere,
    PresetExclusion,
    ShotGrammar,
}

/// A directed incompatibility from one value to a set of values in another
/// dimension.
#[derive(Debug, Clone)]
pub struct ConstraintEdge {
    pub source: Dimension,
    pub source_value: String,
    pub target: Dimension,
    pub kind: EdgeKind,
    /// Target values blocked by name
    pub values: BTreeSet<String>,
    /// Target categories blocked wholesale
    pub categories: BTreeSet<String>,
    /// Target values excused from a category block
    pub exempt: BTreeSet<String>,
    /// Reason text; `{category}` is replaced with the matched target category
    pub reason: String,
    pub severity: BlockSeverity,
}

impl ConstraintEdge {
    pub(crate) fn new(
        source: Dimension,
        source_value: &str,
        target: Dimension,
        kind: EdgeKind,
        reason: String,
    ) -> Self {
        Self {
            source,
            source_value: source_value.to_string(),
            target,
            kind,
            values: BTreeSet::new(),
            categories: BTreeSet::new(),
            exempt: BTreeSet::new(),
            reason,
            severity: BlockSeverity::Hard,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.categories.is_empty()
    }

    /// Render the reason for a block matched through `category` (if any).
    pub fn render_reason(&self, category: Option<&str>) -> String {
        match category {
            Some(category) => self.reason.replace("{category}", category),
            None => self.reason.replace("{category}", "this"),
        }
    }
}

/// How the current camera constrains the lens dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum LensOverride {
    /// Lens is free to choose
    Free,
    /// Camera has a built-in lens; any lens selection is ignored
    Fixed(String),
    /// Camera has a built-in zoom; only these focal positions exist
    Zoom(Vec<String>),
}

/// What the sampler knows about the subject it picked or was given.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectProfile {
    pub human_like: bool,
    pub third_person: bool,
    pub settings: Vec<Setting>,
}

impl SubjectProfile {
    /// Whether a location with `setting` suits this subject.
    pub fn fits(&self, setting: Setting) -> bool {
        self.settings.is_empty() || self.settings.iter().any(|s| s.compatible_with(setting))
    }
}

// =============================================================================
// OUTPUT TYPES (serialized to the presentation layer)
// =============================================================================

/// Why a value is blocked. Only the first rule to fire is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReason {
    /// Selected value that caused the block (camera name, director ...)
    pub source: String,
    pub reason: String,
    pub severity: BlockSeverity,
}

/// Blocked values of one dimension with one reason each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionBlocks {
    pub blocked: BTreeSet<String>,
    pub reasons: BTreeMap<String, BlockReason>,
}

impl DimensionBlocks {
    /// Insert-if-absent: a value already blocked keeps its first reason.
    pub fn block(&mut self, value: &str, reason: BlockReason) -> bool {
        if self.blocked.contains(value) {
            return false;
        }
        self.blocked.insert(value.to_string());
        self.reasons.insert(value.to_string(), reason);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.blocked.contains(value)
    }
}

/// A currently selected value the rest of the selection disagrees with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveConflict {
    pub dimension: Dimension,
    pub value: String,
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackingSeverity {
    Moderate,
    Strong,
}

/// Several selections asserting the same stylistic effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackingWarning {
    pub category: String,
    pub message: String,
    pub contributors: Vec<String>,
    pub severity: StackingSeverity,
}

/// Result of tallying style categories across director, atmosphere,
/// preset and lighting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleStackingAnalysis {
    pub overloaded_categories: Vec<String>,
    pub total_assertions: usize,
    pub warning_message: Option<String>,
    /// Overloaded category -> contributing values, in dimension order
    pub contributions: BTreeMap<String, Vec<String>>,
}

impl StyleStackingAnalysis {
    pub fn is_overloaded(&self) -> bool {
        !self.overloaded_categories.is_empty()
    }
}

/// Everything the presentation layer needs after a selection changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictResult {
    pub blocks: BTreeMap<Dimension, DimensionBlocks>,
    pub active_conflicts: Vec<ActiveConflict>,
    pub stacking_warnings: Vec<StackingWarning>,
    pub fixed_lens: Option<String>,
    pub zoom_options: Option<Vec<String>>,
    /// None means every aspect ratio is allowed
    pub allowed_aspect_ratios: Option<Vec<String>>,
    pub style_overload: StyleStackingAnalysis,
}

impl ConflictResult {
    pub fn blocks_for(&self, dimension: Dimension) -> Option<&DimensionBlocks> {
        self.blocks.get(&dimension)
    }

    pub fn is_blocked(&self, dimension: Dimension, value: &str) -> bool {
        self.blocks
            .get(&dimension)
            .is_some_and(|b| b.contains(value))
    }

    pub fn reason(&self, dimension: Dimension, value: &str) -> Option<&BlockReason> {
        self.blocks.get(&dimension)?.reasons.get(value)
    }

    pub fn blocked_values(&self, dimension: Dimension) -> Vec<&str> {
        self.blocks
            .get(&dimension)
            .map(|b| b.blocked.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.active_conflicts.is_empty()
    }

    pub fn conflicts_for(&self, dimension: Dimension) -> impl Iterator<Item = &ActiveConflict> {
        self.active_conflicts
            .iter()
            .filter(move |c| c.dimension == dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_deserialize() {
        let dim: Dimension = serde_json::from_str(r#""depth_of_field""#).unwrap();
        assert_eq!(dim, Dimension::DepthOfField);

        let dim: Dimension = serde_json::from_str(r#""visual_preset""#).unwrap();
        assert_eq!(dim, Dimension::VisualPreset);
    }

    #[test]
    fn test_only_camera_lens_shot_accept_custom() {
        let custom: Vec<_> = Dimension::ALL
            .iter()
            .filter(|d| d.accepts_custom())
            .collect();
        assert_eq!(
            custom,
            vec![&Dimension::Camera, &Dimension::Lens, &Dimension::ShotType]
        );
    }

    #[test]
    fn test_setting_compatibility() {
        assert!(Setting::Any.compatible_with(Setting::Indoor));
        assert!(Setting::Outdoor.compatible_with(Setting::Any));
        assert!(Setting::Indoor.compatible_with(Setting::Indoor));
        assert!(!Setting::Indoor.compatible_with(Setting::Outdoor));
    }

    #[test]
    fn test_first_reason_wins() {
        let mut blocks = DimensionBlocks::default();
        let first = BlockReason {
            source: "Sofia Coppola".to_string(),
            reason: "first".to_string(),
            severity: BlockSeverity::Hard,
        };
        let second = BlockReason {
            source: "dreamy".to_string(),
            reason: "second".to_string(),
            severity: BlockSeverity::Hard,
        };

        assert!(blocks.block("CCTV security camera", first.clone()));
        assert!(!blocks.block("CCTV security camera", second));
        assert_eq!(blocks.blocked.len(), 1);
        assert_eq!(blocks.reasons["CCTV security camera"], first);
    }

    #[test]
    fn test_render_reason_substitutes_category() {
        let edge = ConstraintEdge::new(
            Dimension::Atmosphere,
            "cyberpunk",
            Dimension::Camera,
            EdgeKind::Reverse,
            "cyberpunk rules out {category} cameras".to_string(),
        );
        assert_eq!(
            edge.render_reason(Some("instant")),
            "cyberpunk rules out instant cameras"
        );
        assert!(edge.is_empty());
    }

    #[test]
    fn test_conflict_result_serialize() {
        let result = ConflictResult::default();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("active_conflicts"));
        assert!(json.contains("stacking_warnings"));
        assert!(json.contains("allowed_aspect_ratios"));
    }

    #[test]
    fn test_subject_profile_fits() {
        let anywhere = SubjectProfile {
            human_like: false,
            third_person: true,
            settings: vec![],
        };
        assert!(anywhere.fits(Setting::Indoor));

        let outdoors = SubjectProfile {
            human_like: false,
            third_person: true,
            settings: vec![Setting::Outdoor],
        };
        assert!(outdoors.fits(Setting::Outdoor));
        assert!(outdoors.fits(Setting::Any));
        assert!(!outdoors.fits(Setting::Indoor));
    }
}
