//! Compatibility constraint engine for the shot-building wizard.
//!
//! This module decides which camera, lens, framing, atmosphere, preset,
//! lighting, director and location values are incompatible with the
//! current selection, explains each block, flags conflicts already present
//! and samples complete consistent selections.
//!
//! # Architecture
//!
//! - **Rules**: Loaded from TOML (embedded defaults or a custom file) and
//!   compiled once into an immutable `RuleStore`
//! - **Resolution**: Selection + store -> blocks, reasons, active conflicts
//! - **Stacking**: Overlapping style assertions surface as warnings
//! - **Sampling**: "Randomize all" fills unlocked dimensions consistently
//!
//! # Example
//!
//! ```ignore
//! use promptframe::compat::{resolve_conflicts, Dimension, RuleStore, Selection};
//!
//! let store = RuleStore::with_default_rules()?;
//!
//! let mut selection = Selection::with_defaults(&store);
//! selection.set(Dimension::Camera, Some("Polaroid SX-70".to_string()));
//! selection.set(Dimension::Atmosphere, Some("cyberpunk".to_string()));
//!
//! let result = resolve_conflicts(&store, &selection);
//!
//! for conflict in &result.active_conflicts {
//!     println!("{}: {} ({})", conflict.dimension, conflict.message, conflict.source);
//! }
//!
//! if let Some(lens) = &result.fixed_lens {
//!     println!("Lens is fixed: {}", lens);
//! }
//! ```

mod engine;
mod rules;
mod sampler;
mod selection;
mod stacking;
mod store;
mod types;

pub use engine::{resolve_conflicts, ConflictResolver};
pub use rules::{default_rules, load_rules, parse_rules};
pub use sampler::{randomize_all, sample_consistent_assignment, SAMPLING_ORDER};
pub use selection::Selection;
pub use stacking::{analyze_optical_stacking, analyze_style_stacking, shared_style_tags, style_warnings};
pub use store::{EdgeMatch, RuleStore};
pub use types::*;
