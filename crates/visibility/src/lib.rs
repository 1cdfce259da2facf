pub mod controller;
pub mod engine;
pub mod keys;
pub mod matcher;
pub mod page;
pub mod styles;

pub use controller::{ToggleOutcome, VisibilityController, VisibilityStatus};
pub use engine::VisibilityEngine;
pub use keys::{HoldGesture, HoldSignal, KeyCombo, KeyEvent, KeyPhase, KeyTarget, Modifiers};
pub use matcher::{PriceMatcher, Selector};
pub use page::{Document, ElementId, ElementInfo, ElementSpec, Page};
pub use styles::OriginalStyles;
