//! Visibility-triggered image loading with format negotiation

pub mod loader;
pub mod visibility;

pub use loader::{
    ImageLoadState, ImageView, LazyImage, LazyImageOptions, SourceAttempt, SourcePlan,
};
pub use visibility::{Rect, VisibilityGate};
