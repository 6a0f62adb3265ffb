pub mod phase;
pub mod protocol;
pub mod reconciler;
pub mod view;
