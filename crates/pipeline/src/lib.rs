//! Pipeline orchestration for SPCF.
//!
//! A [`Factory`] is built explicitly from a validated config and an audit
//! store, then runs the named onboarding and seed pipelines.

pub mod factory;
mod step;

pub use factory::{ContextFiles, DesignerHandoff, Factory, FullOnboarding, Onboarded, pipelines};
