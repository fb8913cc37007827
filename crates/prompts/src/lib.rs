//! Prompt artifacts for SPCF: template rendering and the designer exchange.

pub mod artifact;
pub mod designer;
pub mod seed_doc;
pub mod templates;

pub use designer::{DesignerExchange, ProcessedSeed};
pub use templates::{Substitutions, TemplateRenderer};
