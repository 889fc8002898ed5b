//! gecko-import - Import a manifested subset of the Gecko tree into gecko-media
//!
//! gecko-media builds Gecko's media stack outside of Gecko. Its sources are a
//! copy of selected Gecko files plus a hand-maintained glue layer. This crate
//! refreshes that copy from a Gecko checkout.
//!
//! ## Modules
//!
//! - [`config`]: Tool configuration and parsing
//! - [`manifest`]: JSON manifests of the files to import
//! - [`verify`]: Existence checks run before anything is copied
//! - [`copy`]: Copying into `include/` and `src/`
//! - [`prefs`]: Media preference filtering with conditional block cleanup
//! - [`unified`]: Unified translation unit generation
//! - [`duplicates`]: Filename collisions with the glue layer
//! - [`vcs`], [`revision`], [`glue_diff`]: Upstream diffs of glue files
//! - [`importer`]: The complete import workflow

pub mod config;
pub mod copy;
pub mod duplicates;
pub mod glue_diff;
pub mod importer;
pub mod manifest;
pub mod platform;
pub mod prefs;
pub mod revision;
pub mod unified;
pub mod vcs;
pub mod verify;

pub use config::Config;
pub use importer::{ImportOutcome, Importer};
pub use manifest::Manifests;
pub use vcs::Vcs;
