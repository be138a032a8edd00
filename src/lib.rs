//! traitconf: typed, validated, observable attributes and layered
//! configuration.
//!
//! A [`Class`](has_traits::Class) declares named traits, each a
//! [`TraitType`](trait_types::TraitType) that validates assignments and
//! supplies a default. Instances ([`HasTraits`](has_traits::HasTraits))
//! notify observers of changes, run cross-validators, batch notifications
//! in hold regions, and take their settings from a
//! [`Config`](config::Config) tree built by the file and command-line
//! loaders.

pub mod config;
pub mod deprecation;
pub mod describe;
pub mod eventful;
pub mod has_traits;
pub mod sentinel;
pub mod trait_types;
pub mod value;
