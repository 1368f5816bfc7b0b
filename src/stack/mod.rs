//! Technology identifiers.
//!
//! `TechnologyId` names every stack component the generator knows about:
//! runtimes, frameworks, databases and proxies. Built-in identifiers are
//! enum variants; identifiers introduced by user template directories are
//! carried as `TechnologyId::Custom`.

#[macro_use]
pub mod id_enum_macro;

pub mod technology_id;

pub use technology_id::TechnologyId;
