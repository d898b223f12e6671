//! Domain services.

pub mod invitation;
