//! Key-switching: key material and the automorphism evaluation paths.

pub mod setup;
pub mod switch;

pub use setup::{AutoKey, BsgsAutoKey, KsKey, KsKeyRns, PackingKey};
pub use switch::{eval_auto, eval_auto_fold, eval_auto_rns};
