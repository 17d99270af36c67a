//! RGSW ciphertexts, gadget decomposition and the external product.

pub mod external_product;
pub mod types;

pub use external_product::external_product;
pub use types::{gadget_decompose, GadgetVector, RgswCiphertext};
