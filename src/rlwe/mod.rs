//! RLWE keys, ciphertexts, encryption and raw automorphisms.

pub mod automorphism;
pub mod enc;
pub mod types;

pub use automorphism::automorphism_ciphertext;
pub use enc::{decode_rounded, decrypt, decrypt_phase, encrypt, encrypt_rns, fold_rns};
pub use types::{RlweCiphertext, RlweSecretKey, RnsRlweCiphertext};
