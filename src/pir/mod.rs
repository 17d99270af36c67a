//! The PIR protocol surface: database preprocessing, client query encoding,
//! the server answer path, response decoding.

pub mod answer;
pub mod bsgs;
pub mod encode_db;
pub mod error;
pub mod extract;
pub mod packing;
pub mod query;

pub use answer::answer;
pub use bsgs::{baby_step_table, matrix_vector_mul_bsgs, reorient_ciphers};
pub use encode_db::{preprocess_database, DbBlob};
pub use error::Result;
pub use extract::{decode_kernel_output, decode_response};
pub use packing::pack_rlwes;
pub use query::{encode_query, encode_rgsw_query};
