//! Raw ring automorphisms on ciphertexts.
//!
//! τ_t maps (a, b) to (τ_t(a), τ_t(b)); the result is valid under the mapped
//! secret τ_t(s) and needs key switching (see [`crate::ks`]) to return to s.
//! In NTT form this is a pure slot permutation; in coefficient form an index
//! map with negacyclic signs.

use crate::math::permute::{automorphism_coeff, permute_ntt, PermTables};
use crate::math::poly::PolyForm;

use super::types::RlweCiphertext;

/// Applies τ_t to both parts of a ciphertext, in whichever form it is in.
pub fn automorphism_ciphertext(
    ct: &RlweCiphertext,
    t: usize,
    tables: &PermTables,
) -> RlweCiphertext {
    match ct.form() {
        PolyForm::Ntt => {
            let perm = tables.permutation(t);
            RlweCiphertext::from_parts(permute_ntt(&ct.a, &perm), permute_ntt(&ct.b, &perm))
        }
        PolyForm::Coeff => RlweCiphertext::from_parts(
            automorphism_coeff(&ct.a, t),
            automorphism_coeff(&ct.b, t),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::crt::RnsContext;
    use crate::math::poly::{Moduli, Poly};
    use crate::math::sampler::GaussianSampler;
    use crate::rlwe::enc::{decrypt_phase, encrypt};
    use crate::rlwe::types::RlweSecretKey;

    const Q1: u64 = 268369921;
    const Q2: u64 = 249561089;
    const PBS: u64 = 16760833;

    #[test]
    fn test_identity_automorphism() {
        let ctx = RnsContext::new(256, Q1, Q2, PBS);
        let tables = PermTables::new(256);
        let m = Moduli::for_big_q(&ctx);
        let mut sampler = GaussianSampler::from_seed(3.2, [21u8; 32]);
        let ct = RlweCiphertext::from_parts(
            Poly::random(256, m, &mut sampler),
            Poly::random(256, m, &mut sampler),
        );
        let out = automorphism_ciphertext(&ct, 1, &tables);
        assert_eq!(out, ct);
    }

    #[test]
    fn test_decrypts_under_mapped_secret() {
        // τ_t(ct) under τ_t(s) carries τ_t(msg).
        let ctx = RnsContext::new(256, Q1, Q2, PBS);
        let tables = PermTables::new(256);
        let m = Moduli::for_big_q(&ctx);
        let mut sampler = GaussianSampler::from_seed(3.2, [22u8; 32]);
        let sk = RlweSecretKey::generate(&ctx, &mut sampler);
        let t = tables.pow5(3);

        let delta = ctx.big_q() / 7681;
        let msg = Poly::from_coeffs((0..256u64).map(|i| i % 7681 * delta).collect(), m);
        let ct = encrypt(&sk, &msg, &ctx, &mut sampler);
        let ct_auto = automorphism_ciphertext(&ct, t, &tables);

        let mapped_signed: Vec<i64> = {
            let mapped = automorphism_coeff(&sk.poly, t);
            (0..256)
                .map(|i| crate::math::modular::ModArith::to_signed(mapped.coeff(i), ctx.big_q()))
                .collect()
        };
        let sk_mapped = RlweSecretKey::from_signed(&mapped_signed, &ctx);

        let phase = decrypt_phase(&ct_auto, &sk_mapped, &ctx);
        let expected = automorphism_coeff(&msg, t);
        let diff = &phase - &expected;
        assert!(diff.linf_norm() < delta / 4, "noise {}", diff.linf_norm());
    }

    #[test]
    fn test_ntt_and_coeff_paths_agree() {
        let ctx = RnsContext::new(256, Q1, Q2, PBS);
        let tables = PermTables::new(256);
        let m = Moduli::for_big_q(&ctx);
        let mut sampler = GaussianSampler::from_seed(3.2, [23u8; 32]);
        let ct = RlweCiphertext::from_parts(
            Poly::random(256, m, &mut sampler),
            Poly::random(256, m, &mut sampler),
        );
        let t = tables.pow5(17);

        let via_coeff = {
            let mut out = automorphism_ciphertext(&ct, t, &tables);
            out.to_ntt(&ctx);
            out
        };
        let via_ntt = {
            let mut c = ct.clone();
            c.to_ntt(&ctx);
            automorphism_ciphertext(&c, t, &tables)
        };
        assert_eq!(via_coeff, via_ntt);
    }
}
