//! Client-side response decoding.

use crate::math::crt::{mod_inverse, RnsContext};
use crate::math::modular::ModArith;
use crate::params::PirParams;
use crate::rlwe::enc::{decode_rounded, decrypt_phase};
use crate::rlwe::types::{RlweCiphertext, RlweSecretKey};

/// Decodes a packed response: decrypt, round by p/Q, undo the packing
/// tree's r-fold scaling.
///
/// Position r·m + k of the result holds matrix k's selected column at row
/// r·m + w, where w was the RGSW query's packing row.
pub fn decode_response(
    params: &PirParams,
    sk: &RlweSecretKey,
    response: &RlweCiphertext,
    ctx: &RnsContext,
) -> Vec<u64> {
    let phase = decrypt_phase(response, sk, ctx);
    let rounded = decode_rounded(&phase, params.p);
    let r_inv = mod_inverse(params.r as u64 % params.p, params.p);
    rounded
        .into_iter()
        .map(|v| ModArith::mul(v, r_inv, params.p))
        .collect()
}

/// Decodes one unpacked kernel output (used by tests and the unpacked
/// serving path): decrypt and round, no r-fold scaling involved.
pub fn decode_kernel_output(
    params: &PirParams,
    sk: &RlweSecretKey,
    ct: &RlweCiphertext,
    ctx: &RnsContext,
) -> Vec<u64> {
    decode_rounded(&decrypt_phase(ct, sk, ctx), params.p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::poly::{Moduli, Poly};
    use crate::math::sampler::GaussianSampler;
    use crate::params::ParamSet;
    use crate::rlwe::enc::encrypt;

    #[test]
    fn test_decode_undoes_r_scaling() {
        let params = PirParams::new(ParamSet::N256, 4, 8).unwrap();
        let ctx = params.build_context();
        let m = Moduli::for_big_q(&ctx);
        let mut sampler = GaussianSampler::from_seed(3.2, [91u8; 32]);
        let sk = crate::rlwe::types::RlweSecretKey::generate(&ctx, &mut sampler);

        let values: Vec<u64> = (0..256u64).map(|i| (i * 3) % params.p).collect();
        let scaled: Vec<u64> = values
            .iter()
            .map(|&v| {
                let x = (v as u128 * params.r as u128 * params.delta() as u128)
                    % params.big_q() as u128;
                x as u64
            })
            .collect();
        let msg = Poly::from_coeffs(scaled, m);
        let ct = encrypt(&sk, &msg, &ctx, &mut sampler);

        let decoded = decode_response(&params, &sk, &ct, &ctx);
        assert_eq!(decoded, values);
    }
}
