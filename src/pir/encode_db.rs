//! Database preprocessing: from r plaintext N × N/2 matrices to the
//! CRT-interleaved, 64-byte-aligned blob the kernel streams.
//!
//! Pipeline per matrix: balanced lift of each entry mod Q, forward NTT of
//! every column polynomial over the (q1, q2) channels, then the
//! BSGS-diagonal gather in the evaluation domain. Row (i_b, i_g) holds, at
//! the slot whose logical position is (orbit, m), the evaluation of column
//! (m + i_b mod N/2) at logical position (m − N1·i_g mod N/2) of the same
//! orbit: the Halevi-Shoup diagonal i_b + N1·i_g pre-rotated by the giant
//! step, so the kernel's post-rotation reassembles it exactly.
//!
//! Blob layout: word pairs [q1, q2] adjacent per slot, slots contiguous per
//! row, rows ordered (i_g outer, i_b inner), the r matrices concatenated.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use tracing::{debug, info};

use crate::math::crt::RnsContext;
use crate::math::permute::PermTables;
use crate::params::PirParams;

use super::error::{pir_err, Result};

/// 64-byte-aligned u64 buffer backing a [`DbBlob`].
pub struct AlignedU64Buf {
    ptr: NonNull<u64>,
    len: usize,
}

// The buffer is plain memory with unique ownership.
unsafe impl Send for AlignedU64Buf {}
unsafe impl Sync for AlignedU64Buf {}

impl AlignedU64Buf {
    /// Allocates `len` zeroed words aligned to 64 bytes.
    pub fn new_zeroed(len: usize) -> Self {
        assert!(len > 0, "empty blob");
        let layout = Layout::from_size_align(len * 8, 64).expect("invalid layout");
        let raw = unsafe { alloc_zeroed(layout) } as *mut u64;
        let ptr = NonNull::new(raw).expect("allocation failed");
        Self { ptr, len }
    }
}

impl Drop for AlignedU64Buf {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.len * 8, 64).expect("invalid layout");
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
    }
}

impl Deref for AlignedU64Buf {
    type Target = [u64];
    fn deref(&self) -> &[u64] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedU64Buf {
    fn deref_mut(&mut self) -> &mut [u64] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

/// Opaque handle over the preprocessed database: an aligned flat array of
/// r · N · (N/2) · 2 words plus the layout metadata the kernel needs.
pub struct DbBlob {
    buf: AlignedU64Buf,
    n: usize,
    n1: usize,
    n2: usize,
    r: usize,
}

impl DbBlob {
    /// Ring dimension.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn n1(&self) -> usize {
        self.n1
    }

    pub fn n2(&self) -> usize {
        self.n2
    }

    /// Number of packed matrices.
    pub fn r(&self) -> usize {
        self.r
    }

    /// Total length in words.
    pub fn len(&self) -> usize {
        self.buf.len
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len == 0
    }

    /// The 2N interleaved words of row (i_b, i_g) of matrix k.
    #[inline]
    pub fn row(&self, k: usize, i_g: usize, i_b: usize) -> &[u64] {
        let start = (((k * self.n2 + i_g) * self.n1) + i_b) * self.n * 2;
        &self.buf[start..start + self.n * 2]
    }

    /// The whole backing slice (the kernel indexes it flat).
    pub fn words(&self) -> &[u64] {
        &self.buf
    }
}

/// Encodes `matrices` (r of shape N × N/2, entries < p) into the blob.
///
/// # Errors
///
/// Rejects a matrix count different from r, wrong shapes, and out-of-range
/// entries.
pub fn preprocess_database(
    params: &PirParams,
    matrices: &[Vec<Vec<u64>>],
    ctx: &RnsContext,
    tables: &PermTables,
) -> Result<DbBlob> {
    let n = params.n;
    let half = n / 2;

    if matrices.len() != params.r {
        return Err(pir_err!(
            "expected {} matrices, got {}",
            params.r,
            matrices.len()
        ));
    }
    for (k, m) in matrices.iter().enumerate() {
        if m.len() != n || m.iter().any(|row| row.len() != half) {
            return Err(pir_err!("matrix {k} is not {n} x {half}"));
        }
        if m.iter().any(|row| row.iter().any(|&v| v >= params.p)) {
            return Err(pir_err!("matrix {k} has entries >= p"));
        }
    }

    info!(
        r = params.r,
        n,
        n1 = params.n1,
        words = params.r * n * half * 2,
        "preprocessing database"
    );

    let (q1, q2) = (ctx.q1(), ctx.q2());
    let p = params.p;
    let mut blob = AlignedU64Buf::new_zeroed(params.r * n * half * 2);

    for (k, matrix) in matrices.iter().enumerate() {
        // Column polynomials in evaluation form, one plane per channel.
        let mut col_ntt = vec![vec![0u64; 2 * n]; half];
        for (c, planes) in col_ntt.iter_mut().enumerate() {
            for row in 0..n {
                let v = matrix[row][c];
                // Balanced representative of the mod-p entry.
                let signed = if v > p / 2 { v as i64 - p as i64 } else { v as i64 };
                planes[row] = crate::math::modular::ModArith::from_signed(signed, q1);
                planes[n + row] = crate::math::modular::ModArith::from_signed(signed, q2);
            }
            let (lo, hi) = planes.split_at_mut(n);
            ctx.ntt_q1().forward(lo);
            ctx.ntt_q2().forward(hi);
        }

        for i_g in 0..params.n2 {
            let rot = params.n1 * i_g % half;
            for i_b in 0..params.n1 {
                let base = (((k * params.n2 + i_g) * params.n1) + i_b) * n * 2;
                for slot in 0..n {
                    let (neg, m) = tables.logical_of_slot(slot);
                    let col = (m + i_b) % half;
                    let src = tables.slot_of_logical(neg, (m + half - rot) % half);
                    blob[base + 2 * slot] = col_ntt[col][src];
                    blob[base + 2 * slot + 1] = col_ntt[col][n + src];
                }
            }
        }
        debug!(matrix = k, "matrix encoded");
    }

    Ok(DbBlob {
        buf: blob,
        n,
        n1: params.n1,
        n2: params.n2,
        r: params.r,
    })
}
