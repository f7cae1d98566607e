//!
//! PGLZ compression, the in-core LZ-family method PostgreSQL uses for TOAST
//! and full-page images. Ported from `common/pg_lzcompress.c`. The output
//! format is bit-compatible; the match search uses hash chains like the
//! original but without its tunable strategy knobs (we always compress the
//! way `PGLZ_strategy_always` does).
//!
//! Format: a control byte precedes each group of up to eight items, LSB
//! first. A zero bit means one literal byte. A one bit means a tag: two
//! bytes holding a 3..=273 byte match length and a 1..=4095 byte back
//! reference, with a third byte extending lengths past 17.
//!

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PglzError {
    #[error("corrupt pglz data: {0}")]
    Corrupt(&'static str),
    #[error("pglz data decompressed to {got} bytes, expected {expected}")]
    WrongLength { got: usize, expected: usize },
}

const PGLZ_MAX_OFFSET: usize = 4095;
const PGLZ_MIN_MATCH: usize = 3;
const PGLZ_MAX_MATCH: usize = 273;
const HASH_SIZE: usize = 8192; /* must be a power of 2 */

/// How many chain entries we are willing to look at for one position.
/// The original decays its `good_match` limit instead; a fixed probe depth
/// gives the same ballpark ratios on page data.
const MAX_CHAIN_PROBES: usize = 64;

#[inline]
fn hash_key(src: &[u8], pos: usize) -> usize {
    // pglz_hist_idx over the next four bytes.
    ((src[pos] as usize) << 6
        ^ (src[pos + 1] as usize) << 4
        ^ (src[pos + 2] as usize) << 2
        ^ (src[pos + 3] as usize))
        & (HASH_SIZE - 1)
}

/// Compress `src`. Returns None if the input does not shrink, which the
/// caller stores raw (same contract as pglz_compress returning -1).
pub fn compress(src: &[u8]) -> Option<Vec<u8>> {
    if src.len() < PGLZ_MIN_MATCH + 1 {
        return None;
    }

    let mut head = vec![-1i64; HASH_SIZE];
    let mut prev = vec![-1i64; src.len()];

    let mut out: Vec<u8> = Vec::with_capacity(src.len());
    let mut ctrl_idx: usize = 0;
    let mut ctrl_bit: u32 = 8;

    macro_rules! begin_item {
        () => {
            if ctrl_bit == 8 {
                out.push(0);
                ctrl_idx = out.len() - 1;
                ctrl_bit = 0;
            }
        };
    }

    let insert = |head: &mut [i64], prev: &mut [i64], src: &[u8], pos: usize| {
        if pos + 4 <= src.len() {
            let key = hash_key(src, pos);
            prev[pos] = head[key];
            head[key] = pos as i64;
        }
    };

    let mut dp = 0;
    while dp < src.len() {
        // Abandon compression as soon as it stops paying off.
        if out.len() + 2 >= src.len() {
            return None;
        }

        // Find the longest acceptable match ending no further than
        // PGLZ_MAX_OFFSET behind us.
        let mut best_len = 0usize;
        let mut best_off = 0usize;
        if dp + 4 <= src.len() {
            let mut cand = head[hash_key(src, dp)];
            let mut probes = 0;
            while cand >= 0 && probes < MAX_CHAIN_PROBES {
                let cpos = cand as usize;
                let off = dp - cpos;
                if off > PGLZ_MAX_OFFSET {
                    break;
                }
                let limit = std::cmp::min(PGLZ_MAX_MATCH, src.len() - dp);
                let mut len = 0;
                while len < limit && src[cpos + len] == src[dp + len] {
                    len += 1;
                }
                if len > best_len {
                    best_len = len;
                    best_off = off;
                    if len >= PGLZ_MAX_MATCH {
                        break;
                    }
                }
                cand = prev[cpos];
                probes += 1;
            }
        }

        if best_len >= PGLZ_MIN_MATCH {
            begin_item!();
            out[ctrl_idx] |= 1 << ctrl_bit;
            ctrl_bit += 1;

            let len_code = best_len - PGLZ_MIN_MATCH;
            if len_code >= 15 {
                out.push((0x0f << 4) as u8 | (best_off >> 8) as u8);
                out.push((best_off & 0xff) as u8);
                out.push((best_len - 18) as u8);
            } else {
                out.push(((len_code as u8) << 4) | (best_off >> 8) as u8);
                out.push((best_off & 0xff) as u8);
            }
            for _ in 0..best_len {
                insert(&mut head, &mut prev, src, dp);
                dp += 1;
            }
        } else {
            begin_item!();
            ctrl_bit += 1;
            out.push(src[dp]);
            insert(&mut head, &mut prev, src, dp);
            dp += 1;
        }
    }

    if out.len() < src.len() {
        Some(out)
    } else {
        None
    }
}

/// Decompress `src` into exactly `rawsize` bytes.
pub fn decompress(src: &[u8], rawsize: usize) -> Result<Vec<u8>, PglzError> {
    let mut dst: Vec<u8> = Vec::with_capacity(rawsize);
    let mut sp = 0;

    while sp < src.len() && dst.len() < rawsize {
        let ctrl = src[sp];
        sp += 1;

        for bit in 0..8 {
            if sp >= src.len() || dst.len() >= rawsize {
                break;
            }
            if ctrl & (1 << bit) != 0 {
                if sp + 1 >= src.len() {
                    return Err(PglzError::Corrupt("truncated tag"));
                }
                let mut len = ((src[sp] >> 4) as usize) + 3;
                let off = (((src[sp] & 0x0f) as usize) << 8) | src[sp + 1] as usize;
                sp += 2;
                if len == 18 {
                    if sp >= src.len() {
                        return Err(PglzError::Corrupt("truncated extended length"));
                    }
                    len += src[sp] as usize;
                    sp += 1;
                }
                if off == 0 || off > dst.len() {
                    return Err(PglzError::Corrupt("back reference before start of data"));
                }
                // Byte-at-a-time on purpose: the source of the copy may
                // overlap its destination.
                for _ in 0..len {
                    if dst.len() >= rawsize {
                        return Err(PglzError::Corrupt("match runs past declared size"));
                    }
                    let b = dst[dst.len() - off];
                    dst.push(b);
                }
            } else {
                dst.push(src[sp]);
                sp += 1;
            }
        }
    }

    if dst.len() != rawsize {
        return Err(PglzError::WrongLength {
            got: dst.len(),
            expected: rawsize,
        });
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_repetitive() {
        let src: Vec<u8> = b"abcabcabcabcabcabcabcabc0123456789abcabcabc"
            .iter()
            .copied()
            .collect();
        let compressed = compress(&src).expect("repetitive data should shrink");
        assert!(compressed.len() < src.len());
        let restored = decompress(&compressed, src.len()).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn roundtrip_page_like() {
        // A plausible heap page: a header-ish prefix, repeated tuples, a run
        // of zeroes in the middle.
        let mut src = Vec::new();
        src.extend_from_slice(&[0x12, 0x34, 0x56, 0x78, 0, 0, 0, 0]);
        for i in 0..200u32 {
            src.extend_from_slice(&i.to_le_bytes());
            src.extend_from_slice(b"tuple payload tuple payload");
        }
        src.resize(8192, 0);

        let compressed = compress(&src).unwrap();
        let restored = decompress(&compressed, src.len()).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn incompressible_returns_none() {
        // A xorshift stream has no 3-byte matches within 4k to speak of.
        let mut state = 0x243F6A8885A308D3u64;
        let src: Vec<u8> = (0..512)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                state as u8
            })
            .collect();
        assert!(compress(&src).is_none());
    }

    #[test]
    fn long_matches_use_extended_length() {
        let mut src = vec![0x55u8; 1000];
        src[0] = 1; // avoid the trivial all-same corner being too easy
        let compressed = compress(&src).unwrap();
        assert!(compressed.len() < 40);
        let restored = decompress(&compressed, src.len()).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn corrupt_input_is_rejected() {
        assert!(decompress(&[0x01], 10).is_err());
        // tag pointing before start of output
        assert!(decompress(&[0x01, 0x00, 0x05], 10).is_err());
        // declared size mismatch
        let src = b"aaaaaaaaaaaaaaaaaaaaaaaa";
        let compressed = compress(src).unwrap();
        assert!(decompress(&compressed, src.len() + 1).is_err());
    }
}
