//! The LZO1X-1 compressor: a hash-table match finder over an adaptive
//! skip-distance scan, emitting the M1–M4 match tokens and literal runs of
//! the LZO1X wire format. Uses index arithmetic into slices throughout — no
//! raw pointers.

use crate::config::LZO_WINDOW_SIZE;
use crate::dict::Dict;
use crate::error::CompressError;
use crate::lzo::level::Level;
use crate::lzo::types::*;
use crate::mem::read_le32;

/// Worst-case output size for `len` input bytes: `n + n/16 + 64 + 3`.
pub const fn compress_bound(len: usize) -> usize {
    len + len / 16 + 64 + 3
}

/// Compresses `input` as one independent LZO1X block: own dictionary, own
/// EOF marker, no state carried in or out. Blocks larger than
/// [`LZO_WINDOW_SIZE`] are compressed in successive windows with the
/// dictionary reset between them — this only matters for blocks bigger than
/// 49152 bytes, since the block planner keeps ordinary blocks within that
/// bound anyway.
pub fn compress(level: Level, input: &[u8], max_len: usize) -> Result<Vec<u8>, CompressError> {
    if input.len() > max_len {
        return Err(CompressError::InputTooLarge {
            len: input.len(),
            max: max_len,
        });
    }

    let mut out = Vec::with_capacity(compress_bound(input.len()));
    let mut dict = Dict::new(level);
    let mut pos = 0usize;
    let mut remaining = input.len();
    let mut carry = 0usize;

    while remaining > 20 {
        let win_len = remaining.min(LZO_WINDOW_SIZE);
        dict.reset();
        carry = compress_window(&mut dict, input, pos, win_len, &mut out, carry);
        pos += win_len;
        remaining -= win_len;
    }
    carry += remaining;

    if carry > 0 {
        let ii = input.len() - carry;
        emit_final_literal_run(&mut out, carry);
        out.extend_from_slice(&input[ii..]);
    }

    // EOF marker: an M4-class match with offset 0 and length 1, which no
    // real match ever encodes (offsets are always >= 1).
    out.push(M4_MARKER | 1);
    out.push(0);
    out.push(0);
    Ok(out)
}

/// Encodes one window (at most `LZO_WINDOW_SIZE` bytes) of a block, returning
/// the number of trailing input bytes not yet flushed (to be carried into the
/// next window, or the final literal run).
fn compress_window(
    dict: &mut Dict,
    input: &[u8],
    win_start: usize,
    win_len: usize,
    out: &mut Vec<u8>,
    carry_in: usize,
) -> usize {
    let in_end = win_start + win_len;
    let ip_end = in_end - 20;
    let mut ip = win_start + if carry_in < 4 { 4 - carry_in } else { 0 };
    let mut ii = win_start;
    let mut ti = carry_in;
    // The probe immediately following a successful match skips the
    // adaptive-skip step; every other probe applies it.
    let mut skip_on_entry = true;

    'outer: loop {
        let m_pos_abs;
        loop {
            if skip_on_entry {
                ip += 1 + ((ip - ii) >> 5);
            }
            skip_on_entry = true;
            if ip >= ip_end {
                break 'outer;
            }
            let cand_abs = dict.probe_and_update(input, win_start, ip);
            if read_le32(input, ip) == read_le32(input, cand_abs) {
                m_pos_abs = cand_abs;
                break;
            }
        }

        ii -= ti;
        ti = 0;
        let t = ip - ii;
        if t != 0 {
            emit_literal_run(out, t);
            out.extend_from_slice(&input[ii..ii + t]);
        }

        let mut m_len = MIN_MATCH;
        while ip + m_len < in_end && input[ip + m_len] == input[m_pos_abs + m_len] {
            m_len += 1;
        }

        let m_off = ip - m_pos_abs;
        ip += m_len;
        ii = ip;
        encode_match(out, m_len, m_off);
        skip_on_entry = false;
    }

    in_end - (ii - ti)
}

/// Emits the length prefix for a literal run of `t` bytes (t >= 1) that
/// precedes a match; does not emit the literal bytes themselves. When `t <=
/// 3`, the count is packed into the low 2 bits of the previous match's
/// offset-low byte instead of a standalone token (`out` must already hold at
/// least 2 bytes in that case — guaranteed here because reaching a match with
/// `t <= 3` implies at least one earlier match or the mandatory 4-byte lead-in
/// skip already advanced `ip` past the window start).
fn emit_literal_run(out: &mut Vec<u8>, t: usize) {
    if t <= 3 {
        let n = out.len();
        debug_assert!(n >= 2);
        if n >= 2 {
            out[n - 2] |= t as u8;
        }
    } else if t <= 18 {
        out.push((t - 3) as u8);
    } else {
        let mut tt = t - 18;
        out.push(0);
        while tt > 255 {
            tt -= 255;
            out.push(0);
        }
        out.push(tt as u8);
    }
}

/// Emits the final, unmatched literal run at the end of a block. Unlike
/// `emit_literal_run`, this run may be the block's very first (and only)
/// token, in which case it gets the special "first literal run" encoding the
/// decompressor recognizes via a leading byte > 17.
fn emit_final_literal_run(out: &mut Vec<u8>, t: usize) {
    if out.is_empty() && t <= 238 {
        out.push((17 + t) as u8);
    } else if t <= 3 {
        let n = out.len();
        debug_assert!(n >= 2);
        if n >= 2 {
            out[n - 2] |= t as u8;
        }
    } else if t <= 18 {
        out.push((t - 3) as u8);
    } else {
        let mut tt = t - 18;
        out.push(0);
        while tt > 255 {
            tt -= 255;
            out.push(0);
        }
        out.push(tt as u8);
    }
}

fn encode_match(out: &mut Vec<u8>, m_len: usize, m_off: usize) {
    if m_len <= M2_MAX_LEN && m_off <= M2_MAX_OFFSET {
        let off = m_off - 1;
        out.push((((m_len - 1) << 5) | ((off & 7) << 2)) as u8);
        out.push((off >> 3) as u8);
    } else if m_off <= M3_MAX_OFFSET {
        let off = m_off - 1;
        if m_len <= M3_MAX_LEN {
            out.push(M3_MARKER | (m_len - 2) as u8);
        } else {
            let mut ml = m_len - M3_MAX_LEN;
            out.push(M3_MARKER);
            while ml > 255 {
                ml -= 255;
                out.push(0);
            }
            out.push(ml as u8);
        }
        out.push((off << 2) as u8);
        out.push((off >> 6) as u8);
    } else {
        let off = m_off - 0x4000;
        if m_len <= M4_MAX_LEN {
            out.push(M4_MARKER | (((off >> 11) & 8) as u8) | (m_len - 2) as u8);
        } else {
            let mut ml = m_len - M4_MAX_LEN;
            out.push(M4_MARKER | (((off >> 11) & 8) as u8));
            while ml > 255 {
                ml -= 255;
                out.push(0);
            }
            out.push(ml as u8);
        }
        out.push((off << 2) as u8);
        out.push((off >> 6) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lzo::decompress::decompress_safe;

    fn roundtrip(level: Level, input: &[u8]) {
        let compressed = compress(level, input, input.len().max(1) + 1024).unwrap();
        let out = decompress_safe(&compressed, input.len()).unwrap();
        assert_eq!(out, input, "level {level:?} roundtrip mismatch");
    }

    #[test]
    fn empty_input_is_just_eof() {
        let out = compress(Level::X, &[], 64).unwrap();
        assert_eq!(out, vec![0x11, 0x00, 0x00]);
    }

    #[test]
    fn one_byte_input() {
        roundtrip(Level::X, &[0x42]);
    }

    #[test]
    fn all_zeros_compresses_well() {
        let input = vec![0u8; 4096];
        let compressed = compress(Level::X, &input, input.len() + 1024).unwrap();
        assert!(compressed.len() < input.len() / 4);
        roundtrip(Level::X, &input);
    }

    #[test]
    fn roundtrips_across_all_levels() {
        let input: Vec<u8> = (0..5000).map(|i| (i % 251) as u8).collect();
        for level in [Level::L, Level::K, Level::X, Level::O] {
            roundtrip(level, &input);
        }
    }

    #[test]
    fn random_like_input_roundtrips() {
        // A simple xorshift-style generator avoids reaching for a rand crate
        // just for test fixtures; deterministic across runs.
        let mut state: u32 = 0x2545F491;
        let mut input = Vec::with_capacity(65536);
        for _ in 0..65536 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            input.push((state & 0xff) as u8);
        }
        roundtrip(Level::X, &input);
    }

    #[test]
    fn input_exceeding_max_len_is_rejected() {
        let input = vec![0u8; 10];
        let err = compress(Level::X, &input, 5).unwrap_err();
        assert_eq!(
            err,
            CompressError::InputTooLarge { len: 10, max: 5 }
        );
    }

    #[test]
    fn spans_multiple_internal_windows() {
        // Exercise the dictionary-reset-per-window path with a block bigger
        // than LZO_WINDOW_SIZE.
        let input: Vec<u8> = (0..130_000).map(|i| ((i * 7) % 253) as u8).collect();
        roundtrip(Level::X, &input);
    }
}
