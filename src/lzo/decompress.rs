//! The LZO1X decompressor, in its safe (bounds-checked) and fast
//! (unchecked) variants.

use crate::error::DecodeError;
use crate::lzo::types::M2_MAX_OFFSET;
use crate::mem::copy_overlapping;

enum Step {
    TopOfLoop,
    FirstLiteralRun,
    Match(usize),
    MatchNext(usize),
}

/// After a match copy, the trailing 2-bit literal count packed into the byte
/// two positions back either calls for a fresh control byte at full
/// top-of-loop scope (`None`) or names how many plain literal bytes follow
/// before the next match marker (`Some(t)`, 1..=3).
fn trailing_literal_count(input: &[u8], ip: usize) -> Result<Option<usize>, DecodeError> {
    if ip < 2 {
        return Err(DecodeError::InputOverrun);
    }
    let t = (input[ip - 2] & 3) as usize;
    Ok(if t == 0 { None } else { Some(t) })
}

fn finish(ip: usize, in_len: usize, out: Vec<u8>) -> Result<Vec<u8>, DecodeError> {
    if ip == in_len {
        Ok(out)
    } else if ip < in_len {
        Err(DecodeError::InputNotConsumed)
    } else {
        Err(DecodeError::InputOverrun)
    }
}

/// Decodes a single LZO1X block with full bounds checking. `max_out_len`
/// bounds the output (normally the block's known original size); every
/// literal copy and match copy is checked against both the input and output
/// bounds before it happens, and every match offset is checked against the
/// output produced so far.
pub fn decompress_safe(input: &[u8], max_out_len: usize) -> Result<Vec<u8>, DecodeError> {
    let in_len = input.len();
    let mut out = Vec::with_capacity(max_out_len);
    let mut ip = 0usize;

    if ip >= in_len {
        return Err(DecodeError::InputOverrun);
    }

    let mut step = if input[ip] > 17 {
        let t = (input[ip] - 17) as usize;
        ip += 1;
        if t < 4 {
            Step::MatchNext(t)
        } else {
            if out.len() + t > max_out_len {
                return Err(DecodeError::OutputOverrun);
            }
            if ip + t > in_len {
                return Err(DecodeError::InputOverrun);
            }
            out.extend_from_slice(&input[ip..ip + t]);
            ip += t;
            Step::FirstLiteralRun
        }
    } else {
        Step::TopOfLoop
    };

    loop {
        step = match step {
            Step::TopOfLoop => {
                if ip + 1 > in_len {
                    return Err(DecodeError::InputOverrun);
                }
                let mut t = input[ip] as usize;
                ip += 1;
                if t >= 16 {
                    Step::Match(t)
                } else {
                    if t == 0 {
                        loop {
                            if ip >= in_len {
                                return Err(DecodeError::InputOverrun);
                            }
                            if input[ip] != 0 {
                                break;
                            }
                            t += 255;
                            ip += 1;
                        }
                        t += 15 + input[ip] as usize;
                        ip += 1;
                    }
                    if out.len() + t + 3 > max_out_len {
                        return Err(DecodeError::OutputOverrun);
                    }
                    if ip + t + 3 > in_len {
                        return Err(DecodeError::InputOverrun);
                    }
                    out.extend_from_slice(&input[ip..ip + 3]);
                    ip += 3;
                    out.extend_from_slice(&input[ip..ip + t]);
                    ip += t;
                    Step::FirstLiteralRun
                }
            }

            Step::FirstLiteralRun => {
                if ip + 1 > in_len {
                    return Err(DecodeError::InputOverrun);
                }
                let t = input[ip] as usize;
                ip += 1;
                if t >= 16 {
                    Step::Match(t)
                } else {
                    if ip + 1 > in_len {
                        return Err(DecodeError::InputOverrun);
                    }
                    let delta = (1 + M2_MAX_OFFSET) + (t >> 2) + ((input[ip] as usize) << 2);
                    ip += 1;
                    let m_pos = out
                        .len()
                        .checked_sub(delta)
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    if out.len() + 3 > max_out_len {
                        return Err(DecodeError::OutputOverrun);
                    }
                    copy_overlapping(&mut out, m_pos, 3);
                    match trailing_literal_count(input, ip)? {
                        None => Step::TopOfLoop,
                        Some(t) => Step::MatchNext(t),
                    }
                }
            }

            Step::Match(t) => {
                if t >= 64 {
                    if ip + 1 > in_len {
                        return Err(DecodeError::InputOverrun);
                    }
                    let extra = (t >> 2) & 7;
                    let delta = 1 + extra + ((input[ip] as usize) << 3);
                    ip += 1;
                    let m_pos = out
                        .len()
                        .checked_sub(delta)
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    let copy_len = 2 + ((t >> 5) - 1);
                    if out.len() + copy_len > max_out_len {
                        return Err(DecodeError::OutputOverrun);
                    }
                    copy_overlapping(&mut out, m_pos, copy_len);
                    match trailing_literal_count(input, ip)? {
                        None => Step::TopOfLoop,
                        Some(t) => Step::MatchNext(t),
                    }
                } else if t >= 32 {
                    let mut tt = t & 31;
                    if tt == 0 {
                        loop {
                            if ip >= in_len {
                                return Err(DecodeError::InputOverrun);
                            }
                            if input[ip] != 0 {
                                break;
                            }
                            tt += 255;
                            ip += 1;
                        }
                        tt += 31 + input[ip] as usize;
                        ip += 1;
                    }
                    if ip + 2 > in_len {
                        return Err(DecodeError::InputOverrun);
                    }
                    let delta = 1 + (input[ip] as usize >> 2) + ((input[ip + 1] as usize) << 6);
                    ip += 2;
                    let m_pos = out
                        .len()
                        .checked_sub(delta)
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    let copy_len = 2 + tt;
                    if out.len() + copy_len > max_out_len {
                        return Err(DecodeError::OutputOverrun);
                    }
                    copy_overlapping(&mut out, m_pos, copy_len);
                    match trailing_literal_count(input, ip)? {
                        None => Step::TopOfLoop,
                        Some(t) => Step::MatchNext(t),
                    }
                } else if t >= 16 {
                    let mut tt = t & 7;
                    let mut base = out
                        .len()
                        .checked_sub((t & 8) << 11)
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    if tt == 0 {
                        loop {
                            if ip >= in_len {
                                return Err(DecodeError::InputOverrun);
                            }
                            if input[ip] != 0 {
                                break;
                            }
                            tt += 255;
                            ip += 1;
                        }
                        tt += 7 + input[ip] as usize;
                        ip += 1;
                    }
                    if ip + 2 > in_len {
                        return Err(DecodeError::InputOverrun);
                    }
                    base = base
                        .checked_sub((input[ip] as usize >> 2) + ((input[ip + 1] as usize) << 6))
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    ip += 2;
                    if base == out.len() {
                        return finish(ip, in_len, out);
                    }
                    let m_pos = base
                        .checked_sub(0x4000)
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    let copy_len = 2 + tt;
                    if out.len() + copy_len > max_out_len {
                        return Err(DecodeError::OutputOverrun);
                    }
                    copy_overlapping(&mut out, m_pos, copy_len);
                    match trailing_literal_count(input, ip)? {
                        None => Step::TopOfLoop,
                        Some(t) => Step::MatchNext(t),
                    }
                } else {
                    if ip + 1 > in_len {
                        return Err(DecodeError::InputOverrun);
                    }
                    let delta = 1 + (t >> 2) + ((input[ip] as usize) << 2);
                    ip += 1;
                    let m_pos = out
                        .len()
                        .checked_sub(delta)
                        .ok_or(DecodeError::LookbehindOverrun)?;
                    if out.len() + 2 > max_out_len {
                        return Err(DecodeError::OutputOverrun);
                    }
                    copy_overlapping(&mut out, m_pos, 2);
                    match trailing_literal_count(input, ip)? {
                        None => Step::TopOfLoop,
                        Some(t) => Step::MatchNext(t),
                    }
                }
            }

            Step::MatchNext(t) => {
                if out.len() + t > max_out_len {
                    return Err(DecodeError::OutputOverrun);
                }
                if ip + t + 3 > in_len {
                    return Err(DecodeError::InputOverrun);
                }
                out.push(input[ip]);
                ip += 1;
                if t > 1 {
                    out.push(input[ip]);
                    ip += 1;
                    if t > 2 {
                        out.push(input[ip]);
                        ip += 1;
                    }
                }
                let t2 = input[ip] as usize;
                ip += 1;
                Step::Match(t2)
            }
        };
    }
}

/// Unchecked variant for trusted input (e.g. a block whose length the
/// container's length table already accounts for): no input/output/
/// lookbehind bounds checks, raw pointer arithmetic throughout. `out` must
/// already have at least `max_out_len` bytes of spare capacity reserved by
/// the caller; this function writes through raw pointers into that spare
/// capacity and sets the final length itself.
///
/// # Safety
/// `input` must be a well-formed LZO1X stream whose decoded length is at
/// most `max_out_len`, and every match offset in it must reference bytes
/// already written within this same call. Feeding it adversarial or corrupt
/// input is undefined behavior — callers that cannot make this guarantee
/// must use [`decompress_safe`] instead.
pub unsafe fn decompress_fast(input: &[u8], max_out_len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(max_out_len);
    let out_base = out.as_mut_ptr();
    let mut op = out_base;
    let in_base = input.as_ptr();
    let mut ip = in_base;

    macro_rules! byte {
        () => {{
            let b = *ip;
            ip = ip.add(1);
            b
        }};
    }
    macro_rules! put {
        ($b:expr) => {{
            *op = $b;
            op = op.add(1);
        }};
    }
    macro_rules! copy_match {
        ($m_pos:expr, $extra:expr) => {{
            let mut mp = $m_pos;
            put!(*mp);
            mp = mp.add(1);
            put!(*mp);
            mp = mp.add(1);
            let mut n = $extra;
            loop {
                put!(*mp);
                mp = mp.add(1);
                if n == 0 {
                    break;
                }
                n -= 1;
            }
        }};
    }

    let mut t: usize;
    if byte!() > 17 {
        t = (*in_base - 17) as usize;
        ip = in_base.add(1);
        if t >= 4 {
            loop {
                put!(byte!());
                t -= 1;
                if t == 0 {
                    break;
                }
            }
            t = byte!() as usize;
            if t < 16 {
                let m_pos = op.sub(1 + M2_MAX_OFFSET).sub(t >> 2).sub((byte!() as usize) << 2);
                put!(*m_pos);
                let m_pos = m_pos.add(1);
                put!(*m_pos);
                let m_pos = m_pos.add(1);
                put!(*m_pos);
                t = (*ip.sub(2) & 3) as usize;
                if t != 0 {
                    loop {
                        put!(byte!());
                        t -= 1;
                        if t == 0 {
                            break;
                        }
                    }
                    t = byte!() as usize;
                }
                // t == 0: no trailing literals; fall through with t == 0 so the
                // main loop reads a fresh control byte at full top-of-loop scope.
            }
        } else {
            // t in 0..3 with no preceding literal copy at all.
        }
    } else {
        ip = in_base;
        t = 0;
    }

    loop {
        if t < 16 {
            // Fresh control byte read at top of the standard loop.
            t = byte!() as usize;
            if t >= 16 {
                // fallthrough to match dispatch below
            } else if t == 0 {
                loop {
                    let b = byte!();
                    if b != 0 {
                        ip = ip.sub(1);
                        break;
                    }
                    t += 255;
                }
                t += 15 + byte!() as usize;
                for _ in 0..t {
                    put!(byte!());
                }
                t = byte!() as usize;
                if t < 16 {
                    let m_pos = op
                        .sub(1 + M2_MAX_OFFSET)
                        .sub(t >> 2)
                        .sub((byte!() as usize) << 2);
                    copy_match!(m_pos, 0);
                    t = (*ip.sub(2) & 3) as usize;
                    if t != 0 {
                        loop {
                            put!(byte!());
                            t -= 1;
                            if t == 0 {
                                break;
                            }
                        }
                        t = byte!() as usize;
                    }
                }
                continue;
            } else {
                for _ in 0..t {
                    put!(byte!());
                }
                t = byte!() as usize;
                if t < 16 {
                    let m_pos = op
                        .sub(1 + M2_MAX_OFFSET)
                        .sub(t >> 2)
                        .sub((byte!() as usize) << 2);
                    copy_match!(m_pos, 0);
                    t = (*ip.sub(2) & 3) as usize;
                    if t != 0 {
                        loop {
                            put!(byte!());
                            t -= 1;
                            if t == 0 {
                                break;
                            }
                        }
                        t = byte!() as usize;
                    }
                }
                continue;
            }
        }

        if t >= 64 {
            let m_pos = op.sub(1).sub((t >> 2) & 7).sub((byte!() as usize) << 3);
            let extra = (t >> 5) - 1;
            copy_match!(m_pos, extra);
        } else if t >= 32 {
            let mut tt = t & 31;
            if tt == 0 {
                loop {
                    let b = byte!();
                    if b != 0 {
                        ip = ip.sub(1);
                        break;
                    }
                    tt += 255;
                }
                tt += 31 + byte!() as usize;
            }
            let lo = byte!() as usize;
            let hi = byte!() as usize;
            let m_pos = op.sub(1).sub((lo >> 2) + (hi << 6));
            copy_match!(m_pos, tt);
        } else {
            let mut tt = t & 7;
            let mut base = op.sub((t & 8) << 11);
            if tt == 0 {
                loop {
                    let b = byte!();
                    if b != 0 {
                        ip = ip.sub(1);
                        break;
                    }
                    tt += 255;
                }
                tt += 7 + byte!() as usize;
            }
            let lo = byte!() as usize;
            let hi = byte!() as usize;
            base = base.sub((lo >> 2) + (hi << 6));
            if base == op {
                out.set_len(op as usize - out_base as usize);
                return out;
            }
            let m_pos = base.sub(0x4000);
            copy_match!(m_pos, tt);
        }

        t = (*ip.sub(2) & 3) as usize;
        if t != 0 {
            loop {
                put!(byte!());
                t -= 1;
                if t == 0 {
                    break;
                }
            }
            t = byte!() as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lzo::compress::compress;
    use crate::lzo::level::Level;

    #[test]
    fn empty_stream_decodes_to_empty_output() {
        let out = decompress_safe(&[0x11, 0x00, 0x00], 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn tampered_stream_is_rejected_not_panicked() {
        // Truncate a valid stream so a match offset walks off the front.
        let input: Vec<u8> = (0..2000).map(|i| (i % 37) as u8).collect();
        let compressed = compress(Level::X, &input, input.len() + 1024).unwrap();
        let mut tampered = compressed.clone();
        tampered.truncate(tampered.len() / 2);
        let err = decompress_safe(&tampered, input.len());
        assert!(err.is_err());
    }

    #[test]
    fn safe_and_fast_variants_agree() {
        let input: Vec<u8> = (0..8000).map(|i| ((i * 13) % 211) as u8).collect();
        let compressed = compress(Level::X, &input, input.len() + 1024).unwrap();
        let safe_out = decompress_safe(&compressed, input.len()).unwrap();
        let fast_out = unsafe { decompress_fast(&compressed, input.len()) };
        assert_eq!(safe_out, input);
        assert_eq!(fast_out, input);
    }
}
