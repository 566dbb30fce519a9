//! Numeric-to-presentation conversion for IPv4 and IPv6.
//!
//! Both writers append into a caller-provided `String`; they never
//! allocate on their own beyond growing that sink.

use strings::hex::HEX_CHARS_LOWER;

pub(crate) fn push_decimal_u8(out: &mut String, value: u8) {
    if value >= 100 {
        out.push((b'0' + value / 100) as char);
    }
    if value >= 10 {
        out.push((b'0' + (value % 100) / 10) as char);
    }
    out.push((b'0' + value % 10) as char);
}

/// Write the dotted-decimal form; at most 15 bytes.
pub fn inet_ntop4(octets: &[u8; 4], out: &mut String) {
    out.reserve(15);
    for (i, &byte) in octets.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        push_decimal_u8(out, byte);
    }
}

fn is_v4_mapped(octets: &[u8; 16]) -> bool {
    octets[..10] == [0u8; 10] && octets[10] == 0xff && octets[11] == 0xff
}

/// Write the canonical compressed form: lowercase, no leading zeros in a
/// group, the longest run of at least two zero groups collapsed to `::`
/// (first such run on ties), and the `::ffff:a.b.c.d` shortcut for
/// v4-mapped addresses.
pub fn inet_ntop6(octets: &[u8; 16], out: &mut String) {
    if is_v4_mapped(octets) {
        out.push_str("::ffff:");
        inet_ntop4(array_ref![octets, 12, 4], out);
        return;
    }

    let mut groups = [0u16; 8];
    for (k, group) in groups.iter_mut().enumerate() {
        *group = u16::from_be_bytes(*array_ref![octets, 2 * k, 2]);
    }

    // Longest zero run; on a tie the earliest run wins because only a
    // strictly longer run replaces the best.
    let mut best_start = 0usize;
    let mut best_len = 0usize;
    let mut run_start = 0usize;
    let mut run_len = 0usize;
    for (k, &group) in groups.iter().enumerate() {
        if group == 0 {
            if run_len == 0 {
                run_start = k;
            }
            run_len += 1;
            if run_len > best_len {
                best_start = run_start;
                best_len = run_len;
            }
        } else {
            run_len = 0;
        }
    }
    if best_len < 2 {
        best_len = 0;
    }

    out.reserve(39);
    let mut k = 0;
    let mut after_run = false;
    while k < 8 {
        if best_len != 0 && k == best_start {
            out.push_str("::");
            k += best_len;
            after_run = true;
            continue;
        }
        if k > 0 && !after_run {
            out.push(':');
        }
        after_run = false;
        let group = groups[k];
        let mut skip = true;
        for shift in [12u32, 8, 4, 0] {
            let digit = ((group >> shift) & 0xf) as usize;
            if skip && digit == 0 && shift != 0 {
                continue;
            }
            skip = false;
            out.push(HEX_CHARS_LOWER[digit] as char);
        }
        k += 1;
    }
}
