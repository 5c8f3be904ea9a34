//! Match patterns built from a CIDR summary
//!
//! Two forms are offered. [`cidr_list`] is the summary itself as text and
//! works for both families. [`ipv4_regex`] is an anchored regular expression
//! matching exactly the dotted-quad text of every address covered by the
//! blocks: each octet is rendered as an alternation of bounded digit runs
//! (`2[0-4][0-9]`, `25[0-5]`, ...), never as a literal `lo-hi` token.

use crate::{IpVersion, Network};

/// Decimal bands with a fixed digit count, as they appear in an octet
const OCTET_BANDS: [(u8, u8); 3] = [(0, 9), (10, 99), (100, 255)];

/// Summary blocks as CIDR strings
pub fn cidr_list(blocks: &[Network]) -> Vec<String> {
    blocks.iter().map(|b| b.to_string()).collect()
}

/// Anchored regex matching exactly the IPv4 addresses in `blocks`
///
/// Returns `None` when `blocks` is empty or contains IPv6 networks, whose
/// textual forms are not unique.
///
/// # Examples
///
/// ```
/// use subcalc_cidr::{pattern, Network};
///
/// let net = Network::parse("10.0.0.0/30").unwrap();
/// assert_eq!(pattern::ipv4_regex(&[net]).unwrap(), r"^10\.0\.0\.[0-3]$");
/// ```
pub fn ipv4_regex(blocks: &[Network]) -> Option<String> {
    if blocks.is_empty() || blocks.iter().any(|b| b.version() != IpVersion::V4) {
        return None;
    }

    let alternatives: Vec<String> = blocks.iter().map(block_regex).collect();
    if alternatives.len() == 1 {
        Some(format!("^{}$", alternatives[0]))
    } else {
        Some(format!("^(?:{})$", alternatives.join("|")))
    }
}

/// Regex for one IPv4 block, octet by octet
fn block_regex(block: &Network) -> String {
    let base = block.first() as u32;
    let prefix_len = block.prefix_len() as u32;

    let octets: Vec<String> = (0..4u32)
        .map(|i| {
            let value = ((base >> (24 - i * 8)) & 0xFF) as u8;
            let fixed_bits = prefix_len.saturating_sub(i * 8).min(8);
            let spread = (0xFFu32 >> fixed_bits) as u8;
            group(octet_range(value, value | spread))
        })
        .collect();

    octets.join(r"\.")
}

/// Alternation pieces matching the decimal numbers `lo..=hi` (0-255)
///
/// ```
/// use subcalc_cidr::pattern::octet_range;
///
/// assert_eq!(octet_range(10, 200), ["[1-9][0-9]", "1[0-9][0-9]", "200"]);
/// ```
pub fn octet_range(lo: u8, hi: u8) -> Vec<String> {
    let mut pieces = Vec::new();
    for (band_lo, band_hi) in OCTET_BANDS {
        let start = lo.max(band_lo);
        let end = hi.min(band_hi);
        if start <= end {
            pieces.extend(same_length(&digits(start), &digits(end)));
        }
    }
    pieces
}

fn group(pieces: Vec<String>) -> String {
    if pieces.len() == 1 {
        pieces.into_iter().collect()
    } else {
        format!("(?:{})", pieces.join("|"))
    }
}

fn digits(n: u8) -> Vec<u8> {
    n.to_string().bytes().map(|b| b - b'0').collect()
}

/// Pieces for `lo..=hi` where both have the same number of digits
fn same_length(lo: &[u8], hi: &[u8]) -> Vec<String> {
    if lo.len() == 1 {
        return vec![digit_class(lo[0], hi[0])];
    }

    let (lo_head, lo_tail) = (lo[0], &lo[1..]);
    let (hi_head, hi_tail) = (hi[0], &hi[1..]);

    if lo_head == hi_head {
        return prefixed(lo_head, same_length(lo_tail, hi_tail));
    }

    let rest = lo_tail.len();
    let lo_tail_min = lo_tail.iter().all(|&d| d == 0);
    let hi_tail_max = hi_tail.iter().all(|&d| d == 9);
    let mut pieces = Vec::new();

    let mid_start = if lo_tail_min {
        lo_head
    } else {
        pieces.extend(prefixed(lo_head, same_length(lo_tail, &vec![9; rest])));
        lo_head + 1
    };
    let mid_end = if hi_tail_max { hi_head } else { hi_head - 1 };

    if mid_start <= mid_end {
        pieces.push(format!("{}{}", digit_class(mid_start, mid_end), "[0-9]".repeat(rest)));
    }

    if !hi_tail_max {
        pieces.extend(prefixed(hi_head, same_length(&vec![0; rest], hi_tail)));
    }

    pieces
}

fn prefixed(head: u8, tails: Vec<String>) -> Vec<String> {
    tails.into_iter().map(|t| format!("{}{}", head, t)).collect()
}

fn digit_class(lo: u8, hi: u8) -> String {
    match (lo, hi) {
        (a, b) if a == b => a.to_string(),
        (0, 9) => "[0-9]".to_string(),
        (a, b) => format!("[{}-{}]", a, b),
    }
}
