//! Parsing of `chrom:position` search tokens.

use regex::Regex;
use std::sync::LazyLock;

static LOCUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[cC][hH][rR])?([0-9XYxy]+):([0-9]+)$").unwrap());

/// Parse a `chrom:position` query such as `chr1:15449431` or `X:100`.
///
/// The chromosome is returned normalized: without a `chr` prefix and with
/// sex chromosomes upper-cased. Returns `None` for anything else, in which
/// case the caller treats the query as an rs-id fragment.
pub fn parse_locus(query: &str) -> Option<(String, i64)> {
    let caps = LOCUS.captures(query.trim())?;
    let chrom = caps.get(1)?.as_str().to_ascii_uppercase();
    let pos = caps.get(2)?.as_str().parse::<i64>().ok()?;
    Some((chrom, pos))
}
