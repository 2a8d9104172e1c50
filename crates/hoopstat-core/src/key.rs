// Join keys and small cell-level cleaners.
//
// Keys are matched verbatim after trimming and lowercasing, so "Jr." suffixes
// or accented letters that differ between sources will not match.

/// Canonical join key for a player name: trimmed and lowercased.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Primary position of a hyphen-joined eligibility string ("C-PF" -> "C").
pub fn clean_position(pos: &str) -> String {
    pos.split('-').next().unwrap_or_default().trim().to_string()
}

/// Parse a currency cell such as `"$1,234,567"` into a float.
///
/// Returns `None` when nothing numeric remains after stripping `$`, `,` and
/// surrounding whitespace, or when the result is not finite.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    value.is_finite().then_some(value)
}
