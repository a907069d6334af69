/// Normalize a header cell: control characters become spaces, runs of
/// whitespace collapse to one space, and the ends are trimmed.
pub fn normalize_string(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
