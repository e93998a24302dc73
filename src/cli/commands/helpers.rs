//! Shared helper functions for CLI commands.

/// Truncate a string for fixed-width table display.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
    format!("{cut}…")
}

/// Render an id list like "1, 2, 3".
pub fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
