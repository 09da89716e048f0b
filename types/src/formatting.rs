//! Centralized display formatting utilities.
//!
//! All leaderboard/stats rendering goes through this module so the command
//! layer and the inspection CLI produce consistent output.

/// Escape characters that are meaningful in chat markdown.
///
/// # Examples
/// ```
/// use hitball_types::formatting::escape_markdown;
/// assert_eq!(escape_markdown("a_b"), "a\\_b");
/// assert_eq!(escape_markdown("plain"), "plain");
/// ```
pub fn escape_markdown(text: &str) -> String {
    const SPECIAL: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '=', '|', '{', '}', '.', '!', '-',
    ];
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Render a fixed-width progress bar (`█` filled, `▒` empty).
///
/// `max` of zero renders an empty bar.
///
/// # Examples
/// ```
/// use hitball_types::formatting::progress_bar;
/// assert_eq!(progress_bar(5, 10, 10), "█████▒▒▒▒▒");
/// assert_eq!(progress_bar(10, 10, 10), "██████████");
/// assert_eq!(progress_bar(0, 10, 10), "▒▒▒▒▒▒▒▒▒▒");
/// assert_eq!(progress_bar(3, 0, 10), "▒▒▒▒▒▒▒▒▒▒");
/// ```
pub fn progress_bar(value: u64, max: u64, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((value as f64 / max as f64) * width as f64).round() as usize
    };
    let filled = filled.min(width);
    let mut bar = "█".repeat(filled);
    bar.push_str(&"▒".repeat(width - filled));
    bar
}

/// Format a percentage from count/total with 1 decimal place.
///
/// Returns `"0%"` if total is zero.
///
/// # Examples
/// ```
/// use hitball_types::formatting::format_pct_ratio;
/// assert_eq!(format_pct_ratio(3, 10), "30.0%");
/// assert_eq!(format_pct_ratio(0, 0), "0%");
/// ```
pub fn format_pct_ratio(count: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// Format a duration as `M:SS`.
///
/// # Examples
/// ```
/// use hitball_types::formatting::format_duration;
/// assert_eq!(format_duration(125), "2:05");
/// assert_eq!(format_duration(59), "0:59");
/// assert_eq!(format_duration(0), "0:00");
/// ```
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_markdown("[link](x)"), "\\[link\\]\\(x\\)");
        assert_eq!(escape_markdown("bob.smith!"), "bob\\.smith\\!");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10, 10), "▒▒▒▒▒▒▒▒▒▒");
        assert_eq!(progress_bar(5, 10, 10), "█████▒▒▒▒▒");
        assert_eq!(progress_bar(10, 10, 10), "██████████");
        // Values above max clamp to a full bar
        assert_eq!(progress_bar(20, 10, 10), "██████████");
        // Zero max renders empty, not a division panic
        assert_eq!(progress_bar(3, 0, 10), "▒▒▒▒▒▒▒▒▒▒");
    }

    #[test]
    fn test_progress_bar_rounding() {
        // 1/3 of 10 cells rounds to 3
        assert_eq!(progress_bar(1, 3, 10), "███▒▒▒▒▒▒▒");
        // 2/3 of 10 cells rounds to 7
        assert_eq!(progress_bar(2, 3, 10), "███████▒▒▒");
    }

    #[test]
    fn test_format_pct_ratio() {
        assert_eq!(format_pct_ratio(3, 10), "30.0%");
        assert_eq!(format_pct_ratio(1, 3), "33.3%");
        assert_eq!(format_pct_ratio(0, 0), "0%");
        assert_eq!(format_pct_ratio(10, 10), "100.0%");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(60), "1:00");
        assert_eq!(format_duration(300), "5:00");
    }
}
