/// Cuts `value` to at most `max_bytes` without splitting a UTF-8 sequence,
/// noting how much was dropped.
pub fn clip_for_log(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... ({} bytes truncated)",
        &value[..end],
        value.len() - end
    )
}

#[cfg(test)]
mod tests {
    use super::clip_for_log;

    #[test]
    fn short_values_pass_through() {
        assert_eq!(clip_for_log("{}", 10), "{}");
    }

    #[test]
    fn long_values_are_clipped_on_char_boundary() {
        let clipped = clip_for_log("aé€b", 2);
        assert!(clipped.starts_with("a..."));
        assert!(clipped.ends_with("(6 bytes truncated)"));
    }
}
