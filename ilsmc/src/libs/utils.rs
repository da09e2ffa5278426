//NOTE: This should be parsed by clap automatically, but Option<String> parsing is not supported out of the box as of now
pub fn strip_prefix(prefix: Option<String>) -> Option<String> {
    match prefix.as_deref() {
        None | Some("") | Some("\\0") => None,
        Some(v) => Some(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix(None), None);
        assert_eq!(strip_prefix(Some(String::new())), None);
        assert_eq!(strip_prefix(Some(String::from("\\0"))), None);
        assert_eq!(strip_prefix(Some(String::from("run1"))), Some(String::from("run1")));
    }
}
