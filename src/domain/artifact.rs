/// Repair the known defect in artifact URLs returned by the audio
/// service: the scheme is sometimes emitted twice, as in
/// `https://https://cdn.example/x.mp3` or `http://https://…`.
///
/// Strips redundant leading schemes until exactly one remains. URLs
/// without the defect pass through untouched.
pub fn normalize_artifact_url(raw: &str) -> String {
    let mut url = raw.trim();

    loop {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        match rest {
            Some(r) if r.starts_with("https://") || r.starts_with("http://") => {
                url = r;
            }
            _ => break,
        }
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::normalize_artifact_url;

    #[test]
    fn clean_url_is_unchanged() {
        assert_eq!(
            normalize_artifact_url("https://cdn.example/x.mp3"),
            "https://cdn.example/x.mp3"
        );
    }

    #[test]
    fn doubled_scheme_is_stripped() {
        assert_eq!(
            normalize_artifact_url("https://https://cdn.example/x.mp3"),
            "https://cdn.example/x.mp3"
        );
    }

    #[test]
    fn mixed_doubled_scheme_keeps_the_inner_one() {
        assert_eq!(
            normalize_artifact_url("http://https://cdn.example/x.mp3"),
            "https://cdn.example/x.mp3"
        );
    }

    #[test]
    fn tripled_scheme_is_fully_collapsed() {
        assert_eq!(
            normalize_artifact_url("https://https://https://cdn.example/x.mp3"),
            "https://cdn.example/x.mp3"
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            normalize_artifact_url("  https://cdn.example/x.mp3\n"),
            "https://cdn.example/x.mp3"
        );
    }
}
