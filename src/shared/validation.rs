use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating service names used to derive policy resource names
    /// Must be a lowercase DNS-1123 label
    /// - Valid: "ratings", "reviews-v2", "svc1"
    /// - Invalid: "-svc", "svc-", "Svc", "svc_name", "svc.name"
    pub static ref SERVICE_NAME_REGEX: Regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_regex_valid() {
        assert!(SERVICE_NAME_REGEX.is_match("ratings"));
        assert!(SERVICE_NAME_REGEX.is_match("reviews-v2"));
        assert!(SERVICE_NAME_REGEX.is_match("a"));
        assert!(SERVICE_NAME_REGEX.is_match("svc1"));
        assert!(SERVICE_NAME_REGEX.is_match("a--b"));
    }

    #[test]
    fn test_service_name_regex_invalid() {
        assert!(!SERVICE_NAME_REGEX.is_match("-svc")); // starts with hyphen
        assert!(!SERVICE_NAME_REGEX.is_match("svc-")); // ends with hyphen
        assert!(!SERVICE_NAME_REGEX.is_match("Svc")); // uppercase
        assert!(!SERVICE_NAME_REGEX.is_match("svc_name")); // underscore
        assert!(!SERVICE_NAME_REGEX.is_match("svc.name")); // dot
        assert!(!SERVICE_NAME_REGEX.is_match("")); // empty
    }
}
