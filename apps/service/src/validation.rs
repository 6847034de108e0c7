use url::Url;

/// Validation outcome with a caller-facing message.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(msg.into()) }
    }
}

pub fn validate_target_name(name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return ValidationResult::err("Name cannot be empty");
    }
    ValidationResult::ok()
}

/// Validate an HTTP/HTTPS URL endpoint.
pub fn validate_http_endpoint(target: &str) -> ValidationResult {
    if target.trim().is_empty() {
        return ValidationResult::err("URL cannot be empty");
    }

    match Url::parse(target) {
        Ok(url) => {
            let scheme = url.scheme();
            if scheme != "http" && scheme != "https" {
                return ValidationResult::err(format!(
                    "Invalid scheme '{scheme}'. Must be http or https"
                ));
            }

            if url.host_str().is_none() {
                return ValidationResult::err("URL must have a valid host");
            }

            ValidationResult::ok()
        }
        Err(e) => {
            if !target.contains("://") {
                ValidationResult::err("URL must include scheme (http:// or https://)")
            } else {
                ValidationResult::err(format!("Invalid URL: {e}"))
            }
        }
    }
}

/// A curl command only needs to be present at creation time; whether a URL
/// can be recovered from it is decided when the target is probed.
pub fn validate_curl_command(command: &str) -> ValidationResult {
    if command.trim().is_empty() {
        return ValidationResult::err("Curl command cannot be empty");
    }
    ValidationResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        assert!(!validate_target_name("  ").is_valid);
        assert!(validate_target_name("api ping").is_valid);
    }

    #[test]
    fn endpoint_requires_http_scheme_and_host() {
        assert!(validate_http_endpoint("https://example.com/health").is_valid);
        assert!(validate_http_endpoint("http://example.com").is_valid);
        assert!(!validate_http_endpoint("ftp://example.com").is_valid);
        assert!(!validate_http_endpoint("example.com").is_valid);
        assert!(!validate_http_endpoint("").is_valid);
    }

    #[test]
    fn curl_command_only_needs_to_be_non_empty() {
        assert!(validate_curl_command("curl with no url yet").is_valid);
        assert!(!validate_curl_command("   ").is_valid);
    }
}
