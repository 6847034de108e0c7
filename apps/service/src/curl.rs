use std::collections::HashMap;

/// Request fields recovered from a raw curl command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCurl {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl Default for ParsedCurl {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

/// Best-effort parse of a curl command into its request parts.
///
/// Never fails: an unusable command yields an empty `url`, which callers
/// treat as the parse-failure signal. Flags may appear in any order and may
/// be interleaved with the URL itself. Tokens consumed as flag values are
/// never scanned for the URL, so a URL embedded in a body or header value
/// cannot shadow the actual request target.
pub fn parse_curl(command: &str) -> ParsedCurl {
    let tokens = tokenize(command);
    let mut parsed = ParsedCurl::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].as_str() {
            "-X" | "--request" => {
                if let Some(value) = tokens.get(i + 1) {
                    parsed.method = value.to_uppercase();
                    i += 1;
                }
            }
            "-H" | "--header" => {
                if let Some(value) = tokens.get(i + 1) {
                    // Split at the first colon; later duplicates win.
                    if let Some((key, val)) = value.split_once(':') {
                        parsed
                            .headers
                            .insert(key.trim().to_string(), val.trim().to_string());
                    }
                    i += 1;
                }
            }
            "-d" | "--data" | "--data-raw" => {
                if let Some(value) = tokens.get(i + 1) {
                    parsed.body = Some(value.clone());
                    i += 1;
                }
            }
            token => {
                if parsed.url.is_empty() {
                    if let Some(url) = extract_url(token) {
                        parsed.url = url;
                    }
                }
            }
        }
        i += 1;
    }

    // curl switches to POST when a body is supplied without an explicit -X;
    // a body must never be sent with GET.
    if parsed.body.is_some() && parsed.method == "GET" {
        parsed.method = "POST".to_string();
    }

    parsed
}

/// Take everything from the first `http://` or `https://` occurrence onward.
fn extract_url(token: &str) -> Option<String> {
    let start = token
        .find("https://")
        .or_else(|| token.find("http://"))?;
    Some(token[start..].to_string())
}

/// Split a command into whitespace-separated tokens, stripping quotes and
/// treating escaped line continuations as plain whitespace.
fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('\n') | Some('\r') => {
                    chars.next();
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                Some(_) => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                None => {}
            },
            '\'' | '"' => {
                // Quoted run: content is kept verbatim, quotes are dropped.
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == c {
                        break;
                    }
                    current.push(next);
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command() {
        let parsed = parse_curl(
            r#"curl -X POST https://api.example.com/hook -H "Authorization: Bearer x" -H "Content-Type: application/json" -d '{"a":1}'"#,
        );

        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.url, "https://api.example.com/hook");
        assert_eq!(parsed.headers.len(), 2);
        assert_eq!(parsed.headers["Authorization"], "Bearer x");
        assert_eq!(parsed.headers["Content-Type"], "application/json");
        assert_eq!(parsed.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn defaults_to_get() {
        let parsed = parse_curl("curl https://example.com");
        assert_eq!(parsed.method, "GET");
        assert_eq!(parsed.url, "https://example.com");
        assert!(parsed.headers.is_empty());
        assert!(parsed.body.is_none());
    }

    #[test]
    fn body_without_method_upgrades_to_post() {
        let parsed = parse_curl("curl https://example.com -d 'payload'");
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.body.as_deref(), Some("payload"));
    }

    #[test]
    fn explicit_method_survives_body() {
        let parsed = parse_curl("curl -X PUT https://example.com --data-raw '{}'");
        assert_eq!(parsed.method, "PUT");
        assert_eq!(parsed.body.as_deref(), Some("{}"));
    }

    #[test]
    fn no_url_yields_empty_string() {
        let parsed = parse_curl("curl -X POST -H 'Accept: text/plain'");
        assert!(parsed.url.is_empty());
        assert_eq!(parsed.method, "POST");
    }

    #[test]
    fn later_duplicate_headers_win() {
        let parsed =
            parse_curl("curl https://example.com -H 'Accept: text/html' -H 'Accept: application/json'");
        assert_eq!(parsed.headers.len(), 1);
        assert_eq!(parsed.headers["Accept"], "application/json");
    }

    #[test]
    fn flags_may_follow_the_url() {
        let parsed = parse_curl("curl 'https://example.com/ping' -X DELETE -H 'X-Key: 1'");
        assert_eq!(parsed.url, "https://example.com/ping");
        assert_eq!(parsed.method, "DELETE");
        assert_eq!(parsed.headers["X-Key"], "1");
    }

    #[test]
    fn line_continuations_collapse() {
        let parsed = parse_curl("curl \\\n  -X POST \\\n  https://example.com \\\n  -d token=1");
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.url, "https://example.com");
        assert_eq!(parsed.body.as_deref(), Some("token=1"));
    }

    #[test]
    fn long_form_request_flag() {
        let parsed = parse_curl("curl --request patch https://example.com");
        assert_eq!(parsed.method, "PATCH");
    }

    #[test]
    fn unquoted_data_token() {
        let parsed = parse_curl("curl https://example.com --data key=value");
        assert_eq!(parsed.body.as_deref(), Some("key=value"));
        assert_eq!(parsed.method, "POST");
    }

    #[test]
    fn url_inside_a_flag_value_is_not_mistaken_for_the_target() {
        let parsed = parse_curl("curl -d 'see https://wrong.example' https://right.example");
        assert_eq!(parsed.url, "https://right.example");
        assert_eq!(parsed.body.as_deref(), Some("see https://wrong.example"));
    }

    #[test]
    fn header_without_colon_is_ignored() {
        let parsed = parse_curl("curl https://example.com -H 'NotAHeader'");
        assert!(parsed.headers.is_empty());
    }
}
