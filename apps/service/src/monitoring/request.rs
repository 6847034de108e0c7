use std::collections::HashMap;

use thiserror::Error;

use crate::curl::parse_curl;
use crate::database::models::{Target, TargetMode};

/// The method/URL/headers/body tuple actually sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("curl command has no extractable URL")]
    NoUrlInCommand,
    #[error("curl-mode target has no command")]
    MissingCurlCommand,
    #[error("url-mode target has no URL")]
    MissingUrl,
}

/// Methods that may carry a request body.
const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// Assemble the outgoing request for a target. Fails without touching the
/// network when no usable URL exists.
pub fn build_request(target: &Target) -> Result<RequestDescriptor, BuildError> {
    match target.mode {
        TargetMode::Curl => {
            let command = target
                .curl_command
                .as_deref()
                .ok_or(BuildError::MissingCurlCommand)?;
            let parsed = parse_curl(command);
            if parsed.url.is_empty() {
                return Err(BuildError::NoUrlInCommand);
            }

            let body = parsed
                .body
                .filter(|_| BODY_METHODS.contains(&parsed.method.as_str()));

            Ok(RequestDescriptor {
                method: parsed.method,
                url: parsed.url,
                headers: parsed.headers,
                body,
            })
        }
        TargetMode::Url => {
            let url = target.url.clone().ok_or(BuildError::MissingUrl)?;

            // Merge the ordered pair list; later duplicates win.
            let mut headers = HashMap::new();
            for pair in &target.headers {
                headers.insert(pair.key.clone(), pair.value.clone());
            }

            Ok(RequestDescriptor {
                method: "GET".to_string(),
                url,
                headers,
                body: None,
            })
        }
    }
}
