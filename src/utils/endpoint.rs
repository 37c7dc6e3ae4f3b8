//! RPC endpoint validation
//!
//! Chain endpoints must be secure WebSocket URLs. Plain `ws://` is accepted
//! for local nodes or when the configuration explicitly allows it.

use url::Url;

/// Validation result for a WebSocket endpoint
#[derive(Debug, Clone, Default)]
pub struct EndpointValidation {
    pub is_valid: bool,
    pub url: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

fn is_local_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "::1" || host == "[::1]" || host.starts_with("192.168.")
}

/// Validate a chain WebSocket endpoint
pub fn validate_ws_endpoint(url: &str, allow_insecure: bool) -> EndpointValidation {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            errors.push(format!("Invalid URL format: {}", e));
            return EndpointValidation {
                is_valid: false,
                url: None,
                warnings,
                errors,
            };
        }
    };

    match parsed.scheme() {
        "wss" => {}
        "ws" => {
            let local = parsed.host_str().map(is_local_host).unwrap_or(false);
            if local {
                warnings.push("WS allowed for local development only".to_string());
            } else if allow_insecure {
                warnings.push("WSS (secure WebSocket) recommended over WS".to_string());
            } else {
                errors.push("WSS required for remote endpoints".to_string());
            }
        }
        other => errors.push(format!("Unsupported URL scheme: {}", other)),
    }

    match parsed.host_str() {
        Some(host) => {
            if host.contains("..") {
                errors.push("URL contains suspicious host pattern".to_string());
            }
            if parsed
                .host()
                .map(|h| matches!(h, url::Host::Ipv4(_) | url::Host::Ipv6(_)))
                .unwrap_or(false)
                && !is_local_host(host)
            {
                warnings.push("Using IP address instead of domain name".to_string());
            }
        }
        None => errors.push("Endpoint has no host".to_string()),
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        warnings.push("Credentials in URL - ensure URL is not logged".to_string());
    }

    let is_valid = errors.is_empty();
    EndpointValidation {
        is_valid,
        url: is_valid.then(|| parsed.to_string()),
        warnings,
        errors,
    }
}
