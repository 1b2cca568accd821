//! Scrubbing of credentials from URLs before they reach logs or errors.

use reqwest::Url;

pub const REDACTED: &str = "<redacted>";

/// Renders `url` with its password replaced by `<redacted>`. With
/// `redact_query`, every query parameter value is replaced as well.
pub fn redact_url(url: &Url, redact_query: bool) -> String {
    let mut rendered = url.as_str().to_string();

    if let Some(password) = url.password() {
        rendered = rendered.replacen(
            &format!(":{}@", password),
            &format!(":{}@", REDACTED),
            1,
        );
    }

    if !redact_query {
        return rendered;
    }

    if let Some(query) = url.query() {
        let scrubbed = url
            .query_pairs()
            .map(|(key, _)| format!("{}={}", key, REDACTED))
            .collect::<Vec<_>>()
            .join("&");
        rendered = rendered.replacen(&format!("?{}", query), &format!("?{}", scrubbed), 1);
    }

    rendered
}

/// Like [`redact_url`] for a raw endpoint string. Strings that do not parse
/// as a URL only get a textual scrub of a `user:password@` prefix.
pub fn redact_endpoint(endpoint: &str, redact_query: bool) -> String {
    match Url::parse(endpoint) {
        Ok(url) => redact_url(&url, redact_query),
        Err(_) => redact_userinfo_text(endpoint),
    }
}

fn redact_userinfo_text(endpoint: &str) -> String {
    let authority_start = endpoint.find("://").map_or(0, |i| i + 3);
    let rest = &endpoint[authority_start..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());

    let Some(at) = rest[..authority_len].rfind('@') else {
        return endpoint.to_string();
    };
    let Some(colon) = rest[..at].find(':') else {
        return endpoint.to_string();
    };

    let password_start = authority_start + colon + 1;
    let password_end = authority_start + at;
    format!(
        "{}{}{}",
        &endpoint[..password_start],
        REDACTED,
        &endpoint[password_end..]
    )
}
