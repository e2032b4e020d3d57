//! Wire-level naming and encoding helpers.
//!
//! The service uses camelCase keys in its JSON documents while the client
//! names attributes in snake_case, and it expects JSON payloads embedded
//! in query-string parameters. The helpers here are the only place these
//! conventions are spelled out:
//!
//! - [`wire_key`]: `total_row_count` → `totalRowCount`
//! - [`uri_encode`]: RFC 3986 percent-encoding
//! - [`query_string`]: `k=v&k=v` with both sides encoded
//! - [`api_path`]: `/api/v{version}/{api_key}{resource}`

/// Derive the camelCase wire key for a snake_case attribute name.
///
/// Each underscore-delimited word is capitalized (first letter upper, the
/// rest lower), the words are concatenated, and the first letter of the
/// result is lowercased.
///
/// ```rust
/// use factual::wire::wire_key;
///
/// assert_eq!(wire_key("total_row_count"), "totalRowCount");
/// assert_eq!(wire_key("name"), "name");
/// ```
pub fn wire_key(name: &str) -> String {
    let joined: String = name.split('_').map(capitalize).collect();
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// URI-encode a string per RFC 3986.
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
pub fn uri_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// Join parameters into an encoded query string, preserving order.
pub fn query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Prefix a resource path with the versioned, keyed API base.
pub fn api_path(version: u32, api_key: &str, resource: &str) -> String {
    format!("/api/v{}/{}{}", version, api_key, resource)
}

/// Resource path for a table endpoint, e.g. `/tables/{key}/read.jsaml`.
pub fn table_resource(table_key: &str, endpoint: &str) -> String {
    format!("/tables/{}/{}", uri_encode(table_key), endpoint)
}
