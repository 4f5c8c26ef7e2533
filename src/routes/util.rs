//! Shared form parsing and JSON response helpers for route handlers.

use serde::Serialize;

use crate::calc::valuation::parse_leading_int;

/// Parse URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` format.
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((percent_decode(key), percent_decode(val)))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Decoded bytes are reassembled as
/// UTF-8 so multi-byte character names survive. A `%` not followed by two
/// hex digits is kept as literal text.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1).copied().and_then(hex_val).zip(
                    bytes.get(i + 2).copied().and_then(hex_val),
                );
                match escape {
                    Some((hi, lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Normalize a numeric form field to a count: negative, unparseable or
/// overflowing values become 0.
pub fn parse_count(raw: &str) -> u32 {
    parse_leading_int(raw)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Serialize a response body.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&e.to_string()))
}

/// `{"error": "..."}` body.
pub fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
