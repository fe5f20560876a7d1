use crate::types::UNKNOWN_DEVICE;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Maps the first three MAC octets (`AA:BB:CC`) to a display label.
#[derive(Debug, Clone)]
pub struct VendorTable {
    prefixes: HashMap<String, String>,
}

const DEFAULT_VENDORS: &[(&str, &str)] = &[
    ("FC:DB:B3", "Samsung Device"),
    ("DC:85:DE", "Xiaomi Device"),
    ("F4:0F:24", "Apple Device"),
    ("00:1A:2B", "Cisco Router"),
    ("3C:5A:B4", "OnePlus Device"),
    ("5C:AA:FD", "Realme Device"),
    ("40:9C:28", "Dell Laptop"),
    ("AC:37:43", "HP Laptop"),
];

impl VendorTable {
    pub fn builtin() -> Self {
        let prefixes = DEFAULT_VENDORS
            .iter()
            .map(|&(p, label)| (p.to_string(), label.to_string()))
            .collect();
        Self { prefixes }
    }

    /// Built-in table extended (and overridden) by `extra`.
    pub fn with_entries(extra: Vec<(String, String)>) -> Self {
        let mut table = Self::builtin();
        table.prefixes.extend(extra);
        table
    }

    /// Vendor label for a MAC, or `"Unknown Device"` when no prefix matches.
    pub fn guess(&self, mac: &str) -> &str {
        let Some(prefix) = mac.get(..8) else {
            return UNKNOWN_DEVICE;
        };
        self.prefixes
            .get(&prefix.to_ascii_uppercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DEVICE)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl Default for VendorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parse vendor prefix file content.
///
/// Supported formats per line:
/// - `FC:DB:B3  Samsung Device` (prefix, whitespace, label)
/// - comments: everything after `#` is ignored
/// - whitespace and blank lines are ignored
pub fn parse_vendors_str(s: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for (idx, raw_line) in s.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().map(str::trim).unwrap_or("");
        if line.is_empty() {
            continue;
        }
        let Some((prefix, label)) = line.split_once(char::is_whitespace) else {
            bail!("line {line_no}: missing vendor label after prefix: {line}");
        };
        let prefix = parse_prefix(prefix)
            .with_context(|| format!("line {line_no}: invalid MAC prefix: {prefix}"))?;
        let label = label.trim();
        if label.is_empty() {
            bail!("line {line_no}: empty vendor label");
        }
        out.push((prefix, label.to_string()));
    }
    Ok(out)
}

/// Load a vendor table from a file. Errors if the file cannot be read or parsed.
pub fn load_vendors_from_path(path: impl AsRef<Path>) -> Result<VendorTable> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read vendor file: {}", path.as_ref().display()))?;
    Ok(VendorTable::with_entries(parse_vendors_str(&content)?))
}

/// Load a vendor table from an optional file, falling back to the built-in table.
pub fn load_vendors_or_default(path: Option<&Path>) -> Result<VendorTable> {
    match path {
        Some(p) => load_vendors_from_path(p),
        None => Ok(VendorTable::builtin()),
    }
}

fn parse_prefix(s: &str) -> Result<String> {
    let octets: Vec<&str> = s.split(':').collect();
    if octets.len() != 3 {
        bail!("expected three colon-separated octets");
    }
    for o in &octets {
        if o.len() != 2 || !o.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("octet is not two hex digits: {o}");
        }
    }
    Ok(s.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samsung_prefix_is_deterministic() {
        let t = VendorTable::builtin();
        assert_eq!(t.guess("FC:DB:B3:11:22:33"), "Samsung Device");
        assert_eq!(t.guess("fc:db:b3:11:22:33"), "Samsung Device");
    }

    #[test]
    fn unmatched_prefix_is_unknown() {
        let t = VendorTable::builtin();
        assert_eq!(t.guess("00:00:00:11:22:33"), "Unknown Device");
        assert_eq!(t.guess("short"), "Unknown Device");
    }

    #[test]
    fn parse_with_comments_and_whitespace() {
        let input = r#"
            # lab gear
            B8:27:EB   Raspberry Pi   # foundation
            fc:db:b3 Samsung TV

        "#;
        let entries = parse_vendors_str(input).unwrap();
        assert_eq!(
            entries,
            vec![
                ("B8:27:EB".to_string(), "Raspberry Pi".to_string()),
                ("FC:DB:B3".to_string(), "Samsung TV".to_string()),
            ]
        );
        let t = VendorTable::with_entries(entries);
        assert_eq!(t.guess("FC:DB:B3:00:00:01"), "Samsung TV");
        assert_eq!(t.guess("B8:27:EB:00:00:01"), "Raspberry Pi");
        assert_eq!(t.guess("F4:0F:24:00:00:01"), "Apple Device");
    }

    #[test]
    fn invalid_lines_error() {
        assert!(parse_vendors_str("FC:DB Samsung\n").is_err());
        assert!(parse_vendors_str("ZZ:DB:B3 Samsung\n").is_err());
        assert!(parse_vendors_str("FC:DB:B3\n").is_err());
    }
}
