//! Identifier quoting and length-limited name generation

use sha2::{Digest, Sha256};

/// Number of hex characters appended to truncated identifiers
const HASH_LEN: usize = 4;

/// Quote an identifier for DB2
///
/// Names already wrapped in double quotes are returned unchanged; otherwise
/// the name is wrapped and embedded double quotes are doubled.
pub fn quote_name(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Shorten `name` to at most `max_len` characters
///
/// Names that fit are returned as is. Longer names keep a prefix and end with
/// a short digest of the full name, so distinct long names stay distinct.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let digest = name_digest(name);
    let keep = max_len.saturating_sub(HASH_LEN);
    let prefix: String = name.chars().take(keep).collect();
    format!("{}{}", prefix, &digest[..HASH_LEN.min(max_len)])
}

/// Generate a constraint or index name: `<table>_<col1>_<col2><suffix>`
///
/// The suffix (such as `_pk` or `_uniq`) always survives truncation.
pub fn constraint_name(table: &str, columns: &[&str], suffix: &str, max_len: usize) -> String {
    let base = format!("{}_{}", table, columns.join("_"));
    let full = format!("{}{}", base, suffix);
    if full.chars().count() <= max_len {
        return full;
    }
    let room = max_len.saturating_sub(suffix.chars().count());
    format!("{}{}", truncate_name(&base, room), suffix)
}

fn name_digest(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("orders"), "\"orders\"");
        assert_eq!(quote_name("\"ORDERS\""), "\"ORDERS\"");
        assert_eq!(quote_name("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_truncate_name_keeps_short_names() {
        assert_eq!(truncate_name("amount", 128), "amount");
        assert_eq!(truncate_name("amount", 6), "amount");
    }

    #[test]
    fn test_truncate_name_appends_digest() {
        let long = "a".repeat(40);
        let truncated = truncate_name(&long, 18);
        assert_eq!(truncated.len(), 18);
        assert!(truncated.starts_with(&"a".repeat(14)));
        assert_ne!(truncated, truncate_name(&"b".repeat(40), 18));
        assert_eq!(truncated, truncate_name(&long, 18));
    }

    #[test]
    fn test_constraint_name() {
        assert_eq!(constraint_name("orders", &["id"], "_pk", 128), "orders_id_pk");
        assert_eq!(
            constraint_name("link", &["a_id", "b_id"], "_uniq", 128),
            "link_a_id_b_id_uniq"
        );
    }

    #[test]
    fn test_constraint_name_truncation_keeps_suffix() {
        let name = constraint_name("a_very_long_table_name", &["a_very_long_column"], "_check", 20);
        assert_eq!(name.chars().count(), 20);
        assert!(name.ends_with("_check"));
    }
}
