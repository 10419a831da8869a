//! Type-name utilities shared by the index builder and rules.

/// Removes generic arguments or arity markers from a type name.
///
/// ```ignore
/// assert_eq!(strip_generics("Repository<Order>"), "Repository");
/// assert_eq!(strip_generics("List`1"), "List");
/// ```
///
/// Names that start with `<` (compiler-generated, e.g. `<Program>$`) are
/// returned unchanged.
#[must_use]
pub fn strip_generics(name: &str) -> &str {
    let name = name.trim();
    match name.find(|c: char| c == '<' || c == '`') {
        Some(0) | None => name,
        Some(i) => name[..i].trim_end(),
    }
}

/// Strips a leading `global::` alias qualifier.
#[must_use]
pub fn strip_global(name: &str) -> &str {
    name.strip_prefix("global::").unwrap_or(name)
}

/// Returns the qualified name without alias qualifier or generic arguments.
#[must_use]
pub fn qualified_name(name: &str) -> &str {
    strip_generics(strip_global(name.trim()))
}

/// Extracts the last segment of a qualified type name.
///
/// Understands `.`, `::` and `+` (nested type) separators.
#[must_use]
pub fn simple_name(name: &str) -> &str {
    let name = qualified_name(name);
    if name.starts_with('<') {
        return name;
    }
    name.rsplit(|c: char| c == '.' || c == ':' || c == '+')
        .next()
        .unwrap_or(name)
}

/// Returns true if `name` looks like a type identifier worth indexing.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '+'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_generics() {
        assert_eq!(strip_generics("Repository<Order>"), "Repository");
        assert_eq!(strip_generics("List`1"), "List");
        assert_eq!(strip_generics("Plain"), "Plain");
        assert_eq!(strip_generics("<Program>$"), "<Program>$");
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("Acme.Domain.Order"), "Order");
        assert_eq!(simple_name("crate::domain::Order"), "Order");
        assert_eq!(simple_name("Acme.Outer+Inner"), "Inner");
        assert_eq!(simple_name("global::Acme.Base<T>"), "Base");
        assert_eq!(simple_name("Order"), "Order");
        assert_eq!(simple_name("<Program>$"), "<Program>$");
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name(" global::Acme.Entity<Guid> "), "Acme.Entity");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("Acme.Entity"));
        assert!(is_identifier("_Base"));
        assert!(!is_identifier("1Base"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("new()"));
    }
}
