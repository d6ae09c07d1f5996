use std::collections::HashMap;

/// Which free-text field a correction table is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionKind {
    /// Listed location → planning area (keys compared upper-cased)
    Location,
    /// System name → planning area (keys compared as written)
    SystemName,
}

impl CorrectionKind {
    pub fn key_column(&self) -> &'static str {
        match self {
            CorrectionKind::Location => crate::utils::constants::COLUMN_LOCATION_LISTED,
            CorrectionKind::SystemName => crate::utils::constants::COLUMN_SYSTEM_NAME,
        }
    }

    pub fn normalize_key(&self, key: &str) -> String {
        match self {
            CorrectionKind::Location => key.trim().to_uppercase(),
            CorrectionKind::SystemName => key.trim().to_string(),
        }
    }
}

impl std::fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionKind::Location => write!(f, "location"),
            CorrectionKind::SystemName => write!(f, "system name"),
        }
    }
}

/// Static mapping from free-text variants to canonical planning-area names
#[derive(Debug, Clone)]
pub struct CorrectionTable {
    kind: CorrectionKind,
    entries: HashMap<String, String>,
}

impl CorrectionTable {
    pub fn new(kind: CorrectionKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> CorrectionKind {
        self.kind
    }

    /// Insert a mapping, returning the previous target if the key was already present
    pub fn insert(&mut self, key: &str, actual: &str) -> Option<String> {
        self.entries
            .insert(self.kind.normalize_key(key), actual.trim().to_uppercase())
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&self.kind.normalize_key(key))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_keys_are_case_insensitive() {
        let mut table = CorrectionTable::new(CorrectionKind::Location);
        assert!(table.insert("Jurong  ", "jurong west").is_none());

        assert_eq!(table.lookup("JURONG"), Some("JURONG WEST"));
        assert_eq!(table.lookup(" jurong"), Some("JURONG WEST"));
        assert_eq!(table.lookup("JURONG EAST"), None);
    }

    #[test]
    fn test_name_keys_are_case_sensitive() {
        let mut table = CorrectionTable::new(CorrectionKind::SystemName);
        table.insert("Changi Airport T4", "Changi");

        assert_eq!(table.lookup("Changi Airport T4 "), Some("CHANGI"));
        assert_eq!(table.lookup("changi airport t4"), None);
    }

    #[test]
    fn test_duplicate_key_returns_previous() {
        let mut table = CorrectionTable::new(CorrectionKind::Location);
        table.insert("AMK", "ANG MO KIO");
        assert_eq!(
            table.insert("amk", "Bishan"),
            Some("ANG MO KIO".to_string())
        );
        assert_eq!(table.lookup("AMK"), Some("BISHAN"));
        assert_eq!(table.len(), 1);
    }
}
