use uuid::Uuid;

/// Prefix reserved for client-generated temporary identifiers. Canonical
/// identifiers are assigned by the authoritative store and never start
/// with it.
pub const OFFLINE_PREFIX: &str = "offline_";

pub fn generate(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// A temporary identifier for a record created while disconnected. It
/// names the record from creation until sync reconciliation replaces it.
pub fn generate_offline() -> String {
    format!("{}{}", OFFLINE_PREFIX, Uuid::new_v4().simple())
}

pub fn is_offline(id: &str) -> bool {
    id.starts_with(OFFLINE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_ids_are_recognizable_by_prefix() {
        let temp = generate_offline();
        assert!(is_offline(&temp));
        assert!(!is_offline(&generate("ws")));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate("ws"), generate("ws"));
    }
}
