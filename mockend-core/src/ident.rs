//! Identifier generation for records created without an id.

use std::{fmt::Debug, sync::Arc};

use uuid::Uuid;

/// A source of unique identifiers.
pub trait IdGenerator: Send + Sync + Debug {
    /// Returns a fresh identifier that has not been handed out before.
    fn generate(&self) -> String;
}

/// Generates random version 4 UUIDs in their hyphenated lowercase form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_unique_and_v4() {
        let generator = UuidGenerator;
        let first = generator.generate();
        let second = generator.generate();

        assert_ne!(first, second);
        assert_eq!(Uuid::parse_str(&first).unwrap().get_version_num(), 4);
    }
}
