//! Shared test utilities for domain testing
//!
//! - `TestDatabase`: PostgreSQL container with migrations applied (feature: "postgres")
//! - `TestDataBuilder`: deterministic ids and names (always available)
//! - `assertions`: custom assertion helpers (always available)
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let property_id = db
//!         .create_property(builder.property_id(0), builder.organization_id(), "100.00", 4)
//!         .await;
//! }
//! ```

use uuid::Uuid;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

// Keeps the id kinds apart for the same seed
const USER_SALT: u64 = 0x5553_4552;
const ORGANIZATION_SALT: u64 = 0x4f52_4700;
const PROPERTY_SALT: u64 = 0x5052_4f50;

/// Builder for test data with deterministic randomization
///
/// The same test name always yields the same ids, so failures reproduce.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    fn id(&self, salt: u64, index: u64) -> Uuid {
        let high = self.seed.to_le_bytes();
        let low = (salt ^ index.rotate_left(32)).to_le_bytes();
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&high);
        bytes[8..].copy_from_slice(&low);
        Uuid::from_bytes(bytes)
    }

    pub fn user_id(&self) -> Uuid {
        self.id(USER_SALT, 0)
    }

    pub fn organization_id(&self) -> Uuid {
        self.id(ORGANIZATION_SALT, 0)
    }

    /// The `index`-th property of this test
    pub fn property_id(&self, index: u64) -> Uuid {
        self.id(PROPERTY_SALT, index)
    }

    /// Name unique to this test, e.g. `test-property-12345-main`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected UUID {}, got {}",
            context, expected, actual
        );
    }

    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
