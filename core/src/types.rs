//! Shared primitive types used across the import pipeline.

/// A customer identifier, as decoded from the 9-digit master-file span.
pub type CustomerId = i64;

/// An account identifier, as decoded from the 11-digit master-file span.
pub type AccountId = i64;

/// A 16-character card number. Numeric-looking but treated as an opaque key.
pub type CardNumber = String;
