//! Errors raised while loading the field type catalogue.
//!
//! These are the only fatal conditions in the crate. Everything that can go
//! wrong during a tick is absorbed where it is detected.

/// Field type catalogue failed to load.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The catalogue JSON could not be parsed.
    #[error("malformed field type catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two definitions share an id.
    #[error("field type `{0}` is defined more than once")]
    Duplicate(String),

    /// A type the engine relies on is absent.
    #[error("mandatory field type `{0}` is missing")]
    MissingMandatory(&'static str),

    /// A definition names a type that does not exist.
    #[error("field type `{owner}` references unknown type `{target}`")]
    UnknownReference {
        /// Referencing type.
        owner: String,
        /// Missing type.
        target: String,
    },

    /// A parameter is outside its valid range.
    #[error("field type `{id}` has invalid {param}: {reason}")]
    InvalidParameter {
        /// Offending type.
        id: String,
        /// Parameter name.
        param: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// More definitions than a [`FieldTypeId`](crate::FieldTypeId) can index.
    #[error("catalogue holds {0} field types, more than can be indexed")]
    TooMany(usize),
}
