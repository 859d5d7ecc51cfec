use uuid::Uuid;

pub mod email_lists;
pub mod output_kind;
pub mod outputs;
pub mod provider;
pub mod subscribers;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
