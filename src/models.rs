use serde_json::{Map, Value};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One table row: a flat column-name to scalar-value mapping. No schema is
/// enforced; shape may vary between rows of the same table.
pub type Record = Map<String, Value>;
