use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Can't parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Can't serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Can't read file {path}: {source}")]
    FileReadError {
        path: String,
        source: std::io::Error,
    },

    #[error("Missing required column `{column}` in {path}")]
    MissingColumn { path: String, column: &'static str },

    #[error("Error parsing {path}, record {record}: {reason}")]
    RecordParseError {
        path: String,
        record: u64,
        reason: String,
    },

    #[error("Corrupted file. 0 records found in the file: {0}")]
    EmptyInput(String),
}

/// Per-element data problems. These never abort a run: the element is
/// reported as excluded and the analysis continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("Malformed intervals in element {element}: {reason}")]
    MalformedInterval { element: String, reason: String },
}
