//! Error types.

/// Error enumerates the possible error states of the daemon.
///
/// The configuration variants are fatal at startup: the [`Config`][crate::config::Config]
/// is validated once at load time and never re-checked per request.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when the configuration declares no credentials at all.
    #[error("must specify at least one set of credentials")]
    NoCredentials,

    /// Returned when the configuration declares no users at all.
    #[error("must specify at least one user")]
    NoUsers,

    /// Returned when a credentials entry is missing its access id.
    #[error("credentials '{0}' must specify access_id")]
    CredentialsMissingId(String),

    /// Returned when a credentials entry is missing its access key.
    #[error("credentials '{0}' must specify access_key")]
    CredentialsMissingKey(String),

    /// Returned when a user entry has an empty username.
    #[error("all users must specify a username")]
    UserMissingName,

    /// Returned when a user entry has an empty password.
    #[error("user '{0}' must specify a password")]
    UserMissingPassword(String),

    /// Returned when a domain references a credentials name that doesn't exist.
    #[error("domain '{0}': could not find credentials named '{1}'")]
    UnknownCredentials(String, String),

    /// Returned when a domain allow-lists a username that isn't declared under `users`.
    #[error("domain '{0}': could not find user named '{1}'")]
    UnknownUser(String, String),

    /// Returned when a domain is missing its hosted zone id.
    #[error("domain '{0}' must specify zone_id")]
    DomainMissingZone(String),

    /// Returned when a generic IO error occurs (e.g. reading the config file).
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when the config file isn't valid YAML.
    #[error("invalid YAML")]
    InvalidYAML(#[from] serde_yaml::Error),

    /// Returned when the zone provider rejects or fails an upsert. Carries the
    /// provider's own message so adapters can decide how much of it to expose.
    #[error("{0}")]
    Upstream(String),

    /// Returned when the HTTP call to the zone provider fails outright.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Returned when a timestamp can't be rendered for a change comment or signature.
    #[error(transparent)]
    TimeFormat(#[from] time::error::Format),
}
