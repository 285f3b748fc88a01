//! YAML configuration and the access-control model built from it.
//!
//! The configuration is loaded and validated once at startup, then shared
//! read-only behind an [`Arc`] for the lifetime of the process. Every
//! cross-reference (domain → credentials, domain allow-list → user) is
//! resolved here so request handling never has to re-check them.

use crate::error::Error;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// A loaded [`Config`] shared across request handlers.
pub type Shared = Arc<Config>;

const DEFAULT_TTL: u32 = 60;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Named zone-provider credential sets, keyed by name.
    #[serde(default)]
    pub credentials: HashMap<String, Credentials>,
    /// Managed domains, keyed by fully qualified host name.
    #[serde(default)]
    pub domains: HashMap<String, Domain>,
    /// Record TTL in seconds applied to every upsert. Zero or absent means 60.
    #[serde(default)]
    pub ttl: u32,
    /// Users permitted to call the update APIs, subject to per-domain allow-lists.
    #[serde(default)]
    pub users: Vec<User>,
}

/// One named identity for the zone-management provider.
#[derive(Deserialize, Clone)]
pub struct Credentials {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub access_key: String,
}

// The access key never appears in Debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("access_id", &self.access_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

/// A managed domain: which zone it lives in, which credentials reach that
/// zone, and which users may update it.
#[derive(Deserialize, Debug, Clone)]
pub struct Domain {
    #[serde(skip)]
    pub name: String,
    /// Name of the [`Credentials`] entry used to reach this domain's zone.
    #[serde(default)]
    pub credentials: String,
    /// Usernames allowed to update this domain.
    #[serde(default)]
    pub users: Vec<String>,
    /// Provider-specific hosted zone identifier.
    #[serde(default)]
    pub zone_id: String,
}

#[derive(Deserialize, Clone)]
pub struct User {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Parse and validate a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidYAML`] for malformed YAML, or the specific
    /// configuration error naming the offending entity when validation fails.
    pub fn load(data: &str) -> Result<Self, Error> {
        let mut conf: Config = serde_yaml::from_str(data)?;
        conf.validate()?;

        for (name, creds) in &mut conf.credentials {
            creds.name = name.clone();
        }
        for (name, domain) in &mut conf.domains {
            domain.name = name.clone();
        }
        if conf.ttl == 0 {
            conf.ttl = DEFAULT_TTL;
        }

        Ok(conf)
    }

    /// Load a configuration from a YAML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file can't be read, otherwise as [`Config::load`].
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        Self::load(&fs::read_to_string(p)?)
    }

    /// Look up a user by username and verify their password.
    ///
    /// The caller can't distinguish an unknown username from a wrong password.
    /// Both the length check and the content check run in constant time so the
    /// comparison leaks neither the password length nor a matching prefix.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&User> {
        let user = self.find_user(username)?;
        let len_eq = (user.password.len() as u64).ct_eq(&(password.len() as u64));
        let content_eq = user.password.as_bytes().ct_eq(password.as_bytes());
        if bool::from(len_eq & content_eq) {
            Some(user)
        } else {
            None
        }
    }

    /// True iff the user appears in the domain's allow-list.
    #[must_use]
    pub fn authorize(&self, user: &User, domain: &Domain) -> bool {
        domain.users.iter().any(|allowed| allowed == &user.username)
    }

    #[must_use]
    pub fn find_domain(&self, host: &str) -> Option<&Domain> {
        self.domains.get(host)
    }

    fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.credentials.is_empty() {
            return Err(Error::NoCredentials);
        }
        for (name, creds) in &self.credentials {
            if creds.access_id.is_empty() {
                return Err(Error::CredentialsMissingId(name.clone()));
            }
            if creds.access_key.is_empty() {
                return Err(Error::CredentialsMissingKey(name.clone()));
            }
        }

        if self.users.is_empty() {
            return Err(Error::NoUsers);
        }
        for user in &self.users {
            if user.username.is_empty() {
                return Err(Error::UserMissingName);
            }
            if user.password.is_empty() {
                return Err(Error::UserMissingPassword(user.username.clone()));
            }
        }

        for (name, domain) in &self.domains {
            if !self.credentials.contains_key(&domain.credentials) {
                return Err(Error::UnknownCredentials(
                    name.clone(),
                    domain.credentials.clone(),
                ));
            }
            for allowed in &domain.users {
                if !self.users.iter().any(|user| &user.username == allowed) {
                    return Err(Error::UnknownUser(name.clone(), allowed.clone()));
                }
            }
            if domain.zone_id.is_empty() {
                return Err(Error::DomainMissingZone(name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `domains` comes last so tests can append extra entries to it.
    const VALID: &str = r"
credentials:
  aws1:
    access_id: AKIAEXAMPLE
    access_key: sekrit
users:
  - username: alice
    password: correct
  - username: bob
    password: hunter2
domains:
  home.example.com:
    zone_id: Z0123456789
    credentials: aws1
    users: [alice]
";

    #[test]
    fn load_injects_names_and_defaults_ttl() {
        let conf = Config::load(VALID).unwrap();
        assert_eq!(conf.ttl, 60);
        assert_eq!(conf.credentials["aws1"].name, "aws1");
        assert_eq!(conf.domains["home.example.com"].name, "home.example.com");
        assert_eq!(conf.domains["home.example.com"].zone_id, "Z0123456789");
    }

    #[test]
    fn explicit_ttl_is_kept() {
        let conf = Config::load(&format!("{VALID}\nttl: 300")).unwrap();
        assert_eq!(conf.ttl, 300);
    }

    #[test]
    fn rejects_missing_credentials() {
        let err = Config::load("users:\n  - username: a\n    password: b\n").unwrap_err();
        assert!(matches!(err, Error::NoCredentials));
    }

    #[test]
    fn rejects_missing_users() {
        let err = Config::load(
            "credentials:\n  aws1:\n    access_id: id\n    access_key: key\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoUsers));
    }

    #[test]
    fn rejects_credentials_without_access_key() {
        let err = Config::load(
            "credentials:\n  aws1:\n    access_id: id\nusers:\n  - username: a\n    password: b\n",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "credentials 'aws1' must specify access_key");
    }

    #[test]
    fn rejects_user_without_password() {
        let err = Config::load(
            "credentials:\n  aws1:\n    access_id: id\n    access_key: key\nusers:\n  - username: carol\n",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "user 'carol' must specify a password");
    }

    #[test]
    fn rejects_dangling_credentials_reference() {
        let err = Config::load(&format!(
            "{VALID}  other.example.com:\n    zone_id: Z9\n    credentials: nope\n"
        ))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "domain 'other.example.com': could not find credentials named 'nope'"
        );
    }

    #[test]
    fn rejects_undeclared_user_in_allow_list() {
        let err = Config::load(&format!(
            "{VALID}  other.example.com:\n    zone_id: Z9\n    credentials: aws1\n    users: [mallory]\n"
        ))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "domain 'other.example.com': could not find user named 'mallory'"
        );
    }

    #[test]
    fn rejects_domain_without_zone_id() {
        let err = Config::load(&format!(
            "{VALID}  other.example.com:\n    credentials: aws1\n"
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "domain 'other.example.com' must specify zone_id");
    }

    #[test]
    fn authenticate_accepts_correct_password() {
        let conf = Config::load(VALID).unwrap();
        assert!(conf.authenticate("alice", "correct").is_some());
    }

    #[test]
    fn authenticate_rejects_same_length_mismatch() {
        let conf = Config::load(VALID).unwrap();
        // "borrect" has the same length as the real password
        assert!(conf.authenticate("alice", "borrect").is_none());
    }

    #[test]
    fn authenticate_rejects_different_length_mismatch() {
        let conf = Config::load(VALID).unwrap();
        assert!(conf.authenticate("alice", "corr").is_none());
        assert!(conf.authenticate("alice", "correct-but-longer").is_none());
    }

    #[test]
    fn authenticate_rejects_unknown_user() {
        let conf = Config::load(VALID).unwrap();
        assert!(conf.authenticate("mallory", "correct").is_none());
    }

    #[test]
    fn authorize_checks_allow_list() {
        let conf = Config::load(VALID).unwrap();
        let domain = conf.find_domain("home.example.com").unwrap();
        let alice = conf.authenticate("alice", "correct").unwrap();
        assert!(conf.authorize(alice, domain));
        let bob = conf.authenticate("bob", "hunter2").unwrap();
        assert!(!conf.authorize(bob, domain));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let conf = Config::load(VALID).unwrap();
        let debug = format!("{conf:?}");
        assert!(!debug.contains("sekrit"));
        assert!(!debug.contains("hunter2"));
    }
}
