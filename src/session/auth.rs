//! Authentication modes and credential handling.

use std::fmt;

/// How a single request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `Authorization: Basic ...` built from the configured credentials.
    Basic,
    /// Cookie from an established login plus a `Referer` header, the way the
    /// web interface issues writes.
    Session,
    /// Whichever credential is configured.
    #[default]
    Either,
}

/// Username and password for an HFS account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Whether these credentials survive Basic auth.
    ///
    /// Servers decode the Basic header as latin-1, so non-ASCII usernames
    /// (e.g. Chinese account names) must go through a login session instead.
    pub fn basic_capable(&self) -> bool {
        self.username.is_ascii()
    }

    /// Value of the `login` query parameter.
    pub(crate) fn login_value(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What actually gets attached to a request once the mode is resolved
/// against the configured credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EffectiveAuth {
    Basic,
    Session { referer: bool },
    Anonymous,
}

impl EffectiveAuth {
    pub(crate) fn resolve(mode: AuthMode, credentials: Option<&Credentials>) -> Self {
        match mode {
            AuthMode::Basic if credentials.is_some() => EffectiveAuth::Basic,
            AuthMode::Basic => EffectiveAuth::Anonymous,
            AuthMode::Session => EffectiveAuth::Session { referer: true },
            AuthMode::Either => match credentials {
                Some(c) if c.basic_capable() => EffectiveAuth::Basic,
                _ => EffectiveAuth::Session { referer: false },
            },
        }
    }

    pub(crate) fn uses_session(&self) -> bool {
        matches!(self, EffectiveAuth::Session { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_basic() {
        let creds = Credentials::new("abct", "abc123");
        assert_eq!(
            EffectiveAuth::resolve(AuthMode::Basic, Some(&creds)),
            EffectiveAuth::Basic
        );
        assert_eq!(
            EffectiveAuth::resolve(AuthMode::Basic, None),
            EffectiveAuth::Anonymous
        );
    }

    #[test]
    fn test_resolve_session_always_sends_referer() {
        let creds = Credentials::new("abct", "abc123");
        assert_eq!(
            EffectiveAuth::resolve(AuthMode::Session, Some(&creds)),
            EffectiveAuth::Session { referer: true }
        );
        assert_eq!(
            EffectiveAuth::resolve(AuthMode::Session, None),
            EffectiveAuth::Session { referer: true }
        );
    }

    #[test]
    fn test_resolve_either() {
        let ascii = Credentials::new("abct", "abc123");
        let non_ascii = Credentials::new("用户", "abc123");
        assert_eq!(
            EffectiveAuth::resolve(AuthMode::Either, Some(&ascii)),
            EffectiveAuth::Basic
        );
        assert_eq!(
            EffectiveAuth::resolve(AuthMode::Either, Some(&non_ascii)),
            EffectiveAuth::Session { referer: false }
        );
        assert!(EffectiveAuth::resolve(AuthMode::Either, None).uses_session());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("abct", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("abct"));
        assert!(!printed.contains("hunter2"));
        assert_eq!(creds.login_value(), "abct:hunter2");
    }
}
