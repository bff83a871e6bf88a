use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated identity carried between requests.
///
/// Every field is optional. An absent field and an empty one are distinct and
/// both survive serialization.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(rename = "AccessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(rename = "IDToken", default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    #[serde(rename = "CreatedAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "ExpiresOn", default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<DateTime<Utc>>,

    #[serde(rename = "RefreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(
        rename = "PreferredUsername",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_username: Option<String>,
}

fn is_set(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

fn is_unix_zero(ts: &Option<DateTime<Utc>>) -> bool {
    ts.is_none_or(|t| t.timestamp() == 0)
}

impl SessionState {
    /// True when `expires_on` is set, non-zero and strictly in the past.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_on {
            Some(expires) if !is_unix_zero(&self.expires_on) => expires < now,
            _ => false,
        }
    }

    /// Time since `created_at`, measured from `now` truncated to whole seconds.
    /// Zero when the session has no creation time.
    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        match self.created_at {
            Some(created) if !is_unix_zero(&self.created_at) => {
                let now = now.duration_trunc(Duration::seconds(1)).unwrap_or(now);
                now - created
            }
            _ => Duration::zero(),
        }
    }

    pub fn has_access_token(&self) -> bool {
        is_set(&self.access_token)
    }

    /// Identity used for upstream headers: `user`, falling back to `email`.
    pub fn identity(&self) -> Option<&str> {
        self.user
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.email.as_deref().filter(|e| !e.is_empty()))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session{{email:{} user:{} PreferredUsername:{}",
            self.email.as_deref().unwrap_or_default(),
            self.user.as_deref().unwrap_or_default(),
            self.preferred_username.as_deref().unwrap_or_default()
        )?;
        if is_set(&self.access_token) {
            f.write_str(" token:true")?;
        }
        if is_set(&self.id_token) {
            f.write_str(" id_token:true")?;
        }
        if let Some(created) = self.created_at {
            write!(f, " created:{created}")?;
        }
        if let Some(expires) = self.expires_on {
            write!(f, " expires:{expires}")?;
        }
        if is_set(&self.refresh_token) {
            f.write_str(" refresh_token:true")?;
        }
        f.write_str("}")
    }
}

// Tokens must never reach logs, so Debug shares the redacted summary.
impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
