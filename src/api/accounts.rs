//! Account accessors. These need an admin login.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::session::Session;

/// A server account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    /// Groups this account belongs to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub belongs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    /// Remaining properties, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct ListPayload<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

impl Session {
    pub async fn get_accounts(&self) -> Result<Vec<Account>> {
        let payload: ListPayload<Account> = self.api_get("get_accounts", Vec::new()).await?;
        Ok(payload.list)
    }

    pub async fn get_usernames(&self) -> Result<Vec<String>> {
        let payload: ListPayload<String> = self.api_get("get_usernames", Vec::new()).await?;
        Ok(payload.list)
    }

    pub async fn get_account(&self, username: &str) -> Result<Account> {
        self.api_get(
            "get_account",
            vec![("username".to_string(), username.to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_decoding() {
        let account: Account = serde_json::from_value(json!({
            "username": "abct",
            "belongs": ["staff"],
            "admin": true,
            "redirect": "/data/"
        }))
        .unwrap();
        assert_eq!(account.username, "abct");
        assert_eq!(account.belongs, vec!["staff"]);
        assert_eq!(account.admin, Some(true));
        assert_eq!(account.extra.get("redirect"), Some(&json!("/data/")));

        let payload: ListPayload<String> = serde_json::from_value(json!({})).unwrap();
        assert!(payload.list.is_empty());
    }
}
