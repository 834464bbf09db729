use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UserId;
use crate::error::ApiError;

/// Role attached to every account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Passenger,
    Driver,
    Worker,
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Passenger => "passenger",
            AccountType::Driver => "driver",
            AccountType::Worker => "worker",
            AccountType::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passenger" => Ok(AccountType::Passenger),
            "driver" => Ok(AccountType::Driver),
            "worker" => Ok(AccountType::Worker),
            "admin" => Ok(AccountType::Admin),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// The logged-in user as cached by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
}

/// The sign-up form as typed, password confirmation included.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    pub password: String,
    pub confirm_password: String,
    pub account_type: Option<AccountType>,
}

impl RegisterDraft {
    /// The confirmation must repeat the password exactly.
    pub fn into_request(self) -> Result<RegisterRequest, ApiError> {
        if self.password != self.confirm_password {
            return Err(ApiError::validation("Passwords do not match"));
        }
        Ok(RegisterRequest {
            name: self.name,
            email: self.email,
            phone: self.phone,
            gender: self.gender,
            password: self.password,
            account_type: self.account_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub account_type: AccountType,
    /// Bearer token, for servers that issue one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LoginResponse {
    pub fn user(&self) -> User {
        User {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            account_type: self.account_type,
        }
    }

    /// The server's token, or the `user_<id>` session token when it sends none.
    pub fn session_token(&self) -> String {
        self.token
            .clone()
            .unwrap_or_else(|| format!("user_{}", self.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_without_token_uses_user_prefix() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"message":"Login successful","user_id":4,"name":"Asha","email":"asha@example.com","account_type":"driver"}"#,
        )
        .unwrap();
        assert_eq!(response.session_token(), "user_4");
        assert_eq!(response.user().account_type, AccountType::Driver);
    }

    #[test]
    fn register_request_omits_missing_account_type() {
        let request = RegisterRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            gender: Gender::Female,
            password: "secret1".to_string(),
            account_type: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["gender"], "female");
        assert!(body.get("account_type").is_none());
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let draft = RegisterDraft {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            gender: Gender::Female,
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
            account_type: None,
        };
        let err = draft.clone().into_request().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "Passwords do not match");

        let request = RegisterDraft {
            confirm_password: "secret1".to_string(),
            ..draft
        }
        .into_request()
        .unwrap();
        assert_eq!(request.password, "secret1");
    }

    #[test]
    fn account_type_parses_from_storage_string() {
        assert_eq!("admin".parse::<AccountType>(), Ok(AccountType::Admin));
        assert!("captain".parse::<AccountType>().is_err());
    }
}
