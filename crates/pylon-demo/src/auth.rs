//! Registration and login endpoints.

use chrono::NaiveDate;
use pylon_bind::{FieldSpec, RequestView, Rule, Shape};
use pylon_core::{ErrorKind, Handler, Payload, PylonError, PylonResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::password::PasswordHash;
use crate::store::{NewUser, UserRepository};
use crate::token::TokenIssuer;

/// Accepted `birth_date` layout.
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// JSON body of `POST /auth/register`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterBody {
    /// Account email.
    pub email: String,
    /// Plain-text password, 8 to 64 characters.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Optional E.164 phone number.
    pub phone: String,
    /// Optional `YYYY-MM-DD` date of birth.
    pub birth_date: String,
}

/// `POST /auth/register`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    /// Request body.
    pub body: RegisterBody,
}

impl RequestView for RegisterRequest {
    fn shape() -> Shape {
        Shape::new("RegisterRequest")
            .with_body()
            .field(FieldSpec::body("body.email").rule(Rule::Email).rule(Rule::Required))
            .field(password_field())
            .field(FieldSpec::body("body.first_name").rule(Rule::Required))
            .field(FieldSpec::body("body.last_name").rule(Rule::Required))
            .field(FieldSpec::body("body.phone").optional().rule(Rule::E164))
            .field(
                FieldSpec::body("body.birth_date")
                    .optional()
                    .rule(Rule::DateFormat(BIRTH_DATE_FORMAT)),
            )
    }
}

/// JSON body of `POST /auth/login`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginBody {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// `POST /auth/login`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Request body.
    pub body: LoginBody,
}

impl RequestView for LoginRequest {
    fn shape() -> Shape {
        Shape::new("LoginRequest")
            .with_body()
            .field(FieldSpec::body("body.email").rule(Rule::Email).rule(Rule::Required))
            .field(password_field())
    }
}

fn password_field() -> FieldSpec {
    FieldSpec::body("body.password")
        .rule(Rule::MinLength(8))
        .rule(Rule::MaxLength(64))
        .rule(Rule::Required)
}

/// Answer to a successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    /// Opaque access token.
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates accounts and signs them in.
pub struct Register {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenIssuer>,
}

impl Register {
    /// Creates the handler.
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }
}

impl Handler<RegisterRequest, Payload<TokenView>> for Register {
    async fn handle(&self, request: &RegisterRequest) -> PylonResult<Payload<TokenView>> {
        let body = &request.body;
        let birth_date = match body.birth_date.as_str() {
            "" => None,
            raw => Some(
                NaiveDate::parse_from_str(raw, BIRTH_DATE_FORMAT)
                    .map_err(|err| PylonError::wrap(ErrorKind::InvalidParameters, err))?,
            ),
        };

        let user = self.users.create(NewUser {
            email: normalize_email(&body.email),
            password: PasswordHash::generate(&body.password),
            first_name: body.first_name.clone(),
            last_name: body.last_name.clone(),
            phone: Some(body.phone.clone()).filter(|phone| !phone.is_empty()),
            birth_date,
        })?;
        tracing::info!(user_id = user.id, "user registered");

        Ok(Payload::new(TokenView {
            token: self.tokens.issue(user.id),
        }))
    }
}

/// Exchanges credentials for a token.
pub struct Login {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenIssuer>,
}

impl Login {
    /// Creates the handler.
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }
}

impl Handler<LoginRequest, Payload<TokenView>> for Login {
    async fn handle(&self, request: &LoginRequest) -> PylonResult<Payload<TokenView>> {
        let user = self
            .users
            .find_by_email(&normalize_email(&request.body.email))?
            .ok_or_else(|| {
                PylonError::with_detail(ErrorKind::InvalidCredentials, "user does not exist")
            })?;

        if !user.password.verify(&request.body.password) {
            return Err(PylonError::with_detail(
                ErrorKind::InvalidCredentials,
                "password mismatch",
            ));
        }

        Ok(Payload::new(TokenView {
            token: self.tokens.issue(user.id),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUsers;

    struct Fixture {
        register: Register,
        login: Login,
        tokens: Arc<TokenIssuer>,
    }

    fn fixture() -> Fixture {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUsers::new());
        let tokens = Arc::new(TokenIssuer::new());
        Fixture {
            register: Register::new(users.clone(), tokens.clone()),
            login: Login::new(users, tokens.clone()),
            tokens,
        }
    }

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            body: RegisterBody {
                email: email.to_string(),
                password: "correct horse".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                phone: String::new(),
                birth_date: "1990-04-21".to_string(),
            },
        }
    }

    fn credentials(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            body: LoginBody {
                email: email.to_string(),
                password: password.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_register_issues_token() {
        let f = fixture();
        let view = f.register.handle(&registration("jane@example.com")).await.unwrap();
        assert_eq!(f.tokens.resolve(&view.get().token), Ok(1));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let f = fixture();
        f.register.handle(&registration("jane@example.com")).await.unwrap();
        let err = f
            .register
            .handle(&registration("  JANE@example.com "))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let f = fixture();
        f.register.handle(&registration("Jane@Example.com")).await.unwrap();
        let view = f
            .login
            .handle(&credentials("jane@example.com", "correct horse"))
            .await
            .unwrap();
        assert_eq!(f.tokens.resolve(&view.get().token), Ok(1));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let f = fixture();
        f.register.handle(&registration("jane@example.com")).await.unwrap();

        let wrong_password = f
            .login
            .handle(&credentials("jane@example.com", "battery staple"))
            .await
            .unwrap_err();
        assert!(wrong_password.is(ErrorKind::InvalidCredentials));

        let unknown = f
            .login
            .handle(&credentials("john@example.com", "correct horse"))
            .await
            .unwrap_err();
        assert!(unknown.is(ErrorKind::InvalidCredentials));
    }
}
