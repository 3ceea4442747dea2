use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Token scheme used when the API (or the stored session) does not name one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

/// Body of `POST /schools`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolRequest {
    pub name: String,
}

/// Student record as returned by the API. Read-only on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default)]
    pub school: Option<School>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Student {
    /// Campus name: the flat `schoolName` when present, otherwise the nested school.
    pub fn campus(&self) -> Option<&str> {
        non_blank(self.school_name.as_deref())
            .or_else(|| self.school.as_ref().and_then(|s| non_blank(Some(&s.name))))
    }

    pub fn role(&self) -> Option<&str> {
        non_blank(self.role.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// The API sends `null` for unset text columns; read those as "".
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    /// Blank when the API omits it; [`AccessToken::new`] supplies the default.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub token_type: String,
}

impl AuthResponse {
    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.token.clone(), Some(&self.token_type))
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/register` and `POST /auth/register-admin`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
}

impl fmt::Debug for RegisterPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterPayload")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("school_id", &self.school_id)
            .field("school_name", &self.school_name)
            .finish()
    }
}

/// Body of `POST /students` and `PUT /students/{id}`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl fmt::Debug for StudentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudentRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("school_id", &self.school_id)
            .field("school_name", &self.school_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Token plus scheme, rendered as `Authorization: <scheme> <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    token_type: String,
}

impl AccessToken {
    /// A blank or missing scheme falls back to [`DEFAULT_TOKEN_TYPE`].
    pub fn new(token: impl Into<String>, token_type: Option<&str>) -> Self {
        let token_type = token_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TOKEN_TYPE)
            .to_string();
        Self {
            token: token.into(),
            token_type,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Client-side session: created on login, destroyed on logout or rejection.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub token_type: String,
    pub user_email: Option<String>,
}

impl Session {
    pub fn new(access: AccessToken, user_email: Option<String>) -> Self {
        Self {
            token: access.token,
            token_type: access.token_type,
            user_email,
        }
    }

    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.token.clone(), Some(&self.token_type))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("token", &"<redacted>")
            .field("user_email", &self.user_email)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_accepts_both_school_shapes() {
        let flat: Student = serde_json::from_value(json!({
            "id": 1, "name": "Ada", "email": "ada@campus.edu",
            "schoolName": "North Campus", "role": "ADMIN"
        }))
        .unwrap();
        assert_eq!(flat.campus(), Some("North Campus"));
        assert_eq!(flat.role(), Some("ADMIN"));

        let nested: Student = serde_json::from_value(json!({
            "id": 2, "name": "Bob", "email": "bob@campus.edu",
            "school": { "id": 7, "name": "Main Campus" }, "role": null
        }))
        .unwrap();
        assert_eq!(nested.campus(), Some("Main Campus"));
        assert_eq!(nested.role(), None);

        let bare: Student =
            serde_json::from_value(json!({ "id": 3, "name": "Cy", "email": "cy@campus.edu" }))
                .unwrap();
        assert_eq!(bare.campus(), None);
    }

    #[test]
    fn blank_school_name_falls_back_to_nested_school() {
        let s = Student {
            id: 4,
            name: "Dee".into(),
            email: "dee@campus.edu".into(),
            school: Some(School {
                id: 1,
                name: "Main Campus".into(),
            }),
            school_name: Some("  ".into()),
            role: None,
        };
        assert_eq!(s.campus(), Some("Main Campus"));
    }

    #[test]
    fn auth_response_without_token_type_defaults_to_bearer() {
        let resp: AuthResponse = serde_json::from_value(json!({ "token": "abc" })).unwrap();
        let access = resp.access_token();
        assert_eq!(access.token_type(), "Bearer");
        assert_eq!(access.header_value(), "Bearer abc");

        let custom = AccessToken::new("xyz", Some("Token"));
        assert_eq!(custom.header_value(), "Token xyz");
    }

    #[test]
    fn null_text_fields_are_read_as_empty() {
        let student: Student = serde_json::from_value(json!({
            "id": 2, "name": null, "email": null, "schoolName": null, "role": null
        }))
        .unwrap();
        assert_eq!(student.name, "");
        assert_eq!(student.email, "");
        assert_eq!(student.campus(), None);

        let resp: AuthResponse =
            serde_json::from_value(json!({ "token": "abc", "tokenType": null })).unwrap();
        assert_eq!(resp.access_token().header_value(), "Bearer abc");

        let school: School = serde_json::from_value(json!({ "id": 1, "name": null })).unwrap();
        assert_eq!(school.name, "");
    }

    #[test]
    fn register_payload_omits_absent_school_fields() {
        let payload = RegisterPayload {
            name: "Ada".into(),
            email: "ada@campus.edu".into(),
            password: "secret1".into(),
            school_id: Some(3),
            school_name: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["schoolId"], 3);
        assert!(value.get("schoolName").is_none());
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let session = Session::new(AccessToken::new("s3cr3t-token", None), None);
        let login = LoginRequest {
            username: "ada@campus.edu".into(),
            password: "hunter22".into(),
        };

        assert!(!format!("{:?}", session).contains("s3cr3t-token"));
        assert!(!format!("{:?}", session.access_token()).contains("s3cr3t-token"));
        assert!(!format!("{:?}", login).contains("hunter22"));
    }
}
