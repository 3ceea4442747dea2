//! Client-side form validation. A form that fails here never reaches the network.

use crate::contract::error::PortalError;
use crate::contract::model::{LoginRequest, RegisterPayload, SchoolRequest, StudentRequest};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const MSG_SCHOOL_REQUIRED: &str = "Select a school or enter a new school name";
pub const MSG_SCHOOL_CONFLICT: &str =
    "Choose either an existing school or a new school name, not both";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchoolChoice {
    Existing(i64),
    New(String),
    Unspecified,
}

impl SchoolChoice {
    /// Build from the two optional inputs. Picking one clears the other in the
    /// web form, so both together are rejected.
    pub fn from_parts(school_id: Option<i64>, school_name: Option<&str>) -> Result<Self, PortalError> {
        let name = school_name.map(str::trim).filter(|n| !n.is_empty());
        match (school_id, name) {
            (Some(_), Some(_)) => Err(PortalError::validation(MSG_SCHOOL_CONFLICT)),
            (Some(id), None) => Ok(Self::Existing(id)),
            (None, Some(name)) => Ok(Self::New(name.to_string())),
            (None, None) => Ok(Self::Unspecified),
        }
    }

    fn into_parts(self) -> (Option<i64>, Option<String>) {
        match self {
            Self::Existing(id) => (Some(id), None),
            Self::New(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    (None, None)
                } else {
                    (None, Some(name))
                }
            }
            Self::Unspecified => (None, None),
        }
    }
}

#[derive(Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<LoginRequest, PortalError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(PortalError::validation("Email is required"));
        }
        if self.password.is_empty() {
            return Err(PortalError::validation("Password is required"));
        }
        Ok(LoginRequest {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub school: SchoolChoice,
}

impl RegisterForm {
    /// Field checks run first, then the school requirement.
    pub fn validate(&self) -> Result<RegisterPayload, PortalError> {
        let name = required(&self.name, "Name is required")?;
        let email = email(&self.email)?;
        password(&self.password)?;

        let (school_id, school_name) = self.school.clone().into_parts();
        if school_id.is_none() && school_name.is_none() {
            return Err(PortalError::validation(MSG_SCHOOL_REQUIRED));
        }

        Ok(RegisterPayload {
            name,
            email,
            password: self.password.clone(),
            school_id,
            school_name,
        })
    }
}

/// New school entry.
#[derive(Debug, Clone)]
pub struct SchoolForm {
    pub name: String,
}

impl SchoolForm {
    pub fn validate(&self) -> Result<SchoolRequest, PortalError> {
        Ok(SchoolRequest {
            name: required(&self.name, "School name is required")?,
        })
    }
}

/// Admin create/update form for a student record.
#[derive(Clone)]
pub struct StudentForm {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub school: SchoolChoice,
    pub role: Option<String>,
}

impl StudentForm {
    /// `require_password` is set for creation; updates may keep the current password.
    pub fn validate(&self, require_password: bool) -> Result<StudentRequest, PortalError> {
        let name = required(&self.name, "Name is required")?;
        let email = email(&self.email)?;

        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => {
                password(p)?;
                Some(p.to_string())
            }
            _ if require_password => return Err(PortalError::validation("Password is required")),
            _ => None,
        };

        let role = self
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_ascii_uppercase);

        let (school_id, school_name) = self.school.clone().into_parts();

        Ok(StudentRequest {
            name,
            email,
            password,
            school_id,
            school_name,
            role,
        })
    }
}

fn required(value: &str, message: &str) -> Result<String, PortalError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(PortalError::validation(message));
    }
    Ok(v.to_string())
}

fn email(value: &str) -> Result<String, PortalError> {
    let v = required(value, "Email is required")?;
    if !looks_like_email(&v) {
        return Err(PortalError::validation("Enter a valid email address"));
    }
    Ok(v)
}

fn password(value: &str) -> Result<(), PortalError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortalError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Same shape check a browser applies to `type="email"` inputs, loosely.
fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
