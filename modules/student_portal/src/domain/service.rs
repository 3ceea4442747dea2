use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::contract::client::StudentPortalApi;
use crate::contract::error::PortalError;
use crate::contract::model::{School, Session, Student};
use crate::domain::forms::{LoginForm, RegisterForm, SchoolForm, StudentForm};
use crate::domain::session::{clear_session, load_session, save_session, SessionStore};
use crate::domain::view::DashboardView;

pub const MSG_LOGIN_FAILED: &str = "Login failed";
pub const MSG_REGISTRATION_FAILED: &str = "Registration failed";
pub const MSG_STUDENTS_FAILED: &str = "Failed to load students";
pub const MSG_SCHOOLS_FAILED: &str = "Failed to load schools";
pub const MSG_SCHOOL_SAVE_FAILED: &str = "Failed to create school";
pub const MSG_STUDENT_FAILED: &str = "Failed to load student";
pub const MSG_SAVE_FAILED: &str = "Failed to save student";
pub const MSG_DELETE_FAILED: &str = "Failed to delete student";

/// Screen a flow sends the user to next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

/// Result of a flow that needs a session: either data, or a redirect.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    Redirect(Route),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ready(v) => Outcome::Ready(f(v)),
            Self::Redirect(r) => Outcome::Redirect(r),
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Redirect(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    pub student: Student,
    pub next: Route,
}

/// Login, registration, dashboard and admin flows over the student API.
/// Depends only on the API and session ports, not on infra types.
#[derive(Clone)]
pub struct PortalService {
    api: Arc<dyn StudentPortalApi>,
    sessions: Arc<dyn SessionStore>,
}

impl PortalService {
    pub fn new(api: Arc<dyn StudentPortalApi>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { api, sessions }
    }

    /// Submit credentials and store the returned token.
    #[instrument(name = "student_portal.service.login", skip_all)]
    pub async fn login(&self, form: LoginForm) -> Result<Route, PortalError> {
        let request = form.validate()?;

        let auth = self
            .api
            .login(&request)
            .await
            .map_err(|e| e.with_fallback(MSG_LOGIN_FAILED))?;

        if auth.token.trim().is_empty() {
            return Err(PortalError::decode("login response carried an empty token"));
        }

        let session = Session::new(auth.access_token(), Some(request.username));
        save_session(self.sessions.as_ref(), &session)?;
        info!(token_type = %session.token_type, "signed in");
        Ok(Route::Dashboard)
    }

    /// Validate the profile and create the account; the next stop is the login screen.
    #[instrument(name = "student_portal.service.register", skip_all)]
    pub async fn register(&self, form: RegisterForm) -> Result<Registered, PortalError> {
        let payload = form.validate()?;

        let student = self
            .api
            .register(&payload)
            .await
            .map_err(|e| e.with_fallback(MSG_REGISTRATION_FAILED))?;

        info!(student_id = student.id, "account registered");
        Ok(Registered {
            student,
            next: Route::Login,
        })
    }

    /// Schools for the registration selection list.
    #[instrument(name = "student_portal.service.schools", skip_all)]
    pub async fn schools(&self) -> Result<Vec<School>, PortalError> {
        let schools = self
            .api
            .list_schools()
            .await
            .map_err(|e| e.with_fallback(MSG_SCHOOLS_FAILED))?;
        debug!(count = schools.len(), "schools loaded");
        Ok(schools)
    }

    /// Add a school; needs a session like the other admin flows.
    #[instrument(name = "student_portal.service.create_school", skip_all)]
    pub async fn create_school(&self, form: SchoolForm) -> Result<Outcome<School>, PortalError> {
        let request = form.validate()?;
        let Some(session) = self.current_session()? else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let result = self.api.create_school(&request, &session.access_token()).await;
        if let Ok(school) = &result {
            info!(school_id = school.id, "school created");
        }
        self.settle(result, MSG_SCHOOL_SAVE_FAILED)
    }

    /// Student list for the signed-in user.
    #[instrument(name = "student_portal.service.dashboard", skip_all)]
    pub async fn dashboard(&self) -> Result<Outcome<DashboardView>, PortalError> {
        let Some(session) = self.current_session()? else {
            debug!("no stored session");
            return Ok(Outcome::Redirect(Route::Login));
        };

        let result = self.api.list_students(&session.access_token()).await;
        let outcome = self.settle(result, MSG_STUDENTS_FAILED)?;
        Ok(outcome.map(|students| DashboardView::new(&students, session.user_email.as_deref())))
    }

    #[instrument(name = "student_portal.service.student", skip(self))]
    pub async fn student(&self, id: i64) -> Result<Outcome<Student>, PortalError> {
        let Some(session) = self.current_session()? else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let result = self.api.get_student(id, &session.access_token()).await;
        self.settle(result, MSG_STUDENT_FAILED)
    }

    #[instrument(name = "student_portal.service.create_student", skip_all)]
    pub async fn create_student(&self, form: StudentForm) -> Result<Outcome<Student>, PortalError> {
        let request = form.validate(true)?;
        let Some(session) = self.current_session()? else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let result = self
            .api
            .create_student(&request, &session.access_token())
            .await;
        self.settle(result, MSG_SAVE_FAILED)
    }

    #[instrument(name = "student_portal.service.update_student", skip(self, form))]
    pub async fn update_student(
        &self,
        id: i64,
        form: StudentForm,
    ) -> Result<Outcome<Student>, PortalError> {
        let request = form.validate(false)?;
        let Some(session) = self.current_session()? else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let result = self
            .api
            .update_student(id, &request, &session.access_token())
            .await;
        self.settle(result, MSG_SAVE_FAILED)
    }

    #[instrument(name = "student_portal.service.delete_student", skip(self))]
    pub async fn delete_student(&self, id: i64) -> Result<Outcome<()>, PortalError> {
        let Some(session) = self.current_session()? else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let result = self.api.delete_student(id, &session.access_token()).await;
        self.settle(result, MSG_DELETE_FAILED)
    }

    /// Create an account with elevated rights, on behalf of the signed-in user.
    #[instrument(name = "student_portal.service.register_admin", skip_all)]
    pub async fn register_admin(&self, form: RegisterForm) -> Result<Outcome<Student>, PortalError> {
        let payload = form.validate()?;
        let Some(session) = self.current_session()? else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let result = self
            .api
            .register_admin(&payload, &session.access_token())
            .await;
        self.settle(result, MSG_REGISTRATION_FAILED)
    }

    /// Forget the stored session.
    #[instrument(name = "student_portal.service.logout", skip_all)]
    pub fn logout(&self) -> Result<Route, PortalError> {
        clear_session(self.sessions.as_ref())?;
        info!("signed out");
        Ok(Route::Login)
    }

    pub fn current_session(&self) -> Result<Option<Session>, PortalError> {
        load_session(self.sessions.as_ref())
    }

    /// 401/403 clears the session and redirects to login; other failures keep
    /// the server message or take `fallback`.
    fn settle<T>(
        &self,
        result: Result<T, PortalError>,
        fallback: &str,
    ) -> Result<Outcome<T>, PortalError> {
        match result {
            Ok(value) => Ok(Outcome::Ready(value)),
            Err(err) if err.is_auth_failure() => {
                warn!(status = ?err.status(), "session rejected by the API, clearing it");
                clear_session(self.sessions.as_ref())?;
                Ok(Outcome::Redirect(Route::Login))
            }
            Err(err) => Err(err.with_fallback(fallback)),
        }
    }
}
