use async_trait::async_trait;

use crate::contract::{
    error::PortalError,
    model::{
        AccessToken, AuthResponse, LoginRequest, RegisterPayload, School, SchoolRequest, Student,
        StudentRequest,
    },
};

/// Transport-agnostic view of the student API.
#[async_trait]
pub trait StudentPortalApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, PortalError>;

    /// `POST /auth/register`
    async fn register(&self, payload: &RegisterPayload) -> Result<Student, PortalError>;

    /// `POST /auth/register-admin` (authenticated)
    async fn register_admin(
        &self,
        payload: &RegisterPayload,
        token: &AccessToken,
    ) -> Result<Student, PortalError>;

    /// `GET /students` (authenticated)
    async fn list_students(&self, token: &AccessToken) -> Result<Vec<Student>, PortalError>;

    /// `GET /schools`
    async fn list_schools(&self) -> Result<Vec<School>, PortalError>;

    /// `POST /schools` (authenticated)
    async fn create_school(
        &self,
        request: &SchoolRequest,
        token: &AccessToken,
    ) -> Result<School, PortalError>;

    /// `GET /students/{id}` (authenticated)
    async fn get_student(&self, id: i64, token: &AccessToken) -> Result<Student, PortalError>;

    /// `POST /students` (authenticated)
    async fn create_student(
        &self,
        request: &StudentRequest,
        token: &AccessToken,
    ) -> Result<Student, PortalError>;

    /// `PUT /students/{id}` (authenticated)
    async fn update_student(
        &self,
        id: i64,
        request: &StudentRequest,
        token: &AccessToken,
    ) -> Result<Student, PortalError>;

    /// `DELETE /students/{id}` (authenticated)
    async fn delete_student(&self, id: i64, token: &AccessToken) -> Result<(), PortalError>;
}
