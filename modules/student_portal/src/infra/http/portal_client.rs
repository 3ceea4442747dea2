use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::contract::client::StudentPortalApi;
use crate::contract::error::{ApiError, PortalError};
use crate::contract::model::{
    AccessToken, AuthResponse, LoginRequest, RegisterPayload, School, SchoolRequest, Student,
    StudentRequest,
};
use httpkit::TracedClient;

/// HTTP adapter for the student API rooted at `base`.
pub struct HttpPortalClient {
    client: TracedClient,
    base: Url,
}

/// Error body the API sends with non-success responses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpPortalClient {
    pub fn new(client: TracedClient, base: Url) -> Self {
        Self { client, base }
    }

    /// `base` + path segments; a base path such as `/api/` is kept.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PortalError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PortalError::validation(format!("invalid API base URL '{}'", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, PortalError> {
        let url = self.endpoint(segments)?;
        Ok(self.client.request(method, url.as_str()))
    }

    /// Send, attaching `Authorization` when a token is given; non-2xx becomes `PortalError::Api`.
    async fn dispatch(
        &self,
        builder: RequestBuilder,
        token: Option<&AccessToken>,
    ) -> Result<Response, PortalError> {
        let builder = match token {
            Some(t) => builder.header(AUTHORIZATION, t.header_value()),
            None => builder,
        };

        let response = self
            .client
            .send(builder)
            .await
            .map_err(|e| PortalError::transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(read_api_error(response).await.into())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        token: Option<&AccessToken>,
    ) -> Result<T, PortalError> {
        let response = self.dispatch(builder, token).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortalError::decode(e.to_string()))
    }

    async fn fetch_with_body<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<T, PortalError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, segments)?.json(body);
        self.fetch(builder, token).await
    }
}

async fn read_api_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message),
        Err(_) => None,
    };
    debug!(status, has_message = message.is_some(), "API returned an error");
    ApiError::new(status, message)
}

#[async_trait]
impl StudentPortalApi for HttpPortalClient {
    #[instrument(name = "student_portal.http.login", skip_all, fields(base = %self.base))]
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, PortalError> {
        self.fetch_with_body(Method::POST, &["auth", "login"], request, None)
            .await
    }

    #[instrument(name = "student_portal.http.register", skip_all, fields(base = %self.base))]
    async fn register(&self, payload: &RegisterPayload) -> Result<Student, PortalError> {
        self.fetch_with_body(Method::POST, &["auth", "register"], payload, None)
            .await
    }

    #[instrument(name = "student_portal.http.register_admin", skip_all, fields(base = %self.base))]
    async fn register_admin(
        &self,
        payload: &RegisterPayload,
        token: &AccessToken,
    ) -> Result<Student, PortalError> {
        self.fetch_with_body(
            Method::POST,
            &["auth", "register-admin"],
            payload,
            Some(token),
        )
        .await
    }

    #[instrument(name = "student_portal.http.list_students", skip_all, fields(base = %self.base))]
    async fn list_students(&self, token: &AccessToken) -> Result<Vec<Student>, PortalError> {
        let builder = self.request(Method::GET, &["students"])?;
        self.fetch(builder, Some(token)).await
    }

    #[instrument(name = "student_portal.http.list_schools", skip_all, fields(base = %self.base))]
    async fn list_schools(&self) -> Result<Vec<School>, PortalError> {
        let builder = self.request(Method::GET, &["schools"])?;
        self.fetch(builder, None).await
    }

    #[instrument(name = "student_portal.http.create_school", skip_all, fields(base = %self.base))]
    async fn create_school(
        &self,
        request: &SchoolRequest,
        token: &AccessToken,
    ) -> Result<School, PortalError> {
        self.fetch_with_body(Method::POST, &["schools"], request, Some(token))
            .await
    }

    #[instrument(name = "student_portal.http.get_student", skip(self, token), fields(base = %self.base))]
    async fn get_student(&self, id: i64, token: &AccessToken) -> Result<Student, PortalError> {
        let id = id.to_string();
        let builder = self.request(Method::GET, &["students", &id])?;
        self.fetch(builder, Some(token)).await
    }

    #[instrument(name = "student_portal.http.create_student", skip_all, fields(base = %self.base))]
    async fn create_student(
        &self,
        request: &StudentRequest,
        token: &AccessToken,
    ) -> Result<Student, PortalError> {
        self.fetch_with_body(Method::POST, &["students"], request, Some(token))
            .await
    }

    #[instrument(name = "student_portal.http.update_student", skip(self, request, token), fields(base = %self.base))]
    async fn update_student(
        &self,
        id: i64,
        request: &StudentRequest,
        token: &AccessToken,
    ) -> Result<Student, PortalError> {
        let id = id.to_string();
        self.fetch_with_body(Method::PUT, &["students", &id], request, Some(token))
            .await
    }

    #[instrument(name = "student_portal.http.delete_student", skip(self, token), fields(base = %self.base))]
    async fn delete_student(&self, id: i64, token: &AccessToken) -> Result<(), PortalError> {
        let id = id.to_string();
        let builder = self.request(Method::DELETE, &["students", &id])?;
        // 200 and 204 both count; any body is ignored.
        self.dispatch(builder, Some(token)).await?;
        Ok(())
    }
}
