//! HTTP adapter tests against a mock student API.

use httpkit::TracedClient;
use httpmock::prelude::*;
use serde_json::json;
use student_portal::client::StudentPortalApi;
use student_portal::error::PortalError;
use student_portal::infra::http::HttpPortalClient;
use student_portal::model::{
    AccessToken, LoginRequest, RegisterPayload, SchoolRequest, StudentRequest,
};
use url::Url;

fn adapter(server: &MockServer) -> HttpPortalClient {
    HttpPortalClient::new(
        TracedClient::default(),
        Url::parse(&server.base_url()).unwrap(),
    )
}

fn token() -> AccessToken {
    AccessToken::new("tok-123", Some("Bearer"))
}

#[tokio::test]
async fn login_posts_credentials_as_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/login")
            .header("content-type", "application/json")
            .header_exists("traceparent")
            .json_body(json!({ "username": "ada@campus.edu", "password": "pw" }));
        then.status(200)
            .json_body(json!({ "token": "tok-123", "tokenType": "Bearer" }));
    });

    let auth = adapter(&server)
        .login(&LoginRequest {
            username: "ada@campus.edu".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();

    mock.assert_hits(1);
    assert_eq!(auth.token, "tok-123");
    assert_eq!(auth.token_type, "Bearer");
}

#[tokio::test]
async fn students_request_carries_authorization_header() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/students")
            .header("authorization", "Bearer tok-123");
        then.status(200).json_body(json!([
            { "id": 1, "name": "Ada", "email": "ada@campus.edu", "schoolName": "North Campus", "role": "ADMIN" },
            { "id": 2, "name": "Bob", "email": "bob@campus.edu" }
        ]));
    });

    let students = adapter(&server).list_students(&token()).await.unwrap();

    mock.assert();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].campus(), Some("North Campus"));
    assert_eq!(students[1].role, None);
}

#[tokio::test]
async fn schools_request_is_anonymous() {
    let server = MockServer::start();
    let anonymous = server.mock(|when, then| {
        when.method(GET).path("/schools");
        then.status(200)
            .json_body(json!([{ "id": 1, "name": "North Campus" }]));
    });
    let with_auth = server.mock(|when, then| {
        when.method(GET).path("/schools").header_exists("authorization");
        then.status(500);
    });

    let schools = adapter(&server).list_schools().await.unwrap();

    assert_eq!(schools.len(), 1);
    assert_eq!(schools[0].name, "North Campus");
    anonymous.assert();
    with_auth.assert_hits(0);
}

#[tokio::test]
async fn null_text_fields_decode_as_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/students");
        then.status(200).json_body(json!([
            { "id": 1, "name": "Ada", "email": "ada@campus.edu" },
            { "id": 2, "name": null, "email": null, "schoolName": null, "role": null }
        ]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/auth/login");
        then.status(200)
            .json_body(json!({ "token": "abc", "tokenType": null }));
    });

    let api = adapter(&server);
    let students = api.list_students(&token()).await.unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[1].name, "");
    assert_eq!(students[1].email, "");

    let auth = api
        .login(&LoginRequest {
            username: "ada@campus.edu".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(auth.token_type, "");
    assert_eq!(auth.access_token().header_value(), "Bearer abc");
}

#[tokio::test]
async fn create_school_posts_name_with_authorization() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/schools")
            .header("authorization", "Bearer tok-123")
            .json_body(json!({ "name": "East Campus" }));
        then.status(200)
            .json_body(json!({ "id": 3, "name": "East Campus" }));
    });

    let school = adapter(&server)
        .create_school(
            &SchoolRequest {
                name: "East Campus".into(),
            },
            &token(),
        )
        .await
        .unwrap();

    mock.assert();
    assert_eq!(school.id, 3);
    assert_eq!(school.name, "East Campus");
}

#[tokio::test]
async fn error_message_from_body_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/register");
        then.status(400).json_body(json!({
            "timestamp": "2026-01-01T00:00:00",
            "message": "Email already registered",
            "status": 400
        }));
    });

    let err = adapter(&server)
        .register(&RegisterPayload {
            name: "Ada".into(),
            email: "ada@campus.edu".into(),
            password: "secret1".into(),
            school_id: None,
            school_name: Some("East Campus".into()),
        })
        .await
        .unwrap_err();

    assert_eq!(err, PortalError::api(400, Some("Email already registered".into())));
    assert_eq!(err.to_string(), "Email already registered");
}

#[tokio::test]
async fn error_without_json_body_has_no_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/students");
        then.status(502).body("<html>Bad Gateway</html>");
    });

    let err = adapter(&server).list_students(&token()).await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "Request failed with status 502");
}

#[tokio::test]
async fn unauthorized_and_forbidden_are_auth_failures() {
    for status in [401u16, 403] {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/students");
            then.status(status);
        });

        let err = adapter(&server).list_students(&token()).await.unwrap_err();
        assert!(err.is_auth_failure(), "status {}", status);
    }
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/schools");
        then.status(200).body("not json");
    });

    let err = adapter(&server).list_schools().await.unwrap_err();
    assert!(matches!(err, PortalError::Decode { .. }));
}

#[tokio::test]
async fn student_crud_uses_id_paths() {
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET)
            .path("/students/7")
            .header("authorization", "Bearer tok-123");
        then.status(200)
            .json_body(json!({ "id": 7, "name": "Cy", "email": "cy@campus.edu" }));
    });
    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/students/7")
            .json_body(json!({ "name": "Cy", "email": "cy@campus.edu", "role": "ADMIN" }));
        then.status(200).json_body(
            json!({ "id": 7, "name": "Cy", "email": "cy@campus.edu", "role": "ADMIN" }),
        );
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/students/7");
        then.status(204);
    });

    let api = adapter(&server);
    let fetched = api.get_student(7, &token()).await.unwrap();
    assert_eq!(fetched.name, "Cy");

    let updated = api
        .update_student(
            7,
            &StudentRequest {
                name: "Cy".into(),
                email: "cy@campus.edu".into(),
                password: None,
                school_id: None,
                school_name: None,
                role: Some("ADMIN".into()),
            },
            &token(),
        )
        .await
        .unwrap();
    assert_eq!(updated.role.as_deref(), Some("ADMIN"));

    api.delete_student(7, &token()).await.unwrap();

    get.assert();
    put.assert();
    delete.assert();
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let api = HttpPortalClient::new(
        TracedClient::default(),
        Url::parse("http://127.0.0.1:9").unwrap(),
    );

    let err = api.list_schools().await.unwrap_err();
    assert!(matches!(err, PortalError::Transport { .. }));
}
