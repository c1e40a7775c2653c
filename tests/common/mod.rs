#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use course_manager::{ServerArgs, app, db, models::User};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "Password123!";

pub struct TestApp {
    pub pool: SqlitePool,
    router: Router,
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookie: Option<String>,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let pool = db::connect(&url).await.unwrap();
        let router = app(pool.clone(), ServerArgs::with_database_url(url))
            .await
            .unwrap();

        Self {
            pool,
            router,
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(ToOwned::to_owned);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            cookie,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(cookie), Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(cookie), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(cookie), None).await
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);

        response.cookie.unwrap()
    }

    pub async fn user(&self, name: &str) -> (User, String) {
        let email = format!("{name}@example.com");
        let user = User::create_user(&self.pool, &email, name, PASSWORD)
            .await
            .unwrap();
        let cookie = self.login(&email).await;
        (user, cookie)
    }

    pub async fn superuser(&self) -> (User, String) {
        let user = User::create_superuser(&self.pool, "admin@example.com", "admin", PASSWORD)
            .await
            .unwrap();
        let cookie = self.login("admin@example.com").await;
        (user, cookie)
    }

    /// Creates a course and one instance through the API; returns their JSON.
    pub async fn course_with_instance(&self, admin: &str, title: &str, min_mark: i64) -> (Value, Value) {
        let course = self
            .post("/manage/courses", admin, json!({ "base_title": title }))
            .await;
        assert_eq!(course.status, StatusCode::CREATED, "{}", course.text);
        let course = course.json();

        let instance = self
            .post(
                &format!("/manage/courses/{}/instances", course["id"].as_str().unwrap()),
                admin,
                json!({ "min_mark": min_mark }),
            )
            .await;
        assert_eq!(instance.status, StatusCode::CREATED, "{}", instance.text);

        (course, instance.json())
    }

    pub async fn create_assignment(&self, cookie: &str, instance_id: &str, title: &str) -> TestResponse {
        self.post(
            &format!("/manage/instances/{instance_id}/assignments"),
            cookie,
            json!({ "title": title, "content": "Explain it." }),
        )
        .await
    }

    /// Makes the user a teacher and lets them supervise the instance.
    pub async fn teacher_for(&self, admin: &str, user: &User, instance_id: &str) -> String {
        let teacher = self
            .post("/manage/teachers", admin, json!({ "user_id": user.id }))
            .await;
        assert_eq!(teacher.status, StatusCode::CREATED, "{}", teacher.text);

        let link = self
            .request(
                Method::POST,
                &format!(
                    "/manage/teachers/{}/instances/{instance_id}",
                    teacher.json()["id"].as_str().unwrap()
                ),
                Some(admin),
                None,
            )
            .await;
        assert_eq!(link.status, StatusCode::NO_CONTENT, "{}", link.text);

        teacher.json()["id"].as_str().unwrap().to_owned()
    }

    pub async fn personal_assignment_count(&self, enroll_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM personal_assignments WHERE enroll_id = ?",
        )
        .bind(uuid::Uuid::parse_str(enroll_id).unwrap())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}

pub fn instance_path(course: &Value, instance: &Value) -> String {
    format!(
        "/courses/{}/{}",
        course["slug"].as_str().unwrap(),
        instance["slug"].as_str().unwrap()
    )
}
