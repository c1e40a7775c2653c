use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

use common::{TestApp, instance_path};

#[tokio::test]
async fn enrolling_copies_existing_assignments() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    let instance_id = instance["id"].as_str().unwrap();

    for title in ["Ownership", "Borrowing"] {
        let response = app.create_assignment(&admin, instance_id, title).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
    }

    let (_, student) = app.user("student").await;
    let path = instance_path(&course, &instance);

    let enroll = app.request(Method::POST, &format!("{path}/enroll"), Some(&student), None).await;
    assert_eq!(enroll.status, StatusCode::CREATED, "{}", enroll.text);
    let enroll_id = enroll.json()["id"].as_str().unwrap().to_owned();

    assert_eq!(app.personal_assignment_count(&enroll_id).await, 2);

    let assignments = app.get(&format!("{path}/assignments"), &student).await.json();
    let titles: Vec<_> = assignments
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(titles, ["Borrowing", "Ownership"]);

    let me = app.get("/accounts/me", &student).await.json();
    assert_eq!(me["roles"], json!(["student"]));
}

#[tokio::test]
async fn new_assignments_reach_enrolled_students() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    let path = instance_path(&course, &instance);

    let mut enroll_ids = Vec::new();
    for name in ["alice", "bob"] {
        let (_, cookie) = app.user(name).await;
        let enroll = app.request(Method::POST, &format!("{path}/enroll"), Some(&cookie), None).await;
        enroll_ids.push(enroll.json()["id"].as_str().unwrap().to_owned());
    }

    let response = app
        .create_assignment(&admin, instance["id"].as_str().unwrap(), "Traits")
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    for enroll_id in &enroll_ids {
        assert_eq!(app.personal_assignment_count(enroll_id).await, 1);
    }
}

#[tokio::test]
async fn re_enrolling_creates_nothing() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    app.create_assignment(&admin, instance["id"].as_str().unwrap(), "Ownership")
        .await;

    let (_, student) = app.user("student").await;
    let path = instance_path(&course, &instance);

    let first = app.request(Method::POST, &format!("{path}/enroll"), Some(&student), None).await;
    let second = app.request(Method::POST, &format!("{path}/enroll"), Some(&student), None).await;

    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.json()["id"], second.json()["id"]);
    assert_eq!(
        app.personal_assignment_count(first.json()["id"].as_str().unwrap())
            .await,
        1
    );
}

#[tokio::test]
async fn unenrolling_removes_personal_assignments() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    app.create_assignment(&admin, instance["id"].as_str().unwrap(), "Ownership")
        .await;

    let (_, student) = app.user("student").await;
    let path = instance_path(&course, &instance);
    let enroll = app.request(Method::POST, &format!("{path}/enroll"), Some(&student), None).await;
    let enroll_id = enroll.json()["id"].as_str().unwrap().to_owned();

    let response = app.request(Method::POST, &format!("{path}/unenroll"), Some(&student), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.personal_assignment_count(&enroll_id).await, 0);

    let detail = app.get(&path, &student).await.json();
    assert_eq!(detail["is_enrolled"], false);

    let again = app.request(Method::POST, &format!("{path}/unenroll"), Some(&student), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_courses_lists_enrolled_instances() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    app.course_with_instance(&admin, "Go Basics", 60).await;

    let (_, student) = app.user("student").await;
    app.request(
        Method::POST,
        &format!("{}/enroll", instance_path(&course, &instance)),
        Some(&student),
        None,
    )
    .await;

    let mine = app.get("/courses/my-courses", &student).await.json();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["course_title"], "Rust Basics");
}

#[tokio::test]
async fn slugs_follow_titles_and_collisions_conflict() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust: The Basics!", 60).await;

    assert_eq!(course["slug"], "rust-the-basics");
    assert_eq!(instance["sub_title"], "Rust: The Basics!");
    assert_eq!(instance["slug"], "rust-the-basics");

    let duplicate = app
        .post("/manage/courses", &admin, json!({ "base_title": "rust the basics" }))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let second_instance = app
        .post(
            &format!("/manage/courses/{}/instances", course["id"].as_str().unwrap()),
            &admin,
            json!({ "min_mark": 50 }),
        )
        .await;
    assert_eq!(second_instance.status, StatusCode::CONFLICT);

    let named = app
        .post(
            &format!("/manage/courses/{}/instances", course["id"].as_str().unwrap()),
            &admin,
            json!({ "sub_title": "Rust, Spring 2021", "min_mark": 50 }),
        )
        .await;
    assert_eq!(named.status, StatusCode::CREATED);
    assert_eq!(named.json()["slug"], "rust-spring-2021");

    let detail = app
        .request(Method::GET, "/courses/rust-the-basics", None, None)
        .await
        .json();
    assert_eq!(detail["instances"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn staff_listings_carry_counts() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (_, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    app.create_assignment(&admin, instance["id"].as_str().unwrap(), "Ownership")
        .await;

    let courses = app.get("/manage/courses?search=rust", &admin).await.json();
    assert_eq!(courses[0]["instances_count"], 1);

    let instances = app.get("/manage/instances", &admin).await.json();
    assert_eq!(instances[0]["assignments_count"], 1);

    let none = app.get("/manage/courses?search=haskell", &admin).await.json();
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_course_cascades() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    let (_, student) = app.user("student").await;
    app.request(
        Method::POST,
        &format!("{}/enroll", instance_path(&course, &instance)),
        Some(&student),
        None,
    )
    .await;

    let response = app
        .delete(&format!("/manage/courses/{}", course["id"].as_str().unwrap()), &admin)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let enrolls = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrolls")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(enrolls, 0);
}

#[tokio::test]
async fn updates_reslug_and_reject_collisions() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    let other = app
        .post("/manage/courses", &admin, json!({ "base_title": "Haskell" }))
        .await
        .json();

    let renamed = app
        .put(
            &format!("/manage/courses/{}", course["id"].as_str().unwrap()),
            &admin,
            json!({ "base_title": "Rust Advanced" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK, "{}", renamed.text);
    assert_eq!(renamed.json()["slug"], "rust-advanced");

    let colliding = app
        .put(
            &format!("/manage/courses/{}", other["id"].as_str().unwrap()),
            &admin,
            json!({ "base_title": "rust advanced" }),
        )
        .await;
    assert_eq!(colliding.status, StatusCode::CONFLICT);
    let unchanged = app
        .request(Method::GET, "/courses/haskell", None, None)
        .await;
    assert_eq!(unchanged.status, StatusCode::OK);
    assert_eq!(unchanged.json()["course"]["base_title"], "Haskell");

    let instance_uri = format!("/manage/instances/{}", instance["id"].as_str().unwrap());
    let titled = app
        .put(&instance_uri, &admin, json!({ "sub_title": "Spring 2021", "min_mark": 50 }))
        .await;
    assert_eq!(titled.status, StatusCode::OK, "{}", titled.text);
    assert_eq!(titled.json()["slug"], "spring-2021");

    let cleared = app
        .put(&instance_uri, &admin, json!({ "sub_title": "", "min_mark": 50 }))
        .await
        .json();
    assert_eq!(cleared["sub_title"], "Rust Advanced");
    assert_eq!(cleared["slug"], "rust-advanced");

    let autumn = app
        .post(
            &format!("/manage/courses/{}/instances", course["id"].as_str().unwrap()),
            &admin,
            json!({ "sub_title": "Autumn", "min_mark": 70 }),
        )
        .await
        .json();
    let autumn_uri = format!("/manage/instances/{}", autumn["id"].as_str().unwrap());
    let clash = app
        .put(&autumn_uri, &admin, json!({ "min_mark": 10 }))
        .await;
    assert_eq!(clash.status, StatusCode::CONFLICT);

    let listed = app.get("/manage/instances?search=autumn", &admin).await.json();
    assert_eq!(listed[0]["slug"], "autumn");
    assert_eq!(listed[0]["min_mark"], 70);

    assert_eq!(app.delete(&autumn_uri, &admin).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&autumn_uri, &admin).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_searches_match_instance_titles_literally() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (rust, rust_instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    let (haskell, haskell_instance) = app.course_with_instance(&admin, "Haskell", 60).await;
    app.create_assignment(&admin, rust_instance["id"].as_str().unwrap(), "Ownership")
        .await;
    app.create_assignment(&admin, haskell_instance["id"].as_str().unwrap(), "Monads")
        .await;

    let (_, student) = app.user("student").await;
    for path in [
        instance_path(&rust, &rust_instance),
        instance_path(&haskell, &haskell_instance),
    ] {
        let enrolled = app
            .request(Method::POST, &format!("{path}/enroll"), Some(&student), None)
            .await;
        assert_eq!(enrolled.status, StatusCode::CREATED);
    }

    let found = app.get("/manage/assignments?search=haskell", &admin).await.json();
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "Monads");

    let filtered = app
        .get(
            &format!(
                "/manage/assignments?search=haskell&course_instance_id={}",
                rust_instance["id"].as_str().unwrap()
            ),
            &admin,
        )
        .await
        .json();
    assert!(filtered.as_array().unwrap().is_empty());

    let by_instance = app
        .get("/manage/personal-assignments?search=rust", &admin)
        .await
        .json();
    let by_instance = by_instance.as_array().unwrap();
    assert_eq!(by_instance.len(), 1);
    assert_eq!(by_instance[0]["title"], "Ownership");

    let by_email = app
        .get("/manage/personal-assignments?search=student", &admin)
        .await
        .json();
    assert_eq!(by_email.as_array().unwrap().len(), 2);

    for uri in [
        "/manage/assignments?search=_",
        "/manage/personal-assignments?search=%25",
        "/manage/enrolls?search=_",
        "/manage/courses?search=_",
        "/manage/instances?search=%25",
    ] {
        let none = app.get(uri, &admin).await.json();
        assert!(none.as_array().unwrap().is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn enroll_listing_names_default_instances_by_course() {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", 60).await;
    let (_, student) = app.user("student").await;
    app.request(
        Method::POST,
        &format!("{}/enroll", instance_path(&course, &instance)),
        Some(&student),
        None,
    )
    .await;

    let enrolls = app.get("/manage/enrolls", &admin).await.json();
    assert_eq!(
        enrolls[0]["instance_title"],
        format!("Rust Basics Course - {}", instance["id"].as_str().unwrap())
    );
}
