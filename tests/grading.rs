use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

mod common;

use common::{TestApp, instance_path};

struct Classroom {
    app: TestApp,
    admin: String,
    teacher: String,
    student: String,
    path: String,
    enroll_id: String,
    personal_ids: Vec<String>,
}

/// One instance with two assignments, a supervising teacher and one enrolled student.
async fn classroom(min_mark: i64) -> Classroom {
    let app = TestApp::new().await;
    let (_, admin) = app.superuser().await;
    let (course, instance) = app.course_with_instance(&admin, "Rust Basics", min_mark).await;
    let instance_id = instance["id"].as_str().unwrap().to_owned();

    app.create_assignment(&admin, &instance_id, "Ownership").await;
    app.create_assignment(&admin, &instance_id, "Borrowing").await;

    let (teacher_user, teacher) = app.user("teacher").await;
    app.teacher_for(&admin, &teacher_user, &instance_id).await;

    let (_, student) = app.user("student").await;
    let path = instance_path(&course, &instance);
    let enroll = app.request(Method::POST, &format!("{path}/enroll"), Some(&student), None).await;
    let enroll_id = enroll.json()["id"].as_str().unwrap().to_owned();

    let personal_ids = app
        .get(&format!("{path}/assignments"), &student)
        .await
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|pa| pa["id"].as_str().unwrap().to_owned())
        .collect();

    Classroom {
        app,
        admin,
        teacher,
        student,
        path,
        enroll_id,
        personal_ids,
    }
}

impl Classroom {
    async fn grade(&self, cookie: &str, index: usize, value: i64) -> StatusCode {
        self.app
            .post(
                &format!("/manage/personal-assignments/{}/mark", self.personal_ids[index]),
                cookie,
                json!({ "value": value }),
            )
            .await
            .status
    }

    async fn finish(&self) -> Value {
        let response = self
            .app
            .request(
                Method::POST,
                &format!("/manage/enrolls/{}/finish", self.enroll_id),
                Some(&self.teacher),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
        response.json()
    }
}

#[tokio::test]
async fn passing_student_gets_a_certificate() {
    let room = classroom(60).await;

    assert_eq!(room.grade(&room.teacher, 0, 80).await, StatusCode::OK);
    assert_eq!(room.grade(&room.teacher, 1, 45).await, StatusCode::OK);

    let finished = room.finish().await;
    assert_eq!(finished["enroll"]["is_course_finished"], true);
    assert_eq!(finished["average_mark"], 62.5);

    let code = finished["certificate"]["code"].as_str().unwrap().to_owned();
    assert_eq!(code.chars().count(), 12);

    let mine = room.app.get("/certificates", &room.student).await.json();
    assert_eq!(mine[0]["code"], code.as_str());

    let page = room
        .app
        .request(Method::GET, &format!("/certificates/{code}"), None, None)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text.contains("Rust Basics"));
    assert!(page.text.contains("62.50"));
}

#[tokio::test]
async fn failing_student_gets_no_certificate() {
    let room = classroom(60).await;

    room.grade(&room.teacher, 0, 50).await;
    room.grade(&room.teacher, 1, 69).await;

    let finished = room.finish().await;
    assert_eq!(finished["enroll"]["is_course_finished"], true);
    assert!(finished["certificate"].is_null());

    let mine = room.app.get("/certificates", &room.student).await.json();
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn finishing_twice_keeps_the_first_certificate() {
    let room = classroom(0).await;

    let first = room.finish().await;
    let second = room.finish().await;

    assert_eq!(first["average_mark"], 0.0);
    assert_eq!(first["certificate"]["code"], second["certificate"]["code"]);
}

#[tokio::test]
async fn regrading_replaces_the_mark() {
    let room = classroom(60).await;

    room.grade(&room.teacher, 0, 20).await;
    room.grade(&room.teacher, 0, 90).await;

    let marks = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM marks")
        .fetch_one(&room.app.pool)
        .await
        .unwrap();
    assert_eq!(marks, 1);

    let detail = room
        .app
        .get(&format!("{}/{}", room.path, room.personal_ids[0]), &room.student)
        .await
        .json();
    assert_eq!(detail["mark"], 90);
    assert_eq!(detail["is_completed"], true);
}

#[tokio::test]
async fn marks_are_bounded() {
    let room = classroom(60).await;

    assert_eq!(
        room.grade(&room.teacher, 0, 101).await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        room.grade(&room.teacher, 0, -1).await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn grading_a_finished_course_conflicts() {
    let room = classroom(0).await;
    room.finish().await;

    assert_eq!(room.grade(&room.teacher, 0, 70).await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unsupervised_teacher_cannot_grade() {
    let room = classroom(60).await;

    let (other_user, _) = room.app.user("other").await;
    let other_teacher = room
        .app
        .post("/manage/teachers", &room.admin, json!({ "user_id": other_user.id }))
        .await;
    assert_eq!(other_teacher.status, StatusCode::CREATED);
    let other = room.app.login("other@example.com").await;

    assert_eq!(room.grade(&other, 0, 70).await, StatusCode::FORBIDDEN);
    assert_eq!(room.grade(&room.student, 0, 70).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn student_answers_until_graded() {
    let room = classroom(60).await;
    let uri = format!("{}/{}", room.path, room.personal_ids[0]);

    let blank = room.app.post(&uri, &room.student, json!({ "answer": "  " })).await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);

    let answered = room
        .app
        .post(&uri, &room.student, json!({ "answer": "Each value has one owner." }))
        .await;
    assert_eq!(answered.status, StatusCode::OK, "{}", answered.text);
    assert_eq!(answered.json()["answer"], "Each value has one owner.");
    assert!(answered.json()["submitted_at"].is_string());

    room.grade(&room.teacher, 0, 75).await;

    let late = room.app.post(&uri, &room.student, json!({ "answer": "Changed." })).await;
    assert_eq!(late.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn closed_assignment_rejects_answers() {
    let room = classroom(60).await;

    let assignments = room.app.get("/manage/assignments", &room.admin).await.json();
    let assignment = assignments
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["title"] == "Ownership")
        .unwrap()
        .clone();

    let closed = room
        .app
        .put(
            &format!("/manage/assignments/{}", assignment["id"].as_str().unwrap()),
            &room.teacher,
            json!({ "title": "Ownership", "content": "Explain it.", "is_completed": true }),
        )
        .await;
    assert_eq!(closed.status, StatusCode::OK, "{}", closed.text);

    let views = room
        .app
        .get(&format!("{}/assignments", room.path), &room.student)
        .await
        .json();
    let personal = views
        .as_array()
        .unwrap()
        .iter()
        .find(|pa| pa["title"] == "Ownership")
        .unwrap()
        .clone();
    assert_eq!(personal["assignment_completed"], true);

    let response = room
        .app
        .post(
            &format!("{}/{}", room.path, personal["id"].as_str().unwrap()),
            &room.student,
            json!({ "answer": "Too late." }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn students_cannot_see_each_others_assignments() {
    let room = classroom(60).await;
    let (_, intruder) = room.app.user("intruder").await;

    let response = room
        .app
        .get(&format!("{}/{}", room.path, room.personal_ids[0]), &intruder)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enroll_listing_shows_average() {
    let room = classroom(60).await;
    room.grade(&room.teacher, 0, 70).await;
    room.grade(&room.teacher, 1, 81).await;

    let enrolls = room
        .app
        .get("/manage/enrolls?search=student", &room.teacher)
        .await
        .json();
    assert_eq!(enrolls[0]["average_mark"], 75.5);
    assert_eq!(enrolls[0]["student_email"], "student@example.com");

    let unknown = room.app.get("/certificates/XXXXXXXXXXXX", &room.student).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
