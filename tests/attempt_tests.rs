// tests/attempt_tests.rs

use std::time::Duration;

use quiz_backend::{
    config::Config,
    models::quiz::{NewQuestion, NewQuiz},
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

const SECRET: &str = "attempt_test_secret";

struct TestApp {
    address: String,
    quiz_id: i64,
    question_ids: Vec<i64>,
}

/// Spawns the app on a random port with in-memory stores and one quiz of
/// three questions. In every question option 1 is correct.
async fn spawn_app(time_budget_seconds: u32, tick_interval_ms: u64) -> TestApp {
    let config = Config {
        database_url: None,
        jwt_secret: SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        tick_interval_ms,
        attempt_retention_secs: 600,
        quiz_seed_path: None,
    };
    let state = AppState::in_memory(config);

    let questions = ["Dougong?", "Hip roof?", "Foguang Temple?"]
        .iter()
        .map(|text| NewQuestion {
            text: text.to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_option: 0,
            points: None,
        })
        .collect();
    let quiz = state
        .quizzes
        .create(NewQuiz {
            title: "Timber architecture".to_string(),
            time_budget_seconds,
            points_per_question: 10,
            questions,
        })
        .await
        .expect("Failed to create quiz");

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        quiz_id: quiz.id,
        question_ids: quiz.questions.iter().map(|q| q.id).collect(),
    }
}

fn token(user_id: i64, username: &str) -> String {
    sign_jwt(user_id, username, "user", SECRET, 600).expect("Failed to sign token")
}

async fn start(client: &reqwest::Client, app: &TestApp, token: &str) -> Value {
    let response = client
        .post(&format!("{}/api/quiz/{}/attempts", app.address, app.quiz_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to start attempt");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn answer(
    client: &reqwest::Client,
    app: &TestApp,
    token: &str,
    attempt_id: &str,
    question_id: i64,
    option_id: i64,
) -> reqwest::Response {
    client
        .put(&format!("{}/api/attempts/{}/answers", app.address, attempt_id))
        .bearer_auth(token)
        .json(&json!({ "question_id": question_id, "option_id": option_id }))
        .send()
        .await
        .expect("Failed to send answer")
}

async fn navigate(
    client: &reqwest::Client,
    app: &TestApp,
    token: &str,
    attempt_id: &str,
    body: Value,
) -> reqwest::Response {
    client
        .post(&format!("{}/api/attempts/{}/navigate", app.address, attempt_id))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to navigate")
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let app = spawn_app(600, 1000).await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn start_requires_token() {
    let app = spawn_app(600, 1000).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/quiz/{}/attempts", app.address, app.quiz_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(&format!("{}/api/quiz/{}/attempts", app.address, app.quiz_id))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_attempt_flow() {
    // Arrange
    let app = spawn_app(600, 1000).await;
    let client = reqwest::Client::new();
    let token = token(1, "scholar");
    let q = &app.question_ids;

    // 1. Start
    let view = start(&client, &app, &token).await;
    let attempt_id = view["attempt_id"].as_str().unwrap().to_string();
    assert_eq!(view["status"], "in_progress");
    assert_eq!(view["current_question_index"], 0);
    assert_eq!(view["question_count"], 3);
    assert_eq!(view["remaining_seconds"], 600);
    assert!(view["current_question"].get("correct_option_id").is_none());

    // 2. Answer: Q1 right, Q2 wrong then overwritten with another wrong one, Q3 skipped
    assert_eq!(answer(&client, &app, &token, &attempt_id, q[0], 1).await.status().as_u16(), 200);
    assert_eq!(answer(&client, &app, &token, &attempt_id, q[1], 2).await.status().as_u16(), 200);
    let view: Value = answer(&client, &app, &token, &attempt_id, q[1], 3)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["answers"].as_object().unwrap().len(), 2);
    assert_eq!(view["answers"][q[1].to_string()], 3);

    // Unknown ids are rejected
    assert_eq!(answer(&client, &app, &token, &attempt_id, 999, 1).await.status().as_u16(), 400);
    assert_eq!(answer(&client, &app, &token, &attempt_id, q[0], 9).await.status().as_u16(), 400);

    // 3. Navigate
    let view: Value = navigate(&client, &app, &token, &attempt_id, json!({ "direction": "previous" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question_index"], 0);

    let view: Value = navigate(&client, &app, &token, &attempt_id, json!({ "index": 2 }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question_index"], 2);
    assert_eq!(view["current_question"]["id"], q[2]);

    let view: Value = navigate(&client, &app, &token, &attempt_id, json!({ "direction": "next" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question_index"], 2);

    let response = navigate(&client, &app, &token, &attempt_id, json!({ "index": 3 })).await;
    assert_eq!(response.status().as_u16(), 400);
    let response = navigate(&client, &app, &token, &attempt_id, json!({})).await;
    assert_eq!(response.status().as_u16(), 400);

    // Review is not available before submission
    let response = client
        .get(&format!("{}/api/attempts/{}/review", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 4. Submit twice: same result
    let submit_url = format!("{}/api/attempts/{}/submit", app.address, attempt_id);
    let first: Value = client
        .post(&submit_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["correct_count"], 1);
    assert_eq!(first["total_questions"], 3);
    assert_eq!(first["percentage"], 33);
    assert_eq!(first["score"], 10);

    let second: Value = client
        .post(&submit_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, second);

    // 5. Mutations after submission conflict
    assert_eq!(answer(&client, &app, &token, &attempt_id, q[2], 1).await.status().as_u16(), 409);
    let response = navigate(&client, &app, &token, &attempt_id, json!({ "direction": "next" })).await;
    assert_eq!(response.status().as_u16(), 409);

    // 6. Review
    let review: Value = client
        .get(&format!("{}/api/attempts/{}/review", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = review["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["is_correct"], true);
    assert_eq!(items[1]["is_correct"], false);
    assert_eq!(items[1]["selected_option_id"], 3);
    assert_eq!(items[1]["correct_text"], "A");
    assert_eq!(items[2]["selected_option_id"], Value::Null);

    // 7. History and leaderboard hold exactly one record
    let history: Vec<Value> = client
        .get(&format!("{}/api/attempts/history", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["attempt_id"], attempt_id.as_str());
    assert_eq!(history[0]["percentage"], 33);

    let board: Vec<Value> = client
        .get(&format!("{}/api/quiz/{}/leaderboard", app.address, app.quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["username"], "scholar");
    assert_eq!(board[0]["best_percentage"], 33);
}

#[tokio::test]
async fn attempts_are_private() {
    let app = spawn_app(600, 1000).await;
    let client = reqwest::Client::new();
    let owner = token(1, "owner");
    let intruder = token(2, "intruder");

    let view = start(&client, &app, &owner).await;
    let attempt_id = view["attempt_id"].as_str().unwrap();

    let response = client
        .get(&format!("{}/api/attempts/{}", app.address, attempt_id))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = answer(&client, &app, &intruder, attempt_id, app.question_ids[0], 1).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn timer_auto_submits() {
    // Ten seconds of quiz time, one tick every 25ms
    let app = spawn_app(10, 25).await;
    let client = reqwest::Client::new();
    let token = token(5, "slowpoke");

    let view = start(&client, &app, &token).await;
    let attempt_id = view["attempt_id"].as_str().unwrap().to_string();
    answer(&client, &app, &token, &attempt_id, app.question_ids[0], 1).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;

    let view: Value = client
        .get(&format!("{}/api/attempts/{}", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["status"], "submitted");
    assert_eq!(view["remaining_seconds"], 0);
    assert_eq!(view["result"]["correct_count"], 1);
    assert_eq!(view["result"]["percentage"], 33);

    // A late manual submit returns the timer's result
    let late: Value = client
        .post(&format!("{}/api/attempts/{}/submit", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(late, view["result"]);

    let history: Vec<Value> = client
        .get(&format!("{}/api/attempts/history", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn retake_starts_fresh() {
    let app = spawn_app(600, 1000).await;
    let client = reqwest::Client::new();
    let token = token(3, "again");

    let view = start(&client, &app, &token).await;
    let old_id = view["attempt_id"].as_str().unwrap().to_string();
    answer(&client, &app, &token, &old_id, app.question_ids[0], 1).await;
    client
        .post(&format!("{}/api/attempts/{}/submit", app.address, old_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let response = client
        .post(&format!("{}/api/attempts/{}/retake", app.address, old_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let fresh: Value = response.json().await.unwrap();

    assert_ne!(fresh["attempt_id"], old_id.as_str());
    assert_eq!(fresh["status"], "in_progress");
    assert_eq!(fresh["remaining_seconds"], 600);
    assert!(fresh["answers"].as_object().unwrap().is_empty());
    assert_eq!(fresh["result"], Value::Null);

    // The old attempt is gone; its result stays in the history
    let response = client
        .get(&format!("{}/api/attempts/{}", app.address, old_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let history: Vec<Value> = client
        .get(&format!("{}/api/attempts/history", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn abandon_drops_attempt_without_result() {
    let app = spawn_app(600, 1000).await;
    let client = reqwest::Client::new();
    let token = token(4, "quitter");

    let view = start(&client, &app, &token).await;
    let attempt_id = view["attempt_id"].as_str().unwrap().to_string();

    let response = client
        .delete(&format!("{}/api/attempts/{}", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .post(&format!("{}/api/attempts/{}/submit", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let history: Vec<Value> = client
        .get(&format!("{}/api/attempts/history", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history.is_empty());
}
