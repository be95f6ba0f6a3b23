mod common;

use axum::http::StatusCode;
use chrono::Utc;
use jobboard_backend::database::PostingStore;
use uuid::Uuid;

use common::{get, new_posting, seed_active, send, setup_app};

#[tokio::test]
async fn search_filters_by_keyword_and_location() {
    let app = setup_app();
    let employer = Uuid::new_v4();

    seed_active(&app.store, new_posting(employer, "Frontend Developer", "Nairobi, Kenya", 1)).await;
    seed_active(&app.store, new_posting(employer, "Backend Engineer", "Nairobi, Kenya", 2)).await;
    seed_active(&app.store, new_posting(employer, "Senior Frontend Lead", "Mombasa", 3)).await;
    // Matching but unpaid.
    app.store
        .insert(new_posting(employer, "Frontend Intern", "Nairobi", 0))
        .await
        .unwrap();

    let (status, body) = send(&app.router, get("/api/jobs?keyword=frontend&location=nairobi")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);
    assert_eq!(body["items"][0]["title"], "Frontend Developer");
    assert!(body["items"][0].get("payment_reference").is_none());
}

#[tokio::test]
async fn results_are_newest_first_and_paged() {
    let app = setup_app();
    let employer = Uuid::new_v4();
    for i in 0..5 {
        seed_active(&app.store, new_posting(employer, &format!("Job {}", i), "Nairobi", i)).await;
    }

    let (_, first) = send(&app.router, get("/api/jobs?page=1&page_size=2")).await;
    assert_eq!(first["total_count"], 5);
    assert_eq!(first["total_pages"], 3);
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["items"][0]["title"], "Job 0");
    assert_eq!(first["items"][1]["title"], "Job 1");

    let (_, last) = send(&app.router, get("/api/jobs?page=3&page_size=2")).await;
    assert_eq!(last["items"].as_array().unwrap().len(), 1);
    assert_eq!(last["items"][0]["title"], "Job 4");

    let (status, beyond) = send(&app.router, get("/api/jobs?page=9&page_size=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(beyond["items"].as_array().unwrap().is_empty());
    assert_eq!(beyond["total_count"], 5);
    assert_eq!(beyond["page"], 9);
}

#[tokio::test]
async fn equal_timestamps_are_ordered_by_id() {
    let app = setup_app();
    let employer = Uuid::new_v4();
    let created_at = Utc::now();
    let mut ids = Vec::new();
    for title in ["Alpha", "Beta", "Gamma"] {
        let mut posting = new_posting(employer, title, "Nairobi", 0);
        posting.created_at = created_at;
        ids.push(seed_active(&app.store, posting).await.id);
    }
    ids.sort();

    let (_, body) = send(&app.router, get("/api/jobs")).await;
    let returned: Vec<Uuid> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(returned, ids);
}

#[tokio::test]
async fn wildcard_characters_match_literally() {
    let app = setup_app();
    let employer = Uuid::new_v4();
    seed_active(&app.store, new_posting(employer, "100% Remote Engineer", "Anywhere", 1)).await;
    seed_active(&app.store, new_posting(employer, "1000 Users Analyst", "Anywhere", 2)).await;

    let (_, body) = send(&app.router, get("/api/jobs?keyword=100%25")).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["title"], "100% Remote Engineer");

    let (_, none) = send(&app.router, get("/api/jobs?keyword=_00")).await;
    assert_eq!(none["total_count"], 0);
}

#[tokio::test]
async fn malformed_paging_falls_back_to_defaults() {
    let app = setup_app();
    seed_active(&app.store, new_posting(Uuid::new_v4(), "Ops", "Nairobi", 1)).await;

    let (status, body) = send(&app.router, get("/api/jobs?page=abc&page_size=-4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 1);
    assert_eq!(body["total_count"], 1);

    let (_, capped) = send(&app.router, get("/api/jobs?page_size=100000")).await;
    assert_eq!(capped["page_size"], 100);
}

#[tokio::test]
async fn drafts_are_hidden_from_job_detail() {
    let app = setup_app();
    let employer = Uuid::new_v4();
    let draft = app
        .store
        .insert(new_posting(employer, "Hidden", "Nairobi", 0))
        .await
        .unwrap();
    let live = seed_active(&app.store, new_posting(employer, "Visible", "Nairobi", 0)).await;

    let (status, _) = send(&app.router, get(&format!("/api/jobs/{}", draft.id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app.router, get(&format!("/api/jobs/{}", live.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Visible");
}
