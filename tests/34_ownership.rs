mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use heartline_api::resources::{Ownership, COLLECTIONS};

fn user_owned() -> impl Iterator<Item = &'static str> {
    COLLECTIONS
        .iter()
        .filter(|(_, ownership)| *ownership == Ownership::PerUser)
        .map(|(name, _)| *name)
}

#[tokio::test]
async fn every_user_owned_collection_is_scoped() -> Result<()> {
    let app = TestApp::new();
    let (token_a, user_a) = app.register("Ana").await?;
    let (token_b, user_b) = app.register("Ben").await?;

    for collection in user_owned() {
        let base = format!("/api/{}", collection);

        for (token, n) in [(&token_a, 1), (&token_a, 2), (&token_b, 3)] {
            let res = app
                .post(&base, Some(token), json!({ "n": n, "userId": "spoofed" }))
                .await?;
            assert_eq!(res.status, StatusCode::CREATED, "{}: {}", collection, res.body);
        }

        let listed_a = app.get(&base, Some(&token_a)).await?;
        let items_a = listed_a.body.as_array().cloned().unwrap_or_default();
        assert_eq!(items_a.len(), 2, "{}", collection);
        assert!(items_a.iter().all(|i| i["userId"] == user_a.as_str()), "{}", collection);

        let listed_b = app.get(&base, Some(&token_b)).await?;
        let items_b = listed_b.body.as_array().cloned().unwrap_or_default();
        assert_eq!(items_b.len(), 1, "{}", collection);
        assert!(items_b.iter().all(|i| i["userId"] == user_b.as_str()), "{}", collection);

        // Cross-user access to B's item always reads as missing
        let path = format!("{}/{}", base, items_b[0]["id"].as_str().unwrap_or_default());
        assert_eq!(app.get(&path, Some(&token_a)).await?.status, StatusCode::NOT_FOUND);
        assert_eq!(
            app.put(&path, Some(&token_a), json!({ "n": 0 })).await?.status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(app.delete(&path, Some(&token_a)).await?.status, StatusCode::NOT_FOUND);

        // Ownership can't be moved by the owner either
        let moved = app.put(&path, Some(&token_b), json!({ "userId": user_a })).await?;
        assert_eq!(moved.body["userId"], user_b.as_str(), "{}", collection);
    }

    Ok(())
}

#[tokio::test]
async fn users_collection_is_not_routed() -> Result<()> {
    let app = TestApp::new();
    let (token, _) = app.register("Ana").await?;

    let res = app.get("/api/users", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    Ok(())
}
