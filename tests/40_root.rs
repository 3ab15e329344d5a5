mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

use bizhub_api::services::account_service;
use common::{TestServer, PASSWORD};

async fn root_token(server: &TestServer) -> Result<String> {
    account_service::create_superuser(&server.state, "root@bizhub.fr", PASSWORD).await?;
    Ok(server.login("root@bizhub.fr").await?.0)
}

#[tokio::test]
async fn root_routes_require_super_admin() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    let (owner, _) = server.login("owner@acme.fr").await?;

    let (status, _) = server.get("/api/root/organizations", &owner).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn super_admin_lists_and_toggles_organizations() -> Result<()> {
    let server = TestServer::start().await?;
    let acme = server.register("owner@acme.fr", Some("Acme")).await?.context("acme")?;
    server.register("owner@beta.fr", Some("Beta")).await?;
    let root = root_token(&server).await?;

    let (status, body) = server.get("/api/root/organizations", &root).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = server
        .post(&format!("/api/root/organizations/{}/deactivate", acme), &root, json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    // Members of the deactivated organization can no longer write.
    let (owner, _) = server.login("owner@acme.fr").await?;
    let (status, _) = server.post("/api/crm/companies", &owner, json!({ "name": "Nope" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .post(&format!("/api/root/organizations/{}/activate", acme), &root, json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);

    let (status, _) = server.post("/api/crm/companies", &owner, json!({ "name": "Yes" })).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn super_admin_hands_over_an_organization() -> Result<()> {
    let server = TestServer::start().await?;
    let acme = server.register("owner@acme.fr", Some("Acme")).await?.context("acme")?;
    server.register("heir@acme.fr", None).await?;
    let root = root_token(&server).await?;

    let (heir, login) = server.login("heir@acme.fr").await?;
    let heir_id = login["session"]["user"]["id"].as_str().context("heir id")?.to_string();

    let (status, body) = server
        .post(
            &format!("/api/root/organizations/{}/admin", acme),
            &root,
            json!({ "user_id": heir_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (_, body) = server.get(&format!("/api/root/organizations/{}", acme), &root).await?;
    let memberships = body["data"]["memberships"].as_array().context("memberships")?;
    assert!(memberships.iter().all(|m| m["user_id"] == heir_id.as_str() || m["role"] == "member"));

    // The new admin resolves into the organization on the next request.
    let (_, body) = server.get("/api/auth/whoami", &heir).await?;
    assert_eq!(body["data"]["organization"]["id"], acme.as_str());
    assert_eq!(body["data"]["organization"]["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn unknown_organization_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let root = root_token(&server).await?;
    let (status, _) = server
        .get("/api/root/organizations/00000000-0000-0000-0000-000000000000", &root)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
