mod common;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::json;

use bizhub_api::config::{AppConfig, DeactivatedPolicy};
use common::TestServer;

#[tokio::test]
async fn onboarding_creates_an_owned_active_organization() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("new@acme.fr", None).await?;
    let (token, _) = server.login("new@acme.fr").await?;

    let (status, body) = server.post("/api/organizations", &token, json!({ "name": "Acme" })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let org = body["data"]["id"].as_str().context("org id")?.to_string();
    assert_eq!(body["data"]["currency"], "EUR");

    let (_, body) = server.get("/api/auth/whoami", &token).await?;
    assert_eq!(body["data"]["state"], "active");
    assert_eq!(body["data"]["organization"]["id"], org.as_str());
    assert_eq!(body["data"]["organization"]["role"], "owner");

    let (status, body) = server.get("/api/organizations", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["organizations"][0]["is_current"], true);
    Ok(())
}

#[tokio::test]
async fn settings_are_validated() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    let (token, _) = server.login("owner@acme.fr").await?;

    let (status, body) = server
        .patch("/api/organization", &token, json!({ "primary_color": "#1a2b3c", "city": "Lyon" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["city"], "Lyon");

    let (status, body) = server
        .patch("/api/organization", &token, json!({ "primary_color": "blue" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn deactivated_organization_is_read_only() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    let (token, _) = server.login("owner@acme.fr").await?;

    let (status, _) = server.post("/api/crm/companies", &token, json!({ "name": "Before" })).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server.post("/api/organization/deactivate", &token, json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = server.get("/api/crm/companies", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = server.post("/api/crm/companies", &token, json!({ "name": "After" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ORGANIZATION_INACTIVE");
    Ok(())
}

#[tokio::test]
async fn blocked_policy_rejects_reads_too() -> Result<()> {
    let mut config = AppConfig::development();
    config.tenancy.deactivated_policy = DeactivatedPolicy::Blocked;
    let server = TestServer::start_with(config).await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    let (token, _) = server.login("owner@acme.fr").await?;

    let (status, _) = server.post("/api/organization/deactivate", &token, json!({})).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.get("/api/crm/companies", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ORGANIZATION_INACTIVE");
    Ok(())
}

#[tokio::test]
async fn only_owners_deactivate() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    server.register("admin@acme.fr", None).await?;
    let (owner, _) = server.login("owner@acme.fr").await?;
    server.join(&owner, "admin@acme.fr", "admin").await?;

    let (admin, _) = server.login("admin@acme.fr").await?;
    let (status, _) = server.post("/api/organization/deactivate", &admin, json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn member_management_respects_ranks() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    server.register("manager@acme.fr", None).await?;
    server.register("member@acme.fr", None).await?;
    let (owner, login) = server.login("owner@acme.fr").await?;
    let owner_id = login["session"]["user"]["id"].as_str().context("owner id")?.to_string();
    server.join(&owner, "manager@acme.fr", "manager").await?;
    server.join(&owner, "member@acme.fr", "member").await?;

    let (status, body) = server.get("/api/organization/members", &owner).await?;
    assert_eq!(status, StatusCode::OK);
    let members = body["data"].as_array().context("members")?;
    assert_eq!(members.len(), 3);
    assert_eq!(members[0]["role"], "owner");
    let member_id = members
        .iter()
        .find(|m| m["email"] == "member@acme.fr")
        .and_then(|m| m["user_id"].as_str())
        .context("member id")?
        .to_string();

    // Managers cannot invite or change roles.
    let (manager, _) = server.login("manager@acme.fr").await?;
    let (status, _) = server
        .post("/api/organization/invitations", &manager, json!({ "email": "x@acme.fr" }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let path = format!("/api/organization/members/{}", member_id);
    let (status, _) = server.put(&path, &manager, json!({ "role": "admin" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server.put(&path, &owner, json!({ "role": "manager" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "manager");

    // The last owner cannot leave.
    let (status, _) = server
        .delete(&format!("/api/organization/members/{}", owner_id), &owner)
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server.delete(&path, &owner).await?;
    assert_eq!(status, StatusCode::OK);

    // The removed user falls back to having no organization.
    let (removed, login) = server.login("member@acme.fr").await?;
    assert_eq!(login["session"]["state"], "authenticated");
    let (status, _) = server.get("/api/organization", &removed).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invitations_are_bound_to_their_email() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    server.register("intruder@evil.fr", None).await?;
    let (owner, _) = server.login("owner@acme.fr").await?;

    let (status, body) = server
        .post("/api/organization/invitations", &owner, json!({ "email": "guest@acme.fr" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["invitation"].get("token_hash").is_none());
    let token = body["data"]["token"].as_str().context("token")?.to_string();
    let invitation = body["data"]["invitation"]["id"].as_str().context("id")?.to_string();

    let (intruder, _) = server.login("intruder@evil.fr").await?;
    let (status, _) = server
        .post("/api/invitations/accept", &intruder, json!({ "token": token }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .delete(&format!("/api/organization/invitations/{}", invitation), &owner)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    server.register("guest@acme.fr", None).await?;
    let (guest, _) = server.login("guest@acme.fr").await?;
    let (status, _) = server
        .post("/api/invitations/accept", &guest, json!({ "token": token }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server
        .post("/api/invitations/accept", &guest, json!({ "token": "made-up" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn audit_log_records_organization_activity() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("owner@acme.fr", Some("Acme")).await?;
    let (owner, _) = server.login("owner@acme.fr").await?;
    server.post("/api/crm/companies", &owner, json!({ "name": "Audited" })).await?;

    let (status, body) = server.get("/api/organization/audit?limit=10", &owner).await?;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().context("entries")?;
    assert!(entries.iter().any(|e| e["entity"] == "company" && e["action"] == "create"));
    assert!(entries.iter().any(|e| e["action"] == "login"));
    Ok(())
}

#[tokio::test]
async fn anonymous_cannot_reach_organization_routes() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, _) = server.call(Method::GET, "/api/organization", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
