mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

use bizhub_api::services::account_service;
use common::{TestServer, PASSWORD};

/// u1 owns Alpha and is a plain member of Beta (owned by u2).
async fn two_organizations(server: &TestServer) -> Result<(String, String)> {
    let alpha = server.register("u1@alpha.fr", Some("Alpha")).await?.context("alpha")?;
    let beta = server.register("u2@beta.fr", Some("Beta")).await?.context("beta")?;

    let (u2, _) = server.login("u2@beta.fr").await?;
    server.join(&u2, "u1@alpha.fr", "member").await?;
    Ok((alpha, beta))
}

async fn switch(server: &TestServer, token: &str, org: &str) -> Result<()> {
    let (status, body) = server
        .post("/api/organizations/switch", token, json!({ "organization_id": org }))
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "switch failed: {} {}", status, body);
    Ok(())
}

#[tokio::test]
async fn rows_never_leak_between_organizations() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, beta) = two_organizations(&server).await?;
    let (u1, _) = server.login("u1@alpha.fr").await?;

    switch(&server, &u1, &alpha).await?;
    let (status, body) = server
        .post("/api/crm/companies", &u1, json!({ "name": "Client Alpha" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let company = body["data"]["id"].as_str().context("company id")?.to_string();
    assert_eq!(body["data"]["organization_id"], alpha.as_str());

    switch(&server, &u1, &beta).await?;
    let (status, body) = server.get("/api/crm/companies", &u1).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let path = format!("/api/crm/companies/{}", company);
    let (status, body) = server.get(&path, &u1).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CROSS_TENANT");

    let (status, _) = server.patch(&path, &u1, json!({ "name": "Hijacked" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Back in Alpha the row is untouched.
    switch(&server, &u1, &alpha).await?;
    let (status, body) = server.get(&path, &u1).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Client Alpha");
    Ok(())
}

#[tokio::test]
async fn cross_tenant_delete_is_refused_even_with_delete_permission() -> Result<()> {
    let server = TestServer::start().await?;
    let alpha = server.register("u1@alpha.fr", Some("Alpha")).await?.context("alpha")?;
    let beta = server.register("u2@beta.fr", Some("Beta")).await?.context("beta")?;
    let (u2, _) = server.login("u2@beta.fr").await?;
    server.join(&u2, "u1@alpha.fr", "admin").await?;
    let (u1, _) = server.login("u1@alpha.fr").await?;

    switch(&server, &u1, &alpha).await?;
    let (_, body) = server
        .post("/api/crm/companies", &u1, json!({ "name": "Client Alpha" }))
        .await?;
    let company = body["data"]["id"].as_str().context("company id")?.to_string();
    let (status, created) = server
        .post(
            "/api/invoicing/invoices",
            &u1,
            json!({
                "number": "F-2024-001",
                "company_id": company,
                "lines": [{ "description": "Audit", "quantity": 2, "unit_price": "150.00" }],
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let invoice = created["data"]["id"].as_str().context("invoice id")?.to_string();
    let path = format!("/api/invoicing/invoices/{}", invoice);

    // Admin in Beta holds invoicing delete, yet Alpha's invoice stays out of reach.
    switch(&server, &u1, &beta).await?;
    let (status, body) = server.delete(&path, &u1).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CROSS_TENANT");

    switch(&server, &u1, &alpha).await?;
    let (status, body) = server.get(&path, &u1).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], created["data"]);
    Ok(())
}

#[tokio::test]
async fn client_supplied_organization_is_ignored() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, beta) = two_organizations(&server).await?;
    let (u1, _) = server.login("u1@alpha.fr").await?;
    switch(&server, &u1, &alpha).await?;

    let (status, body) = server
        .post(
            "/api/crm/companies",
            &u1,
            json!({ "name": "Sneaky", "organization_id": beta }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["organization_id"], alpha.as_str());
    Ok(())
}

#[tokio::test]
async fn references_must_stay_inside_the_organization() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, beta) = two_organizations(&server).await?;
    let (u1, _) = server.login("u1@alpha.fr").await?;

    switch(&server, &u1, &alpha).await?;
    let (_, body) = server
        .post("/api/crm/companies", &u1, json!({ "name": "Alpha Client" }))
        .await?;
    let company = body["data"]["id"].as_str().context("company id")?.to_string();

    switch(&server, &u1, &beta).await?;
    let (status, body) = server
        .post(
            "/api/crm/contacts",
            &u1,
            json!({ "last_name": "Martin", "company_id": company }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CROSS_TENANT");
    Ok(())
}

#[tokio::test]
async fn role_limits_apply_per_organization() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, beta) = two_organizations(&server).await?;
    let (u1, _) = server.login("u1@alpha.fr").await?;

    // Member in Beta: may create, may not delete.
    switch(&server, &u1, &beta).await?;
    let (status, body) = server
        .post("/api/crm/companies", &u1, json!({ "name": "Beta Lead" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let company = body["data"]["id"].as_str().context("company id")?.to_string();
    let (status, _) = server.delete(&format!("/api/crm/companies/{}", company), &u1).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/api/organization/audit", &u1).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner in Alpha: may delete.
    switch(&server, &u1, &alpha).await?;
    let (_, body) = server
        .post("/api/crm/companies", &u1, json!({ "name": "Alpha Lead" }))
        .await?;
    let company = body["data"]["id"].as_str().context("company id")?.to_string();
    let (status, _) = server.delete(&format!("/api/crm/companies/{}", company), &u1).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn switching_to_a_foreign_organization_is_refused() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, _) = two_organizations(&server).await?;
    let gamma = server.register("u3@gamma.fr", Some("Gamma")).await?.context("gamma")?;
    let (u1, _) = server.login("u1@alpha.fr").await?;
    switch(&server, &u1, &alpha).await?;

    let (status, _) = server
        .post("/api/organizations/switch", &u1, json!({ "organization_id": gamma }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = server.get("/api/auth/whoami", &u1).await?;
    assert_eq!(body["data"]["organization"]["id"], alpha.as_str());
    Ok(())
}

#[tokio::test]
async fn super_admin_reads_any_organization() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, beta) = two_organizations(&server).await?;
    account_service::create_superuser(&server.state, "root@bizhub.fr", PASSWORD).await?;

    let (u1, _) = server.login("u1@alpha.fr").await?;
    switch(&server, &u1, &alpha).await?;
    let (_, body) = server
        .post("/api/invoicing/products", &u1, json!({ "reference": "P-1", "name": "Audit", "unit_price": "100" }))
        .await?;
    let product = body["data"]["id"].as_str().context("product id")?.to_string();

    let (root, login) = server.login("root@bizhub.fr").await?;
    assert_eq!(login["session"]["state"], "active");

    switch(&server, &root, &beta).await?;
    let (status, body) = server
        .get(&format!("/api/invoicing/products/{}", product), &root)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reference"], "P-1");

    let (status, body) = server
        .get(&format!("/api/invoicing/products/{}/lookup", product), &root)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let ttc: f64 = body["data"]["unit_price_ttc"].as_str().context("ttc")?.parse()?;
    assert!((ttc - 120.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn business_keys_are_unique_per_organization_only() -> Result<()> {
    let server = TestServer::start().await?;
    let (alpha, beta) = two_organizations(&server).await?;
    let (u1, _) = server.login("u1@alpha.fr").await?;
    let product = json!({ "reference": "REF-1", "name": "Widget", "unit_price": "10" });

    switch(&server, &u1, &alpha).await?;
    let (status, _) = server.post("/api/invoicing/products", &u1, product.clone()).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = server.post("/api/invoicing/products", &u1, product.clone()).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    switch(&server, &u1, &beta).await?;
    let (status, _) = server.post("/api/invoicing/products", &u1, product).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}
