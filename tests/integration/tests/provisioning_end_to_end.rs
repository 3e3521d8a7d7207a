use std::sync::Arc;

use httpmock::prelude::*;
use launch_core::{
    InMemorySessionStore, ProvisioningRequest, ProvisioningStep, SecretBundle, SessionStore,
    StepOutcome,
};
use launch_provisioner::{Orchestrator, ProvisionerSettings, ServiceCredentials};
use serde_json::json;

fn settings(server: &MockServer) -> ProvisionerSettings {
    ProvisionerSettings {
        settle_delay_ms: 0,
        request_timeout_ms: 5_000,
        github_api_base: server.base_url(),
        vercel_api_base: server.base_url(),
        elevenlabs_api_base: server.base_url(),
        ..ProvisionerSettings::default()
    }
}

fn credentials() -> ServiceCredentials {
    ServiceCredentials {
        github_token: Some("test-github-token".to_string()),
        github_owner: Some("acme-org".to_string()),
        vercel_token: Some("test-vercel-token".to_string()),
        vercel_team_id: Some("team_123".to_string()),
        elevenlabs_api_key: Some("test-xi-key".to_string()),
    }
}

fn request() -> ProvisioningRequest {
    ProvisioningRequest::builder("Acme Co")
        .company_name("Acme Co")
        .secrets(SecretBundle {
            datastore_url: Some("https://db.acme.test".to_string()),
            datastore_anon_key: Some("anon-public".to_string()),
            datastore_service_key: Some("service-secret".to_string()),
            voice_api_key: None,
            agent_id: None,
        })
        .build()
        .expect("request")
}

struct VoiceAndHostingMocks<'a> {
    list_agents: httpmock::Mock<'a>,
    create_agent: httpmock::Mock<'a>,
    create_project: httpmock::Mock<'a>,
    create_env: httpmock::Mock<'a>,
    deploy: httpmock::Mock<'a>,
}

fn mock_voice_and_hosting(server: &MockServer) -> VoiceAndHostingMocks<'_> {
    let list_agents = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/convai/agents")
            .header("xi-api-key", "test-xi-key");
        then.status(200)
            .json_body(json!({"agents": [], "has_more": false}));
    });
    let create_agent = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/convai/agents/create")
            .json_body_includes(json!({"name": "Acme Co Setup Agent"}).to_string());
        then.status(200).json_body(json!({"agent_id": "agent_e2e"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v9/projects/acme-co");
        then.status(404).json_body(json!({"error": {"code": "not_found"}}));
    });
    let create_project = server.mock(|when, then| {
        when.method(POST)
            .path("/v10/projects")
            .query_param("teamId", "team_123")
            .header("authorization", "Bearer test-vercel-token")
            .json_body_includes(json!({"name": "acme-co"}).to_string());
        then.status(200)
            .json_body(json!({"id": "prj_e2e", "name": "acme-co"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v9/projects/prj_e2e/env");
        then.status(200).json_body(json!({"envs": []}));
    });
    let create_env = server.mock(|when, then| {
        when.method(POST).path("/v10/projects/prj_e2e/env");
        then.status(201).json_body(json!({"created": {"id": "env_1"}}));
    });
    let deploy = server.mock(|when, then| {
        when.method(POST)
            .path("/v13/deployments")
            .json_body_includes(
                json!({"target": "production", "gitSource": {"repo": "acme-org/acme-co"}})
                    .to_string(),
            );
        then.status(200)
            .json_body(json!({"id": "dpl_e2e", "url": "acme-co-abc.vercel.app"}));
    });
    VoiceAndHostingMocks {
        list_agents,
        create_agent,
        create_project,
        create_env,
        deploy,
    }
}

#[tokio::test]
async fn integration_first_run_provisions_all_three_services() {
    let server = MockServer::start();
    let mocks = mock_voice_and_hosting(&server);
    let find_repo = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme-org/acme-co")
            .header("authorization", "Bearer test-github-token");
        then.status(404).json_body(json!({"message": "Not Found"}));
    });
    let generate = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme-org/connexions-template/generate")
            .json_body_includes(json!({"name": "acme-co", "private": false}).to_string());
        then.status(201).json_body(json!({
            "id": 42,
            "name": "acme-co",
            "owner": {"login": "acme-org"},
            "html_url": "https://github.com/acme-org/acme-co",
            "default_branch": "main"
        }));
    });
    let read_readme = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme-org/acme-co/contents/README.md");
        then.status(200).json_body(json!({
            "sha": "sha-1",
            "encoding": "base64",
            "content": "IyBUZW1wbGF0ZQo=\n"
        }));
    });
    let write_readme = server.mock(|when, then| {
        when.method(PUT)
            .path("/repos/acme-org/acme-co/contents/README.md")
            .json_body_includes(json!({"sha": "sha-1"}).to_string());
        then.status(200).json_body(json!({"content": {"sha": "sha-2"}}));
    });

    let sessions = Arc::new(InMemorySessionStore::new());
    let orchestrator =
        Orchestrator::from_settings(&settings(&server), &credentials(), sessions.clone())
            .expect("orchestrator");

    let report = orchestrator
        .provision_with_id("e2e-1".to_string(), &request())
        .await;

    assert!(report.success, "unexpected failure: {:?}", report.error);
    assert_eq!(report.agent_id.as_deref(), Some("agent_e2e"));
    assert_eq!(
        report.repository_url.as_deref(),
        Some("https://github.com/acme-org/acme-co")
    );
    assert_eq!(
        report.deployment_url.as_deref(),
        Some("https://acme-co.vercel.app")
    );
    mocks.list_agents.assert_calls(1);
    mocks.create_agent.assert_calls(1);
    find_repo.assert_calls(1);
    generate.assert_calls(1);
    read_readme.assert_calls(1);
    write_readme.assert_calls(1);
    mocks.create_project.assert_calls(1);
    mocks.create_env.assert_calls(7);
    mocks.deploy.assert_calls(1);
    assert_eq!(sessions.get("e2e-1").await, Some(report));
}

#[tokio::test]
async fn integration_repository_outage_still_deploys_from_derived_reference() {
    let server = MockServer::start();
    let mocks = mock_voice_and_hosting(&server);
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme-org/acme-co");
        then.status(404).json_body(json!({"message": "Not Found"}));
    });
    let generate = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme-org/connexions-template/generate");
        then.status(500).body("github is down");
    });

    let orchestrator = Orchestrator::from_settings(
        &settings(&server),
        &credentials(),
        Arc::new(InMemorySessionStore::new()),
    )
    .expect("orchestrator");

    let report = orchestrator.provision(&request()).await;

    assert!(!report.success);
    assert!(report
        .error
        .as_deref()
        .expect("error")
        .starts_with("repository step failed:"));
    assert!(matches!(
        report.step(ProvisioningStep::Repository).map(|step| &step.outcome),
        Some(StepOutcome::Failed { .. })
    ));
    assert_eq!(
        report.deployment_url.as_deref(),
        Some("https://acme-co.vercel.app")
    );
    generate.assert_calls(1);
    mocks.create_project.assert_calls(1);
    mocks.create_env.assert_calls(7);
    mocks.deploy.assert_calls(1);
}
