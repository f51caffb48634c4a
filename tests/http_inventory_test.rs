//! HTTP inventory client against a mock API server

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use converge::config::{ApiConfig, DefaultsConfig};
use converge::engine::{Phase, ReconcileContext, Reconciler};
use converge::inventory::{HttpInventory, InventoryApi, InventoryError};
use converge::model::{DesiredSpecification, Field, ForceHttps, Owner, ProvisioningRequest};
use converge::observability::Metrics;

const TOKEN: &str = "test-token";

fn create_test_client(server: &MockServer) -> HttpInventory {
    let config = ApiConfig {
        endpoint: server.uri(),
        token: Some(TOKEN.to_string()),
        ..ApiConfig::default()
    };
    HttpInventory::new(&config).expect("Failed to build client")
}

fn application_body(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "api",
        "description": "api",
        "zone": "par",
        "ownerId": "user_1",
        "instance": {
            "type": "php",
            "version": "8.2",
            "minInstances": 1,
            "maxInstances": 1,
            "maxAllowedInstances": 40,
            "minFlavor": { "name": "XS" },
            "maxFlavor": { "name": "XS" }
        },
        "deployment": { "type": "GIT", "url": format!("git+ssh://push/{}.git", id) },
        "vhosts": [{ "fqdn": format!("app-{}.cleverapps.io", id) }],
        "homogeneous": true,
        "stickySessions": false,
        "cancelOnPush": false,
        "forceHttps": "ENABLED",
        "separateBuild": true,
        "buildFlavor": { "name": "M" },
        "favourite": false,
        "archived": false
    })
}

fn request() -> ProvisioningRequest {
    ProvisioningRequest {
        name: "api".into(),
        description: "api".into(),
        zone: "par".into(),
        deploy: "git".into(),
        instance_type: "php".into(),
        instance_variant: "var_php".into(),
        instance_version: "8.2".into(),
        min_instances: 1,
        max_instances: 1,
        min_flavor: "XS".into(),
        max_flavor: "XS".into(),
        separate_build: Some(true),
        build_flavor: Some("M".into()),
        homogeneous: Some(true),
        sticky_sessions: None,
        cancel_on_push: None,
        force_https: Some(ForceHttps::Enabled),
        favorite: Some(false),
        archived: None,
        tags: vec!["prod".into()],
        owner: Owner::Organization("orga_1".into()),
        additional_vhosts: Default::default(),
        environment: Default::default(),
    }
}

#[tokio::test]
async fn test_catalog_is_scoped_to_organization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/products/instances"))
        .and(query_param("for", "orga_1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "type": "php",
                "version": "8.2",
                "variant": { "id": "var_php", "slug": "php" },
                "enabled": true,
                "defaultFlavor": { "name": "XS" },
                "buildFlavor": { "name": "M" },
                "flavors": [{ "name": "XS" }, { "name": "M" }]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let variants = create_test_client(&server)
        .list_available_variants(Some("orga_1"))
        .await
        .unwrap();

    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].variant_id, "var_php");
    assert_eq!(variants[0].default_build_flavor, "M");
    assert!(variants[0].enabled);
}

#[tokio::test]
async fn test_create_posts_remote_encoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/organisations/orga_1/applications"))
        .and(body_partial_json(json!({
            "instanceVariant": "var_php",
            "instanceVersion": "8.2",
            "forceHttps": "ENABLED",
            "homogeneous": true,
            "favourite": false,
            "buildFlavor": "M",
            "tags": ["prod"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(application_body("app_1")))
        .expect(1)
        .mount(&server)
        .await;

    let application = create_test_client(&server)
        .create_application(&Owner::Organization("orga_1".into()), &request())
        .await
        .unwrap();

    assert_eq!(application.id, "app_1");
    assert_eq!(application.force_https, "ENABLED");
    assert_eq!(application.instance.max_allowed_instances, 40);
}

#[tokio::test]
async fn test_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/self/applications/app_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("application not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/self"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/self/applications/app_1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"message\":\"boom\"}"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);

    assert_eq!(
        client.get_application(&Owner::SelfAccount, "app_gone").await,
        Err(InventoryError::NotFound("application not found".into()))
    );
    assert_eq!(
        client.get_caller_identity().await,
        Err(InventoryError::Unauthorized {
            status: 401,
            body: "expired token".into()
        })
    );
    assert_eq!(
        client.delete_application(&Owner::SelfAccount, "app_1").await,
        Err(InventoryError::Request {
            status: 500,
            body: "{\"message\":\"boom\"}".into()
        })
    );
}

#[tokio::test]
async fn test_environment_and_vhost_calls() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2/self/applications/app_1/env"))
        .and(body_json(json!({ "CC_WEBROOT": "/public" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/self/applications/app_1/vhosts/www.example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let environment = BTreeMap::from([("CC_WEBROOT".to_string(), "/public".to_string())]);

    client
        .set_environment(&Owner::SelfAccount, "app_1", &environment)
        .await
        .unwrap();
    client
        .add_vhost(&Owner::SelfAccount, "app_1", "www.example.com")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reconcile_create_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/products/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "version": "8.2",
                "variant": { "id": "var_php", "slug": "php" },
                "enabled": true,
                "defaultFlavor": { "name": "XS" },
                "buildFlavor": { "name": "M" },
                "flavors": [{ "name": "XS" }, { "name": "M" }]
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "user_1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/self/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(application_body("app_1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/self/applications/app_1/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["prod"])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/self/applications/app_1/vhosts/www.example.com"))
        .respond_with(ResponseTemplate::new(409).set_body_string("vhost already taken"))
        .mount(&server)
        .await;

    let inventory: Arc<dyn InventoryApi> = Arc::new(create_test_client(&server));
    let ctx = ReconcileContext::new(inventory, DefaultsConfig::default(), Arc::new(Metrics::new()))
        .unwrap();
    let reconciler = Reconciler::new(ctx);

    let spec = DesiredSpecification {
        name: "api".into(),
        instance_type: "php".into(),
        separate_build: Field::Value(true),
        homogeneous: Field::Value(false),
        force_https: Field::Value(true),
        tags: Field::Value(vec!["prod".into()]),
        additional_vhosts: Field::Value(vec!["www.example.com".into()]),
        ..Default::default()
    };
    let outcome = reconciler.create(&spec).await;

    assert_eq!(outcome.phase, Phase::Created);
    let state = outcome.state.as_ref().unwrap();
    assert_eq!(state.id, "app_1");
    assert!(state.force_https);
    assert!(!state.homogeneous);
    assert_eq!(state.build_flavor.as_deref(), Some("M"));
    assert_eq!(state.vhost.as_deref(), Some("app-app_1.cleverapps.io"));
    assert!(state.additional_vhosts.is_empty());

    let errors: Vec<_> = outcome.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].detail.contains("(HTTP 409): vhost already taken"));
}
