#![allow(clippy::unwrap_used)]
// Pull and push against a mocked ChirpStack v2 application server.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lorasync_api::TransportConfig;
use lorasync_core::{
    Application, DataKey, DevEui, Device, DeviceCredentials, DeviceKeys, DeviceProfile,
    EntityKind, IntegrationTarget, LocalId, LocalStore, MemoryStore, Network, NetworkProtocol,
    NetworkSettings, ProtocolDataStore, ProtocolKind, PushOptions, RemoteId, SyncEngine,
    SyncOutcome, adapter_for,
};

// ── Helpers ─────────────────────────────────────────────────────────

const EUI_OTAA: &str = "0004a30b001c0530";
const EUI_SPARE: &str = "0004a30b001c0531";
const EUI_ABP: &str = "0004a30b001c0532";

fn network(server: &MockServer) -> Network {
    let mut network = Network::new("cs2", ProtocolKind::ChirpStackV2);
    network.base_url = Some(Url::parse(&server.uri()).unwrap());
    network.security.username = Some("admin".into());
    network.security.password = Some(SecretString::from("admin".to_string()));
    network.security.uplink_api_key = Some(SecretString::from("s3cret".to_string()));
    network.settings = NetworkSettings {
        organization_id: Some("1".into()),
        service_profile_id: Some("sp-1".into()),
        network_server_id: Some("ns-1".into()),
        handler_id: None,
    };
    network
}

async fn setup() -> (MockServer, Network, Arc<dyn NetworkProtocol>, Arc<MemoryStore>, SyncEngine) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/internal/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jwt": "token" })))
        .mount(&server)
        .await;

    let network = network(&server);
    let adapter = adapter_for(&network, &TransportConfig::default()).unwrap();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), store.clone());
    (server, network, adapter, store, engine)
}

async fn mount_remote_graph(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": "1",
            "result": [
                { "id": "1", "name": "Acme", "organizationID": "1", "serviceProfileID": "sp-1" }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("applicationID", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": "2",
            "result": [
                { "devEUI": EUI_OTAA, "name": "meter-1", "applicationID": "1", "deviceProfileID": "dp-1" },
                { "devEUI": EUI_SPARE, "name": "meter-2", "applicationID": "1", "deviceProfileID": "dp-1" }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device-profiles/dp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceProfile": {
                "id": "dp-1",
                "name": "Class A OTAA",
                "organizationID": "1",
                "networkServerID": "ns-1",
                "macVersion": "1.0.2",
                "regParamsRevision": "B",
                "supportsJoin": true
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/devices/{EUI_OTAA}/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceKeys": { "nwkKey": "00112233445566778899aabbccddeeff" }
        })))
        .mount(server)
        .await;
    // Not provisioned yet.
    Mock::given(method("GET"))
        .and(path(format!("/api/devices/{EUI_SPARE}/keys")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "object does not exist", "code": 5
        })))
        .mount(server)
        .await;
}

/// One application linked to the network with one OTAA device.
async fn seed_local(store: &MemoryStore, network: &Network, profile: DeviceProfile) -> (LocalId, LocalId, LocalId) {
    let company = store.create_company("acme").await.unwrap();
    let app = Application {
        name: "Acme".into(),
        ..Default::default()
    };
    let app_rec = store.create_application(company.id, app.clone()).await.unwrap();
    store
        .create_application_link(app_rec.id, &network.id, app)
        .await
        .unwrap();

    let dp_rec = store.create_device_profile(company.id, profile).await.unwrap();
    let device = Device {
        credentials: Some(DeviceCredentials::Keys(DeviceKeys {
            app_key: Some("00112233445566778899aabbccddeeff".into()),
            ..Default::default()
        })),
        ..Device::new(DevEui::new(EUI_OTAA).unwrap(), "meter-1")
    };
    let dev_rec = store.create_device(app_rec.id, device.clone()).await.unwrap();
    store
        .create_device_link(dev_rec.id, &network.id, dp_rec.id, device)
        .await
        .unwrap();
    (app_rec.id, dp_rec.id, dev_rec.id)
}

fn otaa_profile() -> DeviceProfile {
    DeviceProfile {
        name: "Class A OTAA".into(),
        mac_version: Some("1.0.2".into()),
        reg_params_revision: Some("B".into()),
        supports_join: true,
        ..Default::default()
    }
}

// ── Pull ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_pull_imports_graph_once() {
    let (server, network, adapter, store, engine) = setup().await;
    mount_remote_graph(&server).await;
    let company = store.create_company("acme").await.unwrap();

    let report = engine.pull(&network, adapter.as_ref(), company.id).await.unwrap();

    assert_eq!(store.list_applications().await.unwrap().len(), 1);
    assert_eq!(store.list_device_profiles().await.unwrap().len(), 1);
    assert_eq!(store.list_devices(None).await.unwrap().len(), 2);
    assert_eq!(store.list_device_links(&network.id).await.unwrap().len(), 2);
    // app + dp + 2 devices
    assert_eq!(store.protocol_entries(Some(&network.id)).len(), 4);
    assert_eq!(report.created(), 4);

    // Both devices share the profile; it is fetched once.
    let profile_fetches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/device-profiles/dp-1")
        .count();
    assert_eq!(profile_fetches, 1);

    let devices = store.list_devices(None).await.unwrap();
    let otaa = devices
        .iter()
        .find(|d| d.device.dev_eui.as_str() == EUI_OTAA)
        .unwrap();
    assert!(matches!(
        otaa.device.credentials,
        Some(DeviceCredentials::Keys(_))
    ));

    let app = &store.list_applications().await.unwrap()[0];
    assert_eq!(
        store
            .load_value(&network.id, &DataKey::remote_id(EntityKind::Application, app.id))
            .await
            .unwrap()
            .as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn test_full_pull_reads_abp_activation() {
    let (server, network, adapter, store, engine) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": "1",
            "result": [
                { "id": "1", "name": "Acme", "organizationID": "1", "serviceProfileID": "sp-1" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("applicationID", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": "2",
            "result": [
                { "devEUI": EUI_OTAA, "name": "meter-1", "applicationID": "1", "deviceProfileID": "dp-1" },
                { "devEUI": EUI_ABP, "name": "meter-abp", "applicationID": "1", "deviceProfileID": "dp-2" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device-profiles/dp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceProfile": {
                "id": "dp-1", "name": "Class A OTAA", "organizationID": "1",
                "networkServerID": "ns-1", "macVersion": "1.0.2", "supportsJoin": true
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device-profiles/dp-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceProfile": {
                "id": "dp-2", "name": "Class A ABP", "organizationID": "1",
                "networkServerID": "ns-1", "macVersion": "1.0.2", "supportsJoin": false
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/devices/{EUI_OTAA}/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceKeys": { "nwkKey": "00112233445566778899aabbccddeeff" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/devices/{EUI_ABP}/activation")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceActivation": {
                "devAddr": "26011b2c",
                "appSKey": "0102030405060708090a0b0c0d0e0f10",
                "fNwkSIntKey": "100f0e0d0c0b0a090807060504030201",
                "fCntUp": 12
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    // ABP devices have no keys to read.
    Mock::given(method("GET"))
        .and(path(format!("/api/devices/{EUI_ABP}/keys")))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;
    let company = store.create_company("acme").await.unwrap();

    let report = engine.pull(&network, adapter.as_ref(), company.id).await.unwrap();

    assert_eq!(report.created(), 5);
    assert_eq!(store.list_device_profiles().await.unwrap().len(), 2);
    let devices = store.list_devices(None).await.unwrap();
    let abp = devices
        .iter()
        .find(|d| d.device.dev_eui.as_str() == EUI_ABP)
        .unwrap();
    match &abp.device.credentials {
        Some(DeviceCredentials::Activation(a)) => {
            assert_eq!(a.dev_addr, "26011b2c");
            assert_eq!(a.app_s_key, "0102030405060708090a0b0c0d0e0f10");
            assert_eq!(a.f_cnt_up, 12);
        }
        other => panic!("expected ABP activation, got {other:?}"),
    }
    let otaa = devices
        .iter()
        .find(|d| d.device.dev_eui.as_str() == EUI_OTAA)
        .unwrap();
    assert!(matches!(
        otaa.device.credentials,
        Some(DeviceCredentials::Keys(_))
    ));
}

#[tokio::test]
async fn test_second_pull_reports_already_synced() {
    let (server, network, adapter, store, engine) = setup().await;
    mount_remote_graph(&server).await;
    let company = store.create_company("acme").await.unwrap();

    engine.pull(&network, adapter.as_ref(), company.id).await.unwrap();
    let report = engine.pull(&network, adapter.as_ref(), company.id).await.unwrap();

    assert_eq!(report.created(), 0);
    assert_eq!(report.already_synced(), 3);
    assert_eq!(store.list_devices(None).await.unwrap().len(), 2);
    assert_eq!(store.protocol_entries(Some(&network.id)).len(), 4);
}

#[tokio::test]
async fn test_pull_into_unknown_company_fails_without_remote_calls() {
    let (_server, network, adapter, _store, engine) = setup().await;
    let err = engine
        .pull(&network, adapter.as_ref(), LocalId(404))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_pull_aborts_on_remote_failure() {
    let (server, network, adapter, store, engine) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "database unavailable", "code": 13
        })))
        .mount(&server)
        .await;
    let company = store.create_company("acme").await.unwrap();

    assert!(engine.pull(&network, adapter.as_ref(), company.id).await.is_err());
    assert!(store.list_applications().await.unwrap().is_empty());
}

// ── Push ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_push_twice_creates_once() {
    let (server, network, adapter, store, engine) = setup().await;
    let (app_id, dp_id, dev_id) = seed_local(&store, &network, otaa_profile()).await;

    Mock::given(method("POST"))
        .and(path("/api/applications"))
        .and(body_partial_json(json!({
            "application": { "name": "Acme", "organizationID": "1", "serviceProfileID": "sp-1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "7" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/device-profiles"))
        .and(body_partial_json(json!({
            "deviceProfile": { "name": "Class A OTAA", "networkServerID": "ns-1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "dp-9" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_partial_json(json!({
            "device": { "devEUI": EUI_OTAA, "applicationID": "7", "deviceProfileID": "dp-9" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/devices/{EUI_OTAA}/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let options = PushOptions::default();
    let first = engine.push(&network, adapter.as_ref(), &options).await.unwrap();
    assert_eq!(
        first.outcome_of(EntityKind::Application, app_id),
        Some(&SyncOutcome::Created {
            remote_id: RemoteId::new("7")
        })
    );
    assert_eq!(
        first.outcome_of(EntityKind::DeviceProfile, dp_id),
        Some(&SyncOutcome::Created {
            remote_id: RemoteId::new("dp-9")
        })
    );
    assert_eq!(
        first.outcome_of(EntityKind::Device, dev_id),
        Some(&SyncOutcome::Created {
            remote_id: RemoteId::new(EUI_OTAA)
        })
    );

    let second = engine.push(&network, adapter.as_ref(), &options).await.unwrap();
    assert_eq!(second.created(), 0);
    assert_eq!(second.already_synced(), 3);

    // company → organization, app, dp, device
    assert_eq!(store.protocol_entries(Some(&network.id)).len(), 4);
}

#[tokio::test]
async fn test_failed_device_does_not_stop_its_siblings() {
    let (server, network, adapter, store, engine) = setup().await;
    let (app_id, dp_id, dev_id) = seed_local(&store, &network, otaa_profile()).await;
    let spare = Device::new(DevEui::new(EUI_SPARE).unwrap(), "meter-2");
    let spare_rec = store.create_device(app_id, spare.clone()).await.unwrap();
    store
        .create_device_link(spare_rec.id, &network.id, dp_id, spare)
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "7" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/device-profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "dp-9" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_partial_json(json!({ "device": { "devEUI": EUI_SPARE } })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "storage full", "code": 13
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_partial_json(json!({ "device": { "devEUI": EUI_OTAA } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/devices/{EUI_OTAA}/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine
        .push(&network, adapter.as_ref(), &PushOptions::default())
        .await
        .unwrap();

    match report.outcome_of(EntityKind::Device, spare_rec.id) {
        Some(SyncOutcome::Failed { reason }) => assert!(reason.contains("storage full")),
        other => panic!("expected failed device, got {other:?}"),
    }
    assert_eq!(
        report.outcome_of(EntityKind::Device, dev_id),
        Some(&SyncOutcome::Created {
            remote_id: RemoteId::new(EUI_OTAA)
        })
    );
    assert_eq!(
        store
            .load_value(&network.id, &DataKey::remote_id(EntityKind::Device, dev_id))
            .await
            .unwrap()
            .as_deref(),
        Some(EUI_OTAA)
    );
    assert_eq!(
        store
            .load_value(&network.id, &DataKey::remote_id(EntityKind::Device, spare_rec.id))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_device_left_without_keys_is_finished_on_retry() {
    let (server, network, adapter, store, engine) = setup().await;
    let (_app_id, _dp_id, dev_id) = seed_local(&store, &network, otaa_profile()).await;

    Mock::given(method("POST"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "7" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/device-profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "dp-9" })))
        .expect(1)
        .mount(&server)
        .await;
    // The first create lands; afterwards the device already exists.
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "object already exists", "code": 6
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/devices/{EUI_OTAA}/keys")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "boom", "code": 13
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/devices/{EUI_OTAA}/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let options = PushOptions::default();
    let key = DataKey::remote_id(EntityKind::Device, dev_id);

    let first = engine.push(&network, adapter.as_ref(), &options).await.unwrap();
    assert!(matches!(
        first.outcome_of(EntityKind::Device, dev_id),
        Some(SyncOutcome::Failed { .. })
    ));
    assert_eq!(store.load_value(&network.id, &key).await.unwrap(), None);

    let second = engine.push(&network, adapter.as_ref(), &options).await.unwrap();
    assert_eq!(
        second.outcome_of(EntityKind::Device, dev_id),
        Some(&SyncOutcome::Created {
            remote_id: RemoteId::new(EUI_OTAA)
        })
    );
    assert_eq!(
        store.load_value(&network.id, &key).await.unwrap().as_deref(),
        Some(EUI_OTAA)
    );

    let third = engine.push(&network, adapter.as_ref(), &options).await.unwrap();
    assert_eq!(
        third.outcome_of(EntityKind::Device, dev_id),
        Some(&SyncOutcome::AlreadySynced)
    );
}

#[tokio::test]
async fn test_push_trusts_stored_mapping_without_verify() {
    let (server, network, adapter, store, engine) = setup().await;
    let company = store.create_company("acme").await.unwrap();
    let app = Application {
        name: "Acme".into(),
        ..Default::default()
    };
    let rec = store.create_application(company.id, app.clone()).await.unwrap();
    store.create_application_link(rec.id, &network.id, app).await.unwrap();
    store
        .upsert(&network.id, &DataKey::remote_id(EntityKind::Application, rec.id), "7")
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/applications/7"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "8" })))
        .expect(0)
        .mount(&server)
        .await;

    let report = engine
        .push(&network, adapter.as_ref(), &PushOptions::default())
        .await
        .unwrap();
    assert_eq!(
        report.outcome_of(EntityKind::Application, rec.id),
        Some(&SyncOutcome::AlreadySynced)
    );
}

#[tokio::test]
async fn test_push_with_verify_recreates_deleted_application() {
    let (server, network, adapter, store, engine) = setup().await;
    let company = store.create_company("acme").await.unwrap();
    let app = Application {
        name: "Acme".into(),
        ..Default::default()
    };
    let rec = store.create_application(company.id, app.clone()).await.unwrap();
    store.create_application_link(rec.id, &network.id, app).await.unwrap();
    let key = DataKey::remote_id(EntityKind::Application, rec.id);
    store.upsert(&network.id, &key, "7").await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/applications/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "object does not exist", "code": 5
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "8" })))
        .expect(1)
        .mount(&server)
        .await;

    let options = PushOptions {
        verify_mappings: true,
    };
    let report = engine.push(&network, adapter.as_ref(), &options).await.unwrap();

    assert_eq!(
        report.outcome_of(EntityKind::Application, rec.id),
        Some(&SyncOutcome::Created {
            remote_id: RemoteId::new("8")
        })
    );
    assert_eq!(
        store.load_value(&network.id, &key).await.unwrap().as_deref(),
        Some("8")
    );
}

#[tokio::test]
async fn test_relationship_mismatch_fails_entity_without_remote_call() {
    let (server, network, adapter, store, engine) = setup().await;
    let foreign = DeviceProfile {
        organization_id: Some("99".into()),
        ..otaa_profile()
    };
    let (app_id, dp_id, dev_id) = seed_local(&store, &network, foreign).await;

    Mock::given(method("POST"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "7" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/device-profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "dp-9" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let report = engine
        .push(&network, adapter.as_ref(), &PushOptions::default())
        .await
        .unwrap();

    assert!(matches!(
        report.outcome_of(EntityKind::Application, app_id),
        Some(SyncOutcome::Created { .. })
    ));
    match report.outcome_of(EntityKind::DeviceProfile, dp_id) {
        Some(SyncOutcome::Failed { reason }) => assert!(reason.contains("mismatch")),
        other => panic!("expected failed profile, got {other:?}"),
    }
    match report.outcome_of(EntityKind::Device, dev_id) {
        Some(SyncOutcome::Failed { reason }) => assert!(reason.contains("dp:")),
        other => panic!("expected failed device, got {other:?}"),
    }
}

#[tokio::test]
async fn test_push_aborts_when_login_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/internal/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let network = network(&server);
    let adapter = adapter_for(&network, &TransportConfig::default()).unwrap();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), store);

    let err = engine
        .push(&network, adapter.as_ref(), &PushOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}

// ── Integrations ────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_falls_back_to_create_and_stop_tolerates_missing() {
    let (server, network, adapter, _store, _engine) = setup().await;
    adapter.connect(&network).await.unwrap();

    Mock::given(method("PUT"))
        .and(path("/api/applications/7/integrations/http"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "object does not exist", "code": 5
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/applications/7/integrations/http"))
        .and(body_partial_json(json!({
            "integration": {
                "uplinkDataURL": "https://ingest.example.com/api/ingest/3/cs2",
                "headers": [{ "key": "Authorization", "value": "Basic Y3MyOnMzY3JldA==" }]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/applications/7/integrations/http"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "object does not exist", "code": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ingest = Url::parse("https://ingest.example.com").unwrap();
    let target = IntegrationTarget::new(&ingest, &network, LocalId(3)).unwrap();
    let app = RemoteId::new("7");

    adapter.start_application(&network, &app, &target).await.unwrap();
    adapter.stop_application(&network, &app).await.unwrap();
}
