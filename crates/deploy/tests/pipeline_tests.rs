mod common;

use common::{test_config, write_file, CountingNames, RecordingUploader};
use ipfs_deploy::name::{NameService, Resolution};
use ipfs_deploy::{
    DeployConfig, DeployError, DeployPipeline, ErrorKind, NameKey, Stage, UnavailablePolicy,
};
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn publishes_site_and_writes_report() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"<html></html>");
    write_file(&dir.path().join("public"), "assets/logo.png", &[0x89, b'P', b'N', b'G']);

    let config = test_config(dir.path(), &[]);
    let report_path = config.report_path.clone();
    let key = NameKey::generate().unwrap();
    let ipns = key.name().to_string();
    assert!(ipns.starts_with("k51qzi5uqu5d"));

    let mut pipeline = DeployPipeline::new(
        config,
        key,
        RecordingUploader::returning("bafybeigdyrzt"),
        CountingNames::new(),
    );
    let report = pipeline.run().await.unwrap();

    assert_eq!(pipeline.stage(), Stage::Done);
    assert_eq!(report.cid, "bafybeigdyrzt");
    let expected = format!(
        "CID=bafybeigdyrzt\n\
         IPNS={ipns}\n\
         Gateway (CID): https://ipfs.io/ipfs/bafybeigdyrzt/\n\
         Gateway (IPNS): https://ipfs.io/ipns/{ipns}/\n"
    );
    assert_eq!(fs::read_to_string(report_path).unwrap(), expected);

    let published = pipeline.names().resolve(pipeline.key().name()).await;
    match published {
        Resolution::Found(rev) => {
            assert_eq!(rev.sequence(), 0);
            assert_eq!(rev.value(), "/ipfs/bafybeigdyrzt");
        }
        other => panic!("unexpected resolution {other:?}"),
    }
}

#[tokio::test]
async fn uploads_relative_paths_under_root_folder() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("public");
    write_file(&root, "index.html", b"x");
    write_file(&root, "assets/logo.png", b"y");
    write_file(&root, "assets/fonts/a.woff2", b"z");

    let uploader = RecordingUploader::returning("bafyfolder");
    let mut pipeline = DeployPipeline::new(
        test_config(dir.path(), &[]),
        NameKey::generate().unwrap(),
        uploader,
        CountingNames::new(),
    );
    pipeline.run().await.unwrap();

    assert_eq!(pipeline.uploader().calls(), 1);
    assert_eq!(
        pipeline.uploader().seen(),
        vec![
            "public/assets/fonts/a.woff2",
            "public/assets/logo.png",
            "public/index.html"
        ]
    );
}

#[tokio::test]
async fn second_publish_increments_sequence() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"v1");
    let key = NameKey::generate().unwrap();

    let mut first = DeployPipeline::new(
        test_config(dir.path(), &[]),
        key.clone(),
        RecordingUploader::returning("CID1"),
        CountingNames::new(),
    );
    first.run().await.unwrap();
    let first_rev = match first.names().resolve(key.name()).await {
        Resolution::Found(rev) => rev,
        other => panic!("unexpected resolution {other:?}"),
    };
    assert_eq!(first_rev.sequence(), 0);

    let mut second = DeployPipeline::new(
        test_config(dir.path(), &[]),
        key.clone(),
        RecordingUploader::returning("CID2"),
        CountingNames::with_resolution(Resolution::Found(first_rev)),
    );
    second.run().await.unwrap();

    let record = second.names().inner.record(key.name()).unwrap();
    let rev = record.verify(key.name()).unwrap();
    assert_eq!(rev.sequence(), 1);
    assert_eq!(rev.value(), "/ipfs/CID2");
}

#[tokio::test]
async fn empty_directory_fails_before_upload() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("public/empty")).unwrap();

    let mut pipeline = DeployPipeline::new(
        test_config(dir.path(), &[]),
        NameKey::generate().unwrap(),
        RecordingUploader::returning("unused"),
        CountingNames::new(),
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, DeployError::EmptyDirectory(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert_eq!(pipeline.uploader().calls(), 0);
    assert_eq!(pipeline.names().resolves(), 0);
}

#[tokio::test]
async fn empty_directory_makes_no_network_calls() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("public")).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let endpoint = format!("{}/pinning/pinFileToIPFS", server.uri());
    let key = NameKey::generate().unwrap();
    let config = test_config(
        dir.path(),
        &[
            ("IPFS_DEPLOY_PINATA_ENDPOINT", endpoint.as_str()),
            ("IPFS_DEPLOY_W3NAME_ENDPOINT", server.uri().as_str()),
            ("W3NAME_KEY_B64", key.to_base64().as_str()),
        ],
    );
    let mut pipeline = DeployPipeline::from_config(config).unwrap();

    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn upload_failure_leaves_name_and_report_untouched() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"x");
    let config = test_config(dir.path(), &[]);
    let report_path = config.report_path.clone();
    fs::write(&report_path, "previous report\n").unwrap();

    let mut pipeline = DeployPipeline::new(
        config,
        NameKey::generate().unwrap(),
        RecordingUploader::failing(500),
        CountingNames::new(),
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, DeployError::UploadRejected { status: 500, .. }));
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert_eq!(pipeline.names().resolves(), 0);
    assert_eq!(pipeline.names().publishes(), 0);
    assert_eq!(fs::read_to_string(report_path).unwrap(), "previous report\n");
}

#[tokio::test]
async fn http_upload_failure_never_reaches_name_service() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"x");

    let pinata = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&pinata)
        .await;
    let w3name = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&w3name)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&w3name)
        .await;

    let key = NameKey::generate().unwrap();
    let pinata_uri = pinata.uri();
    let w3name_uri = w3name.uri();
    let key_b64 = key.to_base64();
    let config = test_config(
        dir.path(),
        &[
            ("IPFS_DEPLOY_PINATA_ENDPOINT", pinata_uri.as_str()),
            ("IPFS_DEPLOY_W3NAME_ENDPOINT", w3name_uri.as_str()),
            ("W3NAME_KEY_B64", key_b64.as_str()),
        ],
    );
    let report_path = config.report_path.clone();

    let mut pipeline = DeployPipeline::from_config(config).unwrap();
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, DeployError::UploadRejected { status: 500, .. }));
    assert!(!report_path.exists());
}

#[tokio::test]
async fn rejected_name_publish_keeps_previous_report() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"x");

    let pinata = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "IpfsHash": "bafyok" })),
        )
        .expect(1)
        .mount(&pinata)
        .await;
    let w3name = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&w3name)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid record"))
        .expect(1)
        .mount(&w3name)
        .await;

    let key = NameKey::generate().unwrap();
    let pinata_uri = pinata.uri();
    let w3name_uri = w3name.uri();
    let key_b64 = key.to_base64();
    let config = test_config(
        dir.path(),
        &[
            ("IPFS_DEPLOY_PINATA_ENDPOINT", pinata_uri.as_str()),
            ("IPFS_DEPLOY_W3NAME_ENDPOINT", w3name_uri.as_str()),
            ("W3NAME_KEY_B64", key_b64.as_str()),
        ],
    );
    let report_path = config.report_path.clone();
    fs::write(&report_path, "previous report\n").unwrap();

    let mut pipeline = DeployPipeline::from_config(config).unwrap();
    let err = pipeline.run().await.unwrap_err();

    match &err {
        DeployError::PublishRejected { status, body } => {
            assert_eq!(*status, 400);
            assert_eq!(body, "invalid record");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert_eq!(fs::read_to_string(report_path).unwrap(), "previous report\n");
}

#[tokio::test]
async fn unavailable_resolution_aborts_without_publishing() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"x");
    let config = test_config(dir.path(), &[]);
    let report_path = config.report_path.clone();

    let mut pipeline = DeployPipeline::new(
        config,
        NameKey::generate().unwrap(),
        RecordingUploader::returning("CID1"),
        CountingNames::with_resolution(Resolution::Unavailable("timeout".into())),
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, DeployError::ResolutionUnavailable(_)));
    assert_eq!(pipeline.names().publishes(), 0);
    assert!(!report_path.exists());
}

#[tokio::test]
async fn unavailable_resolution_can_start_fresh() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("public"), "index.html", b"x");
    let mut config = test_config(dir.path(), &[]);
    config.on_unavailable = UnavailablePolicy::StartFresh;

    let key = NameKey::generate().unwrap();
    let mut pipeline = DeployPipeline::new(
        config,
        key.clone(),
        RecordingUploader::returning("CID1"),
        CountingNames::with_resolution(Resolution::Unavailable("timeout".into())),
    );
    pipeline.run().await.unwrap();

    let rev = pipeline
        .names()
        .inner
        .record(key.name())
        .unwrap()
        .verify(key.name())
        .unwrap();
    assert_eq!(rev.sequence(), 0);
}

#[test]
fn missing_credentials_fail_before_any_io() {
    // Root does not exist; credential checks must still win.
    let env = HashMap::from([(
        "IPFS_DEPLOY_ROOT_DIR".to_string(),
        "/definitely/not/here".to_string(),
    )]);
    let config = DeployConfig::load_with_env(None, env.clone()).unwrap();
    assert!(matches!(
        DeployPipeline::from_config(config),
        Err(DeployError::AuthenticationMissing)
    ));

    let mut with_jwt = env;
    with_jwt.insert("PINATA_JWT".into(), "jwt".into());
    let config = DeployConfig::load_with_env(None, with_jwt).unwrap();
    assert!(matches!(
        DeployPipeline::from_config(config),
        Err(DeployError::SigningKeyMissing)
    ));
}
