//! Request/response scenarios over real TCP connections.

use funko_server::model::FunkoPatch;
use funko_server::protocol::{Command, Request, Response, ResponseKind};

mod common;

#[tokio::test]
async fn add_then_list_persists_one_file() {
    let server = common::TestServer::start().await;
    let client = server.client();

    let added = client
        .send(&Request::new("alice", Command::Add(common::funko("Groot", 25.0))))
        .await
        .unwrap();
    assert!(added.success, "{}", added.message);
    assert_eq!(added.kind, ResponseKind::Add);
    assert_eq!(added.message, "Funko Groot added successfully");

    let stored = server.user_dir("alice").join("1.json");
    assert!(stored.is_file());
    let on_disk = common::read_item(&stored);
    assert_eq!(on_disk["id"], "1");
    assert_eq!(on_disk["type"], "Pop!");

    let listed = client.send(&Request::new("alice", Command::List)).await.unwrap();
    assert!(listed.success);
    assert_eq!(listed.message, "Funkos found");
    let items = listed.items.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "1");
    assert_eq!(items[0].name, "Groot");

    server.stop().await;
}

#[tokio::test]
async fn full_lifecycle_of_one_item() {
    let server = common::TestServer::start().await;
    let client = server.client();

    client
        .send(&Request::new("alice", Command::Add(common::funko("Groot", 25.0))))
        .await
        .unwrap();

    let patch = FunkoPatch {
        market_value: Some(40.0),
        exclusive: Some(true),
        ..Default::default()
    };
    let updated = client
        .send(&Request::new("alice", Command::Update { id: "1".into(), patch }))
        .await
        .unwrap();
    assert!(updated.success);
    assert_eq!(updated.message, "Funko with ID 1 updated successfully");

    let shown = client
        .send(&Request::new("alice", Command::Show { id: "1".into() }))
        .await
        .unwrap();
    let item = shown.item.unwrap();
    assert_eq!(item.market_value, 40.0);
    assert!(item.exclusive);
    assert_eq!(item.name, "Groot");

    let removed = client
        .send(&Request::new("alice", Command::Remove { id: "1".into() }))
        .await
        .unwrap();
    assert!(removed.success);
    assert!(!server.user_dir("alice").join("1.json").exists());

    let missing = client
        .send(&Request::new("alice", Command::Show { id: "1".into() }))
        .await
        .unwrap();
    assert!(!missing.success);
    assert_eq!(missing.kind, ResponseKind::Show);
    assert_eq!(missing.message, "Funko with ID 1 not found");

    server.stop().await;
}

#[tokio::test]
async fn users_are_isolated() {
    let server = common::TestServer::start().await;
    let client = server.client();

    client
        .send(&Request::new("alice", Command::Add(common::funko("Groot", 25.0))))
        .await
        .unwrap();
    let bob = client
        .send(&Request::new("bob", Command::Add(common::funko("Rocket", 10.0))))
        .await
        .unwrap();
    // Each user allocates ids independently.
    assert_eq!(bob.item.unwrap().id, "1");

    let listed = client.send(&Request::new("bob", Command::List)).await.unwrap();
    let names: Vec<_> = listed.items.unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Rocket"]);

    server.stop().await;
}

#[tokio::test]
async fn state_survives_restart() {
    let server = common::TestServer::start().await;
    server
        .client()
        .send(&Request::new("alice", Command::Add(common::funko("Groot", 25.0))))
        .await
        .unwrap();

    // A second server over the same directory sees the stored item.
    let data_dir = server.data_dir.path().to_path_buf();
    let second = common::TestServer::start().await;
    std::fs::create_dir_all(second.user_dir("alice")).unwrap();
    std::fs::copy(
        data_dir.join("alice/1.json"),
        second.user_dir("alice").join("1.json"),
    )
    .unwrap();

    let added = second
        .client()
        .send(&Request::new("alice", Command::Add(common::funko("Rocket", 5.0))))
        .await
        .unwrap();
    assert_eq!(added.item.unwrap().id, "2");

    server.stop().await;
    second.stop().await;
}

#[tokio::test]
async fn malformed_json_is_answered() {
    let server = common::TestServer::start().await;

    let raw = server.client().send_raw(b"{ not json").await.unwrap();
    let response: Response = serde_json::from_slice(&raw).unwrap();
    assert_eq!(response.kind, ResponseKind::Error);
    assert!(!response.success);
    assert_eq!(response.message, "Invalid JSON format");

    server.stop().await;
}

#[tokio::test]
async fn unknown_type_is_answered() {
    let server = common::TestServer::start().await;

    let raw = server
        .client()
        .send_raw(br#"{"type":"explode","user":"alice"}"#)
        .await
        .unwrap();
    let response: Response = serde_json::from_slice(&raw).unwrap();
    assert_eq!(response.kind, ResponseKind::Error);
    assert_eq!(response.message, "Invalid request type");
    assert!(!server.user_dir("alice").exists());

    server.stop().await;
}

#[tokio::test]
async fn half_close_without_newline_is_a_complete_request() {
    let server = common::TestServer::start().await;

    let raw = server
        .client()
        .send_raw(br#"{"type":"list","user":"carol"}"#)
        .await
        .unwrap();
    assert_eq!(raw.last(), Some(&b'\n'));
    let response: Response = serde_json::from_slice(&raw).unwrap();
    assert_eq!(response.kind, ResponseKind::List);
    assert!(!response.success);
    assert_eq!(response.message, "No Funkos found");

    server.stop().await;
}

#[tokio::test]
async fn legacy_request_shape_is_accepted() {
    let server = common::TestServer::start().await;

    let add = r#"{"type":"add","user":"alice","funko":{"name":"Groot","description":"",
        "type":"Pop!","genre":"Ánime","franchise":"Marvel","number":1,"exclusive":false,
        "marketValue":12}}"#;
    let raw = server.client().send_raw(add.as_bytes()).await.unwrap();
    let response: Response = serde_json::from_slice(&raw).unwrap();
    assert!(response.success, "{}", response.message);

    let read = br#"{"type":"read","user":"alice","id":1}"#;
    let raw = server.client().send_raw(read).await.unwrap();
    let response: Response = serde_json::from_slice(&raw).unwrap();
    assert_eq!(response.kind, ResponseKind::Show);
    assert_eq!(response.item.unwrap().market_value, 12.0);

    server.stop().await;
}
