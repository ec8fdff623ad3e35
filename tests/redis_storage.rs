//! Redis backend against a real server.
//!
//! Needs Docker; run with `cargo test --test redis_storage -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use testcontainers::{GenericImage, core::IntoContainerPort, runners::AsyncRunner};

use customid_worker::config::RedisStorageConfig;
use customid_worker::domain::{
    ElementSpec, ElementType, IdConfiguration, InventoryId, StoredConfiguration,
};
use customid_worker::service::Renderer;
use customid_worker::storage::{ConfigStorage, RedisStorage, SequenceStorage, Storage};

async fn connect(url: String) -> RedisStorage {
    let config = RedisStorageConfig {
        url,
        key_prefix: "customid-test:".to_string(),
        ..Default::default()
    };
    let storage = RedisStorage::new(&config).expect("failed to create redis pool");

    // The container accepts connections shortly after the port is mapped.
    for _ in 0..50 {
        if storage.health_check().await.is_ok() {
            return storage;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("redis did not become ready");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_sequence_and_configuration() {
    let redis = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379.tcp())
        .start()
        .await
        .expect("failed to start redis container");
    let port = redis
        .get_host_port_ipv4(6379.tcp())
        .await
        .expect("failed to resolve redis host port");

    let storage = Arc::new(connect(format!("redis://127.0.0.1:{port}")).await);
    let inventory = InventoryId::parse("books").unwrap();

    assert!(storage.get_state(&inventory).await.unwrap().is_none());
    assert_eq!(storage.peek(&inventory, 1).await.unwrap(), 1);
    assert_eq!(storage.allocate(&inventory, 1).await.unwrap(), 1);
    assert_eq!(storage.allocate(&inventory, 1).await.unwrap(), 2);
    assert_eq!(storage.peek(&inventory, 1).await.unwrap(), 3);

    let state = storage.get_state(&inventory).await.unwrap().unwrap();
    assert_eq!(state.next_value, 3);

    let config = IdConfiguration::empty()
        .with_element(ElementSpec::fixed_text("SKU-"))
        .with_element(ElementSpec::new(ElementType::Sequence, "D4"));
    let stored = StoredConfiguration::new(inventory.clone(), config.clone());
    storage.save_configuration(&stored).await.unwrap();
    assert_eq!(
        storage.get_configuration(&inventory).await.unwrap(),
        Some(stored)
    );

    let sequences: Arc<dyn SequenceStorage> = storage.clone();
    let renderer = Renderer::new(sequences, 1);
    assert_eq!(
        renderer.render_committed(&inventory, &config).await.unwrap(),
        "SKU-0003"
    );

    assert!(storage.delete_configuration(&inventory).await.unwrap());
    assert!(storage.get_configuration(&inventory).await.unwrap().is_none());
    assert_eq!(storage.peek(&inventory, 1).await.unwrap(), 4);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_concurrent_allocations() {
    let redis = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379.tcp())
        .start()
        .await
        .expect("failed to start redis container");
    let port = redis
        .get_host_port_ipv4(6379.tcp())
        .await
        .expect("failed to resolve redis host port");

    let storage = Arc::new(connect(format!("redis://127.0.0.1:{port}")).await);
    let inventory = InventoryId::parse("burst").unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let storage = Arc::clone(&storage);
        let inventory = inventory.clone();
        handles.push(tokio::spawn(async move {
            storage.allocate(&inventory, 1).await.unwrap()
        }));
    }

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap());
    }
    values.sort_unstable();
    assert_eq!(values, (1..=32).collect::<Vec<u64>>());
}
