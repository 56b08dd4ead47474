use std::sync::Arc;
use std::time::Duration;

use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use vox_store::{IndexableItem, ItemKind, ItemScope, QdrantOps, VectorIndex};

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn setup() -> (VectorIndex, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    let url = format!("http://127.0.0.1:{grpc_port}");
    let ops = QdrantOps::new(&url, Duration::from_secs(10)).unwrap();
    let index = VectorIndex::new(Arc::new(ops), "vox_items_test", 3);
    index.ensure_ready().await.unwrap();
    (index, container)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn ensure_ready_is_idempotent() {
    let (index, _container) = setup().await;
    index.ensure_ready().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn substring_boost_and_project_purge() {
    let (index, _container) = setup().await;

    let items = vec![
        IndexableItem::new(ItemKind::Markdown, "closest, no keyword"),
        IndexableItem::new(ItemKind::Markdown, "has needle_term inside"),
        IndexableItem::new(ItemKind::Symbol, "Symbol: needle_term")
            .with_file_path("src/lib.rs")
            .with_meta("start_line", 7),
    ];
    let vectors = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
    ];
    index.upsert_items("proj", &items, vectors).await.unwrap();
    index
        .upsert_items(
            "other",
            &[IndexableItem::new(ItemKind::Rule, "needle_term elsewhere")],
            vec![vec![1.0, 0.0, 0.0]],
        )
        .await
        .unwrap();

    let hits = index
        .search("needle_term", &[1.0, 0.0, 0.0], Some("proj"), ItemScope::All, 10)
        .await;
    let order: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "Symbol: needle_term",
            "has needle_term inside",
            "closest, no keyword"
        ]
    );
    assert_eq!(hits[0].source, "src/lib.rs:7");

    index.delete_project_data("proj").await.unwrap();
    assert_eq!(index.count("proj", None).await.unwrap(), 0);
    assert_eq!(index.count("other", None).await.unwrap(), 1);
}
