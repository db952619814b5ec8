use crate::{
    NodeInterface, NodeLiveness, TelemetryError, core::infrastructure::node_store::NodeStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

const NODES: u32 = 8;
const ROUNDS: u64 = 50;

fn liveness_for(round: u64) -> NodeLiveness {
    NodeLiveness {
        build_version: format!("v{}", round),
        build_date: format!("v{}", round),
        last_update: round,
        ..Default::default()
    }
}

async fn populated_store() -> Arc<NodeStore> {
    let store = Arc::new(NodeStore::new());
    for id in 0..NODES {
        store
            .add_node(id, &format!("node-{}", id), "", "192.168.1.10")
            .await
            .unwrap();
    }
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_never_expose_partial_records() {
    let store = populated_store().await;
    let mut tasks = JoinSet::new();

    for id in 0..NODES {
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            let name = format!("node-{}", id);
            for round in 1..=ROUNDS {
                store.set_liveness(&name, liveness_for(round)).await.unwrap();
            }
        });
    }

    for reader in 0..4 {
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            for _ in 0..100 {
                let nodes = if reader % 2 == 0 {
                    store.get_all_nodes().await
                } else {
                    vec![store.get_node("node-0").await.unwrap()]
                };
                for node in nodes {
                    if let Some(liveness) = node.liveness {
                        assert_eq!(liveness.build_version, liveness.build_date);
                        assert_eq!(
                            liveness.build_version,
                            format!("v{}", liveness.last_update)
                        );
                    }
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    for node in store.get_all_nodes().await {
        assert_eq!(node.liveness.unwrap().last_update, ROUNDS);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_map_rebuilds_match_payloads() {
    let store = populated_store().await;
    let mut tasks = JoinSet::new();

    for id in 0..NODES {
        let store = Arc::clone(&store);
        tasks.spawn(async move {
            let name = format!("node-{}", id);
            for round in 0..20u32 {
                let interfaces = HashMap::from([(
                    round,
                    NodeInterface {
                        vpp_internal_name: "loop0".to_string(),
                        ..Default::default()
                    },
                )]);
                store.set_interfaces(&name, interfaces).await.unwrap();
                store.populate_node_maps(&name).await.unwrap();
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    for node in store.get_all_nodes().await {
        assert_eq!(node.maps.interface_by_name.get("loop0"), Some(&19));
    }
}

#[tokio::test]
async fn test_writes_race_with_deletion() {
    let store = populated_store().await;

    let deleter = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.delete_nodes(&["node-3"]).await })
    };
    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.set_liveness("node-3", liveness_for(1)).await })
    };

    deleter.await.unwrap();
    let written = writer.await.unwrap();

    // Either the write landed first and was then deleted, or it found nothing.
    assert!(matches!(written, Ok(()) | Err(TelemetryError::NotFound(_))));
    assert!(store.get_node("node-3").await.is_err());
    assert_eq!(store.node_count().await, NODES as usize - 1);
}
