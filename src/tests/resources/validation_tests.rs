use crate::{
    CategoryPayload, CollectorConfig, Finding, Node, NodeInterface, NodeLiveness,
    NodeTelemetryCache, ValidationRule,
};
use std::collections::HashMap;

struct LivenessStateRule;

impl ValidationRule for LivenessStateRule {
    fn name(&self) -> &'static str {
        "liveness-state"
    }

    fn validate(&self, nodes: &[Node]) -> Vec<Finding> {
        nodes
            .iter()
            .filter(|node| node.liveness.as_ref().is_some_and(|l| l.state != 1))
            .map(|node| {
                Finding::new(
                    self.name(),
                    vec![node.name.clone()],
                    "agent is not operational".to_string(),
                )
            })
            .collect()
    }
}

fn loopback(name: &str, addresses: &[&str]) -> HashMap<u32, NodeInterface> {
    HashMap::from([(
        1,
        NodeInterface {
            vpp_internal_name: name.to_string(),
            ip_addresses: addresses.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        },
    )])
}

async fn add_with_loopback(cache: &NodeTelemetryCache, id: u32, name: &str, addresses: &[&str]) {
    let loopback_name = cache.config().loopback_interface.clone();
    cache.add_node(id, name, "", "192.168.56.10").await.unwrap();
    cache
        .store
        .set_interfaces(name, loopback(&loopback_name, addresses))
        .await
        .unwrap();
    cache.store.populate_node_maps(name).await.unwrap();
}

#[tokio::test]
async fn test_cluster_findings_land_in_report() {
    let cache = NodeTelemetryCache::builder().build().unwrap();
    add_with_loopback(&cache, 1, "k8s-master", &["192.168.30.1/24"]).await;
    add_with_loopback(&cache, 2, "k8s-worker1", &["192.168.30.1/24"]).await;
    add_with_loopback(&cache, 3, "k8s-worker2", &[]).await;
    add_with_loopback(&cache, 4, "k8s-worker3", &["192.168.30.4/24"]).await;

    let findings = cache.validate().await;
    assert_eq!(findings.len(), 2);

    let missing = findings
        .iter()
        .find(|f| f.message.contains("no IP address"))
        .unwrap();
    assert_eq!(missing.nodes, vec!["k8s-worker2"]);

    let duplicate = findings
        .iter()
        .find(|f| f.message.contains("duplicate"))
        .unwrap();
    assert_eq!(duplicate.nodes, vec!["k8s-master", "k8s-worker1"]);

    let report = cache.report().await;
    assert_eq!(report.len(), 2);
    assert!(report.iter().all(|entry| entry.starts_with("[loopback-address]")));
}

#[tokio::test]
async fn test_clean_cluster_has_no_findings() {
    let cache = NodeTelemetryCache::builder().build().unwrap();
    add_with_loopback(&cache, 1, "k8s-master", &["192.168.30.1/24"]).await;
    add_with_loopback(&cache, 2, "k8s-worker1", &["192.168.30.2/24"]).await;

    assert!(cache.validate().await.is_empty());
    assert!(cache.validate().await.is_empty());
    assert!(cache.report().await.is_empty());
}

#[tokio::test]
async fn test_configured_loopback_name_is_used() {
    let config = CollectorConfig {
        loopback_interface: "loop1".to_string(),
        ..Default::default()
    };
    let cache = NodeTelemetryCache::builder().config(config).build().unwrap();
    add_with_loopback(&cache, 1, "k8s-master", &["192.168.30.1/24"]).await;

    // An interface called loop0 is not the loopback under this configuration.
    cache
        .store
        .set_interfaces("k8s-master", loopback("loop0", &["192.168.30.1/24"]))
        .await
        .unwrap();
    cache.store.populate_node_maps("k8s-master").await.unwrap();

    let findings = cache.validate().await;
    assert_eq!(findings.len(), 1);
    assert!(findings[0].message.contains("loopback interface loop1 not found"));
}

#[tokio::test]
async fn test_custom_rule_runs_with_builtin_rules() {
    let cache = NodeTelemetryCache::builder()
        .rule(LivenessStateRule)
        .build()
        .unwrap();
    add_with_loopback(&cache, 1, "k8s-master", &["192.168.30.1/24"]).await;
    add_with_loopback(&cache, 2, "k8s-worker1", &["192.168.30.2/24"]).await;
    cache
        .store
        .set_liveness(
            "k8s-worker1",
            NodeLiveness {
                state: 3,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let findings = cache.validate().await;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, "liveness-state");
    assert_eq!(findings[0].nodes, vec!["k8s-worker1"]);
    assert!(cache.report().await[0].starts_with("[liveness-state]"));
}

#[tokio::test]
async fn test_payloads_applied_through_cache_feed_loopback_check() {
    let cache = NodeTelemetryCache::builder().build().unwrap();
    cache.add_node(1, "k8s-master", "", "192.168.56.101").await.unwrap();
    cache.add_node(2, "k8s-worker1", "", "192.168.56.102").await.unwrap();

    for name in ["k8s-master", "k8s-worker1"] {
        cache
            .apply_payload(
                name,
                CategoryPayload::Interfaces(loopback("loop0", &["192.168.30.9/24"])),
            )
            .await
            .unwrap();
    }

    assert_eq!(cache.validate_loop_if_addresses().await, 1);
    assert!(
        cache
            .apply_payload("absent", CategoryPayload::IpArps(Vec::new()))
            .await
            .is_err()
    );
    assert_eq!(cache.list_all_nodes().await.len(), 2);
}
