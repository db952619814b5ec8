use crate::{
    AgentEndpoint, AgentPort, Category, CollectorConfig, NodeInfo, NodeLiveness,
    NodeTelemetryCache, ResyncEvent, TelemetryError,
};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn config_for(server: &MockServer, categories: &[Category]) -> CollectorConfig {
    let mut config = CollectorConfig {
        collection_period: Duration::from_secs(3600),
        fetch_timeout: Duration::from_secs(2),
        enabled_categories: categories.to_vec(),
        ..Default::default()
    };
    for category in Category::ALL {
        config.endpoints.insert(
            category,
            AgentEndpoint {
                port: AgentPort::new(server.address().port()).unwrap(),
                path: category.default_path().to_string(),
                timeout: None,
            },
        );
    }
    config
}

fn cache_for(server: &MockServer, categories: &[Category]) -> NodeTelemetryCache {
    NodeTelemetryCache::builder()
        .config(config_for(server, categories))
        .build()
        .unwrap()
}

async fn mount_full_agent(server: &MockServer, loopback: &str) {
    Mock::given(method("GET"))
        .and(path("/liveness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "build_version": "v3.1.0",
            "build_date": "2018-09-21T12:00:00Z",
            "state": 1,
            "start_time": 1537531200,
            "last_change": 1537531210,
            "last_update": 1537531260,
            "commit_hash": "d6e4c4f"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "0": { "vpp_internal_name": "local0", "name": "local0" },
            "1": {
                "vpp_internal_name": "loop0",
                "name": "vxlanBVI",
                "enabled": true,
                "phys_address": "1a:2b:3c:4d:5e:01",
                "mtu": 1500,
                "ip_addresses": [loopback]
            },
            "2": {
                "vpp_internal_name": "vxlan_tunnel0",
                "name": "vxlan1",
                "if_type": 5,
                "enabled": true,
                "vxlan": {
                    "src_address": "192.168.16.1",
                    "dst_address": "192.168.16.2",
                    "vni": 10
                }
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bridgedomains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "1": {
                "name": "vxlanBD",
                "forward": true,
                "interfaces": [{ "sw_if_index": 1 }, { "sw_if_index": 2 }]
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/l2fibs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "1a:2b:3c:4d:5e:02": {
                "bridge_domain_idx": 1,
                "outgoing_interface_sw_if_idx": 2,
                "phys_address": "1a:2b:3c:4d:5e:02",
                "static_config": true,
                "bridged_virtual_interface": false
            }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/arps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "interface": 1,
                "ip_address": "192.168.30.2",
                "mac_address": "1a:2b:3c:4d:5e:02",
                "static": true
            }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cycle_commits_every_category_for_every_node() {
    let mock_server = MockServer::start().await;
    mount_full_agent(&mock_server, "192.168.30.1/24").await;

    let cache = cache_for(&mock_server, &Category::SUPPORTED);
    cache
        .add_node(1, "k8s-master", "10.0.0.1/24", "127.0.0.1")
        .await
        .unwrap();
    cache.start().await.unwrap();

    let report = cache.collect_now().await.unwrap();
    assert_eq!(report.expected, 5);
    assert_eq!(report.received, report.expected);
    assert_eq!(report.committed, 5);
    assert_eq!(report.failures, 0);
    assert!(report.findings.is_empty());

    let node = cache.get_node("k8s-master").await.unwrap();
    assert_eq!(node.liveness.as_ref().unwrap().commit_hash, "d6e4c4f");
    assert_eq!(node.interfaces.as_ref().unwrap().len(), 3);
    assert_eq!(node.bridge_domains.as_ref().unwrap()[&1].interfaces.len(), 2);
    assert_eq!(node.l2_fibs.as_ref().unwrap().len(), 1);
    assert_eq!(node.ip_arps.as_ref().unwrap().len(), 1);
    assert!(node.telemetry.is_none());

    assert_eq!(node.maps.interface_by_name.get("loop0"), Some(&1));
    assert_eq!(node.maps.bridge_domain_by_name.get("vxlanBD"), Some(&1));
    assert_eq!(
        node.maps.arp_by_ip.get("192.168.30.2").map(String::as_str),
        Some("1a:2b:3c:4d:5e:02")
    );
    assert_eq!(
        node.maps.fib_by_interface.get(&2),
        Some(&vec!["1a:2b:3c:4d:5e:02".to_string()])
    );

    cache.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_loopbacks_reported_after_cycle() {
    let mock_server = MockServer::start().await;
    mount_full_agent(&mock_server, "192.168.30.1/24").await;

    let cache = cache_for(&mock_server, &[Category::Interfaces]);
    cache
        .add_node(1, "k8s-master", "", "127.0.0.1")
        .await
        .unwrap();
    cache
        .add_node(2, "k8s-worker1", "", "127.0.0.1")
        .await
        .unwrap();
    cache.start().await.unwrap();

    let report = cache.collect_now().await.unwrap();
    assert_eq!(report.expected, 2);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].nodes, vec!["k8s-master", "k8s-worker1"]);

    let log = cache.report().await;
    assert_eq!(log.len(), 1);
    assert!(log[0].contains("duplicate loopback address 192.168.30.1"));

    cache.shutdown().await;
}

#[tokio::test]
async fn test_one_failed_fetch_is_isolated() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();

    // Only the agent reached as "localhost" fails its liveness fetch.
    Mock::given(method("GET"))
        .and(path("/liveness"))
        .and(header("host", format!("localhost:{}", port).as_str()))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_full_agent(&mock_server, "192.168.30.1/24").await;

    let cache = cache_for(&mock_server, &[Category::Liveness, Category::IpArps]);
    cache.add_node(1, "node-a", "", "localhost").await.unwrap();
    cache.add_node(2, "node-b", "", "127.0.0.1").await.unwrap();
    cache
        .store
        .set_liveness(
            "node-a",
            NodeLiveness {
                build_version: "previous".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    cache.start().await.unwrap();

    let report = cache.collect_now().await.unwrap();
    assert_eq!(report.received, 4);
    assert_eq!(report.failures, 1);
    assert_eq!(report.committed, 3);

    let node_a = cache.get_node("node-a").await.unwrap();
    assert_eq!(node_a.liveness.unwrap().build_version, "previous");
    assert!(node_a.ip_arps.is_some());
    let node_b = cache.get_node("node-b").await.unwrap();
    assert_eq!(node_b.liveness.unwrap().build_version, "v3.1.0");

    let failures: Vec<String> = cache
        .report()
        .await
        .into_iter()
        .filter(|entry| entry.contains("category error"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("node node-a category error"));

    cache.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_node_still_completes_cycle() {
    let mock_server = MockServer::start().await;
    mount_full_agent(&mock_server, "192.168.30.1/24").await;

    let mut config = config_for(&mock_server, &[Category::Liveness, Category::Interfaces]);
    config.fetch_timeout = Duration::from_millis(500);
    let cache = NodeTelemetryCache::builder().config(config).build().unwrap();
    cache.add_node(1, "alive", "", "127.0.0.1").await.unwrap();
    // TEST-NET-1, never routed.
    cache.add_node(2, "gone", "", "192.0.2.1").await.unwrap();
    cache.start().await.unwrap();

    let report = tokio::time::timeout(Duration::from_secs(10), cache.collect_now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.received, 4);
    assert_eq!(report.failures, 2);
    assert!(cache.get_node("gone").await.unwrap().liveness.is_none());
    assert!(cache.get_node("alive").await.unwrap().liveness.is_some());

    // The unreachable node also has no loopback on record.
    assert!(
        report
            .findings
            .iter()
            .any(|f| f.nodes == vec!["gone"] && f.message.contains("not found"))
    );

    cache.shutdown().await;
}

#[tokio::test]
async fn test_lifecycle_errors() {
    let mock_server = MockServer::start().await;
    let cache = cache_for(&mock_server, &[Category::Liveness]);

    assert!(matches!(
        cache.collect_now().await,
        Err(TelemetryError::Coordinator(_))
    ));
    assert!(!cache.trigger().await);

    cache.start().await.unwrap();
    assert!(cache.is_running().await);
    assert!(matches!(
        cache.start().await,
        Err(TelemetryError::Coordinator(_))
    ));

    cache.shutdown().await;
    assert!(!cache.is_running().await);

    // Restart is allowed and numbering starts over.
    cache.start().await.unwrap();
    assert_eq!(cache.collect_now().await.unwrap().cycle, 1);
    cache.shutdown().await;
}

#[tokio::test]
async fn test_resync_triggers_collection() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/liveness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "build_version": "v3.1.0"
        })))
        .expect(1..)
        .mount(&mock_server)
        .await;

    let cache = cache_for(&mock_server, &[Category::Liveness]);
    cache.start().await.unwrap();

    cache
        .resync(ResyncEvent {
            nodes: vec![NodeInfo {
                id: 1,
                name: "k8s-master".to_string(),
                ip_address: "10.0.0.1/24".to_string(),
                management_ip_address: "127.0.0.1".to_string(),
            }],
        })
        .await
        .unwrap();

    // Queued behind the resync-triggered cycle, so its data is already there.
    let report = cache.collect_now().await.unwrap();
    assert_eq!(report.cycle, 2);

    let node = cache.get_node("k8s-master").await.unwrap();
    assert_eq!(
        node.liveness,
        Some(NodeLiveness {
            build_version: "v3.1.0".to_string(),
            ..Default::default()
        })
    );

    cache.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resync_during_cycles_never_validates_partial_commit() {
    let mock_server = MockServer::start().await;
    mount_full_agent(&mock_server, "192.168.30.1/24").await;

    let cache = cache_for(&mock_server, &[Category::Interfaces]);
    let master = NodeInfo {
        id: 1,
        name: "k8s-master".to_string(),
        ip_address: "10.0.0.1/24".to_string(),
        management_ip_address: "127.0.0.1".to_string(),
    };
    cache
        .resync(ResyncEvent {
            nodes: vec![master.clone()],
        })
        .await
        .unwrap();
    cache.start().await.unwrap();

    for _ in 0..25 {
        let (report, resynced) = tokio::join!(
            cache.collect_now(),
            cache.resync(ResyncEvent {
                nodes: vec![master.clone()],
            })
        );
        resynced.unwrap();
        let report = report.unwrap();
        assert_eq!(report.failures, 0);
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }

    cache.shutdown().await;
    // Every validation ran over a record that held its committed interfaces.
    assert!(cache.report().await.is_empty(), "{:?}", cache.report().await);
}
