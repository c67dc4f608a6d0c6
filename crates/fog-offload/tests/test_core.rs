use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use threadpool::ThreadPool;

use fog_offload::core::clock::SimClock;
use fog_offload::core::common::{CompletionRecord, ResourceBundle};
use fog_offload::core::config::{expand_host_names, parse_config_value, parse_options, OffloadConfig};
use fog_offload::core::execution::{ExecutionSimulator, OverheadModel};
use fog_offload::core::geo::{self, GeoPoint};
use fog_offload::core::node::{NodeSpec, NodeTier, ResourceNode};
use fog_offload::core::power_model::{LinearPowerModel, NodePowerModel};
use fog_offload::core::registry::NodeRegistry;
use fog_offload::core::task::{derived_storage, Task, TaskCategory};

// 10 ms of wall time per simulated second keeps the tests fast.
const TIME_SCALE: f64 = 0.01;
const RECV_TIMEOUT: Duration = Duration::from_secs(10);

fn make_node(name: &str, tier: NodeTier, capacity: ResourceBundle, location: GeoPoint, clock: SimClock) -> Arc<ResourceNode> {
    ResourceNode::new(
        NodeSpec {
            name: name.to_string(),
            tier,
            capacity,
            location,
        },
        ExecutionSimulator::new(OverheadModel::Expected),
        clock,
        ThreadPool::new(16),
    )
}

fn make_task(id: u64, size: u64, amount: u64, location: GeoPoint) -> Task {
    Task {
        id,
        external_id: None,
        name: format!("task-{}", id),
        arrival_time: 0.,
        size,
        required: ResourceBundle::new(amount, amount, amount, amount),
        category: TaskCategory::Standard,
        location,
    }
}

fn recv_record(rx: &Receiver<CompletionRecord>) -> CompletionRecord {
    rx.recv_timeout(RECV_TIMEOUT).expect("no completion report arrived")
}

#[test]
fn test_distance_symmetry_and_zero() {
    let vienna = GeoPoint::new(48.21, 16.37);
    let frankfurt = GeoPoint::new(50.11, 8.68);

    assert_eq!(geo::distance(&vienna, &vienna), 0.);
    assert_eq!(geo::distance(&vienna, &frankfurt), geo::distance(&frankfurt, &vienna));
    // Vienna to Frankfurt is roughly 600 km.
    let d = geo::distance(&vienna, &frankfurt);
    assert!(d > 500. && d < 700., "unexpected distance {}", d);
}

#[test]
fn test_distance_monotone_in_angular_separation() {
    let origin = GeoPoint::new(0., 0.);
    let mut prev = 0.;
    for degrees in 1..90 {
        let d = geo::distance(&origin, &GeoPoint::new(0., degrees as f64));
        assert!(d > prev, "distance must grow with angular separation");
        prev = d;
    }
}

#[test]
fn test_transmission_delay_monotone() {
    let near = geo::transmission_delay(10., 100, 1000);
    let far = geo::transmission_delay(5000., 100, 1000);
    assert!(far > near);

    let small = geo::transmission_delay(100., 10, 1000);
    let large = geo::transmission_delay(100., 10_000, 1000);
    assert!(large > small);
}

#[test]
fn test_derived_storage() {
    assert_eq!(derived_storage(100), 120);
    assert_eq!(derived_storage(0), 0);
}

#[test]
// A 1000-capacity node admits a 100-requirement task immediately with zero queue time.
fn test_immediate_admission() {
    let clock = SimClock::new(TIME_SCALE);
    let node = make_node(
        "edge1",
        NodeTier::Edge,
        ResourceBundle::new(1000, 1000, 1000, 1000),
        GeoPoint::new(0., 0.),
        clock,
    );
    let rx = node.subscribe();

    let (accepted, processing_time) = node.admit(make_task(1, 100, 100, GeoPoint::new(0., 0.)));
    assert!(accepted);
    assert!(processing_time > 0.);

    let status = node.status();
    assert_eq!(status.active_tasks, 1);
    assert_eq!(status.queue_len, 0);
    assert_eq!(status.used, ResourceBundle::new(100, 100, 100, 100));
    assert_eq!(status.available, ResourceBundle::new(900, 900, 900, 900));

    let record = recv_record(&rx);
    assert_eq!(record.task_id, 1);
    assert_eq!(record.queue_time, 0.);
    assert_eq!(record.node, "edge1");

    let status = node.status();
    assert_eq!(status.active_tasks, 0);
    assert_eq!(status.used, ResourceBundle::default());
}

#[test]
// With expected overheads, processing time is (size / mips) * 1.925.
fn test_expected_processing_time() {
    let clock = SimClock::new(TIME_SCALE);
    let node = make_node(
        "edge1",
        NodeTier::Edge,
        ResourceBundle::new(1000, 1000, 1000, 1000),
        GeoPoint::new(0., 0.),
        clock,
    );
    let timing = node.expected_timing(&make_task(1, 100, 100, GeoPoint::new(0., 0.)));
    assert!((timing.processing_time - 0.1925).abs() < 1e-9);
    assert!(timing.transmission_time > 0.);
}

#[test]
// A full node queues the second task and drains it after the first one releases;
// the recorded queue time roughly matches the first task's processing time.
fn test_queuing_and_drain() {
    let clock = SimClock::new(TIME_SCALE);
    let node = make_node(
        "edge1",
        NodeTier::Edge,
        ResourceBundle::new(100, 100, 100, 100),
        GeoPoint::new(0., 0.),
        clock,
    );
    let rx = node.subscribe();

    let (accepted, t1_processing) = node.admit(make_task(1, 100, 100, GeoPoint::new(0., 0.)));
    assert!(accepted);
    let (accepted, estimate) = node.admit(make_task(2, 100, 100, GeoPoint::new(0., 0.)));
    assert!(!accepted);
    assert_eq!(estimate, 0.);
    assert_eq!(node.status().queue_len, 1);

    let first = recv_record(&rx);
    assert_eq!(first.task_id, 1);
    let second = recv_record(&rx);
    assert_eq!(second.task_id, 2);
    assert!(second.queue_time > 0.);
    // Scheduling overhead only adds to the wait, never shortens it.
    assert!(second.queue_time >= t1_processing * 0.9);
    assert!(second.queue_time <= t1_processing * 3.);
}

#[test]
// Two queued tasks become admissible at the same release and drain in FIFO order.
fn test_fifo_drain() {
    let clock = SimClock::new(TIME_SCALE);
    let node = make_node(
        "edge1",
        NodeTier::Edge,
        ResourceBundle::new(100, 100, 100, 100),
        GeoPoint::new(0., 0.),
        clock,
    );
    let rx = node.subscribe();

    let (accepted, _) = node.admit(make_task(1, 100, 100, GeoPoint::new(0., 0.)));
    assert!(accepted);
    node.enqueue(make_task(2, 100, 100, GeoPoint::new(0., 0.)));
    node.enqueue(make_task(3, 100, 100, GeoPoint::new(0., 0.)));
    assert_eq!(node.status().queue_len, 2);

    let order: Vec<u64> = (0..3).map(|_| recv_record(&rx).task_id).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[test]
// Releasing a task that was never admitted is a contract violation which must
// not corrupt node state.
fn test_release_of_unknown_task() {
    let clock = SimClock::new(TIME_SCALE);
    let node = make_node(
        "edge1",
        NodeTier::Edge,
        ResourceBundle::new(100, 100, 100, 100),
        GeoPoint::new(0., 0.),
        clock,
    );
    node.release(42);
    let status = node.status();
    assert_eq!(status.active_tasks, 0);
    assert_eq!(status.available, ResourceBundle::new(100, 100, 100, 100));
}

#[test]
// Concurrent admissions never overcommit any resource dimension.
fn test_capacity_invariant_under_concurrency() {
    let clock = SimClock::new(TIME_SCALE);
    let node = make_node(
        "edge1",
        NodeTier::Edge,
        ResourceBundle::new(300, 300, 300, 300),
        GeoPoint::new(0., 0.),
        clock,
    );
    let rx = node.subscribe();

    let mut handles = Vec::new();
    for i in 0..10 {
        let node = Arc::clone(&node);
        handles.push(std::thread::spawn(move || {
            node.admit(make_task(i + 1, 100, 100, GeoPoint::new(0., 0.)));
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for _ in 0..10 {
        let status = node.status();
        assert!(status.used.fits_within(&status.capacity));
        assert!(status.active_tasks <= 3);
        std::thread::sleep(Duration::from_millis(1));
    }

    let mut seen = Vec::new();
    for _ in 0..10 {
        seen.push(recv_record(&rx).task_id);
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=10).collect::<Vec<u64>>());
}

#[test]
// Sampled processing times stay within the documented overhead and jitter bands.
fn test_sampled_overhead_bounds() {
    let simulator = ExecutionSimulator::new(OverheadModel::Sampled);
    let spec = NodeSpec {
        name: "edge1".to_string(),
        tier: NodeTier::Edge,
        capacity: ResourceBundle::new(1000, 1000, 1000, 1000),
        location: GeoPoint::new(0., 0.),
    };
    let task = make_task(1, 1000, 100, GeoPoint::new(0., 0.));
    let base = 1.0;

    for _ in 0..200 {
        let timing = simulator.compute_timing(&task, &spec);
        assert!(timing.processing_time >= base * 0.85);
        assert!(timing.processing_time <= base * 1.925 * 1.15);
        assert!(timing.transmission_time > 0.);
    }
}

#[test]
fn test_linear_power_model() {
    let model = LinearPowerModel::new(10., 100.);
    assert_eq!(model.power(0.), 10.);
    assert_eq!(model.power(1.), 100.);
    assert!(model.power(0.5) > model.power(0.25));
    // Loads outside [0, 1] are clamped.
    assert_eq!(model.power(2.), 100.);
}

#[test]
fn test_power_estimate_scales_with_time() {
    let simulator = ExecutionSimulator::new(OverheadModel::Expected);
    let short = fog_offload::core::execution::TaskTiming {
        processing_time: 1.,
        transmission_time: 0.1,
    };
    let long = fog_offload::core::execution::TaskTiming {
        processing_time: 10.,
        transmission_time: 0.1,
    };
    let a = simulator.power_estimate(&short, 0., NodeTier::Edge, 0.5);
    let b = simulator.power_estimate(&long, 0., NodeTier::Edge, 0.5);
    assert!(a.average_watts > 0.);
    assert!(b.energy_wh > a.energy_wh);
}

#[test]
fn test_config_defaults_and_host_expansion() {
    let config = OffloadConfig::from_str(
        r#"
time_scale: 0.01
edge_hosts:
  - name_prefix: edge
    count: 3
    mips: 2000
    memory: 4000
    bandwidth: 1000
    storage: 16000
    latitude: 48.2
    longitude: 16.4
cloud_hosts:
  - name: dc1
    mips: 40000
    memory: 128000
    bandwidth: 10000
    storage: 1000000
    latitude: 50.1
    longitude: 8.7
"#,
    );
    assert_eq!(config.policy, "FCFS");
    assert_eq!(config.queue_capacity, 32);
    assert_eq!(config.completion_timeout, 60.);
    assert_eq!(expand_host_names(&config.edge_hosts[0]), vec!["edge1", "edge2", "edge3"]);

    let clock = SimClock::new(config.time_scale);
    let pool = ThreadPool::new(4);
    let simulator = ExecutionSimulator::new(OverheadModel::Expected);
    let registry = NodeRegistry::from_config(&config, &simulator, clock, &pool);
    assert_eq!(registry.node_count(), 4);
    assert!(registry.lookup("edge2").is_some());
    assert_eq!(registry.lookup("dc1").unwrap().tier(), NodeTier::Cloud);
}

#[test]
fn test_config_value_parsing() {
    let (name, options) = parse_config_value("CooperativeFCFS[queue_capacity=16]");
    assert_eq!(name, "CooperativeFCFS");
    let options = parse_options(&options.unwrap());
    assert_eq!(options.get("queue_capacity").unwrap(), "16");

    let (name, options) = parse_config_value("FCFS");
    assert_eq!(name, "FCFS");
    assert!(options.is_none());
}

#[test]
fn test_registry_distance_order_and_tie_break() {
    let clock = SimClock::new(TIME_SCALE);
    let registry = NodeRegistry::new();
    let cap = ResourceBundle::new(100, 100, 100, 100);
    registry.add_node(make_node("far", NodeTier::Edge, cap, GeoPoint::new(20., 20.), clock));
    registry.add_node(make_node("b-near", NodeTier::Edge, cap, GeoPoint::new(1., 1.), clock));
    registry.add_node(make_node("a-near", NodeTier::Edge, cap, GeoPoint::new(1., 1.), clock));

    let ordered: Vec<String> = registry
        .edge_by_distance(&GeoPoint::new(0., 0.))
        .iter()
        .map(|node| node.name().to_string())
        .collect();
    assert_eq!(ordered, vec!["a-near", "b-near", "far"]);
}
