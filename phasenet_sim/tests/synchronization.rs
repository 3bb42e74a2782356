//! End-to-end runs of the oscillator models on small networks.

use std::sync::Arc;

use approx::assert_relative_eq;
use phasenet_core::{generators, Colorizer, Network};
use phasenet_engine::{ContinuousEngine, DiscreteEngine, EngineConfig, RunState};
use phasenet_sim::{
    CouplingConfig, DegreeWeighting, EpidemicGossip, GossipConfig, Kuramoto, KuramotoConfig, ORDER_COLUMN,
};

fn complete(n: usize, seed: u64) -> Arc<Network> {
    let net = Network::shared(seed);
    net.mutate(|g| generators::complete(g, n)).unwrap().unwrap();
    net
}

#[test]
fn test_strongly_coupled_complete_graph_synchronizes() {
    let coupling = CouplingConfig::default()
        .with_strength(2.0)
        .with_weighting(DegreeWeighting::Degree);
    let model = Kuramoto::new(complete(20, 3), KuramotoConfig::default().with_coupling(coupling)).unwrap();
    let engine = ContinuousEngine::new(model, EngineConfig::default().with_dt(0.02).with_max_steps(1000));
    
    assert_eq!(engine.run().unwrap(), RunState::Stopped);
    let summary = engine.collect();
    assert_eq!(summary.oscillators, 20);
    assert!(summary.order > 0.9, "order {}", summary.order);
    
    let series = engine.time_series();
    assert_eq!(series.len(), 1001);
    assert!(series.last(ORDER_COLUMN).unwrap() > series.get(0.0, ORDER_COLUMN).unwrap());
}

#[test]
fn test_uncoupled_oscillators_keep_natural_frequencies() {
    let net = Network::shared(8);
    let ids = net.mutate(|g| generators::empty(g, 3)).unwrap();
    let mut model = Kuramoto::new(net, KuramotoConfig::default()).unwrap();
    for (i, &v) in ids.iter().enumerate() {
        model.set_phase(v, 0.0);
        model.set_natural_frequency(v, i as f64);
    }
    let engine = ContinuousEngine::new(model, EngineConfig::default().with_dt(0.1).with_max_steps(10));
    engine.run().unwrap();
    
    engine.with_dynamics(|m| {
        for (i, &v) in ids.iter().enumerate() {
            assert_relative_eq!(m.phase(v).unwrap(), i as f64, epsilon = 1e-9);
        }
    });
}

#[test]
fn test_gated_coupling_with_compensation_still_runs() {
    let coupling = CouplingConfig::default()
        .with_probability(0.3)
        .with_compensation(true)
        .with_weighting(DegreeWeighting::DoubleDegree);
    let model = Kuramoto::new(complete(10, 5), KuramotoConfig::default().with_coupling(coupling)).unwrap();
    let engine = ContinuousEngine::new(model, EngineConfig::default().with_max_steps(200));
    assert_eq!(engine.run().unwrap(), RunState::Stopped);
    let order = engine.collect().order;
    assert!((0.0..=1.0).contains(&order));
}

#[test]
fn test_gossip_colorizer_reports_signal() {
    let net = complete(6, 9);
    let ids = net.vertex_ids();
    let model = EpidemicGossip::new(net, GossipConfig::default().with_periods(20.0, 2.0)).unwrap();
    let engine = DiscreteEngine::new(model, EngineConfig::default().with_max_steps(30));
    assert_eq!(engine.run().unwrap(), RunState::Stopped);
    
    engine.with_dynamics(|m| {
        for &v in &ids {
            let signal = m.vertex_value(v).unwrap();
            assert!((-1.0..=1.0).contains(&signal));
            assert_relative_eq!(signal, m.phase(v).unwrap().sin(), epsilon = 1e-12);
        }
    });
}

#[test]
fn test_stop_from_another_thread_ends_gossip() {
    let model = EpidemicGossip::new(complete(8, 1), GossipConfig::default()).unwrap();
    let engine = DiscreteEngine::new(model, EngineConfig::default());
    let stop = engine.stop_handle();
    let handle = engine.run_in_background().unwrap();
    
    while engine.step_count() < 20 {
        std::thread::yield_now();
    }
    assert!(stop.stop());
    assert_eq!(handle.join().unwrap(), RunState::Stopped);
    assert_eq!(stop.state(), RunState::Stopped);
    assert!(!engine.stop());
}
