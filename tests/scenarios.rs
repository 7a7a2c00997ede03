//! End-to-end planning and reoptimization scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use u_logistics::config::{EngineConfig, SearchConfig};
use u_logistics::engine::Engine;
use u_logistics::error::ValidationIssue;
use u_logistics::local_search::{Budget, CancelFlag};
use u_logistics::models::{
    DemandForecast, Depot, InventoryCosts, InventoryPosition, Location, Order, Plan, ProblemModel,
    QuantityMethod, TimeWindow, UnassignedReason, Vehicle,
};
use u_logistics::reoptimize::{DemandUpdate, Disruption, ReoptOutcome, RiskUpdate};
use u_logistics::subsolver::{ExactSolver, Formulation, SolveReport, SolveStatus};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tw(earliest: f64, latest: f64) -> TimeWindow {
    TimeWindow::new(earliest, latest).expect("valid window")
}

fn engine() -> Engine {
    Engine::new(
        EngineConfig::default().with_search(SearchConfig::default().with_max_iterations(800).with_seed(11)),
    )
}

fn route_sizes(plan: &Plan) -> Vec<usize> {
    let mut sizes: Vec<usize> = plan.routes().map(|r| r.len()).filter(|&n| n > 0).collect();
    sizes.sort_unstable();
    sizes
}

fn scenario_a() -> ProblemModel {
    ProblemModel::new(
        vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
        vec![Vehicle::new("v0", "d0", 10), Vehicle::new("v1", "d0", 10)],
        vec![
            Order::new("o1", Location::new(10.0, 0.0), 4, tw(0.0, 100.0)),
            Order::new("o2", Location::new(20.0, 0.0), 4, tw(100.0, 200.0)),
            Order::new("o3", Location::new(30.0, 0.0), 4, tw(200.0, 300.0)),
        ],
        vec![],
    )
    .expect("valid")
}

fn scenario_c() -> ProblemModel {
    let window = tw(0.0, 1000.0);
    ProblemModel::new(
        vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
        vec![
            Vehicle::new("v0", "d0", 10).with_fixed_cost(100.0),
            Vehicle::new("v1", "d0", 10).with_fixed_cost(100.0),
            Vehicle::new("v2", "d0", 10).with_fixed_cost(100.0),
        ],
        vec![
            Order::new("e1", Location::new(10.0, 0.0), 5, window),
            Order::new("e2", Location::new(20.0, 0.0), 5, window),
            Order::new("w1", Location::new(-10.0, 0.0), 5, window),
            Order::new("w2", Location::new(-20.0, 0.0), 5, window),
        ],
        vec![],
    )
    .expect("valid")
}

#[test]
fn capacity_forces_two_plus_one_split() {
    init_tracing();
    let plan = engine().plan(&scenario_a());
    assert_eq!(plan.num_unassigned(), 0);
    assert_eq!(route_sizes(&plan), vec![1, 2]);
    assert!(plan.is_feasible());
    for route in plan.routes() {
        assert!(route.load() <= 10);
        for stop in route.stops() {
            assert!(stop.lateness <= 1e-9);
        }
    }
}

#[test]
fn overflow_order_is_unassigned_with_reason() {
    let problem = ProblemModel::new(
        vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
        vec![Vehicle::new("v0", "d0", 5)],
        vec![
            Order::new("o1", Location::new(5.0, 0.0), 4, tw(0.0, 500.0)),
            Order::new("o2", Location::new(-5.0, 0.0), 4, tw(0.0, 500.0)),
        ],
        vec![],
    )
    .expect("valid");
    let plan = engine().plan(&problem);
    assert_eq!(plan.num_assigned(), 1);
    assert_eq!(plan.num_unassigned(), 1);
    assert_eq!(plan.unassigned()[0].reason, UnassignedReason::CapacityExceeded);
    assert!(plan.is_feasible());
}

#[test]
fn unavailable_vehicle_only_moves_its_orders() {
    init_tracing();
    let engine = engine();
    let problem = scenario_c();
    let prior = engine.plan(&problem);
    assert_eq!(prior.num_unassigned(), 0);

    let active: Vec<(String, Vec<String>)> = prior
        .routes()
        .filter(|r| !r.is_empty())
        .map(|r| {
            (
                r.vehicle_id().to_string(),
                r.order_ids().into_iter().map(str::to_string).collect(),
            )
        })
        .collect();
    assert_eq!(active.len(), 2, "fixed costs keep one vehicle spare");
    let (victim, victim_orders) = active[0].clone();
    let (survivor, survivor_orders) = active[1].clone();

    let disruption = Disruption {
        unavailable_vehicles: vec![victim.clone()],
        ..Disruption::default()
    };
    let result = engine.reoptimize(&problem, &prior, &disruption).expect("valid");

    let ReoptOutcome::Bounded { touched } = &result.outcome else {
        panic!("expected bounded repair, got {:?}", result.outcome);
    };
    assert!(touched.contains(&victim));
    assert!(!touched.contains(&survivor));

    let plan = &result.plan;
    assert_eq!(plan.num_unassigned(), 0);
    assert!(plan.is_feasible());
    let survivor_route = plan.route_for_vehicle(&survivor).expect("survivor keeps its route");
    assert_eq!(survivor_route.order_ids(), survivor_orders.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(plan.route_for_vehicle(&victim).map_or(true, |r| r.is_empty()));

    let mut moved: Vec<String> = plan
        .routes()
        .filter(|r| r.vehicle_id() != survivor)
        .flat_map(|r| r.order_ids().into_iter().map(str::to_string).collect::<Vec<_>>())
        .collect();
    moved.sort();
    let mut expected = victim_orders;
    expected.sort();
    assert_eq!(moved, expected);
}

#[test]
fn negative_demand_is_one_issue() {
    let err = ProblemModel::new(
        vec![Depot::new("d0", Location::new(0.0, 0.0), 100)],
        vec![Vehicle::new("v0", "d0", 10)],
        vec![Order::new("o1", Location::new(1.0, 1.0), -3, tw(0.0, 10.0))],
        vec![],
    )
    .expect_err("negative demand");
    assert_eq!(err.len(), 1);
    assert!(matches!(
        &err.issues()[0],
        ValidationIssue::NegativeValue { field: "demand", .. }
    ));
}

#[test]
fn replanning_unchanged_problem_is_deterministic() {
    let problem = scenario_c();
    assert_eq!(engine().plan(&problem), engine().plan(&problem));

    let parallel = Engine::new(
        EngineConfig::default().with_search(
            SearchConfig::default()
                .with_max_iterations(800)
                .with_workers(3)
                .with_rounds(2),
        ),
    );
    assert_eq!(parallel.plan(&problem), parallel.plan(&problem));
}

#[test]
fn empty_disruption_returns_prior_plan() {
    let engine = engine();
    let problem = scenario_a();
    let prior = engine.plan(&problem);
    let result = engine.reoptimize(&problem, &prior, &Disruption::default()).expect("valid");
    assert_eq!(result.outcome, ReoptOutcome::Unchanged);
    assert_eq!(result.plan, prior);
}

#[test]
fn risk_update_keeps_assignment() {
    let engine = engine();
    let problem = scenario_c();
    let prior = engine.plan(&problem);
    let disruption = Disruption {
        risk_updates: vec![RiskUpdate {
            order_id: "e1".into(),
            risk_score: 0.9,
        }],
        ..Disruption::default()
    };
    let result = engine.reoptimize(&problem, &prior, &disruption).expect("valid");
    assert!(matches!(result.outcome, ReoptOutcome::Bounded { .. }));
    assert_eq!(result.plan.num_assigned(), 4);
    assert_eq!(result.problem.orders()[0].risk_score(), 0.9);
}

#[test]
fn disruption_with_unknown_ids_is_rejected() {
    let engine = engine();
    let problem = scenario_a();
    let prior = engine.plan(&problem);
    let disruption = Disruption {
        demand_updates: vec![DemandUpdate {
            order_id: "nope".into(),
            demand: 1,
        }],
        ..Disruption::default()
    };
    let err = engine.reoptimize(&problem, &prior, &disruption).expect_err("unknown order");
    assert_eq!(err.len(), 1);
}

#[test]
fn cancelled_or_expired_budget_still_yields_plan() {
    let problem = scenario_c();
    let flag = CancelFlag::new();
    flag.cancel();
    let cancelled = engine().plan_with_budget(&problem, &Budget::iterations(10_000).with_cancel(flag));
    assert_eq!(cancelled.num_assigned(), 4);
    assert!(cancelled.is_feasible());

    let expired = engine().plan_with_budget(&problem, &Budget::iterations(10_000).with_time_limit(Duration::ZERO));
    assert_eq!(expired.num_assigned(), 4);
    assert!(expired.is_feasible());
}

/// Solver that always times out and counts how often it was asked.
#[derive(Default)]
struct TimingOutSolver {
    calls: AtomicUsize,
}

impl ExactSolver for TimingOutSolver {
    fn name(&self) -> &str {
        "timing-out"
    }

    fn solve(&self, _formulation: &Formulation, _time_limit: Duration) -> SolveReport {
        self.calls.fetch_add(1, Ordering::Relaxed);
        SolveReport::without_solution(SolveStatus::TimedOut)
    }
}

#[test]
fn solver_timeouts_fall_back_to_heuristics() {
    init_tracing();
    let mut record = scenario_a().to_record();
    record.inventory.push(
        InventoryPosition::new("sku", "d0", 4, 0, 25)
            .with_demand(DemandForecast {
                mean_daily: 10.0,
                std_daily: 2.0,
                lead_time_days: 3.0,
            })
            .with_costs(InventoryCosts {
                holding: 2.0,
                ordering: 50.0,
                stockout: 5.0,
            }),
    );
    let problem = ProblemModel::from_record(record).expect("valid");

    let solver = Arc::new(TimingOutSolver::default());
    let with_solver = engine().with_solver(solver.clone()).plan(&problem);
    let without = engine().plan(&problem);

    assert!(solver.calls.load(Ordering::Relaxed) >= 2);
    assert_eq!(with_solver, without);
    let reorder = with_solver.reorders().next().expect("stock below reorder point");
    assert_eq!(reorder.method, QuantityMethod::EconomicOrderQuantity);
    assert!(with_solver.cost().inventory > 0.0);
}
