//! JSON records in, JSON plans out.
//!
//! Parsing validates: a record that deserializes but describes an invalid
//! problem is rejected with [`EngineError::Validation`].

use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::models::{Plan, ProblemModel, ProblemRecord};
use crate::reoptimize::Disruption;
use crate::scheduling::{Schedule, ScheduleRequest};

/// Parses and validates a problem record.
///
/// # Examples
///
/// ```
/// use u_logistics::io::parse_problem;
///
/// let json = r#"{
///     "depots": [{"id": "d0", "location": {"x": 0.0, "y": 0.0}, "capacity": 50}],
///     "vehicles": [{"id": "v0", "depot_id": "d0", "capacity": 10}],
///     "orders": [{
///         "id": "o1",
///         "destination": {"x": 3.0, "y": 4.0},
///         "demand": 2,
///         "time_window": {"earliest": 0.0, "latest": 60.0}
///     }]
/// }"#;
/// let problem = parse_problem(json).unwrap();
/// assert_eq!(problem.num_orders(), 1);
/// ```
pub fn parse_problem(json: &str) -> Result<ProblemModel, EngineError> {
    let record: ProblemRecord = serde_json::from_str(json)?;
    Ok(ProblemModel::from_record(record)?)
}

/// Reads and validates a problem record from a file.
pub fn read_problem(path: impl AsRef<Path>) -> Result<ProblemModel, EngineError> {
    parse_problem(&fs::read_to_string(path)?)
}

/// Parses a disruption record.
pub fn parse_disruption(json: &str) -> Result<Disruption, EngineError> {
    Ok(serde_json::from_str(json)?)
}

/// Parses a previously written plan, e.g. to warm-start reoptimization.
pub fn parse_plan(json: &str) -> Result<Plan, EngineError> {
    Ok(serde_json::from_str(json)?)
}

/// Parses and validates a scheduling request.
pub fn parse_schedule_request(json: &str) -> Result<ScheduleRequest, EngineError> {
    let request: ScheduleRequest = serde_json::from_str(json)?;
    request.validate()?;
    Ok(request)
}

/// Serializes a schedule as pretty-printed JSON.
pub fn schedule_to_json(schedule: &Schedule) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(schedule)?)
}

/// Serializes a plan as pretty-printed JSON.
pub fn plan_to_json(plan: &Plan) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// Writes a plan to a file as pretty-printed JSON.
pub fn write_plan(plan: &Plan, path: impl AsRef<Path>) -> Result<(), EngineError> {
    fs::write(path, plan_to_json(plan)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;

    const PROBLEM: &str = r#"{
        "depots": [{"id": "d0", "location": {"x": 0.0, "y": 0.0}, "capacity": 50}],
        "vehicles": [{"id": "v0", "depot_id": "d0", "capacity": 10}],
        "orders": [
            {"id": "o1", "destination": {"x": 3.0, "y": 4.0}, "demand": 2,
             "time_window": {"earliest": 0.0, "latest": 60.0}},
            {"id": "o2", "destination": {"x": 6.0, "y": 8.0}, "demand": 2,
             "time_window": {"earliest": 0.0, "latest": 60.0}, "risk_score": 0.4}
        ]
    }"#;

    #[test]
    fn test_plan_survives_json() {
        let problem = parse_problem(PROBLEM).expect("valid");
        let plan = Engine::new(EngineConfig::default()).plan(&problem);
        let json = plan_to_json(&plan).expect("serializes");
        assert!(json.contains("\"kind\": \"dispatch\""));
        assert_eq!(parse_plan(&json).expect("parses"), plan);
    }

    #[test]
    fn test_invalid_problem_is_validation_error() {
        let json = PROBLEM.replacen("\"demand\": 2,", "\"demand\": -2,", 1);
        assert!(matches!(parse_problem(&json), Err(EngineError::Validation(e)) if e.len() == 1));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_problem("{\"depots\": 1}"), Err(EngineError::Json(_))));
        assert!(matches!(parse_disruption("{\"cancelled_orders\": 3}"), Err(EngineError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_problem("/nonexistent/problem.json"),
            Err(EngineError::Io(_))
        ));
    }

    #[test]
    fn test_schedule_request_json() {
        let json = r#"{
            "tasks": [
                {"id": "t1", "duration": 2, "priority": 3.0, "window": {"earliest": 0, "latest": 8}},
                {"id": "t2", "duration": 1, "window": {"earliest": 2, "latest": 4}}
            ],
            "resources": [{"id": "driver-1", "kind": "driver"}]
        }"#;
        let request = parse_schedule_request(json).expect("valid");
        let schedule = Engine::new(EngineConfig::default()).schedule(&request).expect("valid");
        assert!(schedule.unscheduled.is_empty());
        let out = schedule_to_json(&schedule).expect("serializes");
        assert!(out.contains("\"method\": \"heuristic\""));

        let bad = json.replacen("\"duration\": 2", "\"duration\": 0", 1);
        assert!(matches!(parse_schedule_request(&bad), Err(EngineError::Validation(e)) if e.len() == 1));
    }

    #[test]
    fn test_parse_disruption() {
        let d = parse_disruption(r#"{"cancelled_orders": ["o1"], "risk_updates": [{"order_id": "o2", "risk_score": 0.9}]}"#)
            .expect("parses");
        assert_eq!(d.cancelled_orders, vec!["o1".to_string()]);
        assert_eq!(d.risk_updates[0].risk_score, 0.9);
    }
}
