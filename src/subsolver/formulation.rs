//! Mixed-integer linear formulations handed to an exact solver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Real-valued.
    Continuous,
    /// Integer-valued.
    Integer,
    /// 0 or 1.
    Binary,
}

/// A decision variable with bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Name for diagnostics.
    pub name: String,
    /// Domain.
    pub kind: VariableKind,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// Σ coefficient × variable + constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    /// `(variable index, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,
    /// Constant offset.
    pub constant: f64,
}

impl LinearExpr {
    /// Empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coefficient × variable`.
    pub fn term(mut self, variable: usize, coefficient: f64) -> Self {
        self.terms.push((variable, coefficient));
        self
    }

    /// Value under an assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(v, c)| c * values.get(v).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

/// Comparison in a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// `expr ≤ rhs`
    LessEqual,
    /// `expr ≥ rhs`
    GreaterEqual,
    /// `expr = rhs`
    Equal,
}

/// `expr relation rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Name for diagnostics.
    pub name: String,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Comparison.
    pub relation: Relation,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Returns `true` if the assignment satisfies the constraint within
    /// `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::LessEqual => lhs <= self.rhs + tolerance,
            Relation::GreaterEqual => lhs >= self.rhs - tolerance,
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A minimization problem over linear constraints.
///
/// # Examples
///
/// ```
/// use u_logistics::subsolver::{Formulation, LinearExpr, Relation, VariableKind};
///
/// let mut f = Formulation::new();
/// let a = f.add_variable("a", VariableKind::Binary, 0.0, 1.0);
/// let b = f.add_variable("b", VariableKind::Binary, 0.0, 1.0);
/// f.add_constraint("pick_one", LinearExpr::new().term(a, 1.0).term(b, 1.0), Relation::Equal, 1.0);
/// f.set_objective(LinearExpr::new().term(a, 3.0).term(b, 2.0));
///
/// assert!(f.is_feasible(&[0.0, 1.0], 1e-6));
/// assert!(!f.is_feasible(&[1.0, 1.0], 1e-6));
/// assert_eq!(f.objective_value(&[0.0, 1.0]), 2.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formulation {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl Formulation {
    /// Empty formulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable and returns its index.
    pub fn add_variable(&mut self, name: impl Into<String>, kind: VariableKind, lower: f64, upper: f64) -> usize {
        let (lower, upper) = match kind {
            VariableKind::Binary => (0.0, 1.0),
            _ => (lower, upper),
        };
        self.variables.push(Variable {
            name: name.into(),
            kind,
            lower,
            upper,
        });
        self.variables.len() - 1
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, name: impl Into<String>, expr: LinearExpr, relation: Relation, rhs: f64) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            relation,
            rhs,
        });
    }

    /// Sets the objective to minimize.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Constraints.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Objective value of an assignment.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Checks bounds, integrality and every constraint.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let in_domain = self.variables.iter().zip(values).all(|(var, &x)| {
            let integral = match var.kind {
                VariableKind::Continuous => true,
                VariableKind::Integer | VariableKind::Binary => (x - x.round()).abs() <= tolerance,
            };
            integral && x >= var.lower - tolerance && x <= var.upper + tolerance
        });
        in_domain && self.constraints.iter().all(|c| c.is_satisfied(values, tolerance))
    }
}

/// Outcome class of a solver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Feasible, optimality not proven.
    Feasible,
    /// Proven infeasible.
    Infeasible,
    /// The time limit passed without a usable assignment.
    TimedOut,
}

/// What a solver returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Outcome class.
    pub status: SolveStatus,
    /// One value per variable; empty unless a solution was found.
    pub assignment: Vec<f64>,
}

impl SolveReport {
    /// Report with a solution.
    pub fn solved(status: SolveStatus, assignment: Vec<f64>) -> Self {
        Self { status, assignment }
    }

    /// Report without a solution.
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            assignment: Vec::new(),
        }
    }
}

/// An exact MIP solver.
///
/// Implementations must return within roughly `time_limit` and must be
/// usable from several threads at once.
pub trait ExactSolver: Send + Sync {
    /// Solver name for diagnostics.
    fn name(&self) -> &str;

    /// Minimizes `formulation` within `time_limit`.
    fn solve(&self, formulation: &Formulation, time_limit: Duration) -> SolveReport;
}
