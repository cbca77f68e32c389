/* Main Interface */

use crate::types::{lbool, Lit, Var};

/// Main interface for a solver: it makes it possible to add clauses,
/// allocate variables, and check for satisfiability.
pub trait SolverInterface {
    /// Create a new variable, with the given initial polarity for phase
    /// saving. `polarity == false` means the first decision on the variable
    /// tries the negative literal.
    fn new_var(&mut self, polarity: bool) -> Var;

    /// Create a new variable with the default polarity.
    fn new_var_default(&mut self) -> Var;

    /// The variable with index `v_idx`, creating intermediate variables
    /// as needed.
    fn var_of_int(&mut self, v_idx: u32) -> Var;

    /// Add a clause to the solver. Returns `false` if the solver detected
    /// a top-level inconsistency.
    ///
    /// The slice is reused as scratch space and may be permuted/truncated.
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool;

    /// Search without assumptions.
    ///
    /// Returns `lbool::TRUE` if a model was found, `lbool::FALSE` if the
    /// clause set is unsatisfiable, and `lbool::UNDEF` if a budget or an
    /// interrupt ended the search first.
    fn solve(&mut self) -> lbool;

    /// Search under the given assumptions, holding for this call only.
    fn solve_limited(&mut self, assumps: &[Lit]) -> lbool;

    /// `false` once a top-level inconsistency has been detected; sticky.
    fn is_ok(&self) -> bool;

    /// Query the whole model.
    ///
    /// Precondition: last result was `lbool::TRUE`.
    fn get_model(&self) -> &[lbool];

    /// Query the model for a variable.
    fn value_var(&self, v: Var) -> lbool;

    /// Query the model for a literal.
    fn value_lit(&self, l: Lit) -> lbool;

    /// Value of this literal if it is assigned at level 0, `UNDEF` otherwise.
    fn value_lvl_0(&self, l: Lit) -> lbool;

    /// Stop after roughly `n` more conflicts.
    fn set_conflict_budget(&mut self, n: u64);

    /// Stop after roughly `n` more propagations.
    fn set_propagation_budget(&mut self, n: u64);

    /// Disarm both budgets.
    fn budget_off(&mut self);

    fn num_vars(&self) -> u32;
    fn num_clauses(&self) -> u64;
    fn num_learnts(&self) -> u64;
    fn num_conflicts(&self) -> u64;
    fn num_propagations(&self) -> u64;
    fn num_decisions(&self) -> u64;
    fn num_restarts(&self) -> u64;

    /// Print a summary of the search statistics to standard output.
    fn print_stats(&self);
}
