use lodesat::{lbool, BasicSolver, Lit, Solver, SolverInterface, SolverOpts, StatsCallbacks};
use std::io;

fn lit_of<S: SolverInterface>(s: &mut S, x: i32) -> Lit {
    assert_ne!(x, 0);
    Lit::new(s.var_of_int((x.abs() - 1) as u32), x > 0)
}

fn add_clause<S: SolverInterface>(s: &mut S, c: &[i32]) -> bool {
    let mut clause: Vec<Lit> = c.iter().map(|&x| lit_of(s, x)).collect();
    s.add_clause_reuse(&mut clause)
}

fn assert_model_satisfies<S: SolverInterface>(s: &S, clauses: &[Vec<i32>]) {
    let model = s.get_model();
    for c in clauses {
        let sat = c.iter().any(|&x| {
            let v = model[(x.abs() - 1) as usize];
            if x > 0 {
                v == lbool::TRUE
            } else {
                v == lbool::FALSE
            }
        });
        assert!(sat, "model does not satisfy clause {:?}", c);
    }
}

/// `PHP(pigeons, holes)`: every pigeon sits in some hole, no two pigeons
/// share a hole. Unsatisfiable whenever `pigeons > holes`.
fn pigeonhole(pigeons: i32, holes: i32) -> Vec<Vec<i32>> {
    let var = |p: i32, h: i32| p * holes + h + 1;
    let mut clauses: Vec<Vec<i32>> = vec![];
    for p in 0..pigeons {
        clauses.push((0..holes).map(|h| var(p, h)).collect());
    }
    for h in 0..holes {
        for p1 in 0..pigeons {
            for p2 in (p1 + 1)..pigeons {
                clauses.push(vec![-var(p1, h), -var(p2, h)]);
            }
        }
    }
    clauses
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn below(&mut self, n: u64) -> u64 {
        (self.next() >> 33) % n
    }
}

/// Random 3-SAT with a planted solution: clauses falsified by the hidden
/// assignment are rejected, so the instance is satisfiable by construction.
fn planted_3sat(n: usize, m: usize, seed: u64) -> Vec<Vec<i32>> {
    let mut rng = Lcg(seed);
    let plant: Vec<bool> = (0..n).map(|_| rng.below(2) == 1).collect();
    let mut clauses: Vec<Vec<i32>> = vec![];
    while clauses.len() < m {
        let mut vars = [0usize; 3];
        vars[0] = rng.below(n as u64) as usize;
        loop {
            vars[1] = rng.below(n as u64) as usize;
            if vars[1] != vars[0] {
                break;
            }
        }
        loop {
            vars[2] = rng.below(n as u64) as usize;
            if vars[2] != vars[0] && vars[2] != vars[1] {
                break;
            }
        }
        let lits: Vec<i32> = vars
            .iter()
            .map(|&v| {
                let x = (v + 1) as i32;
                if rng.below(2) == 1 {
                    x
                } else {
                    -x
                }
            })
            .collect();
        let sat = lits.iter().any(|&x| plant[(x.abs() - 1) as usize] == (x > 0));
        if sat {
            clauses.push(lits);
        }
    }
    clauses
}

#[test]
fn test_single_unit() {
    let mut s = BasicSolver::default();
    assert!(add_clause(&mut s, &[1]));
    assert_eq!(s.solve(), lbool::TRUE);
    assert_eq!(s.get_model()[0], lbool::TRUE);
}

#[test]
fn test_unit_contradiction() {
    let mut s = BasicSolver::default();
    assert!(add_clause(&mut s, &[1]));
    // detected already while adding
    assert!(!add_clause(&mut s, &[-1]));
    assert!(!s.is_ok());
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_two_var_unsat() {
    let mut s = BasicSolver::default();
    assert!(add_clause(&mut s, &[1, 2]));
    assert!(add_clause(&mut s, &[-1, 2]));
    assert!(add_clause(&mut s, &[1, -2]));
    assert!(add_clause(&mut s, &[-1, -2]));
    assert!(s.is_ok());
    assert_eq!(s.solve(), lbool::FALSE);
    // `ok` is sticky: the answer does not change on a repeated call
    assert_eq!(s.solve(), lbool::FALSE);
    assert!(!add_clause(&mut s, &[1]));
}

#[test]
fn test_tautology_removed() {
    let mut s = BasicSolver::default();
    assert!(add_clause(&mut s, &[1, -1, 2]));
    assert_eq!(s.num_clauses(), 0);
    assert_eq!(s.solve(), lbool::TRUE);
}

#[test]
fn test_duplicate_literals_collapse() {
    let mut s = BasicSolver::default();
    assert!(add_clause(&mut s, &[1, 1, 2]));
    assert!(add_clause(&mut s, &[-1, -1]));
    assert_eq!(s.solve(), lbool::TRUE);
    assert_eq!(s.get_model()[0], lbool::FALSE);
    assert_eq!(s.get_model()[1], lbool::TRUE);
}

#[test]
fn test_pigeonhole_3_2() {
    let mut s = BasicSolver::default();
    for c in pigeonhole(3, 2) {
        assert!(add_clause(&mut s, &c));
    }
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_planted_random_3sat() {
    // ratio 2.0, well below the threshold
    let clauses = planted_3sat(60, 120, 0xdecafbad);
    let mut s = BasicSolver::default();
    for c in &clauses {
        add_clause(&mut s, c);
    }
    assert_eq!(s.solve(), lbool::TRUE);
    assert_model_satisfies(&s, &clauses);
}

#[test]
fn test_conflict_budget_and_reuse() {
    let mut s = BasicSolver::default();
    for c in pigeonhole(6, 5) {
        assert!(add_clause(&mut s, &c));
    }
    s.set_conflict_budget(100);
    assert_eq!(s.solve(), lbool::UNDEF);
    assert!(s.num_conflicts() >= 100);

    // the solver stays usable after an indeterminate answer
    s.budget_off();
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_propagation_budget() {
    let mut s = BasicSolver::default();
    for c in pigeonhole(5, 4) {
        assert!(add_clause(&mut s, &c));
    }
    s.set_propagation_budget(50);
    assert_eq!(s.solve(), lbool::UNDEF);
    s.budget_off();
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_interrupt() {
    let mut s = BasicSolver::default();
    for c in pigeonhole(5, 4) {
        assert!(add_clause(&mut s, &c));
    }
    s.interrupt();
    assert_eq!(s.solve(), lbool::UNDEF);
    s.clear_interrupt();
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_assumptions() {
    let mut s = BasicSolver::default();
    assert!(add_clause(&mut s, &[1, 2]));

    let not_x1 = lit_of(&mut s, -1);
    assert_eq!(s.solve_limited(&[not_x1]), lbool::TRUE);
    // under the assumption, x2 is forced
    assert_eq!(s.get_model()[1], lbool::TRUE);

    // an assumption conflicting with a unit clause fails, but only for
    // that call
    assert!(add_clause(&mut s, &[1]));
    let x1 = lit_of(&mut s, 1);
    assert_eq!(s.solve_limited(&[not_x1]), lbool::FALSE);
    assert!(s.unsat_core().contains(&x1));
    assert!(s.is_ok());
    assert_eq!(s.solve(), lbool::TRUE);
    assert_eq!(s.get_model()[0], lbool::TRUE);
}

#[test]
fn test_stress_reduce_and_gc() {
    let mut s: Solver<StatsCallbacks> = Solver::new(SolverOpts::default(), StatsCallbacks::new());
    for c in pigeonhole(6, 5) {
        assert!(add_clause(&mut s, &c));
    }
    assert_eq!(s.solve(), lbool::FALSE);

    // a refutation of PHP(6,5) is long enough to exercise clause-DB
    // reduction and at least one arena collection
    assert!(
        s.num_conflicts() > 2000,
        "unexpectedly short refutation: {} conflicts",
        s.num_conflicts()
    );
    let cb = s.cb();
    assert!(cb.n_deleted >= 1, "no clause was ever deleted");
    assert!(cb.n_gc >= 1, "no garbage collection ran");
    assert!(cb.n_restarts >= 1);
}

#[test]
fn test_geometric_restarts() {
    let opts = SolverOpts {
        luby_restart: false,
        ..SolverOpts::default()
    };
    let mut s: Solver<StatsCallbacks> = Solver::new(opts, StatsCallbacks::new());
    for c in pigeonhole(5, 4) {
        assert!(add_clause(&mut s, &c));
    }
    assert_eq!(s.solve(), lbool::FALSE);
}

#[test]
fn test_dimacs_parse() {
    let data: &[u8] = b"c sample instance\np cnf 3 2\n1 -3 0\n2 3 -1 0\n";
    let mut input = io::Cursor::new(data);
    let mut s = BasicSolver::default();
    lodesat::dimacs::parse(&mut input, &mut s, true).unwrap();
    assert_eq!(s.num_vars(), 3);
    assert_eq!(s.num_clauses(), 2);
    assert_eq!(s.solve(), lbool::TRUE);
}

#[test]
fn test_dimacs_strict_mismatch() {
    let data: &[u8] = b"p cnf 2 3\n1 2 0\n";
    let mut input = io::Cursor::new(data);
    let mut s = BasicSolver::default();
    let err = lodesat::dimacs::parse(&mut input, &mut s, true).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_model_covers_all_vars() {
    let clauses = planted_3sat(30, 60, 42);
    let mut s = BasicSolver::default();
    for c in &clauses {
        add_clause(&mut s, c);
    }
    assert_eq!(s.solve(), lbool::TRUE);
    assert_eq!(s.get_model().len() as u32, s.num_vars());
    assert_model_satisfies(&s, &clauses);
}
