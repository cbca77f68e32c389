/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::arena::{CRef, ClauseArena, ClauseRef},
    crate::bqueue::BoundedQueue,
    crate::callbacks::{Callbacks, ClauseKind, ProgressStatus},
    crate::heap::{Comparator, Heap, HeapData},
    crate::interface::SolverInterface,
    crate::types::{lbool, LSet, Lit, VMap, Var},
    crate::watch::{DeletePred, OccLists, OccListsData},
    std::{
        fmt, mem,
        sync::atomic::{AtomicBool, Ordering},
    },
};

/// Samples of recent conflict LBDs kept for the restart heuristic.
const LBD_QUEUE_LEN: usize = 50;
/// Samples of recent trail sizes kept for restart blocking.
const TRAIL_QUEUE_LEN: usize = 5000;
/// Restart when `avg(lbd_queue) * MARGIN` exceeds the long-term LBD average.
const RESTART_LBD_MARGIN: f64 = 0.8;
/// Block a restart when the trail is this much larger than its recent average.
const BLOCK_RESTART_FACTOR: f64 = 1.4;
/// Restart blocking only kicks in after this many conflicts.
const BLOCK_RESTART_MIN_CONFLICTS: u64 = 10_000;
/// Conflicts before the first learnt-DB reduction.
const REDUCE_DB_BASE: u64 = 2000;
/// Additional conflicts granted per completed reduction.
const REDUCE_DB_INC: u64 = 1000;
/// Base of the Luby sequence for the outer restart schedule.
const LUBY_RESTART_FACTOR: f64 = 2.0;
/// Growth factor of the geometric outer restart schedule.
const GEOMETRIC_RESTART_FACTOR: f64 = 1.5;
/// Conflict cap of one `search` call is `base * RESTART_CONFLICT_UNIT`.
const RESTART_CONFLICT_UNIT: i32 = 32;

/// The main solver structure.
///
/// A `Solver` object contains the whole state of the SAT solver: clause
/// arena, watch lists, trail, heuristics and statistics. It is parametrized
/// by [`Callbacks`].
pub struct Solver<Cb: Callbacks> {
    /// If the problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,
    /// If the problem is unsatisfiable under assumptions, the final conflict
    /// clause expressed in the assumptions.
    conflict: LSet,

    cb: Cb,
    asynch_interrupt: AtomicBool,

    /// List of problem clauses.
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    vars: VarState,

    /// `watches[lit]` is a list of clauses watching `lit` (they are visited
    /// when `lit` becomes false, i.e. when `!lit` is propagated).
    watches_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered by activity.
    order_heap_data: HeapData<Var>,
    /// The preferred polarity of each variable (phase saving).
    polarity: VMap<bool>,
    /// Scratch marker used by conflict analysis.
    seen: VMap<bool>,

    /// Per-level epoch tags for LBD computation.
    lbd_tag: Vec<u32>,
    /// Current epoch of `lbd_tag`.
    lbd_flag: u32,

    /// Recent conflict LBDs (restart trigger).
    lbd_queue: BoundedQueue,
    /// Recent trail sizes at conflicts (restart blocking).
    trail_queue: BoundedQueue,
    /// Sum of all conflict LBDs ever produced.
    sum_lbd: u64,
    /// Conflict count at which the next DB reduction runs.
    next_reduce_db: u64,

    /// If `false`, the clause set is already unsatisfiable. Sticky.
    ok: bool,
    /// Amount to bump the next clause with.
    cla_inc: f64,
    clause_decay: f64,
    luby_restart: bool,
    /// The fraction of wasted memory allowed before garbage collection runs.
    garbage_frac: f64,
    /// Head of the propagation queue, as an index into the trail.
    qhead: i32,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseArena,

    /// Assumptions for the current `solve_limited` call.
    assumptions: Vec<Lit>,

    // Statistics.
    starts: u64,
    decisions: u64,
    propagations: u64,
    conflicts: u64,
    n_resolutions: u64,
    n_reduce_db: u64,
    n_removed: u64,
    num_clauses: u64,
    num_learnts: u64,
    learnts_literals: u64,

    // Resource constraints; -1 means no budget.
    conflict_budget: i64,
    propagation_budget: i64,
}

/// The current assignment state.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump the next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assignments in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for the decision levels in `trail`.
    trail_lim: Vec<i32>,
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var(&mut self, polarity: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(v.idx() + 1);
        self.watches_data.init(Lit::new(v, false));
        self.watches_data.init(Lit::new(v, true));
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars.vardata.insert_default(v, VarData::default());
        self.vars.activity.insert_default(v, 0.0);
        self.seen.insert_default(v, false);
        self.polarity.insert_default(v, polarity);
        self.lbd_tag.push(0);
        self.insert_var_order(v);
        v
    }

    fn new_var_default(&mut self) -> Var {
        self.new_var(false)
    }

    fn var_of_int(&mut self, v_idx: u32) -> Var {
        while v_idx >= self.num_vars() {
            self.new_var_default();
        }
        let var = Var::from_idx(v_idx);
        debug_assert_eq!(var.idx(), v_idx);
        var
    }

    // in the API, clauses can only be added at level 0
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add toplevel clause {:?}", clause);
        clause.sort_unstable();
        self.add_clause_(clause)
    }

    fn solve(&mut self) -> lbool {
        self.solve_limited(&[])
    }

    fn solve_limited(&mut self, assumps: &[Lit]) -> lbool {
        self.assumptions.clear();
        self.assumptions.extend_from_slice(assumps);
        self.solve_internal()
    }

    fn is_ok(&self) -> bool {
        self.ok
    }

    fn get_model(&self) -> &[lbool] {
        &self.model
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&val| val)
    }

    fn value_lit(&self, l: Lit) -> lbool {
        self.value_var(l.var()) ^ !l.sign()
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.vars.value_lit(lit);
        if self.vars.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn set_conflict_budget(&mut self, n: u64) {
        self.conflict_budget = (self.conflicts + n) as i64;
    }

    fn set_propagation_budget(&mut self, n: u64) {
        self.propagation_budget = (self.propagations + n) as i64;
    }

    fn budget_off(&mut self) {
        self.conflict_budget = -1;
        self.propagation_budget = -1;
    }

    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }
    fn num_clauses(&self) -> u64 {
        self.num_clauses
    }
    fn num_learnts(&self) -> u64 {
        self.num_learnts
    }
    fn num_conflicts(&self) -> u64 {
        self.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.starts
    }

    fn print_stats(&self) {
        println!("c restarts              : {}", self.starts);
        println!("c conflicts             : {:<12}", self.conflicts);
        println!("c decisions             : {:<12}", self.decisions);
        println!("c propagations          : {:<12}", self.propagations);
        println!("c reduce DB             : {:<12}", self.n_reduce_db);
        println!("c removed clauses       : {:<12}", self.n_removed);
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

// main algorithm
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check(), "invalid solver options");
        Self {
            model: vec![],
            conflict: LSet::new(),
            cb,
            asynch_interrupt: AtomicBool::new(false),
            clauses: vec![],
            learnts: vec![],
            vars: VarState::new(opts.var_decay),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            polarity: VMap::new(),
            seen: VMap::new(),
            lbd_tag: vec![0], // slot for level 0
            lbd_flag: 0,
            lbd_queue: BoundedQueue::new(LBD_QUEUE_LEN),
            trail_queue: BoundedQueue::new(TRAIL_QUEUE_LEN),
            sum_lbd: 0,
            next_reduce_db: REDUCE_DB_BASE,
            ok: true,
            cla_inc: 1.0,
            clause_decay: opts.clause_decay,
            luby_restart: opts.luby_restart,
            garbage_frac: opts.garbage_frac,
            qhead: 0,
            next_var: Var::from_idx(0),
            ca: ClauseArena::new(),
            assumptions: vec![],
            starts: 0,
            decisions: 0,
            propagations: 0,
            conflicts: 0,
            n_resolutions: 0,
            n_reduce_db: 0,
            n_removed: 0,
            num_clauses: 0,
            num_learnts: 0,
            learnts_literals: 0,
            conflict_budget: -1,
            propagation_budget: -1,
        }
    }

    /// Interrupt the search asynchronously; the solver returns `UNDEF` from
    /// the current `solve` at the next restart boundary.
    pub fn interrupt(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    /// Clear the interrupt flag so the solver can be used again.
    pub fn clear_interrupt(&self) {
        self.asynch_interrupt.store(false, Ordering::Relaxed);
    }

    /// The final conflict in terms of the assumptions, after an UNSAT
    /// `solve_limited` answer.
    pub fn unsat_core(&self) -> &[Lit] {
        self.conflict.as_slice()
    }

    /// Temporary access to the callbacks.
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks.
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    /// Display the model as a DIMACS `v` line.
    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    fn has_been_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    fn within_budget(&self) -> bool {
        !self.has_been_interrupted()
            && (self.conflict_budget < 0 || self.conflicts < self.conflict_budget as u64)
            && (self.propagation_budget < 0
                || self.propagations < self.propagation_budget as u64)
            && !self.cb.stop()
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn watches(&mut self) -> OccLists<Lit, Watcher, WatcherDeleted> {
        self.watches_data.promote(WatcherDeleted { ca: &self.ca })
    }

    fn insert_var_order(&mut self, x: Var) {
        let mut heap = self.order_heap();
        if !heap.in_heap(x) {
            heap.insert(x);
        }
    }

    /// Select the next unassigned variable with the highest activity and
    /// return the literal with its saved polarity, or `Lit::UNDEF` when all
    /// variables are assigned (a model is complete).
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;
        while next == Var::UNDEF || self.vars.value(next) != lbool::UNDEF {
            let mut heap = self.order_heap();
            if heap.is_empty() {
                return Lit::UNDEF;
            }
            next = heap.remove_min();
        }
        Lit::new(next, self.polarity[next])
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        trace!("new decision level {}", 1 + self.decision_level());
        self.vars.new_decision_level();
    }

    /// Revert to the state at the given level (keeping all assignments at
    /// `level` but not beyond). Unassigned variables keep their last sign as
    /// the preferred polarity and go back on the order heap.
    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() > level {
            trace!("cancel-until {}", level);
            let bound = self.vars.trail_lim[level as usize] as usize;
            for c in (bound..self.vars.trail.len()).rev() {
                let x = self.vars.trail[c].var();
                self.vars.ass[x] = lbool::UNDEF;
                self.polarity[x] = self.vars.trail[c].sign();
                self.insert_var_order(x);
            }
            self.qhead = bound as i32;
            self.vars.trail.truncate(bound);
            self.vars.trail_lim.truncate(level as usize);
        }
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned, otherwise
    /// `None`.
    ///
    /// Post-condition: the propagation queue is empty, even if there was a
    /// conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            num_props += 1;

            let watches_data_ptr: *mut OccListsData<Lit, Watcher> = &mut self.watches_data;
            let ws = self
                .watches_data
                .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca });
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            'clauses: while i < end {
                // try to avoid inspecting the clause
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                // make sure the false literal is c[1]
                let cr = ws[i].cref;
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    let other = c[1];
                    c[0] = other;
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // if the other watch is true, the clause is already satisfied
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // look for a new literal to watch
                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        let lit_k = c[k];
                        c[1] = lit_k;
                        c[k] = false_lit;
                        // `!lit_k != p`, so this is a different list than `ws`
                        debug_assert_ne!(!lit_k, p);
                        unsafe { &mut (&mut *watches_data_ptr)[!lit_k] }.push(w);
                        continue 'clauses;
                    }
                }

                // no replacement found, the clause is unit under the assignment
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    // conflict
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // copy the remaining watches
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.unchecked_enqueue(first, cr);
                }
            }
            ws.truncate(j);
        }
        self.propagations += num_props as u64;

        confl
    }

    /// Analyze the conflict and produce an asserting clause.
    ///
    /// Pre-conditions: the current decision level is greater than 0, and all
    /// literals of `confl` are false in the current trail.
    ///
    /// Post-conditions: `out_learnt[0]` is the asserting literal (the negated
    /// first UIP), unassigned at the returned backjump level; if
    /// `out_learnt.len() > 1` then `out_learnt[1]` has the greatest decision
    /// level of the remaining literals. Returns the backjump level and the
    /// LBD of the learnt clause.
    fn analyze(&mut self, mut confl: CRef, out_learnt: &mut Vec<Lit>) -> (u32, u32) {
        out_learnt.clear();
        out_learnt.push(Lit::UNDEF); // leave room for the asserting literal

        let conflict_level = self.decision_level() as i32;
        debug_assert!(conflict_level > 0);

        let mut path_c = 0i32;
        let mut p = Lit::UNDEF;
        let mut index = self.vars.trail.len();

        loop {
            debug_assert_ne!(confl, CRef::UNDEF); // (otherwise it would be the UIP)
            if self.ca.get_ref(confl).learnt() {
                // the clause took part in a conflict, it is useful
                self.cla_bump_activity(confl);
            }
            self.n_resolutions += 1;

            let c = self.ca.get_ref(confl);
            let lits = c.lits();
            // for reason clauses, position 0 holds the propagated literal
            // itself and cannot appear in the learnt clause
            let skip = if p == Lit::UNDEF {
                0
            } else {
                debug_assert_eq!(lits[0].var(), p.var());
                1
            };
            for &q in &lits[skip..] {
                let v = q.var();
                if !self.seen[v] && self.vars.level(v) > 0 {
                    self.vars.var_bump_activity(&mut self.order_heap_data, v);
                    self.seen[v] = true;
                    if self.vars.level(v) >= conflict_level {
                        // assigned at the conflict level: resolve it away
                        path_c += 1;
                    } else {
                        out_learnt.push(q);
                    }
                }
            }

            // select the next marked literal on the trail to resolve on
            while !self.seen[self.vars.trail[index - 1].var()] {
                debug_assert_eq!(
                    self.vars.level(self.vars.trail[index - 1].var()),
                    conflict_level
                );
                index -= 1;
            }
            index -= 1;
            p = self.vars.trail[index];
            confl = self.vars.reason(p.var());
            self.seen[p.var()] = false;
            path_c -= 1;

            if path_c <= 0 {
                break;
            }
        }

        // `p` is the first UIP
        debug_assert!(self.vars.value_lit(p) == lbool::TRUE);
        out_learnt[0] = !p;
        trace!("analyze.learnt {:?}", out_learnt);

        // find the correct backtrack level
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            // find the first literal assigned at the next-highest level
            for i in 2..out_learnt.len() {
                if self.vars.level(out_learnt[i].var())
                    > self.vars.level(out_learnt[max_i].var())
                {
                    max_i = i;
                }
            }
            // swap-in this literal at index 1
            out_learnt.swap(max_i, 1);
            self.vars.level(out_learnt[1].var()) as u32
        };

        let lbd = self.compute_lbd(out_learnt);

        for &lit in out_learnt.iter() {
            self.seen[lit.var()] = false; // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.vars.value_lit(l) == lbool::FALSE));

        (btlevel, lbd)
    }

    /// Number of distinct decision levels among `lits`.
    ///
    /// Uses an epoch counter over per-level tags, so the scratch space never
    /// needs an explicit reset.
    fn compute_lbd(&mut self, lits: &[Lit]) -> u32 {
        let mut nb_levels = 0;
        self.lbd_flag = self.lbd_flag.wrapping_add(1);
        for &lit in lits {
            let lvl = self.vars.level(lit.var()) as usize;
            if self.lbd_tag[lvl] != self.lbd_flag {
                self.lbd_tag[lvl] = self.lbd_flag;
                nb_levels += 1;
            }
        }
        nb_levels
    }

    /// Express the final conflict in terms of assumptions: compute the
    /// (possibly empty) set of assumptions that led to the assignment of `p`
    /// and store it in `out_conflict`.
    fn analyze_final(&mut self, p: Lit, out_conflict: &mut LSet) {
        debug!("analyze_final lit={:?}", p);
        out_conflict.clear();
        out_conflict.insert(p);

        if self.decision_level() == 0 {
            return; // no assumptions involved
        }

        self.seen[p.var()] = true;

        for &lit in self.vars.trail[self.vars.trail_lim[0] as usize..]
            .iter()
            .rev()
        {
            let x = lit.var();
            if self.seen[x] {
                let reason = self.vars.reason(x);
                if reason == CRef::UNDEF {
                    debug_assert!(self.vars.level(x) > 0);
                    out_conflict.insert(!lit);
                } else {
                    let c = self.ca.get_ref(reason);
                    for &q in &c.lits()[1..] {
                        if self.vars.level(q.var()) > 0 {
                            self.seen[q.var()] = true;
                        }
                    }
                }
                self.seen[x] = false;
            }
        }
        self.seen[p.var()] = false;
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let a = c.activity() + self.cla_inc as f32;
            c.set_activity(a);
            a
        };
        if new_activity > 1e20 {
            // rescale
            for i in 0..self.learnts.len() {
                let learnt = self.learnts[i];
                let mut c = self.ca.get_mut(learnt);
                let a = c.activity() * 1e-20;
                c.set_activity(a);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Attach a clause to the watcher lists.
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches()[!c0].push(Watcher::new(cr, c1));
        self.watches()[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
        }
    }

    /// Detach a clause from the watcher lists, lazily: the lists are merely
    /// smudged and cleaned on their next traversal.
    fn detach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        let mut watches = self.watches();
        watches.smudge(!c0);
        watches.smudge(!c1);
        if learnt {
            self.num_learnts -= 1;
            self.learnts_literals -= size as u64;
        } else {
            self.num_clauses -= 1;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        {
            let c = self.ca.get_ref(cr);
            // don't leave a dangling reason pointer
            if self.locked(c) {
                let v = c[0].var();
                self.vars.vardata[v].reason = CRef::UNDEF;
            }
        }
        self.ca.get_mut(cr).set_mark(1); // tombstone, checked during relocation
        self.ca.free(cr);
        self.n_removed += 1;
    }

    /// `true` if the clause is the reason of some implication in the current
    /// state; such clauses must not be deleted.
    fn locked(&self, c: ClauseRef) -> bool {
        let reason = self.vars.reason(c[0].var());
        self.vars.value_lit(c[0]) == lbool::TRUE
            && reason != CRef::UNDEF
            && self.ca.get_ref(reason) == c
    }

    /// Add a clause at level 0.
    ///
    /// Precondition: `clause` is sorted.
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug_assert_eq!(
            self.decision_level(),
            0,
            "add clause at non-zero decision level"
        );
        if !self.ok {
            return false;
        }

        // remove duplicate and false literals, detect satisfied clauses and
        // tautologies
        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.vars.value_lit(lit_i);
            if value == lbool::TRUE || lit_i == !last_lit {
                return true;
            } else if value != lbool::FALSE && lit_i != last_lit {
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);

        if clause.is_empty() {
            self.ok = false;
            false
        } else if clause.len() == 1 {
            self.vars.unchecked_enqueue(clause[0], CRef::UNDEF);
            self.ok = self.propagate().is_none();
            self.ok
        } else {
            let cr = self.ca.alloc(&clause, false);
            self.clauses.push(cr);
            self.attach_clause(cr);
            self.cb.on_new_clause(&clause, ClauseKind::Original);
            true
        }
    }

    /// Remove half of the learnt clauses, except binary clauses and clauses
    /// currently locked as reasons. The candidates are ordered by LBD
    /// (higher first) and then by activity (lower first).
    fn reduce_db(&mut self) {
        debug!("reduce_db.start");
        self.n_reduce_db += 1;

        {
            let ca = &self.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt() && y.learnt());
                // binary clauses sort last: they are always kept
                Ord::cmp(&(x.size() <= 2), &(y.size() <= 2))
                    .then(Ord::cmp(&y.lbd(), &x.lbd()))
                    .then(
                        PartialOrd::partial_cmp(&x.activity(), &y.activity())
                            .expect("NaN activity"),
                    )
            });
        }

        let len = self.learnts.len();
        let mut j = 0;
        for i in 0..len {
            let cr = self.learnts[i];
            let remove = {
                let c = self.ca.get_ref(cr);
                c.size() > 2 && !self.locked(c) && i < len / 2
            };
            if remove {
                self.remove_clause(cr);
                self.cb.on_delete_clause(self.ca.get_ref(cr).lits());
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }
        self.learnts.truncate(j);
        debug!("reduce_db.done (deleted {})", len - j);

        self.check_garbage();
    }

    /// Move every live clause to the given arena, rewriting all references
    /// (watch entries, reasons on the trail, both clause lists).
    fn reloc_all(&mut self, to: &mut ClauseArena) {
        // all watchers
        self.watches().clean_all();
        for v_idx in 0..self.num_vars() {
            let v = Var::from_idx(v_idx);
            for s in 0..2 {
                let p = Lit::new(v, s != 0);
                for watch in &mut self.watches_data[p] {
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // all reasons; `locked` must not be called on an already relocated
        // clause, hence the short-circuit on `reloced`
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();
            let reason = self.vars.reason(v);
            if reason != CRef::UNDEF {
                let keep = {
                    let c = self.ca.get_ref(reason);
                    c.reloced() || self.locked(c)
                };
                if keep {
                    debug_assert!(self.ca.get_ref(reason).mark() != 1);
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                }
            }
        }

        // all learnt clauses
        let ca = &mut self.ca;
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let mut cr = self.learnts[i];
            if ca.get_ref(cr).mark() != 1 {
                ca.reloc(&mut cr, to);
                self.learnts[j] = cr;
                j += 1;
            }
        }
        self.learnts.truncate(j);

        // all original clauses
        let mut j = 0;
        for i in 0..self.clauses.len() {
            let mut cr = self.clauses[i];
            if ca.get_ref(cr).mark() != 1 {
                ca.reloc(&mut cr, to);
                self.clauses[j] = cr;
                j += 1;
            }
        }
        self.clauses.truncate(j);
    }

    /// Garbage collect the arena by moving alive clauses into a fresh one.
    fn garbage_collect(&mut self) {
        // Size the new arena to the current live estimate. This is not
        // precise but avoids unnecessary regrowth of the new region.
        let mut to = ClauseArena::with_start_cap(self.ca.len() - self.ca.wasted());
        self.reloc_all(&mut to);
        let old_bytes = self.ca.len() * mem::size_of::<Lit>();
        let new_bytes = to.len() * mem::size_of::<Lit>();
        self.ca = to;
        self.cb.on_gc(old_bytes, new_bytes);
    }

    /// Run GC if the wasted share of the arena exceeds `garbage_frac`.
    fn check_garbage(&mut self) {
        if self.ca.wasted() as f64 > self.ca.len() as f64 * self.garbage_frac {
            self.garbage_collect();
        }
    }

    fn progress_estimate(&self) -> f64 {
        let mut progress = 0.0;
        let f = 1.0 / self.num_vars() as f64;
        for i in 0..=self.decision_level() {
            let beg: i32 = if i == 0 {
                0
            } else {
                self.vars.trail_lim[i as usize - 1]
            };
            let end: i32 = if i == self.decision_level() {
                self.vars.trail.len() as i32
            } else {
                self.vars.trail_lim[i as usize]
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }
        progress / self.num_vars() as f64
    }

    fn progress_status(&self) -> ProgressStatus {
        ProgressStatus {
            restarts: self.starts,
            conflicts: self.conflicts,
            decisions: self.decisions,
            avg_resolutions: if self.conflicts > 0 {
                self.n_resolutions / self.conflicts
            } else {
                0
            },
            n_reduce_db: self.n_reduce_db,
            avg_learnt_len: if self.num_learnts > 0 {
                self.learnts_literals as f64 / self.num_learnts as f64
            } else {
                0.0
            },
            removed_clauses: self.n_removed,
            progress_estimate: self.progress_estimate() * 100.0,
        }
    }

    /// Search until a result is established or `nof_conflicts` conflicts
    /// have been spent (negative means no cap).
    ///
    /// Returns `TRUE` when a model is found, `FALSE` when the clause set is
    /// unsatisfiable, and `UNDEF` when a restart fired, the cap was reached
    /// or the budget ran out (the trail is then rolled back to level 0).
    fn search(&mut self, nof_conflicts: i32, tmp_learnt: &mut Vec<Lit>) -> lbool {
        debug_assert!(self.ok);
        let mut conflict_c: i32 = 0;
        self.starts += 1;

        loop {
            let confl = self.propagate();

            if let Some(confl) = confl {
                // conflict
                self.conflicts += 1;
                conflict_c += 1;
                if self.decision_level() == 0 {
                    return lbool::FALSE;
                }

                self.trail_queue.push(self.vars.trail.len() as u32);
                // block the upcoming restart if the search is deepening
                if self.conflicts > BLOCK_RESTART_MIN_CONFLICTS
                    && self.lbd_queue.is_full()
                    && (self.vars.trail.len() as f64)
                        > BLOCK_RESTART_FACTOR * self.trail_queue.avg()
                {
                    self.lbd_queue.fast_clear();
                }

                let (btlevel, lbd) = self.analyze(confl, tmp_learnt);
                self.lbd_queue.push(lbd);
                self.sum_lbd += lbd as u64;

                self.cancel_until(btlevel);

                if tmp_learnt.len() == 1 {
                    // learnt a unit clause: assign it at level 0
                    self.vars.unchecked_enqueue(tmp_learnt[0], CRef::UNDEF);
                } else {
                    let cr = self.ca.alloc(&tmp_learnt, true);
                    self.learnts.push(cr);
                    self.attach_clause(cr);
                    self.cla_bump_activity(cr);
                    self.ca.get_mut(cr).set_lbd(lbd);
                    // assert the UIP literal, justified by the new clause
                    self.vars.unchecked_enqueue(tmp_learnt[0], cr);
                }
                self.cb.on_new_clause(&tmp_learnt, ClauseKind::Learnt);

                self.vars.var_decay_activity();
                self.cla_decay_activity();

                if self.conflicts % 1000 == 0 {
                    let status = self.progress_status();
                    self.cb.on_progress(|| status);
                }
            } else {
                // no conflict
                if self.lbd_queue.is_full()
                    && self.lbd_queue.avg() * RESTART_LBD_MARGIN
                        > self.sum_lbd as f64 / self.conflicts as f64
                {
                    // recent learnt clauses are worse than the long-term
                    // average: restart
                    self.lbd_queue.fast_clear();
                    self.cancel_until(0);
                    return lbool::UNDEF;
                }

                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                    // reached the cap on this run, or out of budget
                    self.cancel_until(0);
                    return lbool::UNDEF;
                }

                if self.conflicts >= self.next_reduce_db {
                    // time to reduce the learnt clause database
                    self.reduce_db();
                    self.next_reduce_db =
                        self.conflicts + REDUCE_DB_BASE + REDUCE_DB_INC * self.n_reduce_db;
                }

                // perform user-provided assumptions, then branch
                let mut next = Lit::UNDEF;
                while (self.decision_level() as usize) < self.assumptions.len() {
                    let p = self.assumptions[self.decision_level() as usize];
                    if self.vars.value_lit(p) == lbool::TRUE {
                        // dummy decision level, `p` is true already
                        self.new_decision_level();
                    } else if self.vars.value_lit(p) == lbool::FALSE {
                        // the assumptions are jointly unsatisfiable
                        let mut conflict = mem::replace(&mut self.conflict, LSet::new());
                        self.analyze_final(!p, &mut conflict);
                        self.conflict = conflict;
                        return lbool::FALSE;
                    } else {
                        next = p;
                        break;
                    }
                }

                if next == Lit::UNDEF {
                    next = self.pick_branch_lit();
                    if next == Lit::UNDEF {
                        // all variables assigned: model found
                        return lbool::TRUE;
                    }
                    self.decisions += 1;
                }

                debug!("pick-next {:?}", next);
                self.new_decision_level();
                self.vars.unchecked_enqueue(next, CRef::UNDEF);
            }
        }
    }

    /// Main solve method (assumptions given in `self.assumptions`).
    fn solve_internal(&mut self) -> lbool {
        debug_assert_eq!(self.decision_level(), 0);
        self.model.clear();
        self.conflict.clear();
        if !self.ok {
            return lbool::FALSE;
        }
        let mut tmp_learnt: Vec<Lit> = vec![];

        info!("search.start");
        self.cb.on_start();

        let mut status;
        let mut curr_restarts: i32 = 0;
        loop {
            let rest_base = if self.luby_restart {
                utils::luby(LUBY_RESTART_FACTOR, curr_restarts)
            } else {
                f64::powi(GEOMETRIC_RESTART_FACTOR, curr_restarts)
            };
            let nof_conflicts = (rest_base * RESTART_CONFLICT_UNIT as f64) as i32;
            status = self.search(nof_conflicts, &mut tmp_learnt);
            if !self.within_budget() {
                break;
            }
            if status != lbool::UNDEF {
                break;
            }
            info!("search.restart({})", curr_restarts);
            curr_restarts += 1;
            self.cb.on_restart();
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // extend & copy model
            let num_vars = self.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.vars.value(Var::from_idx(i));
            }
        } else if status == lbool::FALSE && self.conflict.len() == 0 {
            // an unconditional UNSAT answer is final; with assumptions the
            // conflict set is non-empty and later calls may still succeed
            self.ok = false;
        }

        self.cancel_until(0);
        debug!("res: {:?}", status);
        status
    }
}

impl VarState {
    fn new(var_decay: f64) -> Self {
        Self {
            activity: VMap::new(),
            ass: VMap::new(),
            vardata: VMap::new(),
            var_inc: 1.0,
            var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    /// Assign `p`, record its reason, and push it on the trail.
    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    /// Increase a variable's activity by the current bump value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // rescale
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // update the heap position with respect to the new activity
        let mut heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if heap.in_heap(v) {
            heap.decrease(v);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

impl PartialEq for Watcher {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.cref == rhs.cref
    }
}
impl Eq for Watcher {}

/// Heap order: strictly greater activity comes first.
struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn lt(&self, lhs: &Var, rhs: &Var) -> bool {
        self.activity[*lhs] > self.activity[*rhs]
    }
}

/// Predicate testing whether a watcher's clause has been tombstoned.
struct WatcherDeleted<'a> {
    ca: &'a ClauseArena,
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).mark() == 1
    }
}

/// Print the model as a DIMACS `v` line.
pub struct SolverPrintDimacs<'a, Cb: Callbacks> {
    s: &'a Solver<Cb>,
}

impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "v ")?;
        for (i, &val) in self.s.model.iter().enumerate() {
            if val == lbool::TRUE {
                write!(out, "{} ", i + 1)?;
            } else if val == lbool::FALSE {
                write!(out, "-{} ", i + 1)?;
            }
        }
        write!(out, "0")
    }
}

/// Configuration of a [`Solver`], checked at construction.
pub struct SolverOpts {
    /// The variable activity decay factor.
    pub var_decay: f64,
    /// The clause activity decay factor.
    pub clause_decay: f64,
    /// Use the Luby sequence for the outer restart schedule.
    pub luby_restart: bool,
    /// The fraction of wasted memory allowed before a GC is triggered.
    pub garbage_frac: f64,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            luby_restart: true,
            garbage_frac: 0.20,
        }
    }
}

impl SolverOpts {
    /// Check that the options are within their valid ranges.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
    }
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_luby() {
        let prefix: Vec<f64> = (0..15).map(|i| utils::luby(2.0, i)).collect();
        assert_eq!(
            prefix,
            vec![1., 1., 2., 1., 1., 2., 4., 1., 1., 2., 1., 1., 2., 4., 8.]
        );
    }

    #[test]
    fn test_opts_check() {
        assert!(SolverOpts::default().check());
        let bad = SolverOpts {
            var_decay: 1.5,
            ..SolverOpts::default()
        };
        assert!(!bad.check());
    }
}
