/*****************************************************************************************[main.rs]
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

#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(not(feature = "logging"))]
mod env_logger {
    pub fn init() {}
}

#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

use clap::{App, Arg};
use flate2::bufread::GzDecoder;
use lodesat::{lbool, Callbacks, ProgressStatus, Solver, SolverInterface, SolverOpts};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::mem;
use std::process::exit;
use std::time::Instant;

mod system;

/// Signal routing. While the input is being parsed, a signal forces an
/// immediate exit; once solving starts the handlers are swapped for ones
/// that only request a stop, polled from `Callbacks::stop`.
#[cfg(unix)]
mod signals {
    use std::sync::atomic::{AtomicBool, Ordering};

    static STOP: AtomicBool = AtomicBool::new(false);

    extern "C" fn handle_exit(_signum: libc::c_int) {
        unsafe { libc::_exit(1) }
    }

    extern "C" fn handle_interrupt(_signum: libc::c_int) {
        STOP.store(true, Ordering::Relaxed);
    }

    pub fn install_exit_handlers() {
        unsafe {
            libc::signal(libc::SIGINT, handle_exit as libc::sighandler_t);
            libc::signal(libc::SIGXCPU, handle_exit as libc::sighandler_t);
        }
    }

    pub fn install_interrupt_handlers() {
        unsafe {
            libc::signal(libc::SIGINT, handle_interrupt as libc::sighandler_t);
            libc::signal(libc::SIGXCPU, handle_interrupt as libc::sighandler_t);
        }
    }

    pub fn stop_requested() -> bool {
        STOP.load(Ordering::Relaxed)
    }
}

#[cfg(not(unix))]
mod signals {
    pub fn install_exit_handlers() {}
    pub fn install_interrupt_handlers() {}
    pub fn stop_requested() -> bool {
        false
    }
}

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

/// Printing callbacks, also enforcing the CPU and memory limits.
struct CB {
    verbosity: i32,
    resource: system::ResourceMeasure,
    cpu_lim: Option<f64>,
    mem_lim: Option<f64>,
}

impl CB {
    fn new(verbosity: i32, cpu_lim: Option<f64>, mem_lim: Option<f64>) -> Self {
        CB {
            verbosity,
            resource: system::ResourceMeasure::new(),
            cpu_lim,
            mem_lim,
        }
    }
}

impl Callbacks for CB {
    fn on_start(&mut self) {
        if self.verbosity >= 1 {
            println!(
                "c {:<12}{:<12}{:<12}{:<12}{:<12}{:<14}{:<12}{:<10}",
                "restarts",
                "conflicts",
                "decisions",
                "avg res",
                "reduceDB",
                "avg |learnt|",
                "removed",
                "progress"
            );
        }
    }

    fn on_progress<F>(&mut self, f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        if self.verbosity >= 1 {
            let p = f();
            println!(
                "c {:<12}{:<12}{:<12}{:<12}{:<12}{:<14.1}{:<12}{:<10.3}",
                p.restarts,
                p.conflicts,
                p.decisions,
                p.avg_resolutions,
                p.n_reduce_db,
                p.avg_learnt_len,
                p.removed_clauses,
                p.progress_estimate
            );
        }
    }

    fn on_gc(&mut self, old: usize, new: usize) {
        if self.verbosity >= 2 {
            println!(
                "c Garbage collection: {:12} bytes => {:12} bytes",
                old, new
            );
        }
    }

    fn on_result(&mut self, _: lbool) {
        if self.verbosity >= 1 {
            println!("c");
        }
    }

    fn stop(&self) -> bool {
        if signals::stop_requested() {
            return true;
        }
        if let Some(max_cpu) = self.cpu_lim {
            if self.resource.cpu_time() > max_cpu {
                return true;
            }
        }
        if let Some(max_mem) = self.mem_lim {
            if system::mem_used() > max_mem {
                return true;
            }
        }
        false
    }
}

type MSolver = Solver<CB>; // specialized solver

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("lodesat")
        .version("0.1.0")
        .about("CDCL SAT solver with Glucose-style adaptive restarts")
        .arg(Arg::with_name("input-file"))
        .arg(Arg::with_name("result-output-file"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .help("Verbosity level (0=silent, 1=some, 2=more)")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("Limit on CPU time allowed in seconds")
                .default_value("-1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("mem-lim")
                .long("mem-lim")
                .help("Limit on memory usage in megabytes")
                .default_value("-1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("var-decay")
                .long("var-decay")
                .help("The variable activity decay factor")
                .default_value("0.95")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("clause-decay")
                .long("cla-decay")
                .help("The clause activity decay factor")
                .default_value("0.999")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("luby")
                .long("luby")
                .conflicts_with("no-luby")
                .help("Use the Luby restart sequence [default]"),
        )
        .arg(
            Arg::with_name("no-luby")
                .long("no-luby")
                .help("Use the geometric restart sequence instead of Luby"),
        )
        .arg(
            Arg::with_name("garbage-frac")
                .long("gc-frac")
                .help("The fraction of wasted memory allowed before a garbage collection is triggered")
                .default_value("0.20")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("is-strict")
                .long("strict")
                .help("Enforce the clause count declared in the DIMACS header"),
        )
        .get_matches();

    let mut solver_opts = SolverOpts::default();
    solver_opts.var_decay = matches
        .value_of("var-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.var_decay);
    solver_opts.clause_decay = matches
        .value_of("clause-decay")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.clause_decay);
    solver_opts.luby_restart = !matches.is_present("no-luby");
    solver_opts.garbage_frac = matches
        .value_of("garbage-frac")
        .and_then(|s| s.parse().ok())
        .unwrap_or(solver_opts.garbage_frac);

    if !solver_opts.check() {
        eprintln!("Invalid option value");
        exit(1);
    }

    let input_file = matches.value_of("input-file");
    let result_output_file = matches.value_of("result-output-file");
    let verbosity = matches
        .value_of("verbosity")
        .unwrap()
        .parse::<i32>()
        .unwrap_or(0);
    if verbosity < 0 || verbosity > 2 {
        eprintln!(
            "ERROR! value <{}> is out of range for option \"verb\".",
            verbosity
        );
        exit(1);
    }
    let is_strict = matches.is_present("is-strict");
    let cpu_lim = matches
        .value_of("cpu-lim")
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|x| *x > 0.);
    let mem_lim = matches
        .value_of("mem-lim")
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|x| *x > 0.);

    // use handlers that forcibly quit until the solver is able to respond
    // to interrupts
    signals::install_exit_handlers();

    let cb = CB::new(verbosity, cpu_lim, mem_lim);
    let mut solver = Solver::new(solver_opts, cb);

    let initial_time = Instant::now();

    if let Some(input_file) = input_file {
        debug!("solve file {}", input_file);
        let file = BufReader::new(File::open(input_file)?);
        read_input_autogz(file, &mut solver, is_strict)?;
    } else {
        println!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut solver, is_strict)?;
    }

    let mut resfile = if let Some(result_output_file) = result_output_file {
        Some(BufWriter::new(File::create(result_output_file)?))
    } else {
        None
    };

    if solver.cb().verbosity > 0 {
        println!("c Number of variables:  {:12}", solver.num_vars());
        println!("c Number of clauses:    {:12}", solver.num_clauses());
        let duration = Instant::now() - initial_time;
        println!(
            "c Parse time:           {:9}.{:02} s",
            duration.as_secs(),
            duration.subsec_nanos() / 10_000_000
        );
        println!("c");
    }

    // change to handlers that only notify the solver, letting it terminate
    // voluntarily
    signals::install_interrupt_handlers();

    let ret = solver.solve_limited(&[]);

    if solver.cb().verbosity > 0 {
        solver.print_stats();
        println!("c CPU time              : {:.3} s", resource.cpu_time());
    }

    if ret == lbool::TRUE {
        println!("s SATISFIABLE");
        println!("{}", solver.dimacs_model());
    } else if ret == lbool::FALSE {
        println!("s UNSATISFIABLE");
    } else {
        println!("s INDETERMINATE");
    }

    if let Some(resfile) = resfile.as_mut() {
        if ret == lbool::TRUE {
            writeln!(resfile, "s SAT")?;
            writeln!(resfile, "{}", solver.dimacs_model())?;
        } else if ret == lbool::FALSE {
            writeln!(resfile, "s UNSAT")?;
        } else {
            writeln!(resfile, "s INDET")?;
        }
        resfile.flush()?;
    }
    mem::drop(resfile);

    let exitcode = if ret == lbool::TRUE {
        10
    } else if ret == lbool::FALSE {
        20
    } else {
        0
    };

    if !cfg!(debug_assertions) {
        // (faster than "return", which will invoke the destructor for 'Solver')
        exit(exitcode);
    }

    Ok(exitcode)
}

fn read_input_autogz<R: BufRead>(
    mut input: R,
    solver: &mut MSolver,
    is_strict: bool,
) -> io::Result<()> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        read_input(BufReader::new(GzDecoder::new(input)), solver, is_strict)
    } else {
        read_input(input, solver, is_strict)
    }
}

fn read_input<R: BufRead>(mut input: R, solver: &mut MSolver, is_strict: bool) -> io::Result<()> {
    lodesat::dimacs::parse(&mut input, solver, is_strict)?;
    Ok(())
}
