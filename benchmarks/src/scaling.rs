//! Integration cost against prime size.
//!
//! For one prime per decade, builds the model, integrates three periods and
//! runs the enhanced strategy, reporting integrator steps, wall time and
//! whether the prediction fell back to the exhaustive scan.
//!
//! Usage: scaling [--max-exponent=12] [--timeout-secs=30] [--json]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use prime_core::next_prime;
use sphere_oscillator::prediction::{Enhanced, PredictionStrategy};
use sphere_oscillator::{simulate, OscillatorModel, SimulationOptions};

#[derive(Debug, Serialize)]
struct ScalingRow {
    prime: u64,
    regime: &'static str,
    accepted_steps: u64,
    rejected_steps: u64,
    fn_evals: u64,
    simulate_ms: f64,
    predicted_next: u64,
    true_next: u64,
    fell_back: bool,
    predict_ms: f64,
}

/// Run a closure with a timeout. Returns None if timed out.
fn with_timeout<T: Send + 'static>(
    timeout: Duration,
    f: impl FnOnce() -> T + Send + 'static,
) -> Option<(T, Duration)> {
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();
    std::thread::spawn(move || {
        let result = f();
        let _ = tx.send(result);
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => Some((result, start.elapsed())),
        Err(_) => None,
    }
}

fn arg_value<T: std::str::FromStr>(args: &[String], key: &str) -> Option<T> {
    args.iter()
        .find_map(|a| a.strip_prefix(key))
        .and_then(|v| v.parse::<T>().ok())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let max_exponent: u32 = arg_value(&args, "--max-exponent=").unwrap_or(12).min(18);
    let timeout = Duration::from_secs(arg_value(&args, "--timeout-secs=").unwrap_or(30));
    let json = args.iter().any(|a| a == "--json");

    println!("================================================================");
    println!("  SCALING: integrator cost vs. prime size");
    println!("================================================================\n");

    let mut rng = StdRng::seed_from_u64(12345);
    let primes: Vec<u64> = (1..=max_exponent)
        .map(|k| {
            let lo = 10u64.pow(k);
            next_prime(rng.gen_range(lo..lo * 10))
        })
        .collect();

    println!(
        "  {:>20} {:>10} {:>8} {:>8} {:>12} {:>20} {:>9}",
        "p", "regime", "accept", "reject", "sim time", "enhanced", "fallback"
    );
    println!("  {}", "-".repeat(93));

    let mut rows = Vec::new();
    for &p in &primes {
        let model = match OscillatorModel::for_prime(p) {
            Ok(m) => m,
            Err(e) => {
                println!("  {:>20} model error: {}", p, e);
                continue;
            }
        };
        let regime = if model.damping_factor < model.natural_frequency {
            "under"
        } else {
            "over"
        };

        let sim_model = model.clone();
        let sim = with_timeout(timeout, move || {
            simulate(&sim_model, &SimulationOptions::default())
        });
        let (sim, sim_time) = match sim {
            Some((Ok(sim), elapsed)) => (sim, elapsed),
            Some((Err(e), _)) => {
                println!("  {:>20} {:>10} simulation failed: {}", p, regime, e);
                continue;
            }
            None => {
                println!("  {:>20} {:>10} TIMEOUT after {:?}", p, regime, timeout);
                continue;
            }
        };

        let predict_model = model.clone();
        let prediction = with_timeout(timeout, move || Enhanced::default().predict(&predict_model));
        let (result, predict_time) = match prediction {
            Some((Ok(r), elapsed)) => (r, elapsed),
            Some((Err(e), _)) => {
                println!("  {:>20} {:>10} prediction failed: {}", p, regime, e);
                continue;
            }
            None => {
                println!("  {:>20} {:>10} prediction TIMEOUT", p, regime);
                continue;
            }
        };

        println!(
            "  {:>20} {:>10} {:>8} {:>8} {:>12} {:>20} {:>9}",
            p,
            regime,
            sim.stats.accepted_steps,
            sim.stats.rejected_steps,
            format!("{:.2?}", sim_time),
            result.predicted_next,
            if result.fell_back { "yes" } else { "no" }
        );

        rows.push(ScalingRow {
            prime: p,
            regime,
            accepted_steps: sim.stats.accepted_steps,
            rejected_steps: sim.stats.rejected_steps,
            fn_evals: sim.stats.fn_evals,
            simulate_ms: sim_time.as_secs_f64() * 1e3,
            predicted_next: result.predicted_next,
            true_next: next_prime(p),
            fell_back: result.fell_back,
            predict_ms: predict_time.as_secs_f64() * 1e3,
        });
    }
    println!();

    let correct = rows.iter().filter(|r| r.predicted_next == r.true_next).count();
    let fallbacks = rows.iter().filter(|r| r.fell_back).count();
    println!(
        "  {} primes, {} fallbacks, enhanced matched the true successor {} times",
        rows.len(),
        fallbacks,
        correct
    );

    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Warning: failed to serialize results: {}", e),
        }
    }
}
