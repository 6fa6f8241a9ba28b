//! sphere-oscillator: build the oscillator for a prime, simulate it and guess
//! the next prime.
//!
//! Usage:
//!   sphere-oscillator [--mode=predict|model|simulate|resonance|analytical|accuracy|patterns
//!                            |quantum]
//!                     [--prime=7] [--strategy=basic|enhanced|differential]
//!                     [--primes=5,7,11 | --start=5 --count=10]
//!                     [--radius=1.0] [--charge=1.0] [--variant=self_consistent|independent]
//!                     [--samples=1000] [--duration=SECONDS] [--config=FILE.json] [--json]

use std::time::Instant;

use serde::Serialize;

use sphere_oscillator::{
    analytical_solution_from, analyze_patterns, compare_solutions, evaluate_accuracy,
    generate_primes, quantum_ratio_check, simulate, verify_resonance, EngineConfig,
    OscillatorError, Result, StrategyKind,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Predict,
    Model,
    Simulate,
    Resonance,
    Analytical,
    Accuracy,
    Patterns,
    Quantum,
}

impl std::str::FromStr for Mode {
    type Err = OscillatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "predict" => Ok(Mode::Predict),
            "model" => Ok(Mode::Model),
            "simulate" => Ok(Mode::Simulate),
            "resonance" => Ok(Mode::Resonance),
            "analytical" => Ok(Mode::Analytical),
            "accuracy" => Ok(Mode::Accuracy),
            "patterns" => Ok(Mode::Patterns),
            "quantum" => Ok(Mode::Quantum),
            other => Err(OscillatorError::InvalidInput(format!("unknown mode '{}'", other))),
        }
    }
}

struct CliConfig {
    mode: Mode,
    prime: u64,
    strategy: Option<StrategyKind>,
    primes: Vec<u64>,
    json: bool,
    engine: EngineConfig,
}

/// Value of `--key=value`, if present.
fn flag<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter().find_map(|a| a.strip_prefix(key))
}

fn parse_flag<T: std::str::FromStr>(args: &[String], key: &str) -> Result<Option<T>> {
    match flag(args, key) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| OscillatorError::InvalidInput(format!("bad value for {}{}", key, v))),
        None => Ok(None),
    }
}

fn parse_args() -> Result<CliConfig> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut engine = match flag(&args, "--config=") {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(radius) = parse_flag::<f64>(&args, "--radius=")? {
        engine.radius = radius;
    }
    if let Some(charge) = parse_flag::<f64>(&args, "--charge=")? {
        engine.charge = charge;
    }
    if let Some(variant) = flag(&args, "--variant=") {
        engine.variant = variant.parse()?;
    }
    if let Some(samples) = parse_flag::<usize>(&args, "--samples=")? {
        engine.simulation.sample_count = samples;
    }
    if let Some(duration) = parse_flag::<f64>(&args, "--duration=")? {
        engine.simulation.duration = Some(duration);
    }

    let mode = match flag(&args, "--mode=") {
        Some(m) => m.parse()?,
        None => Mode::Predict,
    };
    let strategy = match flag(&args, "--strategy=") {
        Some(s) => Some(s.parse()?),
        None => None,
    };

    let primes = if let Some(list) = flag(&args, "--primes=") {
        list.split(',')
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| OscillatorError::InvalidInput(format!("bad prime '{}'", s)))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        let start = parse_flag::<u64>(&args, "--start=")?.unwrap_or(5);
        let count = parse_flag::<usize>(&args, "--count=")?.unwrap_or(7);
        generate_primes(start, count)
    };

    Ok(CliConfig {
        mode,
        prime: parse_flag::<u64>(&args, "--prime=")?.unwrap_or(7),
        strategy,
        primes,
        json: args.iter().any(|a| a == "--json"),
        engine,
    })
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| OscillatorError::InvalidInput(format!("serialization failed: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn run(cli: &CliConfig) -> Result<()> {
    let engine = &cli.engine;
    match cli.mode {
        Mode::Predict => {
            let model = engine.model(cli.prime)?;
            let kinds: Vec<StrategyKind> = match cli.strategy {
                Some(kind) => vec![kind],
                None => StrategyKind::ALL.to_vec(),
            };
            let mut results = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let start = Instant::now();
                let result = engine.strategy(kind).predict(&model)?;
                results.push((result, start.elapsed()));
            }
            if cli.json {
                let values: Vec<_> = results.iter().map(|(r, _)| r).collect();
                return emit(&values);
            }
            println!("=== Next-prime prediction for p = {} ===", cli.prime);
            if !model.is_prime_input {
                println!("  note: {} is not prime", cli.prime);
            }
            for (r, elapsed) in &results {
                println!(
                    "  {:<12} -> {} (gap {}, confidence {:.3}, attempts {}{}) [{:?}]",
                    r.strategy.to_string(),
                    r.predicted_next,
                    r.gap,
                    r.confidence,
                    r.attempts,
                    if r.fell_back { ", fell back" } else { "" },
                    elapsed
                );
                if let Some(c) = &r.corrections {
                    println!(
                        "               corrections q={} d={} e={} s={} mod {} -> estimated gap {}",
                        c.quality,
                        c.damping,
                        c.energy,
                        c.stability,
                        c.residue_modulus,
                        c.estimated_gap
                    );
                }
            }
        }
        Mode::Model => {
            let model = engine.model(cli.prime)?;
            if cli.json {
                return emit(&model);
            }
            println!("=== {} ===", model);
            println!("  surface area      {:.6e}", model.surface_area);
            println!(
                "  frequency         {:.6e} Hz (ω = {})",
                model.frequency, model.angular_frequency
            );
            println!("  period            {:.6e} s", model.period);
            println!(
                "  R / L / C         {:.6e} / {:.6e} / {:.6e}",
                model.resistance, model.inductance, model.capacitance
            );
            println!(
                "  LC vs 1/(4p²)     {:.6e} vs {:.6e}",
                model.lc_product, model.resonance_theoretical
            );
            println!(
                "  γ / Q / τ         {:.6e} / {:.6e} / {:.6e}",
                model.damping_factor, model.quality_factor, model.time_constant
            );
            println!("  |Z|               {:.6e}", model.impedance);
            println!("  Q(0)              {:.6e}", model.charge_amplitude);
            println!(
                "  quantum ratio     {:.6e} (16πp = {:.6e})",
                model.quantum_ratio, model.theoretical_quantum_ratio
            );
        }
        Mode::Simulate => {
            let model = engine.model(cli.prime)?;
            let start = Instant::now();
            let sim = simulate(&model, &engine.simulation)?;
            if cli.json {
                return emit(&sim);
            }
            println!("=== Simulation for p = {} ===", cli.prime);
            println!("  samples           {}", sim.time.len());
            println!("  span              {:.6e} s", sim.time.last().copied().unwrap_or(0.0));
            println!("  mean energy       {:.6e}", sim.mean_energy);
            println!("  energy std dev    {:.6e}", sim.energy_std_dev);
            println!(
                "  steps             {} accepted, {} rejected, {} evaluations",
                sim.stats.accepted_steps, sim.stats.rejected_steps, sim.stats.fn_evals
            );
            println!("  time              {:?}", start.elapsed());
        }
        Mode::Resonance => {
            let model = engine.model(cli.prime)?;
            let report = verify_resonance(&model);
            if cli.json {
                return emit(&report);
            }
            println!("=== Resonance check for p = {} ===", cli.prime);
            println!(
                "  LC                {:.10e} (expected {:.10e})",
                report.lc_calculated, report.lc_theoretical
            );
            println!("  LC error          {:.3e}%", report.error_percentage);
            println!(
                "  ω₀                {:.10} (expected {})",
                report.natural_frequency, report.expected_frequency
            );
            println!("  frequency error   {:.3e}%", report.frequency_error_percentage);
            println!("  valid             {}", report.valid);
        }
        Mode::Analytical => {
            let model = engine.model(cli.prime)?;
            let sim = simulate(&model, &engine.simulation)?;
            let q0 = engine.simulation.initial_charge_for(&model);
            let solution = analytical_solution_from(&model, &sim.time, q0);
            let deviation = compare_solutions(&solution, &sim)?;
            if cli.json {
                return emit(&(solution, deviation));
            }
            println!("=== Analytical cross-check for p = {} ===", cli.prime);
            println!("  regime            {}", solution.regime);
            println!("  Q(0)              {:.6e}", q0);
            println!(
                "  γ / ω₀ / ωd       {:.6e} / {:.6e} / {:.6e}",
                solution.damping_factor, solution.natural_frequency, solution.damped_frequency
            );
            println!("  max |ΔQ|          {:.6e}", deviation.max_charge_error);
            println!("  max |ΔI|          {:.6e}", deviation.max_current_error);
            println!("  rms ΔQ            {:.6e}", deviation.rms_charge_error);
        }
        Mode::Accuracy => {
            let kinds: Vec<StrategyKind> = match cli.strategy {
                Some(kind) => vec![kind],
                None => StrategyKind::ALL.to_vec(),
            };
            let reports = kinds
                .into_iter()
                .map(|kind| evaluate_accuracy(&cli.primes, kind, engine))
                .collect::<Result<Vec<_>>>()?;
            if cli.json {
                return emit(&reports);
            }
            println!("=== Prediction accuracy over {:?} ===", cli.primes);
            for report in &reports {
                println!(
                    "  {:<12} {}/{} correct ({:.1}%), conf {:.3}, gap error {:.2}, {} fallbacks",
                    report.strategy.to_string(),
                    report.correct_predictions,
                    report.total_tests,
                    report.accuracy * 100.0,
                    report.average_confidence,
                    report.average_gap_error,
                    report.fallbacks
                );
            }
        }
        Mode::Patterns => {
            let report = analyze_patterns(&cli.primes, engine)?;
            if cli.json {
                return emit(&report);
            }
            println!("=== Gap patterns over {} primes ===", cli.primes.len());
            println!("  gaps              {:?}", report.gaps);
            for (gap, count) in &report.gap_frequencies {
                println!("  gap {:>3}           {}", gap, count);
            }
            println!("{}", "-".repeat(72));
            println!("{:>8} {:>12} {:>12} {:>12} {:>12} {:>12}", "p", "L", "C", "Q", "γ", "E/ħf₀");
            for e in &report.physics {
                println!(
                    "{:>8} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e}",
                    e.prime,
                    e.inductance,
                    e.capacitance,
                    e.quality_factor,
                    e.damping_factor,
                    e.energy_ratio
                );
            }
        }
        Mode::Quantum => {
            let entries = quantum_ratio_check(&cli.primes)?;
            if cli.json {
                return emit(&entries);
            }
            println!("=== Quantum ratio check ===");
            for e in &entries {
                println!(
                    "  p = {:<6} ratio {:.6e} vs 16πp {:.6e} ({:.2e}%)",
                    e.prime, e.ratio_calculated, e.ratio_theoretical, e.error_percentage
                );
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let result = parse_args().and_then(|cli| run(&cli));
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
