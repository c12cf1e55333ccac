use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use woodwind_designer_core::{
    document, weighted_error_norm, AppConfig, BisectionTuner, CentDeviationEvaluator,
    DesignerError, Evaluator, FminEvaluator, InstrumentCalculator, InstrumentTuner, LinearVTuner,
    TransmissionLineCalculator, TunerConfig, Tuning,
};

fn main() -> woodwind_designer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Evaluate {
            instrument,
            tuning,
            tuner,
            metric,
        } => run_evaluate(&config, &instrument, &tuning, tuner, metric),
        Commands::Predict {
            instrument,
            tuning,
            tuner,
            output,
        } => run_predict(&config, &instrument, &tuning, tuner, output.as_deref()),
        Commands::Impedance {
            instrument,
            tuning,
            fingering,
            from,
            to,
            steps,
        } => run_impedance(&config, &instrument, &tuning, fingering, from, to, steps),
    }
}

fn run_evaluate(
    config: &AppConfig,
    instrument: &Path,
    tuning: &Path,
    tuner: TunerKind,
    metric: Metric,
) -> woodwind_designer_core::Result<()> {
    tracing::info!(?instrument, ?tuning, ?tuner, ?metric, "evaluating tuning");

    let (calculator, tuning) = load(config, instrument, tuning)?;
    let tuner = tuner.build(config.tuner);
    let mut evaluator: Box<dyn Evaluator> = match metric {
        Metric::Fmin => Box::new(FminEvaluator::with_tuner(calculator, tuner)),
        Metric::Nominal => Box::new(CentDeviationEvaluator::with_tuner(calculator, tuner)),
    };

    let errors = evaluator.calculate_error_vector(&tuning.fingerings)?;
    for (fingering, error) in tuning.fingerings.iter().zip(&errors) {
        println!("{:<12} {:>+10.2} cents", fingering.label(), error);
    }
    println!(
        "weighted squared error: {:.3}",
        weighted_error_norm(&tuning.fingerings, &errors)
    );
    Ok(())
}

fn run_predict(
    config: &AppConfig,
    instrument: &Path,
    tuning: &Path,
    tuner: TunerKind,
    output: Option<&Path>,
) -> woodwind_designer_core::Result<()> {
    tracing::info!(?instrument, ?tuning, ?output, "predicting tuning");

    let (calculator, tuning) = load(config, instrument, tuning)?;
    let mut tuner = tuner.build(config.tuner);
    tuner.set_instrument(Arc::clone(calculator.instrument()));
    tuner.set_physical_parameters(Arc::clone(calculator.physical_parameters()));
    tuner.set_calculator(calculator);
    tuner.set_tuning(tuning);
    let predicted = tuner.predicted_tuning()?;

    match output {
        Some(path) => document::save_tuning(&predicted, path)?,
        None => {
            for fingering in &predicted.fingerings {
                let frequency = fingering
                    .note
                    .as_ref()
                    .and_then(|note| note.frequency)
                    .unwrap_or(f64::NAN);
                println!("{:<12} {:>10.2} Hz", fingering.label(), frequency);
            }
        }
    }
    Ok(())
}

fn run_impedance(
    config: &AppConfig,
    instrument: &Path,
    tuning: &Path,
    fingering: usize,
    from: f64,
    to: f64,
    steps: usize,
) -> woodwind_designer_core::Result<()> {
    tracing::info!(?instrument, fingering, from, to, steps, "tabulating impedance");

    let (calculator, tuning) = load(config, instrument, tuning)?;
    let fingering = tuning.fingerings.get(fingering).ok_or_else(|| {
        DesignerError::document(format!(
            "tuning has {} fingerings, no fingering {fingering}",
            tuning.fingerings.len()
        ))
    })?;

    let z0 = calculator.characteristic_impedance();
    let steps = steps.max(1);
    println!("{:>12} {:>14} {:>14}", "Hz", "Re(Z)/Z0", "Im(Z)/Z0");
    for step in 0..=steps {
        let frequency = from + (to - from) * step as f64 / steps as f64;
        let z = calculator.calc_z(frequency, fingering)? / z0;
        println!("{:>12.2} {:>14.6} {:>14.6}", frequency, z.re, z.im);
    }
    Ok(())
}

/// Loads both documents and prepares a calculator for them.
fn load(
    config: &AppConfig,
    instrument: &Path,
    tuning: &Path,
) -> woodwind_designer_core::Result<(Arc<dyn InstrumentCalculator>, Tuning)> {
    let instrument = document::load_instrument(instrument)?;
    let tuning = document::load_tuning(tuning)?;
    tuning.check_instrument(&instrument)?;

    let params = Arc::new(config.physical_parameters()?);
    let calculator = TransmissionLineCalculator::new(Arc::new(instrument), params)?;
    Ok((Arc::new(calculator), tuning))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Woodwind tuning prediction and evaluation", long_about = None)]
struct Cli {
    /// JSON file with environment and tuner settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every fingering of a tuning in cents.
    Evaluate {
        /// Instrument document (.xml or .json).
        instrument: PathBuf,
        /// Tuning document (.xml or .json).
        tuning: PathBuf,
        #[arg(long, value_enum, default_value_t = TunerKind::LinearV)]
        tuner: TunerKind,
        /// Which target frequency to score against.
        #[arg(long, value_enum, default_value_t = Metric::Fmin)]
        metric: Metric,
    },
    /// Predict the note of every fingering.
    Predict {
        instrument: PathBuf,
        tuning: PathBuf,
        #[arg(long, value_enum, default_value_t = TunerKind::LinearV)]
        tuner: TunerKind,
        /// Save the predicted tuning here instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tabulate the normalised input impedance of one fingering.
    Impedance {
        instrument: PathBuf,
        tuning: PathBuf,
        /// Zero-based index of the fingering in the tuning.
        #[arg(short, long)]
        fingering: usize,
        #[arg(long, default_value_t = 100.0)]
        from: f64,
        #[arg(long, default_value_t = 2000.0)]
        to: f64,
        #[arg(long, default_value_t = 38)]
        steps: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TunerKind {
    LinearV,
    Bisection,
}

impl TunerKind {
    fn build(self, config: TunerConfig) -> Box<dyn InstrumentTuner> {
        match self {
            TunerKind::LinearV => Box::new(LinearVTuner::with_config(config)),
            TunerKind::Bisection => Box::new(BisectionTuner::with_config(config)),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Metric {
    /// Lowest playable frequency of each note.
    Fmin,
    /// Nominal frequency of each note.
    Nominal,
}
