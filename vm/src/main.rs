use crate::scenarios::{Fixtures, SCENARIOS};
use clap::Parser;
use fieldvm_runtime::{Runtime, RuntimeConfig, StaticInitPolicy};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

mod scenarios;

#[derive(Parser, Debug)]
#[command(version, about = "Runs put/get field checks against a fresh runtime")]
pub struct Args {
    #[arg(
        short = 's',
        long = "scenario",
        help = "Only run the named scenario; may be repeated (default: all)"
    )]
    pub scenarios: Vec<String>,
    #[arg(
        long = "eager-statics",
        help = "Create static storage when a class is loaded instead of on first access"
    )]
    pub eager_statics: bool,
    #[arg(long = "list", help = "Print scenario names and exit")]
    pub list: bool,
    #[arg(short = 'v', long = "verbose", help = "Log at debug level unless RUST_LOG is set")]
    pub verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        // runtime logs through the `log` facade
        let _ = tracing_log::LogTracer::init();
    }
}

fn create_runtime_configuration(args: &Args) -> RuntimeConfig {
    RuntimeConfig {
        static_init: if args.eager_statics {
            StaticInitPolicy::Eager
        } else {
            StaticInitPolicy::Lazy
        },
        ..Default::default()
    }
}

#[hotpath::main]
fn main() {
    let args = Args::parse();
    if cfg!(feature = "log-runtime-traces") || args.verbose {
        init_tracing(args.verbose);
    }
    debug!("Provided command line arguments: {:?}", args);

    if args.list {
        for scenario in SCENARIOS {
            println!("{}", scenario.name);
        }
        return;
    }

    if let Some(unknown) = args
        .scenarios
        .iter()
        .find(|name| !SCENARIOS.iter().any(|s| s.name == name.as_str()))
    {
        eprintln!("Unknown scenario: {unknown}");
        std::process::exit(2);
    }

    let runtime = Runtime::new(create_runtime_configuration(&args));
    let fixtures = match Fixtures::load(&runtime) {
        Ok(fixtures) => fixtures,
        Err(e) => {
            eprintln!("Error loading fixture classes: {}", runtime.pretty_error(e));
            std::process::exit(1);
        }
    };

    let (mut passed, mut failed) = (0usize, 0usize);
    for scenario in SCENARIOS
        .iter()
        .filter(|s| args.scenarios.is_empty() || args.scenarios.iter().any(|n| n == s.name))
    {
        match scenario.run(&runtime, &fixtures) {
            Ok(()) => {
                passed += 1;
                println!("PASS {}", scenario.name);
            }
            Err(failure) => {
                failed += 1;
                error!("{} failed: {}", scenario.name, failure);
                println!("FAIL {}: {}", scenario.name, failure);
            }
        }
    }
    info!("{passed} passed, {failed} failed");
    println!("{passed} passed, {failed} failed");

    if failed > 0 {
        std::process::exit(1);
    }
}
