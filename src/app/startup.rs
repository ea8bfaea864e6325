//! Process startup: option resolution, logging, wiring, shutdown
//!
//! Everything here is peripheral to the sampling core: it builds the
//! loopback broker, starts the producer and the worker pool, waits for a
//! stop request and tears the pieces down in order. A failure before the
//! workers launch is fatal; after that, shutdown problems are diagnostics.

use std::io::IsTerminal;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use crate::app::cli::{Args, ConfigFile, ProbeOptions};
use crate::broker::{LoopbackBroker, LoopbackProducer, QueuePort};
use crate::core::logging::{init_logging, set_logging_level};
use crate::core::shutdown::wait_for_stop_request;
use crate::core::time::{Clock, SystemClock};
use crate::probe::{format_latency, ProbePool};

pub fn startup() {
    let started = Instant::now();
    let args = Args::parse();

    let config = match ConfigFile::load(args.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let options = match ProbeOptions::resolve(&args, &config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let use_color = (args.color || std::io::stdout().is_terminal()) && !args.no_color;
    let log_level = args.log_level.as_deref().or(config.log_level.as_deref());
    let log_format = args.log_format.as_deref().or(config.log_format.as_deref());
    let log_file = args.log_file.as_deref().or(config.log_file.as_deref());
    if let Err(e) = init_logging(log_level, log_format, log_file, use_color) {
        eprintln!("Error initialising logging: {}", e);
        process::exit(1);
    }
    set_logging_level(args.verbosity());

    log::info!(
        "mqprobe starting (built {}, {})",
        crate::BUILD_TIME,
        crate::GIT_HASH
    );

    if let Err(e) = run(&options, started) {
        log::error!("FATAL: {}", e);
        process::exit(1);
    }
}

fn run(options: &ProbeOptions, started: Instant) -> Result<(), Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let broker = Arc::new(LoopbackBroker::new(Arc::clone(&clock)));
    broker.define_queue(&options.queue);

    log::info!(
        "loopback producer on '{}' every {:?}",
        options.queue,
        options.produce_interval
    );
    let producer = LoopbackProducer::start(
        Arc::clone(&broker),
        options.queue.clone(),
        options.produce_interval,
    )?;

    log::info!(
        "starting {} worker{} (poll timeout {:?})",
        options.threads,
        if options.threads == 1 { "" } else { "s" },
        options.poll_timeout
    );
    let port: Arc<dyn QueuePort> = Arc::clone(&broker) as Arc<dyn QueuePort>;
    let handle = ProbePool::start(
        port,
        &options.queue,
        options.threads,
        options.poll_timeout,
        clock,
    )?;

    println!("Press Enter or Ctrl-C to stop");
    let cause = wait_for_stop_request()?;
    log::info!("stop requested ({})", cause);

    let summaries = handle.stop();
    broker.close();
    let produced = producer.stop();

    for summary in &summaries {
        match summary.max_latency {
            Some(max) => log::info!(
                "{}: {} messages, max latency {}",
                summary.worker_id,
                summary.messages_seen,
                format_latency(max)
            ),
            None => log::info!("{}: no messages observed", summary.worker_id),
        }
    }
    log::info!(
        "done; produced {} messages, up {:?}",
        produced,
        started.elapsed()
    );
    Ok(())
}
