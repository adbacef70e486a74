//! USB / PCIe Bridge Simulator CLI.
//!
//! The main executable for the bridge model. It handles command-line
//! argument parsing, system assembly, and the simulation loop.
//!
//! # Usage
//!
//! The simulator can run in three modes:
//! 1. **Stream Mode**: Injects a raw host byte stream (`--file`) into the link
//!    and prints the frames the device sends back.
//! 2. **Demo Mode**: Runs the built-in Etherbone and TLP exchange (`--demo`).
//! 3. **Loopback Mode**: Runs the PHY alone with received words fed straight
//!    back to the host (`--loopback`).

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::process;

extern crate pcie_injector;

use pcie_injector::config::Config;
use pcie_injector::core::wire;
use pcie_injector::phy::LoopbackSystem;
use pcie_injector::sim::demo::{self, DemoReply};
use pcie_injector::sim::{loader, runner};
use pcie_injector::soc::System;
use pcie_injector::stats::SimStats;

/// Command-line arguments for the bridge simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "USB FIFO / PCIe TLP Bridge Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Raw host byte stream to inject into the link.
    #[arg(short, long)]
    file: Option<String>,

    /// Run the built-in Etherbone and TLP exchange.
    #[arg(long)]
    demo: bool,

    /// Tick limit, overriding `general.max_ticks`.
    #[arg(long)]
    ticks: Option<u64>,

    /// Run the link domain on its own thread.
    #[arg(long)]
    threaded: bool,

    /// Run the PHY loopback design instead of the full bridge.
    #[arg(long)]
    loopback: bool,

    /// Print the statistics as JSON instead of the text report.
    #[arg(long)]
    stats_json: bool,
}

/// Main entry point for the bridge simulator.
///
/// # Behavior
///
/// 1. **Configuration**: Parses command-line arguments and loads the TOML configuration file.
/// 2. **Initialization**: Assembles the link and system domains and registers crossbar ports.
/// 3. **Traffic**: Injects the host byte stream, the demo exchange, or loopback words.
/// 4. **Simulation Loop**: Ticks until the bridge is idle or the tick limit is reached.
/// 5. **Teardown**: Prints the received frames and the simulation statistics.
fn main() {
    let args = Args::parse();
    let config = Config::load(&args.config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });

    let level = if config.general.trace_enabled() {
        "trace"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let max_ticks = args.ticks.unwrap_or(config.general.max_ticks);

    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Trace:              {}", config.general.trace_enabled());
    println!("  Max Ticks:          {}", max_ticks);
    println!(
        "  Clock Ratio:        {}",
        config.general.system_ticks_per_link_tick
    );
    println!("Link:");
    println!("  FIFO Depth:         {}", config.link.fifo_depth);
    println!("  Read Time:          {}", config.link.read_time);
    println!("  Write Time:         {}", config.link.write_time);
    println!("Core:");
    println!("  Timeout:            {}", config.core.depacketizer_timeout);
    println!("  Max Payload:        {} words", config.core.max_payload_words);
    println!(
        "  Ports:              etherbone={} tlp={}",
        config.core.ports.etherbone, config.core.ports.tlp
    );
    println!("--------------------");

    if args.loopback {
        run_loopback(&args, &config, max_ticks);
        return;
    }

    let mut system = System::new(&config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });

    if args.demo {
        println!("[*] Demo Mode");
        match demo::run_demo(&mut system, &config, max_ticks) {
            Ok(replies) => {
                for reply in replies {
                    print_reply(&reply);
                }
            }
            Err(e) => {
                error!("{}", e);
                report(&system.stats(), args.stats_json);
                process::exit(1);
            }
        }
    } else if let Some(path) = args.file.as_deref() {
        println!("[*] Stream Mode");
        let words = loader::load_words(path).unwrap_or_else(|e| {
            eprintln!("\n[!] FATAL: {}", e);
            process::exit(1);
        });
        if args.threaded {
            let accepted = system.host_mut().write_words(&words);
            if accepted < words.len() {
                error!(
                    "host buffer holds {} of {} words; raise link.host_buffer_words",
                    accepted,
                    words.len()
                );
            }
            runner::run_threaded(&mut system, max_ticks);
        } else {
            runner::run_stream(&mut system, &words, max_ticks);
        }
        let received = system.host_mut().read_words();
        for packet in wire::deframe_all(&received) {
            print_reply(&demo::decode_reply(&config, packet));
        }
    } else {
        eprintln!("Error: No traffic specified.");
        eprintln!("Usage:");
        eprintln!("  Stream mode:    --file <stream.bin> [--threaded]");
        eprintln!("  Demo mode:      --demo");
        eprintln!("  Loopback mode:  --loopback --file <stream.bin>");
        process::exit(1);
    }

    print_endpoint(&mut system);
    info!("[*] Finished after {} link ticks", system.stats().link_ticks);
    report(&system.stats(), args.stats_json);
}

/// Runs the PHY loopback design on the `--file` stream.
fn run_loopback(args: &Args, config: &Config, max_ticks: u64) {
    println!("[*] Loopback Mode");
    let words = match args.file.as_deref() {
        Some(path) => loader::load_words(path).unwrap_or_else(|e| {
            eprintln!("\n[!] FATAL: {}", e);
            process::exit(1);
        }),
        None => (0..64).collect(),
    };
    let mut lb = LoopbackSystem::new(config);
    let accepted = lb.host.write_words(&words);
    lb.run_until_idle(max_ticks);
    let echoed = lb.host.read_words();
    println!(
        "[*] Echoed {} of {} words ({})",
        echoed.len(),
        accepted,
        if echoed[..] == words[..accepted] {
            "match"
        } else {
            "MISMATCH"
        }
    );
    report(&lb.stats, args.stats_json);
}

fn print_reply(reply: &DemoReply) {
    match reply {
        DemoReply::Etherbone(packet) => {
            for record in &packet.records {
                for (i, data) in record.writes.data.iter().enumerate() {
                    println!(
                        "[Etherbone] {:#010x} -> {:#010x}",
                        data,
                        record.writes.base_addr as usize + 4 * i
                    );
                }
            }
        }
        DemoReply::Tlp(record) => {
            println!(
                "[TLP] {} {:?} data={:08x?}",
                record.header.name(),
                record.header,
                record.data
            );
        }
        DemoReply::Raw(packet) => {
            println!("[Raw] dst={:#x} payload={:08x?}", packet.dst, packet.payload);
        }
    }
}

/// Drains and prints what the PCIe endpoint model collected.
fn print_endpoint(system: &mut System) {
    for record in system.soc.endpoint.take_received() {
        println!(
            "[Endpoint] {} {:?} data={:08x?}",
            record.header.name(),
            record.header,
            record.data
        );
    }
    let msis = system.soc.endpoint.take_msis();
    if !msis.is_empty() {
        println!("[Endpoint] MSI vectors: {:?}", msis);
    }
}

fn report(stats: &SimStats, json: bool) {
    if json {
        match stats.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("[!] could not serialize statistics: {}", e),
        }
    } else {
        stats.print();
    }
}
