// CLI entry point: run one route search from a scenario file.
//
// Loads a scenario (world layers, agent, targets; see `scenario.rs`),
// optionally a `NavConfig` JSON file, runs the search and prints the route
// one node per line followed by a summary. With `--debug` the final open
// set, closed set and targets are printed as JSON after the route.
//
// Set `RUST_LOG=blockpath_engine=debug` to see the search summary log.
//
// Usage:
//   route_probe <SCENARIO> [OPTIONS]
//     --config <PATH>   Navigation config JSON (default: built-in values)
//     --debug           Print the search state snapshot as JSON

use blockpath_engine::config::NavConfig;
use blockpath_engine::scenario::Scenario;

struct Args {
    scenario: String,
    config: Option<String>,
    debug: bool,
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let config = match &args.config {
        Some(path) => read(path, "config").and_then(|json| {
            NavConfig::from_json(&json).map_err(|e| format!("invalid config {path}: {e}"))
        }),
        None => Ok(NavConfig::default()),
    };
    let config = config.unwrap_or_else(|e| fail(&e));

    let scenario = read(&args.scenario, "scenario")
        .and_then(|json| Scenario::from_json(&json).map_err(|e| format!("{}: {e}", args.scenario)))
        .unwrap_or_else(|e| fail(&e));

    let run = scenario
        .run(&config, args.debug)
        .unwrap_or_else(|e| fail(&format!("{}: {e}", args.scenario)));

    let Some(path) = run.path else {
        println!("no route: the agent has no valid start cell");
        return;
    };

    for (i, node) in path.nodes().iter().enumerate() {
        println!(
            "{i:3} {} {:?} g={:.2} malus={}",
            node.pos, node.path_type, node.g, node.cost_malus
        );
    }
    println!(
        "{} route to {}: {} nodes, reached = {}, {} from target",
        run.strategy,
        path.target(),
        path.node_count(),
        path.can_reach(),
        path.dist_to_target()
    );

    if let Some(debug) = path.debug() {
        match debug.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&format!("failed to serialise debug snapshot: {e}")),
        }
    }
}

fn read(path: &str, what: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {what} {path}: {e}"))
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let mut scenario = None;
    let mut config = None;
    let mut debug = false;
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config = Some(args.get(i).cloned().unwrap_or_else(|| fail("--config requires a path")));
            }
            "--debug" => debug = true,
            "--help" | "-h" => {
                println!("Usage: route_probe <SCENARIO> [--config <PATH>] [--debug]");
                std::process::exit(0);
            }
            other if other.starts_with("--") => fail(&format!("unknown option {other}")),
            other => scenario = Some(other.to_string()),
        }
        i += 1;
    }

    let Some(scenario) = scenario else {
        fail("usage: route_probe <SCENARIO> [--config <PATH>] [--debug]");
    };
    Args {
        scenario,
        config,
        debug,
    }
}
