use clap::{Parser, Subcommand};
use rxalert_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rxalert")]
#[command(about = "Personal medication tracker with low-supply alerts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked prescriptions (default)
    List,

    /// Search the drug database
    Search {
        term: String,
    },

    /// Search and add a result by number
    Pick {
        term: String,

        /// Result number as shown by `search`
        #[arg(long, default_value_t = 1)]
        result: usize,

        /// Strength/form number as shown by `search`
        #[arg(long, default_value_t = 1)]
        strength: usize,

        #[arg(long, default_value = "")]
        instructions: String,

        /// Pills in the bottle
        #[arg(long)]
        quantity: Option<u32>,
    },

    /// Add a prescription by name
    Add {
        /// Drug name, e.g. "Aspirin"
        drug: String,

        /// Strength/form, e.g. "81 mg Tab"
        #[arg(long)]
        strength: String,

        #[arg(long, default_value = "")]
        instructions: String,

        /// Pills in the bottle
        #[arg(long)]
        quantity: Option<u32>,

        /// RxNorm concept id
        #[arg(long)]
        rxcui: Option<String>,
    },

    /// Record one dose taken
    Take {
        id: String,
    },

    /// Start a new bottle
    Refill {
        id: String,
        quantity: u32,
    },

    /// Stop tracking a prescription
    Remove {
        id: String,
    },

    /// Approximate-match a possibly misspelled drug name
    Approx {
        term: String,
    },

    /// Show RxNorm properties of a concept
    Props {
        rxcui: String,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    rxalert_core::logging::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            if e.is_store_failure() {
                eprintln!("  Your change was NOT saved.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    let mut tracker = Tracker::open(Capabilities {
        search: Box::new(RxTermsClient::new(&config.search)?),
        store: Box::new(JsonFileStore::new(data_dir.join(config::INVENTORY_FILE))),
        alerts: Box::new(ConsoleAlerts::stdout()),
    })?;
    let default_quantity = config.inventory.default_quantity;

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => cmd_list(&tracker),
        Commands::Search { term } => cmd_search(&tracker, &term),
        Commands::Pick {
            term,
            result,
            strength,
            instructions,
            quantity,
        } => cmd_pick(
            &mut tracker,
            &term,
            result,
            strength,
            instructions,
            quantity.unwrap_or(default_quantity),
        ),
        Commands::Add {
            drug,
            strength,
            instructions,
            quantity,
            rxcui,
        } => {
            let rx = Prescription::new(
                &drug,
                &strength,
                instructions,
                quantity.unwrap_or(default_quantity),
                rxcui,
            )?;
            add_and_report(&mut tracker, rx)
        }
        Commands::Take { id } => cmd_take(&mut tracker, &id),
        Commands::Refill { id, quantity } => {
            let id = resolve_id(&tracker, &id)?;
            tracker.refill_prescription(&id, quantity)?;
            println!("✓ Prescription refilled: {} pills, 0 taken", quantity);
            Ok(())
        }
        Commands::Remove { id } => {
            let id = resolve_id(&tracker, &id)?;
            let name = tracker.get(&id).map(|p| p.name.clone());
            tracker.remove_prescription(&id)?;
            match name {
                Some(name) => println!("✓ Removed {}", name),
                None => println!("Nothing to remove for {}", id),
            }
            Ok(())
        }
        Commands::Approx { term } => cmd_approx(&tracker, &term),
        Commands::Props { rxcui } => cmd_props(&tracker, &rxcui),
    }
}

fn cmd_list(tracker: &Tracker) -> Result<()> {
    let prescriptions = tracker.prescriptions();
    if prescriptions.is_empty() {
        println!("No prescriptions added yet.");
        return Ok(());
    }

    println!("Your Prescriptions");
    for p in prescriptions {
        println!();
        println!("  {}", p.name);
        println!("    id: {}", p.id);
        if !p.instructions.is_empty() {
            println!("    {}", p.instructions);
        }
        let marker = if p.is_low() { "  ⚠ LOW" } else { "" };
        println!("    Remaining: {} / {}{}", p.remaining(), p.quantity, marker);
    }
    Ok(())
}

fn cmd_search(tracker: &Tracker, term: &str) -> Result<()> {
    let result = tracker.search_drugs(term);
    if result.items.is_empty() {
        println!("No results for {:?}.", term.trim());
        return Ok(());
    }

    println!(
        "Showing {} of {} matches for {:?}",
        result.items.len(),
        result.total,
        term.trim()
    );
    for (i, item) in result.items.iter().enumerate() {
        println!();
        println!("  {}. {}", i + 1, item.display_name);
        for (j, strength) in item.strengths.iter().enumerate() {
            match item.rxcui(j) {
                Some(code) => println!("       {}) {} [RXCUI {}]", j + 1, strength.trim(), code),
                None => println!("       {}) {}", j + 1, strength.trim()),
            }
        }
    }
    Ok(())
}

fn cmd_pick(
    tracker: &mut Tracker,
    term: &str,
    result: usize,
    strength: usize,
    instructions: String,
    quantity: u32,
) -> Result<()> {
    let found = tracker.search_drugs(term);
    let item = result
        .checked_sub(1)
        .and_then(|i| found.items.get(i))
        .ok_or_else(|| {
            Error::InvalidSelection(format!(
                "result {} not available ({} results for {:?})",
                result,
                found.items.len(),
                term
            ))
        })?;
    let strength_index = strength
        .checked_sub(1)
        .ok_or_else(|| Error::InvalidSelection("strength numbers start at 1".into()))?;

    let rx = Prescription::from_selection(item, strength_index, instructions, quantity)?;
    add_and_report(tracker, rx)
}

fn add_and_report(tracker: &mut Tracker, rx: Prescription) -> Result<()> {
    let (name, id) = (rx.name.clone(), rx.id.clone());
    tracker.add_prescription(rx)?;
    println!("✓ Prescription added: {}", name);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_take(tracker: &mut Tracker, query: &str) -> Result<()> {
    let id = resolve_id(tracker, query)?;
    let record = tracker.record_dose_taken(&id)?;
    let quantity = tracker.get(&id).map(|p| p.quantity).unwrap_or_default();
    println!("✓ Dose recorded for {}", record.name);
    println!("  Remaining: {} / {}", record.remaining, quantity);
    Ok(())
}

fn cmd_approx(tracker: &Tracker, term: &str) -> Result<()> {
    let candidates = match tracker.lookup().approximate_term(term) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Approximate match for {:?} failed: {}", term, e);
            Vec::new()
        }
    };
    if candidates.is_empty() {
        println!("No candidates for {:?}.", term.trim());
        return Ok(());
    }

    for c in candidates {
        println!(
            "  RXCUI {:<10} rank {:<3} score {:<6} {}",
            c.rxcui,
            c.rank.as_deref().unwrap_or("-"),
            c.score.as_deref().unwrap_or("-"),
            c.name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cmd_props(tracker: &Tracker, rxcui: &str) -> Result<()> {
    let props = match tracker.lookup().properties(rxcui) {
        Ok(p) => p,
        Err(e @ Error::InvalidSelection(_)) => return Err(e),
        Err(e) => {
            tracing::warn!("Properties lookup for {} failed: {}", rxcui, e);
            Vec::new()
        }
    };
    if props.is_empty() {
        println!("No properties found for RXCUI {}.", rxcui.trim());
        return Ok(());
    }

    for p in props {
        println!("  [{}] {}: {}", p.category, p.name, p.value);
    }
    Ok(())
}

/// Accept a full id or an unambiguous prefix of one.
fn resolve_id(tracker: &Tracker, query: &str) -> Result<String> {
    if tracker.get(query).is_some() {
        return Ok(query.to_string());
    }

    let matches: Vec<_> = tracker
        .prescriptions()
        .iter()
        .filter(|p| !query.is_empty() && p.id.starts_with(query))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Ok(query.to_string()),
        _ => Err(Error::InvalidSelection(format!(
            "id prefix {:?} matches {} prescriptions",
            query,
            matches.len()
        ))),
    }
}
