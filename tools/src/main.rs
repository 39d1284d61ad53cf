//! pet-runner: headless host for the pet core.
//!
//! Plays the part of the active screen (owns the session and pumps it)
//! and of the persistence layer (SQLite save slot).
//!
//! Usage:
//!   pet-runner --session mochi --minutes 120 --db pet.db
//!   pet-runner --session mochi --offline-days 20
//!   pet-runner --session mochi --ipc-mode

use anyhow::Result;
use chrono::Duration;
use pet_core::{
    clock::{Clock, ManualClock, SystemClock},
    config::PetConfig,
    event::{EventLogEntry, PetEvent},
    growth::GrowthStage,
    session::PetSession,
    stats::{CareAction, PetStats},
    store::PetStore,
    types::{to_millis, ONE_DAY_MS},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Advance { minutes: u64 },
    Care { action: String },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    now_ms: i64,
    stage: GrowthStage,
    age_in_days: u64,
    size_multiplier: f64,
    stat_multiplier: f64,
    hour: u32,
    weather_icon: &'static str,
    sky_color: String,
    greeting: &'static str,
    is_night: bool,
    stats: PetStats,
    milestones: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let minutes = parse_arg(&args, "--minutes", 0u64);
    let offline_days = parse_arg(&args, "--offline-days", 0i64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let session_id = flag_value(&args, "--session").unwrap_or("pet-default").to_string();
    let db = flag_value(&args, "--db").unwrap_or("pet.db");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");

    if !ipc_mode {
        println!("pet-runner");
        println!("  session:   {session_id}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  minutes:   {minutes}");
        println!();
    }

    let config = PetConfig::load(data_dir)?;
    let store = PetStore::open(db)?;
    store.migrate()?;

    let clock = ManualClock::starting_at(SystemClock.now());
    let mut session = open_session(&store, &session_id, seed, config, &clock, offline_days)?;
    session.start(clock.now());

    if ipc_mode {
        run_ipc_loop(&mut session, &store, &clock)?;
    } else {
        advance(&mut session, &store, &clock, minutes)?;
        save(&session, &store, &clock)?;
        print_summary(&session, &clock);
    }

    session.stop();
    Ok(())
}

/// Resume the stored pet if there is one, otherwise hatch a new one.
fn open_session(
    store: &PetStore,
    session_id: &str,
    seed: u64,
    config: PetConfig,
    clock: &ManualClock,
    offline_days: i64,
) -> Result<PetSession> {
    let now = clock.now();
    match store.read_save(session_id)? {
        Some(json) => {
            let seed = store.session_seed(session_id)?;
            let mut saved: serde_json::Value =
                serde_json::from_str(&json).unwrap_or(serde_json::Value::Null);
            if offline_days > 0 {
                pretend_offline(&mut saved, offline_days);
            }
            let (session, events) =
                PetSession::resume(session_id.to_string(), seed, config, &saved, now);
            record_events(store, session_id, &events)?;
            Ok(session)
        }
        None => {
            store.insert_session(session_id, seed, env!("CARGO_PKG_VERSION"), to_millis(now))?;
            Ok(PetSession::new(session_id.to_string(), seed, config, now))
        }
    }
}

/// Push the saved growth checkpoint back in time, as if the game had
/// been closed for `days`.
fn pretend_offline(saved: &mut serde_json::Value, days: i64) {
    if let Some(ts) = saved
        .pointer_mut("/growth/lastCheckTimestamp")
        .filter(|v| v.is_i64())
    {
        let shifted = ts
            .as_i64()
            .unwrap_or_default()
            .saturating_sub(days.saturating_mul(ONE_DAY_MS));
        *ts = serde_json::Value::from(shifted);
        log::info!("runner: pretending the pet was left alone for {days} days");
    }
}

fn advance(
    session: &mut PetSession,
    store: &PetStore,
    clock: &ManualClock,
    minutes: u64,
) -> Result<()> {
    for _ in 0..minutes {
        let now = clock.advance(Duration::seconds(60));
        let events = session.pump(now);
        record_events(store, &session.session_id, &events)?;
    }
    Ok(())
}

fn save(session: &PetSession, store: &PetStore, clock: &ManualClock) -> Result<()> {
    let at = to_millis(clock.now());
    let snapshot = session.save();
    store.write_save(&session.session_id, at, &serde_json::to_string(&snapshot)?)?;
    record_events(store, &session.session_id, &[PetEvent::SessionSaved { at }])?;
    Ok(())
}

fn record_events(store: &PetStore, session_id: &str, events: &[PetEvent]) -> Result<()> {
    for event in events {
        if let PetEvent::StageEvolved { from, to, age_in_days, .. } = event {
            log::info!("runner: {session_id} grew from {from} to {to} (day {age_in_days})");
        }
        store.append_event(&EventLogEntry::from_event(session_id, event)?)?;
    }
    Ok(())
}

fn run_ipc_loop(session: &mut PetSession, store: &PetStore, clock: &ManualClock) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => {
                save(session, store, clock)?;
                break;
            }
            IpcCommand::Advance { minutes } => advance(session, store, clock, minutes)?,
            IpcCommand::Care { action } => match action.parse::<CareAction>() {
                Ok(action) => {
                    session.care(action);
                }
                Err(e) => log::warn!("runner: {e}"),
            },
            IpcCommand::Save => save(session, store, clock)?,
            IpcCommand::GetState => {}
        }
        let state = build_ui_state(session, clock);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(session: &PetSession, clock: &ManualClock) -> UiState {
    let growth = session.growth();
    let ambient = session.ambient();
    UiState {
        now_ms: to_millis(clock.now()),
        stage: growth.current_stage(),
        age_in_days: growth.age_in_days(),
        size_multiplier: growth.size_multiplier(),
        stat_multiplier: growth.stat_multiplier(),
        hour: ambient.current_hour(),
        weather_icon: ambient.weather_icon(),
        sky_color: ambient.sky_color().hex(),
        greeting: ambient.time_greeting(),
        is_night: ambient.is_night(),
        stats: session.stats(),
        milestones: session.milestones().unlocked().to_vec(),
    }
}

fn print_summary(session: &PetSession, clock: &ManualClock) {
    let s = build_ui_state(session, clock);

    println!("=== PET SUMMARY ===");
    println!("  session:        {}", session.session_id);
    println!("  stage:          {} (day {})", s.stage, s.age_in_days);
    println!("  size mult:      {:.2}", s.size_multiplier);
    println!("  decay mult:     {:.2}", s.stat_multiplier);
    println!("  milestones:     {}", s.milestones.join(", "));
    println!();
    println!("=== AMBIENT ===");
    println!("  {} {} (hour {})", s.greeting, s.weather_icon, s.hour);
    println!("  sky:            {}", s.sky_color);
    println!();
    println!("=== STATS ===");
    println!(
        "  hunger {:.0} | energy {:.0} | happiness {:.0} | cleanliness {:.0}",
        s.stats.hunger, s.stats.energy, s.stats.happiness, s.stats.cleanliness
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
