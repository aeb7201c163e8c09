//! Line-driven seed picker.
//!
//! One loop owns the lanes and the session. Stdin lines, search results and
//! recommend results all arrive over a single channel; network calls run on short
//! worker threads so the loop never blocks on them. Debounce deadlines bound how
//! long the loop waits for the next event.

use crate::client::{ApiClient, Transport};
use crate::errors::RequestError;
use crate::ledger::ShownIdLedger;
use crate::models::{FeedbackEvent, RecommendResponse, RecommendationItem, SearchResult};
use crate::search::SeedSearchController;
use crate::session::RecommendSession;
use anyhow::Result;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Instant;

enum Event {
    Line(String),
    InputClosed,
    SearchDone {
        lane: usize,
        seq: u64,
        results: Vec<SearchResult>,
    },
    RecommendDone(Result<RecommendResponse, RequestError>),
}

/// What a line of input asks for
#[derive(Debug, PartialEq)]
enum Command {
    Type { lane: usize, text: String },
    Pick { lane: usize, index: usize },
    Mode(String),
    Count(u32),
    Go,
    Feedback { event: FeedbackEvent, index: usize },
    Seeds,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (head, rest) = match line.trim_start().split_once(' ') {
        Some((head, rest)) => (head, rest),
        None => (line.trim(), ""),
    };

    // Lane text keeps its spacing; the lane itself trims when it searches
    if let Ok(slot) = head.parse::<usize>() {
        return (1..=3).contains(&slot).then(|| Command::Type {
            lane: slot - 1,
            text: rest.to_string(),
        });
    }

    let mut args = rest.split_whitespace();
    match head.to_lowercase().as_str() {
        "pick" => {
            let slot: usize = args.next()?.parse().ok()?;
            let choice: usize = args.next()?.parse().ok()?;
            if !(1..=3).contains(&slot) || choice == 0 {
                return None;
            }
            Some(Command::Pick {
                lane: slot - 1,
                index: choice - 1,
            })
        }
        "mode" => Some(Command::Mode(args.next()?.to_string())),
        "count" => args.next()?.parse().ok().map(Command::Count),
        "go" => Some(Command::Go),
        "like" | "dislike" | "play" | "open" => {
            let event: FeedbackEvent = head.parse().ok()?;
            let choice: usize = args.next()?.parse().ok()?;
            (choice > 0).then(|| Command::Feedback {
                event,
                index: choice - 1,
            })
        }
        "seeds" => Some(Command::Seeds),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <1-3> <text>       type into seed slot 1, 2 or 3");
    println!("  pick <slot> <n>    choose suggestion n for a slot");
    println!("  mode <m>           all, indie or mainstream");
    println!("  count <n>          how many recommendations to ask for");
    println!("  go                 get recommendations");
    println!("  like|dislike|play|open <n>   feedback on recommendation n");
    println!("  seeds              show the current seeds");
    println!("  quit");
}

/// Print recommendations as a numbered list
pub fn print_recommendations(items: &[RecommendationItem]) {
    if items.is_empty() {
        println!("No recommendations returned.");
        return;
    }
    for (i, item) in items.iter().enumerate() {
        let year_display = item.year.map(|y| format!(" [{y}]")).unwrap_or_default();
        let popularity_display = item
            .popularity
            .map(|p| format!(" | pop {p:.0}"))
            .unwrap_or_default();
        println!(
            "  {}. \"{}\" by {}{}{}",
            i + 1,
            item.title,
            item.artist,
            year_display,
            popularity_display
        );
        if let Some(reasons) = item.reasons.as_ref().filter(|r| !r.is_empty()) {
            println!("     why: {}", reasons.join("; "));
        }
        if let Some(url) = item.spotify_url.as_deref().filter(|u| !u.is_empty()) {
            println!("     {url}");
        }
    }
}

fn print_suggestions(lane: usize, results: &[SearchResult]) {
    if results.is_empty() {
        println!("Slot {}: no matches", lane + 1);
        return;
    }
    println!("Slot {} suggestions:", lane + 1);
    for (i, result) in results.iter().enumerate() {
        println!("  {}. {}", i + 1, result.display_label());
    }
}

fn spawn_stdin_reader(tx: Sender<Event>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

/// Run the picker until `quit` or end of input
pub fn run<T: Transport + 'static>(
    client: Arc<ApiClient<T>>,
    ledger: Arc<ShownIdLedger>,
    mut session: RecommendSession,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx.clone());

    let mut controller = SeedSearchController::default();
    print_help();

    loop {
        let event = match controller.next_deadline() {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => Some(event),
                Err(_) => break,
            },
        };

        match event {
            Some(Event::Line(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let Some(command) = parse_command(&line) else {
                    println!("Unrecognized command. Type 'help' for the list.");
                    continue;
                };
                if !handle_command(command, &mut controller, &mut session, &client, &ledger, &tx) {
                    break;
                }
            }
            Some(Event::InputClosed) => break,
            Some(Event::SearchDone { lane, seq, results }) => {
                if controller.apply_results(lane, seq, results) {
                    if let Some(state) = controller.lane(lane) {
                        print_suggestions(lane, state.results());
                    }
                }
            }
            Some(Event::RecommendDone(outcome)) => {
                session.complete(outcome, &ledger);
                match session.error() {
                    Some(message) => eprintln!("✗ {message}"),
                    None => print_recommendations(session.recommendations()),
                }
            }
            None => {}
        }

        for dispatch in controller.poll(Instant::now()) {
            let client = Arc::clone(&client);
            let tx = tx.clone();
            thread::spawn(move || {
                let results = client.search(&dispatch.query, dispatch.limit);
                let _ = tx.send(Event::SearchDone {
                    lane: dispatch.lane,
                    seq: dispatch.seq,
                    results,
                });
            });
        }
    }

    controller.teardown();
    Ok(())
}

/// Apply one command. Returns false once the user asks to quit.
fn handle_command<T: Transport + 'static>(
    command: Command,
    controller: &mut SeedSearchController,
    session: &mut RecommendSession,
    client: &Arc<ApiClient<T>>,
    ledger: &Arc<ShownIdLedger>,
    tx: &Sender<Event>,
) -> bool {
    match command {
        Command::Type { lane, text } => {
            controller.on_input(lane, &text, Instant::now());
        }
        Command::Pick { lane, index } => match controller.select(lane, index) {
            Some(_) => {
                if let Some(state) = controller.lane(lane) {
                    println!("Slot {} seed: {}", lane + 1, state.text());
                }
            }
            None => println!("Slot {} has no suggestion {}", lane + 1, index + 1),
        },
        Command::Mode(raw) => match raw.parse() {
            Ok(mode) => {
                session.mode = mode;
                println!("Mode: {mode}");
            }
            Err(e) => println!("{e}"),
        },
        Command::Count(count) => {
            session.count = count;
            println!("Count: {count}");
        }
        Command::Go => {
            if session.is_loading() {
                println!("A request is already running.");
                return true;
            }
            let Some(params) = session.begin(controller.seeds()) else {
                if let Some(message) = session.error() {
                    eprintln!("✗ {message}");
                }
                return true;
            };
            println!("Finding {} {} recommendations...", params.count, params.mode);
            let client = Arc::clone(client);
            let ledger = Arc::clone(ledger);
            let tx = tx.clone();
            thread::spawn(move || {
                let outcome = client.recommend(&params, &ledger);
                let _ = tx.send(Event::RecommendDone(outcome));
            });
        }
        Command::Feedback { event, index } => {
            let Some(item) = session.recommendations().get(index) else {
                println!("No recommendation {}", index + 1);
                return true;
            };
            if event == FeedbackEvent::OpenSpotify {
                match item.spotify_url.as_deref().filter(|u| !u.is_empty()) {
                    Some(url) => println!("{url}"),
                    None => println!("No Spotify link for \"{}\"", item.title),
                }
            }
            let track_id = item.id.clone();
            let client = Arc::clone(client);
            thread::spawn(move || client.send_feedback(&track_id, event));
        }
        Command::Seeds => {
            if !controller.has_seed() {
                println!("No seeds yet. Type into a slot with <1-3> <text>.");
            }
            for lane in 0..controller.lane_count() {
                let Some(state) = controller.lane(lane) else {
                    continue;
                };
                let kind = if state.is_loading() {
                    "searching"
                } else if state.committed().is_some() {
                    "picked"
                } else if state.seed().is_some() {
                    "typed"
                } else {
                    "empty"
                };
                println!("  {}. [{kind}] {}", lane + 1, state.text());
            }
        }
        Command::Help => print_help(),
        Command::Quit => return false,
    }
    true
}
