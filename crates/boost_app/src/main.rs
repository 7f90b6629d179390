mod effects;
mod intake;
mod logging;
mod notify;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use boost_core::{
    diff, update, AppState, JobId, JobStatus, Msg, ProcessingMode, StatusSnapshot,
};
use boost_engine::{export_result, GatewaySettings};
use boost_logging::boost_info;
use clap::Parser;

use effects::EffectRunner;
use logging::LogDestination;
use notify::{AlertExecutor, AlwaysUnfocused, TerminalBadge, TerminalBell, TerminalNotifier};

#[derive(Parser, Debug)]
#[command(
    name = "boost",
    version,
    about = "AI photo enhancement from the command line"
)]
struct Cli {
    /// Image files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Transform to apply: enhance, upscale-2k, upscale-4k, upscale-8k,
    /// remove-background, remove-watermark, custom-edit, cartoon, anime,
    /// sketch, fantasy
    #[arg(long, default_value = "enhance")]
    mode: String,

    /// Directory for processed results
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Log to: terminal, file, both
    #[arg(long, default_value = "terminal")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(match cli.log.as_str() {
        "file" => LogDestination::File,
        "both" => LogDestination::Both,
        _ => LogDestination::Terminal,
    });

    let mode = parse_mode(&cli.mode)?;
    let settings = GatewaySettings {
        api_key: cli.api_key.clone(),
        ..GatewaySettings::default()
    };

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(settings, msg_tx)?;
    let mut app = App {
        state: AppState::new(),
        runner,
        msg_rx,
    };

    let candidates = cli
        .files
        .iter()
        .map(|path| intake::read_candidate(path))
        .collect::<Result<Vec<_>>>()?;
    app.dispatch(Msg::FilesDropped(candidates));
    if let Some(report) = app.state.intake_error() {
        eprintln!("{report}");
    }
    if app.state.job_count() == 0 {
        bail!("no usable images to process");
    }

    if mode != ProcessingMode::Enhance {
        let ids: Vec<JobId> = app.state.jobs().map(|job| job.id).collect();
        for job_id in ids {
            app.dispatch(Msg::ModeSelected { job_id, mode });
        }
    }

    if mode == ProcessingMode::CustomEdit {
        if app.state.job_count() != 1 {
            bail!("custom-edit works on exactly one image at a time");
        }
        let job_id = app.state.jobs().map(|job| job.id).next().unwrap_or_default();
        run_chat(&mut app, job_id)?;
    } else {
        app.dispatch(Msg::ProcessAllClicked);
    }

    app.pump_until(|state| !state.jobs().any(|job| job.status == JobStatus::Processing))?;
    report_results(&app.state, &cli.out)
}

struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl App {
    /// One turn of the state machine: feed the message through, hand the
    /// effects to the engine, and run any completion alerts.
    fn dispatch(&mut self, msg: Msg) {
        let before: StatusSnapshot = self.state.status_snapshot();
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = state;
        self.runner.enqueue(effects);

        let alerts = diff(&before, &self.state.status_snapshot());
        AlertExecutor {
            notifier: &TerminalNotifier,
            badge: &TerminalBadge,
            focus: &AlwaysUnfocused,
            sound: &TerminalBell,
        }
        .execute(&alerts);
        self.state.consume_dirty();
    }

    /// Feeds engine messages into the state machine until `done` holds.
    fn pump_until(&mut self, done: impl Fn(&AppState) -> bool) -> Result<()> {
        while !done(&self.state) {
            let msg = self
                .msg_rx
                .recv_timeout(Duration::from_secs(600))
                .context("engine stopped responding")?;
            self.dispatch(msg);
        }
        Ok(())
    }
}

fn run_chat(app: &mut App, job_id: JobId) -> Result<()> {
    app.dispatch(Msg::ProcessClicked { job_id });
    app.pump_until(|state| chat_idle(state, job_id))?;
    print_last_assistant_line(&app.state, job_id);

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            app.dispatch(Msg::ChatClosed { job_id });
            return Ok(());
        }
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => {
                app.dispatch(Msg::ChatClosed { job_id });
                return Ok(());
            }
            "/apply" => {
                let ready = app
                    .state
                    .view()
                    .jobs
                    .iter()
                    .find(|row| row.job_id == job_id)
                    .and_then(|row| row.chat.as_ref())
                    .and_then(|chat| chat.final_prompt.clone());
                match ready {
                    Some(prompt) => {
                        boost_info!("applying refined prompt: {prompt}");
                        app.dispatch(Msg::ApplyPromptClicked { job_id });
                        return Ok(());
                    }
                    None => {
                        println!("(no finalized prompt yet; keep refining)");
                        continue;
                    }
                }
            }
            _ => {
                app.dispatch(Msg::ChatMessageSubmitted {
                    job_id,
                    text: line.to_string(),
                });
                app.pump_until(|state| chat_idle(state, job_id))?;
                print_last_assistant_line(&app.state, job_id);
            }
        }
    }
}

fn chat_idle(state: &AppState, job_id: JobId) -> bool {
    state
        .view()
        .jobs
        .iter()
        .find(|row| row.job_id == job_id)
        .and_then(|row| row.chat.as_ref())
        .is_some_and(|chat| !chat.busy)
}

fn print_last_assistant_line(state: &AppState, job_id: JobId) {
    let view = state.view();
    let Some(chat) = view
        .jobs
        .iter()
        .find(|row| row.job_id == job_id)
        .and_then(|row| row.chat.as_ref())
    else {
        return;
    };
    if let Some(line) = chat.lines.last() {
        println!("assistant> {}", line.text);
    }
    if chat.final_prompt.is_some() {
        println!("(a finalized prompt is ready; type /apply to run it)");
    }
}

fn report_results(state: &AppState, out_dir: &std::path::Path) -> Result<()> {
    let mut failures = 0usize;
    for job in state.jobs() {
        match (job.status, job.result) {
            (JobStatus::Completed, Some(handle)) => {
                let blob = state
                    .blob(handle)
                    .context("completed job lost its result")?;
                let path = export_result(out_dir, &job.name, &blob.bytes)?;
                println!("{} -> {}", job.name, path.display());
            }
            _ => {
                failures += 1;
                let reason = job.error.as_deref().unwrap_or("not processed");
                eprintln!("{}: {reason}", job.name);
            }
        }
    }
    if failures > 0 {
        bail!("{failures} image(s) did not complete");
    }
    Ok(())
}

fn parse_mode(value: &str) -> Result<ProcessingMode> {
    let mode = match value {
        "enhance" => ProcessingMode::Enhance,
        "upscale-2k" => ProcessingMode::Upscale2K,
        "upscale-4k" => ProcessingMode::Upscale4K,
        "upscale-8k" => ProcessingMode::Upscale8K,
        "remove-background" => ProcessingMode::RemoveBackground,
        "remove-watermark" => ProcessingMode::RemoveWatermark,
        "custom-edit" => ProcessingMode::CustomEdit,
        "cartoon" => ProcessingMode::Cartoon,
        "anime" => ProcessingMode::Anime,
        "sketch" => ProcessingMode::Sketch,
        "fantasy" => ProcessingMode::Fantasy,
        other => bail!("unknown mode: {other}"),
    };
    Ok(mode)
}
