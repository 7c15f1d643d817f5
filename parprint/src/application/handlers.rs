use std::path::{Path, PathBuf};

use parprint_core::dispatch::{Conversion, PrintDispatcher};
use parprint_core::domain::{AVAILABLE_QUEUES, DEFAULT_QUEUES};
use parprint_core::error::{ParprintError, Result};
use parprint_core::remote::local::LocalSession;
use parprint_core::remote::recording::{RecordedCall, RecordingSession, Transcript};
use parprint_core::remote::ssh::SshSession;
use parprint_core::{CommandRunner, FailurePolicy, OutputQueue, Pipeline, RunConfig, SessionFactory, SessionPool, plan};
use tracing::info;

use super::prompt;
use crate::presentation::cli::PrintArgs;

fn absolute(dir: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(dir)?)
}

fn run_config(args: &PrintArgs, queues: Vec<OutputQueue>) -> Result<RunConfig> {
    let dispatcher = PrintDispatcher {
        print_program: args.print_program.clone(),
        conversion: Conversion {
            program: args.converter.clone(),
            ..Conversion::default()
        },
    };
    let config = RunConfig::new(
        absolute(&args.docs.local_filepath)?,
        &args.local_dest,
        &args.remote_dest,
        queues,
    )
    .with_dispatcher(dispatcher);
    config.validate(&args.docs.files)?;
    Ok(config)
}

/// Open the pool, print everything, close the pool. A run error takes
/// precedence over a close error.
fn run_with<F: SessionFactory>(pipeline: &Pipeline, factory: &F, args: &PrintArgs) -> Result<()> {
    let mut pool = SessionPool::acquire(factory, args.sessions.max(1), args.session_cap, args.connect_width)?;
    let outcome = pipeline.run_pooled(pool.sessions_mut(), &args.docs.files);
    let closed = pool.close();
    outcome.and(closed)
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| ParprintError::Config("HOME is not set".into()))
}

pub fn handle_print(args: PrintArgs) -> Result<()> {
    let queues = OutputQueue::parse_list(&args.docs.printers)?;
    let config = run_config(&args, queues)?;
    let policy = if args.strict {
        FailurePolicy::Strict
    } else {
        FailurePolicy::Lenient
    };
    let pipeline = Pipeline::new(config, CommandRunner::to_stdout().with_policy(policy));

    if args.dry_run {
        let transcript = Transcript::new();
        let factory = || -> Result<RecordingSession> { Ok(RecordingSession::new(transcript.clone())) };
        run_with(&pipeline, &factory, &args)?;
        for call in transcript.calls() {
            match call {
                RecordedCall::Exec(cmd) => println!("$ {cmd}"),
                RecordedCall::Upload { local, remote } => println!("scp {} {remote}", local.display()),
                RecordedCall::Close => {}
            }
        }
        return Ok(());
    }

    if args.local {
        let home = home_dir()?;
        info!(home = %home.display(), "running remote steps locally");
        let factory = move || -> Result<LocalSession> { Ok(LocalSession::new(&home)) };
        return run_with(&pipeline, &factory, &args);
    }

    let creds = prompt::credentials(args.user.clone())?;
    info!(host = %args.host, port = args.port, user = %creds.username, "connecting");
    let factory = || SshSession::connect(&args.host, args.port, &creds);
    run_with(&pipeline, &factory, &args)
}

pub fn handle_plan(local_filepath: PathBuf, printers: Vec<String>, files: Vec<String>) -> Result<()> {
    let queues = OutputQueue::parse_list(&printers)?;
    let plans = plan(&absolute(&local_filepath)?, &files, &queues)?;
    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}

pub fn handle_queues() -> Result<()> {
    for q in AVAILABLE_QUEUES {
        let marker = if DEFAULT_QUEUES.contains(q) { "*" } else { " " };
        println!("{marker} {q}");
    }
    Ok(())
}
