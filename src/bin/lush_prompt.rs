//! Demo binary exercising the composer against a real terminal, in the
//! spirit of `worktrunk`'s `wt statusline` subcommand: render once and
//! print PS1/PS2 to stdout so the library can be smoke-tested outside a
//! real shell integration.

use clap::Parser;
use lush_prompt::color::ColorCapability;
use lush_prompt::composer::Composer;
use lush_prompt::segment::SegmentRegistry;
use lush_prompt::theme::{RenderStyle, Theme};

#[derive(Parser)]
#[command(name = "lush-prompt", about = "Render a lush-shell prompt once and exit")]
struct Args {
    /// Theme style to render with.
    #[arg(long, value_enum, default_value = "plain")]
    style: StyleArg,

    /// Exit code the rendered prompt should reflect.
    #[arg(long, default_value_t = 0)]
    last_exit: i32,

    /// Print verbose [lp-trace] logging to stderr.
    #[arg(long)]
    verbose: bool,

    /// Assume truecolor terminal support.
    #[arg(long)]
    truecolor: bool,
}

#[derive(Clone, clap::ValueEnum)]
enum StyleArg {
    Plain,
    Powerline,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "off" }),
    )
    .init();

    let registry = SegmentRegistry::with_builtins();
    let mut theme = Theme::new("default");
    theme.set_enabled_segments(
        ["user", "directory", "git", "status", "jobs"].map(String::from),
    );
    theme.layout.style = match args.style {
        StyleArg::Plain => RenderStyle::Plain,
        StyleArg::Powerline => RenderStyle::Powerline,
    };
    theme.layout.ps1_format = r"\u@\h:\w\$ ".to_string();

    let mut composer = Composer::init(registry, vec![theme])?;
    composer.context_mut().last_exit_code = args.last_exit;
    composer.context_mut().color =
        if args.truecolor { ColorCapability::FULL } else { ColorCapability::NONE };

    let worker = lush_prompt::worker::Worker::start();
    let cwd = composer.context().cwd.clone();
    let (tx, rx) = std::sync::mpsc::channel();
    worker.submit_git_status(cwd, 2_000, move |resp| {
        let _ = tx.send(resp);
    })?;
    if let Ok(response) = rx.recv_timeout(std::time::Duration::from_secs(3))
        && let lush_prompt::worker::ResponsePayload::GitStatus(status) = response.payload
    {
        composer.context_mut().git_status = Some(status);
        composer.notify_ps1_changed();
    }

    let (ps1, ps2) = composer.render();
    println!("PS1: {ps1}");
    println!("PS2: {ps2}");
    Ok(())
}
