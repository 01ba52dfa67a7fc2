/// deskview terminal viewer
///
/// Shows the desktop computer scene in the terminal. Scrolling the virtual
/// page turns the camera; a narrow terminal switches to the compact layout.
/// Usage:
///   deskview-terminal [MODEL] [--config FILE.json] [--log FILE]
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use deskview_core::SceneConfig;
use deskview_terminal::{ModelSource, TerminalApp};

struct Args {
    model: Option<PathBuf>,
    config: Option<PathBuf>,
    log: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        model: None,
        config: None,
        log: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a file")?.into()),
            "--log" => args.log = Some(iter.next().context("--log needs a file")?.into()),
            "-h" | "--help" => {
                println!("Usage: deskview-terminal [MODEL] [--config FILE.json] [--log FILE]");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            path => {
                if args.model.replace(path.into()).is_some() {
                    bail!("only one model path may be given");
                }
            }
        }
    }
    Ok(args)
}

/// The alternate screen owns stdout, so logs only go to a file
fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args()?;
    init_logging(args.log.as_ref())?;

    let config = match &args.config {
        Some(path) => {
            SceneConfig::from_file(path).with_context(|| format!("cannot load config {}", path.display()))?
        }
        None => SceneConfig::default(),
    };

    let source = match args.model {
        Some(path) => ModelSource::File(path),
        None => ModelSource::Builtin,
    };

    let mut app = TerminalApp::new(config, source).context("cannot query terminal size")?;
    app.run().context("viewer stopped")?;
    Ok(())
}
