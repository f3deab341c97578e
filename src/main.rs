use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use vidfetch::downloader::{default_output_dir, ToolManager};
use vidfetch::{default_session, EngineConfig, EventSink, SessionState};

#[derive(Parser, Debug)]
#[command(name = "vidfetch", version, about = "Download a single online video with yt-dlp")]
struct Cli {
    /// Video URL
    #[arg(required_unless_present = "check_tools")]
    url: Option<String>,

    /// Destination folder (defaults to the Downloads directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Proxy URL passed to yt-dlp
    #[arg(long)]
    proxy: Option<String>,

    /// Do not open the destination folder after a successful download
    #[arg(long)]
    no_open: bool,

    /// Show the detected yt-dlp and ffmpeg, then exit
    #[arg(long)]
    check_tools: bool,
}

/// Terminal rendering of the session event stream
struct ConsoleSink {
    open_folder: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleSink {
    fn new(open_folder: bool) -> Self {
        Self { open_folder, bar: None }
    }

    fn bar(&mut self) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        })
    }

    /// Print above the bar while one is drawn
    fn line(&self, text: &str) {
        match &self.bar {
            Some(pb) if !pb.is_finished() => pb.println(text),
            _ => println!("{}", text),
        }
    }
}

impl EventSink for ConsoleSink {
    fn on_progress(&mut self, percent: u8) {
        self.bar().set_position(u64::from(percent));
    }

    fn on_status(&mut self, message: &str) {
        match &self.bar {
            Some(pb) if !pb.is_finished() => pb.set_message(message.to_string()),
            _ => println!("==> {}", message),
        }
    }

    fn on_log(&mut self, line: &str) {
        self.line(&format!("    {}", line));
    }

    fn on_finished(&mut self) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message("Download completed");
        }
    }

    fn on_error(&mut self, message: &str) {
        if let Some(pb) = &self.bar {
            pb.abandon();
        }
        eprintln!("Download failed: {}", message);
    }

    fn on_ready_to_open(&mut self, path: &Path) {
        if !self.open_folder {
            return;
        }
        if let Err(e) = open_folder(path) {
            self.on_log(&format!("Could not open folder: {}", e));
        }
    }
}

fn open_folder(path: &Path) -> Result<(), String> {
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(all(unix, not(target_os = "macos")))]
    let opener = "xdg-open";

    launch(opener, path)
}

/// Run the opener and wait so it is reaped. explorer exits non-zero even on
/// success, so only a failure to launch counts.
fn launch(opener: &str, path: &Path) -> Result<(), String> {
    let status = Command::new(opener)
        .arg(path)
        .status()
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    tracing::debug!(opener, %status, "folder opener exited");
    Ok(())
}

fn print_tools(config: &EngineConfig) {
    for tool in ToolManager::from_config(config).get_all_tools() {
        match (&tool.path, &tool.version) {
            (Some(path), version) => println!(
                "{:<8} {} ({})",
                tool.name,
                path.display(),
                version.as_deref().unwrap_or("unknown version")
            ),
            (None, _) => println!("{:<8} not found", tool.name),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    vidfetch::logging::init_tracing();
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if cli.proxy.is_some() {
        config = config.with_proxy(cli.proxy.clone());
    }

    if cli.check_tools {
        print_tools(&config);
        return ExitCode::SUCCESS;
    }

    let url = cli.url.unwrap_or_default();
    let folder = cli.output.unwrap_or_else(default_output_dir);

    let mut sink = ConsoleSink::new(!cli.no_open);
    let mut session = default_session(&config);

    match session.run(&url, &folder.to_string_lossy(), &mut sink).await {
        Ok(SessionState::Completed) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
