mod bootstrap;

use std::io::{IsTerminal, Write};

use anyhow::Result;
use sentinel_core::settings::{OutputFormat, Settings};
use sentinel_data::reader::load_transcripts;
use sentinel_runtime::gemini::GeminiClassifier;
use sentinel_runtime::orchestrator::{ScanOptions, ScanOrchestrator};
use sentinel_runtime::session::ScanSession;
use sentinel_ui::json::render_json;
use sentinel_ui::report::{SessionReport, TextRenderer};
use sentinel_ui::themes::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("SentinelChat v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!("App directory: {}", bootstrap::app_dir().display());

    let Some(path) = settings.path.as_deref() else {
        if settings.clear {
            println!("Saved configuration cleared.");
            return Ok(());
        }
        anyhow::bail!("no transcript given; pass an export file or a directory (see --help)");
    };

    let transcripts = load_transcripts(path)?;
    let orchestrator = ScanOrchestrator::new(ScanOptions::from(&settings));
    let mut sessions = orchestrator.load_sessions(&transcripts);

    if settings.analyze {
        match GeminiClassifier::from_settings(&settings) {
            Ok(classifier) => {
                tracing::info!(
                    "Analyzing {} with {} (batch size {})",
                    sentinel_core::formatting::pluralize(sessions.len(), "transcript"),
                    classifier.model(),
                    settings.batch_size()
                );
                let report = orchestrator
                    .run(&classifier, &mut sessions, shutdown_signal())
                    .await;
                if report.cancelled {
                    eprintln!("Scan interrupted; showing results gathered so far.");
                }
            }
            // Still render the unannotated report.
            Err(e) => eprintln!("{}", e),
        }
    }

    render(&settings, &sessions)
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl+C received; stopping scan");
}

fn render(settings: &Settings, sessions: &[ScanSession]) -> Result<()> {
    let reports: Vec<SessionReport<'_>> = sessions
        .iter()
        .map(|s| {
            SessionReport::new(s.file_name(), s.messages(), s.is_analyzed())
                .with_skipped_lines(s.dropped_lines().len())
                .with_last_error(s.last_error())
        })
        .collect();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match settings.output {
        OutputFormat::Json => writeln!(out, "{}", render_json(&reports)?)?,
        OutputFormat::Text => {
            let theme = if settings.theme == "auto" && !stdout.is_terminal() {
                Theme::plain()
            } else {
                Theme::from_name(&settings.theme)
            };
            let renderer = TextRenderer::new(&theme, usize::from(settings.width))
                .threats_only(settings.threats_only);
            for report in &reports {
                write!(out, "{}", renderer.render(report))?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
