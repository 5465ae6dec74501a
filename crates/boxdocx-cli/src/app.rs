//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use log::LevelFilter;

use boxdocx_ast::{validate_boxnote, BoxNote};
use boxdocx_core::{build_image_mapping, HtmlMapper, LocalImageResolver};
use boxdocx_ooxml::{DocxWriter, HtmlReconstructor};

use crate::config::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "boxdocx")]
#[command(author, version, about = "Convert BoxNote files to Word documents", long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one BoxNote file to DOCX
    Convert {
        /// Input BoxNote file
        input: PathBuf,

        /// Output DOCX file (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for images (default: the output directory)
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Keep the intermediate HTML next to the output
        #[arg(long)]
        keep_html: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert every BoxNote file under a directory
    Batch {
        /// Directory searched recursively for *.boxnote files
        #[arg(default_value = ".")]
        input: PathBuf,

        /// Directory for images (default: next to each output)
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the intermediate HTML only
    Html {
        /// Input BoxNote file
        input: PathBuf,

        /// Output HTML file (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for images (default: the output directory)
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check that a file is a well-formed BoxNote
    Check {
        /// Input BoxNote file
        input: PathBuf,
    },
}

/// Result of one successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub output: PathBuf,
    /// Kept intermediate HTML, if requested
    pub html: Option<PathBuf>,
    /// Images embedded in the DOCX
    pub images: usize,
    /// Mapping and reconstruction warnings
    pub warnings: usize,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            assets_dir,
            keep_html,
            config,
        } => {
            let settings = load_settings(config.as_deref(), parent_dir(&input))?;
            convert_command(
                &input,
                output.as_deref(),
                assets_dir.as_deref(),
                keep_html,
                &settings,
            )?;
        }
        Commands::Batch {
            input,
            assets_dir,
            config,
        } => {
            let settings = load_settings(config.as_deref(), &input)?;
            let summary = batch_command(&input, assets_dir.as_deref(), &settings)?;
            if !summary.failed.is_empty() {
                anyhow::bail!(
                    "{} of {} conversions failed",
                    summary.failed.len(),
                    summary.total()
                );
            }
        }
        Commands::Html {
            input,
            output,
            assets_dir,
            config,
        } => {
            let settings = load_settings(config.as_deref(), parent_dir(&input))?;
            html_command(&input, output.as_deref(), assets_dir.as_deref(), &settings)?;
        }
        Commands::Check { input } => {
            check_command(&input)?;
        }
    }

    Ok(())
}

/// Set up `env_logger` for the boxdocx crates
///
/// `RUST_LOG` still applies to everything else.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .filter_module("boxdocx_ast", level)
        .filter_module("boxdocx_core", level)
        .filter_module("boxdocx_ooxml", level)
        .filter_module("boxdocx_cli", level)
        .format_timestamp(None)
        .try_init();
}

/// Execute the convert command
pub fn convert_command(
    input: &Path,
    output: Option<&Path>,
    assets_dir: Option<&Path>,
    keep_html: bool,
    settings: &Settings,
) -> Result<ConversionReport> {
    println!("boxdocx v{}", crate::VERSION);
    println!("Converting: {}", input.display());

    if !input.is_file() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let output_path = match output {
        Some(p) if p.extension().is_some() => p.to_path_buf(),
        Some(p) => p.with_extension("docx"),
        None => default_output(input, "docx"),
    };
    let assets_dir = match assets_dir {
        Some(dir) => dir.to_path_buf(),
        None => parent_dir(&output_path).to_path_buf(),
    };
    fs::create_dir_all(&assets_dir)
        .with_context(|| format!("Failed to create assets directory: {}", assets_dir.display()))?;

    // Stage 1: BoxNote to HTML
    let note = load_note(input)?;
    let (html, map_warnings) = render_html(&note, input, &assets_dir, settings);

    // The HTML lives in a temporary file for the duration of the conversion
    let mut temp_html = tempfile::Builder::new()
        .prefix("boxdocx_")
        .suffix(".html")
        .tempfile_in(&assets_dir)
        .with_context(|| format!("Failed to create temporary HTML in {}", assets_dir.display()))?;
    temp_html
        .write_all(html.as_bytes())
        .context("Failed to write temporary HTML")?;
    log::debug!("Intermediate HTML: {}", temp_html.path().display());

    // Stage 2: HTML to DOCX
    let html = fs::read_to_string(temp_html.path()).context("Failed to read temporary HTML")?;
    let mut reconstructor =
        HtmlReconstructor::new(settings.docx.clone()).with_assets_dir(&assets_dir);
    let mut doc = reconstructor
        .reconstruct(&html)
        .with_context(|| format!("Failed to convert HTML for {}", input.display()))?;
    if doc.title.is_none() {
        doc.title = Some(clean_stem(input));
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    DocxWriter::write_to_file(&doc, &settings.docx, &output_path)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;

    let html_path = if keep_html {
        let target = output_path.with_extension("html");
        fs::copy(temp_html.path(), &target)
            .with_context(|| format!("Failed to keep HTML at {}", target.display()))?;
        println!("  HTML: {}", target.display());
        Some(target)
    } else {
        None
    };

    let report = ConversionReport {
        output: output_path,
        html: html_path,
        images: doc.media.len(),
        warnings: map_warnings + reconstructor.warnings().len(),
    };

    println!("  Output: {}", report.output.display());
    println!("  Images: {}", report.images);
    if report.warnings > 0 {
        println!("  Warnings: {} (see log)", report.warnings);
    }

    Ok(report)
}

/// Execute the batch command
///
/// Every `*.boxnote` under `dir` is converted in path order. A failure is
/// recorded and the batch moves on.
pub fn batch_command(dir: &Path, assets_dir: Option<&Path>, settings: &Settings) -> Result<BatchSummary> {
    if !dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", dir.display());
    }

    let pattern = format!("{}/**/*.boxnote", dir.display());
    let mut inputs = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("Invalid search pattern: {}", pattern))? {
        match entry {
            Ok(path) => inputs.push(path),
            Err(e) => log::warn!("Skipping unreadable path: {}", e),
        }
    }
    inputs.sort();
    log::info!("Found {} BoxNote file(s) in {}", inputs.len(), dir.display());

    let mut summary = BatchSummary::default();
    for input in inputs {
        match convert_command(&input, None, assets_dir, false, settings) {
            Ok(report) => summary.converted.push(report.output),
            Err(e) => {
                log::error!("Failed to convert {}: {:#}", input.display(), e);
                summary.failed.push((input, format!("{:#}", e)));
            }
        }
    }

    println!();
    println!("Batch complete!");
    println!("  Total: {}", summary.total());
    println!("  Converted: {}", summary.converted.len());
    println!("  Failed: {}", summary.failed.len());
    for (path, error) in &summary.failed {
        println!("    {}: {}", path.display(), error);
    }

    Ok(summary)
}

/// Execute the html command
pub fn html_command(
    input: &Path,
    output: Option<&Path>,
    assets_dir: Option<&Path>,
    settings: &Settings,
) -> Result<PathBuf> {
    if !input.is_file() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => default_output(input, "html"),
    };
    let assets_dir = match assets_dir {
        Some(dir) => dir.to_path_buf(),
        None => parent_dir(&output_path).to_path_buf(),
    };

    let note = load_note(input)?;
    let (html, _) = render_html(&note, input, &assets_dir, settings);
    fs::write(&output_path, html)
        .with_context(|| format!("Failed to write HTML file: {}", output_path.display()))?;
    println!("Created: {}", output_path.display());

    Ok(output_path)
}

/// Execute the check command
pub fn check_command(input: &Path) -> Result<()> {
    let bytes =
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    if !validate_boxnote(&text) {
        anyhow::bail!(
            "{} is not a well-formed BoxNote (expected {{\"doc\": {{\"content\": [...]}}}})",
            input.display()
        );
    }

    let note = BoxNote::parse(&text);
    println!("{}: ok", input.display());
    println!("  {} top-level nodes", note.content.len());
    println!("  {} image reference(s)", note.collect_image_sources().len());
    Ok(())
}

fn load_note(input: &Path) -> Result<BoxNote> {
    let bytes =
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let note = BoxNote::parse_bytes(&bytes);
    if note.was_repaired() {
        log::info!("{} needed repair: {:?}", input.display(), note.outcome);
    }
    Ok(note)
}

/// Map a note to HTML, resolving images into `assets_dir/images`
///
/// Returns the HTML and the number of mapping warnings.
fn render_html(note: &BoxNote, input: &Path, assets_dir: &Path, settings: &Settings) -> (String, usize) {
    let mut resolver = LocalImageResolver::new(assets_dir)
        .with_search_dirs(settings.images.search_dirs.iter().cloned())
        .with_search_dir(parent_dir(input));
    let images = build_image_mapping(note, &mut resolver);

    let mut mapper = HtmlMapper::with_images(images);
    let html = mapper.render_document(&note.content);
    (html, mapper.warnings().len())
}

/// `<dir>/<name>.<ext>` beside `input`, without a doubled `.boxnote`
fn default_output(input: &Path, ext: &str) -> PathBuf {
    parent_dir(input).join(format!("{}.{}", clean_stem(input), ext))
}

fn clean_stem(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    stem.trim_end_matches(".boxnote").to_string()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_convert() {
        let args = vec!["boxdocx", "convert", "notes.boxnote"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Convert {
                input,
                output,
                assets_dir,
                keep_html,
                config,
            } => {
                assert_eq!(input, PathBuf::from("notes.boxnote"));
                assert!(output.is_none());
                assert!(assets_dir.is_none());
                assert!(!keep_html);
                assert!(config.is_none());
            }
            _ => panic!("Expected Convert command"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_convert_all_options() {
        let args = vec![
            "boxdocx",
            "convert",
            "notes.boxnote",
            "-o",
            "out/final.docx",
            "--assets-dir",
            "assets",
            "--keep-html",
            "--config",
            "custom.toml",
            "-v",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Convert {
                output,
                assets_dir,
                keep_html,
                config,
                ..
            } => {
                assert_eq!(output, Some(PathBuf::from("out/final.docx")));
                assert_eq!(assets_dir, Some(PathBuf::from("assets")));
                assert!(keep_html);
                assert_eq!(config, Some(PathBuf::from("custom.toml")));
            }
            _ => panic!("Expected Convert command"),
        }
    }

    #[test]
    fn test_cli_parse_batch_default_dir() {
        let cli = Cli::try_parse_from(vec!["boxdocx", "batch"]).unwrap();
        match cli.command {
            Commands::Batch { input, .. } => assert_eq!(input, PathBuf::from(".")),
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_cli_parse_html_and_check() {
        let cli = Cli::try_parse_from(vec!["boxdocx", "html", "a.boxnote", "-o", "a.html"]).unwrap();
        assert!(matches!(cli.command, Commands::Html { output: Some(_), .. }));

        let cli = Cli::try_parse_from(vec!["boxdocx", "check", "a.boxnote"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(vec!["boxdocx", "convert"]).is_err());
    }

    #[test]
    fn test_default_output_strips_boxnote() {
        assert_eq!(
            default_output(Path::new("dir/Plan.boxnote"), "docx"),
            PathBuf::from("dir/Plan.docx")
        );
        assert_eq!(
            default_output(Path::new("Plan.boxnote.boxnote"), "docx"),
            PathBuf::from("./Plan.docx")
        );
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("notes.boxnote")), Path::new("."));
        assert_eq!(parent_dir(Path::new("a/b.boxnote")), Path::new("a"));
    }
}
