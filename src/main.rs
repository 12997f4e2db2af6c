use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tb_override::config::{default_config_path, load_from_path, JobConfig};
use tb_override::{
    extract_assignments, Catalog, CatalogIssue, MarkerPair, PatchOptions, Patcher, RunReport,
    ServiceStep, Strictness, TextDocument,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tb-override")]
#[command(about = "Patch dashboard theme variables and logo, then reload nginx", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply theme overrides (and the logo block, if enabled) and reload
    Apply {
        /// Job config file (defaults: $TB_OVERRIDE_CONFIG, ~/.config/tb-override/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override a variable, e.g. --set --tb-logo-w=200 (repeatable)
        #[arg(short, long = "set", value_name = "VAR=VALUE", allow_hyphen_values = true)]
        set: Vec<String>,

        /// Reset a variable to its catalog default (repeatable)
        #[arg(long, value_name = "VAR", allow_hyphen_values = true)]
        reset: Vec<String>,

        /// Also insert the logo block, using this logo file
        #[arg(long, value_name = "PATH")]
        logo: Option<PathBuf>,

        /// Skip selectors missing from the stylesheet instead of aborting
        #[arg(long, conflicts_with = "strict")]
        lenient: bool,

        /// Abort when any selector is missing from the stylesheet
        #[arg(long)]
        strict: bool,

        /// Accept values the variable catalog does not recognize
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        run: RunFlags,
    },

    /// Insert the logo location block into the proxy config and reload
    Logo {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Logo file (defaults to <assets_dir>/logo_title_white.svg)
        #[arg(short, long)]
        path: Option<PathBuf>,

        #[command(flatten)]
        run: RunFlags,
    },

    /// Show the variables currently set in the stylesheet
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List known theme variables
    Vars {
        /// Only list this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(clap::Args)]
struct RunFlags {
    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Do not run the nginx check/reload commands
    #[arg(long)]
    no_reload: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            config,
            set,
            reset,
            logo,
            lenient,
            strict,
            force,
            run,
        } => cmd_apply(config, set, reset, logo, lenient, strict, force, run),

        Commands::Logo { config, path, run } => cmd_logo(config, path, run),

        Commands::Show { config } => cmd_show(config),

        Commands::Vars { category } => cmd_vars(category),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "tb_override=warn",
        1 => "tb_override=info",
        _ => "tb_override=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the job config using multiple strategies
///
/// Priority order:
/// 1. Explicit --config flag
/// 2. TB_OVERRIDE_CONFIG environment variable
/// 3. ~/.config/tb-override/config.toml, if present
/// 4. Built-in defaults
fn resolve_config(cli_config: Option<PathBuf>) -> Result<JobConfig> {
    if let Some(path) = cli_config {
        return load_from_path(&path).with_context(|| format!("loading {}", path.display()));
    }

    if let Ok(env_path) = env::var("TB_OVERRIDE_CONFIG") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return load_from_path(&path).with_context(|| format!("loading {}", path.display()));
        }
        eprintln!(
            "{}",
            format!("Warning: TB_OVERRIDE_CONFIG is set but path doesn't exist: {env_path}")
                .yellow()
        );
    }

    if let Some(path) = default_config_path().filter(|p| p.exists()) {
        eprintln!("{}", format!("Using config: {}", path.display()).dimmed());
        return load_from_path(&path).with_context(|| format!("loading {}", path.display()));
    }

    Ok(JobConfig::default())
}

fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("expected VAR=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("empty variable name in '{raw}'");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Check every override against the catalog; unknown or ill-typed values are
/// fatal unless `force` is set.
fn check_overrides(catalog: &Catalog, job: &JobConfig, force: bool) -> Result<()> {
    let issues: Vec<CatalogIssue> = job
        .theme
        .overrides
        .iter()
        .filter_map(|(name, value)| catalog.check(name, value).err())
        .collect();

    if issues.is_empty() {
        return Ok(());
    }

    for issue in &issues {
        let line = format!("  {issue}");
        if force {
            eprintln!("{}", line.yellow());
        } else {
            eprintln!("{}", line.red());
        }
    }

    if force {
        Ok(())
    } else {
        anyhow::bail!(
            "{} override(s) rejected by the variable catalog (use --force to apply anyway)",
            issues.len()
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_apply(
    config: Option<PathBuf>,
    set: Vec<String>,
    reset: Vec<String>,
    logo: Option<PathBuf>,
    lenient: bool,
    strict: bool,
    force: bool,
    run: RunFlags,
) -> Result<()> {
    let mut job = resolve_config(config)?;
    let catalog = Catalog::builtin();

    for raw in &set {
        let (name, value) = parse_assignment(raw)?;
        job.theme.overrides.insert(name, value);
    }

    for name in &reset {
        let spec = catalog.get(name).with_context(|| match catalog.suggest(name) {
            Some(s) => format!("unknown variable '{name}' (did you mean '{s}'?)"),
            None => format!("unknown variable '{name}'"),
        })?;
        job.theme
            .overrides
            .insert(spec.name.to_string(), spec.default.to_string());
    }

    if lenient {
        job.theme.strictness = Strictness::Lenient;
    } else if strict {
        job.theme.strictness = Strictness::Strict;
    }

    if let Some(path) = logo {
        job.logo.enabled = true;
        job.logo.file = path;
    }

    check_overrides(&catalog, &job, force)?;

    if job.theme.overrides.is_empty() && !job.logo.enabled {
        println!("{}", "Nothing to do: no overrides and logo disabled".yellow());
        return Ok(());
    }

    execute(&job, &run)
}

fn cmd_logo(config: Option<PathBuf>, path: Option<PathBuf>, run: RunFlags) -> Result<()> {
    let mut job = resolve_config(config)?;
    job.theme.overrides.clear();
    job.logo.enabled = true;
    if let Some(path) = path {
        job.logo.file = path;
    }
    execute(&job, &run)
}

fn execute(job: &JobConfig, run: &RunFlags) -> Result<()> {
    let patcher = Patcher::new(PatchOptions {
        dry_run: run.dry_run,
        skip_service: run.no_reload,
    });
    let service = job.command_service();
    let report = patcher.run(job, &service);

    if run.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print_report(&report, run);
    }

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

/// Print the hunks that differ between `before` and `after`, with one line of
/// context and the stylesheet/config line number of each hunk.
fn display_diff(file: &Path, before: &str, after: &str) {
    println!("\n{}", format!("{} (on disk -> patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(before, after);
    for group in diff.grouped_ops(1) {
        let Some(first) = group.first() else {
            continue;
        };
        println!("{}", format!("@@ line {} @@", first.old_range().start + 1).cyan());

        for op in &group {
            for change in diff.iter_changes(op) {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{change}").red(),
                    ChangeTag::Insert => format!("+{change}").green(),
                    ChangeTag::Equal => format!(" {change}").dimmed(),
                };
                print!("{line}");
            }
        }
    }
}

fn print_report(report: &RunReport, run: &RunFlags) {
    if run.dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
    }

    let mut changed = 0;
    let mut unchanged = 0;
    let mut failed = 0;

    match &report.theme {
        Some(Ok(patch)) => {
            println!("Stylesheet: {}", patch.path.display());
            for change in &patch.report.changed {
                println!(
                    "  {} {}: {} -> {}",
                    "✓".green(),
                    change.selector,
                    change.old,
                    change.new
                );
            }
            for selector in &patch.report.unchanged {
                println!("  {} {}: already set", "⊙".yellow(), selector);
            }
            for selector in &patch.report.missing {
                println!("  {} {}: not found (skipped)", "⊘".cyan(), selector);
            }
            changed += patch.report.changed.len();
            unchanged += patch.report.unchanged.len();
            failed += patch.report.missing.len();

            if run.diff && patch.before != patch.after {
                display_diff(&patch.path, &patch.before, &patch.after);
            }
        }
        Some(Err(e)) => {
            eprintln!("{} Stylesheet: {}", "✗".red(), e);
            failed += 1;
        }
        None => {}
    }

    match &report.logo {
        Some(Ok(patch)) => {
            println!("Proxy config: {}", patch.path.display());
            if patch.inserted {
                println!(
                    "  {} logo block for {}",
                    "✓".green(),
                    patch.asset.display()
                );
                changed += 1;
            } else {
                println!("  {} logo block already present", "⊙".yellow());
                unchanged += 1;
            }

            if run.diff && patch.before != patch.after {
                display_diff(&patch.path, &patch.before, &patch.after);
            }
        }
        Some(Err(e)) => {
            eprintln!("{} Proxy config: {}", "✗".red(), e);
            failed += 1;
        }
        None => {}
    }

    match &report.service {
        ServiceStep::Reloaded => println!("{} nginx check passed, reloaded", "✓".green()),
        ServiceStep::Skipped(reason) => {
            println!("{} service reload skipped ({})", "⊘".cyan(), reason)
        }
        ServiceStep::Failed(e) => {
            eprintln!("{} {}", "✗".red(), e);
            failed += 1;
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} changed", format!("{}", changed).green());
    println!("  {} unchanged", format!("{}", unchanged).yellow());
    println!("  {} failed", format!("{}", failed).red());
}

fn cmd_show(config: Option<PathBuf>) -> Result<()> {
    let job = resolve_config(config)?;
    let catalog = Catalog::builtin();
    let markers: MarkerPair = job.vars_markers();

    let doc = TextDocument::read(&job.paths.stylesheet)?;
    let span = markers.locate(doc.content())?;
    let assignments = extract_assignments(span.block(doc.content()).text)?;

    println!("{}", format!("Stylesheet: {}", doc.path().display()).bold());
    for assignment in assignments {
        let value = assignment.value.to_string();
        let note = match catalog.get(&assignment.selector) {
            Some(spec) if spec.default == value => "default".dimmed(),
            Some(_) => "custom".green(),
            None => "not in catalog".yellow(),
        };
        println!("  {:<22} {:<28} {}", assignment.selector, value, note);
    }

    Ok(())
}

fn cmd_vars(category: Option<String>) -> Result<()> {
    let catalog = Catalog::builtin();
    let categories = catalog.categories();

    let selected: Vec<&str> = match &category {
        Some(c) => {
            if !categories.contains(&c.as_str()) {
                anyhow::bail!(
                    "unknown category '{}' (known: {})",
                    c,
                    categories.join(", ")
                );
            }
            vec![c.as_str()]
        }
        None => categories,
    };

    for cat in selected {
        println!("{}", cat.bold());
        for spec in catalog.in_category(cat) {
            println!(
                "  {:<22} {:<28} {:<5} {}",
                spec.name,
                spec.default,
                spec.kind.to_string(),
                spec.description.dimmed()
            );
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_override::CommandService;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("--tb-logo-w=200").unwrap(),
            ("--tb-logo-w".to_string(), "200".to_string())
        );
        assert_eq!(
            parse_assignment("--tb-hover-bg = rgba(0,0,0,.1)").unwrap().1,
            "rgba(0,0,0,.1)"
        );
        assert!(parse_assignment("--tb-logo-w").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn test_check_overrides_rejects_unless_forced() {
        let catalog = Catalog::builtin();
        let mut job = JobConfig::default();
        job.theme
            .overrides
            .insert("--tb-brand".to_string(), "nope".to_string());
        assert!(check_overrides(&catalog, &job, false).is_err());
        assert!(check_overrides(&catalog, &job, true).is_ok());
    }

    #[test]
    fn test_default_service_commands() {
        assert_eq!(
            JobConfig::default().command_service(),
            CommandService::default()
        );
    }
}
