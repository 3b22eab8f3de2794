use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for fblayer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Run only surface module tests
        #[arg(long)]
        surface: bool,
        /// Run only layout module tests
        #[arg(long)]
        layout: bool,
        /// Run only compositor module tests
        #[arg(long)]
        compositor: bool,
        /// Run only palette module tests
        #[arg(long)]
        palette: bool,
    },
    /// Run benchmarks
    Bench,
    /// Run the preview window
    Preview {
        /// Log filter passed as RUST_LOG (defaults to "info")
        #[arg(long, default_value = "info")]
        log: String,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Pre-commit hook (fmt, clippy, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

/// Library modules selected with `cargo x test --<module>`
#[derive(Default, Clone, Copy)]
struct ModuleFilter {
    surface: bool,
    layout: bool,
    compositor: bool,
    palette: bool,
}

impl ModuleFilter {
    fn selected(self) -> Vec<(&'static str, &'static str)> {
        [
            (self.surface, "surface", "Surface"),
            (self.layout, "layout", "Layout"),
            (self.compositor, "compositor", "Compositor"),
            (self.palette, "palette", "Palette"),
        ]
        .into_iter()
        .filter(|(enabled, _, _)| *enabled)
        .map(|(_, path, name)| (path, name))
        .collect()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            surface,
            layout,
            compositor,
            palette,
        } => {
            let modules = ModuleFilter {
                surface,
                layout,
                compositor,
                palette,
            };
            run_test(doc, ignored, modules)
        }
        Commands::Bench => run_bench(),
        Commands::Preview { log, release } => run_preview(&log, release),
        Commands::PreCommit => run_pre_commit(),
        Commands::InstallHooks => install_hooks(),
    }
}

/// A named step of a check pipeline
type Step = (&'static str, fn() -> Result<()>);

const FMT_CHECK: Step = ("Format Check", || run_fmt(true));
const CLIPPY: Step = ("Clippy", || run_clippy(false));
const BUILD: Step = ("Build", || run_build(false));
const TEST: Step = ("Test", || run_test(false, false, ModuleFilter::default()));

fn run_ci(verbose: bool) -> Result<()> {
    run_pipeline("CI Pipeline", "CI passed", &[FMT_CHECK, CLIPPY, BUILD, TEST], verbose)
}

fn run_check(verbose: bool) -> Result<()> {
    run_pipeline("Quick Checks", "Checks passed", &[FMT_CHECK, CLIPPY], verbose)
}

fn run_pre_commit() -> Result<()> {
    run_pipeline(
        "Pre-commit Checks",
        "Pre-commit checks passed",
        &[FMT_CHECK, CLIPPY, TEST],
        false,
    )
}

fn run_pipeline(title: &str, done: &str, steps: &[Step], verbose: bool) -> Result<()> {
    println!("{}", format!("=== {} ===", title).bold().blue());
    let start = Instant::now();

    for &(name, step) in steps {
        run_task(name, step, verbose)?;
    }

    println!(
        "\n{} {}",
        format!("✓ {} in", done).green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--workspace").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, ignored: bool, modules: ModuleFilter) -> Result<()> {
    let test_cmd = |filter: Option<&str>| {
        let mut cmd = Command::new("cargo");
        cmd.arg("test");
        match filter {
            Some(module) => cmd.arg("--lib").arg(module),
            None if doc => cmd.arg("--doc"),
            None => &mut cmd,
        };
        if ignored {
            cmd.arg("--").arg("--ignored");
        }
        cmd
    };

    let selected = modules.selected();
    if doc || selected.is_empty() {
        return execute_command(&mut test_cmd(None));
    }

    let mut failed = Vec::new();
    for &(module_path, module_name) in &selected {
        println!("{} Running {} tests...", "→".blue(), module_name.bold());

        if let Err(e) = execute_command(&mut test_cmd(Some(module_path))) {
            println!("{} {} tests failed\n", "✗".red(), module_name);
            if selected.len() == 1 {
                return Err(e);
            }
            failed.push(module_name);
        } else {
            println!("{} {} tests passed\n", "✓".green(), module_name);
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Module tests failed: {}", failed.join(", "))
    }
}

fn run_bench() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    execute_command(&mut cmd)
}

fn run_preview(log: &str, release: bool) -> Result<()> {
    println!("{}", "=== Preview ===".bold().blue());
    println!("{} Log filter: {}", "→".blue(), log.cyan());
    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("--bin").arg("fblayer-preview");

    if release {
        cmd.arg("--release");
    }

    cmd.env("RUST_LOG", log);

    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        println!("\n{} Preview exited with an error", "✗".red().bold());
        anyhow::bail!("Preview failed with exit code: {}", status);
    }

    let elapsed = start.elapsed();
    println!(
        "\n{} Preview closed after {}",
        "✓".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hook_content = "#!/bin/sh\nset -e\ncargo x pre-commit\n";

    let hook_path = ".git/hooks/pre-commit";
    fs::write(hook_path, hook_content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)?;
    }

    println!("{} pre-commit hook installed (fmt, clippy, test)", "✓".green());

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
