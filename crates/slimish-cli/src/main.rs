use clap::{Args, Parser, Subcommand};
use slimish_lexer::{Delimiters, Scanner, DELIMITER_KEYS};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "slimish")]
#[command(about = "slimish — indentation-based shorthand for HTML + Jinja templates")]
#[command(version)]
struct Cli {
    /// Log scanner and emitter decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a slimish file to a Jinja template
    Build {
        /// Input slimish file
        path: String,

        /// Output file (`-` for stdout). Defaults to `<stem>.html` next to the input
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        delimiters: DelimiterArgs,
    },

    /// Check a slimish file for errors without generating output
    Check {
        /// Input slimish file
        path: String,

        #[command(flatten)]
        delimiters: DelimiterArgs,
    },
}

/// Delimiter overrides. Precedence: defaults, then `--config`, then flags.
#[derive(Args)]
struct DelimiterArgs {
    /// TOML file setting any of the four delimiter keys
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_name = "STR")]
    block_start: Option<String>,

    #[arg(long, value_name = "STR")]
    block_end: Option<String>,

    #[arg(long, value_name = "STR")]
    variable_start: Option<String>,

    #[arg(long, value_name = "STR")]
    variable_end: Option<String>,
}

impl DelimiterArgs {
    fn resolve(&self) -> Result<Delimiters, String> {
        let mut delims = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
                Delimiters::from_toml_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
            }
            None => Delimiters::default(),
        };

        let flags = [
            &self.block_start,
            &self.block_end,
            &self.variable_start,
            &self.variable_end,
        ];
        for (key, value) in DELIMITER_KEYS.iter().zip(flags) {
            if let Some(value) = value {
                delims.set(key, value.as_str()).map_err(|e| e.to_string())?;
            }
        }

        Ok(delims)
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Command::Build {
            path,
            output,
            delimiters,
        } => cmd_build(&path, output.as_deref(), &delimiters),
        Command::Check { path, delimiters } => cmd_check(&path, &delimiters),
    };

    if let Err(message) = result {
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}

fn read_source(path: &str) -> Result<String, String> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(format!("file not found: {path}"));
    }
    std::fs::read_to_string(p).map_err(|e| format!("Error reading {path}: {e}"))
}

/// `page.slim` → `page.html` in the same directory.
fn default_output(path: &str) -> Result<PathBuf, String> {
    let input = Path::new(path);
    let output = input.with_extension("html");
    if output == input {
        return Err(format!(
            "{path} already has an .html extension; pass --output explicitly"
        ));
    }
    Ok(output)
}

fn cmd_build(path: &str, output: Option<&str>, delimiters: &DelimiterArgs) -> Result<(), String> {
    let source = read_source(path)?;
    let delims = delimiters.resolve()?;

    let html = slimish_codegen::compile(&source, &delims).map_err(|e| format!("{path}: {e}"))?;

    match output {
        Some("-") => {
            print!("{html}");
        }
        Some(out) => write_output(Path::new(out), &html)?,
        None => write_output(&default_output(path)?, &html)?,
    }

    Ok(())
}

fn write_output(path: &Path, html: &str) -> Result<(), String> {
    std::fs::write(path, html).map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    log::info!("wrote {} bytes to {}", html.len(), path.display());
    eprintln!("Built: {}", path.display());
    Ok(())
}

fn cmd_check(path: &str, delimiters: &DelimiterArgs) -> Result<(), String> {
    let source = read_source(path)?;
    let delims = delimiters.resolve()?;

    let tokens = Scanner::tokenize(&source, &delims).map_err(|e| format!("{path}: {e}"))?;
    log::debug!("{path}: {} tokens", tokens.len());

    eprintln!("OK: {path}");
    Ok(())
}
