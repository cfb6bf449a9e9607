//! Command-line interface for the compiler.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::codec::restore;
use crate::compiler::compile;
use crate::config::CompileOptions;
use crate::descriptor::{Descriptor, DescriptorGraph, DescriptorId};
use crate::error::{CompilerError, Result};

/// WSDL descriptors - Compile SOAP 1.2 service descriptions.
#[derive(Parser)]
#[command(name = "wsdl-descriptors")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a service description into its persisted descriptor form.
    Compile {
        /// Root WSDL document
        wsdl: PathBuf,

        /// Directory includes resolve against (default: the document's directory)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the output as `module.exports = <dump>;`
        #[arg(short, long)]
        module: bool,
    },

    /// Restore a persisted descriptor file and summarize its operations.
    Inspect {
        /// Persisted descriptor file
        dump: PathBuf,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            wsdl,
            base_dir,
            output,
            module,
        } => compile_command(&wsdl, base_dir, output, module),
        Commands::Inspect { dump } => inspect_command(&dump),
    }
}

/// Execute the compile command.
fn compile_command(
    wsdl: &Path,
    base_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    module: bool,
) -> Result<()> {
    // With an explicit base directory the document path is relative to it
    let options = match base_dir {
        Some(base_dir) => CompileOptions::new(wsdl.to_string_lossy(), base_dir),
        None => CompileOptions::from_path(wsdl)?,
    };
    let mut options = options.with_module(module);

    // Validate output directory exists (if specified) before loading
    if let Some(output) = &output {
        let parent = output.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            if !dir.is_dir() {
                return Err(CompilerError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Output directory does not exist: {}", dir.display()),
                )));
            }
        }
        options = options.with_output(output.clone());
    }

    let to_stdout = options.output.is_none();
    if !to_stdout {
        eprintln!(
            "{} {} from {}",
            style("Compiling").bold(),
            style(&options.document).cyan(),
            style(options.base_dir.display()).green()
        );
    }

    // Create progress spinner
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Loading service description...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let runtime = tokio::runtime::Runtime::new()?;
    let text = match runtime.block_on(compile(&options)) {
        Ok(text) => text,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();

    match &options.output {
        Some(path) => eprintln!("{} {}", style("Saved to:").green().bold(), path.display()),
        None => println!("{text}"),
    }

    Ok(())
}

/// Execute the inspect command.
fn inspect_command(dump: &Path) -> Result<()> {
    let text = std::fs::read_to_string(dump)?;
    let json = text
        .trim()
        .strip_prefix("module.exports = ")
        .and_then(|t| t.strip_suffix(';'))
        .unwrap_or(text.trim());
    let descriptors = restore(json)?;

    println!(
        "{} {}",
        style("Operations:").bold(),
        descriptors.operations.len()
    );
    for (name, op) in &descriptors.operations {
        println!();
        println!("  {}", style(name).cyan().bold());
        println!("    Style: {}", style(op.style.as_str()).green());
        println!("    SOAP action: {}", op.soap_action);
        println!("    Input: {}", label(&descriptors.graph, op.input));
        println!("    Output: {}", label(&descriptors.graph, op.output));
        if !op.faults.is_empty() {
            println!("    Faults: {}", style(op.faults.len()).yellow().bold());
        }
    }

    Ok(())
}

fn label(graph: &DescriptorGraph, id: Option<DescriptorId>) -> String {
    match id.map(|id| graph.get(id)) {
        Some(Descriptor::Element(e)) => e.qname.to_string(),
        Some(Descriptor::Attribute(a)) => a.qname.to_string(),
        Some(Descriptor::Type(t)) => format!("{} element(s)", t.elements.len()),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_compile() {
        let cli = Cli::parse_from(["wsdl-descriptors", "compile", "service.wsdl"]);

        let Commands::Compile {
            wsdl,
            base_dir,
            output,
            module,
        } = cli.command
        else {
            panic!("expected compile");
        };
        assert_eq!(wsdl, PathBuf::from("service.wsdl"));
        assert!(base_dir.is_none());
        assert!(output.is_none());
        assert!(!module);
    }

    #[test]
    fn test_cli_parse_compile_with_options() {
        let cli = Cli::parse_from([
            "wsdl-descriptors",
            "compile",
            "service.wsdl",
            "--base-dir",
            "contracts",
            "--output",
            "service.js",
            "--module",
        ]);

        let Commands::Compile {
            base_dir,
            output,
            module,
            ..
        } = cli.command
        else {
            panic!("expected compile");
        };
        assert_eq!(base_dir, Some(PathBuf::from("contracts")));
        assert_eq!(output, Some(PathBuf::from("service.js")));
        assert!(module);
    }

    #[test]
    fn test_cli_parse_inspect() {
        let cli = Cli::parse_from(["wsdl-descriptors", "inspect", "service.json"]);
        assert!(matches!(cli.command, Commands::Inspect { dump } if dump == PathBuf::from("service.json")));
    }
}
