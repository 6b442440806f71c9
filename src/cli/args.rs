//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::parse_cli_define;
use crate::core::BuildMode;

/// kiln asset build pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: kiln.toml)
    #[arg(short = 'C', long, global = true, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build entry points into the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Show how an identifier resolves and which chain it gets per mode
    #[command(visible_alias = "i")]
    Inspect {
        /// Resource identifier, optionally with `?context`
        identifier: String,
    },
}

/// `kiln build` arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Build mode
    #[arg(short, long, env = "KILN_MODE", value_enum)]
    pub mode: Option<BuildMode>,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Replace the output directory (the default unless `build.clean = false`)
    #[arg(short, long, overrides_with = "keep")]
    pub clean: bool,

    /// Merge into the existing output directory instead of replacing it
    #[arg(short, long, overrides_with = "clean")]
    pub keep: bool,

    /// Define a constant, `KEY=VALUE` (VALUE is JSON, or a plain string)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_cli_define)]
    pub define: Vec<(String, serde_json::Value)>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let cli = Cli::try_parse_from([
            "kiln",
            "build",
            "--mode",
            "development",
            "-D",
            "process.env.CLIENT_ID=\"abc\"",
            "--define",
            "DEBUG=true",
            "-c",
        ])
        .unwrap();

        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.mode, Some(BuildMode::Development));
        assert!(build_args.clean);
        assert_eq!(build_args.define.len(), 2);
        assert_eq!(build_args.define[0].0, "process.env.CLIENT_ID");
        assert_eq!(build_args.define[1].1, serde_json::Value::Bool(true));
        assert_eq!(cli.config, PathBuf::from("kiln.toml"));
    }

    #[test]
    fn test_keep_overrides_clean() {
        let cli = Cli::try_parse_from(["kiln", "build", "--clean", "--keep"]).unwrap();
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert!(build_args.keep);
        assert!(!build_args.clean);
    }

    #[test]
    fn test_bad_define_rejected() {
        assert!(Cli::try_parse_from(["kiln", "build", "--define", "NOVALUE"]).is_err());
    }

    #[test]
    fn test_inspect() {
        let cli = Cli::try_parse_from(["kiln", "-C", "other.toml", "inspect", "@/app.js"]).unwrap();
        assert!(matches!(cli.command, Commands::Inspect { ref identifier } if identifier == "@/app.js"));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }
}
