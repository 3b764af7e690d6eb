//! Command-line interface for ppfmt.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::options::ConfigurationPolicy;

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to format
    pub inputs: Vec<PathBuf>,

    /// Recursive directory processing
    pub recursive: bool,

    /// Exclude patterns for files/directories (glob syntax)
    pub exclude: Vec<String>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// One entry per `-p`; each is a comma-separated symbol set
    pub preprocessor: Vec<Vec<String>>,

    pub policy: Option<ConfigurationPolicy>,

    /// Directory name whose files are never formatted
    pub reserved_dir: Option<String>,

    /// Indent with this many spaces instead of tabs
    pub indent_size: Option<usize>,

    pub use_tabs: Option<bool>,
    pub space_after_comma: Option<bool>,
    pub space_within_parentheses: Option<bool>,
    pub max_blank_lines: Option<usize>,

    /// Output to stdout instead of in-place
    pub stdout: bool,

    /// Report files that would change without writing them
    pub check: bool,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Path used to pick the language (and configs) for stdin input
    pub stdin_filename: Option<PathBuf>,

    /// Enable debug output
    pub debug: bool,

    /// Silent mode (no output)
    pub silent: bool,
}

fn bool_switch(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name("BOOL")
        .num_args(0..=1)
        .require_equals(true)
        .default_missing_value("true")
        .value_parser(clap::value_parser!(bool))
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("ppfmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule-pipeline source formatter that checks every preprocessor configuration")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to format (reads stdin when omitted)")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively format directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("preprocessor")
                .short('p')
                .long("preprocessor")
                .help("Additional symbol configuration to check, comma separated (can be repeated, e.g. -p DEBUG -p A,B)")
                .value_name("SYMBOLS")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .help("verify: only report configuration differences; apply: keep their formatting [default: verify]")
                .value_name("POLICY")
                .value_parser(|s: &str| s.parse::<ConfigurationPolicy>()),
        )
        .arg(
            Arg::new("reserved-dir")
                .long("reserved-dir")
                .help("Skip files whose parent directory has this name [default: Migrations]")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("indent-size")
                .short('i')
                .long("indent-size")
                .help("Number of spaces per indent level when not using tabs [default: 4]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(bool_switch("use-tabs", "Indent with tabs instead of spaces"))
        .arg(bool_switch(
            "space-after-comma",
            "Enable/disable a space after commas",
        ))
        .arg(bool_switch(
            "space-within-parens",
            "Enable/disable padding inside non-empty parentheses",
        ))
        .arg(
            Arg::new("max-blank-lines")
                .long("max-blank-lines")
                .help("Longest allowed run of blank lines [default: 1]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("stdout")
                .short('s')
                .long("stdout")
                .help("Output to stdout instead of modifying files in-place")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Exit non-zero if any file would change or has diagnostics; write nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("stdin-filename")
                .long("stdin-filename")
                .help("Treat stdin as this file when choosing its language [default: stdin.c]")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (shows config, filters, rule order)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (errors only, for editor integration)")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Split a `-p` value into its symbols
fn split_symbols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        preprocessor: matches
            .get_many::<String>("preprocessor")
            .map(|vals| vals.map(|v| split_symbols(v)).collect())
            .unwrap_or_default(),
        policy: matches.get_one::<ConfigurationPolicy>("policy").copied(),
        reserved_dir: matches.get_one::<String>("reserved-dir").cloned(),
        indent_size: matches.get_one::<usize>("indent-size").copied(),
        use_tabs: matches.get_one::<bool>("use-tabs").copied(),
        space_after_comma: matches.get_one::<bool>("space-after-comma").copied(),
        space_within_parentheses: matches.get_one::<bool>("space-within-parens").copied(),
        max_blank_lines: matches.get_one::<usize>("max-blank-lines").copied(),
        stdout: matches.get_flag("stdout"),
        check: matches.get_flag("check"),
        jobs: matches.get_one::<usize>("jobs").copied(),
        stdin_filename: matches.get_one::<PathBuf>("stdin-filename").cloned(),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds() {
        let cmd = build_cli();
        assert_eq!(cmd.get_name(), "ppfmt");
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse_args_from(vec!["ppfmt", "file.cs"]);
        assert_eq!(args.inputs, vec![PathBuf::from("file.cs")]);
        assert!(args.preprocessor.is_empty());
        assert_eq!(args.policy, None);
        assert_eq!(args.use_tabs, None);
        assert!(!args.stdout);
        assert!(!args.check);
        assert!(!args.debug);
    }

    #[test]
    fn test_preprocessor_configurations() {
        let args = parse_args_from(vec![
            "ppfmt", "-p", "A", "--preprocessor", "B, C", "file.cs",
        ]);
        assert_eq!(
            args.preprocessor,
            vec![vec!["A".to_string()], vec!["B".to_string(), "C".to_string()]]
        );
    }

    #[test]
    fn test_empty_preprocessor_value_is_default_view() {
        let args = parse_args_from(vec!["ppfmt", "-p", "", "file.cs"]);
        assert_eq!(args.preprocessor, vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_policy_flag() {
        let args = parse_args_from(vec!["ppfmt", "--policy", "apply", "file.cs"]);
        assert_eq!(args.policy, Some(ConfigurationPolicy::Apply));

        let err = build_cli()
            .try_get_matches_from(vec!["ppfmt", "--policy", "merge", "file.cs"])
            .unwrap_err();
        assert!(err.to_string().contains("merge"));
    }

    #[test]
    fn test_bool_switches() {
        let args = parse_args_from(vec![
            "ppfmt",
            "--use-tabs=false",
            "--space-after-comma",
            "--space-within-parens=false",
            "file.cs",
        ]);
        assert_eq!(args.use_tabs, Some(false));
        assert_eq!(args.space_after_comma, Some(true));
        assert_eq!(args.space_within_parentheses, Some(false));
    }

    #[test]
    fn test_exclude_multiple() {
        let args = parse_args_from(vec![
            "ppfmt", "-r", "-e", "*.g.cs", "--exclude", "obj", "src/",
        ]);
        assert_eq!(args.exclude, vec!["*.g.cs", "obj"]);
        assert!(args.recursive);
    }

    #[test]
    fn test_numeric_options() {
        let args = parse_args_from(vec![
            "ppfmt",
            "-i",
            "2",
            "--max-blank-lines",
            "3",
            "-j",
            "4",
            "--reserved-dir",
            "Generated",
            "file.cs",
        ]);
        assert_eq!(args.indent_size, Some(2));
        assert_eq!(args.max_blank_lines, Some(3));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.reserved_dir.as_deref(), Some("Generated"));
    }

    #[test]
    fn test_stdin_filename() {
        let args = parse_args_from(vec!["ppfmt", "--stdin-filename", "Form1.vb", "-"]);
        assert_eq!(args.stdin_filename, Some(PathBuf::from("Form1.vb")));
        assert_eq!(args.inputs, vec![PathBuf::from("-")]);
    }

    #[test]
    fn test_debug_and_silent_flags() {
        let args = parse_args_from(vec!["ppfmt", "-D", "file.cs"]);
        assert!(args.debug);
        let args = parse_args_from(vec!["ppfmt", "--silent", "file.cs"]);
        assert!(args.silent);
    }
}
