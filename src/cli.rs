use std::path::PathBuf;

use clap::Parser;

/// Positional inputs classified by extension, plus the flags from spec §6.
#[derive(Debug, Parser)]
#[command(name = "tmplforge", about = "A data-driven template compiler")]
pub struct Cli {
    /// Schema (`.json`) and template (`.template`) files, in any order.
    pub inputs: Vec<PathBuf>,

    /// One or more project descriptors (comma-separated).
    #[arg(short = 'p', long = "project", value_delimiter = ',')]
    pub project: Vec<PathBuf>,

    /// After a one-shot compile, poll watched inputs and recompile on change.
    #[arg(short = 'w', long = "watch")]
    pub watch: bool,

    /// Write compiled output to standard output instead of (or in addition
    /// to) files.
    #[arg(long = "print")]
    pub print: bool,

    /// Increase log verbosity (stackable: -v, -vv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity (stackable: -q, -qq).
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    pub quiet: u8,
}

/// A classified view of [`Cli::inputs`] (spec §6: "files classified by
/// extension — `.json` → schema; `.template` → template").
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ClassifiedInputs {
    pub schemas: Vec<PathBuf>,
    pub templates: Vec<PathBuf>,
    pub unrecognized: Vec<PathBuf>,
}

impl Cli {
    pub fn classify_inputs(&self) -> ClassifiedInputs {
        classify(&self.inputs)
    }

    /// Maps `-v`/`-q` counts onto a `log::LevelFilter`, default `Info`.
    pub fn log_level(&self) -> log::LevelFilter {
        use log::LevelFilter::*;
        let delta = self.verbose as i16 - self.quiet as i16;
        match delta {
            i16::MIN..=-2 => Error,
            -1 => Warn,
            0 => Info,
            1 => Debug,
            2..=i16::MAX => Trace,
        }
    }
}

fn classify(inputs: &[PathBuf]) -> ClassifiedInputs {
    let mut classified = ClassifiedInputs::default();
    for path in inputs {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => classified.schemas.push(path.clone()),
            Some("template") => classified.templates.push(path.clone()),
            _ => classified.unrecognized.push(path.clone()),
        }
    }
    classified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        let cli = Cli::parse_from(["tmplforge", "a.json", "b.template", "c.txt"]);
        let classified = cli.classify_inputs();
        assert_eq!(vec![PathBuf::from("a.json")], classified.schemas);
        assert_eq!(vec![PathBuf::from("b.template")], classified.templates);
        assert_eq!(vec![PathBuf::from("c.txt")], classified.unrecognized);
    }

    #[test]
    fn project_flag_splits_on_comma() {
        let cli = Cli::parse_from(["tmplforge", "-p", "a.json,b.json"]);
        assert_eq!(
            vec![PathBuf::from("a.json"), PathBuf::from("b.json")],
            cli.project
        );
    }

    #[test]
    fn watch_and_print_flags() {
        let cli = Cli::parse_from(["tmplforge", "--watch", "--print"]);
        assert!(cli.watch);
        assert!(cli.print);
    }

    #[test]
    fn default_log_level_is_info() {
        let cli = Cli::parse_from(["tmplforge"]);
        assert_eq!(log::LevelFilter::Info, cli.log_level());
    }

    #[test]
    fn verbose_raises_log_level() {
        let cli = Cli::parse_from(["tmplforge", "-vv"]);
        assert_eq!(log::LevelFilter::Trace, cli.log_level());
    }

    #[test]
    fn quiet_lowers_log_level() {
        let cli = Cli::parse_from(["tmplforge", "-q"]);
        assert_eq!(log::LevelFilter::Warn, cli.log_level());
    }
}
