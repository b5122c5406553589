use super::VERSION;
use crate::config::FeverConfig;
use crate::error::Result;
use crate::record::EntryArgs;
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;

/// Which steps a binary runs, deciding the flags it takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Record,
    Plot,
    Both,
}

impl Mode {
    fn records(self) -> bool {
        self != Mode::Plot
    }

    fn plots(self) -> bool {
        self != Mode::Record
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub log_level: String,
    pub entry: EntryArgs,
    pub svgout: Option<PathBuf>,
    pub show: bool,
}

impl CliArgs {
    /// config from file and environment, with the `--store` override
    pub fn load_config(&self) -> Result<FeverConfig> {
        let cfg = FeverConfig::load(self.config.as_deref())?;
        Ok(match &self.store {
            Some(p) => cfg.with_store_path(p.clone()),
            None => cfg,
        })
    }
}

pub fn build_app(mode: Mode) -> App<'static, 'static> {
    let arg_config = Arg::with_name("config")
        .help("toml configuration file (store path, bands, axis)")
        .short("c")
        .long("config")
        .takes_value(true);
    let arg_store = Arg::with_name("store")
        .help("xlsx file holding the log entries, overrides the configuration")
        .short("f")
        .long("store")
        .takes_value(true);
    let arg_log_level = Arg::with_name("log_level")
        .help("log level when RUST_LOG is not set")
        .long("log-level")
        .takes_value(true)
        .possible_values(&["error", "warn", "info", "debug", "trace"])
        .default_value("warn");
    let (name, about) = match mode {
        Mode::Record => ("fever_log", "cli app to record one fever entry"),
        Mode::Plot => ("fever_plot", "cli app to plot the fever time series"),
        Mode::Both => (
            "fever_tracker",
            "cli app to record one fever entry and plot the fever time series",
        ),
    };
    let mut app = App::new(name)
        .version(VERSION.unwrap_or("unknown"))
        .about(about)
        .arg(arg_config)
        .arg(arg_store)
        .arg(arg_log_level);
    if mode.records() {
        let arg_temperature = Arg::with_name("temperature")
            .help("temperature in °F, asked for when missing")
            .short("t")
            .long("temperature")
            .takes_value(true)
            .allow_hyphen_values(true);
        let arg_feeling = Arg::with_name("feeling")
            .help("how you are feeling")
            .long("feeling")
            .takes_value(true);
        let arg_medicine = Arg::with_name("medicine")
            .help("medicine taken")
            .long("medicine")
            .takes_value(true);
        let arg_notes = Arg::with_name("notes")
            .help("additional notes")
            .long("notes")
            .takes_value(true);
        app = app
            .arg(arg_temperature)
            .arg(arg_feeling)
            .arg(arg_medicine)
            .arg(arg_notes);
    }
    if mode.plots() {
        let arg_svgout = Arg::with_name("output_svgfile")
            .help("keep the chart in this svg file")
            .short("o")
            .long("svgfile")
            .takes_value(true);
        let arg_no_show = Arg::with_name("no_show")
            .help("do not open the chart in a viewer")
            .long("no-show")
            .takes_value(false);
        app = app.arg(arg_svgout).arg(arg_no_show);
    }
    app
}

pub fn args_from_matches(m: &ArgMatches) -> CliArgs {
    let owned = |name: &str| m.value_of(name).map(String::from);
    CliArgs {
        config: m.value_of("config").map(PathBuf::from),
        store: m.value_of("store").map(PathBuf::from),
        log_level: String::from(m.value_of("log_level").unwrap_or("warn")),
        entry: EntryArgs {
            temperature: owned("temperature"),
            feeling: owned("feeling"),
            medicine: owned("medicine"),
            notes: owned("notes"),
        },
        svgout: m.value_of("output_svgfile").map(PathBuf::from),
        show: !m.is_present("no_show"),
    }
}

/// Takes the CLI arguments of the given mode.
pub fn parse_cli(mode: Mode) -> CliArgs {
    let matches = build_app(mode).get_matches();
    args_from_matches(&matches)
}

/// RUST_LOG wins over `level`.
pub fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration, reporting a bad one and falling back to the defaults.
pub fn config_or_default(args: &CliArgs) -> FeverConfig {
    match args.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "using the default configuration");
            println!("{}, using the default configuration", e);
            let cfg = FeverConfig::default();
            match &args.store {
                Some(p) => cfg.with_store_path(p.clone()),
                None => cfg,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(mode: Mode, argv: &[&str]) -> CliArgs {
        let m = build_app(mode).get_matches_from_safe(argv).unwrap();
        args_from_matches(&m)
    }

    #[test]
    fn defaults_without_flags() {
        let a = parse(Mode::Both, &["fever_tracker"]);
        assert_eq!(a.config, None);
        assert_eq!(a.store, None);
        assert_eq!(a.log_level, "warn");
        assert_eq!(a.entry, EntryArgs::default());
        assert_eq!(a.svgout, None);
        assert!(a.show);
    }

    #[test]
    fn record_flags() {
        let a = parse(
            Mode::Record,
            &["fever_log", "-t", "101.2", "--feeling", "tired", "-f", "x.xlsx"],
        );
        assert_eq!(a.entry.temperature.as_deref(), Some("101.2"));
        assert_eq!(a.entry.feeling.as_deref(), Some("tired"));
        assert_eq!(a.entry.notes, None);
        assert_eq!(a.store, Some(PathBuf::from("x.xlsx")));
    }

    #[test]
    fn plot_flags_only_in_plot_modes() {
        let a = parse(Mode::Plot, &["fever_plot", "-o", "chart.svg", "--no-show"]);
        assert_eq!(a.svgout, Some(PathBuf::from("chart.svg")));
        assert!(!a.show);
        assert!(build_app(Mode::Record)
            .get_matches_from_safe(&["fever_log", "--no-show"])
            .is_err());
        assert!(build_app(Mode::Plot)
            .get_matches_from_safe(&["fever_plot", "-t", "99"])
            .is_err());
    }

    #[test]
    fn store_flag_overrides_config() {
        let a = parse(Mode::Plot, &["fever_plot", "--store", "other.xlsx"]);
        let cfg = a.load_config().unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("other.xlsx"));
    }
}
