use fever_tracker::cli::{config_or_default, init_tracing, parse_cli, Mode};
use fever_tracker::{plot, record};

fn main() {
    let args = parse_cli(Mode::Both);
    init_tracing(&args.log_level);
    let cfg = config_or_default(&args);

    // record first, then plot whatever the store holds, even if recording failed
    record::run(&cfg, &args.entry);
    plot::run(&cfg, args.svgout.as_deref(), args.show);
}
