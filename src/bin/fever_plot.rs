use fever_tracker::cli::{config_or_default, init_tracing, parse_cli, Mode};
use fever_tracker::plot;

fn main() {
    let args = parse_cli(Mode::Plot);
    init_tracing(&args.log_level);
    let cfg = config_or_default(&args);
    plot::run(&cfg, args.svgout.as_deref(), args.show);
}
