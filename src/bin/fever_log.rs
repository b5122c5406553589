use fever_tracker::cli::{config_or_default, init_tracing, parse_cli, Mode};
use fever_tracker::record;

fn main() {
    let args = parse_cli(Mode::Record);
    init_tracing(&args.log_level);
    let cfg = config_or_default(&args);
    record::run(&cfg, &args.entry);
}
