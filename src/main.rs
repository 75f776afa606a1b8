use replay_si::cli::ReplaySiArgs;

fn main() {
    let args = ReplaySiArgs::parse_args();
    replay_si::logging::init(&args.log_level);

    if let Err(err) = replay_si::run(args) {
        tracing::error!(error = %err, "replay-si failed");
        std::process::exit(1);
    }
}
