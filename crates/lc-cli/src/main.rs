fn main() {
    std::process::exit(lc_cli::run_cli_from_args(std::env::args_os()));
}
