#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = ricebar::run_from_env() {
        eprintln!("ricebar: {error}");
        std::process::exit(error.exit_code());
    }
}
