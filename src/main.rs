fn main() {
    #[cfg(feature = "cli")]
    fossil_delta::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("fossil-delta: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
