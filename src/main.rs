fn main() -> anyhow::Result<()> {
    routeshim::cli::run_cli()
}
