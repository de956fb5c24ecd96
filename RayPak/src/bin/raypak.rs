//! `RayPak` command-line binary

fn main() -> anyhow::Result<()> {
    raypak::cli::run_cli()
}
