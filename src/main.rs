#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = sketch_grader::run().await {
        eprintln!("sketch-grader fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
