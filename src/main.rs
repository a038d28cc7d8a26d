fn main() -> anyhow::Result<()> {
    promptframe::run()
}
