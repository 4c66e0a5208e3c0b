fn main() -> anyhow::Result<()> {
    zvault::app::run()
}
