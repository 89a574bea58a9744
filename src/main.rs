use shape_garden::{AppConfig, run};

fn main() -> anyhow::Result<()> {
    run(AppConfig::default())
}
