use homeassistant_discovery::connector::ConnectorOptions;
use homeassistant_discovery::model::DiscoveryOptions;
use schemars::schema::RootSchema;

fn write(path: &str, schema: &RootSchema) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, schema)?;
    println!("Wrote schema to: {path}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    std::fs::create_dir_all("schema")?;

    write("schema/connector.json", &schemars::schema_for!(ConnectorOptions))?;
    write("schema/discovery.json", &schemars::schema_for!(DiscoveryOptions))?;

    Ok(())
}
