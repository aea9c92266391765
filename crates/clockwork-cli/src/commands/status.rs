use clockwork_core::{DaemonPaths, StatusPublisher};

pub fn run(paths: &DaemonPaths, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let Some(record) = StatusPublisher::read(&paths.status) else {
        println!("not running");
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", record.text);
        println!("{}", record.tooltip);
    }
    Ok(())
}
