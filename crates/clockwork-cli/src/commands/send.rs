use clockwork_core::{Command, DaemonPaths, SignalChannel};

pub fn run(paths: &DaemonPaths, word: &str) -> Result<(), Box<dyn std::error::Error>> {
    let command = Command::parse(word);
    if command == Command::ToggleVisibility && word.trim() != command.as_str() {
        eprintln!("unrecognized command '{}', daemon will toggle visibility", word.trim());
    }
    SignalChannel::new(&paths.signal).send(word)?;
    println!("sent {command}");
    Ok(())
}
