use anyhow::Result;

use watson::case::CaseFile;
use watson::config::WatsonConfig;

/// Print the public view of the active case. The culprit is never shown.
pub fn show_case(config: &WatsonConfig, json: bool) -> Result<()> {
    let case = CaseFile::load_or_default(config.case.path.as_deref())?;
    let view = case.public_view();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", view.title);
    println!("{}", "=".repeat(40));
    println!("  Victim:  {}", view.victim);
    if !view.crime.is_empty() {
        println!("  Crime:   {}", view.crime);
    }
    println!();

    println!("Suspects:");
    for s in &view.suspects {
        println!("  {:<12} {:<24} {}", s.id, s.name, s.role);
    }

    Ok(())
}
