use graphwire_core::version::VersionInfo;
use miette::Result;

pub fn run(json: bool) -> Result<()> {
    let info = VersionInfo::current();
    if json {
        let text = serde_json::to_string(&info)
            .map_err(|e| miette::miette!("Failed to serialize version: {}", e))?;
        println!("{text}");
    } else {
        println!("{info}");
    }
    Ok(())
}
