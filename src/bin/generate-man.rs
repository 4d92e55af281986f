//! Writes the `abroad.1` man page to the directory given as the first
//! argument (default: current directory).

use abroad::cli::Cli;
use clap::CommandFactory;
use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd.clone());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    let path = out_dir.join("abroad.1");
    std::fs::write(&path, buffer)?;
    println!("Wrote {}", path.display());

    for sub in cmd.get_subcommands() {
        let name = format!("abroad-{}", sub.get_name());
        let man = clap_mangen::Man::new(sub.clone());
        let mut buffer = Vec::new();
        man.render(&mut buffer)?;
        let path = out_dir.join(format!("{}.1", name));
        std::fs::write(&path, buffer)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
