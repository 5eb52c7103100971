use blendfile::Blend;
use std::{
    env,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Writes `<file>.html` and `<file>.txt` next to the .blend file.
fn do_it(blend_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", blend_path.display());
    let blend = Blend::from_path(blend_path)?;
    let report = blend.report();

    fs::write(blend_path.with_extension("html"), report.to_html())?;

    let mut buffer = BufWriter::new(File::create(blend_path.with_extension("txt"))?);
    write!(buffer, "{}", report)?;
    for block in blend.blocks_with_code("OB") {
        let object = blend.decode_block(block)?;
        for record in &object.records {
            writeln!(buffer, "{}", record)?;
        }
    }
    buffer.flush()?;

    println!("done: {} blocks, {} structs", report.blocks.len(), report.structs.len());
    Ok(())
}

/// Usage: `cargo run --example print_report [path]`, where path is a .blend file or a folder to search for them.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = match env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").ok_or("could not find cargo manifest dir")?)
            .join("tests/blend_files"),
    };

    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.path().is_file() && entry.path().extension().map_or(false, |ext| ext == "blend") {
            do_it(entry.path())?;
        }
    }

    Ok(())
}
