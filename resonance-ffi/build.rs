// Build script that regenerates the C header with `cbindgen` when it is installed,
// otherwise copies the checked-in `include/resonance.h` to $OUT_DIR.
//
// Consumers can include the header from either:
//   - <repo>/resonance-ffi/include/resonance.h   (checked-in)
//   - $OUT_DIR/resonance.h

use std::{env, error::Error, fs, path::PathBuf, process::Command};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/resonance.h");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let header_repo = crate_dir.join("include").join("resonance.h");
    let header_out = out_dir.join("resonance.h");

    let cbindgen_ok = Command::new("cbindgen")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if cbindgen_ok {
        let status = Command::new("cbindgen")
            .args(["--crate", "resonance-ffi", "--lang", "C", "--output"])
            .arg(&header_out)
            .current_dir(&crate_dir)
            .status()?;
        if status.success() {
            println!("cargo:warning=resonance-ffi: generated header with cbindgen -> {}", header_out.display());
            return Ok(());
        }
        println!("cargo:warning=resonance-ffi: cbindgen failed; using checked-in header");
    }

    fs::copy(&header_repo, &header_out)?;
    Ok(())
}
