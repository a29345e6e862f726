// build.rs

use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let dest_path = Path::new(&out_dir).join("build_info.rs");

    let build_date = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    fs::write(
        &dest_path,
        format!(
            "pub const BUILD_DATE: &str = \"{}\";\npub const BUILD_PROFILE: &str = \"{}\";\n",
            build_date, profile
        ),
    )
    .expect("unable to write build_info.rs");

    // only rerun when the script changes, the date is a stamp not a dependency
    println!("cargo:rerun-if-changed=build.rs");
}
