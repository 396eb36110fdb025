use std::env;
use std::path::PathBuf;

use cbindgen::Language;

/// Regenerates `include/crawlstats.h` from the `extern "C"` surface. A failed
/// generation is reported as a warning so the library still builds.
fn main() {
    println!("cargo:rerun-if-changed=src");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let header = PathBuf::from(&crate_dir).join("include").join("crawlstats.h");
    let config = cbindgen::Config {
        usize_is_size_t: true,
        include_guard: Some("CRAWLSTATS_H".to_string()),
        ..Default::default()
    };

    match cbindgen::Builder::new()
        .with_config(config)
        .with_language(Language::C)
        .with_crate(crate_dir)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        Err(err) => println!("cargo:warning=failed to generate C header: {err}"),
    }
}
