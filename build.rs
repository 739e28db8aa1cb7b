// Build script for the optional native engine link.
//
// The freepiano_minimal library is a prebuilt artifact; cargo only needs to
// know where to find it. Point FREEPIANO_LIB_DIR at the directory holding
// the import library / shared object and build with --features freepiano:
//   FREEPIANO_LIB_DIR=/path/to/lib cargo build --features freepiano

fn main() {
    println!("cargo:rerun-if-env-changed=FREEPIANO_LIB_DIR");

    // The link attribute lives in the ffi module; only the search path is
    // emitted here, and only when the native driver is compiled in.
    if std::env::var("CARGO_FEATURE_FREEPIANO").is_ok() {
        if let Ok(dir) = std::env::var("FREEPIANO_LIB_DIR") {
            println!("cargo:rustc-link-search=native={dir}");
        }
    }
}
