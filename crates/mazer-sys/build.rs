use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=MAZER_LIB_DIR");
    println!("cargo:rerun-if-env-changed=MAZER_LIB_KIND");

    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("MAZER_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }

    let kind = env::var("MAZER_LIB_KIND").unwrap_or_else(|_| "dylib".to_owned());
    match kind.as_str() {
        "dylib" | "static" => println!("cargo:rustc-link-lib={kind}=mazer"),
        other => panic!("MAZER_LIB_KIND must be `dylib` or `static`, got `{other}`"),
    }
}
