use std::env;

fn main() {
    // build scripts run on the host, so ask cargo about the target instead of using cfg
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("macos") {
        return;
    }
    println!("cargo:rustc-env=MACOSX_DEPLOYMENT_TARGET=10.13");
    println!("cargo:rustc-link-arg=-mmacosx-version-min=10.13");
    println!("cargo:rustc-link-lib=framework=CoreFoundation");
    println!("cargo:rustc-link-lib=framework=ApplicationServices");
}
