fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the device build links against ESP-IDF; host builds and tests
    // need no environment from embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
