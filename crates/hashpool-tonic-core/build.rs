/// Builds the gRPC client and server code for the `hasher.proto` definition
/// using `tonic-prost-build`.
///
/// This code generation step processes the Protocol Buffer definitions located
/// in the `proto` directory and emits Rust modules with gRPC bindings into the
/// crate's `OUT_DIR`, along with an encoded file descriptor set that the
/// server registers with gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/hasher.proto`
/// - Includes: `proto/`
/// - Descriptor set: `$OUT_DIR/hasher_descriptor.bin`
///
/// # Panics
///
/// This function will `panic!` if code generation fails.
///
/// # Output
///
/// Generated code is exposed to the rest of the crate via:
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("hasher");
/// }
/// ```
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("hasher_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/hasher.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/hasher.proto"], &["proto"])
        .unwrap();
}
