fn main() {
    println!("cargo:rerun-if-changed=csrc/record_logger.c");

    cc::Build::new()
        .file("csrc/record_logger.c")
        .warnings(true)
        .compile("colltune_record_logger");
}
