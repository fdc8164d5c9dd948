fn main() {
    // option_env!() values are cached between builds unless cargo is told to watch them.
    println!("cargo:rerun-if-env-changed=TALLY_DEFAULT_INGEST_URL");
    println!("cargo:rerun-if-env-changed=TALLY_DEFAULT_APP_ID");
}
