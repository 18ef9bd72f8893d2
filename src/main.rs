fn main() {
    if let Err(err) = blinderfit::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
