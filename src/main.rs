fn main() {
    if let Err(err) = upc_merge::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
