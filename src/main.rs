fn main() {
    if let Err(err) = stepsnap_lib::run() {
        eprintln!("stepsnap: {err}");
        std::process::exit(1);
    }
}
